//! Cart service.
//!
//! Lines are keyed by `(user, product, size)`. Adding a variant that is
//! already in the cart adds to its quantity instead of creating a second
//! line. Name, price and image are snapshotted from the live product when
//! the line is first created, so later catalog edits do not change the cart.

use std::collections::HashMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use luxe_core::{CartItemId, Money, ProductId, Quantity};

use super::ServiceError;
use crate::db::{CartRepository, CatalogRepository, RepositoryError};
use crate::models::{CartItem, CartLine, CartSummary, CurrentUser, NewCartItem};

/// Add-to-cart form.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCart {
    pub product_id: ProductId,
    pub size: String,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
}

const fn default_quantity() -> i64 {
    1
}

/// Cart service.
#[derive(Clone)]
pub struct CartService {
    carts: Arc<dyn CartRepository>,
    catalog: Arc<dyn CatalogRepository>,
    tax_rate: Decimal,
}

impl CartService {
    /// Create a cart service quoting tax at `tax_rate` (e.g. `0.08`).
    #[must_use]
    pub fn new(
        carts: Arc<dyn CartRepository>,
        catalog: Arc<dyn CatalogRepository>,
        tax_rate: Decimal,
    ) -> Self {
        Self {
            carts,
            catalog,
            tax_rate,
        }
    }

    /// Add a variant to the cart, merging with an existing line.
    ///
    /// Returns the resulting line and whether it was merged.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` for a non-positive quantity, a
    /// blank size, an out-of-stock product, or a size the product does not
    /// offer, and `ServiceError::NotFound` for unknown products.
    #[instrument(skip(self, user, form), fields(user_id = %user.id, product_id = %form.product_id))]
    pub async fn add_item(
        &self,
        user: &CurrentUser,
        form: AddToCart,
    ) -> Result<(CartItem, bool), ServiceError> {
        let quantity = Quantity::from_signed(form.quantity)
            .map_err(|e| ServiceError::invalid(e.to_string()))?;
        let size = form.size.trim();
        if size.is_empty() {
            return Err(ServiceError::invalid("size is required"));
        }

        let product = self
            .catalog
            .get_product(form.product_id)
            .await?
            .ok_or(ServiceError::NotFound("product"))?;

        if !product.in_stock {
            return Err(ServiceError::invalid(format!("{} is out of stock", product.name)));
        }
        if !product.offers_size(size) {
            return Err(ServiceError::invalid(format!(
                "{} is not available in size {size}",
                product.name
            )));
        }

        let (item, merged) = self
            .carts
            .add_or_merge(
                user.id,
                NewCartItem {
                    product_id: product.id,
                    name: product.name,
                    price: product.price,
                    size: size.to_owned(),
                    quantity,
                    image_url: product.image_url,
                },
            )
            .await?;

        tracing::info!(cart_item_id = %item.id, quantity = %item.quantity, merged, "Cart item added");
        Ok((item, merged))
    }

    /// Set a line's quantity. A quantity `<= 0` removes the line and
    /// returns `None`.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the line is not in the caller's
    /// cart.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn update_quantity(
        &self,
        user: &CurrentUser,
        item: CartItemId,
        quantity: i64,
    ) -> Result<Option<CartItem>, ServiceError> {
        if quantity <= 0 {
            self.remove(user, item).await?;
            return Ok(None);
        }

        let quantity =
            Quantity::from_signed(quantity).map_err(|e| ServiceError::invalid(e.to_string()))?;
        let updated = self
            .carts
            .set_quantity(user.id, item, quantity)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => ServiceError::NotFound("cart item"),
                other => other.into(),
            })?;
        Ok(Some(updated))
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the line is not in the caller's
    /// cart. The cart is unchanged in that case.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn remove(&self, user: &CurrentUser, item: CartItemId) -> Result<(), ServiceError> {
        if self.carts.remove(user.id, item).await? {
            Ok(())
        } else {
            Err(ServiceError::NotFound("cart item"))
        }
    }

    /// Empty the cart. Returns the number of lines removed.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the store fails.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn clear(&self, user: &CurrentUser) -> Result<u64, ServiceError> {
        Ok(self.carts.clear(user.id).await?)
    }

    /// The caller's raw cart lines, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the store fails.
    pub async fn items(&self, user: &CurrentUser) -> Result<Vec<CartItem>, ServiceError> {
        Ok(self.carts.list_items(user.id).await?)
    }

    /// Cart lines joined with their live product, which is `None` once the
    /// product has been deleted.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the store fails.
    pub async fn lines(&self, user: &CurrentUser) -> Result<Vec<CartLine>, ServiceError> {
        let items = self.items(user).await?;

        let mut products = HashMap::new();
        for item in &items {
            if !products.contains_key(&item.product_id) {
                let product = self.catalog.get_product(item.product_id).await?;
                products.insert(item.product_id, product);
            }
        }

        Ok(items
            .into_iter()
            .map(|item| {
                let product = products.get(&item.product_id).cloned().flatten();
                CartLine { item, product }
            })
            .collect())
    }

    /// `Σ price × quantity` over the caller's lines.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` if the total overflows.
    pub async fn total(&self, user: &CurrentUser) -> Result<Money, ServiceError> {
        subtotal(&self.items(user).await?)
    }

    /// Checkout quote: subtotal, tax, shipping and grand total.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` if an amount overflows.
    pub async fn summary(&self, user: &CurrentUser) -> Result<CartSummary, ServiceError> {
        let items = self.items(user).await?;
        let subtotal = subtotal(&items)?;
        let tax = subtotal
            .checked_apply_rate(self.tax_rate)
            .ok_or_else(out_of_range)?;
        let shipping = Money::zero();
        let total = Money::checked_sum([subtotal, tax, shipping]).ok_or_else(out_of_range)?;

        Ok(CartSummary {
            item_count: items.iter().map(|i| u64::from(i.quantity.get())).sum(),
            subtotal,
            tax,
            shipping,
            total,
        })
    }
}

fn subtotal(items: &[CartItem]) -> Result<Money, ServiceError> {
    let lines = items
        .iter()
        .map(CartItem::line_total)
        .collect::<Option<Vec<_>>>()
        .ok_or_else(out_of_range)?;
    Money::checked_sum(lines).ok_or_else(out_of_range)
}

fn out_of_range() -> ServiceError {
    ServiceError::invalid("cart total is out of range")
}
