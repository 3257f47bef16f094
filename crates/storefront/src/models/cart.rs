//! Cart domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use luxe_core::{CartItemId, Money, ProductId, Quantity, UserId};

use super::Product;

/// One line in a user's cart.
///
/// `name`, `price` and `image_url` are snapshots taken when the line was
/// first added; later catalog edits do not change them. There is at most one
/// line per `(user_id, product_id, size)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: CartItemId,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub name: String,
    pub price: Money,
    pub size: String,
    pub quantity: Quantity,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl CartItem {
    /// `price * quantity`, or `None` on overflow.
    #[must_use]
    pub fn line_total(&self) -> Option<Money> {
        self.price.checked_mul_quantity(self.quantity)
    }
}

/// Input for adding a line to a cart.
#[derive(Debug, Clone)]
pub struct NewCartItem {
    pub product_id: ProductId,
    pub name: String,
    pub price: Money,
    pub size: String,
    pub quantity: Quantity,
    pub image_url: Option<String>,
}

/// A cart line joined with the live product, which is `None` once the
/// product has been deleted.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    #[serde(flatten)]
    pub item: CartItem,
    pub product: Option<Product>,
}

/// Checkout quote for a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSummary {
    /// Sum of line quantities.
    pub item_count: u64,
    pub subtotal: Money,
    pub tax: Money,
    pub shipping: Money,
    pub total: Money,
}
