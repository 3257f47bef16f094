//! Order service: checkout and order history.

use std::sync::Arc;

use serde::Deserialize;
use tracing::instrument;

use luxe_core::{Money, OrderId, ProductId, Quantity};

use super::ServiceError;
use crate::db::OrderRepository;
use crate::models::{CurrentUser, NewOrder, NewOrderItem, Order, OrderWithItems};

/// Checkout form. Lines are recorded exactly as submitted.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrder {
    pub items: Vec<OrderLineInput>,
    #[serde(default)]
    pub shipping_address: Option<String>,
    pub total: Money,
}

/// One submitted order line.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineInput {
    #[serde(default)]
    pub product_id: Option<ProductId>,
    pub quantity: i64,
    pub price: Money,
    #[serde(default)]
    pub size: Option<String>,
}

/// Order service.
#[derive(Clone)]
pub struct OrderService {
    orders: Arc<dyn OrderRepository>,
}

impl OrderService {
    /// Create a new order service.
    #[must_use]
    pub fn new(orders: Arc<dyn OrderRepository>) -> Self {
        Self { orders }
    }

    /// Record an order and clear the caller's cart in one step.
    ///
    /// Every line is validated before anything is written. A `total` that
    /// disagrees with the lines is stored as given and logged.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` for an empty line list, a
    /// non-positive quantity or a blank shipping address, and
    /// `ServiceError::EmptyCart` if the cart was already checked out.
    #[instrument(skip(self, user, form), fields(user_id = %user.id, lines = form.items.len()))]
    pub async fn place(
        &self,
        user: &CurrentUser,
        form: PlaceOrder,
    ) -> Result<OrderWithItems, ServiceError> {
        if form.items.is_empty() {
            return Err(ServiceError::invalid("order must contain at least one item"));
        }

        let shipping_address = match form.shipping_address {
            Some(address) if address.trim().is_empty() => {
                return Err(ServiceError::invalid("shipping address cannot be blank"));
            }
            Some(address) => Some(address.trim().to_owned()),
            None => None,
        };

        let items = form
            .items
            .into_iter()
            .map(|line| {
                let quantity = Quantity::from_signed(line.quantity)
                    .map_err(|e| ServiceError::invalid(e.to_string()))?;
                Ok(NewOrderItem {
                    product_id: line.product_id,
                    quantity,
                    price: line.price,
                    size: line.size,
                })
            })
            .collect::<Result<Vec<_>, ServiceError>>()?;

        let computed = items.iter().try_fold(Money::zero(), |sum, item| {
            sum.checked_add(item.price.checked_mul_quantity(item.quantity)?)
        });
        if computed != Some(form.total) {
            tracing::warn!(
                submitted = %form.total,
                computed = ?computed.map(|m| m.to_string()),
                "Order total differs from its lines"
            );
        }

        let placed = self
            .orders
            .place_order(
                user.id,
                NewOrder {
                    items,
                    shipping_address,
                    total: form.total,
                },
            )
            .await?;

        tracing::info!(order_id = %placed.order.id, total = %placed.order.total, "Order placed");
        Ok(placed)
    }

    /// The caller's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the store fails.
    pub async fn list(&self, user: &CurrentUser) -> Result<Vec<Order>, ServiceError> {
        Ok(self.orders.list_orders(user.id).await?)
    }

    /// One of the caller's orders with its lines.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` when the order does not exist or
    /// belongs to someone else.
    pub async fn get(&self, user: &CurrentUser, id: OrderId) -> Result<OrderWithItems, ServiceError> {
        self.orders
            .get_order(user.id, id)
            .await?
            .ok_or(ServiceError::NotFound("order"))
    }
}
