//! Order domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use luxe_core::{Money, OrderId, OrderItemId, OrderStatus, ProductId, Quantity, UserId};

/// An order header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub total: Money,
    pub shipping_address: Option<String>,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

/// A recorded order line. Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: Option<ProductId>,
    pub quantity: Quantity,
    pub price: Money,
    pub size: Option<String>,
}

/// An order together with its lines, in submission order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// A validated checkout submission.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub items: Vec<NewOrderItem>,
    pub shipping_address: Option<String>,
    pub total: Money,
}

/// A validated order line, copied verbatim into the order.
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product_id: Option<ProductId>,
    pub quantity: Quantity,
    pub price: Money,
    pub size: Option<String>,
}
