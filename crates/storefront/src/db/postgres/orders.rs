//! Order queries.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use luxe_core::{CartItemId, Money, OrderId, OrderItemId, OrderStatus, ProductId, Quantity, UserId};

use super::PgStore;
use crate::db::{OrderRepository, RepositoryError};
use crate::models::{NewOrder, Order, OrderItem, OrderWithItems};

const ORDER_COLUMNS: &str = "id, user_id, total, shipping_address, status, created_at";
const ORDER_ITEM_COLUMNS: &str = "id, order_id, product_id, quantity, price, size";

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    user_id: UserId,
    total: Money,
    shipping_address: Option<String>,
    status: OrderStatus,
    created_at: DateTime<Utc>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            total: row.total,
            shipping_address: row.shipping_address,
            status: row.status,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: OrderItemId,
    order_id: OrderId,
    product_id: Option<ProductId>,
    quantity: Quantity,
    price: Money,
    size: Option<String>,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        Self {
            id: row.id,
            order_id: row.order_id,
            product_id: row.product_id,
            quantity: row.quantity,
            price: row.price,
            size: row.size,
        }
    }
}

#[async_trait]
impl OrderRepository for PgStore {
    async fn place_order(
        &self,
        user: UserId,
        order: NewOrder,
    ) -> Result<OrderWithItems, RepositoryError> {
        let mut tx = self.pool().begin().await?;

        // Locking the cart rows serializes concurrent checkouts of one cart;
        // the loser re-reads after the winner's delete and sees nothing.
        let locked = sqlx::query_scalar::<_, CartItemId>(
            "SELECT id FROM storefront.cart_item WHERE user_id = $1 FOR UPDATE",
        )
        .bind(user)
        .fetch_all(&mut *tx)
        .await?;

        if locked.is_empty() {
            return Err(RepositoryError::EmptyCart);
        }

        let header = sqlx::query_as::<_, OrderRow>(&format!(
            r#"
            INSERT INTO storefront."order" (id, user_id, total, shipping_address, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(OrderId::new())
        .bind(user)
        .bind(order.total)
        .bind(&order.shipping_address)
        .bind(OrderStatus::Pending)
        .fetch_one(&mut *tx)
        .await?;

        let mut items = Vec::with_capacity(order.items.len());
        for (index, item) in order.items.iter().enumerate() {
            let position = i32::try_from(index)
                .map_err(|_| RepositoryError::Conflict("too many order lines".to_owned()))?;

            let row = sqlx::query_as::<_, OrderItemRow>(&format!(
                r"
                INSERT INTO storefront.order_item
                    (id, order_id, position, product_id, quantity, price, size)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING {ORDER_ITEM_COLUMNS}
                "
            ))
            .bind(OrderItemId::new())
            .bind(header.id)
            .bind(position)
            .bind(item.product_id)
            .bind(item.quantity)
            .bind(item.price)
            .bind(&item.size)
            .fetch_one(&mut *tx)
            .await?;

            items.push(row.into());
        }

        sqlx::query("DELETE FROM storefront.cart_item WHERE user_id = $1")
            .bind(user)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(OrderWithItems {
            order: header.into(),
            items,
        })
    }

    async fn list_orders(&self, user: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            r#"
            SELECT {ORDER_COLUMNS}
            FROM storefront."order"
            WHERE user_id = $1
            ORDER BY created_at DESC, id
            "#
        ))
        .bind(user)
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn get_order(
        &self,
        user: UserId,
        id: OrderId,
    ) -> Result<Option<OrderWithItems>, RepositoryError> {
        let header = sqlx::query_as::<_, OrderRow>(&format!(
            r#"
            SELECT {ORDER_COLUMNS}
            FROM storefront."order"
            WHERE id = $1 AND user_id = $2
            "#
        ))
        .bind(id)
        .bind(user)
        .fetch_optional(self.pool())
        .await?;

        let Some(header) = header else {
            return Ok(None);
        };

        let items = sqlx::query_as::<_, OrderItemRow>(&format!(
            r"
            SELECT {ORDER_ITEM_COLUMNS}
            FROM storefront.order_item
            WHERE order_id = $1
            ORDER BY position
            "
        ))
        .bind(id)
        .fetch_all(self.pool())
        .await?;

        Ok(Some(OrderWithItems {
            order: header.into(),
            items: items.into_iter().map(Into::into).collect(),
        }))
    }
}
