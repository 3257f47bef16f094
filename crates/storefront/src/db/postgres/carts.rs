//! Cart queries. Every statement is scoped by `user_id`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use luxe_core::{CartItemId, Money, ProductId, Quantity, UserId};

use super::PgStore;
use crate::db::{CartRepository, RepositoryError};
use crate::models::{CartItem, NewCartItem};

const CART_COLUMNS: &str =
    "id, user_id, product_id, name, price, size, quantity, image_url, created_at";

#[derive(Debug, sqlx::FromRow)]
struct CartItemRow {
    id: CartItemId,
    user_id: UserId,
    product_id: ProductId,
    name: String,
    price: Money,
    size: String,
    quantity: Quantity,
    image_url: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<CartItemRow> for CartItem {
    fn from(row: CartItemRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            product_id: row.product_id,
            name: row.name,
            price: row.price,
            size: row.size,
            quantity: row.quantity,
            image_url: row.image_url,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl CartRepository for PgStore {
    async fn list_items(&self, user: UserId) -> Result<Vec<CartItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, CartItemRow>(&format!(
            r"
            SELECT {CART_COLUMNS}
            FROM storefront.cart_item
            WHERE user_id = $1
            ORDER BY created_at, id
            "
        ))
        .bind(user)
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn add_or_merge(
        &self,
        user: UserId,
        item: NewCartItem,
    ) -> Result<(CartItem, bool), RepositoryError> {
        let id = CartItemId::new();

        // The upsert keeps the existing row's id, so a different id back
        // means the quantity was merged into it.
        let row = sqlx::query_as::<_, CartItemRow>(&format!(
            r"
            INSERT INTO storefront.cart_item
                (id, user_id, product_id, name, price, size, quantity, image_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT ON CONSTRAINT cart_item_variant_key
            DO UPDATE SET quantity = storefront.cart_item.quantity + EXCLUDED.quantity
            RETURNING {CART_COLUMNS}
            "
        ))
        .bind(id)
        .bind(user)
        .bind(item.product_id)
        .bind(&item.name)
        .bind(item.price)
        .bind(&item.size)
        .bind(item.quantity)
        .bind(&item.image_url)
        .fetch_one(self.pool())
        .await
        .map_err(map_quantity_overflow)?;

        let merged = row.id != id;
        Ok((row.into(), merged))
    }

    async fn set_quantity(
        &self,
        user: UserId,
        item: CartItemId,
        quantity: Quantity,
    ) -> Result<CartItem, RepositoryError> {
        let row = sqlx::query_as::<_, CartItemRow>(&format!(
            r"
            UPDATE storefront.cart_item
            SET quantity = $3
            WHERE id = $1 AND user_id = $2
            RETURNING {CART_COLUMNS}
            "
        ))
        .bind(item)
        .bind(user)
        .bind(quantity)
        .fetch_optional(self.pool())
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    async fn remove(&self, user: UserId, item: CartItemId) -> Result<bool, RepositoryError> {
        let result =
            sqlx::query("DELETE FROM storefront.cart_item WHERE id = $1 AND user_id = $2")
                .bind(item)
                .bind(user)
                .execute(self.pool())
                .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn clear(&self, user: UserId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM storefront.cart_item WHERE user_id = $1")
            .bind(user)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected())
    }
}

/// `22003` is `numeric_value_out_of_range`: the merged quantity no longer
/// fits the column.
fn map_quantity_overflow(err: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = err
        && db_err.code().as_deref() == Some("22003")
    {
        return RepositoryError::Conflict("cart quantity is too large".to_owned());
    }
    RepositoryError::Database(err)
}
