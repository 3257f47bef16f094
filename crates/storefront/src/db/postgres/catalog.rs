//! Category and product queries.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use luxe_core::{CategoryId, Money, ProductId, Slug};

use super::PgStore;
use crate::db::{CatalogRepository, RepositoryError};
use crate::models::{Category, NewCategory, NewProduct, Product, ProductFilter, ProductUpdate};

const PRODUCT_COLUMNS: &str = "id, name, slug, description, price, category_id, image_url, \
                               sizes, in_stock, featured, on_sale, created_at";

#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: CategoryId,
    name: String,
    slug: Slug,
    description: Option<String>,
    image_url: Option<String>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            slug: row.slug,
            description: row.description,
            image_url: row.image_url,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    name: String,
    slug: Slug,
    description: Option<String>,
    price: Money,
    category_id: Option<CategoryId>,
    image_url: Option<String>,
    sizes: Vec<String>,
    in_stock: bool,
    featured: bool,
    on_sale: bool,
    created_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            slug: row.slug,
            description: row.description,
            price: row.price,
            category_id: row.category_id,
            image_url: row.image_url,
            sizes: row.sizes,
            in_stock: row.in_stock,
            featured: row.featured,
            on_sale: row.on_sale,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl CatalogRepository for PgStore {
    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            r"
            SELECT id, name, slug, description, image_url
            FROM storefront.category
            ORDER BY name, id
            ",
        )
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn get_category_by_slug(
        &self,
        slug: &Slug,
    ) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r"
            SELECT id, name, slug, description, image_url
            FROM storefront.category
            WHERE slug = $1
            ",
        )
        .bind(slug)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(Into::into))
    }

    async fn create_category(&self, new: NewCategory) -> Result<Category, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r"
            INSERT INTO storefront.category (id, name, slug, description, image_url)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, slug, description, image_url
            ",
        )
        .bind(CategoryId::new())
        .bind(&new.name)
        .bind(&new.slug)
        .bind(&new.description)
        .bind(&new.image_url)
        .fetch_one(self.pool())
        .await
        .map_err(|e| RepositoryError::from_unique(e, "category slug"))?;

        Ok(row.into())
    }

    async fn list_products(&self, filter: ProductFilter) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            SELECT {PRODUCT_COLUMNS}
            FROM storefront.product
            WHERE ($1::uuid IS NULL OR category_id = $1)
              AND ($2::boolean IS NULL OR featured = $2)
              AND ($3::boolean IS NULL OR on_sale = $3)
            ORDER BY created_at DESC, id
            "
        ))
        .bind(filter.category_id)
        .bind(filter.featured)
        .bind(filter.on_sale)
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM storefront.product WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(Into::into))
    }

    async fn get_product_by_slug(&self, slug: &Slug) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM storefront.product WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(Into::into))
    }

    async fn create_product(&self, new: NewProduct) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            INSERT INTO storefront.product
                (id, name, slug, description, price, category_id, image_url,
                 sizes, in_stock, featured, on_sale)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(ProductId::new())
        .bind(&new.name)
        .bind(&new.slug)
        .bind(&new.description)
        .bind(new.price)
        .bind(new.category_id)
        .bind(&new.image_url)
        .bind(&new.sizes)
        .bind(new.in_stock)
        .bind(new.featured)
        .bind(new.on_sale)
        .fetch_one(self.pool())
        .await
        .map_err(|e| RepositoryError::from_unique(e, "product slug"))?;

        Ok(row.into())
    }

    async fn update_product(
        &self,
        id: ProductId,
        update: ProductUpdate,
    ) -> Result<Product, RepositoryError> {
        let mut tx = self.pool().begin().await?;

        let current = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM storefront.product WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        let mut product = Product::from(current);
        product.apply(update);

        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            UPDATE storefront.product
            SET name = $2, slug = $3, description = $4, price = $5, category_id = $6,
                image_url = $7, sizes = $8, in_stock = $9, featured = $10, on_sale = $11
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(id)
        .bind(&product.name)
        .bind(&product.slug)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.category_id)
        .bind(&product.image_url)
        .bind(&product.sizes)
        .bind(product.in_stock)
        .bind(product.featured)
        .bind(product.on_sale)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "product slug"))?;

        tx.commit().await?;
        Ok(row.into())
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM storefront.product WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
