//! Catalog service: browsing, search, admin CRUD and stats.

use std::collections::HashSet;
use std::sync::Arc;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use luxe_core::{CategoryId, Money, ProductId, Slug};

use super::ServiceError;
use crate::db::CatalogRepository;
use crate::models::{Category, NewProduct, Product, ProductFilter, ProductUpdate};

/// Maximum number of search results.
pub const SEARCH_LIMIT: usize = 8;

/// Client-selectable product ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProductSort {
    /// Featured products first, otherwise newest first.
    Featured,
    /// Cheapest first.
    PriceLow,
    /// Most expensive first.
    PriceHigh,
    /// Newest first.
    #[default]
    Newest,
}

impl ProductSort {
    /// Re-sort a newest-first list. The sort is stable, so ties keep their
    /// creation order.
    fn apply(self, products: &mut [Product]) {
        match self {
            Self::Newest => {}
            Self::Featured => products.sort_by_key(|p| !p.featured),
            Self::PriceLow => products.sort_by_key(|p| p.price),
            Self::PriceHigh => products.sort_by(|a, b| b.price.cmp(&a.price)),
        }
    }
}

/// Admin form for creating a product.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Money,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub sizes: Vec<String>,
    #[serde(default = "default_in_stock")]
    pub in_stock: bool,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub on_sale: bool,
}

const fn default_in_stock() -> bool {
    true
}

/// Admin form for a partial product update.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub price: Option<Money>,
    pub category_id: Option<CategoryId>,
    pub image_url: Option<String>,
    pub sizes: Option<Vec<String>>,
    pub in_stock: Option<bool>,
    pub featured: Option<bool>,
    pub on_sale: Option<bool>,
}

/// Dashboard numbers for the admin panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogStats {
    pub total_products: usize,
    pub featured_products: usize,
    pub catalog_value: Money,
    pub average_price: Money,
}

/// Catalog service.
#[derive(Clone)]
pub struct CatalogService {
    catalog: Arc<dyn CatalogRepository>,
}

impl CatalogService {
    /// Create a new catalog service.
    #[must_use]
    pub fn new(catalog: Arc<dyn CatalogRepository>) -> Self {
        Self { catalog }
    }

    /// All categories, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the query fails.
    pub async fn categories(&self) -> Result<Vec<Category>, ServiceError> {
        Ok(self.catalog.list_categories().await?)
    }

    /// Look up a category by slug.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` for unknown or malformed slugs.
    pub async fn category_by_slug(&self, slug: &str) -> Result<Category, ServiceError> {
        let slug = Slug::parse(slug).map_err(|_| ServiceError::NotFound("category"))?;
        self.catalog
            .get_category_by_slug(&slug)
            .await?
            .ok_or(ServiceError::NotFound("category"))
    }

    /// Products matching `filter`, in `sort` order.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the query fails.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        filter: ProductFilter,
        sort: ProductSort,
    ) -> Result<Vec<Product>, ServiceError> {
        let mut products = self.catalog.list_products(filter).await?;
        sort.apply(&mut products);
        Ok(products)
    }

    /// Case-insensitive substring search over name and description.
    ///
    /// A blank query returns nothing. At most [`SEARCH_LIMIT`] results.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the query fails.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str) -> Result<Vec<Product>, ServiceError> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }

        let products = self.catalog.list_products(ProductFilter::default()).await?;
        Ok(products
            .into_iter()
            .filter(|p| {
                p.name.to_lowercase().contains(&needle)
                    || p.description
                        .as_deref()
                        .is_some_and(|d| d.to_lowercase().contains(&needle))
            })
            .take(SEARCH_LIMIT)
            .collect())
    }

    /// Look up a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` for unknown IDs.
    pub async fn get(&self, id: ProductId) -> Result<Product, ServiceError> {
        self.catalog
            .get_product(id)
            .await?
            .ok_or(ServiceError::NotFound("product"))
    }

    /// Look up a product by slug.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` for unknown or malformed slugs.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Product, ServiceError> {
        let slug = Slug::parse(slug).map_err(|_| ServiceError::NotFound("product"))?;
        self.catalog
            .get_product_by_slug(&slug)
            .await?
            .ok_or(ServiceError::NotFound("product"))
    }

    /// Create a product. The slug is derived from the name when omitted.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` for a blank name, a bad slug, bad
    /// size labels or an unknown category, and `ServiceError::Conflict` if
    /// the slug is taken.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(&self, input: ProductInput) -> Result<Product, ServiceError> {
        let name = required_name(&input.name)?;
        let slug = match input.slug.as_deref() {
            Some(slug) => parse_slug(slug)?,
            None => Slug::from_name(&name)
                .map_err(|e| ServiceError::invalid(format!("cannot derive slug: {e}")))?,
        };
        let sizes = validate_sizes(input.sizes)?;
        self.ensure_category(input.category_id).await?;

        let product = self
            .catalog
            .create_product(NewProduct {
                name,
                slug,
                description: input.description,
                price: input.price,
                category_id: input.category_id,
                image_url: input.image_url,
                sizes,
                in_stock: input.in_stock,
                featured: input.featured,
                on_sale: input.on_sale,
            })
            .await?;

        tracing::info!(product_id = %product.id, slug = %product.slug, "Product created");
        Ok(product)
    }

    /// Apply a partial update.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` for unknown IDs, plus the validation
    /// and conflict errors of [`CatalogService::create`].
    #[instrument(skip(self, patch))]
    pub async fn update(&self, id: ProductId, patch: ProductPatch) -> Result<Product, ServiceError> {
        let update = ProductUpdate {
            name: patch.name.as_deref().map(required_name).transpose()?,
            slug: patch.slug.as_deref().map(parse_slug).transpose()?,
            description: patch.description,
            price: patch.price,
            category_id: patch.category_id,
            image_url: patch.image_url,
            sizes: patch.sizes.map(validate_sizes).transpose()?,
            in_stock: patch.in_stock,
            featured: patch.featured,
            on_sale: patch.on_sale,
        };
        self.ensure_category(update.category_id).await?;

        let product = self
            .catalog
            .update_product(id, update)
            .await
            .map_err(|e| match e {
                crate::db::RepositoryError::NotFound => ServiceError::NotFound("product"),
                other => other.into(),
            })?;

        tracing::info!(product_id = %product.id, "Product updated");
        Ok(product)
    }

    /// Delete a product. Cart and order rows keep their snapshots.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` for unknown IDs.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: ProductId) -> Result<(), ServiceError> {
        if !self.catalog.delete_product(id).await? {
            return Err(ServiceError::NotFound("product"));
        }
        tracing::info!(product_id = %id, "Product deleted");
        Ok(())
    }

    /// Counts and value of the whole catalog.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` if the catalog value overflows.
    pub async fn stats(&self) -> Result<CatalogStats, ServiceError> {
        let products = self.catalog.list_products(ProductFilter::default()).await?;

        let catalog_value = Money::checked_sum(products.iter().map(|p| p.price))
            .ok_or_else(|| ServiceError::invalid("catalog value is out of range"))?;

        let average_price = if products.is_empty() {
            Money::zero()
        } else {
            let average = catalog_value
                .amount()
                .checked_div(Decimal::from(products.len()))
                .ok_or_else(|| ServiceError::invalid("catalog value is out of range"))?
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
            Money::from_decimal(average).map_err(|e| ServiceError::invalid(e.to_string()))?
        };

        Ok(CatalogStats {
            total_products: products.len(),
            featured_products: products.iter().filter(|p| p.featured).count(),
            catalog_value,
            average_price,
        })
    }

    async fn ensure_category(&self, id: Option<CategoryId>) -> Result<(), ServiceError> {
        let Some(id) = id else {
            return Ok(());
        };
        let known = self.catalog.list_categories().await?;
        if known.iter().any(|c| c.id == id) {
            Ok(())
        } else {
            Err(ServiceError::invalid("unknown category"))
        }
    }
}

fn required_name(name: &str) -> Result<String, ServiceError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::invalid("product name is required"));
    }
    Ok(trimmed.to_owned())
}

fn parse_slug(slug: &str) -> Result<Slug, ServiceError> {
    Slug::parse(slug.trim()).map_err(|e| ServiceError::invalid(format!("invalid slug: {e}")))
}

/// Size labels must be non-blank and unique; order is kept.
fn validate_sizes(sizes: Vec<String>) -> Result<Vec<String>, ServiceError> {
    let mut seen = HashSet::with_capacity(sizes.len());
    let mut labels = Vec::with_capacity(sizes.len());
    for size in sizes {
        let label = size.trim().to_owned();
        if label.is_empty() {
            return Err(ServiceError::invalid("size labels cannot be blank"));
        }
        if !seen.insert(label.clone()) {
            return Err(ServiceError::invalid(format!("duplicate size label: {label}")));
        }
        labels.push(label);
    }
    Ok(labels)
}
