//! Load a catalog of categories and products from YAML.
//!
//! Used by `luxe-cli seed` against `PostgreSQL` and by the storefront at
//! startup when `LUXE_SEED_DEMO=true`. Entries whose slug already exists are
//! skipped, so seeding is safe to repeat.
//!
//! ## YAML Format
//!
//! ```yaml
//! categories:
//!   - name: "Footwear"
//!     slug: footwear
//!     description: "Step up your style game"
//!
//! products:
//!   - name: "Leather Sneakers"
//!     slug: leather-sneakers
//!     price: "139.00"
//!     category: footwear
//!     sizes: ["40", "41", "42"]
//!     featured: true
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::instrument;

use luxe_core::{CategoryId, Money, Slug};

use crate::db::{CatalogRepository, RepositoryError};
use crate::models::{NewCategory, NewProduct};

/// The demo catalog shipped with the storefront.
const DEMO_CATALOG: &str = include_str!("../data/catalog.yaml");

/// Errors raised while seeding.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse catalog YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("product {product} references unknown category {category}")]
    UnknownCategory { product: String, category: String },

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// A category entry.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedCategory {
    pub name: String,
    pub slug: Slug,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// A product entry. `category` is a category slug.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedProduct {
    pub name: String,
    pub slug: Slug,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Money,
    #[serde(default)]
    pub category: Option<Slug>,
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

/// Full catalog file structure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeedCatalog {
    #[serde(default)]
    pub categories: Vec<SeedCategory>,
    #[serde(default)]
    pub products: Vec<SeedProduct>,
}

impl SeedCatalog {
    /// Parse a catalog from YAML text.
    ///
    /// # Errors
    ///
    /// Returns `SeedError::Parse` for malformed YAML, bad slugs or prices.
    pub fn from_yaml(yaml: &str) -> Result<Self, SeedError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// The embedded demo catalog.
    ///
    /// # Errors
    ///
    /// Returns `SeedError::Parse` if the embedded file is malformed.
    pub fn demo() -> Result<Self, SeedError> {
        Self::from_yaml(DEMO_CATALOG)
    }

    /// Read and parse a catalog file.
    ///
    /// # Errors
    ///
    /// Returns `SeedError::Io` if the file cannot be read and
    /// `SeedError::Parse` if it is malformed.
    pub async fn from_file(path: &Path) -> Result<Self, SeedError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| SeedError::Io {
                path: path.display().to_string(),
                source,
            })?;
        Self::from_yaml(&content)
    }
}

/// Result of a seeding run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedResult {
    pub categories_inserted: u64,
    pub products_inserted: u64,
    /// Entries skipped because their slug already exists.
    pub skipped: u64,
}

/// Insert every category, then every product, skipping existing slugs.
///
/// # Errors
///
/// Returns `SeedError::UnknownCategory` if a product names a category that
/// is neither in the file nor already stored, and `SeedError::Repository`
/// if the store fails.
#[instrument(skip_all, fields(categories = catalog.categories.len(), products = catalog.products.len()))]
pub async fn seed_catalog(
    repo: &dyn CatalogRepository,
    catalog: &SeedCatalog,
) -> Result<SeedResult, SeedError> {
    let mut result = SeedResult::default();
    let mut category_ids: HashMap<Slug, CategoryId> = HashMap::new();

    for entry in &catalog.categories {
        if let Some(existing) = repo.get_category_by_slug(&entry.slug).await? {
            category_ids.insert(entry.slug.clone(), existing.id);
            result.skipped += 1;
            continue;
        }

        let category = repo
            .create_category(NewCategory {
                name: entry.name.clone(),
                slug: entry.slug.clone(),
                description: entry.description.clone(),
                image_url: entry.image_url.clone(),
            })
            .await?;
        tracing::debug!(slug = %category.slug, "Seeded category");
        category_ids.insert(category.slug, category.id);
        result.categories_inserted += 1;
    }

    for entry in &catalog.products {
        if repo.get_product_by_slug(&entry.slug).await?.is_some() {
            result.skipped += 1;
            continue;
        }

        let category_id = match &entry.category {
            Some(slug) => Some(resolve_category(repo, &mut category_ids, entry, slug).await?),
            None => None,
        };

        let product = repo
            .create_product(NewProduct {
                name: entry.name.clone(),
                slug: entry.slug.clone(),
                description: entry.description.clone(),
                price: entry.price,
                category_id,
                image_url: entry.image_url.clone(),
                sizes: entry.sizes.clone(),
                in_stock: entry.in_stock,
                featured: entry.featured,
                on_sale: entry.on_sale,
            })
            .await?;
        tracing::debug!(slug = %product.slug, "Seeded product");
        result.products_inserted += 1;
    }

    tracing::info!(
        categories = result.categories_inserted,
        products = result.products_inserted,
        skipped = result.skipped,
        "Catalog seeded"
    );
    Ok(result)
}

async fn resolve_category(
    repo: &dyn CatalogRepository,
    known: &mut HashMap<Slug, CategoryId>,
    product: &SeedProduct,
    slug: &Slug,
) -> Result<CategoryId, SeedError> {
    if let Some(id) = known.get(slug) {
        return Ok(*id);
    }
    let category = repo
        .get_category_by_slug(slug)
        .await?
        .ok_or_else(|| SeedError::UnknownCategory {
            product: product.slug.to_string(),
            category: slug.to_string(),
        })?;
    known.insert(slug.clone(), category.id);
    Ok(category.id)
}
