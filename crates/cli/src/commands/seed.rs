//! Seed the catalog from YAML.
//!
//! # Usage
//!
//! ```bash
//! # Load the built-in demo catalog
//! luxe-cli seed
//!
//! # Load a custom catalog
//! luxe-cli seed --file catalog.yaml
//! ```
//!
//! Categories and products whose slug already exists are skipped, so the
//! command is safe to re-run.

use std::path::Path;

use luxe_storefront::db::Repositories;
use luxe_storefront::seed::{SeedCatalog, seed_catalog};

use super::{CliError, connect};

/// Load a catalog file (or the demo catalog) into the database.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or if database
/// operations fail.
pub async fn catalog(file: Option<&Path>) -> Result<(), CliError> {
    // Parse before connecting so a bad file fails fast
    let catalog = match file {
        Some(path) => {
            tracing::info!(path = %path.display(), "Loading catalog from file");
            SeedCatalog::from_file(path).await?
        }
        None => {
            tracing::info!("Loading built-in demo catalog");
            SeedCatalog::demo()?
        }
    };
    tracing::info!(
        categories = catalog.categories.len(),
        products = catalog.products.len(),
        "Parsed catalog"
    );

    let repos = Repositories::postgres(connect().await?);
    let result = seed_catalog(repos.catalog.as_ref(), &catalog).await?;

    tracing::info!("Seeding complete!");
    tracing::info!("  Categories inserted: {}", result.categories_inserted);
    tracing::info!("  Products inserted: {}", result.products_inserted);
    tracing::info!("  Skipped (already present): {}", result.skipped);
    Ok(())
}
