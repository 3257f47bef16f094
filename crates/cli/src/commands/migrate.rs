//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! luxe-cli migrate
//! ```
//!
//! Migration files live in `crates/storefront/migrations/` and are embedded
//! into the binary at build time.

use luxe_storefront::db::MIGRATOR;

use super::{CliError, connect};

/// Run storefront database migrations.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), CliError> {
    let pool = connect().await?;

    tracing::info!("Running storefront migrations...");
    MIGRATOR.run(&pool).await?;

    tracing::info!("Storefront migrations complete!");
    Ok(())
}
