//! `PostgreSQL` repository backend.
//!
//! Queries are built at runtime with `sqlx::query_as` and decoded through
//! internal row types, which convert into domain models and report bad
//! stored data as `RepositoryError::DataCorruption`.

mod carts;
mod catalog;
mod orders;
mod users;

use async_trait::async_trait;
use sqlx::PgPool;

use super::{RepositoryError, StoreHealth};

/// Repository backend over a `PostgreSQL` pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create a store over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl StoreHealth for PgStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
