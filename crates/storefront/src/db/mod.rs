//! Persistence for the storefront.
//!
//! Handlers and services never touch a store directly. They go through the
//! repository traits defined here, bundled in [`Repositories`]. Two backends
//! implement every trait:
//!
//! - [`MemoryStore`] - process-local maps behind one lock (tests, demos)
//! - [`PgStore`] - `PostgreSQL` via sqlx (production)
//!
//! ## Tables (`storefront` schema)
//!
//! - `user` - accounts, unique on normalized email
//! - `category`, `product` - catalog, unique on slug
//! - `cart_item` - unique on `(user_id, product_id, size)`
//! - `order`, `order_item` - order headers and their lines
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p luxe-cli -- migrate
//! ```

pub mod memory;
pub mod postgres;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use luxe_core::{CartItemId, Email, OrderId, ProductId, Quantity, Slug, UserId};

use crate::models::{
    CartItem, Category, NewCartItem, NewCategory, NewOrder, NewProduct, NewUser, Order,
    OrderWithItems, Product, ProductFilter, ProductUpdate, User,
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Embedded storefront migrations.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// Checkout found no cart rows to turn into an order.
    #[error("cart is empty")]
    EmptyCart,
}

impl RepositoryError {
    /// Map a unique violation to `Conflict`, anything else to `Database`.
    pub(crate) fn from_unique(err: sqlx::Error, what: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err
            && db_err.is_unique_violation()
        {
            return Self::Conflict(format!("{what} already exists"));
        }
        Self::Database(err)
    }
}

/// User accounts.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a user. Fails with `Conflict` if the email is taken.
    async fn create(&self, new: NewUser) -> Result<User, RepositoryError>;

    /// Look up a user by ID.
    async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    /// A user together with their password hash, for sign-in.
    async fn get_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError>;

    /// All users, newest first.
    async fn list_all(&self) -> Result<Vec<User>, RepositoryError>;

    /// Set or clear the admin flag. Fails with `NotFound` for unknown emails.
    async fn set_admin(&self, email: &Email, is_admin: bool) -> Result<User, RepositoryError>;
}

/// Categories and products.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// All categories, ordered by name.
    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError>;

    /// Look up a category by slug.
    async fn get_category_by_slug(&self, slug: &Slug)
    -> Result<Option<Category>, RepositoryError>;

    /// Insert a category. Fails with `Conflict` if the slug is taken.
    async fn create_category(&self, new: NewCategory) -> Result<Category, RepositoryError>;

    /// Products matching `filter`, newest first.
    async fn list_products(&self, filter: ProductFilter) -> Result<Vec<Product>, RepositoryError>;

    /// Look up a product by ID.
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    /// Look up a product by slug.
    async fn get_product_by_slug(&self, slug: &Slug) -> Result<Option<Product>, RepositoryError>;

    /// Insert a product. Fails with `Conflict` if the slug is taken.
    async fn create_product(&self, new: NewProduct) -> Result<Product, RepositoryError>;

    /// Apply a partial update. Fails with `NotFound` or, on slug clash, `Conflict`.
    async fn update_product(
        &self,
        id: ProductId,
        update: ProductUpdate,
    ) -> Result<Product, RepositoryError>;

    /// Delete a product. Cart and order rows referencing it are untouched.
    async fn delete_product(&self, id: ProductId) -> Result<bool, RepositoryError>;
}

/// Per-user carts.
///
/// Every method is scoped to `user`: an item ID owned by someone else
/// behaves exactly like an unknown one.
#[async_trait]
pub trait CartRepository: Send + Sync {
    /// The user's lines, oldest first.
    async fn list_items(&self, user: UserId) -> Result<Vec<CartItem>, RepositoryError>;

    /// Add a line, or add to the quantity of the existing line for the same
    /// `(product_id, size)`. Returns the resulting line and whether it merged.
    async fn add_or_merge(
        &self,
        user: UserId,
        item: NewCartItem,
    ) -> Result<(CartItem, bool), RepositoryError>;

    /// Overwrite a line's quantity. Fails with `NotFound` for unknown lines.
    async fn set_quantity(
        &self,
        user: UserId,
        item: CartItemId,
        quantity: Quantity,
    ) -> Result<CartItem, RepositoryError>;

    /// Remove a line. Returns `false` if it did not exist.
    async fn remove(&self, user: UserId, item: CartItemId) -> Result<bool, RepositoryError>;

    /// Remove every line. Returns the number removed.
    async fn clear(&self, user: UserId) -> Result<u64, RepositoryError>;
}

/// Orders.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Record an order with its lines and clear the user's cart, atomically.
    ///
    /// Fails with `EmptyCart` if the cart holds no rows at commit time, so
    /// two concurrent checkouts of one cart record a single order.
    async fn place_order(
        &self,
        user: UserId,
        order: NewOrder,
    ) -> Result<OrderWithItems, RepositoryError>;

    /// The user's orders, newest first.
    async fn list_orders(&self, user: UserId) -> Result<Vec<Order>, RepositoryError>;

    /// One of the user's orders with its lines.
    async fn get_order(
        &self,
        user: UserId,
        id: OrderId,
    ) -> Result<Option<OrderWithItems>, RepositoryError>;
}

/// Backend liveness, for the readiness probe.
#[async_trait]
pub trait StoreHealth: Send + Sync {
    /// Succeeds when the backend can serve queries.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// The full set of repositories, shared by every service.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub catalog: Arc<dyn CatalogRepository>,
    pub carts: Arc<dyn CartRepository>,
    pub orders: Arc<dyn OrderRepository>,
    pub health: Arc<dyn StoreHealth>,
}

impl Repositories {
    /// Repositories backed by a fresh in-memory store.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_store(Arc::new(MemoryStore::new()))
    }

    /// Repositories backed by `PostgreSQL`.
    #[must_use]
    pub fn postgres(pool: PgPool) -> Self {
        Self::from_store(Arc::new(PgStore::new(pool)))
    }

    fn from_store<S>(store: Arc<S>) -> Self
    where
        S: UserRepository
            + CatalogRepository
            + CartRepository
            + OrderRepository
            + StoreHealth
            + 'static,
    {
        Self {
            users: store.clone(),
            catalog: store.clone(),
            carts: store.clone(),
            orders: store.clone(),
            health: store,
        }
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
