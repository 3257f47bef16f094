//! Application state shared across handlers.

use std::sync::Arc;

use chrono::Duration;

use crate::config::StorefrontConfig;
use crate::db::{Repositories, StoreHealth};
use crate::services::{AuthService, CartService, CatalogService, OrderService, TokenService};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the configuration and the services built over the repositories.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    health: Arc<dyn StoreHealth>,
    auth: AuthService,
    catalog: CatalogService,
    cart: CartService,
    orders: OrderService,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `repos` - Repository backend (in-memory or `PostgreSQL`)
    #[must_use]
    pub fn new(config: StorefrontConfig, repos: Repositories) -> Self {
        let tokens = TokenService::new(
            &config.token_secret,
            Duration::hours(i64::from(config.token_ttl_hours)),
        );

        Self {
            inner: Arc::new(AppStateInner {
                auth: AuthService::new(repos.users, tokens),
                catalog: CatalogService::new(repos.catalog.clone()),
                cart: CartService::new(repos.carts, repos.catalog, config.tax_rate),
                orders: OrderService::new(repos.orders),
                health: repos.health,
                config,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get the repository liveness probe.
    #[must_use]
    pub fn health(&self) -> &dyn StoreHealth {
        self.inner.health.as_ref()
    }

    /// Get a reference to the authentication service.
    #[must_use]
    pub fn auth(&self) -> &AuthService {
        &self.inner.auth
    }

    /// Get a reference to the catalog service.
    #[must_use]
    pub fn catalog(&self) -> &CatalogService {
        &self.inner.catalog
    }

    /// Get a reference to the cart service.
    #[must_use]
    pub fn cart(&self) -> &CartService {
        &self.inner.cart
    }

    /// Get a reference to the order service.
    #[must_use]
    pub fn orders(&self) -> &OrderService {
        &self.inner.orders
    }
}
