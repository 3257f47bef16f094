//! HTTP route handlers for the storefront API.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                    - Liveness
//! GET    /health/ready              - Readiness (store ping)
//!
//! # Auth (rate limited)
//! POST   /api/auth/signup           - Create account, returns {user, token}
//! POST   /api/auth/signin           - Sign in, returns {user, token}
//! GET    /api/auth/me               - Current user (bearer)
//! POST   /api/auth/signout          - Sign out (bearer)
//!
//! # Catalog
//! GET    /api/categories            - All categories
//! GET    /api/categories/{slug}     - Category by slug
//! GET    /api/products              - ?categoryId&featured&onSale&sort
//! GET    /api/products/search       - ?q=
//! GET    /api/products/{id}         - Product by ID
//! GET    /api/products/slug/{slug}  - Product by slug
//! POST   /api/products              - Create (admin)
//! PUT    /api/products/{id}         - Partial update (admin)
//! DELETE /api/products/{id}         - Delete (admin)
//!
//! # Cart (bearer)
//! GET    /api/cart                  - Lines with live product
//! GET    /api/cart/summary          - Subtotal, tax, shipping, total
//! POST   /api/cart                  - Add or merge a line
//! PUT    /api/cart/{id}             - Set quantity (<= 0 removes)
//! DELETE /api/cart/{id}             - Remove a line
//! DELETE /api/cart                  - Empty the cart
//!
//! # Orders (bearer)
//! POST   /api/orders                - Checkout
//! GET    /api/orders                - Order history
//! GET    /api/orders/{id}           - One order with items
//!
//! # Admin
//! GET    /api/admin/users           - All users
//! GET    /api/admin/stats           - Catalog stats
//! ```

pub mod admin;
pub mod auth;
pub mod cart;
pub mod categories;
pub mod extract;
pub mod health;
pub mod orders;
pub mod products;

use axum::{
    Router,
    middleware::map_response,
    routing::{get, post, put},
};

use crate::middleware::{auth_rate_limiter, rate_limited_json};
use crate::state::AppState;

/// Create the auth routes router.
///
/// Rate limited per client IP when `rate_limit` is set.
pub fn auth_routes(rate_limit: bool) -> Router<AppState> {
    let router = Router::new()
        .route("/signup", post(auth::signup))
        .route("/signin", post(auth::signin))
        .route("/me", get(auth::me))
        .route("/signout", post(auth::signout));

    if rate_limit {
        router
            .layer(auth_rate_limiter())
            .layer(map_response(rate_limited_json))
    } else {
        router
    }
}

/// Create the category routes router.
pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(categories::index))
        .route("/{slug}", get(categories::show))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route("/search", get(products::search))
        .route("/slug/{slug}", get(products::show_by_slug))
        .route(
            "/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::delete),
        )
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(cart::show).post(cart::add).delete(cart::clear),
        )
        .route("/summary", get(cart::summary))
        .route("/{id}", put(cart::update).delete(cart::remove))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index).post(orders::create))
        .route("/{id}", get(orders::show))
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(admin::users))
        .route("/stats", get(admin::stats))
}

/// Create all routes for the storefront.
pub fn routes(auth_rate_limit: bool) -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::ready))
        .nest("/api/auth", auth_routes(auth_rate_limit))
        .nest("/api/categories", category_routes())
        .nest("/api/products", product_routes())
        .nest("/api/cart", cart_routes())
        .nest("/api/orders", order_routes())
        .nest("/api/admin", admin_routes())
}
