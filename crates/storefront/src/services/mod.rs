//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Signup, signin and bearer token verification
//! - `catalog` - Product listing, search, admin CRUD and stats
//! - `cart` - Per-user cart with merge-on-add and totals
//! - `orders` - Checkout and order history
//!
//! Services own `Arc` handles to the repositories they need and are cheap to
//! clone. Every cart and order method takes the caller's [`CurrentUser`]
//! explicitly.
//!
//! [`CurrentUser`]: crate::models::CurrentUser

pub mod auth;
pub mod cart;
pub mod catalog;
mod error;
pub mod orders;

pub use auth::{AuthError, AuthService, TokenService};
pub use cart::CartService;
pub use catalog::CatalogService;
pub use error::ServiceError;
pub use orders::OrderService;
