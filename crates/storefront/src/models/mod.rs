//! Domain models for the storefront.
//!
//! These are validated domain objects, separate from the database row types
//! in [`crate::db::postgres`]. All of them serialize to camelCase JSON.

pub mod cart;
pub mod catalog;
pub mod order;
pub mod user;

pub use cart::{CartItem, CartLine, CartSummary, NewCartItem};
pub use catalog::{Category, NewCategory, NewProduct, Product, ProductFilter, ProductUpdate};
pub use order::{NewOrder, NewOrderItem, Order, OrderItem, OrderWithItems};
pub use user::{CurrentUser, NewUser, User};
