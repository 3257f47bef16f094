//! Luxe Core - Shared domain types.
//!
//! This crate provides the value types used across all Luxe components:
//! - `storefront` - REST API for catalog, cart, checkout and auth
//! - `cli` - Command-line tools for migrations, seeding and admin management
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O, no database
//! access, no HTTP. Database encode/decode impls are behind the `postgres`
//! feature.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, emails, money, quantities, slugs and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
