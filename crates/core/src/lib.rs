//! Emporium Core - Shared domain types.
//!
//! This crate provides the types used by every Emporium component:
//! - `storefront` - Public-facing shop (catalog, cart, checkout, accounts)
//! - `cli` - Command-line tools for migrations and catalog management
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no database
//! access, no HTTP. The session cart and its persisted snapshot codec live
//! here so the login merge can be tested without a server.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, prices, account fields, and the session cart

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
