//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Username/password authentication
//! - `cart` - Saved-cart restore and snapshot persistence
//! - `checkout` - Cart pricing and shipping form selection

pub mod auth;
pub mod cart;
pub mod checkout;
