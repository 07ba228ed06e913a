//! Core types for Emporium.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod account;
pub mod cart;
pub mod id;
pub mod price;

pub use account::{Email, EmailError, Username, UsernameError};
pub use cart::{CartError, CartSnapshot, MergeReport, Quantity, SessionCart, SnapshotError};
pub use id::*;
pub use price::Price;
