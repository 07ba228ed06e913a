//! Domain models for the storefront.

pub mod catalog;
pub mod pagination;
pub mod session;
pub mod user;

pub use catalog::{Category, Product, Review, WishlistEntry};
pub use pagination::Pagination;
pub use session::{CurrentUser, FlashLevel, FlashMessage, keys as session_keys};
pub use user::{AccountDetails, Profile, ShippingAddress, ShippingDetails, User};
