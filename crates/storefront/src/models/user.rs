//! User domain types.
//!
//! These types represent validated domain objects separate from database row types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use emporium_core::{AddressId, Email, UserId, Username};

/// A storefront user (domain type).
#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Login name.
    pub username: Username,
    /// Contact email address.
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Editable account fields, used both at registration and on update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountDetails {
    pub username: Username,
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
}

/// Contact details kept alongside a user, plus the persisted cart snapshot.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Profile {
    pub user_id: UserId,
    pub phone: String,
    pub address1: String,
    pub address2: String,
    pub city: String,
    pub state: String,
    pub zipcode: String,
    pub country: String,
    /// JSON object text mapping product IDs to quantities.
    pub saved_cart: Option<String>,
}

/// Where an order ships. Used for stored addresses and for guest checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ShippingDetails {
    pub full_name: String,
    pub email: String,
    pub address1: String,
    pub address2: String,
    pub city: String,
    pub state: Option<String>,
    pub zipcode: Option<String>,
    pub country: String,
}

/// A user's stored shipping address.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ShippingAddress {
    pub id: AddressId,
    pub user_id: UserId,
    #[sqlx(flatten)]
    pub details: ShippingDetails,
}
