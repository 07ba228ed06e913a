//! Profile and shipping address repository.
//!
//! The profile row also carries `saved_cart`, the JSON snapshot of a signed-in
//! shopper's cart.

use sqlx::{PgConnection, PgPool};

use emporium_core::UserId;

use super::RepositoryError;
use crate::models::{Profile, ShippingAddress, ShippingDetails};

/// Profile fields a user can edit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub phone: String,
    pub address1: String,
    pub address2: String,
    pub city: String,
    pub state: String,
    pub zipcode: String,
    pub country: String,
}

impl From<&Profile> for ProfileUpdate {
    fn from(p: &Profile) -> Self {
        Self {
            phone: p.phone.clone(),
            address1: p.address1.clone(),
            address2: p.address2.clone(),
            city: p.city.clone(),
            state: p.state.clone(),
            zipcode: p.zipcode.clone(),
            country: p.country.clone(),
        }
    }
}

/// Repository for profiles and stored shipping addresses.
pub struct ProfileRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProfileRepository<'a> {
    /// Create a new profile repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user's profile.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, user_id: UserId) -> Result<Option<Profile>, RepositoryError> {
        let profile = sqlx::query_as::<_, Profile>(
            r"
            SELECT user_id, phone, address1, address2, city, state, zipcode, country, saved_cart
            FROM storefront.profile
            WHERE user_id = $1
            ",
        )
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(profile)
    }

    /// Save the contact fields and the shipping address together.
    ///
    /// Both writes share one transaction, so a failure leaves neither saved.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if either write fails.
    pub async fn save_info(
        &self,
        user_id: UserId,
        update: &ProfileUpdate,
        shipping: &ShippingDetails,
    ) -> Result<ShippingAddress, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        update_contact(&mut tx, user_id, update).await?;
        let address = upsert_shipping(&mut tx, user_id, shipping).await?;
        tx.commit().await?;

        Ok(address)
    }

    /// Read the persisted cart snapshot.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn saved_cart(&self, user_id: UserId) -> Result<Option<String>, RepositoryError> {
        let saved: Option<Option<String>> =
            sqlx::query_scalar("SELECT saved_cart FROM storefront.profile WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(self.pool)
                .await?;

        Ok(saved.flatten())
    }

    /// Overwrite the persisted cart snapshot; `None` clears it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn set_saved_cart(
        &self,
        user_id: UserId,
        snapshot: Option<&str>,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO storefront.profile (user_id, saved_cart)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO UPDATE SET saved_cart = EXCLUDED.saved_cart, updated_at = NOW()
            ",
        )
        .bind(user_id)
        .bind(snapshot)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Get a user's stored shipping address, if they ever saved one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn shipping_address(
        &self,
        user_id: UserId,
    ) -> Result<Option<ShippingAddress>, RepositoryError> {
        let address = sqlx::query_as::<_, ShippingAddress>(
            r"
            SELECT id, user_id, full_name, email, address1, address2, city, state, zipcode, country
            FROM storefront.shipping_address
            WHERE user_id = $1
            ",
        )
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(address)
    }
}

/// Update a user's contact fields, creating the profile if it is missing.
async fn update_contact(
    conn: &mut PgConnection,
    user_id: UserId,
    update: &ProfileUpdate,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        INSERT INTO storefront.profile
            (user_id, phone, address1, address2, city, state, zipcode, country)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        ON CONFLICT (user_id) DO UPDATE SET
            phone = EXCLUDED.phone,
            address1 = EXCLUDED.address1,
            address2 = EXCLUDED.address2,
            city = EXCLUDED.city,
            state = EXCLUDED.state,
            zipcode = EXCLUDED.zipcode,
            country = EXCLUDED.country,
            updated_at = NOW()
        ",
    )
    .bind(user_id)
    .bind(&update.phone)
    .bind(&update.address1)
    .bind(&update.address2)
    .bind(&update.city)
    .bind(&update.state)
    .bind(&update.zipcode)
    .bind(&update.country)
    .execute(conn)
    .await?;

    Ok(())
}

/// Create or replace a user's shipping address.
async fn upsert_shipping(
    conn: &mut PgConnection,
    user_id: UserId,
    details: &ShippingDetails,
) -> Result<ShippingAddress, RepositoryError> {
    let address = sqlx::query_as::<_, ShippingAddress>(
        r"
        INSERT INTO storefront.shipping_address
            (user_id, full_name, email, address1, address2, city, state, zipcode, country)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        ON CONFLICT (user_id) DO UPDATE SET
            full_name = EXCLUDED.full_name,
            email = EXCLUDED.email,
            address1 = EXCLUDED.address1,
            address2 = EXCLUDED.address2,
            city = EXCLUDED.city,
            state = EXCLUDED.state,
            zipcode = EXCLUDED.zipcode,
            country = EXCLUDED.country
        RETURNING id, user_id, full_name, email, address1, address2, city, state, zipcode, country
        ",
    )
    .bind(user_id)
    .bind(&details.full_name)
    .bind(&details.email)
    .bind(&details.address1)
    .bind(&details.address2)
    .bind(&details.city)
    .bind(details.state.as_deref())
    .bind(details.zipcode.as_deref())
    .bind(&details.country)
    .fetch_one(conn)
    .await?;

    Ok(address)
}
