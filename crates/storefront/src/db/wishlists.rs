//! Wishlist repository.
//!
//! Each user has at most one wishlist, created the first time it is used.
//! `UNIQUE (wishlist_id, product_id)` plus `ON CONFLICT DO NOTHING` keeps
//! repeated adds, including concurrent double-submits, to a single row.

use sqlx::PgPool;

use emporium_core::{ProductId, UserId, WishlistId};

use super::RepositoryError;
use crate::models::WishlistEntry;

/// Repository for wishlists and their items.
pub struct WishlistRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> WishlistRepository<'a> {
    /// Create a new wishlist repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user's wishlist, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_or_create(&self, user_id: UserId) -> Result<WishlistId, RepositoryError> {
        // The no-op update makes RETURNING yield the existing row on conflict.
        let id = sqlx::query_scalar::<_, WishlistId>(
            r"
            INSERT INTO storefront.wishlist (user_id)
            VALUES ($1)
            ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id
            RETURNING id
            ",
        )
        .bind(user_id)
        .fetch_one(self.pool)
        .await?;

        Ok(id)
    }

    /// Add a product. Returns `true` if a new row was inserted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn add_item(
        &self,
        wishlist_id: WishlistId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            INSERT INTO storefront.wishlist_item (wishlist_id, product_id)
            VALUES ($1, $2)
            ON CONFLICT (wishlist_id, product_id) DO NOTHING
            ",
        )
        .bind(wishlist_id)
        .bind(product_id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Remove a product from a user's wishlist. Returns `true` if a row was deleted.
    ///
    /// A user without a wishlist, or a product not on it, is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn remove_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            DELETE FROM storefront.wishlist_item wi
            USING storefront.wishlist w
            WHERE wi.wishlist_id = w.id AND w.user_id = $1 AND wi.product_id = $2
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// List a wishlist's products, most recently added first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_items(
        &self,
        wishlist_id: WishlistId,
    ) -> Result<Vec<WishlistEntry>, RepositoryError> {
        let items = sqlx::query_as::<_, WishlistEntry>(
            r"
            SELECT p.id, p.name, p.description, p.price, p.category_id, p.image_url,
                   p.is_sale, p.sale_price, p.created_at, wi.added_at
            FROM storefront.wishlist_item wi
            JOIN storefront.product p ON p.id = wi.product_id
            WHERE wi.wishlist_id = $1
            ORDER BY wi.added_at DESC, wi.id DESC
            ",
        )
        .bind(wishlist_id)
        .fetch_all(self.pool)
        .await?;

        Ok(items)
    }

    /// Whether a product is on a user's wishlist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn contains(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError> {
        let found: bool = sqlx::query_scalar(
            r"
            SELECT EXISTS (
                SELECT 1
                FROM storefront.wishlist_item wi
                JOIN storefront.wishlist w ON w.id = wi.wishlist_id
                WHERE w.user_id = $1 AND wi.product_id = $2
            )
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .fetch_one(self.pool)
        .await?;

        Ok(found)
    }
}
