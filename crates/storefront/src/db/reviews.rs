//! Review repository.
//!
//! Reviews are append-only: there is no update or delete.

use sqlx::PgPool;

use emporium_core::{ProductId, UserId};

use super::RepositoryError;
use crate::models::{Pagination, Review};

/// Repository for product reviews.
pub struct ReviewRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReviewRepository<'a> {
    /// Create a new review repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Count the reviews on a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_for_product(&self, product_id: ProductId) -> Result<u64, RepositoryError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM storefront.review WHERE product_id = $1")
                .bind(product_id)
                .fetch_one(self.pool)
                .await?;

        u64::try_from(count)
            .map_err(|_| RepositoryError::DataCorruption(format!("negative review count {count}")))
    }

    /// One page of a product's reviews, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_product(
        &self,
        product_id: ProductId,
        page: &Pagination,
    ) -> Result<Vec<Review>, RepositoryError> {
        let reviews = sqlx::query_as::<_, Review>(
            r"
            SELECT r.id, r.product_id, r.user_id, u.username, r.rating, r.text, r.created_at
            FROM storefront.review r
            JOIN storefront.user u ON u.id = r.user_id
            WHERE r.product_id = $1
            ORDER BY r.created_at DESC, r.id DESC
            LIMIT $2 OFFSET $3
            ",
        )
        .bind(product_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        Ok(reviews)
    }

    /// Add a review.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        product_id: ProductId,
        user_id: UserId,
        rating: i16,
        text: &str,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO storefront.review (product_id, user_id, rating, text)
            VALUES ($1, $2, $3, $4)
            ",
        )
        .bind(product_id)
        .bind(user_id)
        .bind(rating)
        .bind(text)
        .execute(self.pool)
        .await?;

        Ok(())
    }
}
