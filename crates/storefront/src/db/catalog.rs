//! Catalog repository: categories and products.
//!
//! Plain filtered lookups. There is no caching or ranking; listings sort by
//! ID so pages render deterministically.

use sqlx::PgPool;

use emporium_core::{CategoryId, Price, ProductId};

use super::RepositoryError;
use crate::models::{Category, Product};

const PRODUCT_COLUMNS: &str = "p.id, p.name, p.description, p.price, p.category_id, p.image_url, p.is_sale, p.sale_price, p.created_at";

/// A product definition used when seeding the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductInput {
    pub name: String,
    pub description: String,
    pub price: Price,
    pub category_id: CategoryId,
    pub image_url: Option<String>,
    pub is_sale: bool,
    pub sale_price: Price,
}

/// Row counts for the `catalog stats` command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CatalogStats {
    pub categories: i64,
    pub products: i64,
    pub products_on_sale: i64,
    pub reviews: i64,
}

/// Escape `%`, `_`, and `\` so user input matches literally inside `ILIKE`.
#[must_use]
pub fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Repository for catalog reads and seeding writes.
pub struct CatalogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CatalogRepository<'a> {
    /// Create a new catalog repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// List every product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_products(&self) -> Result<Vec<Product>, RepositoryError> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM storefront.product p ORDER BY p.id"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(products)
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM storefront.product p WHERE p.id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(product)
    }

    /// Get the products with the given IDs, ordered by ID.
    ///
    /// IDs with no matching product are silently absent from the result.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_products_by_ids(
        &self,
        ids: &[ProductId],
    ) -> Result<Vec<Product>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let raw: Vec<i32> = ids.iter().map(ProductId::as_i32).collect();
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM storefront.product p WHERE p.id = ANY($1) ORDER BY p.id"
        ))
        .bind(raw)
        .fetch_all(self.pool)
        .await?;

        Ok(products)
    }

    /// List the products in a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn products_in_category(
        &self,
        category_id: CategoryId,
    ) -> Result<Vec<Product>, RepositoryError> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM storefront.product p WHERE p.category_id = $1 ORDER BY p.id"
        ))
        .bind(category_id)
        .fetch_all(self.pool)
        .await?;

        Ok(products)
    }

    /// Case-insensitive substring search over product name and description.
    ///
    /// A blank term matches nothing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn search_products(&self, term: &str) -> Result<Vec<Product>, RepositoryError> {
        let term = term.trim();
        if term.is_empty() {
            return Ok(Vec::new());
        }

        let pattern = format!("%{}%", escape_like(term));
        let products = sqlx::query_as::<_, Product>(&format!(
            r"
            SELECT {PRODUCT_COLUMNS}
            FROM storefront.product p
            WHERE p.name ILIKE $1 ESCAPE '\' OR p.description ILIKE $1 ESCAPE '\'
            ORDER BY p.id
            "
        ))
        .bind(pattern)
        .fetch_all(self.pool)
        .await?;

        Ok(products)
    }

    /// Insert a product, or update the existing product with the same name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert_product(&self, input: &ProductInput) -> Result<Product, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(
            r"
            INSERT INTO storefront.product
                (name, description, price, category_id, image_url, is_sale, sale_price)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (name) DO UPDATE SET
                description = EXCLUDED.description,
                price = EXCLUDED.price,
                category_id = EXCLUDED.category_id,
                image_url = EXCLUDED.image_url,
                is_sale = EXCLUDED.is_sale,
                sale_price = EXCLUDED.sale_price
            RETURNING id, name, description, price, category_id, image_url, is_sale, sale_price, created_at
            ",
        )
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price)
        .bind(input.category_id)
        .bind(input.image_url.as_deref())
        .bind(input.is_sale)
        .bind(input.sale_price)
        .fetch_one(self.pool)
        .await?;

        Ok(product)
    }

    // =========================================================================
    // Categories
    // =========================================================================

    /// List every category, alphabetically.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT id, name FROM storefront.category ORDER BY name",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(categories)
    }

    /// Look a category up by exact name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails. An unknown
    /// name is `Ok(None)`, not an error.
    pub async fn get_category_by_name(
        &self,
        name: &str,
    ) -> Result<Option<Category>, RepositoryError> {
        let category = sqlx::query_as::<_, Category>(
            "SELECT id, name FROM storefront.category WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(self.pool)
        .await?;

        Ok(category)
    }

    /// Insert a category by name, returning the existing row if present.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert_category(&self, name: &str) -> Result<Category, RepositoryError> {
        let category = sqlx::query_as::<_, Category>(
            r"
            INSERT INTO storefront.category (name)
            VALUES ($1)
            ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
            RETURNING id, name
            ",
        )
        .bind(name)
        .fetch_one(self.pool)
        .await?;

        Ok(category)
    }

    // =========================================================================
    // Maintenance
    // =========================================================================

    /// Delete every product and category (cascades to reviews and wishlist items).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn clear(&self) -> Result<u64, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let products = sqlx::query("DELETE FROM storefront.product")
            .execute(&mut *tx)
            .await?
            .rows_affected();
        sqlx::query("DELETE FROM storefront.category")
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(products)
    }

    /// Count catalog rows.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn stats(&self) -> Result<CatalogStats, RepositoryError> {
        let (categories, products, products_on_sale, reviews): (i64, i64, i64, i64) =
            sqlx::query_as(
                r"
                SELECT
                    (SELECT COUNT(*) FROM storefront.category),
                    (SELECT COUNT(*) FROM storefront.product),
                    (SELECT COUNT(*) FROM storefront.product WHERE is_sale),
                    (SELECT COUNT(*) FROM storefront.review)
                ",
            )
            .fetch_one(self.pool)
            .await?;

        Ok(CatalogStats {
            categories,
            products,
            products_on_sale,
            reviews,
        })
    }
}
