//! Catalog, review, and wishlist read models.

use chrono::{DateTime, Utc};

use emporium_core::{CategoryId, Price, ProductId, ReviewId, UserId};

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

impl Category {
    /// URL slug for `/category/{slug}`: spaces become hyphens.
    #[must_use]
    pub fn slug(&self) -> String {
        self.name.replace(' ', "-")
    }
}

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    /// List price.
    pub price: Price,
    pub category_id: CategoryId,
    pub image_url: Option<String>,
    pub is_sale: bool,
    /// Price charged while `is_sale` is set.
    pub sale_price: Price,
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// The unit price a shopper pays right now.
    #[must_use]
    pub const fn effective_price(&self) -> Price {
        if self.is_sale { self.sale_price } else { self.price }
    }
}

/// A product review with its author's username.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Review {
    pub id: ReviewId,
    pub product_id: ProductId,
    pub user_id: UserId,
    pub username: String,
    pub rating: i16,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl Review {
    /// Filled and empty stars for display, e.g. `★★★☆☆`.
    #[must_use]
    pub fn stars(&self) -> String {
        let filled = usize::try_from(self.rating.clamp(0, 5)).unwrap_or(0);
        format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled))
    }
}

/// A product saved to a wishlist.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct WishlistEntry {
    #[sqlx(flatten)]
    pub product: Product,
    pub added_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(is_sale: bool) -> Product {
        Product {
            id: ProductId::new(1),
            name: "Lamp".to_string(),
            description: String::new(),
            price: Price::from_cents(4000),
            category_id: CategoryId::new(1),
            image_url: None,
            is_sale,
            sale_price: Price::from_cents(2500),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_effective_price_uses_sale_price_on_sale() {
        assert_eq!(product(true).effective_price(), Price::from_cents(2500));
        assert_eq!(product(false).effective_price(), Price::from_cents(4000));
    }

    #[test]
    fn test_category_slug() {
        let category = Category {
            id: CategoryId::new(1),
            name: "Home Office".to_string(),
        };
        assert_eq!(category.slug(), "Home-Office");
    }
}
