//! Checkout assembly.
//!
//! Turns the session cart into priced lines and a total, and picks the
//! shipping form to show: pre-filled from a stored address, or blank.

use sqlx::PgPool;

use emporium_core::{Price, Quantity, SessionCart, UserId};

use crate::db::{CatalogRepository, ProfileRepository, RepositoryError};
use crate::models::{Product, ShippingAddress, ShippingDetails};

/// The shipping form presented at checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShippingForm {
    /// Editing a stored address; fields start filled in.
    Bound(ShippingAddress),
    /// A blank form, for guests and users without a stored address.
    Unbound,
}

impl ShippingForm {
    /// Field values to render.
    #[must_use]
    pub fn details(&self) -> ShippingDetails {
        match self {
            Self::Bound(address) => address.details.clone(),
            Self::Unbound => ShippingDetails::default(),
        }
    }

    #[must_use]
    pub const fn is_bound(&self) -> bool {
        matches!(self, Self::Bound(_))
    }
}

/// One priced cart line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutLine {
    pub product: Product,
    pub quantity: Quantity,
    pub unit_price: Price,
    pub line_total: Price,
}

/// Everything the checkout page shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSummary {
    pub lines: Vec<CheckoutLine>,
    pub total: Price,
    pub shipping: ShippingForm,
}

impl CheckoutSummary {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines
            .iter()
            .fold(0_u32, |acc, line| acc.saturating_add(line.quantity.get()))
    }
}

/// Price a cart against catalog products.
///
/// Lines follow the order of `products`. Cart entries with no matching
/// product are dropped from both the lines and the total.
#[must_use]
pub fn assemble(
    cart: &SessionCart,
    products: &[Product],
    shipping: ShippingForm,
) -> CheckoutSummary {
    let lines: Vec<CheckoutLine> = products
        .iter()
        .filter_map(|product| {
            let quantity = cart.quantity_of(product.id)?;
            let unit_price = product.effective_price();
            Some(CheckoutLine {
                product: product.clone(),
                quantity,
                unit_price,
                line_total: unit_price.times(quantity),
            })
        })
        .collect();

    let total = lines.iter().map(|line| line.line_total).sum();

    CheckoutSummary {
        lines,
        total,
        shipping,
    }
}

/// Load the products in a cart, skipping the query for an empty cart.
///
/// # Errors
///
/// Returns `RepositoryError` if the catalog query fails.
pub async fn load_cart_products(
    pool: &PgPool,
    cart: &SessionCart,
) -> Result<Vec<Product>, RepositoryError> {
    if cart.is_empty() {
        return Ok(Vec::new());
    }
    CatalogRepository::new(pool)
        .get_products_by_ids(&cart.product_ids())
        .await
}

/// Choose the shipping form for the current shopper.
///
/// # Errors
///
/// Returns `RepositoryError` if the address lookup fails.
pub async fn shipping_form_for(
    pool: &PgPool,
    user_id: Option<UserId>,
) -> Result<ShippingForm, RepositoryError> {
    let Some(user_id) = user_id else {
        return Ok(ShippingForm::Unbound);
    };

    let address = ProfileRepository::new(pool)
        .shipping_address(user_id)
        .await?;

    Ok(address.map_or(ShippingForm::Unbound, ShippingForm::Bound))
}

/// Build the checkout summary for a cart and shopper.
///
/// # Errors
///
/// Returns `RepositoryError` if a lookup fails.
pub async fn summarize(
    pool: &PgPool,
    cart: &SessionCart,
    user_id: Option<UserId>,
) -> Result<CheckoutSummary, RepositoryError> {
    let products = load_cart_products(pool, cart).await?;
    let shipping = shipping_form_for(pool, user_id).await?;
    Ok(assemble(cart, &products, shipping))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use emporium_core::{AddressId, CategoryId, ProductId};

    use super::*;

    fn product(id: i32, cents: i64, sale_cents: Option<i64>) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            description: String::new(),
            price: Price::from_cents(cents),
            category_id: CategoryId::new(1),
            image_url: None,
            is_sale: sale_cents.is_some(),
            sale_price: Price::from_cents(sale_cents.unwrap_or(0)),
            created_at: Utc::now(),
        }
    }

    fn cart(entries: &[(i32, u32)]) -> SessionCart {
        let mut cart = SessionCart::new();
        for &(id, qty) in entries {
            cart.set(ProductId::new(id), Quantity::new(qty).unwrap());
        }
        cart
    }

    #[test]
    fn test_assemble_totals_with_sale_prices() {
        let products = vec![product(3, 1000, None), product(7, 2000, Some(1500))];
        let summary = assemble(&cart(&[(3, 2), (7, 1)]), &products, ShippingForm::Unbound);

        assert_eq!(summary.lines.len(), 2);
        assert_eq!(summary.lines[0].line_total, Price::from_cents(2000));
        assert_eq!(summary.lines[1].unit_price, Price::from_cents(1500));
        assert_eq!(summary.total, Price::from_cents(3500));
        assert_eq!(summary.item_count(), 3);
    }

    #[test]
    fn test_assemble_drops_missing_products() {
        let products = vec![product(3, 1000, None)];
        let summary = assemble(&cart(&[(3, 1), (99, 4)]), &products, ShippingForm::Unbound);

        assert_eq!(summary.lines.len(), 1);
        assert_eq!(summary.total, Price::from_cents(1000));
    }

    #[test]
    fn test_assemble_empty_cart() {
        let summary = assemble(&SessionCart::new(), &[], ShippingForm::Unbound);
        assert!(summary.is_empty());
        assert_eq!(summary.total, Price::ZERO);
    }

    #[test]
    fn test_guest_gets_blank_form() {
        let form = ShippingForm::Unbound;
        assert!(!form.is_bound());
        assert_eq!(form.details(), ShippingDetails::default());
    }

    #[test]
    fn test_stored_address_prefills_form() {
        let details = ShippingDetails {
            full_name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            address1: "12 Analytical Row".to_string(),
            address2: String::new(),
            city: "London".to_string(),
            state: None,
            zipcode: Some("N1".to_string()),
            country: "UK".to_string(),
        };
        let form = ShippingForm::Bound(ShippingAddress {
            id: AddressId::new(1),
            user_id: UserId::new(5),
            details: details.clone(),
        });

        let summary = assemble(&SessionCart::new(), &[], form);
        assert!(summary.shipping.is_bound());
        assert_eq!(summary.shipping.details(), details);
    }

    #[tokio::test]
    async fn test_empty_cart_skips_product_query() {
        // A lazy pool pointing nowhere: any query would fail.
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://nobody@127.0.0.1:1/none")
            .unwrap();

        let products = load_cart_products(&pool, &SessionCart::new()).await.unwrap();
        assert!(products.is_empty());

        let form = shipping_form_for(&pool, None).await.unwrap();
        assert_eq!(form, ShippingForm::Unbound);
    }
}
