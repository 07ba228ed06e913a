//! Integration test helpers for Emporium.
//!
//! The tests drive a running storefront over HTTP and prepare fixtures
//! directly in its database.
//!
//! # Running Tests
//!
//! ```bash
//! emp-cli migrate
//! cargo run -p emporium-storefront &
//! cargo test -p emporium-integration-tests -- --ignored
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_BASE_URL` - Server under test (default `http://localhost:8000`)
//! - `EMPORIUM_DATABASE_URL` - The same database the server uses

#![allow(clippy::expect_used, clippy::missing_panics_doc)]

use reqwest::header::{HeaderMap, HeaderValue, LOCATION};
use reqwest::{Client, Response, redirect};
use secrecy::SecretString;
use sqlx::PgPool;
use uuid::Uuid;

use emporium_core::Price;
use emporium_storefront::db::CatalogRepository;
use emporium_storefront::db::catalog::ProductInput;
use emporium_storefront::models::Product;

/// Password given to every account the tests register.
pub const TEST_PASSWORD: &str = "integration-pass-42";

/// Shared state for one test.
pub struct TestContext {
    pub base_url: String,
    pub pool: PgPool,
}

impl TestContext {
    /// Connect to the storefront database and read the server URL.
    pub async fn new() -> Self {
        dotenvy::dotenv().ok();

        let base_url = std::env::var("STOREFRONT_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:8000".to_string());
        let database_url = std::env::var("EMPORIUM_DATABASE_URL")
            .or_else(|_| std::env::var("DATABASE_URL"))
            .map(SecretString::from)
            .expect("EMPORIUM_DATABASE_URL must be set");

        let pool = emporium_storefront::db::create_pool(&database_url)
            .await
            .expect("Failed to connect to database");

        Self { base_url, pool }
    }

    /// Absolute URL for a path on the server under test.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.trim_end_matches('/'))
    }

    /// A fresh shopper: own cookie jar, no redirect following.
    ///
    /// Each client claims a distinct forwarded IP so the login rate limit
    /// does not leak between tests.
    #[must_use]
    pub fn client(&self) -> Client {
        let [a, b, c, ..] = Uuid::new_v4().into_bytes();
        let ip = format!("10.{a}.{b}.{}", c.max(1));

        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_str(&ip).expect("valid header value"),
        );

        Client::builder()
            .cookie_store(true)
            .redirect(redirect::Policy::none())
            .default_headers(headers)
            .build()
            .expect("Failed to create HTTP client")
    }

    /// Insert a product in a fresh category.
    pub async fn seed_product(&self, price_cents: i64) -> Product {
        let tag = unique("it");
        let repo = CatalogRepository::new(&self.pool);
        let category = repo
            .upsert_category(&format!("Category {tag}"))
            .await
            .expect("Failed to create category");

        repo.upsert_product(&ProductInput {
            name: format!("Product {tag}"),
            description: "Created by integration tests.".to_string(),
            price: Price::from_cents(price_cents),
            category_id: category.id,
            image_url: None,
            is_sale: false,
            sale_price: Price::ZERO,
        })
        .await
        .expect("Failed to create product")
    }

    /// Register a new account through the form. The client ends up signed in.
    pub async fn register(&self, client: &Client) -> String {
        let username = unique("shopper");
        let email = format!("{username}@example.com");
        let resp = client
            .post(self.url("/register"))
            .form(&[
                ("username", username.as_str()),
                ("first_name", "Test"),
                ("last_name", "Shopper"),
                ("email", email.as_str()),
                ("password1", TEST_PASSWORD),
                ("password2", TEST_PASSWORD),
            ])
            .send()
            .await
            .expect("Failed to register");

        assert_eq!(location(&resp), "/update-info", "registration should succeed");
        username
    }

    /// Log in through the form.
    pub async fn login(&self, client: &Client, username: &str) -> Response {
        client
            .post(self.url("/login"))
            .form(&[("username", username), ("password", TEST_PASSWORD)])
            .send()
            .await
            .expect("Failed to log in")
    }

    /// Log out, dropping the session.
    pub async fn logout(&self, client: &Client) {
        client
            .get(self.url("/logout"))
            .send()
            .await
            .expect("Failed to log out");
    }

    /// Put a product in the cart.
    pub async fn add_to_cart(&self, client: &Client, product: &Product, quantity: u32) {
        let resp = client
            .post(self.url("/cart/add"))
            .form(&[
                ("product_id", product.id.to_string()),
                ("quantity", quantity.to_string()),
            ])
            .send()
            .await
            .expect("Failed to add to cart");
        assert_eq!(location(&resp), "/cart");
    }

    /// Fetch a page body.
    pub async fn page(&self, client: &Client, path: &str) -> String {
        client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to fetch page")
            .text()
            .await
            .expect("Failed to read body")
    }
}

/// A short unique name with a prefix.
#[must_use]
pub fn unique(prefix: &str) -> String {
    let id: String = Uuid::new_v4().simple().to_string().chars().take(12).collect();
    format!("{prefix}{id}")
}

/// The `Location` header of a redirect, or an empty string.
#[must_use]
pub fn location(resp: &Response) -> String {
    resp.headers()
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// Link to a product page, as rendered in listings.
#[must_use]
pub fn product_link(product: &Product) -> String {
    format!("href=\"/product/{}\"", product.id)
}
