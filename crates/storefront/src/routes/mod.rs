//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                          - Home page (all products)
//! GET  /about                     - About page
//! GET  /health                    - Liveness check
//! GET  /health/ready              - Readiness check (database)
//!
//! # Auth
//! GET  /login | POST /login       - Login (POST rate limited)
//! GET|POST /logout                - Logout
//! GET  /register | POST /register - Registration (POST rate limited)
//!
//! # Catalog
//! GET  /product/{id}              - Product detail + reviews (?page=)
//! GET  /category/{name}           - Products in a category
//! GET  /categories                - Category list
//! GET  /search | POST /search     - Product search
//!
//! # Wishlist (requires auth)
//! GET  /wishlist                  - Wishlist
//! POST /wishlist/add/{id}         - Add product
//! POST /wishlist/remove/{id}      - Remove product
//!
//! # Cart
//! GET  /cart                      - Cart summary
//! POST /cart/add                  - Add product (replaces quantity)
//! POST /cart/update               - Set quantity (0 removes)
//! POST /cart/delete               - Remove product
//!
//! # Checkout
//! GET  /checkout | POST /checkout - Shipping form
//! GET  /payment/success           - Order complete
//!
//! # Account (requires auth)
//! GET|POST /update-user           - Account fields
//! GET|POST /update-password       - Password
//! GET|POST /update-info           - Profile + shipping address
//!
//! # Reviews
//! GET|POST /review/{product_id}   - Add review (POST requires auth)
//! ```

pub mod account;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod forms;
pub mod health;
pub mod home;
pub mod reviews;
pub mod wishlist;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::auth_rate_limiter;
use crate::state::AppState;

/// Create all page routes for the storefront.
pub fn routes() -> Router<AppState> {
    // One bucket per client IP, shared by login and registration
    let limiter = auth_rate_limiter();

    Router::new()
        .route("/", get(home::home))
        .route("/about", get(home::about))
        // Auth
        .route(
            "/login",
            get(auth::login_page).merge(post(auth::login).layer(limiter.clone())),
        )
        .route("/logout", get(auth::logout).post(auth::logout))
        .route(
            "/register",
            get(auth::register_page).merge(post(auth::register).layer(limiter)),
        )
        // Catalog
        .route("/product/{id}", get(catalog::product))
        .route("/category/{name}", get(catalog::category))
        .route("/categories", get(catalog::categories))
        .route("/search", get(catalog::search_page).post(catalog::search))
        // Wishlist
        .route("/wishlist", get(wishlist::show))
        .route("/wishlist/add/{id}", post(wishlist::add))
        .route("/wishlist/remove/{id}", post(wishlist::remove))
        // Cart
        .route("/cart", get(cart::show))
        .route("/cart/add", post(cart::add))
        .route("/cart/update", post(cart::update))
        .route("/cart/delete", post(cart::delete))
        // Checkout
        .route(
            "/checkout",
            get(checkout::checkout_page).post(checkout::submit_checkout),
        )
        .route("/payment/success", get(checkout::payment_success))
        // Account
        .route(
            "/update-user",
            get(account::update_user_page).post(account::update_user),
        )
        .route(
            "/update-password",
            get(account::update_password_page).post(account::update_password),
        )
        .route(
            "/update-info",
            get(account::update_info_page).post(account::update_info),
        )
        // Reviews
        .route(
            "/review/{product_id}",
            get(reviews::review_redirect).post(reviews::add_review),
        )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::PathBuf;
    use std::time::Duration;

    use axum::Router;
    use axum::body::Body;
    use axum::http::{HeaderMap, Request, StatusCode, header};
    use axum::response::Response;
    use secrecy::SecretString;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;
    use tower_sessions::MemoryStore;

    use crate::config::{LogFormat, StorefrontConfig};
    use crate::middleware::{LOGIN_REQUIRED_FEATURE, LOGIN_REQUIRED_PAGE, session_layer_with_store};
    use crate::state::AppState;

    const FORM: &str = "application/x-www-form-urlencoded";

    /// Router over an in-memory session store and a pool that never connects.
    fn test_app() -> Router {
        let config = StorefrontConfig {
            database_url: SecretString::from("postgres://nobody@127.0.0.1:1/none"),
            host: [127, 0, 0, 1].into(),
            port: 0,
            base_url: "http://localhost:8000".to_string(),
            session_secret: SecretString::from("kT9#vQ2$wL7!pZ4&mN8*rX3^bC6@hJ1%"),
            static_dir: PathBuf::from("static"),
            sentry_dsn: None,
            sentry_environment: None,
            log_format: LogFormat::Pretty,
        };
        let pool = PgPoolOptions::new()
            .acquire_timeout(Duration::from_secs(1))
            .connect_lazy("postgres://nobody@127.0.0.1:1/none")
            .unwrap();

        crate::app(
            AppState::new(config, pool),
            session_layer_with_store(MemoryStore::default(), false),
        )
    }

    async fn send(app: &Router, request: Request<Body>) -> Response {
        app.clone().oneshot(request).await.unwrap()
    }

    fn get_with_cookie(uri: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::get(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::empty()).unwrap()
    }

    fn post_form(uri: &str, body: &'static str) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, FORM)
            .body(Body::from(body))
            .unwrap()
    }

    fn location(headers: &HeaderMap) -> &str {
        headers.get(header::LOCATION).unwrap().to_str().unwrap()
    }

    /// The `name=value` part of the session cookie, if one was set.
    fn session_cookie(response: &Response) -> Option<String> {
        response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find(|v| v.starts_with(crate::middleware::session::SESSION_COOKIE_NAME))
            .and_then(|v| v.split(';').next())
            .map(String::from)
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_health_has_request_id_and_security_headers() {
        let app = test_app();
        let response = send(
            &app,
            Request::get("/health")
                .header("x-request-id", "abc-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers.get("x-request-id").unwrap(), "abc-123");
        assert_eq!(headers.get("x-frame-options").unwrap(), "DENY");
        assert!(headers.contains_key("content-security-policy"));
        assert_eq!(body_text(response).await, "ok");
    }

    #[tokio::test]
    async fn test_every_response_carries_full_header_set() {
        let app = test_app();
        let response = send(&app, get_with_cookie("/about", None)).await;

        let headers = response.headers();
        for name in [
            "x-frame-options",
            "x-content-type-options",
            "referrer-policy",
            "content-security-policy",
            "permissions-policy",
            "cross-origin-opener-policy",
            "x-dns-prefetch-control",
        ] {
            assert!(headers.contains_key(name), "missing {name}");
        }
        assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
        assert_eq!(headers.get("cache-control").unwrap(), "no-store, max-age=0");
    }

    #[tokio::test]
    async fn test_cart_update_ignores_products_not_in_cart() {
        let app = test_app();
        let response = send(
            &app,
            post_form("/cart/update", "product_id=424242&quantity=5"),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(response.headers()), "/cart");

        let cookie = session_cookie(&response).unwrap();
        let page = send(&app, get_with_cookie("/about", Some(&cookie))).await;
        let body = body_text(page).await;
        assert!(body.contains(r#"cart-count">0</span>"#));
    }

    #[tokio::test]
    async fn test_payment_success_without_checkout_renders() {
        let app = test_app();
        let response = send(&app, get_with_cookie("/payment/success", None)).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("Payment Successful"));
    }

    #[tokio::test]
    async fn test_non_numeric_review_page_is_not_rejected() {
        let app = test_app();
        for uri in ["/product/1?page=abc", "/product/1?page=-1", "/product/1?page="] {
            let response = send(&app, get_with_cookie(uri, None)).await;
            assert_ne!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
        }
    }

    #[tokio::test]
    async fn test_category_load_failure_redirects_home_with_notice() {
        let app = test_app();
        let response = send(&app, get_with_cookie("/category/Home-Office", None)).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(response.headers()), "/");

        let cookie = session_cookie(&response).unwrap();
        let page = send(&app, get_with_cookie("/about", Some(&cookie))).await;
        assert!(
            body_text(page)
                .await
                .contains(super::catalog::CATEGORY_NOT_FOUND)
        );
    }

    #[tokio::test]
    async fn test_guest_wishlist_redirects_home_with_notice() {
        let app = test_app();
        let response = send(&app, get_with_cookie("/wishlist", None)).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(response.headers()), "/");

        let cookie = session_cookie(&response).unwrap();
        let page = send(&app, get_with_cookie("/about", Some(&cookie))).await;
        assert!(body_text(page).await.contains(LOGIN_REQUIRED_FEATURE));
    }

    #[tokio::test]
    async fn test_guest_wishlist_add_is_refused_before_lookup() {
        let app = test_app();
        let response = send(&app, post_form("/wishlist/add/3", "")).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(response.headers()), "/");
    }

    #[tokio::test]
    async fn test_guest_update_user_redirects_home_with_notice() {
        let app = test_app();
        let response = send(&app, get_with_cookie("/update-user", None)).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(response.headers()), "/");

        let cookie = session_cookie(&response).unwrap();
        let page = send(&app, get_with_cookie("/about", Some(&cookie))).await;
        assert!(body_text(page).await.contains(LOGIN_REQUIRED_PAGE));
    }

    #[tokio::test]
    async fn test_flash_is_shown_once() {
        let app = test_app();
        let response = send(&app, get_with_cookie("/update-info", None)).await;
        let cookie = session_cookie(&response).unwrap();

        let first = send(&app, get_with_cookie("/about", Some(&cookie))).await;
        assert!(body_text(first).await.contains(LOGIN_REQUIRED_PAGE));

        let second = send(&app, get_with_cookie("/about", Some(&cookie))).await;
        assert!(!body_text(second).await.contains(LOGIN_REQUIRED_PAGE));
    }

    #[tokio::test]
    async fn test_guest_review_redirects_to_login_with_next() {
        let app = test_app();
        let response = send(&app, post_form("/review/3", "rating=5&text=Great")).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(response.headers()), "/login?next=/product/3");
    }

    #[tokio::test]
    async fn test_review_get_goes_to_product() {
        let app = test_app();
        let response = send(&app, get_with_cookie("/review/7", None)).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(response.headers()), "/product/7");
    }

    #[tokio::test]
    async fn test_empty_cart_renders() {
        let app = test_app();
        let response = send(&app, get_with_cookie("/cart", None)).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("Your cart is empty"));
    }

    #[tokio::test]
    async fn test_guest_checkout_shows_blank_shipping_form() {
        let app = test_app();
        let response = send(&app, get_with_cookie("/checkout", None)).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_text(response).await;
        assert!(body.contains(r#"name="full_name" value="""#));
        assert!(body.contains(r#"name="address1" value="""#));
    }

    #[tokio::test]
    async fn test_checkout_with_empty_cart_goes_back_to_cart() {
        let app = test_app();
        let response = send(
            &app,
            post_form(
                "/checkout",
                "full_name=Ada&email=ada%40example.com&address1=1+Row&city=London&country=UK",
            ),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(response.headers()), "/cart");
    }

    #[tokio::test]
    async fn test_blank_search_shows_not_found_notice() {
        let app = test_app();
        let response = send(&app, post_form("/search", "searched=+")).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(
            body_text(response)
                .await
                .contains(super::catalog::NO_SEARCH_RESULTS)
        );
    }

    #[tokio::test]
    async fn test_search_form_renders() {
        let app = test_app();
        let response = send(&app, get_with_cookie("/search", None)).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains(r#"name="searched""#));
    }

    #[tokio::test]
    async fn test_logout_flashes_notice() {
        let app = test_app();
        let response = send(&app, get_with_cookie("/logout", None)).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(response.headers()), "/");

        let cookie = session_cookie(&response).unwrap();
        let page = send(&app, get_with_cookie("/about", Some(&cookie))).await;
        assert!(body_text(page).await.contains("You Have Been Logged Out..."));
    }

    #[tokio::test]
    async fn test_login_page_keeps_only_local_next() {
        let app = test_app();

        let local = send(&app, get_with_cookie("/login?next=/product/3", None)).await;
        assert!(body_text(local).await.contains(r#"name="next""#));

        let offsite = send(
            &app,
            get_with_cookie("/login?next=https://evil.example", None),
        )
        .await;
        let body = body_text(offsite).await;
        assert!(!body.contains(r#"name="next""#));
        assert!(!body.contains("evil.example"));
    }
}
