//! Integration tests for the cart, login merge, and checkout.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (`emp-cli migrate`)
//! - The storefront running (`cargo run -p emporium-storefront`)

use reqwest::StatusCode;

use emporium_integration_tests::{TestContext, location, product_link, unique};

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_cart_add_update_delete() {
    let ctx = TestContext::new().await;
    let client = ctx.client();
    let product = ctx.seed_product(1000).await;

    ctx.add_to_cart(&client, &product, 2).await;
    let body = ctx.page(&client, "/cart").await;
    assert!(body.contains("Product Added To Cart..."));
    assert!(body.contains(&product_link(&product)));
    assert!(body.contains("$20.00"));

    let resp = client
        .post(ctx.url("/cart/update"))
        .form(&[("product_id", product.id.to_string()), ("quantity", "3".to_string())])
        .send()
        .await
        .expect("Failed to update cart");
    assert_eq!(location(&resp), "/cart");
    let body = ctx.page(&client, "/cart").await;
    assert!(body.contains("$30.00"));

    let resp = client
        .post(ctx.url("/cart/delete"))
        .form(&[("product_id", product.id.to_string())])
        .send()
        .await
        .expect("Failed to delete from cart");
    assert_eq!(location(&resp), "/cart");
    let body = ctx.page(&client, "/cart").await;
    assert!(body.contains("Your cart is empty"));
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_login_merges_saved_cart_into_session() {
    let ctx = TestContext::new().await;
    let saved = ctx.seed_product(500).await;
    let guest_pick = ctx.seed_product(700).await;

    // Signed in, the cart is saved to the profile
    let first_visit = ctx.client();
    let username = ctx.register(&first_visit).await;
    ctx.add_to_cart(&first_visit, &saved, 2).await;
    ctx.logout(&first_visit).await;

    let body = ctx.page(&first_visit, "/cart").await;
    assert!(body.contains("Your cart is empty"));

    // A guest cart survives login and gains the saved items
    let second_visit = ctx.client();
    ctx.add_to_cart(&second_visit, &guest_pick, 1).await;
    let resp = ctx.login(&second_visit, &username).await;
    assert_eq!(location(&resp), "/");

    let body = ctx.page(&second_visit, "/cart").await;
    assert!(body.contains(&product_link(&saved)));
    assert!(body.contains(&product_link(&guest_pick)));
    assert!(body.contains("$17.00"));
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_checkout_requires_shipping_fields() {
    let ctx = TestContext::new().await;
    let client = ctx.client();
    let product = ctx.seed_product(2500).await;
    ctx.add_to_cart(&client, &product, 1).await;

    let resp = client
        .post(ctx.url("/checkout"))
        .form(&[("full_name", ""), ("email", "not-an-email")])
        .send()
        .await
        .expect("Failed to submit checkout");

    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.expect("Failed to read body");
    assert!(body.contains("field-error"));
    assert!(body.contains(&product.name));
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_checkout_success_empties_cart() {
    let ctx = TestContext::new().await;
    let client = ctx.client();
    let product = ctx.seed_product(2500).await;
    ctx.add_to_cart(&client, &product, 1).await;

    let resp = client
        .post(ctx.url("/checkout"))
        .form(&[
            ("full_name", "Ada Lovelace"),
            ("email", "ada@example.com"),
            ("address1", "12 Analytical Row"),
            ("address2", ""),
            ("city", "London"),
            ("state", ""),
            ("zipcode", ""),
            ("country", "UK"),
        ])
        .send()
        .await
        .expect("Failed to submit checkout");
    assert_eq!(location(&resp), "/payment/success");

    let body = ctx.page(&client, "/payment/success").await;
    assert!(body.contains("Payment Successful"));
    assert!(body.contains("Ada Lovelace"));

    let body = ctx.page(&client, "/cart").await;
    assert!(body.contains("Your cart is empty"));
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_payment_success_without_checkout_keeps_cart() {
    let ctx = TestContext::new().await;
    let client = ctx.client();
    let product = ctx.seed_product(1200).await;
    ctx.add_to_cart(&client, &product, 2).await;

    let resp = client
        .get(ctx.url("/payment/success"))
        .send()
        .await
        .expect("Failed to fetch payment success");
    assert_eq!(resp.status(), StatusCode::OK);

    let body = ctx.page(&client, "/cart").await;
    assert!(body.contains(&product_link(&product)));
    assert!(body.contains("$24.00"));
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_checkout_prefills_saved_shipping_address() {
    let ctx = TestContext::new().await;
    let client = ctx.client();
    ctx.register(&client).await;

    let full_name = unique("Grace ");
    let city = unique("Arlington");
    let resp = client
        .post(ctx.url("/update-info"))
        .form(&[
            ("phone", "555-0100"),
            ("city", "Billing Town"),
            ("shipping_full_name", full_name.as_str()),
            ("shipping_email", "grace@example.com"),
            ("shipping_address1", "1 Compiler Way"),
            ("shipping_address2", ""),
            ("shipping_city", city.as_str()),
            ("shipping_state", "VA"),
            ("shipping_zipcode", "22201"),
            ("shipping_country", "US"),
        ])
        .send()
        .await
        .expect("Failed to update info");
    assert_eq!(location(&resp), "/");

    // Profile and shipping address were saved together
    let body = ctx.page(&client, "/update-info").await;
    assert!(body.contains(r#"name="phone" value="555-0100""#));
    assert!(body.contains(&format!(r#"name="shipping_full_name" value="{full_name}""#)));

    let body = ctx.page(&client, "/checkout").await;
    assert!(body.contains(&format!(r#"name="full_name" value="{full_name}""#)));
    assert!(body.contains(r#"name="email" value="grace@example.com""#));
    assert!(body.contains(r#"name="address1" value="1 Compiler Way""#));
    assert!(body.contains(&format!(r#"name="city" value="{city}""#)));
    assert!(body.contains(r#"name="zipcode" value="22201""#));
}
