//! Integration tests for browsing: categories, search, and the wishlist.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (`emp-cli migrate`)
//! - The storefront running (`cargo run -p emporium-storefront`)

use reqwest::StatusCode;

use emporium_integration_tests::{TestContext, location, product_link, unique};

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_unknown_category_redirects_home_with_notice() {
    let ctx = TestContext::new().await;
    let client = ctx.client();

    let resp = client
        .get(ctx.url(&format!("/category/{}", unique("missing-"))))
        .send()
        .await
        .expect("Failed to get category");

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/");

    let body = ctx.page(&client, "/").await;
    assert!(body.contains("Category Not Found"));
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_category_lists_its_products() {
    let ctx = TestContext::new().await;
    let client = ctx.client();
    let product = ctx.seed_product(1250).await;

    let category_name = product.name.replacen("Product", "Category", 1);
    let slug = category_name.replace(' ', "-");
    let body = ctx.page(&client, &format!("/category/{slug}")).await;

    assert!(body.contains(&product_link(&product)));
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_search_without_match_shows_notice() {
    let ctx = TestContext::new().await;
    let client = ctx.client();

    let resp = client
        .post(ctx.url("/search"))
        .form(&[("searched", unique("nothing-like-"))])
        .send()
        .await
        .expect("Failed to search");

    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.expect("Failed to read body");
    assert!(body.contains("That Product Does Not Exist..."));
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_search_matches_name_case_insensitively() {
    let ctx = TestContext::new().await;
    let client = ctx.client();
    let product = ctx.seed_product(900).await;

    let resp = client
        .post(ctx.url("/search"))
        .form(&[("searched", product.name.to_uppercase())])
        .send()
        .await
        .expect("Failed to search");

    let body = resp.text().await.expect("Failed to read body");
    assert!(body.contains(&product_link(&product)));
    assert!(!body.contains("That Product Does Not Exist..."));
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_wishlist_add_is_idempotent() {
    let ctx = TestContext::new().await;
    let client = ctx.client();
    let product = ctx.seed_product(4000).await;
    ctx.register(&client).await;

    for _ in 0..2 {
        let resp = client
            .post(ctx.url(&format!("/wishlist/add/{}", product.id)))
            .send()
            .await
            .expect("Failed to add to wishlist");
        assert_eq!(location(&resp), format!("/product/{}", product.id));
    }

    let body = ctx.page(&client, "/wishlist").await;
    assert_eq!(body.matches(&product_link(&product)).count(), 1);

    let resp = client
        .post(ctx.url(&format!("/wishlist/remove/{}", product.id)))
        .send()
        .await
        .expect("Failed to remove from wishlist");
    assert_eq!(location(&resp), "/wishlist");

    let body = ctx.page(&client, "/wishlist").await;
    assert!(!body.contains(&product_link(&product)));
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_wishlist_add_unknown_product_is_not_found() {
    let ctx = TestContext::new().await;
    let client = ctx.client();
    ctx.register(&client).await;

    let resp = client
        .post(ctx.url(&format!("/wishlist/add/{}", i32::MAX)))
        .send()
        .await
        .expect("Failed to add to wishlist");

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_wishlist_remove_of_absent_product_is_a_no_op() {
    let ctx = TestContext::new().await;
    let kept = ctx.seed_product(1500).await;
    let never_added = ctx.seed_product(2500).await;

    // No wishlist row exists yet for a fresh account
    let newcomer = ctx.client();
    ctx.register(&newcomer).await;
    let resp = newcomer
        .post(ctx.url(&format!("/wishlist/remove/{}", never_added.id)))
        .send()
        .await
        .expect("Failed to remove from wishlist");
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/wishlist");

    // An existing wishlist keeps its other entries
    let client = ctx.client();
    ctx.register(&client).await;
    client
        .post(ctx.url(&format!("/wishlist/add/{}", kept.id)))
        .send()
        .await
        .expect("Failed to add to wishlist");

    let resp = client
        .post(ctx.url(&format!("/wishlist/remove/{}", never_added.id)))
        .send()
        .await
        .expect("Failed to remove from wishlist");
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/wishlist");

    let body = ctx.page(&client, "/wishlist").await;
    assert_eq!(body.matches(&product_link(&kept)).count(), 1);
    assert!(!body.contains(&product_link(&never_added)));
}
