//! Integration tests for the storefront catalog pages.
//!
//! These tests require:
//! - A migrated database with the demo catalog (cargo run -p wildbloom-cli -- migrate && cargo run -p wildbloom-cli -- seed)
//! - The storefront server running (cargo run -p wildbloom-storefront)
//!
//! Run with: cargo test -p wildbloom-integration-tests -- --ignored

use reqwest::StatusCode;
use wildbloom_integration_tests::{client, csrf_token, input_value, storefront_url};

// ============================================================================
// Health Checks
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_health_endpoints_respond() {
    let client = client();
    let base_url = storefront_url();

    let resp = client
        .get(format!("{base_url}/health"))
        .send()
        .await
        .expect("Failed to reach /health");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.expect("Failed to read body"), "ok");

    let resp = client
        .get(format!("{base_url}/health/ready"))
        .send()
        .await
        .expect("Failed to reach /health/ready");
    assert_eq!(resp.status(), StatusCode::OK);
}

// ============================================================================
// Home Page
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront server and seeded catalog"]
async fn test_home_page_shows_featured_products() {
    let client = client();
    let base_url = storefront_url();

    let resp = client
        .get(format!("{base_url}/"))
        .send()
        .await
        .expect("Failed to get home page");
    assert_eq!(resp.status(), StatusCode::OK);

    let body = resp.text().await.expect("Failed to read home page");
    // The two seeded featured products.
    assert!(body.contains("California Golden Poppy"));
    assert!(body.contains("Prairie Wildflower Mix"));
    // Non-featured products stay off the home page.
    assert!(!body.contains("Butterfly Milkweed"));
}

// ============================================================================
// Product Listing
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront server and seeded catalog"]
async fn test_product_listing_shows_the_catalog() {
    let client = client();
    let base_url = storefront_url();

    let resp = client
        .get(format!("{base_url}/products"))
        .send()
        .await
        .expect("Failed to get product listing");
    assert_eq!(resp.status(), StatusCode::OK);

    let body = resp.text().await.expect("Failed to read listing");
    assert!(body.contains("Butterfly Milkweed"));
    assert!(body.contains("Purple Coneflower"));
    assert!(body.contains("Wildbloom Gift Card"));
    // Prices come straight from the seed data.
    assert!(body.contains("$5.25"));
}

#[tokio::test]
#[ignore = "Requires running storefront server and seeded catalog"]
async fn test_listing_page_out_of_range_is_empty_not_an_error() {
    let client = client();
    let base_url = storefront_url();

    let resp = client
        .get(format!("{base_url}/products?page=999"))
        .send()
        .await
        .expect("Failed to get out-of-range page");
    assert_eq!(resp.status(), StatusCode::OK);

    let body = resp.text().await.expect("Failed to read listing");
    assert!(!body.contains("Butterfly Milkweed"));
}

// ============================================================================
// Product Detail
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront server and seeded catalog"]
async fn test_product_page_carries_the_add_to_cart_form() {
    let client = client();
    let base_url = storefront_url();

    let resp = client
        .get(format!("{base_url}/products/butterfly-milkweed"))
        .send()
        .await
        .expect("Failed to get product page");
    assert_eq!(resp.status(), StatusCode::OK);

    let body = resp.text().await.expect("Failed to read product page");
    assert!(body.contains("Butterfly Milkweed"));
    assert!(body.contains("$5.25"));
    assert!(
        csrf_token(&body).is_some(),
        "product page should embed a CSRF token"
    );
    assert!(
        input_value(&body, "product_id").is_some(),
        "add-to-cart form should carry the product id"
    );
}

#[tokio::test]
#[ignore = "Requires running storefront server and seeded catalog"]
async fn test_product_page_lists_variants_with_prices() {
    let client = client();
    let base_url = storefront_url();

    let resp = client
        .get(format!("{base_url}/products/gift-card"))
        .send()
        .await
        .expect("Failed to get gift card page");
    assert_eq!(resp.status(), StatusCode::OK);

    let body = resp.text().await.expect("Failed to read gift card page");
    // All three denominations, with the variant price override applied.
    assert!(body.contains("$25"));
    assert!(body.contains("$50.00"));
    assert!(body.contains("$100.00"));
    assert!(
        input_value(&body, "variant_id").is_some(),
        "variant selector should list the variant ids"
    );
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_unknown_product_returns_404() {
    let client = client();
    let base_url = storefront_url();

    let resp = client
        .get(format!("{base_url}/products/no-such-seed"))
        .send()
        .await
        .expect("Failed to request unknown product");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
