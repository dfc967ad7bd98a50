//! Integration tests for the guest cart flow.
//!
//! These tests require:
//! - A migrated database with the demo catalog (cargo run -p wildbloom-cli -- migrate && cargo run -p wildbloom-cli -- seed)
//! - The storefront server running (cargo run -p wildbloom-storefront)
//!
//! Run with: cargo test -p wildbloom-integration-tests -- --ignored
//!
//! Every test uses a fresh cookie jar, so each one gets its own guest cart
//! and they can run in parallel without stepping on each other.

use reqwest::{Client, StatusCode};
use wildbloom_integration_tests::{client, csrf_token, input_value, path_id, storefront_url};

/// Fetch the cart badge fragment.
async fn cart_count(client: &Client, base_url: &str) -> String {
    let resp = client
        .get(format!("{base_url}/cart/count"))
        .send()
        .await
        .expect("Failed to get cart count");
    assert_eq!(resp.status(), StatusCode::OK);
    resp.text()
        .await
        .expect("Failed to read cart count")
        .trim()
        .to_string()
}

/// Load a product page and post its add-to-cart form.
async fn add_to_cart(client: &Client, base_url: &str, slug: &str, quantity: &str) -> String {
    let resp = client
        .get(format!("{base_url}/products/{slug}"))
        .send()
        .await
        .expect("Failed to get product page");
    assert_eq!(resp.status(), StatusCode::OK);
    let page = resp.text().await.expect("Failed to read product page");

    let token = csrf_token(&page).expect("product page should embed a CSRF token");
    let product_id = input_value(&page, "product_id").expect("add form should carry the product id");

    let resp = client
        .post(format!("{base_url}/cart/items"))
        .form(&[
            ("product_id", product_id.as_str()),
            ("quantity", quantity),
            ("csrf_token", token.as_str()),
        ])
        .send()
        .await
        .expect("Failed to add to cart");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.url().path(), "/cart");
    resp.text().await.expect("Failed to read cart page")
}

// ============================================================================
// Cart Lifecycle
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront server and seeded catalog"]
async fn test_guest_cart_add_update_and_remove() {
    let client = client();
    let base_url = storefront_url();

    assert_eq!(cart_count(&client, &base_url).await, "0");

    // Add two packets of milkweed.
    let cart = add_to_cart(&client, &base_url, "butterfly-milkweed", "2").await;
    assert!(cart.contains("Butterfly Milkweed"));
    assert_eq!(cart_count(&client, &base_url).await, "2");

    // Bump the line to three.
    let line_id =
        path_id(&cart, "", "action=\"/cart/items/").expect("cart page should show the line form");
    let token = csrf_token(&cart).expect("cart page should embed a CSRF token");

    let resp = client
        .post(format!("{base_url}/cart/items/{line_id}"))
        .form(&[("quantity", "3"), ("csrf_token", token.as_str())])
        .send()
        .await
        .expect("Failed to update cart line");
    assert_eq!(resp.url().path(), "/cart");
    assert_eq!(cart_count(&client, &base_url).await, "3");

    // Remove the line.
    let resp = client
        .post(format!("{base_url}/cart/items/{line_id}/remove"))
        .form(&[("csrf_token", token.as_str())])
        .send()
        .await
        .expect("Failed to remove cart line");
    assert_eq!(resp.url().path(), "/cart");

    let body = resp.text().await.expect("Failed to read cart page");
    assert!(body.contains("Your cart is empty"));
    assert_eq!(cart_count(&client, &base_url).await, "0");
}

#[tokio::test]
#[ignore = "Requires running storefront server and seeded catalog"]
async fn test_adding_the_same_line_twice_merges_quantities() {
    let client = client();
    let base_url = storefront_url();

    add_to_cart(&client, &base_url, "purple-coneflower", "1").await;
    add_to_cart(&client, &base_url, "purple-coneflower", "2").await;

    // One merged line, not two.
    assert_eq!(cart_count(&client, &base_url).await, "3");
    let resp = client
        .get(format!("{base_url}/cart"))
        .send()
        .await
        .expect("Failed to get cart page");
    let body = resp.text().await.expect("Failed to read cart page");
    assert_eq!(body.matches("/cart/items/").count(), 2, "one update form and one remove form");
}

#[tokio::test]
#[ignore = "Requires running storefront server and seeded catalog"]
async fn test_variant_choice_is_kept_on_the_line() {
    let client = client();
    let base_url = storefront_url();

    let resp = client
        .get(format!("{base_url}/products/gift-card"))
        .send()
        .await
        .expect("Failed to get gift card page");
    let page = resp.text().await.expect("Failed to read gift card page");

    let token = csrf_token(&page).expect("page should embed a CSRF token");
    let product_id = input_value(&page, "product_id").expect("form should carry the product id");
    // First option in the selector is the $25 card.
    let variant_id = input_value(&page, "variant_id").expect("selector should list variant ids");

    let resp = client
        .post(format!("{base_url}/cart/items"))
        .form(&[
            ("product_id", product_id.as_str()),
            ("variant_id", variant_id.as_str()),
            ("quantity", "1"),
            ("csrf_token", token.as_str()),
        ])
        .send()
        .await
        .expect("Failed to add gift card");
    assert_eq!(resp.url().path(), "/cart");

    let body = resp.text().await.expect("Failed to read cart page");
    assert!(body.contains("Wildbloom Gift Card"));
    assert!(body.contains("$25"), "line should name the chosen variant");
}

// ============================================================================
// Concurrent Writes
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront server and seeded catalog"]
async fn test_racing_cart_writes_never_error() {
    let client = client();
    let base_url = storefront_url();

    let resp = client
        .get(format!("{base_url}/products/purple-coneflower"))
        .send()
        .await
        .expect("Failed to get product page");
    let page = resp.text().await.expect("Failed to read product page");
    let token = csrf_token(&page).expect("product page should embed a CSRF token");
    let product_id = input_value(&page, "product_id").expect("add form should carry the product id");

    let cart = add_to_cart(&client, &base_url, "purple-coneflower", "1").await;
    let line_id =
        path_id(&cart, "", "action=\"/cart/items/").expect("cart page should show the line form");

    // Add and update both lock the cart line before the product row, the
    // same order checkout uses, so racing writers queue on the line lock.
    // An inverted lock order would deadlock under this race and Postgres
    // would abort one transaction, surfacing as a 500.
    for _ in 0..10 {
        let add = client
            .post(format!("{base_url}/cart/items"))
            .form(&[
                ("product_id", product_id.as_str()),
                ("quantity", "1"),
                ("csrf_token", token.as_str()),
            ])
            .send();
        let update = client
            .post(format!("{base_url}/cart/items/{line_id}"))
            .form(&[("quantity", "2"), ("csrf_token", token.as_str())])
            .send();

        let (add, update) = tokio::join!(add, update);
        let add = add.expect("Failed to add to cart");
        let update = update.expect("Failed to update cart line");
        assert!(!add.status().is_server_error(), "add came back {}", add.status());
        assert!(
            !update.status().is_server_error(),
            "update came back {}",
            update.status()
        );
    }
}

// ============================================================================
// CSRF Protection
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront server and seeded catalog"]
async fn test_cart_post_without_a_valid_token_is_rejected() {
    let client = client();
    let base_url = storefront_url();

    // Establish a session first so only the token is wrong.
    let resp = client
        .get(format!("{base_url}/products/butterfly-milkweed"))
        .send()
        .await
        .expect("Failed to get product page");
    let page = resp.text().await.expect("Failed to read product page");
    let product_id = input_value(&page, "product_id").expect("form should carry the product id");

    let resp = client
        .post(format!("{base_url}/cart/items"))
        .form(&[
            ("product_id", product_id.as_str()),
            ("quantity", "1"),
            ("csrf_token", "not-the-real-token"),
        ])
        .send()
        .await
        .expect("Failed to post with bogus token");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(cart_count(&client, &base_url).await, "0");
}

// ============================================================================
// Wishlist Gate
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_wishlist_requires_login() {
    let client = client();
    let base_url = storefront_url();

    let resp = client
        .get(format!("{base_url}/wishlist"))
        .send()
        .await
        .expect("Failed to get wishlist");
    // Redirected to the login page with the wishlist as the return target.
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.url().path(), "/auth/login");
}
