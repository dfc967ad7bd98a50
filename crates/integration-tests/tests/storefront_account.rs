//! Integration tests for registration, login, and the checkout journey.
//!
//! These tests require:
//! - A migrated database with the demo catalog (cargo run -p wildbloom-cli -- migrate && cargo run -p wildbloom-cli -- seed)
//! - The storefront server running (cargo run -p wildbloom-storefront)
//!
//! Run with: cargo test -p wildbloom-integration-tests -- --ignored
//!
//! Each test registers its own throwaway account, so the tests are
//! independent and safe to repeat against the same database.

use reqwest::{Client, StatusCode};
use wildbloom_integration_tests::{
    client, csrf_token, input_value, path_id, storefront_url, unique_email,
};

const PASSWORD: &str = "wildbloom-test-pw";

/// Register a fresh account. Registration does not sign the session in, it
/// renders the check-your-email page.
async fn register(client: &Client, base_url: &str) -> String {
    let email = unique_email("shopper");

    let resp = client
        .get(format!("{base_url}/auth/register"))
        .send()
        .await
        .expect("Failed to get register page");
    let page = resp.text().await.expect("Failed to read register page");
    let token = csrf_token(&page).expect("register page should embed a CSRF token");

    let resp = client
        .post(format!("{base_url}/auth/register"))
        .form(&[
            ("name", "Test Shopper"),
            ("email", email.as_str()),
            ("password", PASSWORD),
            ("password_confirmation", PASSWORD),
            ("csrf_token", token.as_str()),
        ])
        .send()
        .await
        .expect("Failed to register");
    assert_eq!(resp.status(), StatusCode::OK);

    let body = resp.text().await.expect("Failed to read response");
    assert!(body.contains("verification link"));
    assert!(body.contains(&email));

    email
}

/// Log in and land on the account page.
async fn login(client: &Client, base_url: &str, email: &str) {
    let resp = client
        .get(format!("{base_url}/auth/login"))
        .send()
        .await
        .expect("Failed to get login page");
    let page = resp.text().await.expect("Failed to read login page");
    let token = csrf_token(&page).expect("login page should embed a CSRF token");

    let resp = client
        .post(format!("{base_url}/auth/login"))
        .form(&[
            ("email", email),
            ("password", PASSWORD),
            ("next", ""),
            ("csrf_token", token.as_str()),
        ])
        .send()
        .await
        .expect("Failed to log in");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.url().path(), "/account");
}

// ============================================================================
// Registration & Login
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_register_then_login_reaches_the_account_page() {
    let client = client();
    let base_url = storefront_url();

    let email = register(&client, &base_url).await;
    login(&client, &base_url, &email).await;

    let resp = client
        .get(format!("{base_url}/account"))
        .send()
        .await
        .expect("Failed to get account page");
    assert_eq!(resp.status(), StatusCode::OK);

    let body = resp.text().await.expect("Failed to read account page");
    assert!(body.contains("Hi, Test Shopper"));
    assert!(body.contains(&email));
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_register_rejects_mismatched_passwords() {
    let client = client();
    let base_url = storefront_url();
    let email = unique_email("mismatch");

    let resp = client
        .get(format!("{base_url}/auth/register"))
        .send()
        .await
        .expect("Failed to get register page");
    let page = resp.text().await.expect("Failed to read register page");
    let token = csrf_token(&page).expect("register page should embed a CSRF token");

    let resp = client
        .post(format!("{base_url}/auth/register"))
        .form(&[
            ("name", "Test Shopper"),
            ("email", email.as_str()),
            ("password", PASSWORD),
            ("password_confirmation", "something-else"),
            ("csrf_token", token.as_str()),
        ])
        .send()
        .await
        .expect("Failed to post register form");
    assert_eq!(resp.status(), StatusCode::OK);

    let body = resp.text().await.expect("Failed to read response");
    assert!(body.contains("passwords do not match"));
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_login_rejects_a_wrong_password() {
    let client = client();
    let base_url = storefront_url();

    let email = register(&client, &base_url).await;

    let resp = client
        .get(format!("{base_url}/auth/login"))
        .send()
        .await
        .expect("Failed to get login page");
    let page = resp.text().await.expect("Failed to read login page");
    let token = csrf_token(&page).expect("login page should embed a CSRF token");

    let resp = client
        .post(format!("{base_url}/auth/login"))
        .form(&[
            ("email", email.as_str()),
            ("password", "wrong-password"),
            ("next", ""),
            ("csrf_token", token.as_str()),
        ])
        .send()
        .await
        .expect("Failed to post login form");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.url().path(), "/auth/login");

    let body = resp.text().await.expect("Failed to read response");
    assert!(body.contains("Invalid email or password"));
    // The typed email survives the re-render.
    assert!(body.contains(&email));
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_logout_clears_the_session() {
    let client = client();
    let base_url = storefront_url();

    let email = register(&client, &base_url).await;
    login(&client, &base_url, &email).await;

    let resp = client
        .get(format!("{base_url}/account"))
        .send()
        .await
        .expect("Failed to get account page");
    let page = resp.text().await.expect("Failed to read account page");
    let token = csrf_token(&page).expect("account page should embed a CSRF token");

    let resp = client
        .post(format!("{base_url}/auth/logout"))
        .form(&[("csrf_token", token.as_str())])
        .send()
        .await
        .expect("Failed to log out");
    assert_eq!(resp.status(), StatusCode::OK);

    // The account page is gated again.
    let resp = client
        .get(format!("{base_url}/account"))
        .send()
        .await
        .expect("Failed to get account page");
    assert_eq!(resp.url().path(), "/auth/login");
}

// ============================================================================
// Checkout
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_checkout_requires_login() {
    let client = client();
    let base_url = storefront_url();

    let resp = client
        .get(format!("{base_url}/checkout"))
        .send()
        .await
        .expect("Failed to get checkout");
    assert_eq!(resp.url().path(), "/auth/login");
    assert!(
        resp.url().query().is_some_and(|q| q.contains("next=")),
        "login redirect should carry the return target"
    );
}

#[tokio::test]
#[ignore = "Requires running storefront server and seeded catalog"]
async fn test_checkout_with_an_empty_cart_goes_back_to_the_cart() {
    let client = client();
    let base_url = storefront_url();

    let email = register(&client, &base_url).await;
    login(&client, &base_url, &email).await;

    let resp = client
        .get(format!("{base_url}/checkout"))
        .send()
        .await
        .expect("Failed to get checkout");
    assert_eq!(resp.url().path(), "/cart");
}

#[tokio::test]
#[ignore = "Requires running storefront server and seeded catalog"]
async fn test_full_checkout_journey_places_an_order() {
    let client = client();
    let base_url = storefront_url();

    let email = register(&client, &base_url).await;
    login(&client, &base_url, &email).await;

    // Two packets of coneflower seeds.
    let resp = client
        .get(format!("{base_url}/products/purple-coneflower"))
        .send()
        .await
        .expect("Failed to get product page");
    let page = resp.text().await.expect("Failed to read product page");
    let token = csrf_token(&page).expect("product page should embed a CSRF token");
    let product_id = input_value(&page, "product_id").expect("form should carry the product id");

    let resp = client
        .post(format!("{base_url}/cart/items"))
        .form(&[
            ("product_id", product_id.as_str()),
            ("quantity", "2"),
            ("csrf_token", token.as_str()),
        ])
        .send()
        .await
        .expect("Failed to add to cart");
    assert_eq!(resp.url().path(), "/cart");

    // The checkout form renders for a filled cart.
    let resp = client
        .get(format!("{base_url}/checkout"))
        .send()
        .await
        .expect("Failed to get checkout");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.url().path(), "/checkout");
    let page = resp.text().await.expect("Failed to read checkout page");
    let token = csrf_token(&page).expect("checkout page should embed a CSRF token");

    // Place the order.
    let resp = client
        .post(format!("{base_url}/checkout"))
        .form(&[
            ("name", "Test Shopper"),
            ("address1", "12 Meadow Lane"),
            ("address2", ""),
            ("city", "Petaluma"),
            ("postal_code", "94952"),
            ("country", "US"),
            ("csrf_token", token.as_str()),
        ])
        .send()
        .await
        .expect("Failed to place order");
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(
        resp.url().path().starts_with("/checkout/confirmation/"),
        "placing the order should land on the confirmation page"
    );

    let body = resp.text().await.expect("Failed to read confirmation");
    assert!(body.contains("Thank you!"));
    assert!(body.contains("WB-"));
    assert!(body.contains("Purple Coneflower"));
    // 2 x $5.75
    assert!(body.contains("$11.50"));

    // The cart drained into the order.
    let resp = client
        .get(format!("{base_url}/cart/count"))
        .send()
        .await
        .expect("Failed to get cart count");
    assert_eq!(
        resp.text().await.expect("Failed to read count").trim(),
        "0"
    );

    // The order shows up in the account history.
    let resp = client
        .get(format!("{base_url}/account/orders"))
        .send()
        .await
        .expect("Failed to get order history");
    assert_eq!(resp.status(), StatusCode::OK);
    let history = resp.text().await.expect("Failed to read order history");
    assert!(history.contains("WB-"));

    let order_id = path_id(&history, "", "/account/orders/")
        .expect("history should link to the order detail");
    let resp = client
        .get(format!("{base_url}/account/orders/{order_id}"))
        .send()
        .await
        .expect("Failed to get order detail");
    assert_eq!(resp.status(), StatusCode::OK);
    let detail = resp.text().await.expect("Failed to read order detail");
    assert!(detail.contains("Purple Coneflower"));
    assert!(detail.contains("12 Meadow Lane"));
}

#[tokio::test]
#[ignore = "Requires running storefront server and seeded catalog"]
async fn test_guest_cart_merges_into_the_account_on_login() {
    let client = client();
    let base_url = storefront_url();

    let email = register(&client, &base_url).await;

    // Fill the cart while logged out.
    let resp = client
        .get(format!("{base_url}/products/black-eyed-susan"))
        .send()
        .await
        .expect("Failed to get product page");
    let page = resp.text().await.expect("Failed to read product page");
    let token = csrf_token(&page).expect("product page should embed a CSRF token");
    let product_id = input_value(&page, "product_id").expect("form should carry the product id");

    let resp = client
        .post(format!("{base_url}/cart/items"))
        .form(&[
            ("product_id", product_id.as_str()),
            ("quantity", "2"),
            ("csrf_token", token.as_str()),
        ])
        .send()
        .await
        .expect("Failed to add to cart");
    assert_eq!(resp.url().path(), "/cart");

    login(&client, &base_url, &email).await;

    // The guest lines followed the login.
    let resp = client
        .get(format!("{base_url}/cart"))
        .send()
        .await
        .expect("Failed to get cart page");
    let body = resp.text().await.expect("Failed to read cart page");
    assert!(body.contains("Black-Eyed Susan"));

    let resp = client
        .get(format!("{base_url}/cart/count"))
        .send()
        .await
        .expect("Failed to get cart count");
    assert_eq!(
        resp.text().await.expect("Failed to read count").trim(),
        "2"
    );
}

#[tokio::test]
#[ignore = "Requires running storefront server and seeded catalog"]
async fn test_move_to_cart_takes_the_entry_off_the_wishlist() {
    let client = client();
    let base_url = storefront_url();

    let email = register(&client, &base_url).await;
    login(&client, &base_url, &email).await;

    // Save a product.
    let resp = client
        .get(format!("{base_url}/products/butterfly-milkweed"))
        .send()
        .await
        .expect("Failed to get product page");
    let page = resp.text().await.expect("Failed to read product page");
    let token = csrf_token(&page).expect("product page should embed a CSRF token");
    let product_id = input_value(&page, "product_id").expect("form should carry the product id");

    let resp = client
        .post(format!("{base_url}/wishlist/items"))
        .form(&[
            ("product_id", product_id.as_str()),
            ("csrf_token", token.as_str()),
        ])
        .send()
        .await
        .expect("Failed to save to wishlist");
    assert_eq!(resp.url().path(), "/wishlist");
    let wishlist = resp.text().await.expect("Failed to read wishlist page");
    let item_id = path_id(&wishlist, "", "action=\"/wishlist/items/")
        .expect("wishlist page should list the saved product");

    // The move is one atomic step: the line lands in the cart and the entry
    // leaves the wishlist together.
    let resp = client
        .post(format!("{base_url}/wishlist/items/{item_id}/move-to-cart"))
        .form(&[("csrf_token", token.as_str())])
        .send()
        .await
        .expect("Failed to move to cart");
    assert_eq!(resp.url().path(), "/cart");
    let cart = resp.text().await.expect("Failed to read cart page");
    assert!(cart.contains("Butterfly Milkweed"));

    let resp = client
        .get(format!("{base_url}/wishlist"))
        .send()
        .await
        .expect("Failed to get wishlist");
    let body = resp.text().await.expect("Failed to read wishlist page");
    assert!(
        !body.contains("move-to-cart"),
        "moved entry should be gone from the wishlist"
    );

    // A stale double submit finds nothing to move and goes back.
    let resp = client
        .post(format!("{base_url}/wishlist/items/{item_id}/move-to-cart"))
        .form(&[("csrf_token", token.as_str())])
        .send()
        .await
        .expect("Failed to repost the move");
    assert_eq!(resp.url().path(), "/wishlist");

    let resp = client
        .get(format!("{base_url}/cart/count"))
        .send()
        .await
        .expect("Failed to get cart count");
    assert_eq!(resp.text().await.expect("Failed to read count").trim(), "1");
}
