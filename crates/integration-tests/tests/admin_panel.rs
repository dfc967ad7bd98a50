//! Integration tests for the admin panel.
//!
//! These tests require:
//! - A migrated database (cargo run -p wildbloom-cli -- migrate)
//! - The admin server running (cargo run -p wildbloom-admin)
//! - A super admin account created via the CLI, with its credentials in
//!   `ADMIN_TEST_EMAIL` / `ADMIN_TEST_PASSWORD`:
//!
//!   cargo run -p wildbloom-cli -- admin create \
//!       --email admin@example.com --name "Test Admin" \
//!       --role super_admin --password adminpass123
//!
//! Run with: cargo test -p wildbloom-integration-tests -- --ignored
//!
//! The product tests also hit the storefront to confirm what customers can
//! see, so run both servers.

use reqwest::{Client, StatusCode};
use uuid::Uuid;
use wildbloom_integration_tests::{
    admin_url, client, csrf_token, path_id, storefront_url, unique_email,
};

/// Super admin credentials (configurable via environment).
fn admin_credentials() -> (String, String) {
    let email =
        std::env::var("ADMIN_TEST_EMAIL").unwrap_or_else(|_| "admin@example.com".to_string());
    let password =
        std::env::var("ADMIN_TEST_PASSWORD").unwrap_or_else(|_| "adminpass123".to_string());
    (email, password)
}

/// Sign the client in and land on the dashboard.
async fn sign_in(client: &Client, base_url: &str) {
    let (email, password) = admin_credentials();

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
            ("password", password.as_str()),
            ("csrf_token", token.as_str()),
        ])
        .send()
        .await
        .expect("Failed to log in");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.url().path(), "/", "login should land on the dashboard");
}

/// GET a panel page and return its body.
async fn get_page(client: &Client, base_url: &str, path: &str) -> String {
    let resp = client
        .get(format!("{base_url}{path}"))
        .send()
        .await
        .unwrap_or_else(|_| panic!("Failed to get {path}"))
        .error_for_status()
        .unwrap_or_else(|_| panic!("Unexpected status for {path}"));
    resp.text().await.expect("Failed to read page")
}

// ============================================================================
// Authentication
// ============================================================================

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_panel_requires_login() {
    let client = client();
    let base_url = admin_url();

    for path in ["/", "/products", "/orders", "/customers", "/admin-users"] {
        let resp = client
            .get(format!("{base_url}{path}"))
            .send()
            .await
            .unwrap_or_else(|_| panic!("Failed to get {path}"));
        assert_eq!(resp.url().path(), "/auth/login", "{path} should be gated");
    }
}

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_login_rejects_unknown_credentials() {
    let client = client();
    let base_url = admin_url();

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
            ("email", "nobody@example.com"),
            ("password", "wrong-password"),
            ("csrf_token", token.as_str()),
        ])
        .send()
        .await
        .expect("Failed to post login form");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.url().path(), "/auth/login");

    let body = resp.text().await.expect("Failed to read response");
    assert!(body.contains("Invalid email or password"));
}

#[tokio::test]
#[ignore = "Requires running admin server and a seeded super admin"]
async fn test_dashboard_renders_after_login() {
    let client = client();
    let base_url = admin_url();
    sign_in(&client, &base_url).await;

    let body = get_page(&client, &base_url, "/").await;
    assert!(body.contains("Dashboard"));
    assert!(body.contains("Recent orders"));
}

// ============================================================================
// Product Management
// ============================================================================

#[tokio::test]
#[ignore = "Requires running admin and storefront servers and a seeded super admin"]
async fn test_product_create_edit_and_deactivate() {
    let client = client();
    let base_url = admin_url();
    sign_in(&client, &base_url).await;

    let slug = format!("it-test-flower-{}", Uuid::new_v4().simple());

    // Create.
    let page = get_page(&client, &base_url, "/products/new").await;
    let token = csrf_token(&page).expect("new product page should embed a CSRF token");

    let resp = client
        .post(format!("{base_url}/products/new"))
        .form(&[
            ("name", "Test Flower"),
            ("slug", slug.as_str()),
            ("description", "Created by an integration test."),
            ("price", "3.50"),
            ("inventory_quantity", "10"),
            ("track_inventory", "on"),
            ("active", "on"),
            ("csrf_token", token.as_str()),
        ])
        .send()
        .await
        .expect("Failed to create product");
    assert_eq!(resp.status(), StatusCode::OK);
    // Creation lands on the edit page for the new product.
    let edit_path = resp.url().path().to_string();
    assert!(edit_path.starts_with("/products/"));
    assert!(edit_path.ends_with("/edit"));

    let body = resp.text().await.expect("Failed to read edit page");
    assert!(body.contains("Test Flower"));
    assert!(body.contains(&slug));

    // The storefront sees the new product immediately.
    let storefront = storefront_url();
    let resp = client
        .get(format!("{storefront}/products/{slug}"))
        .send()
        .await
        .expect("Failed to get storefront product page");
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(
        resp.text()
            .await
            .expect("Failed to read storefront page")
            .contains("$3.50")
    );

    // Edit the price.
    let page = get_page(&client, &base_url, &edit_path).await;
    let token = csrf_token(&page).expect("edit page should embed a CSRF token");
    let resp = client
        .post(format!("{base_url}{edit_path}"))
        .form(&[
            ("name", "Test Flower"),
            ("slug", slug.as_str()),
            ("description", "Created by an integration test."),
            ("price", "4.25"),
            ("inventory_quantity", "10"),
            ("track_inventory", "on"),
            ("active", "on"),
            ("csrf_token", token.as_str()),
        ])
        .send()
        .await
        .expect("Failed to update product");
    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.expect("Failed to read edit page");
    assert!(body.contains("4.25"));

    // Deactivate. The slug stays in the panel listing; shoppers lose the
    // page once the storefront's sixty-second catalog cache turns over, so
    // that side is not asserted here.
    let product_id = path_id(&edit_path, "", "/products/").expect("edit path should carry the id");
    let resp = client
        .post(format!("{base_url}/products/{product_id}/delete"))
        .form(&[("csrf_token", token.as_str())])
        .send()
        .await
        .expect("Failed to deactivate product");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.url().path(), "/products");

    let body = get_page(&client, &base_url, "/products").await;
    assert!(body.contains(&slug));
}

#[tokio::test]
#[ignore = "Requires running admin server and a seeded super admin"]
async fn test_variant_add_and_delete() {
    let client = client();
    let base_url = admin_url();
    sign_in(&client, &base_url).await;

    // A dedicated product keeps this test independent of the others.
    let slug = format!("it-variant-host-{}", Uuid::new_v4().simple());
    let page = get_page(&client, &base_url, "/products/new").await;
    let token = csrf_token(&page).expect("new product page should embed a CSRF token");
    let resp = client
        .post(format!("{base_url}/products/new"))
        .form(&[
            ("name", "Variant Host"),
            ("slug", slug.as_str()),
            ("price", "9.00"),
            ("inventory_quantity", "5"),
            ("track_inventory", "on"),
            ("active", "on"),
            ("csrf_token", token.as_str()),
        ])
        .send()
        .await
        .expect("Failed to create product");
    let edit_path = resp.url().path().to_string();
    let product_id = path_id(&edit_path, "", "/products/").expect("edit path should carry the id");

    // Add a variant.
    let sku = format!("IT-VAR-{}", Uuid::new_v4().simple());
    let resp = client
        .post(format!("{base_url}/products/{product_id}/variants"))
        .form(&[
            ("name", "Large packet"),
            ("sku", sku.as_str()),
            ("price", "12.00"),
            ("inventory_quantity", "3"),
            ("position", "0"),
            ("csrf_token", token.as_str()),
        ])
        .send()
        .await
        .expect("Failed to add variant");
    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.expect("Failed to read edit page");
    assert!(body.contains("Large packet"));
    assert!(body.contains(&sku));

    // Delete it again.
    let variant_id = path_id(&body, "Large packet", "/variants/")
        .expect("variant row should carry the delete action");
    let resp = client
        .post(format!(
            "{base_url}/products/{product_id}/variants/{variant_id}/delete"
        ))
        .form(&[("csrf_token", token.as_str())])
        .send()
        .await
        .expect("Failed to delete variant");
    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.expect("Failed to read edit page");
    assert!(!body.contains("Large packet"));
}

// ============================================================================
// Orders & Customers
// ============================================================================

#[tokio::test]
#[ignore = "Requires running admin server and a seeded super admin"]
async fn test_orders_index_renders_with_status_tabs() {
    let client = client();
    let base_url = admin_url();
    sign_in(&client, &base_url).await;

    let body = get_page(&client, &base_url, "/orders").await;
    assert!(body.contains("Orders"));
    // One filter tab per status, plus the catch-all.
    assert!(body.contains("Pending"));
    assert!(body.contains("Shipped"));
    assert!(body.contains("Cancelled"));

    // Filtered views render too.
    let body = get_page(&client, &base_url, "/orders?status=shipped").await;
    assert!(body.contains("Orders"));
}

#[tokio::test]
#[ignore = "Requires running admin server and a seeded super admin"]
async fn test_unknown_order_returns_404() {
    let client = client();
    let base_url = admin_url();
    sign_in(&client, &base_url).await;

    let resp = client
        .get(format!("{base_url}/orders/999999"))
        .send()
        .await
        .expect("Failed to request unknown order");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running admin server and a seeded super admin"]
async fn test_customers_index_renders() {
    let client = client();
    let base_url = admin_url();
    sign_in(&client, &base_url).await;

    let body = get_page(&client, &base_url, "/customers").await;
    assert!(body.contains("Customers"));
    assert!(body.contains("Email"));
}

// ============================================================================
// Admin Users
// ============================================================================

#[tokio::test]
#[ignore = "Requires running admin server and a seeded super admin"]
async fn test_admin_user_create_change_role_and_delete() {
    let client = client();
    let base_url = admin_url();
    sign_in(&client, &base_url).await;

    let email = unique_email("panel-viewer");

    // Create a viewer.
    let page = get_page(&client, &base_url, "/admin-users").await;
    let token = csrf_token(&page).expect("admin users page should embed a CSRF token");

    let resp = client
        .post(format!("{base_url}/admin-users"))
        .form(&[
            ("email", email.as_str()),
            ("name", "Integration Viewer"),
            ("role", "viewer"),
            ("password", "viewerpass123"),
            ("password_confirmation", "viewerpass123"),
            ("csrf_token", token.as_str()),
        ])
        .send()
        .await
        .expect("Failed to create admin user");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.url().path(), "/admin-users");

    let body = resp.text().await.expect("Failed to read admin users page");
    assert!(body.contains(&email));

    // Promote them to admin.
    let account_id =
        path_id(&body, &email, "/admin-users/").expect("row should carry the account id");
    let resp = client
        .post(format!("{base_url}/admin-users/{account_id}/role"))
        .form(&[("role", "admin"), ("csrf_token", token.as_str())])
        .send()
        .await
        .expect("Failed to change role");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.url().path(), "/admin-users");

    // Delete the account again.
    let resp = client
        .post(format!("{base_url}/admin-users/{account_id}/delete"))
        .form(&[("csrf_token", token.as_str())])
        .send()
        .await
        .expect("Failed to delete admin user");
    assert_eq!(resp.status(), StatusCode::OK);

    let body = resp.text().await.expect("Failed to read admin users page");
    assert!(!body.contains(&email));
}

#[tokio::test]
#[ignore = "Requires running admin server and a seeded super admin"]
async fn test_viewer_cannot_manage_admin_users() {
    let client = client();
    let base_url = admin_url();
    sign_in(&client, &base_url).await;

    // Provision a throwaway viewer with the super admin session.
    let email = unique_email("locked-viewer");
    let page = get_page(&client, &base_url, "/admin-users").await;
    let token = csrf_token(&page).expect("admin users page should embed a CSRF token");
    let resp = client
        .post(format!("{base_url}/admin-users"))
        .form(&[
            ("email", email.as_str()),
            ("name", "Locked Viewer"),
            ("role", "viewer"),
            ("password", "viewerpass123"),
            ("password_confirmation", "viewerpass123"),
            ("csrf_token", token.as_str()),
        ])
        .send()
        .await
        .expect("Failed to create viewer");
    assert_eq!(resp.url().path(), "/admin-users");

    // A fresh session logged in as the viewer.
    let viewer = wildbloom_integration_tests::client();
    let resp = viewer
        .get(format!("{base_url}/auth/login"))
        .send()
        .await
        .expect("Failed to get login page");
    let page = resp.text().await.expect("Failed to read login page");
    let viewer_token = csrf_token(&page).expect("login page should embed a CSRF token");
    let resp = viewer
        .post(format!("{base_url}/auth/login"))
        .form(&[
            ("email", email.as_str()),
            ("password", "viewerpass123"),
            ("csrf_token", viewer_token.as_str()),
        ])
        .send()
        .await
        .expect("Failed to log in as viewer");
    assert_eq!(resp.url().path(), "/");

    // Viewers can read the panel but not reach user management.
    let resp = viewer
        .get(format!("{base_url}/admin-users"))
        .send()
        .await
        .expect("Failed to get admin users page");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}
