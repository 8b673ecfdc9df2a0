//! Browser-level flows through the storefront HTTP server.
//!
//! Each test runs its own storefront and mock backend. The client keeps
//! cookies and does not follow redirects, so every step can be asserted.

use applegym_integration_tests::backend::{
    ADMIN_EMAIL, CLIENT_EMAIL, CONTESTED_PRODUCT_ID, RECEIPT_PDF, REPORT_PDF,
};
use applegym_integration_tests::storefront::location;
use applegym_integration_tests::{Behavior, MockBackend, TestStorefront};
use reqwest::StatusCode;
use reqwest::header::CONTENT_DISPOSITION;
use serde_json::json;

async fn setup(behavior: Behavior) -> (MockBackend, TestStorefront) {
    let backend = MockBackend::with_behavior(behavior).await;
    let storefront = TestStorefront::start(&backend).await;
    (backend, storefront)
}

/// Sign in as the regular customer and fill the cart with two dumbbells
/// and a spinning class.
async fn customer_with_cart(storefront: &TestStorefront) {
    let response = storefront.login(CLIENT_EMAIL).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response).as_deref(), Some("/catalog"));

    for (kind, id) in [("productos", "1"), ("productos", "1"), ("servicios", "1")] {
        let response = storefront.add_to_cart(kind, id).await;
        assert_eq!(location(&response).as_deref(), Some("/cart"));
    }
}

// ============================================================================
// Browsing
// ============================================================================

#[tokio::test]
async fn test_catalog_pages_render_backend_items() {
    let (_backend, storefront) = setup(Behavior::default()).await;

    let home = storefront.get("/").await;
    assert_eq!(home.status(), StatusCode::OK);
    let body = home.text().await.expect("home body");
    assert!(body.contains("Mancuernas 10kg"));
    // Sold out items are never featured
    assert!(!body.contains("Cinturón de levantamiento"));

    let services = storefront.get("/catalog?tipo=servicios").await;
    assert_eq!(services.status(), StatusCode::OK);
    let body = services.text().await.expect("catalog body");
    assert!(body.contains("Clase de Spinning"));
    assert!(body.contains("Entrenamiento personal"));
    assert!(!body.contains("Mancuernas 10kg"));

    let detail = storefront.get("/catalog/productos/2").await;
    assert_eq!(detail.status(), StatusCode::OK);
    assert!(detail.text().await.expect("detail body").contains("Proteína Whey"));
}

#[tokio::test]
async fn test_liveness_needs_no_database() {
    let (_backend, storefront) = setup(Behavior::default()).await;

    let response = storefront.get("/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.expect("health body"), "ok");
}

#[tokio::test]
async fn test_security_headers_are_set() {
    let (_backend, storefront) = setup(Behavior::default()).await;

    let response = storefront.get("/cart").await;
    let headers = response.headers();
    assert!(headers.contains_key("content-security-policy"));
    assert_eq!(
        headers
            .get("x-content-type-options")
            .and_then(|v| v.to_str().ok()),
        Some("nosniff")
    );
    assert!(headers.contains_key("x-request-id"));
}

// ============================================================================
// Auth
// ============================================================================

#[tokio::test]
async fn test_login_greets_customer_by_full_name() {
    let (_backend, storefront) = setup(Behavior::default()).await;
    storefront.login(CLIENT_EMAIL).await;

    let catalog = storefront.get("/catalog").await;
    let body = catalog.text().await.expect("catalog body");
    assert!(body.contains("Welcome Ana Torres!"));
}

#[tokio::test]
async fn test_expired_session_is_signed_out_on_any_page() {
    let (_backend, storefront) = setup(Behavior {
        expired_logins: true,
        ..Behavior::default()
    })
    .await;
    let response = storefront.login(CLIENT_EMAIL).await;
    assert_eq!(location(&response).as_deref(), Some("/catalog"));

    let home = storefront.get("/").await;
    assert_eq!(home.status(), StatusCode::OK);
    let body = home.text().await.expect("home body");
    assert!(body.contains("Your session has expired. Please log in again."));

    // Signed out for good: the next page has no notice and checkout needs a login
    let body = storefront.get("/").await.text().await.expect("home body");
    assert!(!body.contains("Your session has expired"));
    let response = storefront.get("/checkout").await;
    assert_eq!(location(&response).as_deref(), Some("/auth/login"));
}

#[tokio::test]
async fn test_wrong_password_rerenders_login_form() {
    let (_backend, storefront) = setup(Behavior::default()).await;

    let response = storefront
        .post_form(
            "/auth/login",
            &[("email", CLIENT_EMAIL), ("password", "incorrecta")],
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.expect("login body");
    assert!(body.contains("Invalid email or password"));
    assert!(body.contains(CLIENT_EMAIL));
}

#[tokio::test]
async fn test_checkout_requires_sign_in() {
    let (_backend, storefront) = setup(Behavior::default()).await;

    let response = storefront.get("/checkout").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response).as_deref(), Some("/auth/login"));
}

#[tokio::test]
async fn test_registration_redirects_to_login() {
    let (backend, storefront) = setup(Behavior::default()).await;

    let response = storefront
        .post_form(
            "/auth/register",
            &[
                ("name", "Luis Pérez"),
                ("email", "luis@applegym.test"),
                ("phone", "0987654321"),
                ("address", "Calle 10"),
                ("password", "clave123"),
                ("password_confirm", "clave123"),
            ],
        )
        .await;

    assert_eq!(location(&response).as_deref(), Some("/auth/login"));
    assert_eq!(backend.recorded().await.registrations.len(), 1);

    let login = storefront.get("/auth/login").await;
    let body = login.text().await.expect("login body");
    assert!(body.contains("Registration successful"));
}

// ============================================================================
// Purchase
// ============================================================================

#[tokio::test]
async fn test_full_purchase_and_receipt_download() {
    let (backend, storefront) = setup(Behavior::default()).await;
    customer_with_cart(&storefront).await;

    let cart = storefront.get("/cart").await.text().await.expect("cart body");
    assert!(cart.contains("Mancuernas 10kg"));
    assert!(cart.contains("Clase de Spinning"));

    assert_eq!(storefront.get("/checkout").await.status(), StatusCode::OK);

    let response = storefront
        .post_form("/checkout", &[("method", "EFECTIVO")])
        .await;
    assert_eq!(
        location(&response).as_deref(),
        Some("/checkout/confirmation")
    );

    let recorded = backend.recorded().await;
    assert_eq!(
        recorded.cart_lines,
        vec![
            json!({"productoId": 1, "tipo": "producto", "cantidad": 2}),
            json!({"productoId": 1, "tipo": "servicio", "cantidad": 1}),
        ]
    );
    assert_eq!(recorded.sales, vec![json!({"metodoPago": "EFECTIVO"})]);

    let confirmation = storefront
        .get("/checkout/confirmation")
        .await
        .text()
        .await
        .expect("confirmation body");
    assert!(confirmation.contains("#42"));
    assert!(confirmation.contains("/receipts/42"));
    assert!(confirmation.contains("$204.80"));

    let receipt = storefront.get("/receipts/42").await;
    assert_eq!(receipt.status(), StatusCode::OK);
    assert_eq!(
        receipt
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok()),
        Some("attachment; filename=\"comprobante_42.pdf\"")
    );
    assert_eq!(receipt.bytes().await.expect("receipt bytes"), RECEIPT_PDF);

    // The cart was cleared
    let response = storefront.get("/checkout").await;
    assert_eq!(location(&response).as_deref(), Some("/cart"));
}

#[tokio::test]
async fn test_invalid_card_never_reaches_backend() {
    let (backend, storefront) = setup(Behavior::default()).await;
    customer_with_cart(&storefront).await;

    let response = storefront
        .post_form(
            "/checkout",
            &[
                ("method", "TARJETA_CREDITO"),
                ("card_holder", "Ana Torres"),
                ("card_number", "1234"),
                ("card_expiry", "12/30"),
                ("card_cvv", "123"),
            ],
        )
        .await;

    // The form comes back with the error and the typed card fields
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.expect("checkout body");
    assert!(body.contains("Please enter a valid card number"));
    assert!(body.contains("value=\"Ana Torres\""));
    assert!(body.contains("value=\"12/30\""));
    assert!(!body.contains("value=\"123\""));

    let recorded = backend.recorded().await;
    assert!(recorded.cart_lines.is_empty());
    assert!(recorded.sales.is_empty());
}

#[tokio::test]
async fn test_stock_conflict_skips_line_and_warns() {
    let (backend, storefront) = setup(Behavior::default()).await;
    customer_with_cart(&storefront).await;
    storefront
        .add_to_cart("productos", &CONTESTED_PRODUCT_ID.to_string())
        .await;

    let response = storefront
        .post_form("/checkout", &[("method", "EFECTIVO")])
        .await;
    assert_eq!(
        location(&response).as_deref(),
        Some("/checkout/confirmation")
    );
    let recorded = backend.recorded().await;
    assert_eq!(recorded.cart_lines.len(), 2);
    assert_eq!(recorded.sales.len(), 1);

    let confirmation = storefront
        .get("/checkout/confirmation")
        .await
        .text()
        .await
        .expect("confirmation body");
    assert!(confirmation.contains("Banda elástica was not added to your order: Stock insuficiente"));
    assert!(confirmation.contains("#42"));
}

#[tokio::test]
async fn test_checkout_without_method_asks_for_one() {
    let (backend, storefront) = setup(Behavior::default()).await;
    customer_with_cart(&storefront).await;

    let response = storefront
        .post_form("/checkout", &[("card_holder", "Ana Torres")])
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.expect("checkout body");
    assert!(body.contains("Please select a payment method"));
    assert!(body.contains("value=\"Ana Torres\""));
    assert!(backend.recorded().await.sales.is_empty());
}

#[tokio::test]
async fn test_rejected_token_signs_customer_out() {
    let (_backend, storefront) = setup(Behavior {
        reject_tokens: true,
        ..Behavior::default()
    })
    .await;
    customer_with_cart(&storefront).await;

    let response = storefront
        .post_form("/checkout", &[("method", "EFECTIVO")])
        .await;
    assert_eq!(location(&response).as_deref(), Some("/auth/login"));

    let response = storefront.get("/checkout").await;
    assert_eq!(location(&response).as_deref(), Some("/auth/login"));
}

// ============================================================================
// Admin
// ============================================================================

#[tokio::test]
async fn test_dashboard_is_admin_only() {
    let (_backend, storefront) = setup(Behavior::default()).await;
    storefront.login(CLIENT_EMAIL).await;

    let response = storefront.get("/admin").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_dashboard_and_export() {
    let (_backend, storefront) = setup(Behavior::default()).await;

    let response = storefront.login(ADMIN_EMAIL).await;
    assert_eq!(location(&response).as_deref(), Some("/admin"));

    let dashboard = storefront
        .get("/admin?from=2026-06-01&to=2026-06-30")
        .await;
    assert_eq!(dashboard.status(), StatusCode::OK);
    let body = dashboard.text().await.expect("dashboard body");
    assert!(body.contains("Proteína Whey"));
    assert!(body.contains("Clase de Spinning"));
    assert!(body.contains("$1520.50"));
    assert!(body.contains("/admin/reports/export/pdf?from=2026-06-01"));
    assert!(body.contains("to=2026-06-30"));
    assert!(body.contains("<svg"));

    let export = storefront
        .get("/admin/reports/export/pdf?from=2026-06-01&to=2026-06-30")
        .await;
    assert_eq!(export.status(), StatusCode::OK);
    assert_eq!(
        export
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok()),
        Some("attachment; filename=\"Reporte_AppleGym_2026-06-01_2026-06-30.pdf\"")
    );
    assert_eq!(export.bytes().await.expect("export bytes"), REPORT_PDF);

    let unknown = storefront.get("/admin/reports/export/csv").await;
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);
}
