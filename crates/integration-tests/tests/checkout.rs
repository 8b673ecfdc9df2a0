//! The cart-to-sale flow against the mock backend.

use applegym_core::{Email, ItemId, ItemKind, PaymentMethod, SaleId};
use applegym_integration_tests::backend::{
    CLIENT_EMAIL, CONTESTED_PRODUCT_ID, PASSWORD, SALE_ID, expired_token,
};
use applegym_integration_tests::{Behavior, MockBackend};
use applegym_storefront::api::ApiClient;
use applegym_storefront::cart::Cart;
use applegym_storefront::checkout::{Checkout, CheckoutError, SkippedLine};
use applegym_storefront::token::BearerToken;
use chrono::Utc;
use serde_json::json;

struct Fixture {
    backend: MockBackend,
    api: ApiClient,
    token: BearerToken,
}

async fn fixture(behavior: Behavior) -> Fixture {
    let backend = MockBackend::with_behavior(behavior).await;
    let api = ApiClient::new(&backend.config()).expect("Failed to build API client");
    let token = if behavior.reject_tokens {
        BearerToken::new(applegym_integration_tests::backend::fresh_token("CLIENTE"))
    } else {
        api.login(&Email::parse(CLIENT_EMAIL).expect("email"), PASSWORD)
            .await
            .expect("login failed")
            .access_token
    };
    Fixture {
        backend,
        api,
        token,
    }
}

/// Two dumbbells and a spinning class, straight from the catalog.
async fn filled_cart(api: &ApiClient, extra: &[(ItemKind, i64)]) -> Cart {
    let catalog = api.catalog().await.expect("catalog");
    let mut cart = Cart::default();
    for (kind, id) in [(ItemKind::Product, 1), (ItemKind::Product, 1), (ItemKind::Service, 1)]
        .iter()
        .chain(extra)
    {
        cart.add_from(&catalog.items, *kind, ItemId::new(*id))
            .expect("item can be added");
    }
    cart
}

#[tokio::test]
async fn test_checkout_syncs_every_line_then_processes_sale() {
    let f = fixture(Behavior::default()).await;
    let cart = filled_cart(&f.api, &[]).await;

    let completed = Checkout::new(&f.api, &f.token)
        .run(&cart, PaymentMethod::Transfer, Utc::now())
        .await
        .expect("checkout");

    assert_eq!(completed.message, "Venta procesada exitosamente");
    assert_eq!(
        completed.sale.map(|s| s.id_venta),
        Some(SaleId::new(SALE_ID))
    );

    let recorded = f.backend.recorded().await;
    assert_eq!(
        recorded.cart_lines,
        vec![
            json!({"productoId": 1, "tipo": "producto", "cantidad": 2}),
            json!({"productoId": 1, "tipo": "servicio", "cantidad": 1}),
        ]
    );
    assert_eq!(recorded.sales, vec![json!({"metodoPago": "TRANSFERENCIA"})]);
}

#[tokio::test]
async fn test_empty_cart_makes_no_requests() {
    let f = fixture(Behavior::default()).await;

    let err = Checkout::new(&f.api, &f.token)
        .run(&Cart::default(), PaymentMethod::Cash, Utc::now())
        .await
        .expect_err("empty cart");

    assert_eq!(err, CheckoutError::EmptyCart);
    let recorded = f.backend.recorded().await;
    assert!(recorded.cart_lines.is_empty());
    assert!(recorded.sales.is_empty());
}

#[tokio::test]
async fn test_refused_line_is_skipped_and_sale_goes_ahead() {
    let f = fixture(Behavior::default()).await;
    let cart = filled_cart(
        &f.api,
        &[(ItemKind::Product, CONTESTED_PRODUCT_ID), (ItemKind::Product, 2)],
    )
    .await;

    let completed = Checkout::new(&f.api, &f.token)
        .run(&cart, PaymentMethod::Cash, Utc::now())
        .await
        .expect("checkout");

    assert_eq!(
        completed.skipped,
        vec![SkippedLine {
            item: "Banda elástica".to_string(),
            message: "Stock insuficiente".to_string(),
        }]
    );
    let recorded = f.backend.recorded().await;
    // The line after the refused one was still sent
    assert_eq!(
        recorded.cart_lines,
        vec![
            json!({"productoId": 1, "tipo": "producto", "cantidad": 2}),
            json!({"productoId": 1, "tipo": "servicio", "cantidad": 1}),
            json!({"productoId": 2, "tipo": "producto", "cantidad": 1}),
        ]
    );
    assert_eq!(recorded.sales, vec![json!({"metodoPago": "EFECTIVO"})]);
}

#[tokio::test]
async fn test_locally_expired_token_makes_no_requests() {
    let f = fixture(Behavior::default()).await;
    let cart = filled_cart(&f.api, &[]).await;
    let expired = BearerToken::new(expired_token("CLIENTE"));

    let err = Checkout::new(&f.api, &expired)
        .run(&cart, PaymentMethod::Cash, Utc::now())
        .await
        .expect_err("expired");

    assert_eq!(err, CheckoutError::SessionExpired);
    assert!(f.backend.recorded().await.cart_lines.is_empty());
}

#[tokio::test]
async fn test_backend_rejecting_token_is_session_expired() {
    let f = fixture(Behavior {
        reject_tokens: true,
        ..Behavior::default()
    })
    .await;
    let cart = filled_cart(&f.api, &[]).await;

    let err = Checkout::new(&f.api, &f.token)
        .run(&cart, PaymentMethod::Cash, Utc::now())
        .await
        .expect_err("rejected token");

    assert_eq!(err, CheckoutError::SessionExpired);
}

#[tokio::test]
async fn test_refused_sale_carries_backend_message() {
    let f = fixture(Behavior {
        refuse_sales: true,
        ..Behavior::default()
    })
    .await;
    let cart = filled_cart(&f.api, &[]).await;

    let err = Checkout::new(&f.api, &f.token)
        .run(&cart, PaymentMethod::Cash, Utc::now())
        .await
        .expect_err("refused sale");

    assert_eq!(err, CheckoutError::Sale("El carrito está vacío".to_string()));
    assert_eq!(f.backend.recorded().await.cart_lines.len(), 2);
}
