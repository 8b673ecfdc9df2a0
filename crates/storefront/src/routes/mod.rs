//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                              - Home page
//! GET  /health                        - Liveness
//! GET  /health/ready                  - Readiness (session database)
//! GET  /static/*                      - Stylesheet and scripts
//!
//! # Catalog
//! GET  /catalog                       - Products and services (?tipo=&categoria=&q=)
//! GET  /products                      - Products only
//! GET  /services                      - Services only
//! GET  /catalog/{kind}/{id}           - Item detail
//!
//! # Cart (session)
//! GET  /cart                          - Cart page
//! POST /cart/add                      - Add one unit
//! POST /cart/update                   - Change quantity by a delta
//! POST /cart/remove                   - Remove a line
//!
//! # Checkout (requires login)
//! GET  /checkout                      - Payment form
//! POST /checkout                      - Sync cart, process sale
//! GET  /checkout/confirmation         - Last sale
//! GET  /receipts/{sale_id}            - PDF receipt download
//!
//! # Auth
//! GET  /auth/login                    - Login page
//! POST /auth/login                    - Login action (rate limited)
//! GET  /auth/register                 - Register page
//! POST /auth/register                 - Register action (rate limited)
//! POST /auth/logout                   - Logout action
//!
//! # Admin (requires ADMIN role)
//! GET  /admin                         - Reports dashboard (?from=&to=)
//! GET  /admin/reports/export/{format} - Excel / PDF export (?from=&to=)
//! ```

pub mod admin;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod health;
pub mod home;
mod layout;

use axum::{
    Router,
    middleware::from_fn,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use tower_http::services::ServeDir;
use tower_sessions::{Session, SessionManagerLayer, SessionStore};

use crate::error::clear_sentry_user;
use crate::flash;
use crate::middleware::{
    auth::LOGIN_PATH, auth_rate_limiter, request_id_middleware, security_headers_middleware,
    sign_out,
};
use crate::state::AppState;

/// Static assets, relative to the workspace root the server is started from.
const STATIC_DIR: &str = "crates/storefront/static";

pub use layout::{Layout, UserBadge, load_cart, save_cart};

/// Create the auth routes router. Only the form submissions are rate limited.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/login",
            get(auth::login_page).merge(post(auth::login).layer(auth_rate_limiter())),
        )
        .route(
            "/register",
            get(auth::register_page).merge(post(auth::register).layer(auth_rate_limiter())),
        )
        .route("/logout", post(auth::logout))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(checkout::show).post(checkout::submit))
        .route("/confirmation", get(checkout::confirmation))
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(admin::dashboard))
        .route("/reports/export/{format}", get(admin::export))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::live))
        .route("/health/ready", get(health::ready))
        .route("/", get(home::home))
        .route("/catalog", get(catalog::index))
        .route("/catalog/{kind}/{id}", get(catalog::show))
        .route("/products", get(catalog::products))
        .route("/services", get(catalog::services))
        .nest("/cart", cart_routes())
        .nest("/checkout", checkout_routes())
        .route("/receipts/{sale_id}", get(checkout::receipt))
        .nest("/auth", auth_routes())
        .nest("/admin", admin_routes())
}

/// The complete application minus tracing and Sentry, which the binary adds
/// around it.
///
/// Layers, outermost first: security headers, request id, session.
pub fn app<S>(state: AppState, sessions: SessionManagerLayer<S>) -> Router
where
    S: SessionStore + Clone,
{
    routes()
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .layer(sessions)
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .with_state(state)
}

/// Sign the visitor out after the backend rejected their token.
pub(crate) async fn session_expired(session: &Session) -> Response {
    sign_out(session).await;
    clear_sentry_user();
    flash::warning(session, "Your session has expired. Please log in again.").await;
    Redirect::to(LOGIN_PATH).into_response()
}

/// Accept only local redirect targets (`/path`, never `//host`).
pub(crate) fn safe_redirect(target: Option<&str>, fallback: &'static str) -> String {
    target
        .filter(|t| t.starts_with('/') && !t.starts_with("//") && !t.contains('\\'))
        .unwrap_or(fallback)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_redirect() {
        assert_eq!(safe_redirect(Some("/products?q=yoga"), "/cart"), "/products?q=yoga");
        assert_eq!(safe_redirect(Some("//evil.example"), "/cart"), "/cart");
        assert_eq!(safe_redirect(Some("https://evil.example"), "/cart"), "/cart");
        assert_eq!(safe_redirect(Some("/\\evil.example"), "/cart"), "/cart");
        assert_eq!(safe_redirect(None, "/cart"), "/cart");
    }
}
