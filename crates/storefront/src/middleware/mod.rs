//! HTTP middleware stack for the storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, transaction per route)
//! 2. `TraceLayer` (request spans with an empty `request_id` field)
//! 3. Security headers
//! 4. Request ID (fills the span field)
//! 5. Session layer (tower-sessions with `PostgreSQL` store)
//!
//! Rate limiting is applied per route, to the credential forms only.

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{OptionalUser, RequireAdmin, RequireUser, set_current_user, sign_out};
pub use rate_limit::auth_rate_limiter;
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
