//! Authentication extractors.
//!
//! The signed-in customer lives in the session as a [`CurrentUser`]. Every
//! page that needs one also checks the token's `exp` claim, so an expired
//! session is cleared before any backend call is made with it.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use tower_sessions::Session;

use crate::cart::Cart;
use crate::flash;
use crate::models::{CurrentUser, LastSale, session_keys};

/// Login page every rejection redirects to.
pub const LOGIN_PATH: &str = "/auth/login";

/// Extractor that requires a signed-in customer with an unexpired token.
///
/// # Example
///
/// ```rust,ignore
/// async fn checkout_page(RequireUser(user): RequireUser) -> impl IntoResponse {
///     format!("Paying as {}", user.name)
/// }
/// ```
pub struct RequireUser(pub CurrentUser);

/// Extractor that requires a signed-in administrator.
pub struct RequireAdmin(pub CurrentUser);

/// Why an authenticated extractor refused the request.
#[derive(Debug)]
pub enum AuthRejection {
    /// Not signed in, or the session expired.
    RedirectToLogin,
    /// Signed in without the admin role.
    Forbidden,
    /// The session layer is missing.
    NoSession,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to(LOGIN_PATH).into_response(),
            Self::Forbidden => (
                StatusCode::FORBIDDEN,
                "You do not have permission to view this page",
            )
                .into_response(),
            Self::NoSession => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
}

/// Load the session user, signing them out if their token has expired.
async fn authenticated_user(parts: &Parts) -> Result<CurrentUser, AuthRejection> {
    let session = parts
        .extensions
        .get::<Session>()
        .ok_or(AuthRejection::NoSession)?;

    let Some(user) = current_user(session).await else {
        flash::warning(session, "You must sign in to continue").await;
        return Err(AuthRejection::RedirectToLogin);
    };

    if sign_out_if_expired(session, &user).await {
        return Err(AuthRejection::RedirectToLogin);
    }

    Ok(user)
}

/// Sign `user` out and say so if their token has expired.
async fn sign_out_if_expired(session: &Session, user: &CurrentUser) -> bool {
    if !user.token.is_expired_at(Utc::now()) {
        return false;
    }
    tracing::info!(customer_id = %user.id, "Session token expired");
    sign_out(session).await;
    flash::warning(session, "Your session has expired. Please log in again.").await;
    true
}

impl<S> FromRequestParts<S> for RequireUser
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        authenticated_user(parts).await.map(Self)
    }
}

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = authenticated_user(parts).await?;
        if !user.is_admin() {
            tracing::warn!(customer_id = %user.id, "Non-admin tried to open the dashboard");
            return Err(AuthRejection::Forbidden);
        }
        Ok(Self(user))
    }
}

/// Extractor that optionally gets the current customer. Never rejects; a
/// customer whose token has expired is signed out and treated as a guest.
pub struct OptionalUser(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(session) = parts.extensions.get::<Session>() else {
            return Ok(Self(None));
        };
        let user = match current_user(session).await {
            Some(user) if !sign_out_if_expired(session, &user).await => Some(user),
            _ => None,
        };
        Ok(Self(user))
    }
}

async fn current_user(session: &Session) -> Option<CurrentUser> {
    session
        .get::<CurrentUser>(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten()
}

/// Store the signed-in customer, rotating the session id.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Forget the customer along with their cart and last sale. Failures are logged.
pub async fn sign_out(session: &Session) {
    if let Err(e) = session
        .remove::<CurrentUser>(session_keys::CURRENT_USER)
        .await
    {
        tracing::error!("Failed to remove user from session: {e}");
    }
    if let Err(e) = session.remove::<Cart>(session_keys::CART).await {
        tracing::warn!("Failed to clear cart on sign out: {e}");
    }
    if let Err(e) = session.remove::<LastSale>(session_keys::LAST_SALE).await {
        tracing::warn!("Failed to clear last sale on sign out: {e}");
    }
}
