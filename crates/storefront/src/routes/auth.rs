//! Authentication route handlers.
//!
//! Handles login, registration, and logout against the AppleGym backend's
//! JWT authentication. The token is kept server-side in the session.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use applegym_core::Email;

use crate::api::ApiError;
use crate::api::types::RegisterRequest;
use crate::error::{Result, add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::flash;
use crate::middleware::{OptionalUser, set_current_user, sign_out};
use crate::models::CurrentUser;
use crate::routes::Layout;
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Registration form data.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub password: String,
    pub password_confirm: String,
}

impl RegisterForm {
    /// Check the fields the backend would reject anyway.
    fn validate(&self) -> std::result::Result<Email, &'static str> {
        if self.name.trim().is_empty() {
            return Err("Please enter your name");
        }
        let email = Email::parse(&self.email).map_err(|_| "Please enter a valid email address")?;
        if self.password.is_empty() {
            return Err("Please enter a password");
        }
        if self.password != self.password_confirm {
            return Err("Passwords do not match");
        }
        Ok(email)
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub layout: Layout,
    pub email: String,
    pub error: Option<String>,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub layout: Layout,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub error: Option<String>,
}

impl RegisterTemplate {
    async fn render(session: &Session, form: &RegisterForm, error: Option<String>) -> Self {
        Self {
            layout: Layout::load(session, None, "/auth/register").await,
            name: form.name.clone(),
            email: form.email.clone(),
            phone: form.phone.clone(),
            address: form.address.clone(),
            error,
        }
    }
}

/// Re-render the login form with an error, keeping the email.
async fn login_error(session: &Session, email: String, error: impl Into<String>) -> Response {
    LoginTemplate {
        layout: Layout::load(session, None, "/auth/login").await,
        email,
        error: Some(error.into()),
    }
    .into_response()
}

/// Where a freshly signed-in user lands.
const fn home_for(user: &CurrentUser) -> &'static str {
    if user.is_admin() { "/admin" } else { "/catalog" }
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
pub async fn login_page(session: Session, OptionalUser(user): OptionalUser) -> Response {
    if let Some(user) = user {
        return Redirect::to(home_for(&user)).into_response();
    }

    LoginTemplate {
        layout: Layout::load(&session, None, "/auth/login").await,
        email: String::new(),
        error: None,
    }
    .into_response()
}

/// Handle login form submission.
#[instrument(skip(state, session, form))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let Ok(email) = Email::parse(&form.email) else {
        return Ok(login_error(&session, form.email, "Please enter a valid email address").await);
    };
    if form.password.is_empty() {
        return Ok(login_error(&session, form.email, "Please enter your password").await);
    }

    let response = match state.api().login(&email, &form.password).await {
        Ok(response) => response,
        Err(ApiError::InvalidCredentials) => {
            tracing::info!("Login rejected");
            return Ok(login_error(&session, form.email, "Invalid email or password").await);
        }
        Err(e) => {
            tracing::warn!("Login failed: {e}");
            return Ok(login_error(&session, form.email, e.user_message()).await);
        }
    };

    let user = CurrentUser::from_login(response, email);
    set_current_user(&session, &user).await?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    add_breadcrumb("auth", "Signed in", Some(&[("role", user.role.as_str())]));
    tracing::info!(customer_id = %user.id, "Customer signed in");

    flash::success(&session, format!("Welcome {}!", user.name)).await;
    Ok(Redirect::to(home_for(&user)).into_response())
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
pub async fn register_page(session: Session, OptionalUser(user): OptionalUser) -> Response {
    if let Some(user) = user {
        return Redirect::to(home_for(&user)).into_response();
    }

    RegisterTemplate::render(&session, &RegisterForm::default(), None)
        .await
        .into_response()
}

/// Handle registration form submission.
///
/// The customer is not signed in afterwards; they log in with the new
/// credentials.
#[instrument(skip(state, session, form))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Response {
    let email = match form.validate() {
        Ok(email) => email,
        Err(message) => {
            return RegisterTemplate::render(&session, &form, Some(message.to_string()))
                .await
                .into_response();
        }
    };

    let request = RegisterRequest {
        nombre_cliente: form.name.trim(),
        email: email.as_str(),
        telefono: form.phone.trim(),
        direccion: form.address.trim(),
        password: &form.password,
        confirm_password: &form.password_confirm,
    };

    match state.api().register(&request).await {
        Ok(_) => {
            tracing::info!("Customer registered");
            flash::success(&session, "Registration successful! You can now log in.").await;
            Redirect::to("/auth/login").into_response()
        }
        Err(e) => {
            tracing::warn!("Registration failed: {e}");
            RegisterTemplate::render(&session, &form, Some(e.user_message()))
                .await
                .into_response()
        }
    }
}

// =============================================================================
// Logout
// =============================================================================

/// Sign out, dropping the cart along with the user.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Redirect {
    sign_out(&session).await;
    clear_sentry_user();
    flash::info(&session, "Signed out").await;
    Redirect::to("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(password_confirm: &str) -> RegisterForm {
        RegisterForm {
            name: "Ana Torres".to_string(),
            email: "ana@applegym.test".to_string(),
            phone: "0991234567".to_string(),
            address: "Av. Amazonas".to_string(),
            password: "secreta1".to_string(),
            password_confirm: password_confirm.to_string(),
        }
    }

    #[test]
    fn test_register_validation() {
        assert!(form("secreta1").validate().is_ok());
        assert_eq!(form("otra").validate(), Err("Passwords do not match"));

        let mut missing_name = form("secreta1");
        missing_name.name = "  ".to_string();
        assert_eq!(missing_name.validate(), Err("Please enter your name"));

        let mut bad_email = form("secreta1");
        bad_email.email = "ana@".to_string();
        assert_eq!(
            bad_email.validate(),
            Err("Please enter a valid email address")
        );
    }
}
