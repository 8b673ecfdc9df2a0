//! Data every page's header and notification area needs.

use tower_sessions::Session;

use crate::cart::Cart;
use crate::flash::{self, Flash};
use crate::models::{CurrentUser, session_keys};

/// Signed-in customer as shown in the header.
#[derive(Debug, Clone)]
pub struct UserBadge {
    pub name: String,
    pub is_admin: bool,
}

impl From<&CurrentUser> for UserBadge {
    fn from(user: &CurrentUser) -> Self {
        Self {
            name: user.first_name().to_string(),
            is_admin: user.is_admin(),
        }
    }
}

/// Shared header state plus the notifications queued for this page.
#[derive(Debug, Clone, Default)]
pub struct Layout {
    pub user: Option<UserBadge>,
    pub cart_count: u32,
    pub flashes: Vec<Flash>,
    pub current_path: String,
}

impl Layout {
    /// Read the header state and drain pending notifications.
    pub async fn load(session: &Session, user: Option<&CurrentUser>, current_path: &str) -> Self {
        Self {
            user: user.map(UserBadge::from),
            cart_count: load_cart(session).await.item_count(),
            flashes: flash::drain(session).await,
            current_path: current_path.to_string(),
        }
    }

    /// Whether a nav link points at the current page.
    #[must_use]
    pub fn is_active(&self, path: &str) -> bool {
        self.current_path == path
    }
}

/// The visitor's cart; an unreadable cart is treated as empty.
pub async fn load_cart(session: &Session) -> Cart {
    match session.get::<Cart>(session_keys::CART).await {
        Ok(cart) => cart.unwrap_or_default(),
        Err(e) => {
            tracing::warn!("Failed to read cart from session: {e}");
            Cart::default()
        }
    }
}

/// Persist the cart.
///
/// # Errors
///
/// Returns an error if the session cannot be written.
pub async fn save_cart(session: &Session, cart: &Cart) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CART, cart).await
}
