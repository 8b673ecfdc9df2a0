//! Cart route handlers.
//!
//! The cart lives in the session. Each action redirects back to the page it
//! came from with a notification describing the outcome.

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

use applegym_core::{ItemId, ItemKind};

use crate::cart::{CartError, CartItem};
use crate::catalog;
use crate::error::{Result, add_breadcrumb};
use crate::filters;
use crate::flash;
use crate::middleware::OptionalUser;
use crate::routes::{Layout, load_cart, safe_redirect, save_cart};
use crate::state::AppState;

/// Cart line display data for templates.
#[derive(Debug, Clone)]
pub struct CartLineView {
    pub id: i64,
    pub kind: &'static str,
    pub kind_label: &'static str,
    pub name: String,
    pub icon: String,
    pub price: String,
    pub quantity: u32,
    pub line_total: String,
}

impl From<&CartItem> for CartLineView {
    fn from(line: &CartItem) -> Self {
        Self {
            id: line.id.as_i64(),
            kind: line.kind.catalog_tag(),
            kind_label: line.kind.label(),
            name: line.name.clone(),
            icon: line.icon.clone(),
            price: line.price.display(),
            quantity: line.quantity,
            line_total: line.line_total().display(),
        }
    }
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartTemplate {
    pub layout: Layout,
    pub lines: Vec<CartLineView>,
    pub total: String,
    pub item_count: u32,
    pub signed_in: bool,
}

/// Identifies a catalog item in cart forms.
#[derive(Debug, Deserialize)]
pub struct ItemForm {
    pub kind: String,
    pub id: i64,
    /// Page to return to.
    pub redirect: Option<String>,
}

impl ItemForm {
    fn key(&self) -> Option<(ItemKind, ItemId)> {
        ItemKind::from_tag(&self.kind).map(|kind| (kind, ItemId::new(self.id)))
    }

    fn back(&self) -> String {
        safe_redirect(self.redirect.as_deref(), "/cart")
    }
}

/// Quantity change form data.
#[derive(Debug, Deserialize)]
pub struct UpdateForm {
    #[serde(flatten)]
    pub item: ItemForm,
    /// `+1` / `-1` from the stepper buttons.
    pub delta: i64,
}

/// Display cart page.
#[instrument(skip(session, user))]
pub async fn show(session: Session, OptionalUser(user): OptionalUser) -> impl IntoResponse {
    let cart = load_cart(&session).await;

    CartTemplate {
        lines: cart.items().iter().map(CartLineView::from).collect(),
        total: cart.total().display(),
        item_count: cart.item_count(),
        signed_in: user.is_some(),
        layout: Layout::load(&session, user.as_ref(), "/cart").await,
    }
}

/// Add one unit of an item.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<ItemForm>,
) -> Result<Response> {
    let back = form.back();
    let Some((kind, id)) = form.key() else {
        flash::error(&session, CartError::ItemNotFound.to_string()).await;
        return Ok(Redirect::to(&back).into_response());
    };

    let catalog = match state.api().catalog().await {
        Ok(catalog) => catalog,
        Err(e) => {
            tracing::error!("Failed to load catalog for add to cart: {e}");
            flash::error(&session, e.user_message()).await;
            return Ok(Redirect::to(&back).into_response());
        }
    };

    let mut cart = load_cart(&session).await;
    match cart.add_from(&catalog.items, kind, id) {
        Ok(line) => {
            let message = format!("{} added to cart", line.name);
            save_cart(&session, &cart).await?;
            let tag = format!("{}:{id}", kind.catalog_tag());
            add_breadcrumb("cart", "Added item", Some(&[("item", tag.as_str())]));
            flash::success(&session, message).await;
        }
        Err(e) => flash::error(&session, e.to_string()).await,
    }

    Ok(Redirect::to(&back).into_response())
}

/// Change a line's quantity.
#[instrument(skip(state, session))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<UpdateForm>,
) -> Result<Response> {
    let back = form.item.back();
    let Some((kind, id)) = form.item.key() else {
        return Ok(Redirect::to(&back).into_response());
    };

    // Stock is checked against the latest catalog; services are unlimited.
    let stock = match kind {
        ItemKind::Service => None,
        ItemKind::Product => match state.api().catalog().await {
            Ok(catalog) => catalog::find(&catalog.items, kind, id).and_then(|item| item.stock),
            Err(e) => {
                tracing::warn!("Catalog unavailable, skipping stock check: {e}");
                None
            }
        },
    };

    let mut cart = load_cart(&session).await;
    match cart.change_quantity(kind, id, form.delta, stock) {
        Ok(_) => save_cart(&session, &cart).await?,
        Err(e) => flash::warning(&session, e.to_string()).await,
    }

    Ok(Redirect::to(&back).into_response())
}

/// Remove a line.
#[instrument(skip(session))]
pub async fn remove(session: Session, Form(form): Form<ItemForm>) -> Result<Response> {
    let back = form.back();
    let mut cart = load_cart(&session).await;

    if let Some(line) = form.key().and_then(|(kind, id)| cart.remove(kind, id)) {
        save_cart(&session, &cart).await?;
        flash::info(&session, format!("{} removed from cart", line.name)).await;
    }

    Ok(Redirect::to(&back).into_response())
}
