//! Checkout route handlers.
//!
//! Checkout requires a signed-in customer. Submitting the payment form syncs
//! the session cart to the backend, processes the sale, and stores a summary
//! for the confirmation page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use tower_sessions::Session;
use tracing::instrument;

use applegym_core::{PaymentMethod, SaleId};

use crate::api::ApiError;
use crate::api::types::PaymentMethodOption;
use crate::checkout::{Checkout, CheckoutError, PaymentForm, format_card_number, format_expiry};
use crate::error::{Result, add_breadcrumb};
use crate::filters;
use crate::flash;
use crate::middleware::RequireUser;
use crate::models::CurrentUser;
use crate::models::{LastSale, session_keys};
use crate::routes::cart::CartLineView;
use crate::routes::{Layout, load_cart, save_cart, session_expired};
use crate::state::AppState;

const CONFIRMATION_PATH: &str = "/checkout/confirmation";

/// Payment method choice for the checkout form.
#[derive(Debug, Clone)]
pub struct MethodView {
    pub value: &'static str,
    pub label: String,
    pub icon: String,
    pub requires_card: bool,
    pub checked: bool,
}

impl MethodView {
    fn new(method: PaymentMethod, label: String, icon: Option<String>, checked: bool) -> Self {
        Self {
            value: method.as_str(),
            label,
            icon: icon.unwrap_or_else(|| default_icon(method).to_string()),
            requires_card: method.requires_card(),
            checked,
        }
    }
}

const fn default_icon(method: PaymentMethod) -> &'static str {
    match method {
        PaymentMethod::CreditCard | PaymentMethod::DebitCard => "fas fa-credit-card",
        PaymentMethod::Cash => "fas fa-money-bill-wave",
        PaymentMethod::Transfer => "fas fa-university",
    }
}

/// Build the method list, falling back to every known method when the
/// backend offers none. `selected` is checked, else the first method.
fn method_views(
    options: Vec<PaymentMethodOption>,
    selected: Option<PaymentMethod>,
) -> Vec<MethodView> {
    let checked = |i: usize, method: PaymentMethod| selected.map_or(i == 0, |s| s == method);

    if options.is_empty() {
        return PaymentMethod::ALL
            .into_iter()
            .enumerate()
            .map(|(i, m)| MethodView::new(m, m.label().to_string(), None, checked(i, m)))
            .collect();
    }

    options
        .into_iter()
        .enumerate()
        .map(|(i, o)| {
            let is_checked = checked(i, o.id);
            MethodView::new(o.id, o.nombre, o.icon, is_checked)
        })
        .collect()
}

/// Card fields echoed back after a failed validation. The CVV never is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardDraft {
    pub holder: String,
    pub number: String,
    pub expiry: String,
}

impl From<&PaymentForm> for CardDraft {
    fn from(form: &PaymentForm) -> Self {
        Self {
            holder: form.card_holder.trim().to_string(),
            number: format_card_number(&form.card_number),
            expiry: format_expiry(&form.card_expiry),
        }
    }
}

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutTemplate {
    pub layout: Layout,
    pub lines: Vec<CartLineView>,
    pub total: String,
    pub item_count: u32,
    pub methods: Vec<MethodView>,
    pub customer_name: String,
    pub customer_email: String,
    pub draft: CardDraft,
}

/// Confirmation page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/confirmation.html")]
pub struct ConfirmationTemplate {
    pub layout: Layout,
    pub sale_number: Option<i64>,
    pub total: String,
    pub status: String,
    pub method: &'static str,
    pub message: String,
    pub card_last4: Option<String>,
    pub receipt_url: Option<String>,
}

/// Display the payment form.
#[instrument(skip(state, session, user))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    RequireUser(user): RequireUser,
) -> Result<Response> {
    render_form(&state, &session, &user, None, CardDraft::default()).await
}

async fn render_form(
    state: &AppState,
    session: &Session,
    user: &CurrentUser,
    selected: Option<PaymentMethod>,
    draft: CardDraft,
) -> Result<Response> {
    let cart = load_cart(session).await;
    if cart.is_empty() {
        flash::warning(session, "Your cart is empty").await;
        return Ok(Redirect::to("/cart").into_response());
    }

    let options = match state.api().payment_methods(&user.token).await {
        Ok(options) => options,
        Err(ApiError::SessionExpired) => return Ok(session_expired(session).await),
        Err(e) => {
            tracing::warn!("Payment methods unavailable, using defaults: {e}");
            Vec::new()
        }
    };

    Ok(CheckoutTemplate {
        lines: cart.items().iter().map(CartLineView::from).collect(),
        total: cart.total().display(),
        item_count: cart.item_count(),
        methods: method_views(options, selected),
        customer_name: user.name.clone(),
        customer_email: user.email.to_string(),
        draft,
        layout: Layout::load(session, Some(user), "/checkout").await,
    }
    .into_response())
}

/// Process the sale.
#[instrument(skip(state, session, user, form))]
pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    RequireUser(user): RequireUser,
    Form(form): Form<PaymentForm>,
) -> Result<Response> {
    let now = Utc::now();

    let (method, card) = match form.validate(now.date_naive()) {
        Ok(valid) => valid,
        Err(e) => {
            flash::error(&session, e.to_string()).await;
            let draft = CardDraft::from(&form);
            return render_form(&state, &session, &user, form.method, draft).await;
        }
    };

    let mut cart = load_cart(&session).await;

    match Checkout::new(state.api(), &user.token)
        .run(&cart, method, now)
        .await
    {
        Ok(completed) => {
            let last_sale = LastSale::new(&completed, method, card.map(|c| c.last4));
            session.insert(session_keys::LAST_SALE, &last_sale).await?;

            cart.clear();
            save_cart(&session, &cart).await?;

            // Stock changed on the backend
            state.api().invalidate_catalog();

            let sale_id = last_sale
                .sale_id
                .map_or_else(|| "unknown".to_string(), |id| id.to_string());
            add_breadcrumb("checkout", "Sale processed", Some(&[("sale_id", sale_id.as_str())]));
            for line in &completed.skipped {
                flash::warning(&session, line.to_string()).await;
            }
            flash::success(&session, completed.message).await;

            Ok(Redirect::to(CONFIRMATION_PATH).into_response())
        }
        Err(CheckoutError::SessionExpired) => Ok(session_expired(&session).await),
        Err(CheckoutError::EmptyCart) => {
            flash::warning(&session, CheckoutError::EmptyCart.to_string()).await;
            Ok(Redirect::to("/cart").into_response())
        }
        Err(e @ CheckoutError::Sync { .. }) => {
            flash::error(&session, e.to_string()).await;
            Ok(Redirect::to("/cart").into_response())
        }
        Err(e) => {
            flash::error(&session, e.to_string()).await;
            Ok(Redirect::to("/checkout").into_response())
        }
    }
}

/// Show the sale just completed.
#[instrument(skip(session, user))]
pub async fn confirmation(session: Session, RequireUser(user): RequireUser) -> Result<Response> {
    let Some(sale) = session.get::<LastSale>(session_keys::LAST_SALE).await? else {
        return Ok(Redirect::to("/catalog").into_response());
    };

    let sale_number = sale.sale_id.map(|id| id.as_i64());

    Ok(ConfirmationTemplate {
        sale_number,
        total: sale.total.display(),
        status: sale.status.to_string(),
        method: sale.method.label(),
        message: sale.message,
        card_last4: sale.card_last4,
        receipt_url: sale_number.map(|n| format!("/receipts/{n}")),
        layout: Layout::load(&session, Some(&user), CONFIRMATION_PATH).await,
    }
    .into_response())
}

/// Download a sale receipt as PDF.
#[instrument(skip(state, session, user))]
pub async fn receipt(
    State(state): State<AppState>,
    session: Session,
    RequireUser(user): RequireUser,
    Path(sale_id): Path<i64>,
) -> Result<Response> {
    let sale_id = SaleId::new(sale_id);

    match state.api().receipt_pdf(&user.token, sale_id).await {
        Ok(download) => {
            let content_type = download
                .content_type
                .unwrap_or_else(|| "application/pdf".to_string());
            Ok((
                [
                    (header::CONTENT_TYPE, content_type),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("attachment; filename=\"comprobante_{sale_id}.pdf\""),
                    ),
                ],
                download.bytes,
            )
                .into_response())
        }
        Err(ApiError::SessionExpired) => Ok(session_expired(&session).await),
        Err(e) => {
            tracing::warn!(%sale_id, "Receipt download failed: {e}");
            flash::warning(&session, "The receipt could not be downloaded").await;
            Ok(Redirect::to(CONFIRMATION_PATH).into_response())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_method_views_fall_back_to_all_methods() {
        let views = method_views(Vec::new(), None);
        assert_eq!(views.len(), PaymentMethod::ALL.len());
        assert!(views[0].checked);
        assert!(views[0].requires_card);
        assert!(!views[2].requires_card);
        assert!(views.iter().skip(1).all(|v| !v.checked));
    }

    #[test]
    fn test_method_views_use_backend_labels() {
        let options = vec![PaymentMethodOption {
            id: PaymentMethod::Cash,
            nombre: "Efectivo".to_string(),
            icon: None,
        }];
        let views = method_views(options, None);
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].value, "EFECTIVO");
        assert_eq!(views[0].label, "Efectivo");
        assert_eq!(views[0].icon, "fas fa-money-bill-wave");
    }

    #[test]
    fn test_selected_method_stays_checked() {
        let views = method_views(Vec::new(), Some(PaymentMethod::Cash));
        let checked: Vec<_> = views.iter().filter(|v| v.checked).map(|v| v.value).collect();
        assert_eq!(checked, vec!["EFECTIVO"]);
    }

    #[test]
    fn test_draft_is_formatted_and_drops_cvv() {
        let form = PaymentForm {
            method: Some(PaymentMethod::CreditCard),
            card_holder: "  Ana Torres ".to_string(),
            card_number: "41111111111".to_string(),
            card_expiry: "1230".to_string(),
            card_cvv: "123".to_string(),
        };
        assert_eq!(
            CardDraft::from(&form),
            CardDraft {
                holder: "Ana Torres".to_string(),
                number: "4111 1111 111".to_string(),
                expiry: "12/30".to_string(),
            }
        );
    }
}
