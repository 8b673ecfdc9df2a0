//! Types stored in the visitor's session.

use serde::{Deserialize, Serialize};

use applegym_core::{CustomerId, Email, PaymentMethod, Price, Role, SaleId, SaleStatus};

use crate::api::types::LoginResponse;
use crate::checkout::Completed;
use crate::token::BearerToken;

/// Signed-in customer.
///
/// The bearer token is what authorizes cart, sale and report calls; it is
/// never rendered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: CustomerId,
    pub name: String,
    pub email: Email,
    pub role: Role,
    pub token: BearerToken,
}

impl CurrentUser {
    /// Build the session user from a login response.
    ///
    /// `email` is the address the visitor typed, used when the backend's
    /// copy does not parse.
    #[must_use]
    pub fn from_login(response: LoginResponse, email: Email) -> Self {
        let customer = response.cliente;
        Self {
            id: customer.id_cliente,
            name: customer.nombre_cliente,
            email: Email::parse(&customer.email).unwrap_or(email),
            role: customer.rol,
            token: response.access_token,
        }
    }

    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self.role, Role::Admin)
    }

    /// First word of the name, for greetings.
    #[must_use]
    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or(&self.name)
    }
}

/// The sale just completed, shown on the confirmation page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LastSale {
    pub sale_id: Option<SaleId>,
    pub total: Price,
    pub status: SaleStatus,
    pub method: PaymentMethod,
    pub message: String,
    pub card_last4: Option<String>,
}

impl LastSale {
    /// Record a completed checkout. A sale without a total shows `$0.00`.
    #[must_use]
    pub fn new(completed: &Completed, method: PaymentMethod, card_last4: Option<String>) -> Self {
        let sale = completed.sale.as_ref();
        Self {
            sale_id: sale.map(|s| s.id_venta),
            total: sale.and_then(|s| s.total).unwrap_or(Price::ZERO),
            status: sale.map(|s| s.estado.clone()).unwrap_or_default(),
            method,
            message: completed.message.clone(),
            card_last4,
        }
    }
}

/// Session keys.
pub mod keys {
    /// Signed-in customer (`CurrentUser`).
    pub const CURRENT_USER: &str = "current_user";

    /// Visitor's cart (`Cart`).
    pub const CART: &str = "cart";

    /// Pending notifications (`Vec<Flash>`).
    pub const FLASH: &str = "flash";

    /// Most recent sale (`LastSale`).
    pub const LAST_SALE: &str = "last_sale";
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use crate::api::types::Sale;

    fn login(email: &str, rol: &str) -> LoginResponse {
        serde_json::from_value(serde_json::json!({
            "accessToken": "h.p.s",
            "tokenType": "Bearer",
            "cliente": {"idCliente": 3, "nombreCliente": "Ana Torres", "email": email, "rol": rol}
        }))
        .unwrap()
    }

    #[test]
    fn test_from_login() {
        let typed = Email::parse("ana@applegym.pe").unwrap();
        let user = CurrentUser::from_login(login("Ana@AppleGym.pe", "ADMIN"), typed);
        assert_eq!(user.email.as_str(), "ana@applegym.pe");
        assert!(user.is_admin());
        assert_eq!(user.first_name(), "Ana");
    }

    #[test]
    fn test_from_login_falls_back_to_typed_email() {
        let typed = Email::parse("ana@applegym.pe").unwrap();
        let user = CurrentUser::from_login(login("", "CLIENTE"), typed.clone());
        assert_eq!(user.email, typed);
        assert!(!user.is_admin());
    }

    #[test]
    fn test_last_sale_defaults() {
        let completed = Completed {
            sale: Some(serde_json::from_str::<Sale>(r#"{"idVenta": 12}"#).unwrap()),
            message: "ok".to_string(),
            skipped: Vec::new(),
        };
        let last = LastSale::new(&completed, PaymentMethod::Cash, None);
        assert_eq!(last.sale_id, Some(SaleId::new(12)));
        assert_eq!(last.total, Price::ZERO);
        assert_eq!(last.total.display(), "$0.00");
        assert_eq!(last.status.as_str(), "PROCESADO");
    }

    #[test]
    fn test_last_sale_uses_backend_total() {
        let completed = Completed {
            sale: Some(
                serde_json::from_str::<Sale>(r#"{"idVenta": 12, "total": 204.8}"#).unwrap(),
            ),
            message: "ok".to_string(),
            skipped: Vec::new(),
        };
        let last = LastSale::new(&completed, PaymentMethod::CreditCard, Some("1111".into()));
        assert_eq!(last.total, Price::from_cents(20_480));
        assert_eq!(last.card_last4.as_deref(), Some("1111"));
    }

    #[test]
    fn test_last_sale_without_sale_record() {
        let completed = Completed {
            sale: None,
            message: "Venta procesada exitosamente".to_string(),
            skipped: Vec::new(),
        };
        let last = LastSale::new(&completed, PaymentMethod::Cash, None);
        assert_eq!(last.sale_id, None);
        assert_eq!(last.total.display(), "$0.00");
    }
}
