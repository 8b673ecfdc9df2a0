//! Wire enums shared between the storefront and the AppleGym backend.
//!
//! The backend speaks Spanish tags on the wire (`productos`, `TARJETA_CREDITO`,
//! `ADMIN`). These enums keep the tags in one place and give the rest of the
//! code English names.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Whether a catalog entry is a physical product or a bookable service.
///
/// Catalog payloads use the plural tags (`productos`, `servicios`) while the
/// cart endpoint expects the singular ones (`producto`, `servicio`). Both
/// spellings are accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ItemKind {
    Product,
    Service,
}

impl ItemKind {
    /// Plural tag used by catalog responses and page filters.
    #[must_use]
    pub const fn catalog_tag(self) -> &'static str {
        match self {
            Self::Product => "productos",
            Self::Service => "servicios",
        }
    }

    /// Singular tag expected by the cart endpoint.
    #[must_use]
    pub const fn cart_tag(self) -> &'static str {
        match self {
            Self::Product => "producto",
            Self::Service => "servicio",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Product => "Product",
            Self::Service => "Service",
        }
    }

    /// Parse any tag spelling, case-insensitively.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "productos" | "producto" | "product" | "products" => Some(Self::Product),
            "servicios" | "servicio" | "service" | "services" => Some(Self::Service),
            _ => None,
        }
    }
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.catalog_tag())
    }
}

impl Serialize for ItemKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.catalog_tag())
    }
}

impl<'de> Deserialize<'de> for ItemKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Self::from_tag(&tag)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown item kind: {tag}")))
    }
}

/// Customer role as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Role {
    Admin,
    #[default]
    Client,
}

impl Role {
    /// Wire tag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::Client => "CLIENTE",
        }
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Anything other than ADMIN is treated as a regular client
        let tag = Option::<String>::deserialize(deserializer)?;
        Ok(match tag.as_deref().map(str::trim) {
            Some(t) if t.eq_ignore_ascii_case("ADMIN") => Self::Admin,
            _ => Self::Client,
        })
    }
}

/// Payment method accepted at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[serde(rename = "TARJETA_CREDITO")]
    CreditCard,
    #[serde(rename = "TARJETA_DEBITO")]
    DebitCard,
    #[serde(rename = "EFECTIVO")]
    Cash,
    #[serde(rename = "TRANSFERENCIA")]
    Transfer,
}

impl PaymentMethod {
    /// Every method, in display order.
    pub const ALL: [Self; 4] = [Self::CreditCard, Self::DebitCard, Self::Cash, Self::Transfer];

    /// Wire tag sent to the backend.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CreditCard => "TARJETA_CREDITO",
            Self::DebitCard => "TARJETA_DEBITO",
            Self::Cash => "EFECTIVO",
            Self::Transfer => "TRANSFERENCIA",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::CreditCard => "Credit card",
            Self::DebitCard => "Debit card",
            Self::Cash => "Cash",
            Self::Transfer => "Bank transfer",
        }
    }

    /// Whether the card fields must be filled in and validated.
    #[must_use]
    pub const fn requires_card(self) -> bool {
        matches!(self, Self::CreditCard | Self::DebitCard)
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| format!("invalid payment method: {s}"))
    }
}

/// Sale status reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum SaleStatus {
    Pending,
    #[default]
    Processed,
    Paid,
    Cancelled,
    /// A status this storefront does not know about, shown verbatim.
    Other(String),
}

impl SaleStatus {
    /// Wire tag.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "PENDIENTE",
            Self::Processed => "PROCESADO",
            Self::Paid => "PAGADO",
            Self::Cancelled => "CANCELADO",
            Self::Other(s) => s,
        }
    }

    fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_uppercase().as_str() {
            "PENDIENTE" => Self::Pending,
            "PROCESADO" | "PROCESADA" | "COMPLETADA" => Self::Processed,
            "PAGADO" | "PAGADA" => Self::Paid,
            "CANCELADO" | "CANCELADA" => Self::Cancelled,
            _ => Self::Other(tag.to_string()),
        }
    }
}

impl std::fmt::Display for SaleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for SaleStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SaleStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = Option::<String>::deserialize(deserializer)?;
        Ok(tag.map_or_else(Self::default, |t| Self::from_tag(&t)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_item_kind_accepts_both_spellings() {
        assert_eq!(ItemKind::from_tag("productos"), Some(ItemKind::Product));
        assert_eq!(ItemKind::from_tag("Servicio"), Some(ItemKind::Service));
        assert_eq!(ItemKind::from_tag("gadgets"), None);
    }

    #[test]
    fn test_item_kind_tags() {
        assert_eq!(ItemKind::Product.catalog_tag(), "productos");
        assert_eq!(ItemKind::Product.cart_tag(), "producto");
        assert_eq!(ItemKind::Service.cart_tag(), "servicio");
    }

    #[test]
    fn test_item_kind_serde() {
        let kind: ItemKind = serde_json::from_str("\"servicios\"").unwrap();
        assert_eq!(kind, ItemKind::Service);
        assert_eq!(serde_json::to_string(&kind).unwrap(), "\"servicios\"");
        assert!(serde_json::from_str::<ItemKind>("\"otro\"").is_err());
    }

    #[test]
    fn test_role_defaults_to_client() {
        let admin: Role = serde_json::from_str("\"ADMIN\"").unwrap();
        let client: Role = serde_json::from_str("\"CLIENTE\"").unwrap();
        let missing: Role = serde_json::from_str("null").unwrap();
        assert_eq!(admin, Role::Admin);
        assert_eq!(client, Role::Client);
        assert_eq!(missing, Role::Client);
    }

    #[test]
    fn test_payment_method_wire_tags() {
        let json = serde_json::to_string(&PaymentMethod::DebitCard).unwrap();
        assert_eq!(json, "\"TARJETA_DEBITO\"");
        assert_eq!(
            "TRANSFERENCIA".parse::<PaymentMethod>().unwrap(),
            PaymentMethod::Transfer
        );
        assert!("BITCOIN".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn test_payment_method_requires_card() {
        assert!(PaymentMethod::CreditCard.requires_card());
        assert!(PaymentMethod::DebitCard.requires_card());
        assert!(!PaymentMethod::Cash.requires_card());
        assert!(!PaymentMethod::Transfer.requires_card());
    }

    #[test]
    fn test_sale_status_fallbacks() {
        let missing: SaleStatus = serde_json::from_str("null").unwrap();
        assert_eq!(missing, SaleStatus::Processed);

        let paid: SaleStatus = serde_json::from_str("\"PAGADO\"").unwrap();
        assert_eq!(paid, SaleStatus::Paid);

        let odd: SaleStatus = serde_json::from_str("\"EN_REVISION\"").unwrap();
        assert_eq!(odd.to_string(), "EN_REVISION");
    }
}
