//! Wire types for the AppleGym REST API.
//!
//! Field names follow the backend's camelCase Spanish JSON. Anything the
//! backend may omit or send as `null` is an `Option` or `#[serde(default)]`.

use serde::{Deserialize, Serialize};

use applegym_core::{CustomerId, ItemId, ItemKind, PaymentMethod, Price, Role, SaleId, SaleStatus};

use crate::token::BearerToken;

// =============================================================================
// Catalog
// =============================================================================

/// A product or service as returned by the `test-full` catalog endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct WireItem {
    pub id: ItemId,
    pub nombre: String,
    #[serde(default)]
    pub descripcion: Option<String>,
    pub precio: Price,
    /// Products only.
    #[serde(default)]
    pub stock: Option<i64>,
    /// Services only, in minutes.
    #[serde(default)]
    pub duracion: Option<i64>,
    pub tipo: ItemKind,
    #[serde(default)]
    pub categoria: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub disponible: Option<bool>,
}

/// `GET /test-full/catalogo`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub items: Vec<WireItem>,
    #[serde(default)]
    pub total_productos: Option<u32>,
    #[serde(default)]
    pub total_servicios: Option<u32>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// `GET /test-full/productos`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductsResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub productos: Vec<WireItem>,
    #[serde(default)]
    pub error: Option<String>,
}

/// `GET /test-full/servicios`.
#[derive(Debug, Clone, Deserialize)]
pub struct ServicesResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub servicios: Vec<WireItem>,
    #[serde(default)]
    pub error: Option<String>,
}

/// `GET /test-full/hello`.
#[derive(Debug, Clone, Deserialize)]
pub struct HelloResponse {
    #[serde(default)]
    pub message: Option<String>,
}

// =============================================================================
// Auth
// =============================================================================

#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Successful `POST /auth/login` body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: BearerToken,
    #[serde(default)]
    pub token_type: Option<String>,
    pub cliente: Customer,
}

/// Customer profile (`ClienteDTO`).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id_cliente: CustomerId,
    pub nombre_cliente: String,
    pub email: String,
    #[serde(default)]
    pub telefono: Option<String>,
    #[serde(default)]
    pub direccion: Option<String>,
    #[serde(default)]
    pub activo: Option<bool>,
    #[serde(default)]
    pub rol: Role,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest<'a> {
    pub nombre_cliente: &'a str,
    pub email: &'a str,
    pub telefono: &'a str,
    pub direccion: &'a str,
    pub password: &'a str,
    pub confirm_password: &'a str,
}

/// `POST /auth/register` 201 body.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub cliente: Option<Customer>,
}

// =============================================================================
// Cart & Sales
// =============================================================================

/// `POST /carrito/agregar` body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineRequest {
    pub producto_id: ItemId,
    /// Singular kind tag (`producto` / `servicio`).
    pub tipo: &'static str,
    pub cantidad: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessSaleRequest {
    pub metodo_pago: PaymentMethod,
}

/// `POST /ventas/procesar` body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessSaleResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub venta: Option<Sale>,
    #[serde(default)]
    pub redirect_to: Option<String>,
}

/// A sale (`VentaDTO`). Only the fields the storefront renders.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id_venta: SaleId,
    #[serde(default)]
    pub total: Option<Price>,
    #[serde(default)]
    pub estado: SaleStatus,
    #[serde(default)]
    pub fecha_venta: Option<String>,
    #[serde(default)]
    pub detalles: Vec<SaleLine>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleLine {
    #[serde(default)]
    pub nombre: Option<String>,
    #[serde(default)]
    pub cantidad: Option<u32>,
    #[serde(default)]
    pub subtotal: Option<Price>,
}

/// `GET /ventas/metodos-pago`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethodsResponse {
    #[serde(default)]
    pub metodos_disponibles: Vec<PaymentMethodOption>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentMethodOption {
    pub id: PaymentMethod,
    pub nombre: String,
    #[serde(default)]
    pub icon: Option<String>,
}

// =============================================================================
// Reports
// =============================================================================

/// `GET /reportes/resumen` (`ResumenReporteDTO`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    #[serde(default)]
    pub ventas_totales: Option<Price>,
    #[serde(default)]
    pub total_ventas: Option<u64>,
    #[serde(default)]
    pub total_clientes: Option<u64>,
    #[serde(default)]
    pub total_productos: Option<u64>,
    #[serde(default)]
    pub total_servicios: Option<u64>,
    #[serde(default)]
    pub ventas_hoy: Option<Price>,
    #[serde(default)]
    pub ventas_semana: Option<Price>,
    #[serde(default)]
    pub ventas_mes: Option<Price>,
    #[serde(default)]
    pub fecha_ultima_venta: Option<String>,
}

/// One row of `GET /reportes/ventas-por-fecha`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesByDate {
    pub fecha: String,
    #[serde(default)]
    pub cantidad_ventas: u64,
    #[serde(default)]
    pub total_ventas: Price,
}

/// One row of the top-products / top-services reports (`TopItemDTO`).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopItem {
    #[serde(default)]
    pub id_item: Option<ItemId>,
    pub nombre: String,
    #[serde(default)]
    pub tipo: Option<String>,
    #[serde(default)]
    pub cantidad_vendida: u64,
    #[serde(default)]
    pub total_ventas: Price,
    #[serde(default)]
    pub categoria: Option<String>,
}

/// Error body shapes the backend uses (`{error}`, `{message}`, or both).
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorBody {
    /// Preferred user-facing message: `error`, then `message`.
    pub(crate) fn into_message(self) -> Option<String> {
        self.error
            .filter(|s| !s.trim().is_empty())
            .or(self.message.filter(|s| !s.trim().is_empty()))
    }
}
