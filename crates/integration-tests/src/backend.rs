//! In-process stand-in for the AppleGym REST API.
//!
//! Answers every endpoint the storefront calls with fixed data, checks bearer
//! tokens the way the real backend does (signature ignored, `exp` honored) and
//! records request bodies for assertions.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{Duration, Utc};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use applegym_storefront::config::BackendConfig;

/// Regular customer account.
pub const CLIENT_EMAIL: &str = "ana@applegym.test";
/// Administrator account.
pub const ADMIN_EMAIL: &str = "admin@applegym.test";
/// Password of both accounts.
pub const PASSWORD: &str = "secreta1";

/// Product the catalog lists as in stock but the cart endpoint refuses.
pub const CONTESTED_PRODUCT_ID: i64 = 9;
/// Product listed with zero stock.
pub const SOLD_OUT_PRODUCT_ID: i64 = 3;
/// Id of every sale the mock processes.
pub const SALE_ID: i64 = 42;

pub const RECEIPT_PDF: &[u8] = b"%PDF-1.4 comprobante 42";
pub const REPORT_PDF: &[u8] = b"%PDF-1.4 reporte";
pub const REPORT_XLSX: &[u8] = b"PK\x03\x04 reporte";

const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Build an unsigned JWT carrying `role` and `exp` (seconds since the epoch).
#[must_use]
pub fn jwt(role: &str, exp: i64) -> String {
    format!(
        "{}.{}.mock-signature",
        URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#),
        URL_SAFE_NO_PAD.encode(json!({"sub": "mock", "rol": role, "exp": exp}).to_string())
    )
}

/// Token valid for the next hour.
#[must_use]
pub fn fresh_token(role: &str) -> String {
    jwt(role, (Utc::now() + Duration::hours(1)).timestamp())
}

/// Token that expired an hour ago.
#[must_use]
pub fn expired_token(role: &str) -> String {
    jwt(role, (Utc::now() - Duration::hours(1)).timestamp())
}

/// Everything the storefront sent that tests may want to inspect.
#[derive(Debug, Clone, Default)]
pub struct Recorded {
    /// `POST /carrito/agregar` bodies that were accepted, in order.
    pub cart_lines: Vec<Value>,
    /// `POST /ventas/procesar` bodies.
    pub sales: Vec<Value>,
    /// `POST /auth/register` bodies that were accepted.
    pub registrations: Vec<Value>,
    /// Number of `GET /test-full/catalogo` requests.
    pub catalog_requests: usize,
    /// Query strings of range-based report requests, keyed by path.
    pub report_queries: Vec<(String, HashMap<String, String>)>,
}

/// Failure modes a test can switch on.
#[derive(Debug, Clone, Copy, Default)]
pub struct Behavior {
    /// Answer every authenticated call with `401 JWT expired`.
    pub reject_tokens: bool,
    /// Fail the top-services report with a 500.
    pub fail_top_services: bool,
    /// Refuse `POST /ventas/procesar` with a 400.
    pub refuse_sales: bool,
    /// Hand out tokens at login that have already expired.
    pub expired_logins: bool,
}

struct MockState {
    behavior: Behavior,
    recorded: Mutex<Recorded>,
}

type Shared = Arc<MockState>;

/// A running mock backend. The server stops when this is dropped.
pub struct MockBackend {
    addr: SocketAddr,
    state: Shared,
    server: JoinHandle<()>,
}

impl MockBackend {
    /// Start a well-behaved backend.
    pub async fn start() -> Self {
        Self::with_behavior(Behavior::default()).await
    }

    /// Start a backend with the given failure modes.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub async fn with_behavior(behavior: Behavior) -> Self {
        let state = Arc::new(MockState {
            behavior,
            recorded: Mutex::new(Recorded::default()),
        });

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock backend");
        let addr = listener
            .local_addr()
            .expect("Mock backend has no local address");

        let app = Router::new().nest("/api", routes()).with_state(state.clone());
        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            addr,
            state,
            server,
        }
    }

    /// API base URL, as `APPLEGYM_API_URL` would hold it.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    /// Client configuration pointing at this backend.
    ///
    /// # Panics
    ///
    /// Never in practice; the URL is always valid.
    #[must_use]
    pub fn config(&self) -> BackendConfig {
        BackendConfig::parse(&self.base_url(), "5").expect("Mock backend URL is valid")
    }

    /// Snapshot of the recorded requests.
    pub async fn recorded(&self) -> Recorded {
        self.state.recorded.lock().await.clone()
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}

fn routes() -> Router<Shared> {
    Router::new()
        .route("/test-full/hello", get(hello))
        .route("/test-full/catalogo", get(catalog))
        .route("/test-full/productos", get(products))
        .route("/test-full/servicios", get(services))
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/carrito/agregar", post(add_to_cart))
        .route("/ventas/procesar", post(process_sale))
        .route("/ventas/comprobante/{id}/pdf", get(receipt))
        .route("/ventas/metodos-pago", get(payment_methods))
        .route("/reportes/resumen", get(report_summary))
        .route("/reportes/ventas-por-fecha", get(sales_by_date))
        .route("/reportes/productos-top", get(top_products))
        .route("/reportes/servicios-top", get(top_services))
        .route("/reportes/export/{format}", get(export_report))
}

// =============================================================================
// Fixtures
// =============================================================================

fn product_items() -> Vec<Value> {
    vec![
        json!({"id": 1, "nombre": "Mancuernas 10kg", "descripcion": "Par de mancuernas hexagonales",
               "precio": 89.9, "stock": 12, "tipo": "productos", "categoria": "Pesas",
               "icon": "fas fa-dumbbell", "disponible": true}),
        json!({"id": 2, "nombre": "Proteína Whey", "descripcion": "Bolsa de 2 lb",
               "precio": 45, "stock": 3, "tipo": "productos", "categoria": "Suplementos",
               "icon": "fas fa-flask", "disponible": true}),
        json!({"id": SOLD_OUT_PRODUCT_ID, "nombre": "Cinturón de levantamiento", "descripcion": null,
               "precio": 35.5, "stock": 0, "tipo": "productos", "categoria": "Accesorios",
               "icon": null, "disponible": false}),
        json!({"id": CONTESTED_PRODUCT_ID, "nombre": "Banda elástica", "descripcion": "Resistencia media",
               "precio": 15, "stock": 5, "tipo": "productos", "categoria": "Accesorios",
               "icon": "fas fa-ring", "disponible": true}),
    ]
}

fn service_items() -> Vec<Value> {
    vec![
        json!({"id": 1, "nombre": "Clase de Spinning", "descripcion": "Sesión grupal",
               "precio": 25, "duracion": 45, "tipo": "servicios", "categoria": "Clases",
               "icon": "fas fa-bicycle", "disponible": true}),
        json!({"id": 2, "nombre": "Entrenamiento personal", "descripcion": "Con entrenador certificado",
               "precio": 60, "duracion": 60, "tipo": "servicios", "categoria": "Entrenamiento",
               "icon": "fas fa-user-ninja", "disponible": true}),
    ]
}

fn error(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(json!({"error": message, "status": status.as_u16()})),
    )
        .into_response()
}

/// Role claim of a valid bearer token, or the response the backend gives.
fn authorize(state: &MockState, headers: &HeaderMap) -> Result<String, Response> {
    if state.behavior.reject_tokens {
        return Err(error(StatusCode::UNAUTHORIZED, "JWT expired"));
    }

    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| error(StatusCode::UNAUTHORIZED, "Token requerido"))?;

    let claims: Value = token
        .split('.')
        .nth(1)
        .and_then(|segment| URL_SAFE_NO_PAD.decode(segment).ok())
        .and_then(|bytes| serde_json::from_slice(&bytes).ok())
        .ok_or_else(|| error(StatusCode::UNAUTHORIZED, "Token inválido"))?;

    let exp = claims.get("exp").and_then(Value::as_i64).unwrap_or(0);
    if exp < Utc::now().timestamp() {
        return Err(error(StatusCode::UNAUTHORIZED, "JWT expired"));
    }

    Ok(claims
        .get("rol")
        .and_then(Value::as_str)
        .unwrap_or("CLIENTE")
        .to_string())
}

fn authorize_admin(state: &MockState, headers: &HeaderMap) -> Result<(), Response> {
    if authorize(state, headers)? == "ADMIN" {
        Ok(())
    } else {
        Err(error(StatusCode::FORBIDDEN, "Acceso denegado"))
    }
}

// =============================================================================
// Catalog
// =============================================================================

async fn hello() -> Json<Value> {
    Json(json!({"message": "Hello from AppleGym backend"}))
}

async fn catalog(State(state): State<Shared>) -> Json<Value> {
    state.recorded.lock().await.catalog_requests += 1;

    let products = product_items();
    let services = service_items();
    Json(json!({
        "success": true,
        "totalProductos": products.len(),
        "totalServicios": services.len(),
        "items": products.into_iter().chain(services).collect::<Vec<_>>(),
        "source": "mock",
    }))
}

async fn products() -> Json<Value> {
    Json(json!({"success": true, "productos": product_items()}))
}

async fn services() -> Json<Value> {
    Json(json!({"success": true, "servicios": service_items()}))
}

// =============================================================================
// Auth
// =============================================================================

async fn login(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let email = body.get("email").and_then(Value::as_str).unwrap_or_default();
    let password = body
        .get("password")
        .and_then(Value::as_str)
        .unwrap_or_default();

    let (id, name, role) = match email {
        CLIENT_EMAIL => (7, "Ana Torres", "CLIENTE"),
        ADMIN_EMAIL => (1, "Carlos Admin", "ADMIN"),
        _ => return error(StatusCode::UNAUTHORIZED, "Credenciales inválidas"),
    };
    if password != PASSWORD {
        return error(StatusCode::UNAUTHORIZED, "Credenciales inválidas");
    }

    let token = if state.behavior.expired_logins {
        expired_token(role)
    } else {
        fresh_token(role)
    };

    Json(json!({
        "accessToken": token,
        "tokenType": "Bearer",
        "cliente": {
            "idCliente": id,
            "nombreCliente": name,
            "email": email,
            "telefono": "0991234567",
            "direccion": "Av. Amazonas 100",
            "activo": true,
            "rol": role,
        },
    }))
    .into_response()
}

async fn register(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let email = body.get("email").and_then(Value::as_str).unwrap_or_default();
    if email == CLIENT_EMAIL || email == ADMIN_EMAIL {
        return error(StatusCode::BAD_REQUEST, "El email ya está registrado");
    }

    state.recorded.lock().await.registrations.push(body.clone());
    (
        StatusCode::CREATED,
        Json(json!({"message": "Cliente registrado exitosamente"})),
    )
        .into_response()
}

// =============================================================================
// Cart & Sales
// =============================================================================

async fn add_to_cart(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Err(response) = authorize(&state, &headers) {
        return response;
    }

    let id = body.get("productoId").and_then(Value::as_i64);
    let kind = body.get("tipo").and_then(Value::as_str);
    if id == Some(CONTESTED_PRODUCT_ID) && kind == Some("producto") {
        return error(StatusCode::BAD_REQUEST, "Stock insuficiente");
    }

    state.recorded.lock().await.cart_lines.push(body);
    Json(json!({"message": "Producto agregado al carrito"})).into_response()
}

async fn process_sale(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Err(response) = authorize(&state, &headers) {
        return response;
    }
    if state.behavior.refuse_sales {
        return error(StatusCode::BAD_REQUEST, "El carrito está vacío");
    }

    state.recorded.lock().await.sales.push(body);
    Json(json!({
        "message": "Venta procesada exitosamente",
        "venta": {
            "idVenta": SALE_ID,
            "total": 204.8,
            "estado": "PROCESADO",
            "fechaVenta": "2026-06-15T10:30:00",
            "detalles": [],
        },
        "redirectTo": "/venta-confirmada",
    }))
    .into_response()
}

async fn receipt(State(state): State<Shared>, headers: HeaderMap, Path(id): Path<i64>) -> Response {
    if let Err(response) = authorize(&state, &headers) {
        return response;
    }
    if id != SALE_ID {
        return error(StatusCode::NOT_FOUND, "Venta no encontrada");
    }

    ([(header::CONTENT_TYPE, "application/pdf")], RECEIPT_PDF).into_response()
}

async fn payment_methods(State(state): State<Shared>, headers: HeaderMap) -> Response {
    if let Err(response) = authorize(&state, &headers) {
        return response;
    }

    Json(json!({
        "metodosDisponibles": [
            {"id": "TARJETA_CREDITO", "nombre": "Tarjeta de Crédito", "icon": "fas fa-credit-card"},
            {"id": "EFECTIVO", "nombre": "Efectivo", "icon": "fas fa-money-bill"},
        ],
    }))
    .into_response()
}

// =============================================================================
// Reports
// =============================================================================

async fn report_summary(State(state): State<Shared>, headers: HeaderMap) -> Response {
    if let Err(response) = authorize_admin(&state, &headers) {
        return response;
    }

    Json(json!({
        "ventasTotales": 1520.5,
        "totalVentas": 12,
        "totalClientes": 5,
        "totalProductos": 4,
        "totalServicios": 2,
    }))
    .into_response()
}

async fn sales_by_date(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if let Err(response) = authorize_admin(&state, &headers) {
        return response;
    }

    state
        .recorded
        .lock()
        .await
        .report_queries
        .push(("/reportes/ventas-por-fecha".to_string(), query));

    Json(json!([
        {"fecha": "2026-06-01", "cantidadVentas": 3, "totalVentas": 250.0},
        {"fecha": "2026-06-02", "cantidadVentas": 5, "totalVentas": 410.5},
    ]))
    .into_response()
}

async fn top_products(State(state): State<Shared>, headers: HeaderMap) -> Response {
    if let Err(response) = authorize_admin(&state, &headers) {
        return response;
    }

    Json(json!([
        {"idItem": 2, "nombre": "Proteína Whey", "tipo": "producto", "cantidadVendida": 12,
         "totalVentas": 540.0, "categoria": "Suplementos"},
        {"idItem": 1, "nombre": "Mancuernas 10kg", "tipo": "producto", "cantidadVendida": 4,
         "totalVentas": 359.6, "categoria": "Pesas"},
    ]))
    .into_response()
}

async fn top_services(State(state): State<Shared>, headers: HeaderMap) -> Response {
    if let Err(response) = authorize_admin(&state, &headers) {
        return response;
    }
    if state.behavior.fail_top_services {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "Error interno");
    }

    Json(json!([
        {"idItem": 1, "nombre": "Clase de Spinning", "tipo": "servicio", "cantidadVendida": 9,
         "totalVentas": 225.0, "categoria": "Clases"},
    ]))
    .into_response()
}

async fn export_report(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(format): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if let Err(response) = authorize_admin(&state, &headers) {
        return response;
    }

    let (content_type, bytes) = match format.as_str() {
        "excel" => (XLSX_CONTENT_TYPE, REPORT_XLSX),
        "pdf" => ("application/pdf", REPORT_PDF),
        _ => return error(StatusCode::NOT_FOUND, "Formato no soportado"),
    };

    state
        .recorded
        .lock()
        .await
        .report_queries
        .push((format!("/reportes/export/{format}"), query));

    ([(header::CONTENT_TYPE, content_type)], bytes).into_response()
}
