//! AppleGym backend REST client.
//!
//! # Architecture
//!
//! - The backend (Spring Boot) is the source of truth for catalog, sales and
//!   reports. Nothing is persisted locally apart from the visitor's session.
//! - Catalog responses are cached via `moka` (5 minute TTL) and invalidated
//!   after every completed sale, since stock changes.
//! - Authenticated calls send the visitor's JWT as a bearer token. A 401/403
//!   or a `JWT expired` message on such a call surfaces as
//!   [`ApiError::SessionExpired`] so the caller can sign the visitor out.
//!
//! # Example
//!
//! ```rust,ignore
//! use applegym_storefront::api::ApiClient;
//!
//! let api = ApiClient::new(&config.api)?;
//! let catalog = api.catalog().await?;
//! let login = api.login(&email, "hunter2").await?;
//! api.add_cart_line(&login.access_token, ItemKind::Product, ItemId::new(3), 2).await?;
//! ```

mod cache;
pub mod types;

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

use applegym_core::{Email, ItemId, ItemKind, PaymentMethod, SaleId};

use crate::catalog::{Catalog, CatalogItem};
use crate::config::BackendConfig;
use crate::reports::{DateRange, ExportFormat};
use crate::token::BearerToken;

use cache::{CacheKey, CacheValue};
use types::{
    CartLineRequest, CatalogResponse, ErrorBody, HelloResponse, LoginRequest, LoginResponse,
    PaymentMethodOption, PaymentMethodsResponse, ProcessSaleRequest, ProcessSaleResponse,
    ProductsResponse, RegisterRequest, RegisterResponse, ReportSummary, SalesByDate,
    ServicesResponse, TopItem,
};

/// How long catalog responses stay cached.
const CATALOG_TTL: Duration = Duration::from_secs(300);

/// Errors that can occur when talking to the AppleGym backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport failure (connection refused, timeout, ...).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body was not the JSON we expected.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Request URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// The bearer token was rejected or has expired.
    #[error("Session expired")]
    SessionExpired,

    /// Login failed.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The backend refused the request; the message comes from its body.
    #[error("Rejected: {0}")]
    Rejected(String),
}

impl ApiError {
    /// Message that is safe to show to the visitor.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Http(_) | Self::Url(_) => {
                "Could not connect to the AppleGym server. Please try again.".to_string()
            }
            Self::Parse(_) => "The server returned an unexpected response.".to_string(),
            Self::SessionExpired => "Your session has expired. Please log in again.".to_string(),
            Self::InvalidCredentials => "Invalid email or password".to_string(),
            Self::NotFound(_) => "The requested resource was not found".to_string(),
            Self::Rejected(message) => message.clone(),
        }
    }

    #[must_use]
    pub const fn is_session_expired(&self) -> bool {
        matches!(self, Self::SessionExpired)
    }
}

/// Binary payload (PDF receipt, report export).
#[derive(Debug, Clone)]
pub struct Download {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

/// Credentials attached to a request.
#[derive(Clone, Copy)]
enum Auth<'a> {
    Anonymous,
    /// The login call itself: a 401 means bad credentials, not an expired session.
    Login,
    Bearer(&'a BearerToken),
}

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the AppleGym REST API.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: String,
    cache: Cache<CacheKey, CacheValue>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Http` if the underlying HTTP client cannot be built.
    pub fn new(config: &BackendConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("AppleGym-Storefront/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let cache = Cache::builder()
            .max_capacity(16)
            .time_to_live(CATALOG_TTL)
            .build();

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.base_url.trim_end_matches('/').to_string(),
                cache,
            }),
        })
    }

    /// Base URL requests are sent to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base_url)
    }

    fn url_with_query(&self, path: &str, params: &[(&str, String)]) -> Result<Url, ApiError> {
        Ok(Url::parse_with_params(&self.url(path), params)?)
    }

    /// Send a request and turn any non-success status into an `ApiError`.
    async fn execute(
        &self,
        request: RequestBuilder,
        auth: Auth<'_>,
    ) -> Result<reqwest::Response, ApiError> {
        let request = match auth {
            Auth::Bearer(token) => request.bearer_auth(token.as_str()),
            Auth::Anonymous | Auth::Login => request,
        };

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::warn!(
            status = %status,
            body = %excerpt(&body),
            "AppleGym API returned non-success status"
        );
        Err(classify(status, &body, auth))
    }

    /// Send a request and parse the JSON body.
    async fn json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        auth: Auth<'_>,
    ) -> Result<T, ApiError> {
        let response = self.execute(request, auth).await?;
        let text = response.text().await?;

        serde_json::from_str(&text).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %excerpt(&text),
                "Failed to parse AppleGym response"
            );
            ApiError::Parse(e)
        })
    }

    /// Send a request and return the raw body.
    async fn download(&self, request: RequestBuilder, auth: Auth<'_>) -> Result<Download, ApiError> {
        let response = self.execute(request, auth).await?;
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let bytes = response.bytes().await?.to_vec();
        Ok(Download {
            bytes,
            content_type,
        })
    }

    // =========================================================================
    // Health
    // =========================================================================

    /// Check that the backend is reachable.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be reached or answers with an error.
    #[instrument(skip(self))]
    pub async fn ping(&self) -> Result<String, ApiError> {
        let hello: HelloResponse = self
            .json(
                self.inner.client.get(self.url("/test-full/hello")),
                Auth::Anonymous,
            )
            .await?;
        Ok(hello.message.unwrap_or_else(|| "ok".to_string()))
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// Get every product and service.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Rejected` if the backend reports `success: false`,
    /// or a transport/parse error.
    #[instrument(skip(self))]
    pub async fn catalog(&self) -> Result<Arc<Catalog>, ApiError> {
        if let Some(CacheValue::Catalog(catalog)) = self.inner.cache.get(&CacheKey::Catalog).await
        {
            debug!("Cache hit for catalog");
            return Ok(catalog);
        }

        let response: CatalogResponse = self
            .json(
                self.inner.client.get(self.url("/test-full/catalogo")),
                Auth::Anonymous,
            )
            .await?;

        if !response.success {
            return Err(ApiError::Rejected(response.error.unwrap_or_else(|| {
                "The catalog could not be loaded".to_string()
            })));
        }

        let items: Vec<CatalogItem> = response.items.into_iter().map(CatalogItem::from).collect();
        let count = |kind: ItemKind| items.iter().filter(|i| i.kind == kind).count();
        let total_products = response
            .total_productos
            .map_or_else(|| count(ItemKind::Product), |n| n as usize);
        let total_services = response
            .total_servicios
            .map_or_else(|| count(ItemKind::Service), |n| n as usize);

        let catalog = Arc::new(Catalog {
            items,
            total_products,
            total_services,
            source: response.source,
        });

        self.inner
            .cache
            .insert(CacheKey::Catalog, CacheValue::Catalog(Arc::clone(&catalog)))
            .await;

        Ok(catalog)
    }

    /// Get products only.
    ///
    /// # Errors
    ///
    /// Same as [`ApiClient::catalog`].
    #[instrument(skip(self))]
    pub async fn products(&self) -> Result<Arc<Vec<CatalogItem>>, ApiError> {
        if let Some(CacheValue::Items(items)) = self.inner.cache.get(&CacheKey::Products).await {
            debug!("Cache hit for products");
            return Ok(items);
        }

        let response: ProductsResponse = self
            .json(
                self.inner.client.get(self.url("/test-full/productos")),
                Auth::Anonymous,
            )
            .await?;

        if !response.success {
            return Err(ApiError::Rejected(response.error.unwrap_or_else(|| {
                "Products could not be loaded".to_string()
            })));
        }

        let items = Arc::new(
            response
                .productos
                .into_iter()
                .map(CatalogItem::from)
                .collect::<Vec<_>>(),
        );
        self.inner
            .cache
            .insert(CacheKey::Products, CacheValue::Items(Arc::clone(&items)))
            .await;

        Ok(items)
    }

    /// Get services only.
    ///
    /// # Errors
    ///
    /// Same as [`ApiClient::catalog`].
    #[instrument(skip(self))]
    pub async fn services(&self) -> Result<Arc<Vec<CatalogItem>>, ApiError> {
        if let Some(CacheValue::Items(items)) = self.inner.cache.get(&CacheKey::Services).await {
            debug!("Cache hit for services");
            return Ok(items);
        }

        let response: ServicesResponse = self
            .json(
                self.inner.client.get(self.url("/test-full/servicios")),
                Auth::Anonymous,
            )
            .await?;

        if !response.success {
            return Err(ApiError::Rejected(response.error.unwrap_or_else(|| {
                "Services could not be loaded".to_string()
            })));
        }

        let items = Arc::new(
            response
                .servicios
                .into_iter()
                .map(CatalogItem::from)
                .collect::<Vec<_>>(),
        );
        self.inner
            .cache
            .insert(CacheKey::Services, CacheValue::Items(Arc::clone(&items)))
            .await;

        Ok(items)
    }

    /// Drop every cached catalog response.
    pub fn invalidate_catalog(&self) {
        self.inner.cache.invalidate_all();
    }

    // =========================================================================
    // Auth
    // =========================================================================

    /// Exchange credentials for a bearer token and profile.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidCredentials` on a 401.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(&self, email: &Email, password: &str) -> Result<LoginResponse, ApiError> {
        let body = LoginRequest {
            email: email.as_str(),
            password,
        };
        self.json(
            self.inner.client.post(self.url("/auth/login")).json(&body),
            Auth::Login,
        )
        .await
    }

    /// Register a new customer.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Rejected` with the backend's message on validation
    /// failures (duplicate email, weak password, ...).
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn register(
        &self,
        request: &RegisterRequest<'_>,
    ) -> Result<RegisterResponse, ApiError> {
        self.json(
            self.inner.client.post(self.url("/auth/register")).json(request),
            Auth::Anonymous,
        )
        .await
    }

    // =========================================================================
    // Cart & Sales
    // =========================================================================

    /// Add a line to the customer's server-side cart.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::SessionExpired` if the token is rejected.
    #[instrument(skip(self, token))]
    pub async fn add_cart_line(
        &self,
        token: &BearerToken,
        kind: ItemKind,
        id: ItemId,
        quantity: u32,
    ) -> Result<(), ApiError> {
        let body = CartLineRequest {
            producto_id: id,
            tipo: kind.cart_tag(),
            cantidad: quantity,
        };
        self.execute(
            self.inner.client.post(self.url("/carrito/agregar")).json(&body),
            Auth::Bearer(token),
        )
        .await?;
        Ok(())
    }

    /// Turn the customer's server-side cart into a sale.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::SessionExpired` if the token is rejected, or
    /// `ApiError::Rejected` with the backend's message.
    #[instrument(skip(self, token))]
    pub async fn process_sale(
        &self,
        token: &BearerToken,
        method: PaymentMethod,
    ) -> Result<ProcessSaleResponse, ApiError> {
        let body = ProcessSaleRequest {
            metodo_pago: method,
        };
        self.json(
            self.inner.client.post(self.url("/ventas/procesar")).json(&body),
            Auth::Bearer(token),
        )
        .await
    }

    /// Download the PDF receipt for a sale.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the sale has no receipt.
    #[instrument(skip(self, token))]
    pub async fn receipt_pdf(
        &self,
        token: &BearerToken,
        sale_id: SaleId,
    ) -> Result<Download, ApiError> {
        self.download(
            self.inner
                .client
                .get(self.url(&format!("/ventas/comprobante/{sale_id}/pdf"))),
            Auth::Bearer(token),
        )
        .await
    }

    /// Payment methods the backend accepts.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, token))]
    pub async fn payment_methods(
        &self,
        token: &BearerToken,
    ) -> Result<Vec<PaymentMethodOption>, ApiError> {
        let response: PaymentMethodsResponse = self
            .json(
                self.inner.client.get(self.url("/ventas/metodos-pago")),
                Auth::Bearer(token),
            )
            .await?;
        Ok(response.metodos_disponibles)
    }

    // =========================================================================
    // Reports (admin only)
    // =========================================================================

    /// Headline numbers for the dashboard.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::SessionExpired` if the token is rejected.
    #[instrument(skip(self, token))]
    pub async fn report_summary(&self, token: &BearerToken) -> Result<ReportSummary, ApiError> {
        self.json(
            self.inner.client.get(self.url("/reportes/resumen")),
            Auth::Bearer(token),
        )
        .await
    }

    /// Daily sales within `range`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::SessionExpired` if the token is rejected.
    #[instrument(skip(self, token))]
    pub async fn sales_by_date(
        &self,
        token: &BearerToken,
        range: &DateRange,
    ) -> Result<Vec<SalesByDate>, ApiError> {
        let url = self.url_with_query("/reportes/ventas-por-fecha", &range.query_params())?;
        self.json(self.inner.client.get(url), Auth::Bearer(token))
            .await
    }

    /// Best-selling products.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::SessionExpired` if the token is rejected.
    #[instrument(skip(self, token))]
    pub async fn top_products(
        &self,
        token: &BearerToken,
        limit: u32,
    ) -> Result<Vec<TopItem>, ApiError> {
        self.top_items("/reportes/productos-top", token, limit).await
    }

    /// Best-selling services.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::SessionExpired` if the token is rejected.
    #[instrument(skip(self, token))]
    pub async fn top_services(
        &self,
        token: &BearerToken,
        limit: u32,
    ) -> Result<Vec<TopItem>, ApiError> {
        self.top_items("/reportes/servicios-top", token, limit).await
    }

    async fn top_items(
        &self,
        path: &str,
        token: &BearerToken,
        limit: u32,
    ) -> Result<Vec<TopItem>, ApiError> {
        let url = self.url_with_query(path, &[("limit", limit.to_string())])?;
        self.json(self.inner.client.get(url), Auth::Bearer(token))
            .await
    }

    /// Download the sales report for `range` as Excel or PDF.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::SessionExpired` if the token is rejected.
    #[instrument(skip(self, token))]
    pub async fn export_report(
        &self,
        token: &BearerToken,
        format: ExportFormat,
        range: &DateRange,
    ) -> Result<Download, ApiError> {
        let path = format!("/reportes/export/{}", format.path_segment());
        let url = self.url_with_query(&path, &range.query_params())?;
        self.download(self.inner.client.get(url), Auth::Bearer(token))
            .await
    }
}

/// Map a non-success response to an `ApiError`.
fn classify(status: StatusCode, body: &str, auth: Auth<'_>) -> ApiError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(ErrorBody::into_message);
    let jwt_expired = message
        .as_deref()
        .is_some_and(|m| m.contains("JWT expired"));

    match auth {
        Auth::Login if status == StatusCode::UNAUTHORIZED => ApiError::InvalidCredentials,
        Auth::Bearer(_)
            if jwt_expired
                || status == StatusCode::UNAUTHORIZED
                || status == StatusCode::FORBIDDEN =>
        {
            ApiError::SessionExpired
        }
        _ if status == StatusCode::NOT_FOUND => {
            ApiError::NotFound(message.unwrap_or_else(|| "resource".to_string()))
        }
        _ => ApiError::Rejected(message.unwrap_or_else(|| format!("HTTP {}", status.as_u16()))),
    }
}

fn excerpt(body: &str) -> String {
    body.chars().take(500).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn token() -> BearerToken {
        BearerToken::new("h.p.s".to_string())
    }

    #[test]
    fn test_classify_login_unauthorized() {
        let err = classify(
            StatusCode::UNAUTHORIZED,
            r#"{"error":"Credenciales inválidas","status":401}"#,
            Auth::Login,
        );
        assert!(matches!(err, ApiError::InvalidCredentials));
    }

    #[test]
    fn test_classify_bearer_unauthorized_is_session_expired() {
        let token = token();
        let err = classify(StatusCode::FORBIDDEN, "", Auth::Bearer(&token));
        assert!(err.is_session_expired());
    }

    #[test]
    fn test_classify_jwt_expired_message() {
        let token = token();
        let err = classify(
            StatusCode::INTERNAL_SERVER_ERROR,
            r#"{"error":"JWT expired at 2026-01-01T00:00:00Z"}"#,
            Auth::Bearer(&token),
        );
        assert!(err.is_session_expired());
    }

    #[test]
    fn test_classify_anonymous_unauthorized_is_rejected() {
        let err = classify(StatusCode::UNAUTHORIZED, "", Auth::Anonymous);
        assert_eq!(err.user_message(), "HTTP 401");
    }

    #[test]
    fn test_classify_uses_body_message() {
        let err = classify(
            StatusCode::BAD_REQUEST,
            r#"{"error":"El email ya está registrado","field":"email"}"#,
            Auth::Anonymous,
        );
        assert_eq!(err.user_message(), "El email ya está registrado");

        let err = classify(
            StatusCode::BAD_REQUEST,
            r#"{"message":"Las contraseñas no coinciden"}"#,
            Auth::Anonymous,
        );
        assert_eq!(err.user_message(), "Las contraseñas no coinciden");
    }

    #[test]
    fn test_classify_not_found() {
        let token = token();
        let err = classify(StatusCode::NOT_FOUND, "<html>", Auth::Bearer(&token));
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[test]
    fn test_client_trims_base_url() {
        let client = ApiClient::new(&BackendConfig {
            base_url: "http://localhost:8080/api/".to_string(),
            timeout: Duration::from_secs(5),
        })
        .unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080/api");
        assert_eq!(client.url("/auth/login"), "http://localhost:8080/api/auth/login");
    }
}
