//! Backend connectivity check.
//!
//! ```bash
//! APPLEGYM_API_URL=http://localhost:8080/api ag-cli ping
//! ```

use applegym_storefront::api::{ApiClient, ApiError};
use applegym_storefront::config::{BackendConfig, ConfigError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PingError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Backend unreachable: {0}")]
    Api(#[from] ApiError),
}

/// Call the backend's hello endpoint and log its answer.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the call fails.
pub async fn run() -> Result<(), PingError> {
    let config = BackendConfig::from_env()?;
    let client = ApiClient::new(&config)?;

    tracing::info!("Pinging {}...", client.base_url());
    let message = client.ping().await?;
    tracing::info!("Backend is up: {message}");
    Ok(())
}
