//! Report export.
//!
//! # Usage
//!
//! ```bash
//! # Last 30 days as Excel, written to Reporte_AppleGym_<from>_<to>.xlsx
//! ag-cli report export --format excel
//!
//! # A fixed range as PDF
//! ag-cli report export --format pdf --from 2026-01-01 --to 2026-01-31 -o enero.pdf
//! ```
//!
//! # Environment Variables
//!
//! - `APPLEGYM_API_URL` - Backend base URL
//! - `APPLEGYM_ADMIN_EMAIL` - Admin account used to sign in
//! - `APPLEGYM_ADMIN_PASSWORD` - Its password

use std::path::{Path, PathBuf};

use applegym_core::{Email, EmailError, Role};
use applegym_storefront::api::{ApiClient, ApiError};
use applegym_storefront::config::{BackendConfig, ConfigError};
use applegym_storefront::reports::{DateRange, ExportFormat, RangeError};
use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Invalid admin email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Range(#[from] RangeError),

    #[error("Backend error: {0}")]
    Api(#[from] ApiError),

    #[error("Account {0} is not an administrator")]
    NotAdmin(String),

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

fn required_env(key: &'static str) -> Result<String, ReportError> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or(ReportError::MissingEnvVar(key))
}

/// Sign in as the configured admin and download a report.
///
/// Returns the path written.
///
/// # Errors
///
/// Returns an error if credentials are missing or rejected, the range is
/// invalid, the download fails, or the file cannot be written.
pub async fn export(
    format: ExportFormat,
    from: Option<&str>,
    to: Option<&str>,
    output: Option<&Path>,
) -> Result<PathBuf, ReportError> {
    dotenvy::dotenv().ok();

    let range = DateRange::parse(from, to, Utc::now().date_naive())?;
    let email = Email::parse(&required_env("APPLEGYM_ADMIN_EMAIL")?)?;
    let password = SecretString::from(required_env("APPLEGYM_ADMIN_PASSWORD")?);

    let client = ApiClient::new(&BackendConfig::from_env()?)?;

    tracing::info!("Signing in as {email}...");
    let login = client.login(&email, password.expose_secret()).await?;
    if login.cliente.rol != Role::Admin {
        return Err(ReportError::NotAdmin(email.to_string()));
    }

    tracing::info!(
        "Downloading {} report for {} to {}...",
        format.extension(),
        range.from_param(),
        range.to_param()
    );
    let download = client
        .export_report(&login.access_token, format, &range)
        .await?;

    let path = output.map_or_else(|| PathBuf::from(format.filename(&range)), Path::to_path_buf);
    tokio::fs::write(&path, &download.bytes)
        .await
        .map_err(|source| ReportError::Write {
            path: path.clone(),
            source,
        })?;

    tracing::info!("Wrote {} bytes to {}", download.bytes.len(), path.display());
    Ok(path)
}
