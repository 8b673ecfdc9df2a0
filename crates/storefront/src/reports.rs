//! Admin report data: date ranges, export formats, and the dashboard loader.

use chrono::{Duration, NaiveDate};
use thiserror::Error;

use crate::api::types::{ReportSummary, SalesByDate, TopItem};
use crate::api::{ApiClient, ApiError};
use crate::token::BearerToken;

/// How many rows the top-products / top-services sections show.
pub const TOP_LIMIT: u32 = 10;

/// Days before today covered by the default range.
const DEFAULT_RANGE_DAYS: i64 = 30;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeError {
    #[error("Please select both a start and an end date")]
    Incomplete,
    #[error("Invalid date: {0}")]
    InvalidDate(String),
    #[error("The start date cannot be after the end date")]
    StartAfterEnd,
}

/// Inclusive reporting period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    /// From 30 days before `today` through `today`.
    #[must_use]
    pub fn last_30_days(today: NaiveDate) -> Self {
        Self {
            from: today - Duration::days(DEFAULT_RANGE_DAYS),
            to: today,
        }
    }

    /// Parse a range from optional `YYYY-MM-DD` query values.
    ///
    /// With neither value present the default range is used.
    ///
    /// # Errors
    ///
    /// Returns `RangeError` if only one date is given, a date is malformed,
    /// or the start is after the end.
    pub fn parse(
        from: Option<&str>,
        to: Option<&str>,
        today: NaiveDate,
    ) -> Result<Self, RangeError> {
        let from = from.map(str::trim).filter(|s| !s.is_empty());
        let to = to.map(str::trim).filter(|s| !s.is_empty());

        let (from, to) = match (from, to) {
            (None, None) => return Ok(Self::last_30_days(today)),
            (Some(from), Some(to)) => (parse_date(from)?, parse_date(to)?),
            _ => return Err(RangeError::Incomplete),
        };

        if from > to {
            return Err(RangeError::StartAfterEnd);
        }
        Ok(Self { from, to })
    }

    #[must_use]
    pub fn from_param(&self) -> String {
        self.from.format(DATE_FORMAT).to_string()
    }

    #[must_use]
    pub fn to_param(&self) -> String {
        self.to.format(DATE_FORMAT).to_string()
    }

    /// `fechaInicio` / `fechaFin` query pairs for the report endpoints.
    #[must_use]
    pub fn query_params(&self) -> [(&'static str, String); 2] {
        [
            ("fechaInicio", self.from_param()),
            ("fechaFin", self.to_param()),
        ]
    }
}

fn parse_date(value: &str) -> Result<NaiveDate, RangeError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|_| RangeError::InvalidDate(value.to_string()))
}

/// Report download format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Excel,
    Pdf,
}

impl ExportFormat {
    /// Parse the route segment (`excel` / `pdf`).
    #[must_use]
    pub fn from_segment(segment: &str) -> Option<Self> {
        match segment.to_ascii_lowercase().as_str() {
            "excel" | "xlsx" => Some(Self::Excel),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    #[must_use]
    pub const fn path_segment(self) -> &'static str {
        match self {
            Self::Excel => "excel",
            Self::Pdf => "pdf",
        }
    }

    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Excel => "xlsx",
            Self::Pdf => "pdf",
        }
    }

    /// Content type used when the backend does not send one.
    #[must_use]
    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Excel => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            Self::Pdf => "application/pdf",
        }
    }

    /// `Reporte_AppleGym_<from>_<to>.<ext>`.
    #[must_use]
    pub fn filename(self, range: &DateRange) -> String {
        format!(
            "Reporte_AppleGym_{}_{}.{}",
            range.from_param(),
            range.to_param(),
            self.extension()
        )
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_segment(s).ok_or_else(|| format!("unknown export format: {s}"))
    }
}

/// Everything the dashboard renders. Sections that failed to load are empty.
#[derive(Debug, Clone, Default)]
pub struct DashboardData {
    pub summary: ReportSummary,
    pub sales_by_date: Vec<SalesByDate>,
    pub top_products: Vec<TopItem>,
    pub top_services: Vec<TopItem>,
    /// Sections that could not be loaded, for a warning banner.
    pub failed_sections: Vec<&'static str>,
}

/// Load every dashboard section concurrently.
///
/// A section that fails is logged and left empty.
///
/// # Errors
///
/// Returns `ApiError::SessionExpired` if any section reports the token as
/// expired, so the caller can sign the admin out.
pub async fn load_dashboard(
    api: &ApiClient,
    token: &BearerToken,
    range: &DateRange,
) -> Result<DashboardData, ApiError> {
    let (summary, sales_by_date, top_products, top_services) = tokio::join!(
        api.report_summary(token),
        api.sales_by_date(token, range),
        api.top_products(token, TOP_LIMIT),
        api.top_services(token, TOP_LIMIT),
    );

    let mut failed = Vec::new();
    let summary = section("summary", summary, &mut failed)?;
    let sales_by_date = section("sales_by_date", sales_by_date, &mut failed)?;
    let top_products = section("top_products", top_products, &mut failed)?;
    let top_services = section("top_services", top_services, &mut failed)?;

    Ok(DashboardData {
        summary,
        sales_by_date,
        top_products,
        top_services,
        failed_sections: failed,
    })
}

fn section<T: Default>(
    name: &'static str,
    result: Result<T, ApiError>,
    failed: &mut Vec<&'static str>,
) -> Result<T, ApiError> {
    match result {
        Ok(value) => Ok(value),
        Err(ApiError::SessionExpired) => Err(ApiError::SessionExpired),
        Err(e) => {
            tracing::error!(section = name, "Failed to load dashboard section: {e}");
            failed.push(name);
            Ok(T::default())
        }
    }
}
