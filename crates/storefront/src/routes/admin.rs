//! Admin reports dashboard and report export.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Redirect, Response},
};
use chrono::{Local, Utc};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::api::ApiError;
use crate::api::types::{ReportSummary, SalesByDate, TopItem};
use crate::charts::{BarChart, LineChart};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::flash;
use crate::middleware::RequireAdmin;
use crate::reports::{DateRange, ExportFormat, load_dashboard};
use crate::routes::{Layout, session_expired};
use crate::state::AppState;

/// `?from=YYYY-MM-DD&to=YYYY-MM-DD`.
#[derive(Debug, Default, Deserialize)]
pub struct RangeQuery {
    pub from: Option<String>,
    pub to: Option<String>,
}

impl RangeQuery {
    fn parse(&self) -> std::result::Result<DateRange, crate::reports::RangeError> {
        DateRange::parse(
            self.from.as_deref(),
            self.to.as_deref(),
            Utc::now().date_naive(),
        )
    }
}

/// One of the summary cards at the top of the dashboard.
#[derive(Debug, Clone)]
pub struct SummaryCard {
    pub label: &'static str,
    pub value: String,
    pub icon: &'static str,
}

fn summary_cards(summary: &ReportSummary) -> Vec<SummaryCard> {
    let count = |n: Option<u64>| n.unwrap_or(0).to_string();
    vec![
        SummaryCard {
            label: "Total sales",
            value: summary.ventas_totales.unwrap_or_default().display(),
            icon: "fas fa-dollar-sign",
        },
        SummaryCard {
            label: "Orders",
            value: count(summary.total_ventas),
            icon: "fas fa-shopping-bag",
        },
        SummaryCard {
            label: "Clients",
            value: count(summary.total_clientes),
            icon: "fas fa-users",
        },
        SummaryCard {
            label: "Products",
            value: count(summary.total_productos),
            icon: "fas fa-box",
        },
    ]
}

/// Row of the sales-by-date table.
#[derive(Debug, Clone)]
pub struct SalesRow {
    pub date: String,
    pub orders: u64,
    pub total: String,
}

impl From<&SalesByDate> for SalesRow {
    fn from(row: &SalesByDate) -> Self {
        Self {
            date: row.fecha.clone(),
            orders: row.cantidad_ventas,
            total: row.total_ventas.display(),
        }
    }
}

/// Ranked row of a top-items table.
#[derive(Debug, Clone)]
pub struct TopRow {
    pub rank: usize,
    pub name: String,
    pub category: String,
    pub sold: u64,
    pub total: String,
}

fn top_rows(items: &[TopItem]) -> Vec<TopRow> {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| TopRow {
            rank: i + 1,
            name: item.nombre.clone(),
            category: item.categoria.clone().unwrap_or_default(),
            sold: item.cantidad_vendida,
            total: item.total_ventas.display(),
        })
        .collect()
}

fn bar_chart(items: &[TopItem]) -> Option<BarChart> {
    let series: Vec<(String, u64)> = items
        .iter()
        .map(|item| (item.nombre.clone(), item.cantidad_vendida))
        .collect();
    BarChart::build(&series).unwrap_or_else(|e| {
        tracing::error!("Top items chart: {e}");
        None
    })
}

fn sales_chart(rows: &[SalesByDate]) -> Option<LineChart> {
    let series: Vec<(String, f64)> = rows
        .iter()
        .map(|row| (row.fecha.clone(), row.total_ventas.to_f64()))
        .collect();
    LineChart::build(&series).unwrap_or_else(|e| {
        tracing::error!("Sales chart: {e}");
        None
    })
}

/// Dashboard page template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/dashboard.html")]
pub struct DashboardTemplate {
    pub layout: Layout,
    pub from: String,
    pub to: String,
    pub cards: Vec<SummaryCard>,
    pub sales_chart: Option<LineChart>,
    pub sales_rows: Vec<SalesRow>,
    pub products_chart: Option<BarChart>,
    pub top_products: Vec<TopRow>,
    pub services_chart: Option<BarChart>,
    pub top_services: Vec<TopRow>,
    pub failed_sections: Vec<&'static str>,
    pub updated_at: String,
    pub excel_url: String,
    pub pdf_url: String,
}

fn export_url(format: ExportFormat, range: &DateRange) -> String {
    format!(
        "/admin/reports/export/{}?from={}&to={}",
        format.path_segment(),
        range.from_param(),
        range.to_param()
    )
}

/// Reports dashboard.
#[instrument(skip(state, session, user))]
pub async fn dashboard(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(user): RequireAdmin,
    Query(query): Query<RangeQuery>,
) -> Result<Response> {
    let range = match query.parse() {
        Ok(range) => range,
        Err(e) => {
            flash::warning(&session, e.to_string()).await;
            DateRange::last_30_days(Utc::now().date_naive())
        }
    };

    let data = match load_dashboard(state.api(), &user.token, &range).await {
        Ok(data) => data,
        Err(ApiError::SessionExpired) => return Ok(session_expired(&session).await),
        Err(e) => return Err(e.into()),
    };

    Ok(DashboardTemplate {
        from: range.from_param(),
        to: range.to_param(),
        cards: summary_cards(&data.summary),
        sales_chart: sales_chart(&data.sales_by_date),
        sales_rows: data.sales_by_date.iter().map(SalesRow::from).collect(),
        products_chart: bar_chart(&data.top_products),
        top_products: top_rows(&data.top_products),
        services_chart: bar_chart(&data.top_services),
        top_services: top_rows(&data.top_services),
        failed_sections: data.failed_sections,
        updated_at: Local::now().format("%H:%M").to_string(),
        excel_url: export_url(ExportFormat::Excel, &range),
        pdf_url: export_url(ExportFormat::Pdf, &range),
        layout: Layout::load(&session, Some(&user), "/admin").await,
    }
    .into_response())
}

/// Stream an Excel or PDF report from the backend.
#[instrument(skip(state, session, user, query))]
pub async fn export(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(user): RequireAdmin,
    Path(format): Path<String>,
    Query(query): Query<RangeQuery>,
) -> Result<Response> {
    let format = ExportFormat::from_segment(&format)
        .ok_or_else(|| AppError::NotFound(format!("export format {format}")))?;

    let range = match query.parse() {
        Ok(range) => range,
        Err(e) => {
            flash::warning(&session, e.to_string()).await;
            return Ok(Redirect::to("/admin").into_response());
        }
    };

    match state.api().export_report(&user.token, format, &range).await {
        Ok(download) => {
            add_breadcrumb(
                "reports",
                "Exported report",
                Some(&[("format", format.extension())]),
            );
            let content_type = download
                .content_type
                .unwrap_or_else(|| format.content_type().to_string());
            Ok((
                [
                    (header::CONTENT_TYPE, content_type),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("attachment; filename=\"{}\"", format.filename(&range)),
                    ),
                ],
                download.bytes,
            )
                .into_response())
        }
        Err(ApiError::SessionExpired) => Ok(session_expired(&session).await),
        Err(e) => {
            tracing::error!("Report export failed: {e}");
            let message = format!("The report could not be exported: {}", e.user_message());
            flash::error(&session, message).await;
            Ok(Redirect::to("/admin").into_response())
        }
    }
}
