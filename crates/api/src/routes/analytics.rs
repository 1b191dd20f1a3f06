//! Dashboard report endpoints.

use analytics_core::{
    AnalyticsFilters, AnalyticsSummary, CategoryPerformance, ExportFormat, ExportOptions,
    MenuItemPerformance, Period, PeriodComparison, RealTimeAnalytics,
};
use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;

use crate::response::ApiError;
use crate::state::AppState;

/// Query string shared by the report endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    pub period: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub format: Option<String>,
}

impl ReportQuery {
    /// Unknown period tokens fall back to the default period.
    pub fn filters(&self) -> AnalyticsFilters {
        AnalyticsFilters {
            period: self
                .period
                .as_deref()
                .map(Period::from_token)
                .unwrap_or_default(),
            start_date: self.start_date,
            end_date: self.end_date,
        }
    }

    pub fn export_options(&self) -> Result<ExportOptions, ApiError> {
        let format = match self.format.as_deref() {
            Some(format) => format.parse::<ExportFormat>()?,
            None => ExportFormat::default(),
        };
        let filters = self.filters();
        Ok(ExportOptions {
            format,
            period: filters.period,
            start_date: filters.start_date,
            end_date: filters.end_date,
        })
    }
}

/// GET /stores/:store_id/analytics/summary
pub async fn summary_handler(
    State(state): State<AppState>,
    Path(store_id): Path<String>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<AnalyticsSummary>, ApiError> {
    let summary = state
        .analytics
        .get_analytics_summary(&store_id, &query.filters())
        .await?;
    Ok(Json(summary))
}

/// GET /stores/:store_id/analytics/menu-items
pub async fn menu_items_handler(
    State(state): State<AppState>,
    Path(store_id): Path<String>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<Vec<MenuItemPerformance>>, ApiError> {
    let items = state
        .analytics
        .get_menu_item_performance(&store_id, &query.filters())
        .await?;
    Ok(Json(items))
}

/// GET /stores/:store_id/analytics/categories
pub async fn categories_handler(
    State(state): State<AppState>,
    Path(store_id): Path<String>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<Vec<CategoryPerformance>>, ApiError> {
    let categories = state
        .analytics
        .get_category_performance(&store_id, &query.filters())
        .await?;
    Ok(Json(categories))
}

/// GET /stores/:store_id/analytics/realtime
pub async fn realtime_handler(
    State(state): State<AppState>,
    Path(store_id): Path<String>,
) -> Result<Json<RealTimeAnalytics>, ApiError> {
    Ok(Json(state.analytics.get_real_time_analytics(&store_id).await?))
}

/// GET /stores/:store_id/analytics/comparison
pub async fn comparison_handler(
    State(state): State<AppState>,
    Path(store_id): Path<String>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<PeriodComparison>, ApiError> {
    let comparison = state
        .analytics
        .get_period_comparison(&store_id, &query.filters())
        .await?;
    Ok(Json(comparison))
}

/// GET /stores/:store_id/analytics/export
///
/// Responds with the serialized rollups as a download.
pub async fn export_handler(
    State(state): State<AppState>,
    Path(store_id): Path<String>,
    Query(query): Query<ReportQuery>,
) -> Result<Response, ApiError> {
    let options = query.export_options()?;
    let body = state.analytics.export_analytics(&store_id, &options).await?;

    let filename = format!(
        "analytics-{}-{}.{}",
        sanitize_filename(&store_id),
        Local::now().date_naive(),
        options.format.extension()
    );

    Ok((
        [
            (header::CONTENT_TYPE, options.format.content_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
        .into_response())
}

fn sanitize_filename(value: &str) -> String {
    value
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}
