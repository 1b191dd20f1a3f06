//! Serialization of daily rollups for download.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use csv::WriterBuilder;
use serde::{Deserialize, Serialize};

use crate::entities::DailyAnalytics;
use crate::error::{Error, Result};
use crate::period::Period;
use crate::summary::AnalyticsFilters;

/// Export output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
}

impl ExportFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Csv => "text/csv",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            other => Err(Error::validation(format!("unsupported export format: {}", other))),
        }
    }
}

/// Export request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExportOptions {
    #[serde(default)]
    pub format: ExportFormat,
    #[serde(default)]
    pub period: Period,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl ExportOptions {
    pub fn new(format: ExportFormat, period: Period) -> Self {
        Self {
            format,
            period,
            start_date: None,
            end_date: None,
        }
    }

    pub fn filters(&self) -> AnalyticsFilters {
        AnalyticsFilters {
            period: self.period,
            start_date: self.start_date,
            end_date: self.end_date,
        }
    }
}

/// Flat CSV row; map-valued fields are embedded as JSON text.
#[derive(Debug, Clone, Serialize)]
struct DailyAnalyticsCsvRow<'a> {
    id: &'a str,
    store_id: &'a str,
    date: String,
    total_visits: u64,
    unique_visitors: u64,
    total_page_views: u64,
    avg_session_duration: f64,
    bounce_rate: f64,
    email_clicks: u64,
    phone_clicks: u64,
    whatsapp_clicks: u64,
    map_clicks: u64,
    social_clicks: u64,
    share_clicks: u64,
    menu_item_clicks: u64,
    mobile_visits: u64,
    desktop_visits: u64,
    tablet_visits: u64,
    top_countries: String,
    top_cities: String,
    peak_hours: String,
}

impl<'a> DailyAnalyticsCsvRow<'a> {
    fn try_from_row(row: &'a DailyAnalytics) -> Result<Self> {
        Ok(Self {
            id: &row.id,
            store_id: &row.store_id,
            date: row.date.to_string(),
            total_visits: row.total_visits,
            unique_visitors: row.unique_visitors,
            total_page_views: row.total_page_views,
            avg_session_duration: row.avg_session_duration,
            bounce_rate: row.bounce_rate,
            email_clicks: row.email_clicks,
            phone_clicks: row.phone_clicks,
            whatsapp_clicks: row.whatsapp_clicks,
            map_clicks: row.map_clicks,
            social_clicks: row.social_clicks,
            share_clicks: row.share_clicks,
            menu_item_clicks: row.menu_item_clicks,
            mobile_visits: row.mobile_visits,
            desktop_visits: row.desktop_visits,
            tablet_visits: row.tablet_visits,
            top_countries: map_json(&row.top_countries)?,
            top_cities: map_json(&row.top_cities)?,
            peak_hours: map_json(&row.peak_hours)?,
        })
    }
}

fn map_json(map: &BTreeMap<String, u64>) -> Result<String> {
    Ok(serde_json::to_string(map)?)
}

/// Serializes rows in the requested format.
pub fn export_rows(rows: &[DailyAnalytics], format: ExportFormat) -> Result<String> {
    match format {
        ExportFormat::Json => to_json(rows),
        ExportFormat::Csv => to_csv(rows),
    }
}

/// Pretty-printed JSON array.
pub fn to_json(rows: &[DailyAnalytics]) -> Result<String> {
    Ok(serde_json::to_string_pretty(rows)?)
}

/// CSV with a header row; empty input yields an empty string.
pub fn to_csv(rows: &[DailyAnalytics]) -> Result<String> {
    if rows.is_empty() {
        return Ok(String::new());
    }

    let mut writer = WriterBuilder::new().has_headers(true).from_writer(Vec::new());
    for row in rows {
        writer.serialize(DailyAnalyticsCsvRow::try_from_row(row)?)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| Error::export(format!("failed to flush CSV: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| Error::export(format!("CSV is not UTF-8: {}", e)))
}
