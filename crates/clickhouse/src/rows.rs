//! Row types mirroring the ClickHouse tables, with entity conversions.
//!
//! `DateTime64(3)` columns travel as milliseconds since epoch and `Date`
//! columns as days since epoch.

use std::collections::BTreeMap;

use analytics_core::{
    DailyAnalytics, DbErrorCode, Error, MenuItemActionRecord, MenuItemAnalytics, PageView, Result,
    StoreVisit, UserInteraction,
};
use chrono::{DateTime, NaiveDate, Utc};
use clickhouse::Row;
use serde::{Deserialize, Serialize};

fn epoch() -> NaiveDate {
    DateTime::<Utc>::UNIX_EPOCH.date_naive()
}

pub fn date_to_days(date: NaiveDate) -> u16 {
    (date - epoch()).num_days().clamp(0, u16::MAX as i64) as u16
}

pub fn days_to_date(days: u16) -> NaiveDate {
    epoch() + chrono::Days::new(days as u64)
}

pub fn millis_to_utc(millis: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis).ok_or_else(|| corrupt(format!("timestamp {}", millis)))
}

fn corrupt(what: impl std::fmt::Display) -> Error {
    Error::database(DbErrorCode::ReadFailed, format!("unreadable row: {}", what))
}

fn parse_column<T: std::str::FromStr>(value: &str) -> Result<T> {
    value.parse().map_err(|_| corrupt(value))
}

fn map_to_json(map: &BTreeMap<String, u64>) -> Result<String> {
    serde_json::to_string(map)
        .map_err(|e| Error::database(DbErrorCode::WriteFailed, format!("map column: {}", e)))
}

fn json_to_map(text: &str) -> Result<BTreeMap<String, u64>> {
    if text.is_empty() {
        return Ok(BTreeMap::new());
    }
    serde_json::from_str(text).map_err(|e| corrupt(format!("map column: {}", e)))
}

#[derive(Debug, Clone, Row, Serialize, Deserialize)]
pub struct StoreVisitRow {
    pub id: String,
    pub store_id: String,
    pub visitor_id: String,
    pub session_id: String,
    pub user_agent: Option<String>,
    pub device_type: String,
    pub browser: Option<String>,
    pub os: Option<String>,
    pub referrer: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub visit_date: u16,
    pub visit_timestamp: i64,
    pub page_views_count: u32,
    pub is_bounce: u8,
}

impl From<&StoreVisit> for StoreVisitRow {
    fn from(visit: &StoreVisit) -> Self {
        Self {
            id: visit.id.clone(),
            store_id: visit.store_id.clone(),
            visitor_id: visit.visitor_id.clone(),
            session_id: visit.session_id.clone(),
            user_agent: visit.user_agent.clone(),
            device_type: visit.device_type.as_str().to_string(),
            browser: visit.browser.clone(),
            os: visit.os.clone(),
            referrer: visit.referrer.clone(),
            country: visit.country.clone(),
            city: visit.city.clone(),
            visit_date: date_to_days(visit.visit_date),
            visit_timestamp: visit.visit_timestamp.timestamp_millis(),
            page_views_count: visit.page_views_count,
            is_bounce: u8::from(visit.is_bounce),
        }
    }
}

impl TryFrom<StoreVisitRow> for StoreVisit {
    type Error = Error;

    fn try_from(row: StoreVisitRow) -> Result<Self> {
        Ok(Self {
            id: row.id,
            store_id: row.store_id,
            visitor_id: row.visitor_id,
            session_id: row.session_id,
            user_agent: row.user_agent,
            device_type: row.device_type.parse().unwrap_or_default(),
            browser: row.browser,
            os: row.os,
            referrer: row.referrer,
            country: row.country,
            city: row.city,
            visit_date: days_to_date(row.visit_date),
            visit_timestamp: millis_to_utc(row.visit_timestamp)?,
            page_views_count: row.page_views_count,
            is_bounce: row.is_bounce != 0,
        })
    }
}

#[derive(Debug, Clone, Row, Serialize, Deserialize)]
pub struct PageViewRow {
    pub id: String,
    pub store_id: String,
    pub visitor_id: String,
    pub session_id: String,
    pub page_type: String,
    pub page_url: Option<String>,
    pub viewed_at: i64,
    pub time_on_page: Option<u32>,
    pub scroll_depth: Option<f64>,
}

impl From<&PageView> for PageViewRow {
    fn from(view: &PageView) -> Self {
        Self {
            id: view.id.clone(),
            store_id: view.store_id.clone(),
            visitor_id: view.visitor_id.clone(),
            session_id: view.session_id.clone(),
            page_type: view.page_type.clone(),
            page_url: view.page_url.clone(),
            viewed_at: view.viewed_at.timestamp_millis(),
            time_on_page: view.time_on_page,
            scroll_depth: view.scroll_depth,
        }
    }
}

impl TryFrom<PageViewRow> for PageView {
    type Error = Error;

    fn try_from(row: PageViewRow) -> Result<Self> {
        Ok(Self {
            id: row.id,
            store_id: row.store_id,
            visitor_id: row.visitor_id,
            session_id: row.session_id,
            page_type: row.page_type,
            page_url: row.page_url,
            viewed_at: millis_to_utc(row.viewed_at)?,
            time_on_page: row.time_on_page,
            scroll_depth: row.scroll_depth,
        })
    }
}

#[derive(Debug, Clone, Row, Serialize, Deserialize)]
pub struct UserInteractionRow {
    pub id: String,
    pub store_id: String,
    pub visitor_id: String,
    pub session_id: String,
    pub interaction_type: String,
    pub target_id: Option<String>,
    pub data: Option<String>, // JSON blob
    pub created_at: i64,
}

impl UserInteractionRow {
    pub fn try_from_interaction(interaction: &UserInteraction) -> Result<Self> {
        let data = interaction
            .data
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| Error::database(DbErrorCode::WriteFailed, format!("interaction data: {}", e)))?;

        Ok(Self {
            id: interaction.id.clone(),
            store_id: interaction.store_id.clone(),
            visitor_id: interaction.visitor_id.clone(),
            session_id: interaction.session_id.clone(),
            interaction_type: interaction.interaction_type.as_str().to_string(),
            target_id: interaction.target_id.clone(),
            data,
            created_at: interaction.created_at.timestamp_millis(),
        })
    }
}

impl TryFrom<UserInteractionRow> for UserInteraction {
    type Error = Error;

    fn try_from(row: UserInteractionRow) -> Result<Self> {
        let data = row
            .data
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .map_err(|e| corrupt(format!("interaction data: {}", e)))?;

        Ok(Self {
            interaction_type: parse_column(&row.interaction_type)?,
            id: row.id,
            store_id: row.store_id,
            visitor_id: row.visitor_id,
            session_id: row.session_id,
            target_id: row.target_id,
            data,
            created_at: millis_to_utc(row.created_at)?,
        })
    }
}

#[derive(Debug, Clone, Row, Serialize, Deserialize)]
pub struct MenuItemAnalyticsRow {
    pub id: String,
    pub store_id: String,
    pub menu_item_id: String,
    pub visitor_id: String,
    pub session_id: String,
    pub action_type: String,
    pub time_spent: Option<u32>,
    pub created_at: i64,
}

impl From<&MenuItemAnalytics> for MenuItemAnalyticsRow {
    fn from(action: &MenuItemAnalytics) -> Self {
        Self {
            id: action.id.clone(),
            store_id: action.store_id.clone(),
            menu_item_id: action.menu_item_id.clone(),
            visitor_id: action.visitor_id.clone(),
            session_id: action.session_id.clone(),
            action_type: action.action_type.as_str().to_string(),
            time_spent: action.time_spent,
            created_at: action.created_at.timestamp_millis(),
        }
    }
}

/// A menu item action joined with `menu_items`. Unmatched joins leave the
/// name empty and the category columns NULL.
#[derive(Debug, Clone, Row, Deserialize)]
pub struct MenuItemActionJoinRow {
    pub id: String,
    pub store_id: String,
    pub menu_item_id: String,
    pub visitor_id: String,
    pub session_id: String,
    pub action_type: String,
    pub time_spent: Option<u32>,
    pub created_at: i64,
    pub menu_item_name: String,
    pub category_id: Option<String>,
    pub category_name: Option<String>,
}

impl TryFrom<MenuItemActionJoinRow> for MenuItemActionRecord {
    type Error = Error;

    fn try_from(row: MenuItemActionJoinRow) -> Result<Self> {
        let menu_item_name = if row.menu_item_name.is_empty() {
            row.menu_item_id.clone()
        } else {
            row.menu_item_name
        };

        Ok(Self {
            action: MenuItemAnalytics {
                action_type: parse_column(&row.action_type)?,
                id: row.id,
                store_id: row.store_id,
                menu_item_id: row.menu_item_id,
                visitor_id: row.visitor_id,
                session_id: row.session_id,
                time_spent: row.time_spent,
                created_at: millis_to_utc(row.created_at)?,
            },
            menu_item_name,
            category_id: row.category_id.filter(|c| !c.is_empty()),
            category_name: row.category_name,
        })
    }
}

/// Catalog projection row.
#[derive(Debug, Clone, Row, Serialize, Deserialize)]
pub struct MenuItemRow {
    pub id: String,
    pub store_id: String,
    pub name: String,
    pub category_id: Option<String>,
    pub category_name: Option<String>,
    pub updated_at: i64,
}

impl MenuItemRow {
    pub fn new(store_id: impl Into<String>, id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            store_id: store_id.into(),
            name: name.into(),
            category_id: None,
            category_name: None,
            updated_at: Utc::now().timestamp_millis(),
        }
    }

    pub fn with_category(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.category_id = Some(id.into());
        self.category_name = Some(name.into());
        self
    }
}

#[derive(Debug, Clone, Row, Serialize, Deserialize)]
pub struct DailyAnalyticsRow {
    pub id: String,
    pub store_id: String,
    pub date: u16,
    pub total_visits: u64,
    pub unique_visitors: u64,
    pub total_page_views: u64,
    pub avg_session_duration: f64,
    pub bounce_rate: f64,
    pub email_clicks: u64,
    pub phone_clicks: u64,
    pub whatsapp_clicks: u64,
    pub map_clicks: u64,
    pub social_clicks: u64,
    pub share_clicks: u64,
    pub menu_item_clicks: u64,
    pub mobile_visits: u64,
    pub desktop_visits: u64,
    pub tablet_visits: u64,
    pub top_countries: String,
    pub top_cities: String,
    pub peak_hours: String,
}

impl DailyAnalyticsRow {
    pub fn try_from_daily(daily: &DailyAnalytics) -> Result<Self> {
        Ok(Self {
            id: daily.id.clone(),
            store_id: daily.store_id.clone(),
            date: date_to_days(daily.date),
            total_visits: daily.total_visits,
            unique_visitors: daily.unique_visitors,
            total_page_views: daily.total_page_views,
            avg_session_duration: daily.avg_session_duration,
            bounce_rate: daily.bounce_rate,
            email_clicks: daily.email_clicks,
            phone_clicks: daily.phone_clicks,
            whatsapp_clicks: daily.whatsapp_clicks,
            map_clicks: daily.map_clicks,
            social_clicks: daily.social_clicks,
            share_clicks: daily.share_clicks,
            menu_item_clicks: daily.menu_item_clicks,
            mobile_visits: daily.mobile_visits,
            desktop_visits: daily.desktop_visits,
            tablet_visits: daily.tablet_visits,
            top_countries: map_to_json(&daily.top_countries)?,
            top_cities: map_to_json(&daily.top_cities)?,
            peak_hours: map_to_json(&daily.peak_hours)?,
        })
    }
}

impl TryFrom<DailyAnalyticsRow> for DailyAnalytics {
    type Error = Error;

    fn try_from(row: DailyAnalyticsRow) -> Result<Self> {
        Ok(Self {
            top_countries: json_to_map(&row.top_countries)?,
            top_cities: json_to_map(&row.top_cities)?,
            peak_hours: json_to_map(&row.peak_hours)?,
            id: row.id,
            store_id: row.store_id,
            date: days_to_date(row.date),
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
        })
    }
}
