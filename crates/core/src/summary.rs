//! Report shapes returned to the dashboard.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::entities::UserInteraction;
use crate::period::{DateRange, Period};

/// Dashboard filter: a period token plus optional custom bounds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsFilters {
    #[serde(default)]
    pub period: Period,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl AnalyticsFilters {
    pub fn period(period: Period) -> Self {
        Self {
            period,
            start_date: None,
            end_date: None,
        }
    }

    pub fn custom(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            period: Period::Custom,
            start_date: Some(start),
            end_date: Some(end),
        }
    }
}

/// Visits per device class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceBreakdown {
    pub mobile: u64,
    pub desktop: u64,
    pub tablet: u64,
}

/// One chart point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyTrend {
    pub date: NaiveDate,
    pub visits: u64,
    pub page_views: u64,
    pub interactions: u64,
}

/// Occurrences of one interaction type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionCount {
    #[serde(rename = "type")]
    pub interaction_type: String,
    pub count: u64,
}

/// A labelled count (country, city).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelCount {
    pub label: String,
    pub count: u64,
}

/// Visits within one hour of the day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourCount {
    pub hour: u8,
    pub count: u64,
}

/// Folded statistics for a store over a date range.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsSummary {
    pub total_visits: u64,
    /// Approximation: equals `total_visits`, not a distinct-visitor count.
    pub unique_visitors: u64,
    pub total_page_views: u64,
    /// Seconds, unweighted mean of daily averages
    pub avg_session_duration: f64,
    /// Percentage 0-100
    pub bounce_rate: f64,
    pub total_interactions: u64,
    pub top_countries: Vec<LabelCount>,
    pub top_cities: Vec<LabelCount>,
    pub device_breakdown: DeviceBreakdown,
    pub peak_hours: Vec<HourCount>,
    pub daily_trends: Vec<DailyTrend>,
    pub top_interactions: Vec<InteractionCount>,
}

/// Engagement of a single menu item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItemPerformance {
    pub menu_item_id: String,
    pub menu_item_name: String,
    pub category_name: Option<String>,
    pub views: u64,
    pub clicks: u64,
    /// Seconds accumulated over hover actions
    pub hover_time: u64,
    pub shares: u64,
    pub engagement_rate: f64,
}

/// Engagement of a category, folded over its menu items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryPerformance {
    pub category_id: String,
    pub category_name: String,
    pub total_views: u64,
    pub total_clicks: u64,
    pub total_shares: u64,
    /// Distinct menu items with activity
    pub items_count: u64,
    pub engagement_rate: f64,
}

/// Views of one page type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageCount {
    pub page_type: String,
    pub views: u64,
}

/// Unbucketed "right now" snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RealTimeAnalytics {
    /// Distinct sessions started in the last 30 minutes
    pub current_visitors: u64,
    pub today_visits: u64,
    pub today_interactions: u64,
    pub top_pages: Vec<PageCount>,
    pub recent_interactions: Vec<UserInteraction>,
}

/// Headline totals for one range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PeriodTotals {
    pub total_visits: u64,
    pub total_page_views: u64,
    pub total_interactions: u64,
}

impl From<&AnalyticsSummary> for PeriodTotals {
    fn from(summary: &AnalyticsSummary) -> Self {
        Self {
            total_visits: summary.total_visits,
            total_page_views: summary.total_page_views,
            total_interactions: summary.total_interactions,
        }
    }
}

/// Current range against the preceding range of equal length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodComparison {
    pub range: DateRange,
    pub previous_range: DateRange,
    pub current: AnalyticsSummary,
    pub previous: PeriodTotals,
    pub visits_growth: f64,
    pub page_views_growth: f64,
    pub interactions_growth: f64,
}
