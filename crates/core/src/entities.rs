//! Stored analytics entities and the partial drafts they are built from.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::Error;
use crate::identity::IdentityContext;

/// Id carried by records whose write failed.
pub const PLACEHOLDER_ID: &str = "error";

/// Page type recorded when the caller does not name one.
pub const DEFAULT_PAGE_TYPE: &str = "store_main";

/// Discrete user actions on a storefront.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionType {
    EmailClick,
    PhoneClick,
    WhatsappClick,
    MapClick,
    SocialClick,
    ShareClick,
    MenuItemClick,
    CategoryClick,
}

impl InteractionType {
    pub const ALL: [InteractionType; 8] = [
        Self::EmailClick,
        Self::PhoneClick,
        Self::WhatsappClick,
        Self::MapClick,
        Self::SocialClick,
        Self::ShareClick,
        Self::MenuItemClick,
        Self::CategoryClick,
    ];

    /// Returns the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EmailClick => "email_click",
            Self::PhoneClick => "phone_click",
            Self::WhatsappClick => "whatsapp_click",
            Self::MapClick => "map_click",
            Self::SocialClick => "social_click",
            Self::ShareClick => "share_click",
            Self::MenuItemClick => "menu_item_click",
            Self::CategoryClick => "category_click",
        }
    }
}

impl fmt::Display for InteractionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InteractionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| Error::validation(format!("unknown interaction type: {}", s)))
    }
}

/// Actions scoped to a single menu item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MenuItemAction {
    View,
    Click,
    Hover,
    Share,
}

impl MenuItemAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Click => "click",
            Self::Hover => "hover",
            Self::Share => "share",
        }
    }
}

impl FromStr for MenuItemAction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "view" => Ok(Self::View),
            "click" => Ok(Self::Click),
            "hover" => Ok(Self::Hover),
            "share" => Ok(Self::Share),
            other => Err(Error::validation(format!("unknown menu item action: {}", other))),
        }
    }
}

/// Device classification of a visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Mobile,
    Desktop,
    Tablet,
    Bot,
    #[default]
    Unknown,
}

impl DeviceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mobile => "mobile",
            Self::Desktop => "desktop",
            Self::Tablet => "tablet",
            Self::Bot => "bot",
            Self::Unknown => "unknown",
        }
    }
}

impl FromStr for DeviceType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mobile" => Ok(Self::Mobile),
            "desktop" => Ok(Self::Desktop),
            "tablet" => Ok(Self::Tablet),
            "bot" => Ok(Self::Bot),
            "unknown" | "" => Ok(Self::Unknown),
            other => Err(Error::validation(format!("unknown device type: {}", other))),
        }
    }
}

/// One visitor session start on a store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreVisit {
    pub id: String,
    pub store_id: String,
    pub visitor_id: String,
    pub session_id: String,
    pub user_agent: Option<String>,
    pub device_type: DeviceType,
    pub browser: Option<String>,
    pub os: Option<String>,
    pub referrer: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    /// Local calendar day used for bucketing
    pub visit_date: NaiveDate,
    pub visit_timestamp: DateTime<Utc>,
    pub page_views_count: u32,
    /// True until the session records an interaction
    pub is_bounce: bool,
}

/// One page render within a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageView {
    pub id: String,
    pub store_id: String,
    pub visitor_id: String,
    pub session_id: String,
    pub page_type: String,
    pub page_url: Option<String>,
    pub viewed_at: DateTime<Utc>,
    /// Seconds
    pub time_on_page: Option<u32>,
    /// Percentage 0-100
    pub scroll_depth: Option<f64>,
}

/// One discrete storefront action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInteraction {
    pub id: String,
    pub store_id: String,
    pub visitor_id: String,
    pub session_id: String,
    pub interaction_type: InteractionType,
    pub target_id: Option<String>,
    pub data: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// One view/click/hover/share on a menu item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItemAnalytics {
    pub id: String,
    pub store_id: String,
    pub menu_item_id: String,
    pub visitor_id: String,
    pub session_id: String,
    pub action_type: MenuItemAction,
    /// Seconds, hover only
    pub time_spent: Option<u32>,
    pub created_at: DateTime<Utc>,
}

/// A menu item action joined with the item's catalog names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItemActionRecord {
    #[serde(flatten)]
    pub action: MenuItemAnalytics,
    pub menu_item_name: String,
    pub category_id: Option<String>,
    pub category_name: Option<String>,
}

/// Pre-aggregated rollup for one store and one calendar day.
///
/// Produced by the external rollup job; at most one row per `(store_id, date)`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DailyAnalytics {
    pub id: String,
    pub store_id: String,
    pub date: NaiveDate,
    pub total_visits: u64,
    pub unique_visitors: u64,
    pub total_page_views: u64,
    /// Seconds
    pub avg_session_duration: f64,
    /// Percentage 0-100
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
    #[serde(default)]
    pub top_countries: BTreeMap<String, u64>,
    #[serde(default)]
    pub top_cities: BTreeMap<String, u64>,
    #[serde(default)]
    pub peak_hours: BTreeMap<String, u64>,
}

impl DailyAnalytics {
    /// An empty rollup for a day without data.
    pub fn empty(store_id: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            store_id: store_id.into(),
            date,
            ..Default::default()
        }
    }

    /// Sum of the contact and share click counters.
    pub fn total_interactions(&self) -> u64 {
        self.email_clicks
            + self.phone_clicks
            + self.whatsapp_clicks
            + self.map_clicks
            + self.social_clicks
            + self.share_clicks
    }

    /// Bounced sessions reconstructed from the stored percentage.
    pub fn bounced_sessions(&self) -> u64 {
        (self.bounce_rate / 100.0 * self.total_visits as f64).round() as u64
    }
}

/// Partial visit supplied by the storefront.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct VisitDraft {
    #[validate(length(min = 1, max = 128))]
    pub store_id: String,
    #[validate(length(max = 2048))]
    pub referrer: Option<String>,
    #[validate(length(max = 512))]
    pub user_agent: Option<String>,
    #[validate(length(max = 100))]
    pub country: Option<String>,
    #[validate(length(max = 100))]
    pub city: Option<String>,
}

impl VisitDraft {
    pub fn new(store_id: impl Into<String>) -> Self {
        Self {
            store_id: store_id.into(),
            ..Default::default()
        }
    }

    /// Builds the visit row; device fields are left for enrichment.
    pub fn into_visit(self, identity: &IdentityContext, now: DateTime<Utc>) -> StoreVisit {
        StoreVisit {
            id: String::new(),
            store_id: self.store_id,
            visitor_id: identity.visitor_id.clone(),
            session_id: identity.session_id.clone(),
            user_agent: self.user_agent,
            device_type: DeviceType::Unknown,
            browser: None,
            os: None,
            referrer: self.referrer.filter(|r| !r.is_empty()),
            country: self.country,
            city: self.city,
            visit_date: now.with_timezone(&Local).date_naive(),
            visit_timestamp: now,
            page_views_count: 1,
            is_bounce: true,
        }
    }
}

/// Partial page view supplied by the storefront.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct PageViewDraft {
    #[validate(length(min = 1, max = 128))]
    pub store_id: String,
    #[validate(length(min = 1, max = 64))]
    pub page_type: Option<String>,
    #[validate(length(max = 2048))]
    pub page_url: Option<String>,
    pub time_on_page: Option<u32>,
    #[validate(range(min = 0.0, max = 100.0))]
    pub scroll_depth: Option<f64>,
}

impl PageViewDraft {
    pub fn new(store_id: impl Into<String>, page_type: impl Into<String>) -> Self {
        Self {
            store_id: store_id.into(),
            page_type: Some(page_type.into()),
            ..Default::default()
        }
    }

    pub fn into_page_view(self, identity: &IdentityContext, now: DateTime<Utc>) -> PageView {
        PageView {
            id: String::new(),
            store_id: self.store_id,
            visitor_id: identity.visitor_id.clone(),
            session_id: identity.session_id.clone(),
            page_type: self
                .page_type
                .unwrap_or_else(|| DEFAULT_PAGE_TYPE.to_string()),
            page_url: self.page_url,
            viewed_at: now,
            time_on_page: self.time_on_page,
            scroll_depth: self.scroll_depth,
        }
    }
}

/// Partial interaction supplied by the storefront.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct InteractionDraft {
    #[validate(length(min = 1, max = 128))]
    pub store_id: String,
    pub interaction_type: InteractionType,
    #[validate(length(max = 256))]
    pub target_id: Option<String>,
    pub data: Option<serde_json::Value>,
}

impl InteractionDraft {
    pub fn new(store_id: impl Into<String>, interaction_type: InteractionType) -> Self {
        Self {
            store_id: store_id.into(),
            interaction_type,
            target_id: None,
            data: None,
        }
    }

    pub fn with_target(mut self, target_id: impl Into<String>) -> Self {
        self.target_id = Some(target_id.into());
        self
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn into_interaction(
        self,
        identity: &IdentityContext,
        now: DateTime<Utc>,
    ) -> UserInteraction {
        UserInteraction {
            id: String::new(),
            store_id: self.store_id,
            visitor_id: identity.visitor_id.clone(),
            session_id: identity.session_id.clone(),
            interaction_type: self.interaction_type,
            target_id: self.target_id,
            data: self.data,
            created_at: now,
        }
    }
}

/// Partial menu item action supplied by the storefront.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MenuItemActionDraft {
    #[validate(length(min = 1, max = 128))]
    pub store_id: String,
    #[validate(length(min = 1, max = 128))]
    pub menu_item_id: String,
    pub action_type: MenuItemAction,
    pub time_spent: Option<u32>,
}

impl MenuItemActionDraft {
    pub fn new(
        store_id: impl Into<String>,
        menu_item_id: impl Into<String>,
        action_type: MenuItemAction,
    ) -> Self {
        Self {
            store_id: store_id.into(),
            menu_item_id: menu_item_id.into(),
            action_type,
            time_spent: None,
        }
    }

    pub fn into_action(self, identity: &IdentityContext, now: DateTime<Utc>) -> MenuItemAnalytics {
        MenuItemAnalytics {
            id: String::new(),
            store_id: self.store_id,
            menu_item_id: self.menu_item_id,
            visitor_id: identity.visitor_id.clone(),
            session_id: identity.session_id.clone(),
            action_type: self.action_type,
            time_spent: self.time_spent,
            created_at: now,
        }
    }
}
