//! Visit enrichment via user agent parsing.
//!
//! woothee has no tablet category, so tablets are recognised separately
//! before its classification is consulted.

use std::sync::LazyLock;

use analytics_core::{DeviceType, StoreVisit};
use regex::Regex;
use woothee::parser::Parser;

static TABLET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(ipad|tablet|kindle|silk|playbook|nexus (7|9|10))").expect("valid tablet regex")
});

static ANDROID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)android").expect("valid android regex"));

static MOBILE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)mobile").expect("valid mobile regex"));

/// Device, browser and OS derived from a user agent.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeviceInfo {
    pub device_type: DeviceType,
    pub browser: Option<String>,
    pub os: Option<String>,
}

/// User agent classifier.
pub struct DeviceClassifier {
    parser: Parser,
}

impl DeviceClassifier {
    pub fn new() -> Self {
        Self {
            parser: Parser::new(),
        }
    }

    /// Classifies a user agent string. Empty or unparseable agents yield
    /// `DeviceType::Unknown` and no browser/OS.
    pub fn classify(&self, user_agent: &str) -> DeviceInfo {
        let user_agent = user_agent.trim();
        if user_agent.is_empty() {
            return DeviceInfo::default();
        }

        let mut info = DeviceInfo::default();
        if let Some(result) = self.parser.parse(user_agent) {
            if !result.name.is_empty() && result.name != "UNKNOWN" {
                info.browser = Some(result.name.to_string());
            }
            if !result.os.is_empty() && result.os != "UNKNOWN" {
                info.os = Some(result.os.to_string());
            }

            // woothee categories: pc, smartphone, mobilephone, crawler, appliance, misc
            info.device_type = match result.category {
                "pc" => DeviceType::Desktop,
                "smartphone" | "mobilephone" => DeviceType::Mobile,
                "crawler" => DeviceType::Bot,
                _ => DeviceType::Unknown,
            };
        }

        if info.device_type != DeviceType::Bot && is_tablet(user_agent) {
            info.device_type = DeviceType::Tablet;
        }

        info
    }

    /// Fills the device fields of a visit from its user agent.
    pub fn enrich(&self, visit: &mut StoreVisit) {
        let Some(user_agent) = visit.user_agent.as_deref() else {
            return;
        };

        let info = self.classify(user_agent);
        visit.device_type = info.device_type;
        visit.browser = info.browser;
        visit.os = info.os;
    }
}

impl Default for DeviceClassifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Android tablets omit "Mobile" from their user agent.
fn is_tablet(user_agent: &str) -> bool {
    TABLET.is_match(user_agent) || (ANDROID.is_match(user_agent) && !MOBILE.is_match(user_agent))
}
