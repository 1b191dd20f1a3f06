//! Symbolic reporting periods resolved to concrete calendar-day ranges.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Days, Local, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{self, Error, ValidationErrorCode};

/// A reporting period token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Period {
    Today,
    Yesterday,
    Last7Days,
    #[default]
    Last30Days,
    Last90Days,
    ThisMonth,
    LastMonth,
    Custom,
}

impl Period {
    pub const ALL: [Period; 8] = [
        Self::Today,
        Self::Yesterday,
        Self::Last7Days,
        Self::Last30Days,
        Self::Last90Days,
        Self::ThisMonth,
        Self::LastMonth,
        Self::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::Yesterday => "yesterday",
            Self::Last7Days => "last_7_days",
            Self::Last30Days => "last_30_days",
            Self::Last90Days => "last_90_days",
            Self::ThisMonth => "this_month",
            Self::LastMonth => "last_month",
            Self::Custom => "custom",
        }
    }

    /// Parses a token, falling back to `Last30Days` for anything unknown.
    pub fn from_token(token: &str) -> Self {
        token.parse().unwrap_or_default()
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == token)
            .ok_or_else(|| Error::validation(format!("unknown period: {}", s)))
    }
}

impl Serialize for Period {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Period {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let token = String::deserialize(deserializer)?;
        Ok(Self::from_token(&token))
    }
}

/// Inclusive calendar-day range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// A single day.
    pub fn day(date: NaiveDate) -> Self {
        Self::new(date, date)
    }

    /// Number of days covered; zero when `end` precedes `start`.
    pub fn days(&self) -> u64 {
        let span = (self.end - self.start).num_days() + 1;
        span.max(0) as u64
    }

    pub fn is_empty(&self) -> bool {
        self.days() == 0
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// The range of equal length ending the day before this one starts.
    /// Fails with VALID_001 when that range would fall before the first
    /// representable date.
    pub fn previous(&self) -> error::Result<Self> {
        let len = self.days().max(1);
        self.start
            .checked_sub_days(Days::new(1))
            .and_then(|end| Some(Self::new(end.checked_sub_days(Days::new(len - 1))?, end)))
            .ok_or_else(|| {
                Error::validation_code(
                    ValidationErrorCode::InvalidFormat,
                    format!("no comparison period precedes {}", self),
                )
            })
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

/// Resolves a period against the local wall-clock date.
pub fn resolve_range(
    period: Period,
    explicit_start: Option<NaiveDate>,
    explicit_end: Option<NaiveDate>,
) -> DateRange {
    resolve_range_at(period, explicit_start, explicit_end, Local::now().date_naive())
}

/// Resolves a period against a fixed `today`.
///
/// Explicit bounds are only honoured for `Custom`; a missing custom bound
/// defaults to `today`.
pub fn resolve_range_at(
    period: Period,
    explicit_start: Option<NaiveDate>,
    explicit_end: Option<NaiveDate>,
    today: NaiveDate,
) -> DateRange {
    match period {
        Period::Today => DateRange::day(today),
        Period::Yesterday => DateRange::day(today - Days::new(1)),
        Period::Last7Days => DateRange::new(today - Days::new(7), today),
        Period::Last30Days => DateRange::new(today - Days::new(30), today),
        Period::Last90Days => DateRange::new(today - Days::new(90), today),
        Period::ThisMonth => DateRange::new(first_of_month(today), today),
        Period::LastMonth => {
            let last_day = first_of_month(today) - Days::new(1);
            DateRange::new(first_of_month(last_day), last_day)
        }
        Period::Custom => DateRange::new(
            explicit_start.unwrap_or(today),
            explicit_end.unwrap_or(today),
        ),
    }
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}
