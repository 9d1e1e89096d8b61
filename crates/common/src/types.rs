use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use uuid::Uuid;

/// A calendar month, stored as the first day of that month.
///
/// The textual form is always `MM-YYYY` (e.g. `08-2025`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, sqlx::Type)]
#[sqlx(transparent)]
pub struct MonthYear(NaiveDate);

/// Reasons a `MM-YYYY` string can be rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseMonthYearError {
    #[error("expected MM-YYYY, got '{0}'")]
    Format(String),

    #[error("month must be between 01 and 12, got {0}")]
    Month(u32),

    #[error("year {0} is out of range")]
    Year(i32),
}

impl MonthYear {
    /// Build a month from its year and 1-based month number.
    pub fn new(year: i32, month: u32) -> Result<Self, ParseMonthYearError> {
        if !(1..=12).contains(&month) {
            return Err(ParseMonthYearError::Month(month));
        }
        NaiveDate::from_ymd_opt(year, month, 1)
            .map(Self)
            .ok_or(ParseMonthYearError::Year(year))
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    /// The first day of the month, as persisted in `DATE` columns.
    pub fn first_day(&self) -> NaiveDate {
        self.0
    }
}

impl FromStr for MonthYear {
    type Err = ParseMonthYearError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let format_err = || ParseMonthYearError::Format(s.to_string());

        let (month, year) = s.split_once('-').ok_or_else(format_err)?;
        if month.len() != 2
            || year.len() != 4
            || !month.bytes().all(|b| b.is_ascii_digit())
            || !year.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(format_err());
        }

        let month: u32 = month.parse().map_err(|_| format_err())?;
        let year: i32 = year.parse().map_err(|_| format_err())?;
        Self::new(year, month)
    }
}

impl fmt::Display for MonthYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}-{:04}", self.month(), self.year())
    }
}

impl Serialize for MonthYear {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MonthYear {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A user's paid subscription to an online service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Subscription {
    pub id: Uuid,
    pub user_id: Uuid,
    pub service_name: String,
    /// Monthly price in minor currency units.
    pub price: i32,
    pub start_date: MonthYear,
    pub end_date: Option<MonthYear>,
}

/// Input for creating a subscription. The identifier is assigned by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateSubscriptionData {
    pub user_id: Uuid,
    pub service_name: String,
    pub price: i32,
    pub start_date: MonthYear,
    pub end_date: Option<MonthYear>,
}

/// Replacement values for the mutable fields of a subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateSubscriptionData {
    pub service_name: String,
    pub price: i32,
    pub start_date: MonthYear,
    pub end_date: Option<MonthYear>,
}

/// Conjunctive filter over subscriptions.
///
/// `None` fields mean "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionFilter {
    pub user_id: Option<Uuid>,
    pub service_name: Option<String>,
    /// Lower bound on `start_date` (inclusive).
    pub start_date: Option<MonthYear>,
    /// Upper bound on `end_date` (inclusive).
    pub end_date: Option<MonthYear>,
}

impl SubscriptionFilter {
    pub fn is_empty(&self) -> bool {
        self.user_id.is_none()
            && self.service_name.is_none()
            && self.start_date.is_none()
            && self.end_date.is_none()
    }
}
