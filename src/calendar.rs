use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid target month `{0}` (expected YYYY-MM)")]
pub struct MonthParseError(pub String);

/// Mois cible d'un planning (`YYYY-MM`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TargetMonth {
    year: i32,
    month: u32,
}

impl TargetMonth {
    pub fn new(year: i32, month: u32) -> Result<Self, MonthParseError> {
        NaiveDate::from_ymd_opt(year, month, 1)
            .map(|_| Self { year, month })
            .ok_or_else(|| MonthParseError(format!("{year:04}-{month:02}")))
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    fn first_day(&self) -> NaiveDate {
        // validé à la construction
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or_default()
    }

    /// Nombre de jours du mois.
    pub fn days_in_month(&self) -> usize {
        days_in_month(self.year, self.month)
    }

    /// Classe de jour de semaine (0 = dimanche .. 6 = samedi) pour l'index `day` (0-based).
    pub fn weekday_class(&self, day: usize) -> u8 {
        let date = self.first_day() + chrono::Duration::days(day as i64);
        date.weekday().num_days_from_sunday() as u8
    }
}

impl FromStr for TargetMonth {
    type Err = MonthParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        let (y, m) = trimmed
            .split_once('-')
            .ok_or_else(|| MonthParseError(raw.to_string()))?;
        let year: i32 = y.parse().map_err(|_| MonthParseError(raw.to_string()))?;
        let month: u32 = m.parse().map_err(|_| MonthParseError(raw.to_string()))?;
        Self::new(year, month).map_err(|_| MonthParseError(raw.to_string()))
    }
}

impl TryFrom<String> for TargetMonth {
    type Error = MonthParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TargetMonth> for String {
    fn from(value: TargetMonth) -> Self {
        value.to_string()
    }
}

impl fmt::Display for TargetMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Nombre de jours d'un mois donné; 0 si le couple (année, mois) est invalide.
pub fn days_in_month(year: i32, month: u32) -> usize {
    let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
        return 0;
    };
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    next.map_or(0, |n| n.signed_duration_since(first).num_days() as usize)
}

/// Classe de jour de semaine, dimanche = 0.
pub fn weekday_class(year: i32, month: u32, day_index: usize) -> Option<u8> {
    let target = TargetMonth::new(year, month).ok()?;
    (day_index < target.days_in_month()).then(|| target.weekday_class(day_index))
}
