//! Publication date of a content unit.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATE_LEN: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContentDateError {
    #[error("content date is empty")]
    Empty,

    #[error("content date is malformed: {0}")]
    Malformed(String),
}

/// Calendar day a content unit was published on (UTC).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ContentDate(NaiveDate);

impl ContentDate {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    /// Parse a catalog date.
    ///
    /// Accepts `YYYY-MM-DD`, optionally followed by a `T` or space separated
    /// time part which is ignored.
    pub fn parse(raw: &str) -> Result<Self, ContentDateError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ContentDateError::Empty);
        }

        let date_part = match raw.get(..DATE_LEN) {
            Some(prefix) if raw.len() == DATE_LEN => prefix,
            Some(prefix) if matches!(raw.as_bytes()[DATE_LEN], b'T' | b' ') => prefix,
            _ => return Err(ContentDateError::Malformed(raw.to_string())),
        };

        NaiveDate::parse_from_str(date_part, DATE_FORMAT)
            .map(Self)
            .map_err(|_| ContentDateError::Malformed(raw.to_string()))
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// Whole calendar days between this date and `now`'s UTC date.
    ///
    /// Positive for past content, zero for today, negative for future dates.
    pub fn age_in_days(&self, now: DateTime<Utc>) -> i64 {
        now.date_naive().signed_duration_since(self.0).num_days()
    }
}

impl std::fmt::Display for ContentDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format(DATE_FORMAT))
    }
}
