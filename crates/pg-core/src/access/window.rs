use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::ContentDate;

/// Length of the trailing free window, in calendar days.
///
/// Content published today is day 0; with 7 days, day 6 is the last free day
/// and day 7 is locked.
pub const DEFAULT_FREE_WINDOW_DAYS: u32 = 7;

/// Trailing window of recent content that free users may open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreeWindow {
    days: u32,
}

impl FreeWindow {
    pub fn new(days: u32) -> Self {
        Self { days }
    }

    pub fn days(&self) -> u32 {
        self.days
    }

    /// `0 <= age < days`. Future-dated content is not released yet and falls
    /// outside the window.
    pub fn contains(&self, date: ContentDate, now: DateTime<Utc>) -> bool {
        let age = date.age_in_days(now);
        age >= 0 && age < i64::from(self.days)
    }
}

impl Default for FreeWindow {
    fn default() -> Self {
        Self::new(DEFAULT_FREE_WINDOW_DAYS)
    }
}
