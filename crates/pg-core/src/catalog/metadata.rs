use serde::{Deserialize, Serialize};

use super::content_date::{ContentDate, ContentDateError};

/// Cached catalog row for one content unit.
///
/// The date is kept as stored; parsing happens at decision time so that a
/// malformed row degrades into "unknown date" instead of failing the read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentMetadata {
    pub date: String,
}

impl ContentMetadata {
    pub fn new(date: impl Into<String>) -> Self {
        Self { date: date.into() }
    }

    pub fn content_date(&self) -> Result<ContentDate, ContentDateError> {
        ContentDate::parse(&self.date)
    }
}
