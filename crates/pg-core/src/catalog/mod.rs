//! On-device catalog models: cached content metadata and ad-unlock grants.

mod ad_unlock;
mod content_date;
mod metadata;

pub use ad_unlock::AdUnlockGrant;
pub use content_date::{ContentDate, ContentDateError};
pub use metadata::ContentMetadata;
