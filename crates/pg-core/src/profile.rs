//! Server-mirrored premium profile.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::UserId;

/// The premium flag as stored on the remote profile row.
///
/// The remote copy is a cache of platform truth. Only the reconciliation
/// controller writes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfilePremiumState {
    pub user_id: UserId,
    pub is_premium: bool,
    pub premium_since: Option<DateTime<Utc>>,
}
