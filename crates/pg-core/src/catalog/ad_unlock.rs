use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::ContentId;

/// Time-bounded access to a single content unit, earned by watching an ad.
///
/// Grants are created by the unlock flow and only read here. An expired
/// grant is inert; nothing in this crate purges it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdUnlockGrant {
    pub content_id: ContentId,
    pub expires_at: DateTime<Utc>,
}

impl AdUnlockGrant {
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }

    /// Whether any grant in `grants` unlocks `content_id` at `now`.
    pub fn unlocks(grants: &[AdUnlockGrant], content_id: &ContentId, now: DateTime<Utc>) -> bool {
        grants
            .iter()
            .any(|grant| &grant.content_id == content_id && grant.is_active(now))
    }
}
