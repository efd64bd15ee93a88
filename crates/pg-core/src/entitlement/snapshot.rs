use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Point-in-time view of the purchase platform's entitlement cache.
///
/// Snapshots are replaced wholesale on every fetch or push, never merged.
/// `expires_at == None` together with `has_premium == true` is a lifetime
/// entitlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitlementSnapshot {
    pub has_premium: bool,
    pub expires_at: Option<DateTime<Utc>>,
}

impl EntitlementSnapshot {
    pub fn free() -> Self {
        Self {
            has_premium: false,
            expires_at: None,
        }
    }

    pub fn lifetime() -> Self {
        Self {
            has_premium: true,
            expires_at: None,
        }
    }

    pub fn subscription(expires_at: DateTime<Utc>) -> Self {
        Self {
            has_premium: true,
            expires_at: Some(expires_at),
        }
    }

    pub fn is_lifetime(&self) -> bool {
        self.has_premium && self.expires_at.is_none()
    }
}
