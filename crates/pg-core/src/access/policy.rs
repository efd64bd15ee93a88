//! Access policy.
//!
//! Pure decision function: no IO, no async, no clock. Callers pass `now`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::window::FreeWindow;
use crate::catalog::ContentDate;

/// What to do when content metadata finished loading and nothing was found.
///
/// 元数据缺失时的处理策略。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingContentPolicy {
    /// Allow: keeps fresh content reachable while the catalog syncs, at the
    /// cost of free access to old content during a real catalog failure.
    FailOpen,
    /// Deny: protects locked content, at the cost of false denials while the
    /// catalog is still syncing.
    FailClosed,
}

impl Default for MissingContentPolicy {
    fn default() -> Self {
        Self::FailClosed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AccessConfig {
    pub free_window: FreeWindow,
    pub missing_content: MissingContentPolicy,
}

/// Why a decision came out the way it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccessReason {
    Premium,
    AdUnlocked,
    WithinFreeWindow,
    /// Date still loading; render a placeholder, do not navigate.
    Pending,
    DeniedLocked,
    DeniedMissing,
}

impl AccessReason {
    pub fn is_denial(&self) -> bool {
        matches!(self, Self::DeniedLocked | Self::DeniedMissing)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessDecision {
    pub allowed: bool,
    pub reason: AccessReason,
}

impl AccessDecision {
    fn allow(reason: AccessReason) -> Self {
        Self {
            allowed: true,
            reason,
        }
    }

    fn deny(reason: AccessReason) -> Self {
        Self {
            allowed: false,
            reason,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.reason == AccessReason::Pending
    }

    /// Denied and not merely pending. `DeniedMissing` under fail-open is
    /// allowed and therefore not a denial.
    pub fn is_denied(&self) -> bool {
        !self.allowed && self.reason.is_denial()
    }

    /// Allowed because the user holds premium or an ad unlock, independent
    /// of the content date.
    pub fn is_entitled(&self) -> bool {
        self.allowed && matches!(self.reason, AccessReason::Premium | AccessReason::AdUnlocked)
    }
}

/// Everything the policy looks at for one content unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessInputs {
    pub now: DateTime<Utc>,
    pub content_date: Option<ContentDate>,
    /// True while the catalog lookup for this content is still in flight.
    pub date_loading: bool,
    pub is_premium: bool,
    pub is_ad_unlocked: bool,
}

pub struct AccessPolicy;

impl AccessPolicy {
    /// Decide access for one content unit.
    ///
    /// Premium and ad-unlock short-circuit before the date is looked at, so
    /// neither ever waits on a catalog load. The missing-content policy only
    /// affects `DeniedMissing`.
    pub fn decide(inputs: &AccessInputs, config: &AccessConfig) -> AccessDecision {
        if inputs.is_premium {
            return AccessDecision::allow(AccessReason::Premium);
        }
        if inputs.is_ad_unlocked {
            return AccessDecision::allow(AccessReason::AdUnlocked);
        }

        match inputs.content_date {
            Some(date) if config.free_window.contains(date, inputs.now) => {
                AccessDecision::allow(AccessReason::WithinFreeWindow)
            }
            Some(_) => AccessDecision::deny(AccessReason::DeniedLocked),
            None if inputs.date_loading => AccessDecision::deny(AccessReason::Pending),
            None => match config.missing_content {
                MissingContentPolicy::FailOpen => {
                    AccessDecision::allow(AccessReason::DeniedMissing)
                }
                MissingContentPolicy::FailClosed => {
                    AccessDecision::deny(AccessReason::DeniedMissing)
                }
            },
        }
    }
}
