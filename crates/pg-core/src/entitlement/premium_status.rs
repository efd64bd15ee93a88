use serde::{Deserialize, Serialize};

/// Where the currently published premium flag came from.
///
/// 当前发布的会员状态来源。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PremiumSource {
    /// Nothing known yet for the bound identity.
    Unknown,
    /// Server-mirrored flag, used as a hint until the platform answers.
    Profile,
    /// Purchase platform entitlement cache.
    Platform,
    /// Auth settled with nobody signed in.
    SignedOut,
}

/// Premium flag as published to render code.
///
/// Render code reads this synchronously; the reconciliation controller is the
/// only writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PremiumStatus {
    pub is_premium: bool,
    pub source: PremiumSource,
}

impl PremiumStatus {
    pub fn unknown() -> Self {
        Self {
            is_premium: false,
            source: PremiumSource::Unknown,
        }
    }

    pub fn from_profile(is_premium: bool) -> Self {
        Self {
            is_premium,
            source: PremiumSource::Profile,
        }
    }

    pub fn from_platform(is_premium: bool) -> Self {
        Self {
            is_premium,
            source: PremiumSource::Platform,
        }
    }

    pub fn signed_out() -> Self {
        Self {
            is_premium: false,
            source: PremiumSource::SignedOut,
        }
    }

    pub fn is_authoritative(&self) -> bool {
        self.source == PremiumSource::Platform
    }

    /// False until a profile hint, a platform answer or a settled sign-out
    /// has been published. A `false` flag is not a verdict before that.
    pub fn is_settled(&self) -> bool {
        self.source != PremiumSource::Unknown
    }
}

impl Default for PremiumStatus {
    fn default() -> Self {
        Self::unknown()
    }
}
