//! Remote profile boundary.

use async_trait::async_trait;

use crate::ids::UserId;
use crate::profile::ProfilePremiumState;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProfileMirrorError {
    #[error("profile store unreachable: {0}")]
    Network(String),

    #[error("profile store rejected the request: {0}")]
    Rejected(String),

    #[error("profile store call timed out")]
    Timeout,
}

#[async_trait]
pub trait ProfileMirrorPort: Send + Sync {
    /// `None` when no profile row exists yet.
    async fn read_profile_premium(
        &self,
        user_id: &UserId,
    ) -> Result<Option<ProfilePremiumState>, ProfileMirrorError>;

    async fn write_profile_premium(
        &self,
        user_id: &UserId,
        is_premium: bool,
    ) -> Result<(), ProfileMirrorError>;
}
