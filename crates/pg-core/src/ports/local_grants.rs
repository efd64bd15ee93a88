//! On-device catalog boundary.
//!
//! The storage engine behind it is opaque; these are plain async reads.

use async_trait::async_trait;

use crate::catalog::{AdUnlockGrant, ContentMetadata};
use crate::ids::ContentId;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GrantStoreError {
    #[error("catalog storage failed: {0}")]
    Storage(String),

    #[error("catalog read timed out")]
    Timeout,
}

#[async_trait]
pub trait LocalGrantStorePort: Send + Sync {
    /// `None` when the catalog has no row for `content_id` (not synced yet).
    async fn content_metadata(
        &self,
        content_id: &ContentId,
    ) -> Result<Option<ContentMetadata>, GrantStoreError>;

    /// Grants not yet purged by the unlock flow. May include expired ones.
    async fn active_ad_unlocks(&self) -> Result<Vec<AdUnlockGrant>, GrantStoreError>;
}
