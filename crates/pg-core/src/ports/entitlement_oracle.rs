//! Purchase platform boundary.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::entitlement::EntitlementSnapshot;
use crate::ids::UserId;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EntitlementError {
    #[error("purchase platform unreachable: {0}")]
    Network(String),

    #[error("purchase platform rejected the request: {0}")]
    Platform(String),

    #[error("purchase platform call timed out")]
    Timeout,
}

/// Wraps the purchase SDK.
///
/// # Ordering
///
/// `identify` rebinds which identity future receipts attach to. `logout`
/// must complete before a different identity calls `identify`, otherwise
/// receipts may attach to the wrong account.
#[async_trait]
pub trait EntitlementOraclePort: Send + Sync {
    /// Bind `user_id` and fetch its entitlement.
    async fn identify(&self, user_id: &UserId) -> Result<EntitlementSnapshot, EntitlementError>;

    /// Unbind the current identity. Best-effort: failures are swallowed by
    /// the implementation.
    async fn logout(&self);

    /// Cached entitlement, no network round trip. `None` before the first
    /// fetch.
    fn snapshot(&self) -> Option<EntitlementSnapshot>;

    /// Platform-level receipt re-validation. Expensive: at most once per
    /// retry cycle.
    async fn force_resync(&self) -> Result<EntitlementSnapshot, EntitlementError>;

    /// Restore purchases made by this store account.
    async fn restore_purchases(&self) -> Result<EntitlementSnapshot, EntitlementError>;

    /// Follow local entitlement cache changes (purchase, renewal,
    /// revocation). Dropping the receiver unsubscribes.
    async fn subscribe(&self) -> Result<mpsc::Receiver<EntitlementSnapshot>, EntitlementError>;
}
