//! Once-per-install silent restore flag.
//!
//! The backing store must be cleared by an app reinstall; that is what bounds
//! silent restore to one attempt per install.

use async_trait::async_trait;

#[async_trait]
pub trait SilentRestoreFlagPort: Send + Sync {
    async fn is_attempted(&self) -> anyhow::Result<bool>;

    /// Must be durable when it returns.
    async fn mark_attempted(&self) -> anyhow::Result<()>;
}
