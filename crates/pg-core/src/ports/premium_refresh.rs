use async_trait::async_trait;

use crate::ids::UserId;

/// UI refresh trigger, fired after the converged premium flag changed.
#[async_trait]
pub trait PremiumRefreshPort: Send + Sync {
    async fn emit_premium_changed(&self, user_id: &UserId, is_premium: bool);
}
