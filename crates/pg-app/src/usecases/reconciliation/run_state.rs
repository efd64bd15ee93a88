use tokio::task::AbortHandle;

use pg_core::ids::UserId;

/// In-memory state bound to the current identity.
///
/// Cleared on sign-out. The persisted silent-restore flag lives elsewhere
/// and survives this.
#[derive(Debug, Default)]
pub(crate) struct SyncRunState {
    pub(crate) current_user_id: Option<UserId>,
    /// `None` is the unset sentinel: the next apply always writes.
    pub(crate) last_known_premium: Option<bool>,
    pub(crate) sync_task: Option<AbortHandle>,
    pub(crate) listener: Option<AbortHandle>,
}

impl SyncRunState {
    pub(crate) fn is_current(&self, user_id: &UserId) -> bool {
        self.current_user_id.as_ref() == Some(user_id)
    }

    /// Abort background work for the bound identity. Synchronous, so no push
    /// can be applied after this returns.
    pub(crate) fn abort_tasks(&mut self) {
        if let Some(listener) = self.listener.take() {
            listener.abort();
        }
        if let Some(sync_task) = self.sync_task.take() {
            sync_task.abort();
        }
    }

    pub(crate) fn snapshot(&self) -> SyncRunSnapshot {
        SyncRunSnapshot {
            current_user_id: self.current_user_id.clone(),
            last_known_premium: self.last_known_premium,
            listening: self.listener.is_some(),
        }
    }
}

/// Read-only view of the run state, for diagnostics and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncRunSnapshot {
    pub current_user_id: Option<UserId>,
    pub last_known_premium: Option<bool>,
    pub listening: bool,
}
