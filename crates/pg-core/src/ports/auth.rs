//! Auth boundary.

use tokio::sync::watch;

use crate::ids::UserId;

/// What the auth provider currently reports.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AuthState {
    /// False until the provider has restored any persisted session.
    pub initialized: bool,
    pub user_id: Option<UserId>,
}

impl AuthState {
    pub fn signed_in(user_id: UserId) -> Self {
        Self {
            initialized: true,
            user_id: Some(user_id),
        }
    }

    pub fn signed_out() -> Self {
        Self {
            initialized: true,
            user_id: None,
        }
    }
}

pub trait AuthPort: Send + Sync {
    fn current_user_id(&self) -> Option<UserId>;

    fn is_initialized(&self) -> bool;

    /// Follow auth changes. The receiver starts at the current state.
    fn subscribe_auth_changes(&self) -> watch::Receiver<AuthState>;
}
