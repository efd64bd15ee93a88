//! Reconciliation state machine.
//!
//! Pure transition function; the controller executes the returned actions.

use serde::{Deserialize, Serialize};

use crate::ids::UserId;

/// Lifecycle state of one reconciliation controller.
///
/// 对账控制器的生命周期状态。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReconciliationState {
    /// No identity bound.
    ///
    /// 未绑定身份。
    Idle,
    /// Identity bound, first snapshot not applied yet.
    ///
    /// 已绑定身份，首次快照尚未应用。
    Syncing { user_id: UserId },
    /// First snapshot applied, following platform pushes.
    ///
    /// 已应用首次快照，正在监听平台推送。
    Listening { user_id: UserId },
}

impl ReconciliationState {
    pub fn user_id(&self) -> Option<&UserId> {
        match self {
            Self::Idle => None,
            Self::Syncing { user_id } | Self::Listening { user_id } => Some(user_id),
        }
    }
}

/// Events that drive the lifecycle.
///
/// 驱动生命周期的事件。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReconciliationEvent {
    /// Auth reported a signed-in identity.
    IdentityAvailable { user_id: UserId },
    /// The first snapshot for `user_id` was applied.
    FirstSnapshotApplied { user_id: UserId },
    /// Identify failed for `user_id`; the cycle is abandoned.
    SyncAborted { user_id: UserId },
    /// Auth reported no identity.
    SignedOut,
}

/// Side-effects produced by transitions.
///
/// 状态迁移产生的副作用。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReconciliationAction {
    /// Unsubscribe, then log the platform out, then clear run state.
    TearDown { user_id: UserId },
    /// Identify, silent-restore once, apply.
    BeginSync { user_id: UserId },
    /// Start following platform pushes.
    Subscribe { user_id: UserId },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    /// The event refers to an identity that is no longer bound. Expected
    /// under interleaving; callers drop it.
    #[error("event for {event_user} is stale, bound identity is {bound:?}")]
    Stale {
        event_user: UserId,
        bound: Option<UserId>,
    },

    /// Programmer error, e.g. a second subscribe for the same identity.
    #[error("invalid transition: {event:?} in state {state:?}")]
    Invalid {
        state: ReconciliationState,
        event: ReconciliationEvent,
    },
}

/// Pure reconciliation state machine.
///
/// 纯状态机：不包含副作用。
pub struct ReconciliationStateMachine;

impl ReconciliationStateMachine {
    pub fn transition(
        state: ReconciliationState,
        event: ReconciliationEvent,
    ) -> Result<(ReconciliationState, Vec<ReconciliationAction>), TransitionError> {
        use ReconciliationAction as A;
        use ReconciliationEvent as E;
        use ReconciliationState as S;

        match (state, event) {
            (S::Idle, E::IdentityAvailable { user_id }) => Ok((
                S::Syncing {
                    user_id: user_id.clone(),
                },
                vec![A::BeginSync { user_id }],
            )),
            (S::Idle, E::SignedOut) => Ok((S::Idle, Vec::new())),

            // Repeated sign-in for the bound identity keeps the current phase.
            (state @ (S::Syncing { .. } | S::Listening { .. }), E::IdentityAvailable { user_id })
                if state.user_id() == Some(&user_id) =>
            {
                Ok((state, Vec::new()))
            }
            (
                S::Syncing { user_id: bound } | S::Listening { user_id: bound },
                E::IdentityAvailable { user_id },
            ) => Ok((
                S::Syncing {
                    user_id: user_id.clone(),
                },
                vec![A::TearDown { user_id: bound }, A::BeginSync { user_id }],
            )),

            (S::Syncing { user_id: bound } | S::Listening { user_id: bound }, E::SignedOut) => {
                Ok((S::Idle, vec![A::TearDown { user_id: bound }]))
            }

            (S::Syncing { user_id: bound }, E::FirstSnapshotApplied { user_id })
                if bound == user_id =>
            {
                Ok((
                    S::Listening {
                        user_id: user_id.clone(),
                    },
                    vec![A::Subscribe { user_id }],
                ))
            }
            // Identify failed: unbind so the next auth change starts clean.
            (S::Syncing { user_id: bound }, E::SyncAborted { user_id }) if bound == user_id => {
                Ok((S::Idle, vec![A::TearDown { user_id }]))
            }

            // Already listening for this identity: a second subscribe.
            (state @ S::Listening { .. }, event @ E::FirstSnapshotApplied { .. })
                if state.user_id() == event_user(&event) =>
            {
                Err(TransitionError::Invalid { state, event })
            }

            (state, E::FirstSnapshotApplied { user_id } | E::SyncAborted { user_id }) => {
                Err(TransitionError::Stale {
                    event_user: user_id,
                    bound: state.user_id().cloned(),
                })
            }
        }
    }
}

fn event_user(event: &ReconciliationEvent) -> Option<&UserId> {
    match event {
        ReconciliationEvent::IdentityAvailable { user_id }
        | ReconciliationEvent::FirstSnapshotApplied { user_id }
        | ReconciliationEvent::SyncAborted { user_id } => Some(user_id),
        ReconciliationEvent::SignedOut => None,
    }
}
