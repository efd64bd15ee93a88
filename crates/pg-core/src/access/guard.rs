//! One-shot navigation guard.
//!
//! A denial should move the user away exactly once. Re-renders caused by
//! re-subscription or realtime pushes must not re-fire the redirect, and a
//! user who was already let in must not be ejected by a later background
//! denial.

use super::policy::{AccessDecision, AccessReason};
use crate::ids::ContentId;

#[derive(Debug, Clone, PartialEq, Eq)]
enum LatchState {
    /// Nothing observed yet for this content.
    Armed,
    /// A redirect fired for this denial.
    Fired { reason: AccessReason },
    /// The content was shown; later denials do not eject.
    Viewing,
}

/// What the caller should do after showing a decision to the guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardOutcome {
    /// Navigate away now. Returned at most once per denial state.
    Redirect,
    /// Denied, but the redirect for this denial already fired.
    AlreadyRedirected,
    /// Denied after the content was shown; keep the user where they are.
    KeepViewing,
    /// Allowed or pending.
    None,
}

/// Latch keyed by `(content_id, reason)`, held outside the render path.
#[derive(Debug, Clone)]
pub struct NavigationGuard {
    content_id: Option<ContentId>,
    state: LatchState,
}

impl NavigationGuard {
    pub fn new() -> Self {
        Self {
            content_id: None,
            state: LatchState::Armed,
        }
    }

    /// Feed the latest decision for `content_id`.
    ///
    /// Callers feed only decisions computed from settled inputs, plus
    /// premium or ad-unlock grants at any time.
    ///
    /// - Allowed decisions reset the latch into `Viewing`.
    /// - Pending decisions never change the latch.
    /// - The first denial fires; repeated denials (same or different reason)
    ///   do not.
    /// - Switching to another content id re-arms the latch.
    pub fn observe(&mut self, content_id: &ContentId, decision: &AccessDecision) -> GuardOutcome {
        if self.content_id.as_ref() != Some(content_id) {
            self.content_id = Some(content_id.clone());
            self.state = LatchState::Armed;
        }

        if decision.allowed {
            self.state = LatchState::Viewing;
            return GuardOutcome::None;
        }

        if !decision.is_denied() {
            return GuardOutcome::None;
        }

        match self.state {
            LatchState::Armed => {
                self.state = LatchState::Fired {
                    reason: decision.reason,
                };
                GuardOutcome::Redirect
            }
            LatchState::Fired { .. } => GuardOutcome::AlreadyRedirected,
            LatchState::Viewing => GuardOutcome::KeepViewing,
        }
    }

    /// Reason of the denial the latch fired for, if any.
    pub fn fired_for(&self) -> Option<AccessReason> {
        match self.state {
            LatchState::Fired { reason } => Some(reason),
            _ => None,
        }
    }
}

impl Default for NavigationGuard {
    fn default() -> Self {
        Self::new()
    }
}
