//! Per-content access decisions.
//!
//! `AccessPolicy` is a pure function of its inputs; `NavigationGuard` is the
//! latch that turns denials into at most one redirect per denial state.

mod guard;
mod policy;
mod window;

pub use guard::{GuardOutcome, NavigationGuard};
pub use policy::{
    AccessConfig, AccessDecision, AccessInputs, AccessPolicy, AccessReason, MissingContentPolicy,
};
pub use window::{FreeWindow, DEFAULT_FREE_WINDOW_DAYS};
