//! Reconciliation lifecycle domain module.
//!
//! Defines the pure lifecycle state machine the reconciliation controller
//! drives: `Idle -> Syncing -> Listening -> Idle`.

pub mod state_machine;

pub use state_machine::{
    ReconciliationAction, ReconciliationEvent, ReconciliationState, ReconciliationStateMachine,
    TransitionError,
};
