pub mod access;
pub mod activation;
mod bounded;
pub mod reconciliation;

pub use access::{AccessGate, AccessGateDeps, AccessView};
pub use activation::{ActivationOutcome, ActivationWaiter, ACTIVATION_PENDING_MESSAGE};
pub use reconciliation::{
    ApplyOutcome, ReconciliationController, ReconciliationDeps, ReconciliationError,
    SyncRunSnapshot,
};
