//! Entitlement reconciliation.
//!
//! Converges the purchase platform, the server-mirrored premium flag and the
//! published premium status for whichever identity auth reports.

mod controller;
mod run_state;

pub use controller::{
    ApplyOutcome, ReconciliationController, ReconciliationDeps, ReconciliationError,
};
pub use run_state::SyncRunSnapshot;
