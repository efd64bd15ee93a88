//! Premium Gate Application Orchestration Layer
//!
//! This crate contains the use cases that converge entitlement state in the
//! background and decide content access at render time.

pub mod usecases;

pub use usecases::{
    AccessGate, AccessGateDeps, AccessView, ActivationOutcome, ActivationWaiter,
    ReconciliationController, ReconciliationDeps, ReconciliationError,
};
