//! # pg-core
//!
//! Core domain models and business logic for Premium Gate.
//!
//! This crate contains pure business logic without any infrastructure
//! dependencies: entitlement and catalog models, the access policy, the
//! navigation guard, the reconciliation lifecycle state machine, the
//! configuration DTO and the ports the application layer depends on.

pub mod access;
pub mod catalog;
pub mod config;
pub mod entitlement;
pub mod ids;
pub mod ports;
pub mod profile;
pub mod reconciliation;

// Re-export commonly used types at the crate root
pub use access::{AccessDecision, AccessPolicy, AccessReason, MissingContentPolicy};
pub use config::GateConfig;
pub use entitlement::{EntitlementSnapshot, PremiumStatus};
pub use ids::{ContentId, UserId};
pub use reconciliation::ReconciliationState;
