//! Per-content access gate.

mod gate;

pub use gate::{AccessGate, AccessGateDeps, AccessView};
