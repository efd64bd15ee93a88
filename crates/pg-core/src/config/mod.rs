mod backoff;
mod gate_config;

pub use backoff::BackoffSchedule;
pub use gate_config::{GateConfig, DEFAULT_REQUEST_TIMEOUT_MS};
