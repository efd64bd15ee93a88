use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Retry schedule used while waiting for a purchase to activate.
///
/// Delay `n` (1-based) is `initial_delay_ms * multiplier^(n-1)`, capped at
/// `max_delay_ms`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackoffSchedule {
    pub initial_delay_ms: u64,
    pub multiplier: f64,
    pub max_delay_ms: u64,
    pub max_attempts: u32,
}

impl BackoffSchedule {
    /// v1 defaults: 1000, 1500, 2250, 3375, 5000 ms.
    pub fn defaults() -> Self {
        Self {
            initial_delay_ms: 1000,
            multiplier: 1.5,
            max_delay_ms: 5000,
            max_attempts: 5,
        }
    }

    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1) as i32;
        let raw = self.initial_delay_ms as f64 * self.multiplier.powi(exponent);
        let capped = raw.min(self.max_delay_ms as f64).max(0.0);
        Duration::from_millis(capped.round() as u64)
    }

    pub fn delays(&self) -> Vec<Duration> {
        (1..=self.max_attempts)
            .map(|attempt| self.delay_for_attempt(attempt))
            .collect()
    }

    pub fn total_wait(&self) -> Duration {
        self.delays().into_iter().sum()
    }
}

impl Default for BackoffSchedule {
    fn default() -> Self {
        Self::defaults()
    }
}
