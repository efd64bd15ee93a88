//! Wait for a fresh purchase or restore to show up as premium.
//!
//! The platform's local entitlement cache can lag an actual purchase by
//! several seconds, even on the purchasing device. This use case masks that
//! lag with a bounded backoff instead of telling a paying user "no".

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, info_span, warn, Instrument};

use pg_core::config::BackoffSchedule;
use pg_core::entitlement::EntitlementSnapshot;
use pg_core::ports::{EntitlementError, EntitlementOraclePort};

use super::bounded::bounded;

pub const ACTIVATION_PENDING_MESSAGE: &str =
    "Purchase received, activation is still pending. Check again in a moment.";

/// Result of one activation wait.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivationOutcome {
    pub success: bool,
    pub final_snapshot: Option<EntitlementSnapshot>,
    /// Check on which premium was observed; the budget when exhausted.
    pub attempts: u32,
    pub error: Option<String>,
}

impl ActivationOutcome {
    fn activated(snapshot: EntitlementSnapshot, attempts: u32) -> Self {
        Self {
            success: true,
            final_snapshot: Some(snapshot),
            attempts,
            error: None,
        }
    }

    fn pending(attempts: u32) -> Self {
        Self {
            success: false,
            final_snapshot: None,
            attempts,
            error: Some(ACTIVATION_PENDING_MESSAGE.to_string()),
        }
    }
}

/// Use case for waiting until the platform reports premium after a purchase.
///
/// ## Behavior
///
/// - Already premium: returns immediately with `attempts = 1`.
/// - Otherwise re-checks up to `schedule.max_attempts` times, sleeping the
///   schedule's delay before each re-check.
/// - The first re-check forces a platform re-validation; later ones read the
///   cached snapshot.
pub struct ActivationWaiter {
    oracle: Arc<dyn EntitlementOraclePort>,
    schedule: BackoffSchedule,
    request_timeout: Duration,
}

impl ActivationWaiter {
    pub fn new(
        oracle: Arc<dyn EntitlementOraclePort>,
        schedule: BackoffSchedule,
        request_timeout: Duration,
    ) -> Self {
        Self {
            oracle,
            schedule,
            request_timeout,
        }
    }

    pub fn schedule(&self) -> &BackoffSchedule {
        &self.schedule
    }

    pub async fn wait_for_activation(&self, snapshot: EntitlementSnapshot) -> ActivationOutcome {
        let span = info_span!("usecase.activation_waiter.wait_for_activation");

        async {
            if snapshot.has_premium {
                debug!("Entitlement already active");
                return ActivationOutcome::activated(snapshot, 1);
            }

            for attempt in 1..=self.schedule.max_attempts {
                let delay = self.schedule.delay_for_attempt(attempt);
                debug!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "Waiting before activation re-check"
                );
                tokio::time::sleep(delay).await;

                if let Some(current) = self.recheck(attempt).await {
                    if current.has_premium {
                        info!(attempt, "Entitlement activated");
                        return ActivationOutcome::activated(current, attempt);
                    }
                }
            }

            warn!(
                attempts = self.schedule.max_attempts,
                "Entitlement still inactive after retry budget"
            );
            ActivationOutcome::pending(self.schedule.max_attempts)
        }
        .instrument(span)
        .await
    }

    async fn recheck(&self, attempt: u32) -> Option<EntitlementSnapshot> {
        if attempt > 1 {
            return self.oracle.snapshot();
        }

        match bounded(
            self.request_timeout,
            self.oracle.force_resync(),
            EntitlementError::Timeout,
        )
        .await
        {
            Ok(snapshot) => Some(snapshot),
            Err(err) => {
                warn!(
                    error = %err,
                    "Forced re-validation failed, falling back to cached entitlement"
                );
                self.oracle.snapshot()
            }
        }
    }
}
