//! UI-facing hooks.
//!
//! Thin handles over the use cases, shaped for a render loop: `view()` is
//! synchronous, loading happens on a spawned task that dies with the handle.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use pg_app::{
    AccessGate, AccessGateDeps, AccessView, ActivationOutcome, ReconciliationController,
    ReconciliationError,
};
use pg_core::catalog::ContentDate;
use pg_core::entitlement::{EntitlementSnapshot, PremiumStatus};
use pg_core::ids::ContentId;

use crate::bootstrap::PremiumGateApp;

/// Access decision for one mounted content view.
///
/// Dropping the handle is the unmount: the pending catalog load is aborted
/// and the navigation guard goes with the gate.
pub struct AccessGateHandle {
    gate: Arc<AccessGate>,
    loader: JoinHandle<()>,
}

impl AccessGateHandle {
    /// Current decision. Runs the one-shot redirect when settled and denied.
    pub fn view(&self) -> AccessView {
        self.gate.render()
    }

    pub fn content_id(&self) -> &ContentId {
        self.gate.content_id()
    }

    /// Resolves when the initial catalog load finished.
    pub async fn loaded(&mut self) {
        if self.loader.is_finished() {
            return;
        }
        match (&mut self.loader).await {
            Ok(()) => {}
            Err(err) if err.is_cancelled() => {
                debug!(content_id = %self.gate.content_id(), "Catalog load cancelled");
            }
            Err(err) => {
                warn!(
                    content_id = %self.gate.content_id(),
                    error = %err,
                    "Catalog load task failed"
                );
            }
        }
    }

    /// Reload catalog inputs, e.g. after the catalog synced.
    pub fn refresh(&mut self) {
        self.loader.abort();
        self.loader = spawn_load(&self.gate);
    }

    /// Premium updates to re-render on.
    pub fn premium_updates(&self) -> watch::Receiver<PremiumStatus> {
        self.gate.premium_updates()
    }
}

impl Drop for AccessGateHandle {
    fn drop(&mut self) {
        self.loader.abort();
    }
}

/// UI-triggered reconciliation operations.
#[derive(Clone)]
pub struct ReconciliationHandle {
    controller: Arc<ReconciliationController>,
}

impl ReconciliationHandle {
    pub async fn force_sync(&self) -> Result<EntitlementSnapshot, ReconciliationError> {
        self.controller.force_sync().await
    }

    pub async fn manual_restore(&self) -> Result<ActivationOutcome, ReconciliationError> {
        self.controller.manual_restore().await
    }
}

impl PremiumGateApp {
    /// Mount an access gate for `content_id`.
    ///
    /// `date_hint` is the date the caller already knows (e.g. from a list
    /// row); it is used until the catalog row loads. Must be called inside a
    /// tokio runtime.
    pub fn use_access_decision(
        &self,
        content_id: ContentId,
        date_hint: Option<ContentDate>,
    ) -> AccessGateHandle {
        let gate = Arc::new(AccessGate::new(
            content_id,
            date_hint,
            AccessGateDeps {
                grants: self.grants.clone(),
                navigator: self.navigator.clone(),
                clock: self.clock.clone(),
                premium: self.controller.premium_status(),
                config: self.config.access,
                request_timeout: self.config.request_timeout,
            },
        ));
        let loader = spawn_load(&gate);

        AccessGateHandle { gate, loader }
    }

    pub fn use_reconciliation(&self) -> ReconciliationHandle {
        ReconciliationHandle {
            controller: self.controller.clone(),
        }
    }
}

fn spawn_load(gate: &Arc<AccessGate>) -> JoinHandle<()> {
    let gate = Arc::clone(gate);
    tokio::spawn(async move { gate.load().await })
}
