use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, info_span, warn, Instrument};

use pg_core::access::{
    AccessConfig, AccessDecision, AccessInputs, AccessPolicy, GuardOutcome, NavigationGuard,
};
use pg_core::catalog::{AdUnlockGrant, ContentDate};
use pg_core::entitlement::PremiumStatus;
use pg_core::ids::ContentId;
use pg_core::ports::{ClockPort, GrantStoreError, LocalGrantStorePort, NavigatorPort};

use crate::usecases::bounded::bounded;

/// Dependencies of one gate.
pub struct AccessGateDeps {
    pub grants: Arc<dyn LocalGrantStorePort>,
    pub navigator: Arc<dyn NavigatorPort>,
    pub clock: Arc<dyn ClockPort>,
    pub premium: watch::Receiver<PremiumStatus>,
    pub config: AccessConfig,
    pub request_timeout: Duration,
}

/// What render code shows for one content unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessView {
    pub decision: AccessDecision,
    /// True while the catalog row or the ad-unlock grants are still loading.
    pub is_loading: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MetadataState {
    Loading,
    /// Load finished; `None` covers "no row", read failures and bad dates.
    Loaded(Option<ContentDate>),
}

#[derive(Debug)]
struct GateInputs {
    metadata: MetadataState,
    ad_unlocks: Vec<AdUnlockGrant>,
    grants_loaded: bool,
}

/// Access gate for one mounted content view.
///
/// `render()` is synchronous and infallible. `load()` refreshes the catalog
/// inputs; every call it makes is bounded by the request timeout so a hung
/// store resolves into the missing-data path instead of an endless spinner.
pub struct AccessGate {
    content_id: ContentId,
    date_hint: Option<ContentDate>,
    grants: Arc<dyn LocalGrantStorePort>,
    navigator: Arc<dyn NavigatorPort>,
    clock: Arc<dyn ClockPort>,
    premium: watch::Receiver<PremiumStatus>,
    config: AccessConfig,
    request_timeout: Duration,
    inputs: Mutex<GateInputs>,
    guard: Mutex<NavigationGuard>,
}

impl AccessGate {
    pub fn new(
        content_id: ContentId,
        date_hint: Option<ContentDate>,
        deps: AccessGateDeps,
    ) -> Self {
        Self {
            content_id,
            date_hint,
            grants: deps.grants,
            navigator: deps.navigator,
            clock: deps.clock,
            premium: deps.premium,
            config: deps.config,
            request_timeout: deps.request_timeout,
            inputs: Mutex::new(GateInputs {
                metadata: MetadataState::Loading,
                ad_unlocks: Vec::new(),
                grants_loaded: false,
            }),
            guard: Mutex::new(NavigationGuard::new()),
        }
    }

    pub fn content_id(&self) -> &ContentId {
        &self.content_id
    }

    /// Premium updates, for callers that re-render on change.
    pub fn premium_updates(&self) -> watch::Receiver<PremiumStatus> {
        self.premium.clone()
    }

    /// Compute the current decision and run the one-shot redirect.
    pub fn render(&self) -> AccessView {
        let now = self.clock.now_utc();
        let premium = *self.premium.borrow();
        let is_premium = premium.is_premium;

        let (decision, is_loading) = {
            let inputs = self.inputs.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            let date_loading = inputs.metadata == MetadataState::Loading;
            let loaded_date = match inputs.metadata {
                MetadataState::Loaded(date) => date,
                MetadataState::Loading => None,
            };

            let decision = AccessPolicy::decide(
                &AccessInputs {
                    now,
                    content_date: loaded_date.or(self.date_hint),
                    date_loading,
                    is_premium,
                    is_ad_unlocked: AdUnlockGrant::unlocks(
                        &inputs.ad_unlocks,
                        &self.content_id,
                        now,
                    ),
                },
                &self.config,
            );
            (decision, date_loading || !inputs.grants_loaded)
        };

        // Partial inputs may still flip: a denial before premium is known, or
        // a grant from a stale date hint. Only an entitlement the user holds
        // counts before everything has settled.
        let settled = !is_loading && premium.is_settled();
        if settled || decision.is_entitled() {
            self.observe(&decision);
        }

        AccessView {
            decision,
            is_loading,
        }
    }

    /// Load the catalog row and the ad-unlock grants concurrently.
    pub async fn load(&self) {
        let span = info_span!("usecase.access_gate.load", content_id = %self.content_id);

        async {
            tokio::join!(self.load_metadata(), self.load_ad_unlocks());
        }
        .instrument(span)
        .await
    }

    fn observe(&self, decision: &AccessDecision) {
        let outcome = self
            .guard
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .observe(&self.content_id, decision);

        match outcome {
            GuardOutcome::Redirect => {
                info!(
                    content_id = %self.content_id,
                    reason = ?decision.reason,
                    "Access denied, navigating away"
                );
                self.navigator.navigate_away(&self.content_id, decision.reason);
            }
            GuardOutcome::KeepViewing => {
                debug!(
                    content_id = %self.content_id,
                    reason = ?decision.reason,
                    "Denied while viewing, not ejecting"
                );
            }
            GuardOutcome::AlreadyRedirected | GuardOutcome::None => {}
        }
    }

    async fn load_metadata(&self) {
        let loaded = bounded(
            self.request_timeout,
            self.grants.content_metadata(&self.content_id),
            GrantStoreError::Timeout,
        )
        .await;

        let date = match loaded {
            Ok(Some(metadata)) => match metadata.content_date() {
                Ok(date) => Some(date),
                Err(err) => {
                    warn!(
                        content_id = %self.content_id,
                        error = %err,
                        "Malformed content date, treating as missing"
                    );
                    None
                }
            },
            Ok(None) => {
                debug!(content_id = %self.content_id, "No catalog row for content");
                None
            }
            Err(err) => {
                warn!(
                    content_id = %self.content_id,
                    error = %err,
                    "Catalog lookup failed, treating as missing"
                );
                None
            }
        };

        self.inputs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .metadata = MetadataState::Loaded(date);
    }

    async fn load_ad_unlocks(&self) {
        let grants = match bounded(
            self.request_timeout,
            self.grants.active_ad_unlocks(),
            GrantStoreError::Timeout,
        )
        .await
        {
            Ok(grants) => grants,
            Err(err) => {
                warn!(error = %err, "Ad-unlock lookup failed, assuming none");
                Vec::new()
            }
        };

        let mut inputs = self.inputs.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        inputs.ad_unlocks = grants;
        inputs.grants_loaded = true;
    }
}
