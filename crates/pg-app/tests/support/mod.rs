//! Hand-written fakes for the pg-app integration tests.
//!
//! Oracle and profile calls are recorded into one shared log so tests can
//! assert cross-port ordering (logout before the next identify, etc).

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, watch};

use pg_app::{ActivationWaiter, ReconciliationController, ReconciliationDeps};
use pg_core::catalog::{AdUnlockGrant, ContentMetadata};
use pg_core::config::BackoffSchedule;
use pg_core::entitlement::EntitlementSnapshot;
use pg_core::ids::{ContentId, UserId};
use pg_core::ports::{
    AuthPort, AuthState, ClockPort, EntitlementError, EntitlementOraclePort, GrantStoreError,
    LocalGrantStorePort, NavigatorPort, PremiumRefreshPort, ProfileMirrorError, ProfileMirrorPort,
    SilentRestoreFlagPort,
};
use pg_core::profile::ProfilePremiumState;
use pg_core::reconciliation::ReconciliationState;
use pg_core::{AccessReason, PremiumStatus};

pub type CallLog = Arc<Mutex<Vec<String>>>;

pub fn calls(log: &CallLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

// ---------------------------------------------------------------------------
// Purchase platform
// ---------------------------------------------------------------------------

#[derive(Default)]
struct OracleState {
    bound: Option<UserId>,
    /// Entitlement the platform reports per identity.
    premium: HashMap<UserId, EntitlementSnapshot>,
    /// What `restore_purchases` finds per identity.
    restorable: HashMap<UserId, EntitlementSnapshot>,
    push: Option<mpsc::Sender<EntitlementSnapshot>>,
}

pub struct FakeOracle {
    log: CallLog,
    state: Mutex<OracleState>,
    identify_delay: Mutex<Duration>,
    fail_identify: AtomicBool,
}

impl FakeOracle {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            state: Mutex::new(OracleState::default()),
            identify_delay: Mutex::new(Duration::ZERO),
            fail_identify: AtomicBool::new(false),
        }
    }

    pub fn set_entitlement(&self, user_id: &str, snapshot: EntitlementSnapshot) {
        self.state
            .lock()
            .unwrap()
            .premium
            .insert(UserId::from(user_id), snapshot);
    }

    pub fn set_restorable(&self, user_id: &str, snapshot: EntitlementSnapshot) {
        self.state
            .lock()
            .unwrap()
            .restorable
            .insert(UserId::from(user_id), snapshot);
    }

    pub fn set_identify_delay(&self, delay: Duration) {
        *self.identify_delay.lock().unwrap() = delay;
    }

    pub fn fail_identify(&self, fail: bool) {
        self.fail_identify.store(fail, Ordering::SeqCst);
    }

    /// Push a snapshot to the current subscriber. False when nobody listens.
    pub async fn push(&self, snapshot: EntitlementSnapshot) -> bool {
        let sender = self.state.lock().unwrap().push.clone();
        match sender {
            Some(sender) => sender.send(snapshot).await.is_ok(),
            None => false,
        }
    }

    pub fn push_channel_closed(&self) -> bool {
        self.state
            .lock()
            .unwrap()
            .push
            .as_ref()
            .map(|sender| sender.is_closed())
            .unwrap_or(true)
    }

    fn record(&self, call: String) {
        self.log.lock().unwrap().push(call);
    }

    fn current(&self) -> EntitlementSnapshot {
        let state = self.state.lock().unwrap();
        state
            .bound
            .as_ref()
            .and_then(|user| state.premium.get(user).cloned())
            .unwrap_or_else(EntitlementSnapshot::free)
    }
}

#[async_trait]
impl EntitlementOraclePort for FakeOracle {
    async fn identify(&self, user_id: &UserId) -> Result<EntitlementSnapshot, EntitlementError> {
        self.record(format!("identify:{user_id}"));
        let delay = *self.identify_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.fail_identify.load(Ordering::SeqCst) {
            return Err(EntitlementError::Network("offline".to_string()));
        }
        self.state.lock().unwrap().bound = Some(user_id.clone());
        Ok(self.current())
    }

    async fn logout(&self) {
        self.record("logout".to_string());
        self.state.lock().unwrap().bound = None;
    }

    fn snapshot(&self) -> Option<EntitlementSnapshot> {
        Some(self.current())
    }

    async fn force_resync(&self) -> Result<EntitlementSnapshot, EntitlementError> {
        self.record("force_resync".to_string());
        Ok(self.current())
    }

    async fn restore_purchases(&self) -> Result<EntitlementSnapshot, EntitlementError> {
        self.record("restore_purchases".to_string());
        let mut state = self.state.lock().unwrap();
        let Some(user) = state.bound.clone() else {
            return Ok(EntitlementSnapshot::free());
        };
        match state.restorable.get(&user).cloned() {
            Some(restored) => {
                state.premium.insert(user, restored.clone());
                Ok(restored)
            }
            None => Ok(EntitlementSnapshot::free()),
        }
    }

    async fn subscribe(&self) -> Result<mpsc::Receiver<EntitlementSnapshot>, EntitlementError> {
        self.record("subscribe".to_string());
        let (tx, rx) = mpsc::channel(16);
        self.state.lock().unwrap().push = Some(tx);
        Ok(rx)
    }
}

// ---------------------------------------------------------------------------
// Profile store
// ---------------------------------------------------------------------------

pub struct FakeProfile {
    log: CallLog,
    rows: Mutex<HashMap<UserId, bool>>,
    writes: Mutex<Vec<(UserId, bool)>>,
    fail_writes: AtomicBool,
}

impl FakeProfile {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            rows: Mutex::new(HashMap::new()),
            writes: Mutex::new(Vec::new()),
            fail_writes: AtomicBool::new(false),
        }
    }

    pub fn set_row(&self, user_id: &str, is_premium: bool) {
        self.rows
            .lock()
            .unwrap()
            .insert(UserId::from(user_id), is_premium);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn writes(&self) -> Vec<(UserId, bool)> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProfileMirrorPort for FakeProfile {
    async fn read_profile_premium(
        &self,
        user_id: &UserId,
    ) -> Result<Option<ProfilePremiumState>, ProfileMirrorError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .get(user_id)
            .map(|is_premium| ProfilePremiumState {
                user_id: user_id.clone(),
                is_premium: *is_premium,
                premium_since: None,
            }))
    }

    async fn write_profile_premium(
        &self,
        user_id: &UserId,
        is_premium: bool,
    ) -> Result<(), ProfileMirrorError> {
        self.log
            .lock()
            .unwrap()
            .push(format!("write_profile:{user_id}:{is_premium}"));
        self.writes
            .lock()
            .unwrap()
            .push((user_id.clone(), is_premium));
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(ProfileMirrorError::Rejected("row locked".to_string()));
        }
        self.rows
            .lock()
            .unwrap()
            .insert(user_id.clone(), is_premium);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Silent restore flag, refresh trigger, auth
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryRestoreFlag {
    attempted: AtomicBool,
    pub marks: AtomicUsize,
}

#[async_trait]
impl SilentRestoreFlagPort for MemoryRestoreFlag {
    async fn is_attempted(&self) -> anyhow::Result<bool> {
        Ok(self.attempted.load(Ordering::SeqCst))
    }

    async fn mark_attempted(&self) -> anyhow::Result<()> {
        self.marks.fetch_add(1, Ordering::SeqCst);
        self.attempted.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingRefresh {
    events: Mutex<Vec<(UserId, bool)>>,
}

impl RecordingRefresh {
    pub fn events(&self) -> Vec<(UserId, bool)> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl PremiumRefreshPort for RecordingRefresh {
    async fn emit_premium_changed(&self, user_id: &UserId, is_premium: bool) {
        self.events
            .lock()
            .unwrap()
            .push((user_id.clone(), is_premium));
    }
}

pub struct FakeAuth {
    tx: watch::Sender<AuthState>,
}

impl FakeAuth {
    pub fn new(initial: AuthState) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    pub fn sign_in(&self, user_id: &str) {
        self.tx.send_replace(AuthState::signed_in(UserId::from(user_id)));
    }

    pub fn sign_out(&self) {
        self.tx.send_replace(AuthState::signed_out());
    }
}

impl AuthPort for FakeAuth {
    fn current_user_id(&self) -> Option<UserId> {
        self.tx.borrow().user_id.clone()
    }

    fn is_initialized(&self) -> bool {
        self.tx.borrow().initialized
    }

    fn subscribe_auth_changes(&self) -> watch::Receiver<AuthState> {
        self.tx.subscribe()
    }
}

// ---------------------------------------------------------------------------
// Catalog, navigator, clock
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeCatalog {
    pub rows: Mutex<HashMap<ContentId, ContentMetadata>>,
    pub grants: Mutex<Vec<AdUnlockGrant>>,
}

impl FakeCatalog {
    pub fn with_row(content_id: &str, date: impl Into<String>) -> Self {
        let catalog = Self::default();
        catalog
            .rows
            .lock()
            .unwrap()
            .insert(ContentId::from(content_id), ContentMetadata::new(date));
        catalog
    }
}

#[async_trait]
impl LocalGrantStorePort for FakeCatalog {
    async fn content_metadata(
        &self,
        content_id: &ContentId,
    ) -> Result<Option<ContentMetadata>, GrantStoreError> {
        Ok(self.rows.lock().unwrap().get(content_id).cloned())
    }

    async fn active_ad_unlocks(&self) -> Result<Vec<AdUnlockGrant>, GrantStoreError> {
        Ok(self.grants.lock().unwrap().clone())
    }
}

#[derive(Default)]
pub struct RecordingNavigator {
    redirects: Mutex<Vec<(ContentId, AccessReason)>>,
}

impl RecordingNavigator {
    pub fn redirects(&self) -> Vec<(ContentId, AccessReason)> {
        self.redirects.lock().unwrap().clone()
    }
}

impl NavigatorPort for RecordingNavigator {
    fn navigate_away(&self, content_id: &ContentId, reason: AccessReason) {
        self.redirects
            .lock()
            .unwrap()
            .push((content_id.clone(), reason));
    }
}

pub struct FixedClock(pub chrono::DateTime<chrono::Utc>);

impl ClockPort for FixedClock {
    fn now_ms(&self) -> i64 {
        self.0.timestamp_millis()
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

pub struct Harness {
    pub log: CallLog,
    pub oracle: Arc<FakeOracle>,
    pub profile: Arc<FakeProfile>,
    pub refresh: Arc<RecordingRefresh>,
    pub controller: ReconciliationController,
}

impl Harness {
    pub fn new(restore_flag: Arc<dyn SilentRestoreFlagPort>) -> Self {
        let log: CallLog = Arc::new(Mutex::new(Vec::new()));
        let oracle = Arc::new(FakeOracle::new(log.clone()));
        let profile = Arc::new(FakeProfile::new(log.clone()));
        let refresh = Arc::new(RecordingRefresh::default());

        let controller = ReconciliationController::new(ReconciliationDeps {
            oracle: oracle.clone(),
            profile: profile.clone(),
            restore_flag,
            refresh: refresh.clone(),
            waiter: Arc::new(ActivationWaiter::new(
                oracle.clone(),
                BackoffSchedule::defaults(),
                Duration::from_secs(10),
            )),
            request_timeout: Duration::from_secs(10),
        });

        Self {
            log,
            oracle,
            profile,
            refresh,
            controller,
        }
    }

    pub async fn wait_for_listening(&self, user_id: &str) {
        let expected = UserId::from(user_id);
        self.wait_for_state(|state| {
            matches!(state, ReconciliationState::Listening { user_id } if *user_id == expected)
        })
        .await;
    }

    pub async fn wait_for_idle(&self) {
        self.wait_for_state(|state| *state == ReconciliationState::Idle)
            .await;
    }

    pub async fn wait_for_state(&self, predicate: impl FnMut(&ReconciliationState) -> bool) {
        let mut lifecycle = self.controller.lifecycle();
        tokio::time::timeout(Duration::from_secs(5), lifecycle.wait_for(predicate))
            .await
            .expect("lifecycle did not reach the expected state")
            .expect("controller dropped");
    }

    pub async fn wait_for_premium(&self, predicate: impl FnMut(&PremiumStatus) -> bool) {
        let mut premium = self.controller.premium_status();
        tokio::time::timeout(Duration::from_secs(5), premium.wait_for(predicate))
            .await
            .expect("premium status did not reach the expected value")
            .expect("controller dropped");
    }
}
