//! Wiring and UI hooks, end to end with in-memory host ports.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tempfile::TempDir;
use tokio::sync::{mpsc, watch};

use pg_app::ReconciliationError;
use pg_core::catalog::{AdUnlockGrant, ContentDate, ContentMetadata};
use pg_core::config::GateConfig;
use pg_core::entitlement::{EntitlementSnapshot, PremiumStatus};
use pg_core::ids::{ContentId, UserId};
use pg_core::ports::{
    AuthPort, AuthState, EntitlementError, EntitlementOraclePort, GrantStoreError,
    LocalGrantStorePort, NavigatorPort, PremiumRefreshPort, ProfileMirrorError, ProfileMirrorPort,
};
use pg_core::profile::ProfilePremiumState;
use pg_core::reconciliation::ReconciliationState;
use pg_core::AccessReason;
use premium_gate_lib::{wire_dependencies, HostPorts, PremiumGateApp};

struct FixedOracle(EntitlementSnapshot);

#[async_trait]
impl EntitlementOraclePort for FixedOracle {
    async fn identify(&self, _user_id: &UserId) -> Result<EntitlementSnapshot, EntitlementError> {
        Ok(self.0.clone())
    }

    async fn logout(&self) {}

    fn snapshot(&self) -> Option<EntitlementSnapshot> {
        Some(self.0.clone())
    }

    async fn force_resync(&self) -> Result<EntitlementSnapshot, EntitlementError> {
        Ok(self.0.clone())
    }

    async fn restore_purchases(&self) -> Result<EntitlementSnapshot, EntitlementError> {
        Ok(self.0.clone())
    }

    async fn subscribe(&self) -> Result<mpsc::Receiver<EntitlementSnapshot>, EntitlementError> {
        let (_tx, rx) = mpsc::channel(1);
        Ok(rx)
    }
}

struct NoProfile;

#[async_trait]
impl ProfileMirrorPort for NoProfile {
    async fn read_profile_premium(
        &self,
        _user_id: &UserId,
    ) -> Result<Option<ProfilePremiumState>, ProfileMirrorError> {
        Ok(None)
    }

    async fn write_profile_premium(
        &self,
        _user_id: &UserId,
        _is_premium: bool,
    ) -> Result<(), ProfileMirrorError> {
        Ok(())
    }
}

#[derive(Default)]
struct Catalog(HashMap<ContentId, ContentMetadata>);

#[async_trait]
impl LocalGrantStorePort for Catalog {
    async fn content_metadata(
        &self,
        content_id: &ContentId,
    ) -> Result<Option<ContentMetadata>, GrantStoreError> {
        Ok(self.0.get(content_id).cloned())
    }

    async fn active_ad_unlocks(&self) -> Result<Vec<AdUnlockGrant>, GrantStoreError> {
        Ok(Vec::new())
    }
}

struct NoRefresh;

#[async_trait]
impl PremiumRefreshPort for NoRefresh {
    async fn emit_premium_changed(&self, _user_id: &UserId, _is_premium: bool) {}
}

#[derive(Default)]
struct Navigator(Mutex<Vec<(ContentId, AccessReason)>>);

impl NavigatorPort for Navigator {
    fn navigate_away(&self, content_id: &ContentId, reason: AccessReason) {
        self.0.lock().unwrap().push((content_id.clone(), reason));
    }
}

struct Auth(watch::Sender<AuthState>);

impl AuthPort for Auth {
    fn current_user_id(&self) -> Option<UserId> {
        self.0.borrow().user_id.clone()
    }

    fn is_initialized(&self) -> bool {
        self.0.borrow().initialized
    }

    fn subscribe_auth_changes(&self) -> watch::Receiver<AuthState> {
        self.0.subscribe()
    }
}

fn auth(state: AuthState) -> Arc<dyn AuthPort> {
    let (tx, _rx) = watch::channel(state);
    Arc::new(Auth(tx))
}

fn days_ago(days: i64) -> String {
    (Utc::now() - chrono::Duration::days(days))
        .date_naive()
        .format("%Y-%m-%d")
        .to_string()
}

struct Fixture {
    _data_dir: TempDir,
    data_path: std::path::PathBuf,
    navigator: Arc<Navigator>,
    app: PremiumGateApp,
}

struct PanickingCatalog;

#[async_trait]
impl LocalGrantStorePort for PanickingCatalog {
    async fn content_metadata(
        &self,
        _content_id: &ContentId,
    ) -> Result<Option<ContentMetadata>, GrantStoreError> {
        panic!("catalog backend crashed");
    }

    async fn active_ad_unlocks(&self) -> Result<Vec<AdUnlockGrant>, GrantStoreError> {
        Ok(Vec::new())
    }
}

fn fixture(entitlement: EntitlementSnapshot, catalog: Catalog) -> Fixture {
    fixture_with_grants(entitlement, Arc::new(catalog))
}

fn fixture_with_grants(
    entitlement: EntitlementSnapshot,
    grants: Arc<dyn LocalGrantStorePort>,
) -> Fixture {
    let data_dir = TempDir::new().unwrap();
    let config = GateConfig {
        data_dir: Some(data_dir.path().to_path_buf()),
        ..GateConfig::defaults()
    };
    let navigator = Arc::new(Navigator::default());

    let app = wire_dependencies(
        &config,
        HostPorts {
            oracle: Arc::new(FixedOracle(entitlement)),
            profile: Arc::new(NoProfile),
            grants,
            refresh: Arc::new(NoRefresh),
            navigator: navigator.clone(),
        },
    )
    .unwrap();

    Fixture {
        data_path: data_dir.path().to_path_buf(),
        _data_dir: data_dir,
        navigator,
        app,
    }
}

async fn wait_for_signed_out(app: &PremiumGateApp) {
    let mut premium = app.premium_status();
    tokio::time::timeout(
        Duration::from_secs(5),
        premium.wait_for(|status| *status == PremiumStatus::signed_out()),
    )
    .await
    .expect("signed-out status never published")
    .expect("controller dropped");
}

async fn wait_for_listening(app: &PremiumGateApp) {
    let mut lifecycle = app.controller().lifecycle();
    tokio::time::timeout(
        Duration::from_secs(5),
        lifecycle.wait_for(|state| matches!(state, ReconciliationState::Listening { .. })),
    )
    .await
    .expect("controller never reached Listening")
    .expect("controller dropped");
}

#[tokio::test]
async fn premium_user_gets_old_content() {
    let mut catalog = Catalog::default();
    catalog
        .0
        .insert(ContentId::from("issue-1"), ContentMetadata::new(days_ago(90)));
    let fixture = fixture(EntitlementSnapshot::lifetime(), catalog);

    fixture
        .app
        .start(auth(AuthState::signed_in(UserId::from("user-a"))))
        .await
        .unwrap();
    wait_for_listening(&fixture.app).await;

    let mut handle = fixture
        .app
        .use_access_decision(ContentId::from("issue-1"), None);
    handle.loaded().await;
    let view = handle.view();

    assert_eq!(view.decision.reason, AccessReason::Premium);
    assert!(!view.is_loading);
    assert!(fixture.navigator.0.lock().unwrap().is_empty());

    fixture.app.stop().await;
}

#[tokio::test]
async fn free_user_is_redirected_once_from_locked_content() {
    let mut catalog = Catalog::default();
    catalog
        .0
        .insert(ContentId::from("issue-2"), ContentMetadata::new(days_ago(30)));
    let fixture = fixture(EntitlementSnapshot::free(), catalog);
    fixture
        .app
        .start(auth(AuthState::signed_out()))
        .await
        .unwrap();
    wait_for_signed_out(&fixture.app).await;

    let mut handle = fixture
        .app
        .use_access_decision(ContentId::from("issue-2"), None);
    handle.loaded().await;
    for _ in 0..3 {
        assert_eq!(handle.view().decision.reason, AccessReason::DeniedLocked);
    }

    assert_eq!(fixture.navigator.0.lock().unwrap().len(), 1);

    fixture.app.stop().await;
}

#[tokio::test]
async fn crashed_catalog_load_leaves_view_loading() {
    let fixture = fixture_with_grants(EntitlementSnapshot::free(), Arc::new(PanickingCatalog));

    let mut handle = fixture
        .app
        .use_access_decision(ContentId::from("issue-4"), None);
    handle.loaded().await;
    handle.loaded().await;
    let view = handle.view();

    assert!(view.is_loading);
    assert_eq!(view.decision.reason, AccessReason::Pending);
    assert!(fixture.navigator.0.lock().unwrap().is_empty());
}

#[tokio::test]
async fn date_hint_covers_unsynced_catalog_row() {
    let fixture = fixture(EntitlementSnapshot::free(), Catalog::default());
    let hint = ContentDate::parse(&days_ago(2)).ok();

    let mut handle = fixture
        .app
        .use_access_decision(ContentId::from("issue-3"), hint);
    handle.loaded().await;
    let view = handle.view();

    assert!(view.decision.allowed);
    assert_eq!(view.decision.reason, AccessReason::WithinFreeWindow);
}

#[tokio::test]
async fn reconciliation_hook_requires_sign_in() {
    let fixture = fixture(EntitlementSnapshot::free(), Catalog::default());

    let result = fixture.app.use_reconciliation().force_sync().await;

    assert!(matches!(result, Err(ReconciliationError::NotSignedIn)));
}

#[tokio::test]
async fn silent_restore_flag_lands_in_configured_data_dir() {
    let fixture = fixture(EntitlementSnapshot::free(), Catalog::default());

    fixture
        .app
        .start(auth(AuthState::signed_in(UserId::from("user-a"))))
        .await
        .unwrap();
    wait_for_listening(&fixture.app).await;

    let flag_file = fixture
        .data_path
        .join(pg_infra::restore_flag::DEFAULT_RESTORE_FLAG_FILE);
    assert!(flag_file.exists());

    fixture.app.stop().await;
}
