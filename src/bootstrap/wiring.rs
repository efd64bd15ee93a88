//! # Dependency Injection / 依赖注入模块
//!
//! Assembles the use cases from the host's port implementations and the
//! infrastructure adapters. Assembly only: no decisions are made here.
//!
//! > **This is the only place allowed to depend on pg-infra and pg-app simultaneously.**
//! > **这是唯一允许同时依赖 pg-infra 和 pg-app 的地方。**

use std::sync::Arc;

use tokio::sync::watch;
use tracing::info;

use pg_app::{ActivationWaiter, ReconciliationController, ReconciliationDeps, ReconciliationError};
use pg_core::config::GateConfig;
use pg_core::entitlement::PremiumStatus;
use pg_core::ports::{
    AuthPort, ClockPort, EntitlementOraclePort, LocalGrantStorePort, NavigatorPort,
    PremiumRefreshPort, ProfileMirrorPort,
};
use pg_infra::fs::resolve_data_dir;
use pg_infra::{FileSilentRestoreFlagRepository, SystemClock};

/// Result type for wiring operations
pub type WiringResult<T> = Result<T, WiringError>;

/// Errors during dependency injection
/// 依赖注入错误
#[derive(Debug, thiserror::Error)]
pub enum WiringError {
    #[error("Data directory resolution failed: {0}")]
    DataDir(String),
}

/// Adapters supplied by the host application: the purchase SDK wrapper,
/// the remote profile store, the on-device catalog and the UI shell.
pub struct HostPorts {
    pub oracle: Arc<dyn EntitlementOraclePort>,
    pub profile: Arc<dyn ProfileMirrorPort>,
    pub grants: Arc<dyn LocalGrantStorePort>,
    pub refresh: Arc<dyn PremiumRefreshPort>,
    pub navigator: Arc<dyn NavigatorPort>,
}

/// Assembled runtime. One per process; owns the reconciliation controller.
pub struct PremiumGateApp {
    pub(crate) controller: Arc<ReconciliationController>,
    pub(crate) grants: Arc<dyn LocalGrantStorePort>,
    pub(crate) navigator: Arc<dyn NavigatorPort>,
    pub(crate) clock: Arc<dyn ClockPort>,
    pub(crate) config: GateConfig,
}

impl PremiumGateApp {
    /// Follow `auth` and keep entitlements reconciled for its identity.
    pub async fn start(&self, auth: Arc<dyn AuthPort>) -> Result<(), ReconciliationError> {
        self.controller.start(auth).await
    }

    pub async fn stop(&self) {
        self.controller.stop().await
    }

    pub fn premium_status(&self) -> watch::Receiver<PremiumStatus> {
        self.controller.premium_status()
    }

    pub fn controller(&self) -> &Arc<ReconciliationController> {
        &self.controller
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }
}

pub fn wire_dependencies(config: &GateConfig, host: HostPorts) -> WiringResult<PremiumGateApp> {
    let data_dir = resolve_data_dir(config.data_dir.as_deref())
        .map_err(|e| WiringError::DataDir(e.to_string()))?;
    info!(data_dir = %data_dir.display(), "Wiring premium gate");

    let waiter = Arc::new(ActivationWaiter::new(
        host.oracle.clone(),
        config.activation.clone(),
        config.request_timeout,
    ));

    let controller = ReconciliationController::new(ReconciliationDeps {
        oracle: host.oracle,
        profile: host.profile,
        restore_flag: Arc::new(FileSilentRestoreFlagRepository::with_defaults(data_dir)),
        refresh: host.refresh,
        waiter,
        request_timeout: config.request_timeout,
    });

    Ok(PremiumGateApp {
        controller: Arc::new(controller),
        grants: host.grants,
        navigator: host.navigator,
        clock: Arc::new(SystemClock),
        config: config.clone(),
    })
}
