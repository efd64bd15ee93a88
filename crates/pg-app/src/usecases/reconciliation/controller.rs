//! Reconciliation controller.
//!
//! Owns one event loop per started instance. Auth changes and internal
//! lifecycle events are serialized through that loop and fed to the pure
//! `ReconciliationStateMachine`; the returned actions are executed here.
//! Identify/restore runs in a spawned sync task and pushes are applied by a
//! spawned listener task, so a sign-out never waits on a slow network call.

use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, info_span, warn, Instrument};

use pg_core::entitlement::{EntitlementSnapshot, PremiumStatus};
use pg_core::ids::UserId;
use pg_core::ports::{
    AuthPort, AuthState, EntitlementError, EntitlementOraclePort, PremiumRefreshPort,
    ProfileMirrorError, ProfileMirrorPort, SilentRestoreFlagPort,
};
use pg_core::reconciliation::{
    ReconciliationAction, ReconciliationEvent, ReconciliationState, ReconciliationStateMachine,
    TransitionError,
};

use super::run_state::{SyncRunSnapshot, SyncRunState};
use crate::usecases::activation::{ActivationOutcome, ActivationWaiter};
use crate::usecases::bounded::bounded;

/// Errors returned to UI-facing callers.
#[derive(Debug, thiserror::Error)]
pub enum ReconciliationError {
    #[error("no signed-in identity is bound")]
    NotSignedIn,

    #[error("entitlement check failed: {0}")]
    Entitlement(#[from] EntitlementError),

    #[error("reconciliation controller already started")]
    AlreadyStarted,
}

/// What `apply_snapshot` did with a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Premium changed and the profile mirror accepted the write.
    Written,
    /// Premium changed; the profile write failed and was logged.
    WriteFailed,
    /// Same value as the last applied one; nothing written.
    Unchanged,
    /// Computed for an identity that is no longer bound; dropped.
    Stale,
}

/// Dependencies of the controller.
pub struct ReconciliationDeps {
    pub oracle: Arc<dyn EntitlementOraclePort>,
    pub profile: Arc<dyn ProfileMirrorPort>,
    pub restore_flag: Arc<dyn SilentRestoreFlagPort>,
    pub refresh: Arc<dyn PremiumRefreshPort>,
    pub waiter: Arc<ActivationWaiter>,
    pub request_timeout: Duration,
}

#[derive(Debug)]
enum ControllerEvent {
    Lifecycle(ReconciliationEvent),
    Shutdown,
}

type EventReceiver = mpsc::UnboundedReceiver<ControllerEvent>;

/// Binds entitlement reconciliation to the signed-in identity.
///
/// An explicit owned instance: `start` spawns its event loop, `stop` tears
/// everything down. Separate instances share nothing.
pub struct ReconciliationController {
    inner: Arc<ControllerInner>,
    events_rx: StdMutex<Option<EventReceiver>>,
    running: Mutex<Option<JoinHandle<EventReceiver>>>,
}

struct ControllerInner {
    oracle: Arc<dyn EntitlementOraclePort>,
    profile: Arc<dyn ProfileMirrorPort>,
    restore_flag: Arc<dyn SilentRestoreFlagPort>,
    refresh: Arc<dyn PremiumRefreshPort>,
    waiter: Arc<ActivationWaiter>,
    request_timeout: Duration,

    run: Mutex<SyncRunState>,
    lifecycle_tx: watch::Sender<ReconciliationState>,
    premium_tx: watch::Sender<PremiumStatus>,
    events_tx: mpsc::UnboundedSender<ControllerEvent>,
}

impl ReconciliationController {
    pub fn new(deps: ReconciliationDeps) -> Self {
        let ReconciliationDeps {
            oracle,
            profile,
            restore_flag,
            refresh,
            waiter,
            request_timeout,
        } = deps;

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (lifecycle_tx, _) = watch::channel(ReconciliationState::Idle);
        let (premium_tx, _) = watch::channel(PremiumStatus::unknown());

        Self {
            inner: Arc::new(ControllerInner {
                oracle,
                profile,
                restore_flag,
                refresh,
                waiter,
                request_timeout,
                run: Mutex::new(SyncRunState::default()),
                lifecycle_tx,
                premium_tx,
                events_tx,
            }),
            events_rx: StdMutex::new(Some(events_rx)),
            running: Mutex::new(None),
        }
    }

    /// Start following `auth`. The current auth state is processed first.
    pub async fn start(&self, auth: Arc<dyn AuthPort>) -> Result<(), ReconciliationError> {
        let mut running = self.running.lock().await;
        if running.is_some() {
            error!("Reconciliation controller started twice");
            return Err(ReconciliationError::AlreadyStarted);
        }

        let events_rx = self
            .events_rx
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
            .ok_or(ReconciliationError::AlreadyStarted)?;

        info!("Starting entitlement reconciliation");
        *running = Some(tokio::spawn(run_loop(
            Arc::clone(&self.inner),
            auth,
            events_rx,
        )));
        Ok(())
    }

    /// Tear down the bound identity (unsubscribe, logout, clear) and stop
    /// the event loop. The persisted silent-restore flag is untouched.
    pub async fn stop(&self) {
        let Some(task) = self.running.lock().await.take() else {
            debug!("Reconciliation controller not running");
            return;
        };

        let _ = self.inner.events_tx.send(ControllerEvent::Shutdown);
        match task.await {
            Ok(events_rx) => {
                *self
                    .events_rx
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(events_rx);
                info!("Entitlement reconciliation stopped");
            }
            Err(err) => error!(error = %err, "Reconciliation event loop ended abnormally"),
        }
    }

    /// Published premium status, readable synchronously by render code.
    pub fn premium_status(&self) -> watch::Receiver<PremiumStatus> {
        self.inner.premium_tx.subscribe()
    }

    pub fn lifecycle(&self) -> watch::Receiver<ReconciliationState> {
        self.inner.lifecycle_tx.subscribe()
    }

    pub async fn run_state(&self) -> SyncRunSnapshot {
        self.inner.run.lock().await.snapshot()
    }

    /// Apply a snapshot computed for `user_id`.
    ///
    /// Writes the profile mirror only when premium changed against the last
    /// applied value. The in-memory value is updated before the write, so a
    /// push arriving mid-write compares against the new value.
    pub async fn apply_snapshot(
        &self,
        user_id: &UserId,
        snapshot: &EntitlementSnapshot,
    ) -> ApplyOutcome {
        self.inner.apply_snapshot(user_id, snapshot).await
    }

    /// Force a platform re-validation for the bound identity and apply it.
    pub async fn force_sync(&self) -> Result<EntitlementSnapshot, ReconciliationError> {
        let span = info_span!("usecase.reconciliation.force_sync");

        async {
            let user_id = self.current_user().await?;
            let snapshot = bounded(
                self.inner.request_timeout,
                self.inner.oracle.force_resync(),
                EntitlementError::Timeout,
            )
            .await?;

            self.inner.apply_snapshot(&user_id, &snapshot).await;
            Ok(snapshot)
        }
        .instrument(span)
        .await
    }

    /// User-initiated restore: restore, wait out activation lag, apply.
    pub async fn manual_restore(&self) -> Result<ActivationOutcome, ReconciliationError> {
        let span = info_span!("usecase.reconciliation.manual_restore");

        async {
            let user_id = self.current_user().await?;
            let restored = bounded(
                self.inner.request_timeout,
                self.inner.oracle.restore_purchases(),
                EntitlementError::Timeout,
            )
            .await?;

            let outcome = self.inner.waiter.wait_for_activation(restored.clone()).await;
            let converged = outcome.final_snapshot.clone().unwrap_or(restored);
            self.inner.apply_snapshot(&user_id, &converged).await;

            info!(
                success = outcome.success,
                attempts = outcome.attempts,
                "Manual restore finished"
            );
            Ok(outcome)
        }
        .instrument(span)
        .await
    }

    async fn current_user(&self) -> Result<UserId, ReconciliationError> {
        self.inner
            .run
            .lock()
            .await
            .current_user_id
            .clone()
            .ok_or(ReconciliationError::NotSignedIn)
    }
}

impl Drop for ReconciliationController {
    fn drop(&mut self) {
        if let Ok(mut running) = self.running.try_lock() {
            if let Some(task) = running.take() {
                task.abort();
            }
        }
        if let Ok(mut run) = self.inner.run.try_lock() {
            run.abort_tasks();
        }
    }
}

/// Owns `auth` for as long as the loop runs.
async fn run_loop(
    inner: Arc<ControllerInner>,
    auth: Arc<dyn AuthPort>,
    mut events_rx: EventReceiver,
) -> EventReceiver {
    let mut auth_rx = auth.subscribe_auth_changes();
    let initial = auth_rx.borrow_and_update().clone();
    inner.on_auth_state(initial).await;

    loop {
        tokio::select! {
            changed = auth_rx.changed() => {
                if changed.is_err() {
                    warn!("Auth provider closed its channel, stopping reconciliation");
                    break;
                }
                let auth = auth_rx.borrow_and_update().clone();
                inner.on_auth_state(auth).await;
            }
            event = events_rx.recv() => match event {
                Some(ControllerEvent::Lifecycle(event)) => inner.dispatch(event).await,
                Some(ControllerEvent::Shutdown) | None => break,
            },
        }
    }

    inner.dispatch(ReconciliationEvent::SignedOut).await;
    events_rx
}

impl ControllerInner {
    async fn on_auth_state(self: &Arc<Self>, auth: AuthState) {
        if !auth.initialized {
            debug!("Auth not initialized yet, waiting");
            return;
        }

        match auth.user_id {
            Some(user_id) => {
                self.dispatch(ReconciliationEvent::IdentityAvailable { user_id })
                    .await
            }
            None => {
                self.dispatch(ReconciliationEvent::SignedOut).await;
                self.premium_tx.send_replace(PremiumStatus::signed_out());
            }
        }
    }

    async fn dispatch(self: &Arc<Self>, event: ReconciliationEvent) {
        let span = info_span!("usecase.reconciliation.dispatch", event = ?event);

        async {
            let current = self.lifecycle_tx.borrow().clone();
            match ReconciliationStateMachine::transition(current.clone(), event) {
                Ok((next, actions)) => {
                    for action in actions {
                        debug!(?action, "Reconciliation executing action");
                        self.execute(action).await;
                    }
                    if next != current {
                        info!(from = ?current, to = ?next, "Reconciliation state transition");
                    }
                    self.lifecycle_tx.send_replace(next);
                }
                Err(err @ TransitionError::Stale { .. }) => {
                    debug!(error = %err, "Dropping stale reconciliation event");
                }
                Err(err) => {
                    error!(error = %err, "Reconciliation configuration error");
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn execute(self: &Arc<Self>, action: ReconciliationAction) {
        match action {
            ReconciliationAction::TearDown { user_id } => self.tear_down(&user_id).await,
            ReconciliationAction::BeginSync { user_id } => self.begin_sync(user_id).await,
            ReconciliationAction::Subscribe { user_id } => self.subscribe(user_id).await,
        }
    }

    /// Unsubscribe, then logout, then clear. Unsubscribing is synchronous
    /// and happens before `logout()` is awaited, so no late push can be
    /// applied against the outgoing identity.
    async fn tear_down(&self, user_id: &UserId) {
        {
            let mut run = self.run.lock().await;
            run.abort_tasks();
            run.current_user_id = None;
        }

        info!(user_id = %user_id, "Unsubscribed, logging out of purchase platform");
        if tokio::time::timeout(self.request_timeout, self.oracle.logout())
            .await
            .is_err()
        {
            warn!(user_id = %user_id, "Purchase platform logout timed out");
        }

        let mut run = self.run.lock().await;
        run.last_known_premium = None;
        self.premium_tx.send_replace(PremiumStatus::unknown());
    }

    async fn begin_sync(self: &Arc<Self>, user_id: UserId) {
        let mut run = self.run.lock().await;
        run.current_user_id = Some(user_id.clone());
        run.last_known_premium = None;
        self.premium_tx.send_replace(PremiumStatus::unknown());

        let task = tokio::spawn(Arc::clone(self).run_sync(user_id));
        run.sync_task = Some(task.abort_handle());
    }

    async fn subscribe(self: &Arc<Self>, user_id: UserId) {
        let receiver = match bounded(
            self.request_timeout,
            self.oracle.subscribe(),
            EntitlementError::Timeout,
        )
        .await
        {
            Ok(receiver) => receiver,
            Err(err) => {
                warn!(user_id = %user_id, error = %err, "Entitlement push subscription failed");
                return;
            }
        };

        let mut run = self.run.lock().await;
        if !run.is_current(&user_id) {
            debug!(user_id = %user_id, "Identity changed before subscription completed");
            return;
        }
        if run.listener.is_some() {
            error!(
                user_id = %user_id,
                "Entitlement listener already registered, ignoring subscribe"
            );
            return;
        }

        run.sync_task = None;
        let listener = tokio::spawn(Arc::clone(self).listen(user_id, receiver));
        run.listener = Some(listener.abort_handle());
    }

    async fn run_sync(self: Arc<Self>, user_id: UserId) {
        let span = info_span!("usecase.reconciliation.sync", user_id = %user_id);

        async move {
            let (_, identified) = tokio::join!(
                self.publish_profile_hint(&user_id),
                bounded(
                    self.request_timeout,
                    self.oracle.identify(&user_id),
                    EntitlementError::Timeout,
                ),
            );

            let snapshot = match identified {
                Ok(snapshot) => snapshot,
                Err(err) => {
                    warn!(error = %err, "Identify failed, sync aborted until next auth transition");
                    self.send_event(ReconciliationEvent::SyncAborted { user_id });
                    return;
                }
            };
            info!(has_premium = snapshot.has_premium, "Identified with purchase platform");

            let snapshot = if snapshot.has_premium {
                snapshot
            } else {
                self.silent_restore_once(snapshot).await
            };

            self.apply_snapshot(&user_id, &snapshot).await;
            self.send_event(ReconciliationEvent::FirstSnapshotApplied { user_id });
        }
        .instrument(span)
        .await
    }

    async fn listen(
        self: Arc<Self>,
        user_id: UserId,
        mut receiver: mpsc::Receiver<EntitlementSnapshot>,
    ) {
        let span = info_span!("usecase.reconciliation.listen", user_id = %user_id);

        async move {
            while let Some(snapshot) = receiver.recv().await {
                debug!(has_premium = snapshot.has_premium, "Entitlement push received");
                self.apply_snapshot(&user_id, &snapshot).await;
            }
            debug!("Entitlement push channel closed");
        }
        .instrument(span)
        .await
    }

    /// Publish the server-mirrored flag until the platform answers, so a
    /// paying user is not locked out while the SDK is slow.
    async fn publish_profile_hint(&self, user_id: &UserId) {
        let read = bounded(
            self.request_timeout,
            self.profile.read_profile_premium(user_id),
            ProfileMirrorError::Timeout,
        )
        .await;

        match read {
            Ok(Some(profile)) => {
                let run = self.run.lock().await;
                if run.is_current(user_id) && run.last_known_premium.is_none() {
                    self.premium_tx
                        .send_replace(PremiumStatus::from_profile(profile.is_premium));
                    debug!(is_premium = profile.is_premium, "Published profile premium hint");
                }
            }
            Ok(None) => debug!("No profile row yet"),
            Err(err) => warn!(error = %err, "Profile premium read failed"),
        }
    }

    /// At most one unattended restore per install. The flag is persisted
    /// before restoring, so a crash mid-restore never causes a repeat
    /// account prompt on the next launch.
    async fn silent_restore_once(&self, identified: EntitlementSnapshot) -> EntitlementSnapshot {
        match self.restore_flag.is_attempted().await {
            Ok(true) => {
                debug!("Silent restore already attempted on this install");
                return identified;
            }
            Ok(false) => {}
            Err(err) => {
                warn!(error = %err, "Silent restore flag unreadable, skipping restore");
                return identified;
            }
        }

        if let Err(err) = self.restore_flag.mark_attempted().await {
            warn!(error = %err, "Could not persist silent restore flag, skipping restore");
            return identified;
        }

        info!("Attempting silent restore");
        match bounded(
            self.request_timeout,
            self.oracle.restore_purchases(),
            EntitlementError::Timeout,
        )
        .await
        {
            Ok(restored) => {
                info!(has_premium = restored.has_premium, "Silent restore finished");
                restored
            }
            Err(err) => {
                warn!(error = %err, "Silent restore failed");
                identified
            }
        }
    }

    async fn apply_snapshot(
        &self,
        user_id: &UserId,
        snapshot: &EntitlementSnapshot,
    ) -> ApplyOutcome {
        let has_premium = snapshot.has_premium;
        {
            let mut run = self.run.lock().await;
            if !run.is_current(user_id) {
                debug!(user_id = %user_id, "Dropping entitlement for identity no longer bound");
                return ApplyOutcome::Stale;
            }
            if run.last_known_premium == Some(has_premium) {
                debug!(has_premium, "Premium unchanged, skipping profile write");
                return ApplyOutcome::Unchanged;
            }
            run.last_known_premium = Some(has_premium);
            self.premium_tx
                .send_replace(PremiumStatus::from_platform(has_premium));
        }

        info!(user_id = %user_id, has_premium, "Premium changed, mirroring to profile");
        let outcome = match bounded(
            self.request_timeout,
            self.profile.write_profile_premium(user_id, has_premium),
            ProfileMirrorError::Timeout,
        )
        .await
        {
            Ok(()) => ApplyOutcome::Written,
            Err(err) => {
                warn!(error = %err, "Profile premium write failed, keeping platform value");
                ApplyOutcome::WriteFailed
            }
        };

        self.refresh.emit_premium_changed(user_id, has_premium).await;
        outcome
    }

    fn send_event(&self, event: ReconciliationEvent) {
        if self.events_tx.send(ControllerEvent::Lifecycle(event)).is_err() {
            debug!("Reconciliation loop gone, dropping event");
        }
    }
}
