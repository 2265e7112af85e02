// Failure escalator
//
// Watches the control surface and output pipeline on a fixed watchdog
// cadence and escalates through Nominal -> Failover -> TechnicalDifficulties.
// Nominal is re-entered automatically on confirmed recovery. The escalator
// exclusively owns the current downtime event handle; every mutation is
// persisted immediately.
//
// Recovery bounds: only the control-surface crash path retries a bounded
// number of times (then requires a human); every other path retries
// indefinitely at the watchdog cadence because it represents an expected
// transient state.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use steadycast_core::{ControlSurface, DowntimeEvent, DowntimeStore, FailureCause};

use crate::config::OrchestratorConfig;

/// Escalation mode, one per broadcast session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscalationState {
    /// Normal programming
    Nominal,
    /// Failover scene engaged
    Failover,
    /// Terminal fallback; manual intervention required
    TechnicalDifficulties,
}

struct EscalatorShared {
    session_id: Option<Uuid>,
    mode: EscalationState,
    current_event: Option<DowntimeEvent>,
    reconnect_attempts: u32,
}

struct EscalatorInner {
    surface: Arc<dyn ControlSurface>,
    downtime_store: Arc<dyn DowntimeStore>,
    failover_scene: String,
    technical_difficulties_scene: String,
    transition_ms: u32,
    max_reconnect_attempts: u32,
    shared: Mutex<EscalatorShared>,
}

impl EscalatorInner {
    async fn watchdog_tick(&self) {
        let mut shared = self.shared.lock().await;
        if shared.session_id.is_none() {
            return;
        }

        if !self.surface.is_connected().await {
            warn!("control surface connection lost");
            self.handle_surface_crash(&mut shared).await;
            return;
        }

        match self.surface.output_status().await {
            Ok(status) if status.active => self.observe_recovery(&mut shared).await,
            Ok(status) => self.handle_output_inactive(&mut shared, status.reconnecting).await,
            Err(e) => {
                error!(error = %e, "output status check failed");
                self.handle_surface_crash(&mut shared).await;
            }
        }
    }

    /// Control-surface crash path: bounded reconnects, then terminal state
    async fn handle_surface_crash(&self, shared: &mut EscalatorShared) {
        self.open_event_if_none(shared, FailureCause::SurfaceCrash, "control surface unreachable")
            .await;

        if shared.reconnect_attempts >= self.max_reconnect_attempts {
            debug!("reconnect attempts exhausted; waiting for manual intervention");
            return;
        }

        shared.reconnect_attempts += 1;
        let attempt = shared.reconnect_attempts;
        info!(
            attempt,
            max_attempts = self.max_reconnect_attempts,
            "attempting control surface reconnect"
        );

        match self.surface.connect().await {
            Ok(()) => {
                info!(attempt, "control surface reconnected");
                shared.reconnect_attempts = 0;

                let output_restored = match self.surface.output_status().await {
                    Ok(status) if status.active => true,
                    Ok(_) => {
                        info!("restarting output after surface recovery");
                        match self.surface.start_output().await {
                            Ok(()) => true,
                            Err(e) => {
                                warn!(error = %e, "output restart after reconnect failed");
                                false
                            }
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "status check after reconnect failed");
                        false
                    }
                };

                if output_restored {
                    self.close_event(
                        shared,
                        &format!("control surface reconnected automatically (attempt {attempt})"),
                    )
                    .await;
                    shared.mode = EscalationState::Nominal;
                } else {
                    // Leave the event open; the next watchdog tick retries
                    self.append_event_action(
                        shared,
                        &format!("surface reconnected (attempt {attempt}); output not yet restored"),
                    )
                    .await;
                }
            }
            Err(e) => {
                error!(attempt, error = %e, "control surface reconnect failed");
                self.append_event_action(shared, &format!("reconnect attempt {attempt} failed"))
                    .await;

                if shared.reconnect_attempts >= self.max_reconnect_attempts {
                    self.enter_technical_difficulties(
                        shared,
                        "control surface reconnect attempts exhausted",
                    )
                    .await;
                }
            }
        }
    }

    /// Output-disconnect path: defer to the surface's own reconnection when
    /// it reports one in flight, otherwise issue a single manual restart
    async fn handle_output_inactive(&self, shared: &mut EscalatorShared, reconnecting: bool) {
        warn!(reconnecting, "output inactive");
        self.open_event_if_none(shared, FailureCause::ConnectionLost, "output connection lost")
            .await;

        if reconnecting {
            // Don't fight the adapter's own reconnection; log and wait
            debug!("surface already reconnecting; waiting for recovery");
            return;
        }

        info!("manually restarting output");
        match self.surface.start_output().await {
            Ok(()) => {
                self.close_event(shared, "output restarted manually").await;
            }
            Err(e) => {
                error!(error = %e, "output restart failed");
                self.activate_failover(
                    shared,
                    "output restart failed",
                    "switched to failover; output connection lost",
                )
                .await;
            }
        }
    }

    /// Clear escalation and close the open event once output is seen active
    async fn observe_recovery(&self, shared: &mut EscalatorShared) {
        if shared.mode != EscalationState::Nominal {
            info!(mode = ?shared.mode, "output recovered; clearing escalation");
            shared.mode = EscalationState::Nominal;
            shared.reconnect_attempts = 0;
        }
        if shared.current_event.is_some() {
            self.close_event(shared, "output recovered - automatic").await;
        }
    }

    /// Content-failure path, invoked synchronously by the sequencer
    async fn content_failure(&self, reason: &str) {
        let mut shared = self.shared.lock().await;
        error!(reason, "content failure signalled");

        self.open_event_if_none(
            &mut shared,
            FailureCause::ContentFailure,
            &format!("content playback failed: {reason}"),
        )
        .await;

        self.activate_failover(&mut shared, "content failure", "switched to failover scene")
            .await;
    }

    /// Engage the failover scene; a no-op when already escalated
    async fn activate_failover(&self, shared: &mut EscalatorShared, reason: &str, action: &str) {
        match shared.mode {
            EscalationState::Failover => {
                debug!("already in failover mode");
                return;
            }
            EscalationState::TechnicalDifficulties => {
                debug!("already in technical difficulties");
                return;
            }
            EscalationState::Nominal => {}
        }

        warn!(reason, "activating failover scene");
        match self
            .surface
            .switch_scene(&self.failover_scene, self.transition_ms)
            .await
        {
            Ok(()) => {
                shared.mode = EscalationState::Failover;
                self.append_event_action(shared, action).await;
                info!("failover scene active");
            }
            Err(e) => {
                error!(error = %e, "failover activation failed");
                self.enter_technical_difficulties(
                    shared,
                    &format!("failover scene switch failed: {e}"),
                )
                .await;
            }
        }
    }

    /// Terminal fallback; happens exactly once per escalation
    async fn enter_technical_difficulties(&self, shared: &mut EscalatorShared, reason: &str) {
        if shared.mode == EscalationState::TechnicalDifficulties {
            return;
        }

        error!(reason, "escalating to technical difficulties");
        match self
            .surface
            .switch_scene(&self.technical_difficulties_scene, self.transition_ms)
            .await
        {
            Ok(()) => {
                error!("technical difficulties scene active; manual intervention required");
            }
            Err(e) => {
                error!(
                    error = %e,
                    "technical difficulties scene switch failed; manual intervention required"
                );
            }
        }

        shared.mode = EscalationState::TechnicalDifficulties;

        if let Some(event) = shared.current_event.as_mut() {
            event.automatic_recovery = false;
            event.append_action(&format!("escalated to technical difficulties: {reason}"));
            if let Err(e) = self.downtime_store.update_event(event).await {
                error!(error = %e, "failed to persist downtime event escalation");
            }
        }
    }

    async fn open_event_if_none(
        &self,
        shared: &mut EscalatorShared,
        cause: FailureCause,
        action: &str,
    ) {
        if shared.current_event.as_ref().is_some_and(|e| e.is_ongoing()) {
            return;
        }
        let Some(session_id) = shared.session_id else {
            warn!("no active broadcast session; downtime not recorded");
            return;
        };

        let event = DowntimeEvent::open(session_id, cause, action, Utc::now());
        if let Err(e) = self.downtime_store.create_event(&event).await {
            error!(error = %e, "failed to persist downtime event");
        }
        warn!(event_id = %event.id, cause = %cause, "downtime event recorded");
        shared.current_event = Some(event);
    }

    async fn append_event_action(&self, shared: &mut EscalatorShared, action: &str) {
        if let Some(event) = shared.current_event.as_mut() {
            event.append_action(action);
            if let Err(e) = self.downtime_store.update_event(event).await {
                error!(error = %e, "failed to persist downtime event update");
            }
        }
    }

    async fn close_event(&self, shared: &mut EscalatorShared, final_action: &str) {
        if let Some(mut event) = shared.current_event.take() {
            event.close(final_action, Utc::now());
            if let Err(e) = self.downtime_store.update_event(&event).await {
                error!(error = %e, "failed to persist downtime event closure");
            }
            info!(
                event_id = %event.id,
                duration_sec = event.duration_sec,
                final_action,
                "downtime event closed"
            );
        }
    }
}

/// Cloneable handle other coordinators use to signal the escalator
#[derive(Clone)]
pub struct EscalatorHandle {
    inner: Arc<EscalatorInner>,
}

impl EscalatorHandle {
    /// Signal a content failure; engages failover before returning
    pub async fn content_failure(&self, reason: &str) {
        self.inner.content_failure(reason).await;
    }

    /// Current escalation mode
    pub async fn mode(&self) -> EscalationState {
        self.inner.shared.lock().await.mode
    }
}

/// Failure escalation watchdog
pub struct FailureEscalator {
    inner: Arc<EscalatorInner>,
    watchdog_interval: Duration,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    handle: Option<JoinHandle<()>>,
}

impl FailureEscalator {
    pub fn new(
        surface: Arc<dyn ControlSurface>,
        downtime_store: Arc<dyn DowntimeStore>,
        config: &OrchestratorConfig,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            inner: Arc::new(EscalatorInner {
                surface,
                downtime_store,
                failover_scene: config.scenes.failover.clone(),
                technical_difficulties_scene: config.scenes.technical_difficulties.clone(),
                transition_ms: config.transition_ms,
                max_reconnect_attempts: config.max_surface_reconnect_attempts,
                shared: Mutex::new(EscalatorShared {
                    session_id: None,
                    mode: EscalationState::Nominal,
                    current_event: None,
                    reconnect_attempts: 0,
                }),
            }),
            watchdog_interval: config.cadences.watchdog,
            shutdown_tx,
            shutdown_rx,
            handle: None,
        }
    }

    /// Handle for the sequencer (and tests) to signal failures through
    pub fn handle(&self) -> EscalatorHandle {
        EscalatorHandle {
            inner: self.inner.clone(),
        }
    }

    /// Current escalation mode
    pub async fn mode(&self) -> EscalationState {
        self.inner.shared.lock().await.mode
    }

    /// Start the watchdog for the given broadcast session
    pub async fn start(&mut self, session_id: Uuid) {
        if self.handle.is_some() {
            warn!("failure escalator already running");
            return;
        }

        {
            let mut shared = self.inner.shared.lock().await;
            shared.session_id = Some(session_id);
            shared.mode = EscalationState::Nominal;
            shared.current_event = None;
            shared.reconnect_attempts = 0;
        }

        let inner = self.inner.clone();
        let interval = self.watchdog_interval;
        let mut shutdown_rx = self.shutdown_rx.clone();

        self.handle = Some(tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => {
                        debug!("failure escalator shutting down");
                        break;
                    }
                    _ = tokio::time::sleep(interval) => {
                        inner.watchdog_tick().await;
                    }
                }
            }
        }));

        info!(session_id = %session_id, "failure escalator started");
    }

    /// Signal shutdown, wait for the watchdog, and finalize any open event
    pub async fn stop(&mut self) {
        let _ = self.shutdown_tx.send(true);
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }

        let mut shared = self.inner.shared.lock().await;
        if shared.current_event.is_some() {
            self.inner
                .close_event(&mut shared, "monitoring stopped - planned shutdown")
                .await;
        }
        shared.session_id = None;

        info!("failure escalator stopped");
    }
}
