// Session coordinator
//
// Owns the single active BroadcastSession and is its only writer. Starts
// output and opens the session, runs a background monitor that refreshes
// durations and quality aggregates (and restarts an output a human stopped
// outside this system), and consumes operator events to open/close operator
// sessions and pause/resume the sequencer.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{mpsc, watch, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use steadycast_core::{
    BroadcastSession, ControlSurface, DowntimeStore, MetricStore, OperatorEvent, OperatorSession,
    OrchestratorError, Result, SessionStore,
};

use crate::config::OrchestratorConfig;
use crate::sequencer::SequencerHandle;

/// Owns the active broadcast session and reacts to operator events
pub struct SessionCoordinator {
    surface: Arc<dyn ControlSurface>,
    session_store: Arc<dyn SessionStore>,
    downtime_store: Arc<dyn DowntimeStore>,
    metric_store: Arc<dyn MetricStore>,
    sequencer: SequencerHandle,
    monitor_interval: Duration,
    restart_grace: Duration,
    current_session: Arc<RwLock<Option<BroadcastSession>>>,
    shutdown_tx: Option<watch::Sender<bool>>,
    monitor_handle: Option<JoinHandle<()>>,
    events_handle: Option<JoinHandle<()>>,
}

impl SessionCoordinator {
    pub fn new(
        surface: Arc<dyn ControlSurface>,
        session_store: Arc<dyn SessionStore>,
        downtime_store: Arc<dyn DowntimeStore>,
        metric_store: Arc<dyn MetricStore>,
        sequencer: SequencerHandle,
        config: &OrchestratorConfig,
    ) -> Self {
        Self {
            surface,
            session_store,
            downtime_store,
            metric_store,
            sequencer,
            monitor_interval: config.cadences.session_monitor,
            restart_grace: config.cadences.restart_grace,
            current_session: Arc::new(RwLock::new(None)),
            shutdown_tx: None,
            monitor_handle: None,
            events_handle: None,
        }
    }

    /// Snapshot of the active session, if any
    pub async fn current_session(&self) -> Option<BroadcastSession> {
        self.current_session.read().await.clone()
    }

    /// Start output, open and persist a new session, and launch the
    /// background monitor plus the operator-event consumer
    pub async fn auto_start(
        &mut self,
        events_rx: mpsc::Receiver<OperatorEvent>,
    ) -> Result<BroadcastSession> {
        if self.current_session.read().await.is_some() {
            return Err(OrchestratorError::integrity(
                "a broadcast session is already active",
            ));
        }

        // Surface errors get one retry before they reach the caller
        if let Err(e) = self.surface.start_output().await {
            warn!(error = %e, "output start failed; retrying once");
            self.surface.start_output().await?;
        }

        let session = BroadcastSession::begin(Utc::now());
        self.session_store.create_session(&session).await?;
        *self.current_session.write().await = Some(session.clone());

        info!(
            session_id = %session.id,
            start_time = %session.start_time,
            "broadcast session started"
        );

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        self.shutdown_tx = Some(shutdown_tx);

        self.monitor_handle = Some(tokio::spawn(monitor_loop(
            self.surface.clone(),
            self.session_store.clone(),
            self.downtime_store.clone(),
            self.metric_store.clone(),
            self.current_session.clone(),
            self.monitor_interval,
            self.restart_grace,
            shutdown_rx.clone(),
        )));

        self.events_handle = Some(tokio::spawn(events_loop(
            self.current_session.clone(),
            self.session_store.clone(),
            self.sequencer.clone(),
            events_rx,
            shutdown_rx,
        )));

        Ok(session)
    }

    /// Cancel the background tasks, stop output, and close the session
    pub async fn stop(&mut self) -> Result<()> {
        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            let _ = shutdown_tx.send(true);
        }
        if let Some(handle) = self.monitor_handle.take() {
            let _ = handle.await;
        }
        if let Some(handle) = self.events_handle.take() {
            let _ = handle.await;
        }

        if let Err(e) = self.surface.stop_output().await {
            warn!(error = %e, "output stop failed; retrying once");
            if let Err(e) = self.surface.stop_output().await {
                error!(error = %e, "output stop failed again; leaving output to the surface");
            }
        }

        let mut guard = self.current_session.write().await;
        if let Some(mut session) = guard.take() {
            session.close(Utc::now());
            self.session_store.update_session(&session).await?;
            info!(
                session_id = %session.id,
                total_duration_sec = session.total_duration_sec,
                downtime_duration_sec = session.downtime_duration_sec,
                uptime_pct = session.uptime_percentage(),
                "broadcast session closed"
            );
        }

        Ok(())
    }
}

/// Background monitor: restart an externally stopped output, otherwise
/// refresh elapsed duration, downtime totals, and quality aggregates
#[allow(clippy::too_many_arguments)]
async fn monitor_loop(
    surface: Arc<dyn ControlSurface>,
    session_store: Arc<dyn SessionStore>,
    downtime_store: Arc<dyn DowntimeStore>,
    metric_store: Arc<dyn MetricStore>,
    current_session: Arc<RwLock<Option<BroadcastSession>>>,
    interval: Duration,
    restart_grace: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            _ = shutdown_rx.changed() => {
                debug!("session monitor shutting down");
                break;
            }
            _ = tokio::time::sleep(interval) => {}
        }
        if *shutdown_rx.borrow() {
            break;
        }

        let Some(session_id) = current_session.read().await.as_ref().map(|s| s.id) else {
            continue;
        };

        let status = match surface.output_status().await {
            Ok(status) => status,
            Err(e) => {
                // Transient; the failure escalator owns crash handling
                warn!(error = %e, "monitor status check failed");
                continue;
            }
        };

        if !status.active {
            // A human may have stopped output outside this system; wait the
            // grace period, then attempt one restart
            warn!(
                session_id = %session_id,
                "output stopped outside the orchestrator; restarting after grace period"
            );
            tokio::select! {
                _ = shutdown_rx.changed() => break,
                _ = tokio::time::sleep(restart_grace) => {}
            }
            match surface.start_output().await {
                Ok(()) => info!("output restarted after external stop"),
                Err(e) => error!(error = %e, "output restart failed"),
            }
            continue;
        }

        let downtime_sec = match downtime_store.downtime_total_sec(session_id).await {
            Ok(total) => total,
            Err(e) => {
                warn!(error = %e, "downtime total lookup failed");
                continue;
            }
        };
        let aggregates = match metric_store.aggregates_for(session_id).await {
            Ok(aggregates) => aggregates,
            Err(e) => {
                warn!(error = %e, "metric aggregate lookup failed");
                None
            }
        };

        let snapshot = {
            let mut guard = current_session.write().await;
            let Some(session) = guard.as_mut() else {
                continue;
            };
            session.refresh_duration(Utc::now());
            // Clamp so the downtime-within-duration invariant holds even
            // when clocks and event closures race
            session.downtime_duration_sec =
                (downtime_sec.round() as i64).min(session.total_duration_sec);
            if let Some(aggregates) = aggregates {
                session.avg_bitrate_kbps = aggregates.avg_bitrate_kbps;
                session.avg_dropped_frames_pct = aggregates.avg_dropped_frames_pct;
                session.peak_cpu_usage_pct = aggregates.peak_cpu_usage_pct;
            }
            session.clone()
        };

        if let Err(e) = session_store.update_session(&snapshot).await {
            error!(error = %e, "failed to persist session refresh");
        }

        debug!(
            session_id = %session_id,
            duration_sec = snapshot.total_duration_sec,
            downtime_sec = snapshot.downtime_duration_sec,
            "session refreshed"
        );
    }
}

/// Consume operator events: open/close operator sessions and pause/resume
/// the sequencer. Out-of-order or duplicate events are logged and ignored.
async fn events_loop(
    current_session: Arc<RwLock<Option<BroadcastSession>>>,
    session_store: Arc<dyn SessionStore>,
    sequencer: SequencerHandle,
    mut events_rx: mpsc::Receiver<OperatorEvent>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut open_operator: Option<OperatorSession> = None;

    loop {
        tokio::select! {
            _ = shutdown_rx.changed() => {
                debug!("operator event consumer shutting down");
                break;
            }
            event = events_rx.recv() => {
                let Some(event) = event else {
                    debug!("operator event channel closed");
                    break;
                };

                match event {
                    OperatorEvent::Live {
                        interrupted_scene,
                        transition_latency_sec,
                        trigger_method,
                    } => {
                        let Some(session_id) =
                            current_session.read().await.as_ref().map(|s| s.id)
                        else {
                            warn!("operator takeover ignored; no active broadcast session");
                            continue;
                        };
                        if open_operator.is_some() {
                            warn!("duplicate operator takeover event ignored");
                            continue;
                        }

                        let interrupted_content = sequencer
                            .now_playing()
                            .or_else(|| Some(interrupted_scene.clone()));
                        let operator_session = OperatorSession::begin(
                            session_id,
                            interrupted_content,
                            transition_latency_sec,
                            trigger_method,
                            Utc::now(),
                        );

                        if let Err(e) =
                            session_store.create_operator_session(&operator_session).await
                        {
                            error!(error = %e, "failed to persist operator session");
                        }
                        sequencer.pause();

                        info!(
                            operator_session_id = %operator_session.id,
                            interrupted_scene = %interrupted_scene,
                            transition_latency_sec,
                            trigger_method = %trigger_method,
                            "operator takeover started"
                        );
                        open_operator = Some(operator_session);
                    }
                    OperatorEvent::Returned { operator_scene } => {
                        let Some(mut operator_session) = open_operator.take() else {
                            warn!("operator return ignored; no open operator session");
                            continue;
                        };

                        sequencer.resume();
                        operator_session.close(sequencer.now_playing(), Utc::now());

                        if let Err(e) =
                            session_store.update_operator_session(&operator_session).await
                        {
                            error!(error = %e, "failed to persist operator session closure");
                        }

                        info!(
                            operator_session_id = %operator_session.id,
                            operator_scene = %operator_scene,
                            duration_sec = operator_session.duration_sec,
                            "operator takeover ended"
                        );
                    }
                }
            }
        }
    }
}
