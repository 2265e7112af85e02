// Reliability orchestration coordinators
//
// Five always-on coordinators keep an unattended broadcast continuously
// on-air, sharing one active-session handle:
// - HealthSampler: periodic telemetry snapshot + persistence
// - FailureEscalator: crash/disconnect/content failure -> failover ->
//   last-resort scene; downtime logging
// - OperatorDetector: detect manual scene switches to/from the operator
//   scene; emit takeover events
// - SessionCoordinator: own the active session; auto-start; pause/resume
//   playback around operator takeovers; restart on unexpected stops
// - ContentSequencer: pick the next item by time block/rating/priority and
//   drive scene + overlay updates
//
// The Orchestrator type composes them around a shared control surface and
// store handles, starting leaves-first and stopping in reverse so nothing
// reacts to a session that no longer exists.

pub mod config;
pub mod coordinator;
pub mod escalator;
pub mod operator;
pub mod preflight;
pub mod sampler;
pub mod sequencer;

pub use config::{Cadences, OrchestratorConfig, SceneNames};
pub use coordinator::SessionCoordinator;
pub use escalator::{EscalationState, EscalatorHandle, FailureEscalator};
pub use operator::{OperatorDetector, TRANSITION_LATENCY_ESTIMATE_SEC};
pub use preflight::{run_preflight, PreflightCheck, PreflightReport};
pub use sampler::HealthSampler;
pub use sequencer::{ContentSequencer, SequencerHandle, SequencerState};

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::info;

use steadycast_core::{
    BroadcastSession, ContentCatalog, ControlSurface, DowntimeStore, MetricStore,
    OperatorEvent, OrchestratorError, Result, SessionStore,
};
use steadycast_storage::{
    create_db_content_catalog, create_db_downtime_store, create_db_metric_store,
    create_db_session_store, Database,
};

/// Capacity of the operator event channel; transitions are rare, so a small
/// buffer is plenty
const OPERATOR_EVENT_BUFFER: usize = 16;

/// Composition root for the five coordinators
pub struct Orchestrator {
    surface: Arc<dyn ControlSurface>,
    catalog: Arc<dyn ContentCatalog>,
    config: OrchestratorConfig,
    coordinator: SessionCoordinator,
    escalator: FailureEscalator,
    sampler: HealthSampler,
    detector: OperatorDetector,
    sequencer: ContentSequencer,
    events_rx: Option<mpsc::Receiver<OperatorEvent>>,
}

impl Orchestrator {
    /// Wire the coordinators against explicit store handles
    pub fn new(
        surface: Arc<dyn ControlSurface>,
        session_store: Arc<dyn SessionStore>,
        downtime_store: Arc<dyn DowntimeStore>,
        metric_store: Arc<dyn MetricStore>,
        catalog: Arc<dyn ContentCatalog>,
        config: OrchestratorConfig,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::channel(OPERATOR_EVENT_BUFFER);

        let escalator = FailureEscalator::new(surface.clone(), downtime_store.clone(), &config);
        let sequencer = ContentSequencer::new(
            surface.clone(),
            catalog.clone(),
            escalator.handle(),
            &config,
        );
        let sampler = HealthSampler::new(
            surface.clone(),
            metric_store.clone(),
            &config,
            sequencer.now_playing_rx(),
        );
        let detector = OperatorDetector::new(surface.clone(), &config, events_tx);
        let coordinator = SessionCoordinator::new(
            surface.clone(),
            session_store,
            downtime_store,
            metric_store,
            sequencer.handle(),
            &config,
        );

        Self {
            surface,
            catalog,
            config,
            coordinator,
            escalator,
            sampler,
            detector,
            sequencer,
            events_rx: Some(events_rx),
        }
    }

    /// Wire the coordinators against a Postgres database
    pub fn with_database(
        surface: Arc<dyn ControlSurface>,
        db: Database,
        config: OrchestratorConfig,
    ) -> Self {
        Self::new(
            surface,
            Arc::new(create_db_session_store(db.clone())),
            Arc::new(create_db_downtime_store(db.clone())),
            Arc::new(create_db_metric_store(db.clone())),
            Arc::new(create_db_content_catalog(db)),
            config,
        )
    }

    /// Pause/resume handle for the content sequencer
    pub fn sequencer_handle(&self) -> SequencerHandle {
        self.sequencer.handle()
    }

    /// Handle for signalling the failure escalator
    pub fn escalator_handle(&self) -> EscalatorHandle {
        self.escalator.handle()
    }

    /// Snapshot of the active broadcast session
    pub async fn current_session(&self) -> Option<BroadcastSession> {
        self.coordinator.current_session().await
    }

    /// Run pre-flight, auto-start the broadcast session, and bring every
    /// coordinator up
    pub async fn start(&mut self) -> Result<BroadcastSession> {
        let report = run_preflight(&self.surface, &self.catalog, &self.config).await;
        if !report.startable() {
            let failed: Vec<String> = report
                .checks
                .iter()
                .filter(|c| !c.passed)
                .map(|c| c.name.to_string())
                .collect();
            return Err(OrchestratorError::config(format!(
                "preflight validation failed: {}",
                failed.join(", ")
            )));
        }

        let events_rx = self
            .events_rx
            .take()
            .ok_or_else(|| OrchestratorError::config("orchestrator already started"))?;

        let session = self.coordinator.auto_start(events_rx).await?;

        self.escalator.start(session.id).await;
        self.sampler.start(session.id).await;
        self.detector.start().await?;
        self.sequencer.start().await;

        info!(session_id = %session.id, "orchestrator running");
        Ok(session)
    }

    /// Stop every coordinator (awaiting each task), close the session, and
    /// stop output. Reverse dependency order: nothing may keep reacting to a
    /// session that is being closed.
    pub async fn stop(&mut self) -> Result<()> {
        self.sequencer.stop().await;
        self.detector.stop().await;
        self.sampler.stop().await;
        self.escalator.stop().await;
        self.coordinator.stop().await?;

        info!("orchestrator stopped");
        Ok(())
    }
}
