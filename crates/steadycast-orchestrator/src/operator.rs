// Operator-takeover detector
//
// Polls the current scene on a single cooperative loop and emits
// OperatorEvent variants on a channel when the operator takes over or hands
// back. The return transition is deliberately asymmetric: only a switch from
// the operator scene directly into the automated-content scene counts as a
// return, so operators can browse other scenes without resuming playback.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use steadycast_core::{ControlSurface, OperatorEvent, Result, TriggerMethod};

use crate::config::OrchestratorConfig;

/// Estimated takeover transition latency reported on OperatorEvent::Live.
/// The poll cadence bounds true detection latency; this constant is the
/// nominal scene-change delay the downstream reporting expects.
pub const TRANSITION_LATENCY_ESTIMATE_SEC: f64 = 0.5;

/// Watches the program scene for operator takeovers
pub struct OperatorDetector {
    surface: Arc<dyn ControlSurface>,
    operator_scene: String,
    automated_scene: String,
    poll_interval: Duration,
    events_tx: mpsc::Sender<OperatorEvent>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    handle: Option<JoinHandle<()>>,
}

impl OperatorDetector {
    pub fn new(
        surface: Arc<dyn ControlSurface>,
        config: &OrchestratorConfig,
        events_tx: mpsc::Sender<OperatorEvent>,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            surface,
            operator_scene: config.scenes.operator_live.clone(),
            automated_scene: config.scenes.automated_content.clone(),
            poll_interval: config.cadences.operator_poll,
            events_tx,
            shutdown_tx,
            shutdown_rx,
            handle: None,
        }
    }

    /// Start polling; reads the initial scene first so the first tick has a
    /// baseline to diff against. Fails if the surface cannot report a scene.
    pub async fn start(&mut self) -> Result<()> {
        if self.handle.is_some() {
            warn!("operator detector already running");
            return Ok(());
        }

        // One retry before the error reaches the caller
        let initial_scene = match self.surface.current_scene().await {
            Ok(scene) => scene,
            Err(e) => {
                warn!(error = %e, "initial scene read failed; retrying once");
                self.surface.current_scene().await?
            }
        };
        info!(
            initial_scene = %initial_scene,
            operator_scene = %self.operator_scene,
            "operator detector started"
        );

        let surface = self.surface.clone();
        let operator_scene = self.operator_scene.clone();
        let automated_scene = self.automated_scene.clone();
        let poll_interval = self.poll_interval;
        let events_tx = self.events_tx.clone();
        let shutdown_rx = self.shutdown_rx.clone();

        self.handle = Some(tokio::spawn(async move {
            poll_loop(
                surface,
                operator_scene,
                automated_scene,
                poll_interval,
                initial_scene,
                events_tx,
                shutdown_rx,
            )
            .await;
        }));

        Ok(())
    }

    /// Signal shutdown and wait for the poll loop to finish
    pub async fn stop(&mut self) {
        let _ = self.shutdown_tx.send(true);
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
        info!("operator detector stopped");
    }
}

async fn poll_loop(
    surface: Arc<dyn ControlSurface>,
    operator_scene: String,
    automated_scene: String,
    poll_interval: Duration,
    initial_scene: String,
    events_tx: mpsc::Sender<OperatorEvent>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut last_scene = initial_scene;

    loop {
        tokio::select! {
            _ = shutdown_rx.changed() => {
                debug!("operator detector shutting down");
                break;
            }
            _ = tokio::time::sleep(poll_interval) => {
                let scene = match surface.current_scene().await {
                    Ok(scene) => scene,
                    Err(e) => {
                        // Single-tick failures are swallowed; polling continues
                        warn!(error = %e, "scene poll failed");
                        continue;
                    }
                };

                if scene == last_scene {
                    continue;
                }

                debug!(previous = %last_scene, current = %scene, "scene changed");

                let event = if scene == operator_scene {
                    info!(interrupted_scene = %last_scene, "operator takeover detected");
                    Some(OperatorEvent::Live {
                        interrupted_scene: last_scene.clone(),
                        transition_latency_sec: TRANSITION_LATENCY_ESTIMATE_SEC,
                        trigger_method: TriggerMethod::SceneChange,
                    })
                } else if last_scene == operator_scene && scene == automated_scene {
                    // Only a direct switch into the automated scene counts as
                    // a return; any third scene leaves the takeover open.
                    info!(resumed_scene = %scene, "operator return detected");
                    Some(OperatorEvent::Returned {
                        operator_scene: operator_scene.clone(),
                    })
                } else {
                    None
                };

                last_scene = scene;

                if let Some(event) = event {
                    if events_tx.send(event).await.is_err() {
                        warn!("operator event channel closed; detector exiting");
                        break;
                    }
                }
            }
        }
    }
}
