// Health sampler
//
// Fixed-interval telemetry loop. Each tick reads output status, performance
// counters, and the current scene from the control surface, derives bitrate
// and drop percentage, samples system CPU, and persists exactly one metric
// row. When the surface itself is unreachable the tick still writes an
// offline row, so the metric stream has no silent gaps.
//
// Degraded quality is logged here but never opens a downtime event; that is
// the failure escalator's job, driven by its own independent watchdog.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use sysinfo::System;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use steadycast_core::{
    ConnectionStatus, ControlSurface, HealthMetric, MetricStore, OutputState, Result,
};

use crate::config::OrchestratorConfig;

/// System CPU gauge; keeps refresh state between ticks
struct CpuGauge {
    system: System,
}

impl CpuGauge {
    fn new() -> Self {
        Self {
            system: System::new(),
        }
    }

    fn sample(&mut self) -> f64 {
        self.system.refresh_cpu_usage();
        f64::from(self.system.global_cpu_usage())
    }
}

/// Periodic telemetry snapshot loop
pub struct HealthSampler {
    surface: Arc<dyn ControlSurface>,
    metric_store: Arc<dyn MetricStore>,
    interval: Duration,
    now_playing_rx: watch::Receiver<Option<String>>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    handle: Option<JoinHandle<()>>,
}

impl HealthSampler {
    pub fn new(
        surface: Arc<dyn ControlSurface>,
        metric_store: Arc<dyn MetricStore>,
        config: &OrchestratorConfig,
        now_playing_rx: watch::Receiver<Option<String>>,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            surface,
            metric_store,
            interval: config.cadences.health_sample,
            now_playing_rx,
            shutdown_tx,
            shutdown_rx,
            handle: None,
        }
    }

    /// Start sampling for the given broadcast session
    pub async fn start(&mut self, session_id: Uuid) {
        if self.handle.is_some() {
            warn!("health sampler already running");
            return;
        }

        let surface = self.surface.clone();
        let metric_store = self.metric_store.clone();
        let interval = self.interval;
        let now_playing_rx = self.now_playing_rx.clone();
        let mut shutdown_rx = self.shutdown_rx.clone();

        self.handle = Some(tokio::spawn(async move {
            let mut cpu_gauge = CpuGauge::new();

            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => {
                        debug!("health sampler shutting down");
                        break;
                    }
                    _ = tokio::time::sleep(interval) => {
                        sample_tick(
                            &surface,
                            &metric_store,
                            session_id,
                            &mut cpu_gauge,
                            &now_playing_rx,
                        )
                        .await;
                    }
                }
            }
        }));

        info!(session_id = %session_id, interval_sec = interval.as_secs_f64(), "health sampler started");
    }

    /// Signal shutdown and wait for the sampling loop to finish
    pub async fn stop(&mut self) {
        let _ = self.shutdown_tx.send(true);
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
        info!("health sampler stopped");
    }
}

async fn sample_tick(
    surface: &Arc<dyn ControlSurface>,
    metric_store: &Arc<dyn MetricStore>,
    session_id: Uuid,
    cpu_gauge: &mut CpuGauge,
    now_playing_rx: &watch::Receiver<Option<String>>,
) {
    let cpu_usage_pct = cpu_gauge.sample();
    let active_content = now_playing_rx.borrow().clone();

    let metric = match collect(surface, session_id, cpu_usage_pct, active_content).await {
        Ok(metric) => metric,
        Err(e) => {
            // Write an offline row rather than skipping the tick
            error!(error = %e, "surface unreachable during metric collection");
            HealthMetric::offline(session_id, cpu_usage_pct, Utc::now())
        }
    };

    if let Err(e) = metric_store.record(&metric).await {
        error!(error = %e, "failed to persist health metric");
    }

    if metric.is_degraded() {
        warn!(
            dropped_frames_pct = metric.dropped_frames_pct,
            threshold_pct = steadycast_core::DEGRADED_DROP_PCT,
            active_scene = %metric.active_scene,
            "stream quality degraded"
        );
    }

    if metric.connection_status == ConnectionStatus::Disconnected
        || metric.output_state != OutputState::Running
    {
        error!(
            connection_status = %metric.connection_status,
            output_state = %metric.output_state,
            "stream failure observed"
        );
    }

    debug!(
        bitrate_kbps = metric.bitrate_kbps,
        dropped_frames_pct = metric.dropped_frames_pct,
        cpu_usage_pct = metric.cpu_usage_pct,
        scene = %metric.active_scene,
        "metric collected"
    );
}

async fn collect(
    surface: &Arc<dyn ControlSurface>,
    session_id: Uuid,
    cpu_usage_pct: f64,
    active_content: Option<String>,
) -> Result<HealthMetric> {
    let status = surface.output_status().await?;
    let stats = surface.performance_stats().await?;
    let active_scene = surface.current_scene().await?;

    // bytes * 8 bits over elapsed milliseconds is kilobits per second
    let bitrate_kbps = if status.duration_ms > 0 {
        (status.bytes_sent * 8) as f64 / status.duration_ms as f64
    } else {
        0.0
    };

    let connection_status = if !status.active {
        ConnectionStatus::Disconnected
    } else if status.reconnecting {
        ConnectionStatus::Degraded
    } else {
        ConnectionStatus::Connected
    };

    let output_state = if status.active {
        OutputState::Running
    } else {
        OutputState::Stopped
    };

    Ok(HealthMetric {
        id: Uuid::now_v7(),
        broadcast_session_id: session_id,
        timestamp: Utc::now(),
        bitrate_kbps,
        dropped_frames_pct: stats.dropped_frames_pct(),
        cpu_usage_pct,
        active_scene,
        active_content,
        connection_status,
        output_state,
    })
}
