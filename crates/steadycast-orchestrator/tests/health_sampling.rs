// Integration tests for the health sampler
//
// Verifies metric derivation (bitrate from byte counters, drop percentage
// from frame counters), degraded classification, and the no-gaps rule when
// the control surface is unreachable.

use std::sync::Arc;
use std::time::Duration;

use steadycast_core::memory::{InMemoryMetricStore, ScriptedSurface};
use steadycast_core::{ConnectionStatus, MetricStore, OutputState, PerformanceStats};
use steadycast_orchestrator::{HealthSampler, OrchestratorConfig};
use tokio::sync::watch;
use uuid::Uuid;

fn fast_config() -> OrchestratorConfig {
    OrchestratorConfig::default().with_test_cadences(Duration::from_millis(20))
}

async fn setup(
    now_playing: Option<String>,
) -> (
    ScriptedSurface,
    InMemoryMetricStore,
    HealthSampler,
    watch::Sender<Option<String>>,
) {
    let surface = ScriptedSurface::with_scenes(&["Automated Content"]).await;
    let store = InMemoryMetricStore::new();
    let (now_playing_tx, now_playing_rx) = watch::channel(now_playing);
    let sampler = HealthSampler::new(
        Arc::new(surface.clone()),
        Arc::new(store.clone()),
        &fast_config(),
        now_playing_rx,
    );
    (surface, store, sampler, now_playing_tx)
}

#[tokio::test]
async fn degraded_metric_is_persisted_without_any_downtime_event() {
    // Scenario: a tick with 2.5% dropped frames is recorded as degraded;
    // the sampler itself never opens downtime events
    let (surface, store, mut sampler, _now_playing_tx) = setup(Some("clip.mp4".to_string())).await;
    surface.set_output(true, false).await;
    surface.set_output_counters(25_000, 10_000).await;
    surface
        .set_stats(PerformanceStats {
            cpu_usage_pct: 15.0,
            skipped_frames: 25,
            total_frames: 1_000,
        })
        .await;

    let session_id = Uuid::now_v7();
    sampler.start(session_id).await;
    tokio::time::sleep(Duration::from_millis(120)).await;
    sampler.stop().await;

    let metrics = store.metrics().await;
    assert!(!metrics.is_empty());

    let metric = &metrics[0];
    assert_eq!(metric.broadcast_session_id, session_id);
    assert!((metric.dropped_frames_pct - 2.5).abs() < f64::EPSILON);
    assert!(metric.is_degraded());
    // bytes * 8 bits over elapsed ms: 25_000 * 8 / 10_000 = 20 kbps
    assert!((metric.bitrate_kbps - 20.0).abs() < f64::EPSILON);
    assert_eq!(metric.connection_status, ConnectionStatus::Connected);
    assert_eq!(metric.output_state, OutputState::Running);
    assert_eq!(metric.active_scene, "Automated Content");
    assert_eq!(metric.active_content.as_deref(), Some("clip.mp4"));
}

#[tokio::test]
async fn reconnecting_output_classifies_as_degraded_connection() {
    let (surface, store, mut sampler, _now_playing_tx) = setup(None).await;
    surface.set_output(true, true).await;

    sampler.start(Uuid::now_v7()).await;
    tokio::time::sleep(Duration::from_millis(80)).await;
    sampler.stop().await;

    let metrics = store.metrics().await;
    assert!(!metrics.is_empty());
    assert_eq!(metrics[0].connection_status, ConnectionStatus::Degraded);
    assert_eq!(metrics[0].output_state, OutputState::Running);
}

#[tokio::test]
async fn unreachable_surface_still_writes_an_offline_row() {
    // The metric stream has no silent gaps: a failing surface call yields a
    // zeroed disconnected/stopped row instead of a skipped tick
    let (surface, store, mut sampler, _now_playing_tx) = setup(None).await;
    surface.set_fail_all(true).await;

    let session_id = Uuid::now_v7();
    sampler.start(session_id).await;
    tokio::time::sleep(Duration::from_millis(120)).await;
    sampler.stop().await;

    let metrics = store.metrics().await;
    assert!(!metrics.is_empty());
    for metric in &metrics {
        assert_eq!(metric.broadcast_session_id, session_id);
        assert_eq!(metric.connection_status, ConnectionStatus::Disconnected);
        assert_eq!(metric.output_state, OutputState::Stopped);
        assert_eq!(metric.bitrate_kbps, 0.0);
        assert_eq!(metric.active_scene, "Unknown");
    }
}

#[tokio::test]
async fn one_row_per_tick_accumulates() {
    let (surface, store, mut sampler, _now_playing_tx) = setup(None).await;
    surface.set_output(true, false).await;

    sampler.start(Uuid::now_v7()).await;
    tokio::time::sleep(Duration::from_millis(150)).await;
    sampler.stop().await;

    let count = store.metrics().await.len();
    assert!(count >= 3, "expected several rows at a 20ms cadence, got {count}");

    // Immutable, append-only: timestamps are non-decreasing
    let metrics = store.metrics().await;
    for pair in metrics.windows(2) {
        assert!(pair[0].timestamp <= pair[1].timestamp);
    }

    let session_id = metrics[0].broadcast_session_id;
    let latest = store.latest_for(session_id).await.unwrap().unwrap();
    assert_eq!(latest.id, metrics.last().unwrap().id);
}
