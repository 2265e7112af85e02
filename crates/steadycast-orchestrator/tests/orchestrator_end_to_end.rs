// End-to-end test: all five coordinators against the in-memory doubles
//
// Runs a short broadcast with an operator takeover in the middle and checks
// the records every store accumulated, plus the shutdown guarantees.

use std::sync::Arc;
use std::time::Duration;

use steadycast_core::memory::{
    InMemoryCatalog, InMemoryDowntimeStore, InMemoryMetricStore, InMemorySessionStore,
    ScriptedSurface,
};
use steadycast_core::{AgeRating, ContentItem, SessionStore};
use steadycast_orchestrator::{Orchestrator, OrchestratorConfig, SequencerState};
use uuid::Uuid;

fn item(title: &str) -> ContentItem {
    ContentItem {
        id: Uuid::now_v7(),
        title: title.to_string(),
        path: format!("/content/{title}.mp4"),
        // Long enough that the sequencer sleeps through the takeover instead
        // of racing the detector with scene switches
        duration_sec: 30,
        age_rating: AgeRating::All,
        time_blocks: vec!["general".to_string(), "evening_mixed".to_string()],
        priority: 1,
        source_attribution: "Steadycast Library".to_string(),
    }
}

#[tokio::test]
async fn broadcast_with_operator_takeover_round_trip() {
    let surface = ScriptedSurface::with_scenes(&[
        "Automated Content",
        "Operator Live",
        "Failover",
        "Technical Difficulties",
    ])
    .await;
    let session_store = InMemorySessionStore::new();
    let downtime_store = InMemoryDowntimeStore::new();
    let metric_store = InMemoryMetricStore::new();
    let catalog = InMemoryCatalog::new();
    catalog.seed(vec![item("station_ident")]).await;

    let config = OrchestratorConfig::default().with_test_cadences(Duration::from_millis(20));
    let mut orchestrator = Orchestrator::new(
        Arc::new(surface.clone()),
        Arc::new(session_store.clone()),
        Arc::new(downtime_store.clone()),
        Arc::new(metric_store.clone()),
        Arc::new(catalog),
        config,
    );

    let session = orchestrator.start().await.unwrap();
    let sequencer = orchestrator.sequencer_handle();

    // Preflight installed the failover media source
    assert!(surface.call_count("media_source:Failover/Failover Player").await >= 1);

    // Let the first item come on-air and a few metrics accumulate
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(surface.call_count("switch_scene:Automated Content").await >= 1);
    assert_eq!(sequencer.now_playing().as_deref(), Some("station_ident"));

    // Operator takes over; playback pauses
    surface.set_current_scene("Operator Live").await;
    tokio::time::sleep(Duration::from_millis(120)).await;
    assert_eq!(sequencer.state(), SequencerState::Paused);
    let operator_sessions = session_store.operator_sessions().await;
    assert_eq!(operator_sessions.len(), 1);
    assert!(operator_sessions[0].is_ongoing());

    // Operator hands back directly to the automated scene; playback resumes
    surface.set_current_scene("Automated Content").await;
    tokio::time::sleep(Duration::from_millis(120)).await;
    assert_eq!(sequencer.state(), SequencerState::Running);
    let operator_sessions = session_store.operator_sessions().await;
    assert_eq!(operator_sessions.len(), 1);
    assert!(!operator_sessions[0].is_ongoing());

    orchestrator.stop().await.unwrap();

    // Exactly one session, closed, with invariants intact
    let sessions = session_store.sessions().await;
    assert_eq!(sessions.len(), 1);
    let closed = &sessions[0];
    assert_eq!(closed.id, session.id);
    assert!(closed.end_time.unwrap() > closed.start_time);
    assert!(closed.downtime_duration_sec <= closed.total_duration_sec);
    assert!(session_store.latest_open_session().await.unwrap().is_none());

    // Telemetry accumulated on the sampler cadence; no downtime on a
    // healthy run
    assert!(!metric_store.metrics().await.is_empty());
    assert!(downtime_store.events().await.is_empty());

    // Output was stopped as part of shutdown
    assert!(surface.call_count("stop_output").await >= 1);
}

#[tokio::test]
async fn preflight_failure_refuses_to_start() {
    let surface = ScriptedSurface::new();
    surface.set_connected(false).await;
    surface.fail_connects(10).await;

    let session_store = InMemorySessionStore::new();
    let downtime_store = InMemoryDowntimeStore::new();
    let metric_store = InMemoryMetricStore::new();
    let catalog = InMemoryCatalog::new();

    let config = OrchestratorConfig::default().with_test_cadences(Duration::from_millis(20));
    let mut orchestrator = Orchestrator::new(
        Arc::new(surface.clone()),
        Arc::new(session_store.clone()),
        Arc::new(downtime_store),
        Arc::new(metric_store),
        Arc::new(catalog),
        config,
    );

    assert!(orchestrator.start().await.is_err());
    assert!(session_store.sessions().await.is_empty());
    assert_eq!(surface.call_count("start_output").await, 0);
}
