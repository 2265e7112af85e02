// Integration tests for the failure escalator's recovery paths
//
// The scripted surface injects connect refusals, failing scene switches,
// and output state; the in-memory downtime store records what the
// escalator persists. Watchdog cadence is shrunk to milliseconds.

use std::sync::Arc;
use std::time::Duration;

use steadycast_core::memory::{InMemoryDowntimeStore, ScriptedSurface};
use steadycast_core::{ControlSurface, FailureCause, OrchestratorError};
use steadycast_orchestrator::{EscalationState, FailureEscalator, OrchestratorConfig};
use uuid::Uuid;

const SCENES: [&str; 4] = [
    "Automated Content",
    "Operator Live",
    "Failover",
    "Technical Difficulties",
];

fn fast_config(watchdog: Duration) -> OrchestratorConfig {
    let mut config = OrchestratorConfig::default().with_test_cadences(Duration::from_millis(20));
    config.cadences.watchdog = watchdog;
    config
}

/// Watchdog parked far in the future so only explicit signals run
fn quiet_config() -> OrchestratorConfig {
    fast_config(Duration::from_secs(60))
}

async fn setup(
    config: &OrchestratorConfig,
) -> (ScriptedSurface, InMemoryDowntimeStore, FailureEscalator) {
    let surface = ScriptedSurface::with_scenes(&SCENES).await;
    let store = InMemoryDowntimeStore::new();
    let escalator =
        FailureEscalator::new(Arc::new(surface.clone()), Arc::new(store.clone()), config);
    (surface, store, escalator)
}

#[tokio::test]
async fn content_failure_engages_failover_and_opens_event() {
    let config = quiet_config();
    let (surface, store, mut escalator) = setup(&config).await;
    surface.set_output(true, false).await;

    let session_id = Uuid::now_v7();
    escalator.start(session_id).await;

    let handle = escalator.handle();
    handle.content_failure("media source refused the file").await;

    // Within the same call: failover requested, event open
    assert_eq!(surface.call_count("switch_scene:Failover").await, 1);
    assert_eq!(handle.mode().await, EscalationState::Failover);

    let events = store.events().await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].cause, FailureCause::ContentFailure);
    assert!(events[0].end_time.is_none());
    assert_eq!(events[0].broadcast_session_id, session_id);

    // Re-entering failover is a no-op
    handle.content_failure("still failing").await;
    assert_eq!(surface.call_count("switch_scene:Failover").await, 1);
    assert_eq!(store.events().await.len(), 1);

    escalator.stop().await;
}

#[tokio::test]
async fn surface_crash_reconnects_are_bounded_at_three() {
    let config = fast_config(Duration::from_millis(30));
    let (surface, store, mut escalator) = setup(&config).await;
    surface.set_connected(false).await;
    surface.fail_connects(100).await;

    escalator.start(Uuid::now_v7()).await;
    tokio::time::sleep(Duration::from_millis(300)).await;

    // At most 3 reconnect attempts, then terminal state
    assert_eq!(surface.call_count("connect:err").await, 3);
    assert_eq!(escalator.mode().await, EscalationState::TechnicalDifficulties);

    let events = store.events().await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].cause, FailureCause::SurfaceCrash);
    assert!(events[0].end_time.is_none(), "event stays open for a human");
    assert!(!events[0].automatic_recovery);
    assert!(events[0].recovery_action.contains("technical difficulties"));

    escalator.stop().await;
}

#[tokio::test]
async fn successful_reconnect_resets_the_attempt_counter() {
    let config = fast_config(Duration::from_millis(30));
    let (surface, store, mut escalator) = setup(&config).await;
    surface.set_connected(false).await;
    surface.fail_connects(2).await;

    escalator.start(Uuid::now_v7()).await;
    tokio::time::sleep(Duration::from_millis(250)).await;

    // Two refusals, then the third attempt connects and restores output
    assert_eq!(surface.call_count("connect:err").await, 2);
    assert_eq!(surface.call_count("connect").await, 1);
    assert_eq!(escalator.mode().await, EscalationState::Nominal);

    let events = store.events().await;
    assert_eq!(events.len(), 1);
    assert!(events[0].end_time.is_some());
    assert!(events[0].recovery_action.contains("attempt 3"));

    // A later crash gets a fresh bounded run of attempts
    surface.set_connected(false).await;
    surface.fail_connects(100).await;
    tokio::time::sleep(Duration::from_millis(300)).await;

    assert_eq!(surface.call_count("connect:err").await, 2 + 3);
    assert_eq!(escalator.mode().await, EscalationState::TechnicalDifficulties);

    escalator.stop().await;
}

#[tokio::test]
async fn reconnecting_output_is_logged_once_and_never_restarted() {
    // Scenario: surface reports active=false, reconnecting=true across
    // consecutive watchdog ticks
    let config = fast_config(Duration::from_millis(30));
    let (surface, store, mut escalator) = setup(&config).await;
    surface.set_output(false, true).await;

    escalator.start(Uuid::now_v7()).await;
    tokio::time::sleep(Duration::from_millis(150)).await;

    let events = store.events().await;
    assert_eq!(events.len(), 1, "exactly one connection-lost event");
    assert_eq!(events[0].cause, FailureCause::ConnectionLost);
    assert!(events[0].end_time.is_none());

    assert_eq!(surface.call_count("start_output").await, 0, "no manual restart");
    assert_eq!(escalator.mode().await, EscalationState::Nominal, "no failover");

    escalator.stop().await;
}

#[tokio::test]
async fn inactive_output_gets_one_manual_restart() {
    let config = fast_config(Duration::from_millis(30));
    let (surface, store, mut escalator) = setup(&config).await;
    surface.set_output(false, false).await;

    escalator.start(Uuid::now_v7()).await;
    tokio::time::sleep(Duration::from_millis(150)).await;

    assert!(surface.call_count("start_output").await >= 1);

    let events = store.events().await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].cause, FailureCause::ConnectionLost);
    assert!(events[0].end_time.is_some());
    assert!(events[0].recovery_action.contains("restarted manually"));
    assert_eq!(escalator.mode().await, EscalationState::Nominal);

    escalator.stop().await;
}

#[tokio::test]
async fn failed_failover_switch_escalates_to_technical_difficulties_once() {
    let config = fast_config(Duration::from_millis(30));
    let (surface, store, mut escalator) = setup(&config).await;
    surface.set_output(false, false).await;
    surface.fail_start_output(true).await;
    surface.fail_scene_switch("Failover").await;

    escalator.start(Uuid::now_v7()).await;
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(escalator.mode().await, EscalationState::TechnicalDifficulties);
    assert_eq!(
        surface.call_count("switch_scene:Technical Difficulties").await,
        1,
        "terminal fallback engaged exactly once per escalation"
    );
    assert_eq!(surface.call_count("switch_scene:Failover:err").await, 1);

    let events = store.events().await;
    assert_eq!(events.len(), 1);
    assert!(!events[0].automatic_recovery);

    // Confirmed recovery clears even the terminal state
    surface.fail_start_output(false).await;
    surface.clear_scene_failures().await;
    surface.set_output(true, false).await;
    tokio::time::sleep(Duration::from_millis(120)).await;

    assert_eq!(escalator.mode().await, EscalationState::Nominal);
    let events = store.events().await;
    assert!(events[0].end_time.is_some());

    escalator.stop().await;
}

#[tokio::test]
async fn stop_finalizes_the_open_event() {
    let config = quiet_config();
    let (surface, store, mut escalator) = setup(&config).await;
    surface.set_output(true, false).await;

    escalator.start(Uuid::now_v7()).await;
    escalator.handle().content_failure("boom").await;
    assert!(store.events().await[0].end_time.is_none());

    escalator.stop().await;

    let events = store.events().await;
    assert!(events[0].end_time.is_some());
    assert!(events[0].recovery_action.contains("planned shutdown"));
}

#[tokio::test]
async fn downtime_event_invariants_hold() {
    // end_time strictly after start_time and duration equals the difference
    let config = fast_config(Duration::from_millis(30));
    let (surface, store, mut escalator) = setup(&config).await;
    surface.set_output(false, false).await;

    escalator.start(Uuid::now_v7()).await;
    tokio::time::sleep(Duration::from_millis(120)).await;
    escalator.stop().await;

    for event in store.events().await {
        if let Some(end_time) = event.end_time {
            assert!(end_time > event.start_time);
            let expected = (end_time - event.start_time).num_milliseconds() as f64 / 1000.0;
            assert!((event.duration_sec - expected).abs() < 0.01);
        }
    }
}

#[tokio::test]
async fn surface_errors_are_the_transient_kind() {
    let surface = ScriptedSurface::new();
    surface.set_fail_all(true).await;
    let err = surface.output_status().await.unwrap_err();
    assert!(matches!(err, OrchestratorError::Surface(_)));
    assert!(err.is_surface());
}
