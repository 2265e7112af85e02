// Integration tests for the content sequencer
//
// Cover rotation over the candidate list, pause/resume, the content-failure
// signal on an empty catalog (exactly once, no tight retry), and the
// signal-then-backoff path when the surface refuses the scene switch.

use std::sync::Arc;
use std::time::Duration;

use steadycast_core::memory::{InMemoryCatalog, InMemoryDowntimeStore, ScriptedSurface};
use steadycast_core::{AgeRating, ContentItem, FailureCause};
use steadycast_orchestrator::{
    ContentSequencer, EscalationState, FailureEscalator, OrchestratorConfig,
};
use uuid::Uuid;

fn fast_config() -> OrchestratorConfig {
    let mut config = OrchestratorConfig::default().with_test_cadences(Duration::from_millis(20));
    // Park the watchdog; these tests drive the escalator only through the
    // sequencer's content-failure signal
    config.cadences.watchdog = Duration::from_secs(60);
    config
}

fn item(title: &str, priority: i32) -> ContentItem {
    ContentItem {
        id: Uuid::now_v7(),
        title: title.to_string(),
        path: format!("/content/{title}.mp4"),
        duration_sec: 0,
        age_rating: AgeRating::All,
        time_blocks: vec!["general".to_string(), "evening_mixed".to_string()],
        priority,
        source_attribution: "Steadycast Library".to_string(),
    }
}

struct Fixture {
    surface: ScriptedSurface,
    downtime_store: InMemoryDowntimeStore,
    escalator: FailureEscalator,
    sequencer: ContentSequencer,
}

async fn setup(items: Vec<ContentItem>) -> Fixture {
    let config = fast_config();
    let surface = ScriptedSurface::with_scenes(&[
        "Automated Content",
        "Operator Live",
        "Failover",
        "Technical Difficulties",
    ])
    .await;
    surface.set_output(true, false).await;

    let downtime_store = InMemoryDowntimeStore::new();
    let catalog = InMemoryCatalog::new();
    catalog.seed(items).await;

    let mut escalator = FailureEscalator::new(
        Arc::new(surface.clone()),
        Arc::new(downtime_store.clone()),
        &config,
    );
    escalator.start(Uuid::now_v7()).await;

    let sequencer = ContentSequencer::new(
        Arc::new(surface.clone()),
        Arc::new(catalog.clone()),
        escalator.handle(),
        &config,
    );

    Fixture {
        surface,
        downtime_store,
        escalator,
        sequencer,
    }
}

#[tokio::test]
async fn rotation_updates_sources_and_switches_scene() {
    let mut fx = setup(vec![item("ident", 1), item("doc", 2)]).await;
    fx.sequencer.start().await;
    tokio::time::sleep(Duration::from_millis(200)).await;
    fx.sequencer.stop().await;
    fx.escalator.stop().await;

    assert!(fx.surface.call_count("switch_scene:Automated Content").await >= 2);
    assert!(
        fx.surface
            .call_count("media_source:Automated Content/Content Player")
            .await
            >= 2
    );
    assert!(
        fx.surface
            .call_count("text_source:Automated Content/Content Credits")
            .await
            >= 2
    );

    // Both items rotated through
    assert!(fx.surface.call_count("media_source:Automated Content/Content Player:/content/ident.mp4").await >= 1);
    assert!(fx.surface.call_count("media_source:Automated Content/Content Player:/content/doc.mp4").await >= 1);

    // Healthy playback opens no downtime events
    assert!(fx.downtime_store.events().await.is_empty());
}

#[tokio::test]
async fn now_playing_is_published_while_running_and_cleared_on_stop() {
    let mut fx = setup(vec![item("ident", 1)]).await;
    let handle = fx.sequencer.handle();

    fx.sequencer.start().await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(handle.now_playing().as_deref(), Some("ident"));

    fx.sequencer.stop().await;
    fx.escalator.stop().await;
    assert!(handle.now_playing().is_none());
}

#[tokio::test]
async fn paused_sequencer_idles_without_touching_the_surface() {
    let mut fx = setup(vec![item("ident", 1)]).await;
    let handle = fx.sequencer.handle();

    fx.sequencer.start().await;
    tokio::time::sleep(Duration::from_millis(80)).await;

    handle.pause();
    tokio::time::sleep(Duration::from_millis(60)).await;
    fx.surface.clear_calls().await;
    tokio::time::sleep(Duration::from_millis(150)).await;

    assert_eq!(
        fx.surface.call_count("switch_scene").await,
        0,
        "no scene activity while paused"
    );

    handle.resume();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(fx.surface.call_count("switch_scene:Automated Content").await >= 1);

    fx.sequencer.stop().await;
    fx.escalator.stop().await;
}

#[tokio::test]
async fn empty_catalog_signals_content_failure_exactly_once() {
    // Scenario: nothing playable for the current block and no general
    // fallback; the sequencer signals once at startup and does not retry
    let mut fx = setup(Vec::new()).await;
    fx.sequencer.start().await;
    tokio::time::sleep(Duration::from_millis(150)).await;

    let events = fx.downtime_store.events().await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].cause, FailureCause::ContentFailure);
    assert_eq!(fx.surface.call_count("switch_scene:Failover").await, 1);
    assert_eq!(fx.escalator.mode().await, EscalationState::Failover);

    // No tight retry loop: nothing accumulates over time
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(fx.downtime_store.events().await.len(), 1);
    assert_eq!(fx.surface.call_count("switch_scene:Failover").await, 1);

    fx.sequencer.stop().await;
    fx.escalator.stop().await;
}

#[tokio::test]
async fn playback_failure_signals_the_escalator_and_backs_off() {
    let mut fx = setup(vec![item("ident", 1)]).await;
    fx.surface.fail_scene_switch("Automated Content").await;

    fx.sequencer.start().await;
    tokio::time::sleep(Duration::from_millis(200)).await;

    // One open content-failure event, failover engaged once
    let events = fx.downtime_store.events().await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].cause, FailureCause::ContentFailure);
    assert!(events[0].end_time.is_none());
    assert_eq!(fx.surface.call_count("switch_scene:Failover").await, 1);
    assert_eq!(fx.escalator.mode().await, EscalationState::Failover);

    // Failures are paced by the backoff, not a tight loop: at a 20ms
    // backoff a 200ms window sees a bounded number of attempts
    let attempts = fx.surface.call_count("switch_scene:Automated Content:err").await;
    assert!(attempts >= 1);
    assert!(attempts <= 12, "attempts should be paced, got {attempts}");

    // Once the surface recovers, rotation resumes
    fx.surface.clear_scene_failures().await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    let successful_switches = fx
        .surface
        .calls()
        .await
        .iter()
        .filter(|c| *c == "switch_scene:Automated Content")
        .count();
    assert!(successful_switches >= 1);

    fx.sequencer.stop().await;
    fx.escalator.stop().await;
}
