//! Loopback Example - Full orchestrator against in-memory doubles
//!
//! Wires the five coordinators around the scripted control surface and the
//! in-memory stores, runs a short broadcast with an operator takeover, and
//! prints the records the stores accumulated. A production binary replaces
//! the doubles with a real control-surface adapter and a Postgres Database.
//!
//! Run with: cargo run -p steadycast-orchestrator --example loopback

use std::sync::Arc;
use std::time::Duration;

use steadycast_core::{
    memory::{InMemoryCatalog, InMemoryDowntimeStore, InMemoryMetricStore, InMemorySessionStore},
    AgeRating, ContentItem, SessionStore,
};
use steadycast_orchestrator::{Orchestrator, OrchestratorConfig};
use uuid::Uuid;

fn catalog_item(title: &str, priority: i32) -> ContentItem {
    ContentItem {
        id: Uuid::now_v7(),
        title: title.to_string(),
        path: format!("/content/{title}.mp4"),
        duration_sec: 1,
        age_rating: AgeRating::All,
        time_blocks: vec!["general".to_string(), "evening_mixed".to_string()],
        priority,
        source_attribution: "Steadycast Library".to_string(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "steadycast=info".into()),
        )
        .init();

    println!("=== Steadycast loopback ===\n");

    // 1. Scripted control surface with the required scenes on hand
    let surface = steadycast_core::memory::ScriptedSurface::with_scenes(&[
        "Automated Content",
        "Operator Live",
        "Failover",
        "Technical Difficulties",
    ])
    .await;

    // 2. In-memory stores and a small catalog
    let session_store = InMemorySessionStore::new();
    let downtime_store = InMemoryDowntimeStore::new();
    let metric_store = InMemoryMetricStore::new();
    let catalog = InMemoryCatalog::new();
    catalog
        .seed(vec![
            catalog_item("station_ident", 1),
            catalog_item("nature_doc", 2),
        ])
        .await;

    // 3. Fast cadences so the demo finishes quickly
    let config =
        OrchestratorConfig::default().with_test_cadences(Duration::from_millis(50));

    let mut orchestrator = Orchestrator::new(
        Arc::new(surface.clone()),
        Arc::new(session_store.clone()),
        Arc::new(downtime_store.clone()),
        Arc::new(metric_store.clone()),
        Arc::new(catalog),
        config,
    );

    // 4. Start broadcasting and let a few items rotate
    let session = orchestrator.start().await?;
    println!("broadcast session {} on-air\n", session.id);
    tokio::time::sleep(Duration::from_millis(400)).await;

    // 5. Operator takes over, browses, and hands back
    surface.set_current_scene("Operator Live").await;
    tokio::time::sleep(Duration::from_millis(300)).await;
    surface.set_current_scene("Automated Content").await;
    tokio::time::sleep(Duration::from_millis(300)).await;

    orchestrator.stop().await?;

    // 6. Show what was persisted
    let sessions = session_store.sessions().await;
    let operator_sessions = session_store.operator_sessions().await;
    let metrics = metric_store.metrics().await;
    let events = downtime_store.events().await;

    println!("\nbroadcast sessions: {}", sessions.len());
    for s in &sessions {
        println!(
            "  {} uptime {:.1}% over {}s",
            s.id,
            s.uptime_percentage(),
            s.total_duration_sec
        );
    }
    println!("operator sessions:  {}", operator_sessions.len());
    for op in &operator_sessions {
        println!(
            "  {} interrupted={:?} duration={}s",
            op.id, op.interrupted_content, op.duration_sec
        );
    }
    println!("health metrics:     {}", metrics.len());
    println!("downtime events:    {}", events.len());

    // The latest-open lookup sees nothing once the session is closed
    assert!(session_store.latest_open_session().await?.is_none());

    Ok(())
}
