// Content sequencer
//
// Drives automated playback: picks the next catalog item for the current
// time block, updates the media and attribution sources, switches to the
// automated-content scene, and sleeps for the item's real duration plus a
// short transition gap. Pauses while the operator holds the picture.
//
// Content failures are signalled to the failure escalator rather than
// retried in a tight loop; an empty candidate list at startup signals
// exactly once and ends the loop.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use steadycast_core::{
    select_candidates, ContentCatalog, ContentItem, ControlSurface, Result, TextStyle, TimeBlock,
};

use crate::config::OrchestratorConfig;
use crate::escalator::EscalatorHandle;

/// Playback state, toggled by the session coordinator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencerState {
    Running,
    Paused,
}

/// Cloneable handle for pausing/resuming playback and reading now-playing
#[derive(Clone)]
pub struct SequencerHandle {
    state_tx: watch::Sender<SequencerState>,
    now_playing_rx: watch::Receiver<Option<String>>,
}

impl SequencerHandle {
    /// Pause automated playback (operator takeover)
    pub fn pause(&self) {
        if *self.state_tx.borrow() == SequencerState::Paused {
            warn!("sequencer already paused");
            return;
        }
        self.state_tx.send_replace(SequencerState::Paused);
        info!("sequencer paused");
    }

    /// Resume automated playback (operator handed back)
    pub fn resume(&self) {
        if *self.state_tx.borrow() == SequencerState::Running {
            warn!("sequencer not paused");
            return;
        }
        self.state_tx.send_replace(SequencerState::Running);
        info!("sequencer resumed");
    }

    pub fn state(&self) -> SequencerState {
        *self.state_tx.borrow()
    }

    /// Title of the content item currently on-air, if any
    pub fn now_playing(&self) -> Option<String> {
        self.now_playing_rx.borrow().clone()
    }
}

/// Automated content playback loop
pub struct ContentSequencer {
    surface: Arc<dyn ControlSurface>,
    catalog: Arc<dyn ContentCatalog>,
    escalator: EscalatorHandle,
    automated_scene: String,
    media_source: String,
    attribution_source: String,
    transition_ms: u32,
    transition_gap: Duration,
    paused_idle: Duration,
    retry_backoff: Duration,
    state_tx: watch::Sender<SequencerState>,
    now_playing_tx: watch::Sender<Option<String>>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    handle: Option<JoinHandle<()>>,
}

impl ContentSequencer {
    pub fn new(
        surface: Arc<dyn ControlSurface>,
        catalog: Arc<dyn ContentCatalog>,
        escalator: EscalatorHandle,
        config: &OrchestratorConfig,
    ) -> Self {
        let (state_tx, _) = watch::channel(SequencerState::Running);
        let (now_playing_tx, _) = watch::channel(None);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Self {
            surface,
            catalog,
            escalator,
            automated_scene: config.scenes.automated_content.clone(),
            media_source: config.media_source_name.clone(),
            attribution_source: config.attribution_source_name.clone(),
            transition_ms: config.transition_ms,
            transition_gap: config.cadences.transition_gap,
            paused_idle: config.cadences.paused_idle,
            retry_backoff: config.cadences.content_retry_backoff,
            state_tx,
            now_playing_tx,
            shutdown_tx,
            shutdown_rx,
            handle: None,
        }
    }

    /// Pause/resume handle for the session coordinator
    pub fn handle(&self) -> SequencerHandle {
        SequencerHandle {
            state_tx: self.state_tx.clone(),
            now_playing_rx: self.now_playing_tx.subscribe(),
        }
    }

    /// Receiver of the now-playing title (consumed by the health sampler)
    pub fn now_playing_rx(&self) -> watch::Receiver<Option<String>> {
        self.now_playing_tx.subscribe()
    }

    /// Start the playback loop
    pub async fn start(&mut self) {
        if self.handle.is_some() {
            warn!("content sequencer already running");
            return;
        }

        self.state_tx.send_replace(SequencerState::Running);

        let playback = SequencerLoop {
            surface: self.surface.clone(),
            catalog: self.catalog.clone(),
            escalator: self.escalator.clone(),
            automated_scene: self.automated_scene.clone(),
            media_source: self.media_source.clone(),
            attribution_source: self.attribution_source.clone(),
            transition_ms: self.transition_ms,
            transition_gap: self.transition_gap,
            paused_idle: self.paused_idle,
            retry_backoff: self.retry_backoff,
            state_rx: self.state_tx.subscribe(),
            now_playing_tx: self.now_playing_tx.clone(),
        };
        let shutdown_rx = self.shutdown_rx.clone();

        self.handle = Some(tokio::spawn(async move {
            playback.run(shutdown_rx).await;
        }));

        info!("content sequencer started");
    }

    /// Signal shutdown and wait for the playback loop to finish
    pub async fn stop(&mut self) {
        let _ = self.shutdown_tx.send(true);
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
        info!("content sequencer stopped");
    }
}

struct SequencerLoop {
    surface: Arc<dyn ControlSurface>,
    catalog: Arc<dyn ContentCatalog>,
    escalator: EscalatorHandle,
    automated_scene: String,
    media_source: String,
    attribution_source: String,
    transition_ms: u32,
    transition_gap: Duration,
    paused_idle: Duration,
    retry_backoff: Duration,
    state_rx: watch::Receiver<SequencerState>,
    now_playing_tx: watch::Sender<Option<String>>,
}

impl SequencerLoop {
    async fn run(self, mut shutdown_rx: watch::Receiver<bool>) {
        let mut block = TimeBlock::for_instant(Utc::now());
        let Some(mut candidates) = self.build_candidates().await else {
            return;
        };
        let mut index: usize = 0;

        loop {
            if *shutdown_rx.borrow() {
                break;
            }

            if *self.state_rx.borrow() == SequencerState::Paused {
                debug!("sequencer paused; idling");
                if !self.sleep(self.paused_idle, &mut shutdown_rx).await {
                    break;
                }
                continue;
            }

            // Refresh the candidate list whenever the time block rolls over
            let current_block = TimeBlock::for_instant(Utc::now());
            if current_block != block {
                info!(from = %block, to = %current_block, "time block changed; refreshing candidates");
                block = current_block;
                match self.build_candidates().await {
                    Some(fresh) => {
                        candidates = fresh;
                        index = 0;
                    }
                    None => break,
                }
            }

            let item = candidates[index % candidates.len()].clone();
            index = index.wrapping_add(1);

            match self.play(&item).await {
                Ok(()) => {
                    self.now_playing_tx.send_replace(Some(item.title.clone()));
                    info!(
                        title = %item.title,
                        duration_sec = item.duration_sec,
                        priority = item.priority,
                        "content playing"
                    );

                    let duration = Duration::from_secs(item.duration_sec.max(0) as u64);
                    if !self.sleep(duration, &mut shutdown_rx).await {
                        break;
                    }
                    if !self.sleep(self.transition_gap, &mut shutdown_rx).await {
                        break;
                    }
                }
                Err(e) => {
                    error!(title = %item.title, error = %e, "content playback failed");
                    self.now_playing_tx.send_replace(None);
                    self.escalator
                        .content_failure(&format!("failed to start '{}': {e}", item.title))
                        .await;
                    if !self.sleep(self.retry_backoff, &mut shutdown_rx).await {
                        break;
                    }
                }
            }
        }

        self.now_playing_tx.send_replace(None);
        debug!("content playback loop ended");
    }

    /// Build the candidate list for the current instant; signals a content
    /// failure and returns None when nothing is playable
    async fn build_candidates(&self) -> Option<Vec<ContentItem>> {
        let items = match self.catalog.list_items().await {
            Ok(items) => items,
            Err(e) => {
                self.escalator
                    .content_failure(&format!("content catalog unavailable: {e}"))
                    .await;
                return None;
            }
        };

        let now = Utc::now();
        let candidates = select_candidates(&items, now);
        if candidates.is_empty() {
            self.escalator
                .content_failure("no content available for current time block")
                .await;
            return None;
        }

        info!(
            count = candidates.len(),
            block = %TimeBlock::for_instant(now),
            "candidate list built"
        );
        Some(candidates)
    }

    /// Load one item onto the automated scene and bring it on program
    async fn play(&self, item: &ContentItem) -> Result<()> {
        self.surface
            .upsert_media_source(&self.automated_scene, &self.media_source, &item.path, false)
            .await?;
        self.surface
            .upsert_text_source(
                &self.automated_scene,
                &self.attribution_source,
                &item.attribution_text(),
                &TextStyle::default(),
            )
            .await?;
        self.surface
            .switch_scene(&self.automated_scene, self.transition_ms)
            .await?;
        Ok(())
    }

    /// Interruptible sleep; false means shutdown fired
    async fn sleep(&self, duration: Duration, shutdown_rx: &mut watch::Receiver<bool>) -> bool {
        tokio::select! {
            _ = shutdown_rx.changed() => false,
            _ = tokio::time::sleep(duration) => true,
        }
    }
}
