// Orchestrator configuration
//
// Loaded from environment variables. Cadences are part of the configuration
// so tests can run the coordinator loops at millisecond intervals; production
// deployments keep the defaults.

use std::env;
use std::time::Duration;

/// Names of the scenes the orchestrator drives
#[derive(Debug, Clone)]
pub struct SceneNames {
    /// Scene automated playback runs in
    pub automated_content: String,
    /// Scene the operator switches to when taking over
    pub operator_live: String,
    /// Safe scene shown when primary content fails
    pub failover: String,
    /// Terminal fallback when failover itself cannot be engaged
    pub technical_difficulties: String,
}

impl Default for SceneNames {
    fn default() -> Self {
        Self {
            automated_content: "Automated Content".to_string(),
            operator_live: "Operator Live".to_string(),
            failover: "Failover".to_string(),
            technical_difficulties: "Technical Difficulties".to_string(),
        }
    }
}

impl SceneNames {
    /// All scenes that must exist before the orchestrator starts
    pub fn required(&self) -> [&str; 4] {
        [
            &self.automated_content,
            &self.operator_live,
            &self.failover,
            &self.technical_difficulties,
        ]
    }
}

/// Loop cadences and grace periods
///
/// No coordinator polls faster than its cadence; longer cadences bound
/// worst-case detection latency, not correctness.
#[derive(Debug, Clone)]
pub struct Cadences {
    /// Operator-takeover detector scene poll
    pub operator_poll: Duration,
    /// Health sampler tick
    pub health_sample: Duration,
    /// Failure escalator watchdog tick
    pub watchdog: Duration,
    /// Session coordinator monitor tick
    pub session_monitor: Duration,
    /// Wait before the monitor's single restart of an externally stopped output
    pub restart_grace: Duration,
    /// Sequencer idle wait while paused
    pub paused_idle: Duration,
    /// Gap between content items
    pub transition_gap: Duration,
    /// Sequencer back-off after signalling a content failure
    pub content_retry_backoff: Duration,
}

impl Default for Cadences {
    fn default() -> Self {
        Self {
            operator_poll: Duration::from_secs(2),
            health_sample: Duration::from_secs(10),
            watchdog: Duration::from_secs(15),
            session_monitor: Duration::from_secs(10),
            restart_grace: Duration::from_secs(10),
            paused_idle: Duration::from_secs(1),
            transition_gap: Duration::from_millis(500),
            content_retry_backoff: Duration::from_secs(5),
        }
    }
}

/// Top-level orchestrator configuration
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub scenes: SceneNames,
    pub cadences: Cadences,
    /// Scene transition duration handed to the control surface
    pub transition_ms: u32,
    /// Bounded reconnect attempts in the control-surface crash path
    pub max_surface_reconnect_attempts: u32,
    /// Media file looped on the failover scene
    pub failover_media_path: String,
    /// Name of the media source on the automated-content scene
    pub media_source_name: String,
    /// Name of the attribution text source on the automated-content scene
    pub attribution_source_name: String,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            scenes: SceneNames::default(),
            cadences: Cadences::default(),
            transition_ms: 300,
            max_surface_reconnect_attempts: 3,
            failover_media_path: "/var/lib/steadycast/failover/default_failover.mp4".to_string(),
            media_source_name: "Content Player".to_string(),
            attribution_source_name: "Content Credits".to_string(),
        }
    }
}

impl OrchestratorConfig {
    /// Create configuration from environment variables
    ///
    /// Environment variables (all optional):
    /// - `STEADYCAST_SCENE_AUTOMATED`: automated-content scene name
    /// - `STEADYCAST_SCENE_OPERATOR`: operator scene name
    /// - `STEADYCAST_SCENE_FAILOVER`: failover scene name
    /// - `STEADYCAST_SCENE_TECH_DIFFICULTIES`: terminal fallback scene name
    /// - `STEADYCAST_FAILOVER_MEDIA`: path of the failover media file
    /// - `STEADYCAST_TRANSITION_MS`: scene transition duration
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(v) = env::var("STEADYCAST_SCENE_AUTOMATED") {
            config.scenes.automated_content = v;
        }
        if let Ok(v) = env::var("STEADYCAST_SCENE_OPERATOR") {
            config.scenes.operator_live = v;
        }
        if let Ok(v) = env::var("STEADYCAST_SCENE_FAILOVER") {
            config.scenes.failover = v;
        }
        if let Ok(v) = env::var("STEADYCAST_SCENE_TECH_DIFFICULTIES") {
            config.scenes.technical_difficulties = v;
        }
        if let Ok(v) = env::var("STEADYCAST_FAILOVER_MEDIA") {
            config.failover_media_path = v;
        }
        if let Ok(v) = env::var("STEADYCAST_TRANSITION_MS") {
            if let Ok(ms) = v.parse() {
                config.transition_ms = ms;
            }
        }

        config
    }

    /// Shrink every cadence for fast loop tests
    pub fn with_test_cadences(mut self, tick: Duration) -> Self {
        self.cadences = Cadences {
            operator_poll: tick,
            health_sample: tick,
            watchdog: tick,
            session_monitor: tick,
            restart_grace: tick,
            paused_idle: tick,
            transition_gap: tick,
            content_retry_backoff: tick,
        };
        self
    }
}
