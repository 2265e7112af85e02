// Control surface contract
//
// The control surface is the remote-controllable broadcast session (scenes,
// sources, output) this core drives. It is an external collaborator consumed
// through this trait; implementations can be:
// - A real adapter speaking the surface's remote protocol
// - The scripted in-memory surface for examples and testing
//
// Every call may fail with a connection error. Coordinators treat that as a
// recoverable condition at their own cadence, never as a crash.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Output pipeline status snapshot
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct OutputStatus {
    /// Whether the output is live
    pub active: bool,
    /// Whether the surface is itself attempting to reconnect the output
    pub reconnecting: bool,
    /// Total bytes sent since output start
    pub bytes_sent: u64,
    /// Milliseconds since output start
    pub duration_ms: u64,
}

/// Performance counters reported by the control surface
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PerformanceStats {
    /// CPU usage the surface reports for itself (0-100)
    pub cpu_usage_pct: f64,
    /// Frames skipped by the output encoder
    pub skipped_frames: u64,
    /// Total frames handled by the output encoder
    pub total_frames: u64,
}

impl PerformanceStats {
    /// Percentage of skipped frames, 0.0 when no frames were handled
    pub fn dropped_frames_pct(&self) -> f64 {
        if self.total_frames == 0 {
            return 0.0;
        }
        (self.skipped_frames as f64 / self.total_frames as f64) * 100.0
    }
}

/// Styling for an on-air text source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextStyle {
    pub font_face: String,
    pub font_size: u32,
    /// ARGB text color
    pub color: u32,
    pub outline: bool,
    pub outline_size: u32,
    /// ARGB outline color
    pub outline_color: u32,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_face: "Arial".to_string(),
            font_size: 48,
            color: 0xFFFF_FFFF,
            outline: true,
            outline_size: 2,
            outline_color: 0xFF00_0000,
        }
    }
}

/// Remote-controllable broadcast session
#[async_trait]
pub trait ControlSurface: Send + Sync {
    /// Establish the connection to the surface
    async fn connect(&self) -> Result<()>;

    /// Gracefully close the connection
    async fn disconnect(&self) -> Result<()>;

    /// Whether the surface is currently reachable
    async fn is_connected(&self) -> bool;

    /// Names of all scenes known to the surface
    async fn list_scenes(&self) -> Result<Vec<String>>;

    /// Whether a scene with this name exists
    async fn scene_exists(&self, name: &str) -> Result<bool> {
        Ok(self.list_scenes().await?.iter().any(|s| s == name))
    }

    /// Create a scene; idempotent, never overwrites an existing scene
    async fn create_scene(&self, name: &str) -> Result<()>;

    /// Switch the program to a scene with the given transition duration
    async fn switch_scene(&self, name: &str, transition_ms: u32) -> Result<()>;

    /// Name of the scene currently on program
    async fn current_scene(&self) -> Result<String>;

    /// Create or update a media source on a scene
    async fn upsert_media_source(
        &self,
        scene: &str,
        source: &str,
        path: &str,
        loop_playback: bool,
    ) -> Result<()>;

    /// Create or update a text source on a scene
    async fn upsert_text_source(
        &self,
        scene: &str,
        source: &str,
        text: &str,
        style: &TextStyle,
    ) -> Result<()>;

    /// Current output pipeline status
    async fn output_status(&self) -> Result<OutputStatus>;

    /// Start the output; a no-op if already active
    async fn start_output(&self) -> Result<()>;

    /// Stop the output; a no-op if already stopped
    async fn stop_output(&self) -> Result<()>;

    /// Performance counters for the current output
    async fn performance_stats(&self) -> Result<PerformanceStats>;
}
