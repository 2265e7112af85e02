// Content catalog domain types
//
// ContentItem rows are produced by an external metadata pipeline and
// consumed read-only by the content sequencer.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Age rating attached to a content item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgeRating {
    Kids,
    Adult,
    All,
}

impl AgeRating {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgeRating::Kids => "kids",
            AgeRating::Adult => "adult",
            AgeRating::All => "all",
        }
    }
}

impl std::fmt::Display for AgeRating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<&str> for AgeRating {
    fn from(s: &str) -> Self {
        match s {
            "kids" => AgeRating::Kids,
            "adult" => AgeRating::Adult,
            _ => AgeRating::All,
        }
    }
}

/// A playable catalog entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: Uuid,
    pub title: String,
    /// Path the control surface's media source can play
    pub path: String,
    pub duration_sec: i64,
    pub age_rating: AgeRating,
    /// Time-block tags this item may air in (e.g. "evening_mixed", "general")
    pub time_blocks: Vec<String>,
    /// 1 = highest priority
    pub priority: i32,
    /// Source/licensing text shown on the attribution overlay
    pub source_attribution: String,
}

impl ContentItem {
    /// Overlay text for this item: title plus attribution line
    pub fn attribution_text(&self) -> String {
        format!("{}\nSource: {}", self.title, self.source_attribution)
    }
}
