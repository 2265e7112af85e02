// Time-block aware content selection
//
// Selection is a pure function of (catalog, instant): the same inputs always
// produce the same ordered candidate list. The sequencer re-runs it whenever
// the computed block changes.

use chrono::{DateTime, Datelike, Timelike, Utc};

use crate::content::{AgeRating, ContentItem};

/// Named wall-clock window used to filter eligible content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeBlock {
    /// Mon-Fri 15:00-18:00 UTC
    KidsAfterSchool,
    /// Mon-Fri 09:00-15:00 UTC
    ProfessionalHours,
    /// Every day 19:00-22:00 UTC
    EveningMixed,
    /// Everything else
    General,
}

impl TimeBlock {
    /// Tag string items use to opt into this block
    pub fn tag(&self) -> &'static str {
        match self {
            TimeBlock::KidsAfterSchool => "after_school_kids",
            TimeBlock::ProfessionalHours => "professional_hours",
            TimeBlock::EveningMixed => "evening_mixed",
            TimeBlock::General => "general",
        }
    }

    /// Age rating required of content airing in this block
    pub fn required_rating(&self) -> AgeRating {
        match self {
            TimeBlock::KidsAfterSchool => AgeRating::Kids,
            TimeBlock::ProfessionalHours => AgeRating::Adult,
            TimeBlock::EveningMixed | TimeBlock::General => AgeRating::All,
        }
    }

    /// Compute the block for a wall-clock instant (weekday-aware)
    pub fn for_instant(now: DateTime<Utc>) -> TimeBlock {
        let hour = now.hour();
        let is_weekday = now.weekday().number_from_monday() <= 5;

        if is_weekday && (15..18).contains(&hour) {
            TimeBlock::KidsAfterSchool
        } else if is_weekday && (9..15).contains(&hour) {
            TimeBlock::ProfessionalHours
        } else if (19..22).contains(&hour) {
            TimeBlock::EveningMixed
        } else {
            TimeBlock::General
        }
    }
}

impl std::fmt::Display for TimeBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// Whether content with `rating` may air in a block requiring `required`
///
/// All-ages content fits every block; kids content only a kids block; adult
/// content fits adult- and all-rated blocks.
pub fn rating_allowed(rating: AgeRating, required: AgeRating) -> bool {
    match rating {
        AgeRating::All => true,
        AgeRating::Kids => required == AgeRating::Kids,
        AgeRating::Adult => matches!(required, AgeRating::Adult | AgeRating::All),
    }
}

/// Build the ordered candidate list for an instant
///
/// Items tagged for the current block (and rating-compatible with it) win;
/// if none match, items tagged for the general block with the same rating
/// filter are used instead. Candidates are ordered by ascending priority
/// (1 = highest), then title, so the rotation order is total and stable.
pub fn select_candidates(items: &[ContentItem], now: DateTime<Utc>) -> Vec<ContentItem> {
    let block = TimeBlock::for_instant(now);
    let required = block.required_rating();

    let mut matching: Vec<ContentItem> = items
        .iter()
        .filter(|item| {
            item.time_blocks.iter().any(|t| t == block.tag())
                && rating_allowed(item.age_rating, required)
        })
        .cloned()
        .collect();

    if matching.is_empty() {
        matching = items
            .iter()
            .filter(|item| {
                item.time_blocks.iter().any(|t| t == TimeBlock::General.tag())
                    && rating_allowed(item.age_rating, required)
            })
            .cloned()
            .collect();
    }

    matching.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.title.cmp(&b.title)));
    matching
}
