//! Reminder domain model.
//!
//! # Invariants
//! - One user-created reminder is an *entry* with a stable [`EntryId`].
//! - An entry appears as at most one row per folder; mirrored rows share the
//!   entry id but keep independent ranks.
//! - Urgency is always one of the three [`Urgency`] levels.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identity shared by all folder rows of one reminder.
pub type EntryId = Uuid;

/// Ordinal urgency attached to a reminder.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    #[default]
    Low,
    Medium,
    High,
}

impl Urgency {
    pub const ALL: [Urgency; 3] = [Urgency::Low, Urgency::Medium, Urgency::High];

    pub fn from_level(level: i64) -> Option<Self> {
        match level {
            1 => Some(Self::Low),
            2 => Some(Self::Medium),
            3 => Some(Self::High),
            _ => None,
        }
    }

    pub fn level(self) -> i64 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
        }
    }

    /// Label shown in the urgency picker.
    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "No Urgency",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }

    /// Parses a picker label; unknown labels fall back to `Low`.
    pub fn from_label(label: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|urgency| urgency.label().eq_ignore_ascii_case(label.trim()))
            .unwrap_or(Self::Low)
    }

    /// Key of the visual indicator drawn next to the reminder.
    pub fn indicator(self) -> &'static str {
        match self {
            Self::Low => "urgency_low",
            Self::Medium => "urgency_medium",
            Self::High => "urgency_high",
        }
    }

    /// High urgency reminders are mirrored into `Pinned`.
    pub fn pins(self) -> bool {
        self == Self::High
    }
}

/// One reminder row inside one folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    pub entry_id: EntryId,
    pub text: String,
    pub folder_name: String,
    /// Dense per-folder display rank.
    pub rank: i64,
    pub urgency: Urgency,
    /// Primary notification time captured when the reminder was added.
    pub notify_at: Option<NaiveDateTime>,
}

/// Input for creating a new reminder entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderDraft {
    pub text: String,
    pub folder_name: String,
    pub urgency: Urgency,
    pub notify_at: Option<NaiveDateTime>,
    /// Also mirror the entry into `Recurring`.
    pub recurring: bool,
}

impl ReminderDraft {
    pub fn new(text: impl Into<String>, folder_name: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            folder_name: folder_name.into(),
            urgency: Urgency::Low,
            notify_at: None,
            recurring: false,
        }
    }

    pub fn urgency(mut self, urgency: Urgency) -> Self {
        self.urgency = urgency;
        self
    }

    pub fn notify_at(mut self, at: NaiveDateTime) -> Self {
        self.notify_at = Some(at);
        self
    }

    pub fn recurring(mut self, recurring: bool) -> Self {
        self.recurring = recurring;
        self
    }
}

/// Reminder row with every notification time known for it in its folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderView {
    pub reminder: Reminder,
    /// Ascending, deduplicated notification times.
    pub occurrences: Vec<NaiveDateTime>,
    /// `false` inside `Completed`, where the urgency indicator is hidden.
    pub show_urgency: bool,
}

/// Display instance derived from a reminder and its occurrences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderInstance {
    pub entry_id: EntryId,
    pub label: String,
    pub occurrences: Vec<NaiveDateTime>,
}

/// Splits occurrences into one labeled instance per past occurrence and a
/// single grouped instance for all future ones.
///
/// Past labels read `"<text> (Jan 02, 2026)"`. A reminder without any
/// occurrences yields one plain instance.
pub fn split_occurrences(
    entry_id: EntryId,
    text: &str,
    occurrences: &[NaiveDateTime],
    now: NaiveDateTime,
) -> Vec<ReminderInstance> {
    if occurrences.is_empty() {
        return vec![ReminderInstance {
            entry_id,
            label: text.to_string(),
            occurrences: Vec::new(),
        }];
    }

    let (past, future): (Vec<NaiveDateTime>, Vec<NaiveDateTime>) =
        occurrences.iter().copied().partition(|at| *at < now);

    let mut instances: Vec<ReminderInstance> = past
        .into_iter()
        .map(|at| ReminderInstance {
            entry_id,
            label: format!("{text} ({})", at.format("%b %d, %Y")),
            occurrences: vec![at],
        })
        .collect();

    if !future.is_empty() {
        instances.push(ReminderInstance {
            entry_id,
            label: text.to_string(),
            occurrences: future,
        });
    }
    instances
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn urgency_levels_map_both_ways() {
        for urgency in Urgency::ALL {
            assert_eq!(Urgency::from_level(urgency.level()), Some(urgency));
        }
        assert_eq!(Urgency::from_level(0), None);
        assert_eq!(Urgency::from_level(4), None);
        assert!(Urgency::High.pins());
        assert!(!Urgency::Medium.pins());
    }

    #[test]
    fn urgency_label_parsing_falls_back_to_low() {
        assert_eq!(Urgency::from_label("high"), Urgency::High);
        assert_eq!(Urgency::from_label("Medium"), Urgency::Medium);
        assert_eq!(Urgency::from_label("whatever"), Urgency::Low);
    }

    #[test]
    fn split_labels_past_and_groups_future() {
        let id = Uuid::new_v4();
        let now = at(2026, 3, 10, 12);
        let occurrences = [at(2026, 3, 1, 9), at(2026, 3, 8, 9), at(2026, 3, 15, 9), at(2026, 3, 22, 9)];

        let instances = split_occurrences(id, "Water plants", &occurrences, now);
        assert_eq!(instances.len(), 3);
        assert_eq!(instances[0].label, "Water plants (Mar 01, 2026)");
        assert_eq!(instances[1].label, "Water plants (Mar 08, 2026)");
        assert_eq!(instances[2].label, "Water plants");
        assert_eq!(instances[2].occurrences, vec![at(2026, 3, 15, 9), at(2026, 3, 22, 9)]);
    }

    #[test]
    fn split_without_occurrences_keeps_plain_text() {
        let id = Uuid::new_v4();
        let instances = split_occurrences(id, "Call mom", &[], at(2026, 1, 1, 0));
        assert_eq!(instances.len(), 1);
        assert_eq!(instances[0].label, "Call mom");
        assert!(instances[0].occurrences.is_empty());
    }
}
