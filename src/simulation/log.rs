//! Turn log — categorized events and the capped activity archive
//!
//! Settlements and the turn resolver emit `LogEntry` values; the archive
//! keeps the most recent turns' worth of sourced entries for the UI.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// Maximum number of archived turns kept in the activity log.
pub const MAX_ARCHIVED_TURNS: usize = 20;

/// Category of a turn event, rendered as the `category|` prefix.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogCategory {
    Production,
    Build,
    Tech,
    Unit,
    Warning,
    Growth,
    Consumption,
    Move,
    Death,
    Info,
}

impl LogCategory {
    pub fn tag(&self) -> &'static str {
        match self {
            LogCategory::Production => "production",
            LogCategory::Build => "build",
            LogCategory::Tech => "tech",
            LogCategory::Unit => "unit",
            LogCategory::Warning => "warning",
            LogCategory::Growth => "growth",
            LogCategory::Consumption => "consumption",
            LogCategory::Move => "move",
            LogCategory::Death => "death",
            LogCategory::Info => "info",
        }
    }
}

/// A single categorized event message
#[derive(Clone, Debug, PartialEq)]
pub struct LogEntry {
    pub category: LogCategory,
    pub message: String,
}

impl LogEntry {
    pub fn new(category: LogCategory, message: impl Into<String>) -> Self {
        LogEntry {
            category,
            message: message.into(),
        }
    }

    /// The `category|message` wire form shared with the UI layer.
    pub fn render(&self) -> String {
        format!("{}|{}", self.category.tag(), self.message)
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.category.tag(), self.message)
    }
}

/// An event attributed to its source (settlement name, unit type, ...)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SourcedEntry {
    pub source: String,
    pub text: String,
}

impl SourcedEntry {
    pub fn new(source: impl Into<String>, entry: LogEntry) -> Self {
        SourcedEntry {
            source: source.into(),
            text: entry.render(),
        }
    }
}

/// Everything that happened in one resolved turn
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TurnRecord {
    pub turn: u32,
    pub events: Vec<SourcedEntry>,
}

/// Archive of recent turns, newest first, capped at
/// [`MAX_ARCHIVED_TURNS`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityLog {
    records: VecDeque<TurnRecord>,
}

impl ActivityLog {
    pub fn new() -> Self {
        ActivityLog {
            records: VecDeque::with_capacity(MAX_ARCHIVED_TURNS),
        }
    }

    /// Prepend a turn's events, dropping the oldest beyond the cap.
    pub fn record(&mut self, turn: u32, events: Vec<SourcedEntry>) {
        self.records.push_front(TurnRecord { turn, events });
        while self.records.len() > MAX_ARCHIVED_TURNS {
            self.records.pop_back();
        }
    }

    /// The most recently archived turn.
    pub fn latest(&self) -> Option<&TurnRecord> {
        self.records.front()
    }

    /// Archived turns, newest first.
    pub fn records(&self) -> impl Iterator<Item = &TurnRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_format() {
        let entry = LogEntry::new(LogCategory::Warning, "The tribe is starving");
        assert_eq!(entry.render(), "warning|The tribe is starving");
    }

    #[test]
    fn test_archive_is_capped_and_newest_first() {
        let mut log = ActivityLog::new();
        for turn in 1..=25 {
            log.record(
                turn,
                vec![SourcedEntry::new(
                    "Town",
                    LogEntry::new(LogCategory::Info, format!("turn {turn}")),
                )],
            );
        }

        assert_eq!(log.len(), MAX_ARCHIVED_TURNS);
        assert_eq!(log.latest().unwrap().turn, 25);
        let turns: Vec<u32> = log.records().map(|r| r.turn).collect();
        assert_eq!(turns.first(), Some(&25));
        assert_eq!(turns.last(), Some(&6), "oldest turns dropped");
    }
}
