//! Pieces, exercises, and goals logged during a session.

use serde::{Deserialize, Serialize};

/// Whether a log entry is repertoire or technique work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogEntryKind {
    Piece,
    Exercise,
}

/// Caller-supplied details of a piece or exercise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeLog {
    pub title: String,
    #[serde(default)]
    pub minutes_spent: u32,
    #[serde(default)]
    pub notes: Option<String>,
}

/// A logged piece or exercise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub kind: LogEntryKind,
    pub title: String,
    pub minutes_spent: u32,
    pub notes: Option<String>,
}

impl LogEntry {
    pub(super) fn new(kind: LogEntryKind, log: PracticeLog) -> Self {
        Self {
            kind,
            title: log.title.trim().to_owned(),
            minutes_spent: log.minutes_spent,
            notes: log.notes.filter(|notes| !notes.trim().is_empty()),
        }
    }
}

/// A goal set for the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeGoal {
    pub description: String,
    pub completed: bool,
}
