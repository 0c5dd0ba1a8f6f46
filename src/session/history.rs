//! Command history - the audit trail of everything the shell executed

use crate::command::intent::{Command, Intent};
use crate::command::outcome::Outcome;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One executed command and what came of it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub raw_text: String,
    pub command: Command,
    pub outcome: Outcome,
}

impl HistoryEntry {
    pub fn new(command: Command, outcome: Outcome) -> Self {
        Self {
            timestamp: Utc::now(),
            raw_text: command.raw_text().to_string(),
            command,
            outcome,
        }
    }

    /// Flatten for external storage and display
    pub fn to_record(&self) -> LogRecord {
        LogRecord {
            timestamp: self.timestamp,
            raw_text: self.raw_text.clone(),
            intent: self.command.intent(),
            outcome: self.outcome.label().to_string(),
            message: self.outcome.message().to_string(),
        }
    }
}

/// Flat form of a history entry, as written to the audit log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    pub timestamp: DateTime<Utc>,
    pub raw_text: String,
    pub intent: Intent,
    /// "SUCCESS" or a failure kind
    pub outcome: String,
    pub message: String,
}

impl LogRecord {
    /// Outcome label for a folder delete the user declined to confirm
    pub const CANCELLED: &'static str = "CANCELLED";

    /// Record of a pending command that was dropped instead of confirmed
    ///
    /// The command never ran, so it has no history entry; this record is
    /// only written to the audit log.
    pub fn cancelled(command: &Command, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            raw_text: command.raw_text().to_string(),
            intent: command.intent(),
            outcome: Self::CANCELLED.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} \"{}\" -> {}: {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.raw_text,
            self.outcome,
            self.message
        )
    }
}
