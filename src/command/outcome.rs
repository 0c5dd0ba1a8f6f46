//! Structured result of executing one command

use crate::session::history::LogRecord;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a command did not take effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureKind {
    /// The path would resolve outside the sandbox root
    SandboxViolation,
    NotFound,
    AlreadyExists,
    /// "go back" while already at the sandbox root
    AtRoot,
    /// Utility outside the allow-list
    NotAllowed,
    /// No rule matched the utterance
    ParseFailure,
    /// The filesystem refused for some other reason
    IoFailure,
    NotADirectory,
    NotAFile,
    /// Folder delete needs confirmation first
    DirectoryNotEmpty,
    /// The current folder (or one of its parents), or a folder copied into itself
    InvalidTarget,
}

impl FailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::SandboxViolation => "SANDBOX_VIOLATION",
            FailureKind::NotFound => "NOT_FOUND",
            FailureKind::AlreadyExists => "ALREADY_EXISTS",
            FailureKind::AtRoot => "AT_ROOT",
            FailureKind::NotAllowed => "NOT_ALLOWED",
            FailureKind::ParseFailure => "PARSE_FAILURE",
            FailureKind::IoFailure => "IO_FAILURE",
            FailureKind::NotADirectory => "NOT_A_DIRECTORY",
            FailureKind::NotAFile => "NOT_A_FILE",
            FailureKind::DirectoryNotEmpty => "DIRECTORY_NOT_EMPTY",
            FailureKind::InvalidTarget => "INVALID_TARGET",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
    Link,
}

impl EntryKind {
    pub fn marker(self) -> &'static str {
        match self {
            EntryKind::File => "[file]",
            EntryKind::Directory => "[dir]",
            EntryKind::Link => "[link]",
        }
    }
}

/// One direct child of a directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingEntry {
    pub name: String,
    pub kind: EntryKind,
}

impl fmt::Display for ListingEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind.marker(), self.name)
    }
}

/// Counts of the direct children of one folder
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderStats {
    pub files: usize,
    pub folders: usize,
    pub links: usize,
}

impl FolderStats {
    pub fn tally(entries: &[ListingEntry]) -> Self {
        let mut stats = Self::default();
        for entry in entries {
            match entry.kind {
                EntryKind::File => stats.files += 1,
                EntryKind::Directory => stats.folders += 1,
                EntryKind::Link => stats.links += 1,
            }
        }
        stats
    }

    pub fn total(&self) -> usize {
        self.files + self.folders + self.links
    }
}

/// Extra payload attached to a successful outcome
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum OutcomeData {
    Listing(Vec<ListingEntry>),
    /// File contents or a rendered tree
    Lines(Vec<String>),
    History(Vec<LogRecord>),
    /// Sandbox-relative location
    Location(String),
    /// Size in bytes
    Size(u64),
    Stats(FolderStats),
}

/// The result of one executed command, never mutated after creation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Success {
        message: String,
        data: Option<OutcomeData>,
    },
    Failure {
        kind: FailureKind,
        message: String,
    },
}

impl Outcome {
    pub fn success(message: impl Into<String>) -> Self {
        Outcome::Success {
            message: message.into(),
            data: None,
        }
    }

    pub fn success_with(message: impl Into<String>, data: OutcomeData) -> Self {
        Outcome::Success {
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn failure(kind: FailureKind, message: impl Into<String>) -> Self {
        Outcome::Failure {
            kind,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }

    pub fn message(&self) -> &str {
        match self {
            Outcome::Success { message, .. } | Outcome::Failure { message, .. } => message,
        }
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Outcome::Failure { kind, .. } => Some(*kind),
            Outcome::Success { .. } => None,
        }
    }

    pub fn data(&self) -> Option<&OutcomeData> {
        match self {
            Outcome::Success { data, .. } => data.as_ref(),
            Outcome::Failure { .. } => None,
        }
    }

    /// "SUCCESS" or the failure kind, for flat log records
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Success { .. } => "SUCCESS",
            Outcome::Failure { kind, .. } => kind.as_str(),
        }
    }
}
