//! Intents and the structured command produced by the parser

use crate::core::error::{Result, ShellError};
use crate::core::types::PathExpr;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of recognized command categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Intent {
    CreateFile,
    CreateDir,
    DeleteEntry,
    RenameEntry,
    CopyEntry,
    MoveEntry,
    ChangeDir,
    GoBack,
    ListEntries,
    WhereAmI,
    ReadFile,
    EntrySize,
    ShowTree,
    /// Entries below the current folder whose name contains the argument
    SearchEntries,
    /// Lines of files below the current folder containing the argument
    GrepFiles,
    /// Primary argument is the text, secondary the file
    AppendFile,
    TouchFile,
    RecentFiles,
    ShowStats,
    LaunchUtility,
    Help,
    ShowHistory,
    ClearHistory,
    Exit,
    /// Nothing matched; the command still carries the raw text
    Unrecognized,
}

impl Intent {
    pub const ALL: [Intent; 25] = [
        Intent::CreateFile,
        Intent::CreateDir,
        Intent::DeleteEntry,
        Intent::RenameEntry,
        Intent::CopyEntry,
        Intent::MoveEntry,
        Intent::ChangeDir,
        Intent::GoBack,
        Intent::ListEntries,
        Intent::WhereAmI,
        Intent::ReadFile,
        Intent::EntrySize,
        Intent::ShowTree,
        Intent::SearchEntries,
        Intent::GrepFiles,
        Intent::AppendFile,
        Intent::TouchFile,
        Intent::RecentFiles,
        Intent::ShowStats,
        Intent::LaunchUtility,
        Intent::Help,
        Intent::ShowHistory,
        Intent::ClearHistory,
        Intent::Exit,
        Intent::Unrecognized,
    ];

    /// Number of path arguments a command with this intent carries
    pub fn arity(self) -> usize {
        match self {
            Intent::RenameEntry | Intent::CopyEntry | Intent::MoveEntry | Intent::AppendFile => 2,
            Intent::CreateFile
            | Intent::CreateDir
            | Intent::DeleteEntry
            | Intent::ChangeDir
            | Intent::ReadFile
            | Intent::EntrySize
            | Intent::SearchEntries
            | Intent::GrepFiles
            | Intent::TouchFile
            | Intent::LaunchUtility => 1,
            Intent::GoBack
            | Intent::ListEntries
            | Intent::WhereAmI
            | Intent::ShowTree
            | Intent::RecentFiles
            | Intent::ShowStats
            | Intent::Help
            | Intent::ShowHistory
            | Intent::ClearHistory
            | Intent::Exit
            | Intent::Unrecognized => 0,
        }
    }

    /// Whether executing this intent leaves a history entry
    ///
    /// Viewing the history is the only command that does not, so that
    /// looking at the audit trail does not change it.
    pub fn is_recorded(self) -> bool {
        self != Intent::ShowHistory
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Intent::CreateFile => "CREATE_FILE",
            Intent::CreateDir => "CREATE_DIR",
            Intent::DeleteEntry => "DELETE_ENTRY",
            Intent::RenameEntry => "RENAME_ENTRY",
            Intent::CopyEntry => "COPY_ENTRY",
            Intent::MoveEntry => "MOVE_ENTRY",
            Intent::ChangeDir => "CHANGE_DIR",
            Intent::GoBack => "GO_BACK",
            Intent::ListEntries => "LIST_ENTRIES",
            Intent::WhereAmI => "WHERE_AM_I",
            Intent::ReadFile => "READ_FILE",
            Intent::EntrySize => "ENTRY_SIZE",
            Intent::ShowTree => "SHOW_TREE",
            Intent::SearchEntries => "SEARCH_ENTRIES",
            Intent::GrepFiles => "GREP_FILES",
            Intent::AppendFile => "APPEND_FILE",
            Intent::TouchFile => "TOUCH_FILE",
            Intent::RecentFiles => "RECENT_FILES",
            Intent::ShowStats => "SHOW_STATS",
            Intent::LaunchUtility => "LAUNCH_UTILITY",
            Intent::Help => "HELP",
            Intent::ShowHistory => "SHOW_HISTORY",
            Intent::ClearHistory => "CLEAR_HISTORY",
            Intent::Exit => "EXIT",
            Intent::Unrecognized => "UNRECOGNIZED",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed, structurally valid command
///
/// Construction checks that the number of arguments matches the intent's
/// arity, so a `Command` that exists is well formed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Command {
    intent: Intent,
    primary_arg: Option<PathExpr>,
    secondary_arg: Option<PathExpr>,
    /// History count, tree depth or number of recent files
    limit: Option<usize>,
    /// Set only after the user confirms deleting a non-empty folder
    recursive: bool,
    raw_text: String,
}

impl Command {
    /// Build a command, rejecting argument lists that do not fit the intent
    pub fn build(
        intent: Intent,
        primary_arg: Option<PathExpr>,
        secondary_arg: Option<PathExpr>,
        raw_text: impl Into<String>,
    ) -> Result<Self> {
        let actual = match (&primary_arg, &secondary_arg) {
            (None, None) => 0,
            (Some(_), None) => 1,
            (Some(_), Some(_)) => 2,
            (None, Some(_)) => usize::MAX,
        };
        if actual != intent.arity() {
            return Err(ShellError::Arity {
                intent: intent.to_string(),
                expected: intent.arity(),
                actual: usize::from(primary_arg.is_some()) + usize::from(secondary_arg.is_some()),
            });
        }

        Ok(Self {
            intent,
            primary_arg,
            secondary_arg,
            limit: None,
            recursive: false,
            raw_text: raw_text.into(),
        })
    }

    /// A command for input no rule understood
    pub fn unrecognized(raw_text: impl Into<String>) -> Self {
        Self {
            intent: Intent::Unrecognized,
            primary_arg: None,
            secondary_arg: None,
            limit: None,
            recursive: false,
            raw_text: raw_text.into(),
        }
    }

    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    /// The same command, allowed to remove non-empty folders
    pub fn into_recursive(mut self) -> Self {
        self.recursive = true;
        self
    }

    pub fn intent(&self) -> Intent {
        self.intent
    }

    pub fn primary_arg(&self) -> Option<&PathExpr> {
        self.primary_arg.as_ref()
    }

    pub fn secondary_arg(&self) -> Option<&PathExpr> {
        self.secondary_arg.as_ref()
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    pub fn is_recursive(&self) -> bool {
        self.recursive
    }

    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_checks_arity() {
        assert!(Command::build(Intent::WhereAmI, None, None, "where am i").is_ok());
        assert!(Command::build(Intent::CreateFile, None, None, "create file").is_err());
        assert!(Command::build(
            Intent::RenameEntry,
            Some("a".into()),
            None,
            "rename a"
        )
        .is_err());
        assert!(Command::build(
            Intent::RenameEntry,
            Some("a".into()),
            Some("b".into()),
            "rename a to b"
        )
        .is_ok());
    }

    #[test]
    fn test_secondary_without_primary_rejected() {
        let result = Command::build(Intent::RenameEntry, None, Some("b".into()), "x");
        assert!(matches!(result, Err(ShellError::Arity { actual: 1, .. })));
    }

    #[test]
    fn test_unrecognized_keeps_raw_text() {
        let cmd = Command::unrecognized("blah blah");
        assert_eq!(cmd.intent(), Intent::Unrecognized);
        assert_eq!(cmd.raw_text(), "blah blah");
        assert!(cmd.primary_arg().is_none());
    }

    #[test]
    fn test_append_takes_text_and_file() {
        assert_eq!(Intent::AppendFile.arity(), 2);
        let cmd = Command::build(
            Intent::AppendFile,
            Some("buy milk".into()),
            Some("todo.txt".into()),
            "append \"buy milk\" to file todo.txt",
        )
        .unwrap();
        assert_eq!(cmd.primary_arg().unwrap().as_str(), "buy milk");
        assert_eq!(cmd.secondary_arg().unwrap().as_str(), "todo.txt");
    }

    #[test]
    fn test_intent_serialization() {
        let json = serde_json::to_string(&Intent::CreateFile).unwrap();
        assert_eq!(json, "\"CREATE_FILE\"");
        for intent in Intent::ALL {
            let json = serde_json::to_string(&intent).unwrap();
            assert_eq!(json, format!("\"{}\"", intent.as_str()));
        }
    }
}
