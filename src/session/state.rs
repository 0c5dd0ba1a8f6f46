//! Session state - current directory and bounded command history

use crate::command::outcome::{EntryKind, ListingEntry};
use crate::command::resolver::resolve;
use crate::core::error::{ContainmentError, NavigationError};
use crate::core::types::{AbsolutePath, PathExpr, RelativePath, SandboxRoot};
use crate::session::history::HistoryEntry;
use std::collections::VecDeque;
use std::fs;
use std::io;
use std::path::Path;

/// Default number of history entries kept
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

/// The one mutable piece of the core
///
/// `root` joined with `cwd` is always an existing directory inside the
/// sandbox: `cwd` is only ever replaced by the result of `resolve`.
#[derive(Debug)]
pub struct SessionState {
    root: SandboxRoot,
    cwd: RelativePath,
    history: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl SessionState {
    pub fn new(root: SandboxRoot, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            root,
            cwd: RelativePath::root(),
            history: VecDeque::with_capacity(capacity.min(DEFAULT_HISTORY_CAPACITY)),
            capacity,
        }
    }

    pub fn root(&self) -> &SandboxRoot {
        &self.root
    }

    pub fn cwd(&self) -> &RelativePath {
        &self.cwd
    }

    pub fn current_path(&self) -> AbsolutePath {
        self.root.join(&self.cwd)
    }

    /// Current location relative to the sandbox ("/" at the root)
    pub fn display_cwd(&self) -> String {
        self.cwd.to_string()
    }

    /// Resolve a user path against the current directory
    pub fn resolve(&self, expr: &PathExpr) -> Result<AbsolutePath, ContainmentError> {
        resolve(&self.root, &self.cwd, expr)
    }

    /// Move into an existing directory
    pub fn change_dir(&mut self, target: &PathExpr) -> Result<(), NavigationError> {
        let path = self.resolve(target)?;
        match fs::metadata(path.as_path()) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => return Err(NavigationError::NotADirectory(target.to_string())),
            Err(_) => return Err(NavigationError::NotFound(target.to_string())),
        }
        tracing::debug!("cwd {} -> {}", self.cwd, path.relative());
        self.cwd = path.relative().clone();
        Ok(())
    }

    /// Move to the parent directory
    pub fn go_back(&mut self) -> Result<(), NavigationError> {
        if self.cwd.is_root() {
            return Err(NavigationError::AtRoot);
        }
        self.change_dir(&PathExpr::new(".."))
    }

    /// Append to history, evicting the oldest entry when full
    pub fn record(&mut self, entry: HistoryEntry) {
        if self.history.len() >= self.capacity {
            self.history.pop_front();
        }
        self.history.push_back(entry);
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// All retained entries, oldest first
    pub fn history(&self) -> &VecDeque<HistoryEntry> {
        &self.history
    }

    /// The last `n` entries, oldest first
    pub fn recent(&self, n: usize) -> Vec<&HistoryEntry> {
        let skip = self.history.len().saturating_sub(n);
        self.history.iter().skip(skip).collect()
    }

    pub fn history_capacity(&self) -> usize {
        self.capacity
    }

    /// Direct children of the current directory, sorted by name
    pub fn list_entries(&self) -> io::Result<Vec<ListingEntry>> {
        list_dir(self.current_path().as_path())
    }
}

/// Direct children of `dir` in lexicographic order
///
/// Symlinks are reported as links and never followed.
pub fn list_dir(dir: &Path) -> io::Result<Vec<ListingEntry>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        let kind = if file_type.is_symlink() {
            EntryKind::Link
        } else if file_type.is_dir() {
            EntryKind::Directory
        } else {
            EntryKind::File
        };
        entries.push(ListingEntry {
            name: entry.file_name().to_string_lossy().into_owned(),
            kind,
        });
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::intent::Command;
    use crate::command::outcome::Outcome;

    fn session() -> (tempfile::TempDir, SessionState) {
        let tmp = tempfile::tempdir().unwrap();
        let root = SandboxRoot::open(tmp.path()).unwrap();
        (tmp, SessionState::new(root, 3))
    }

    fn entry(text: &str) -> HistoryEntry {
        HistoryEntry::new(Command::unrecognized(text), Outcome::success("ok"))
    }

    #[test]
    fn test_starts_at_root() {
        let (_tmp, state) = session();
        assert!(state.cwd().is_root());
        assert_eq!(state.display_cwd(), "/");
        assert_eq!(state.current_path().as_path(), state.root().path());
    }

    #[test]
    fn test_change_dir_and_back() {
        let (_tmp, mut state) = session();
        fs::create_dir_all(state.root().path().join("docs/old")).unwrap();

        state.change_dir(&"docs".into()).unwrap();
        assert_eq!(state.display_cwd(), "/docs");
        state.change_dir(&"old".into()).unwrap();
        assert_eq!(state.display_cwd(), "/docs/old");

        state.go_back().unwrap();
        state.go_back().unwrap();
        assert!(state.cwd().is_root());
        assert_eq!(state.go_back(), Err(NavigationError::AtRoot));
    }

    #[test]
    fn test_change_dir_requires_existing_directory() {
        let (_tmp, mut state) = session();
        fs::write(state.root().path().join("file.txt"), b"").unwrap();

        assert_eq!(
            state.change_dir(&"missing".into()),
            Err(NavigationError::NotFound("missing".into()))
        );
        assert_eq!(
            state.change_dir(&"file.txt".into()),
            Err(NavigationError::NotADirectory("file.txt".into()))
        );
        assert!(state.cwd().is_root());
    }

    #[test]
    fn test_change_dir_escape_leaves_cwd_alone() {
        let (_tmp, mut state) = session();
        fs::create_dir(state.root().path().join("a")).unwrap();
        state.change_dir(&"a".into()).unwrap();

        let result = state.change_dir(&"../../etc".into());
        assert!(matches!(
            result,
            Err(NavigationError::Containment(ContainmentError::EscapesRoot(_)))
        ));
        assert_eq!(state.display_cwd(), "/a");
    }

    #[test]
    fn test_history_evicts_oldest() {
        let (_tmp, mut state) = session();
        for text in ["one", "two", "three", "four"] {
            state.record(entry(text));
        }
        let texts: Vec<&str> = state.history().iter().map(|e| e.raw_text.as_str()).collect();
        assert_eq!(texts, vec!["two", "three", "four"]);

        let recent: Vec<&str> = state.recent(2).iter().map(|e| e.raw_text.as_str()).collect();
        assert_eq!(recent, vec!["three", "four"]);
        assert_eq!(state.recent(10).len(), 3);

        state.clear_history();
        assert!(state.history().is_empty());
    }

    #[test]
    fn test_list_entries_sorted_with_markers() {
        let (_tmp, state) = session();
        let root = state.root().path();
        fs::write(root.join("zeta.txt"), b"").unwrap();
        fs::create_dir(root.join("alpha")).unwrap();
        fs::write(root.join("beta.md"), b"").unwrap();

        let entries = state.list_entries().unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "beta.md", "zeta.txt"]);
        assert_eq!(entries[0].kind, EntryKind::Directory);
        assert_eq!(entries[1].kind, EntryKind::File);
    }
}
