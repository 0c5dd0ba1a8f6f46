//! Command execution - turns a parsed command into filesystem effects
//!
//! Every user-triggerable problem becomes an `Outcome::Failure`; nothing in
//! here returns an error or panics on user input. All paths pass through
//! the resolver before any filesystem call sees them.

use crate::command::intent::{Command, Intent};
use crate::command::launcher::{AllowList, Launcher, ProcessLauncher};
use crate::command::outcome::{EntryKind, FailureKind, FolderStats, Outcome, OutcomeData};
use crate::command::resolver::resolve;
use crate::core::config::ShellConfig;
use crate::core::error::{ContainmentError, NavigationError};
use crate::core::types::{AbsolutePath, PathExpr};
use crate::session::history::HistoryEntry;
use crate::session::state::{list_dir, SessionState};
use chrono::{DateTime, Local};
use std::fs::{self, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Entries shown by "show history" when no count is given
pub const DEFAULT_HISTORY_SHOWN: usize = 10;

/// Depth of "tree" when no depth is given
pub const DEFAULT_TREE_DEPTH: usize = 2;

/// Files shown by "recent files" when no count is given
pub const DEFAULT_RECENT_FILES: usize = 10;

/// Either branch carries the final outcome; `Err` short-circuits with `?`
type Step = std::result::Result<Outcome, Outcome>;

/// Executes commands against one session
pub struct CommandExecutor {
    allow: AllowList,
    launcher: Box<dyn Launcher>,
    read_max_lines: usize,
    tree_max_depth: usize,
    search_max_results: usize,
}

impl CommandExecutor {
    pub fn new(allow: AllowList, launcher: Box<dyn Launcher>) -> Self {
        let defaults = ShellConfig::default();
        Self {
            allow,
            launcher,
            read_max_lines: defaults.read_max_lines,
            tree_max_depth: defaults.tree_max_depth,
            search_max_results: defaults.search_max_results,
        }
    }

    /// Executor that launches real processes, limits taken from `config`
    pub fn from_config(config: &ShellConfig) -> Self {
        Self {
            allow: AllowList::from_config(&config.utilities),
            launcher: Box::new(ProcessLauncher),
            read_max_lines: config.read_max_lines.max(1),
            tree_max_depth: config.tree_max_depth.max(1),
            search_max_results: config.search_max_results.max(1),
        }
    }

    pub fn with_limits(mut self, read_max_lines: usize, tree_max_depth: usize) -> Self {
        self.read_max_lines = read_max_lines.max(1);
        self.tree_max_depth = tree_max_depth.max(1);
        self
    }

    pub fn with_search_cap(mut self, search_max_results: usize) -> Self {
        self.search_max_results = search_max_results.max(1);
        self
    }

    pub fn allow_list(&self) -> &AllowList {
        &self.allow
    }

    /// Execute one command and record it in the session history
    ///
    /// Every intent except `ShowHistory` is recorded exactly once, whether
    /// it succeeded or not.
    pub fn execute(&self, cmd: &Command, state: &mut SessionState) -> Outcome {
        let outcome = match self.dispatch(cmd, state) {
            Ok(outcome) | Err(outcome) => outcome,
        };

        match outcome.failure_kind() {
            Some(FailureKind::SandboxViolation) => tracing::warn!(
                "Rejected {} '{}': {}",
                cmd.intent(),
                cmd.raw_text(),
                outcome.message()
            ),
            _ => tracing::info!("{} -> {}", cmd.intent(), outcome.label()),
        }

        if cmd.intent().is_recorded() {
            state.record(HistoryEntry::new(cmd.clone(), outcome.clone()));
        }
        outcome
    }

    fn dispatch(&self, cmd: &Command, state: &mut SessionState) -> Step {
        match cmd.intent() {
            Intent::CreateFile => create_file(state, primary(cmd)?),
            Intent::CreateDir => create_dir(state, primary(cmd)?),
            Intent::DeleteEntry => delete_entry(state, primary(cmd)?, cmd.is_recursive()),
            Intent::RenameEntry => rename_entry(state, primary(cmd)?, secondary(cmd)?),
            Intent::CopyEntry => copy_entry(state, primary(cmd)?, secondary(cmd)?),
            Intent::MoveEntry => move_entry(state, primary(cmd)?, secondary(cmd)?),
            Intent::ChangeDir => {
                state.change_dir(primary(cmd)?).map_err(navigation_failure)?;
                Ok(Outcome::success(format!("Now in {}", state.display_cwd())))
            }
            Intent::GoBack => {
                state.go_back().map_err(navigation_failure)?;
                Ok(Outcome::success(format!("Back in {}", state.display_cwd())))
            }
            Intent::ListEntries => list_entries(state),
            Intent::WhereAmI => {
                let location = state.display_cwd();
                Ok(Outcome::success_with(
                    format!("You are in {}", location),
                    OutcomeData::Location(location),
                ))
            }
            Intent::ReadFile => self.read_file(state, primary(cmd)?),
            Intent::EntrySize => entry_size(state, primary(cmd)?),
            Intent::ShowTree => self.show_tree(state, cmd.limit()),
            Intent::SearchEntries => self.search_entries(state, primary(cmd)?),
            Intent::GrepFiles => self.grep_files(state, primary(cmd)?),
            Intent::AppendFile => append_file(state, primary(cmd)?, secondary(cmd)?),
            Intent::TouchFile => touch_file(state, primary(cmd)?),
            Intent::RecentFiles => recent_files(state, cmd.limit()),
            Intent::ShowStats => show_stats(state),
            Intent::LaunchUtility => self.launch(state, primary(cmd)?),
            Intent::Help => Ok(Outcome::success(self.help_text())),
            Intent::ShowHistory => show_history(state, cmd.limit()),
            Intent::ClearHistory => {
                state.clear_history();
                Ok(Outcome::success("History cleared"))
            }
            Intent::Exit => Ok(Outcome::success("Goodbye")),
            Intent::Unrecognized => Err(Outcome::failure(
                FailureKind::ParseFailure,
                format!(
                    "Sorry, I did not understand \"{}\". Say \"help\" to hear what I can do.",
                    cmd.raw_text()
                ),
            )),
        }
    }

    fn read_file(&self, state: &SessionState, expr: &PathExpr) -> Step {
        let path = contained(state.resolve(expr))?;
        let meta = fs::metadata(path.as_path()).map_err(|_| not_found(&path))?;
        if meta.is_dir() {
            return Err(Outcome::failure(
                FailureKind::NotAFile,
                format!("{} is a folder, not a file", path),
            ));
        }

        let file = fs::File::open(path.as_path()).map_err(|e| io_failure("read", &path, e))?;
        let mut lines = Vec::new();
        let mut truncated = false;
        for line in BufReader::new(file).split(b'\n') {
            let line = line.map_err(|e| io_failure("read", &path, e))?;
            if lines.len() == self.read_max_lines {
                truncated = true;
                break;
            }
            let text = String::from_utf8_lossy(&line);
            lines.push(text.trim_end_matches('\r').to_string());
        }

        let message = if lines.is_empty() {
            format!("{} is empty", path)
        } else if truncated {
            format!("First {} lines of {}", lines.len(), path)
        } else {
            format!("{} ({} lines)", path, lines.len())
        };
        Ok(Outcome::success_with(message, OutcomeData::Lines(lines)))
    }

    fn show_tree(&self, state: &SessionState, depth: Option<usize>) -> Step {
        let depth = depth
            .unwrap_or(DEFAULT_TREE_DEPTH)
            .clamp(1, self.tree_max_depth);
        let here = state.current_path();

        let mut lines = vec![here.to_string()];
        render_tree(here.as_path(), "", depth, &mut lines)
            .map_err(|e| io_failure("list", &here, e))?;

        Ok(Outcome::success_with(
            format!("Tree of {} ({} levels)", here, depth),
            OutcomeData::Lines(lines),
        ))
    }

    fn search_entries(&self, state: &SessionState, query: &PathExpr) -> Step {
        let needle = search_term(query)?;
        let here = state.current_path();
        let mut found = Vec::new();
        walk(here.as_path(), &here.to_string(), &mut |entry| {
            if entry.name.to_lowercase().contains(&needle) {
                found.push(entry.shown.clone());
            }
            found.len() < self.search_max_results
        })
        .map_err(|e| io_failure("search", &here, e))?;

        let message = if found.is_empty() {
            format!("Nothing below {} matches \"{}\"", here, query)
        } else {
            format!("Found {} matching \"{}\"", plural(found.len(), "entry", "entries"), query)
        };
        Ok(Outcome::success_with(message, OutcomeData::Lines(found)))
    }

    fn grep_files(&self, state: &SessionState, query: &PathExpr) -> Step {
        let needle = search_term(query)?;
        let here = state.current_path();
        let mut hits = Vec::new();
        walk(here.as_path(), &here.to_string(), &mut |entry| {
            if entry.kind == EntryKind::File {
                let room = self.search_max_results - hits.len();
                match matching_lines(&entry.path, &needle, room) {
                    Ok(lines) => hits.extend(
                        lines
                            .into_iter()
                            .map(|(n, line)| format!("{}:{}: {}", entry.shown, n, line)),
                    ),
                    Err(e) => tracing::debug!("Skipping {} while searching: {}", entry.shown, e),
                }
            }
            hits.len() < self.search_max_results
        })
        .map_err(|e| io_failure("search", &here, e))?;

        let message = if hits.is_empty() {
            format!("No file below {} contains \"{}\"", here, query)
        } else {
            format!("Found {} containing \"{}\"", plural(hits.len(), "line", "lines"), query)
        };
        Ok(Outcome::success_with(message, OutcomeData::Lines(hits)))
    }

    fn launch(&self, state: &SessionState, name: &PathExpr) -> Step {
        let Some(utility) = self.allow.lookup(name.as_str()) else {
            return Err(Outcome::failure(
                FailureKind::NotAllowed,
                format!(
                    "'{}' is not an allowed utility. Allowed: {}",
                    name,
                    self.allow.names().join(", ")
                ),
            ));
        };

        let here = state.current_path();
        self.launcher
            .launch(utility, here.as_path())
            .map_err(|e| {
                Outcome::failure(
                    FailureKind::IoFailure,
                    format!("Could not start {}: {}", name, e.kind()),
                )
            })?;
        Ok(Outcome::success(format!("Opened {}", name)))
    }

    fn help_text(&self) -> String {
        format!(
            "You can say: create file NAME, create folder NAME, touch NAME, delete NAME, \
             rename OLD to NEW, copy SRC to DST, move SRC to DST, go to FOLDER, go back, \
             list files, where am I, read NAME, append \"TEXT\" to file NAME, size of NAME, \
             tree, stats, recent files, search NAME, grep \"TEXT\", show history, \
             clear history, open UTILITY, help, exit. Utilities: {}.",
            self.allow.names().join(", ")
        )
    }
}

fn primary(cmd: &Command) -> std::result::Result<&PathExpr, Outcome> {
    cmd.primary_arg().ok_or_else(|| malformed(cmd))
}

fn secondary(cmd: &Command) -> std::result::Result<&PathExpr, Outcome> {
    cmd.secondary_arg().ok_or_else(|| malformed(cmd))
}

/// A command missing an argument its intent requires
///
/// `Command::build` makes this unreachable; tests catch it loudly.
fn malformed(cmd: &Command) -> Outcome {
    debug_assert!(false, "{} reached the executor without its arguments", cmd.intent());
    tracing::error!("Malformed {} command: '{}'", cmd.intent(), cmd.raw_text());
    Outcome::failure(
        FailureKind::ParseFailure,
        format!("Sorry, \"{}\" is missing a name", cmd.raw_text()),
    )
}

fn contained<T>(result: std::result::Result<T, ContainmentError>) -> std::result::Result<T, Outcome> {
    result.map_err(|e| Outcome::failure(FailureKind::SandboxViolation, format!("Not allowed: {}", e)))
}

fn navigation_failure(err: NavigationError) -> Outcome {
    let kind = match &err {
        NavigationError::Containment(_) => FailureKind::SandboxViolation,
        NavigationError::NotFound(_) => FailureKind::NotFound,
        NavigationError::NotADirectory(_) => FailureKind::NotADirectory,
        NavigationError::AtRoot => FailureKind::AtRoot,
    };
    match err {
        NavigationError::Containment(e) => {
            Outcome::failure(kind, format!("Not allowed: {}", e))
        }
        NavigationError::AtRoot => Outcome::failure(kind, "Already at the top of the sandbox"),
        other => Outcome::failure(kind, capitalize(&other.to_string())),
    }
}

fn not_found(path: &AbsolutePath) -> Outcome {
    Outcome::failure(FailureKind::NotFound, format!("There is nothing at {}", path))
}

fn already_exists(path: &AbsolutePath) -> Outcome {
    Outcome::failure(FailureKind::AlreadyExists, format!("{} already exists", path))
}

/// Map an I/O error without exposing host paths
fn io_failure(action: &str, path: &AbsolutePath, err: io::Error) -> Outcome {
    match err.kind() {
        io::ErrorKind::NotFound => not_found(path),
        io::ErrorKind::AlreadyExists => already_exists(path),
        kind => {
            tracing::debug!("I/O failure on {}: {}", path, err);
            Outcome::failure(
                FailureKind::IoFailure,
                format!("Could not {} {}: {}", action, path, kind),
            )
        }
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn exists(path: &AbsolutePath) -> bool {
    fs::symlink_metadata(path.as_path()).is_ok()
}

/// Where an entry really lives: links above it are followed, the entry itself is not
fn real_location(path: &AbsolutePath) -> io::Result<PathBuf> {
    match path.as_path().parent() {
        Some(parent) if !path.is_root() => Ok(fs::canonicalize(parent)?.join(path.name())),
        _ => fs::canonicalize(path.as_path()),
    }
}

/// Refuse operations that would pull the floor out from under the session
///
/// Compares both the sandbox-relative paths and the real locations, so a
/// current folder reached through a link is protected too.
fn ensure_not_current(state: &SessionState, path: &AbsolutePath) -> std::result::Result<(), Outcome> {
    let holds_current = state.cwd().starts_with(path.relative())
        || match (
            fs::canonicalize(state.current_path().as_path()),
            real_location(path),
        ) {
            (Ok(here), Ok(there)) => here.starts_with(there),
            _ => false,
        };
    if holds_current {
        return Err(Outcome::failure(
            FailureKind::InvalidTarget,
            format!("{} is the current folder or contains it", path),
        ));
    }
    Ok(())
}

/// Refuse to put a folder inside itself, by name or through a link
fn ensure_outside(
    verb: &str,
    src: &AbsolutePath,
    tree: &Path,
    target: &AbsolutePath,
) -> std::result::Result<(), Outcome> {
    let lands_inside = target.relative().starts_with(src.relative())
        || target
            .as_path()
            .parent()
            .and_then(|parent| fs::canonicalize(parent).ok())
            .is_some_and(|parent| parent.starts_with(tree));
    if lands_inside {
        return Err(Outcome::failure(
            FailureKind::InvalidTarget,
            format!("Cannot {} {} into itself", verb, src),
        ));
    }
    Ok(())
}

/// The folder a new entry goes into must already exist
fn ensure_parent_dir(state: &SessionState, path: &AbsolutePath) -> std::result::Result<(), Outcome> {
    let Some(parent) = path.relative().parent() else {
        return Ok(());
    };
    let parent = state.root().join(&parent);
    match fs::metadata(parent.as_path()) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(Outcome::failure(
            FailureKind::NotADirectory,
            format!("{} is not a folder", parent),
        )),
        Err(_) => Err(Outcome::failure(
            FailureKind::NotFound,
            format!("There is no folder {}", parent),
        )),
    }
}

/// Where a copy or move lands: inside `dst` when it is an existing folder
fn landing_spot(
    state: &SessionState,
    src: &AbsolutePath,
    dst: AbsolutePath,
) -> std::result::Result<AbsolutePath, Outcome> {
    if dst.as_path().is_dir() {
        let name = PathExpr::new(src.name());
        contained(resolve(state.root(), dst.relative(), &name))
    } else {
        Ok(dst)
    }
}

fn create_file(state: &SessionState, expr: &PathExpr) -> Step {
    let path = contained(state.resolve(expr))?;
    if exists(&path) {
        return Err(already_exists(&path));
    }
    ensure_parent_dir(state, &path)?;
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path.as_path())
        .map_err(|e| io_failure("create", &path, e))?;
    Ok(Outcome::success(format!("Created file {}", path)))
}

fn create_dir(state: &SessionState, expr: &PathExpr) -> Step {
    let path = contained(state.resolve(expr))?;
    if exists(&path) {
        return Err(already_exists(&path));
    }
    fs::create_dir_all(path.as_path()).map_err(|e| io_failure("create", &path, e))?;
    Ok(Outcome::success(format!("Created folder {}", path)))
}

fn delete_entry(state: &SessionState, expr: &PathExpr, recursive: bool) -> Step {
    let path = contained(state.resolve(expr))?;
    if path.is_root() {
        return Err(Outcome::failure(
            FailureKind::SandboxViolation,
            "The sandbox itself cannot be deleted",
        ));
    }
    ensure_not_current(state, &path)?;

    let meta = fs::symlink_metadata(path.as_path()).map_err(|_| not_found(&path))?;
    let file_type = meta.file_type();
    if file_type.is_dir() {
        let has_children = fs::read_dir(path.as_path())
            .map_err(|e| io_failure("delete", &path, e))?
            .next()
            .is_some();
        if has_children && !recursive {
            return Err(Outcome::failure(
                FailureKind::DirectoryNotEmpty,
                format!(
                    "{} is not empty. Say yes to delete it and everything in it",
                    path
                ),
            ));
        }
        fs::remove_dir_all(path.as_path()).map_err(|e| io_failure("delete", &path, e))?;
        Ok(Outcome::success(format!("Deleted folder {}", path)))
    } else {
        remove_link_or_file(path.as_path(), file_type.is_symlink())
            .map_err(|e| io_failure("delete", &path, e))?;
        Ok(Outcome::success(format!("Deleted {}", path)))
    }
}

/// Remove a file, or the link itself (never its target)
fn remove_link_or_file(path: &Path, is_link: bool) -> io::Result<()> {
    match fs::remove_file(path) {
        // Windows directory symlinks need remove_dir
        Err(e) if is_link && cfg!(windows) => fs::remove_dir(path).map_err(|_| e),
        other => other,
    }
}

fn rename_entry(state: &SessionState, from: &PathExpr, to: &PathExpr) -> Step {
    let src = contained(state.resolve(from))?;
    ensure_not_current(state, &src)?;

    // "rename a/b.txt to c.txt" keeps the file in a/
    let dst = match src.relative().parent() {
        Some(parent) if to.is_bare_name() => contained(resolve(state.root(), &parent, to))?,
        _ => contained(state.resolve(to))?,
    };

    if !exists(&src) {
        return Err(not_found(&src));
    }
    if exists(&dst) {
        return Err(already_exists(&dst));
    }
    ensure_parent_dir(state, &dst)?;
    let real = real_location(&src).map_err(|e| io_failure("rename", &src, e))?;
    ensure_outside("rename", &src, &real, &dst)?;
    fs::rename(src.as_path(), dst.as_path()).map_err(|e| io_failure("rename", &src, e))?;
    Ok(Outcome::success(format!("Renamed {} to {}", src, dst)))
}

fn copy_entry(state: &SessionState, from: &PathExpr, to: &PathExpr) -> Step {
    let src = contained(state.resolve(from))?;
    let dst = contained(state.resolve(to))?;

    let meta = fs::metadata(src.as_path()).map_err(|_| not_found(&src))?;
    let target = landing_spot(state, &src, dst)?;
    if exists(&target) {
        return Err(already_exists(&target));
    }
    ensure_parent_dir(state, &target)?;

    if meta.is_dir() {
        // A copy reads through links, so the whole real tree is off limits
        let tree = fs::canonicalize(src.as_path()).map_err(|e| io_failure("copy", &src, e))?;
        ensure_outside("copy", &src, &tree, &target)?;
        copy_tree(src.as_path(), target.as_path()).map_err(|e| io_failure("copy", &src, e))?;
    } else {
        fs::copy(src.as_path(), target.as_path()).map_err(|e| io_failure("copy", &src, e))?;
    }
    Ok(Outcome::success(format!("Copied {} to {}", src, target)))
}

/// Recursive copy that skips symlinks instead of following them
///
/// A copy that fails part way removes what it had created.
fn copy_tree(from: &Path, to: &Path) -> io::Result<()> {
    fs::create_dir(to)?;
    copy_children(from, to).map_err(|e| {
        if let Err(cleanup) = fs::remove_dir_all(to) {
            tracing::warn!("Could not remove partial copy: {}", cleanup);
        }
        e
    })
}

fn copy_children(from: &Path, to: &Path) -> io::Result<()> {
    for entry in fs::read_dir(from)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        let dest = to.join(entry.file_name());
        if file_type.is_symlink() {
            tracing::debug!("Skipping link {:?} while copying", entry.file_name());
        } else if file_type.is_dir() {
            fs::create_dir(&dest)?;
            copy_children(&entry.path(), &dest)?;
        } else {
            fs::copy(entry.path(), &dest)?;
        }
    }
    Ok(())
}

fn move_entry(state: &SessionState, from: &PathExpr, to: &PathExpr) -> Step {
    let src = contained(state.resolve(from))?;
    let dst = contained(state.resolve(to))?;
    ensure_not_current(state, &src)?;

    if !exists(&src) {
        return Err(not_found(&src));
    }
    let target = landing_spot(state, &src, dst)?;
    let real = real_location(&src).map_err(|e| io_failure("move", &src, e))?;
    ensure_outside("move", &src, &real, &target)?;
    if exists(&target) {
        return Err(already_exists(&target));
    }
    ensure_parent_dir(state, &target)?;
    fs::rename(src.as_path(), target.as_path()).map_err(|e| io_failure("move", &src, e))?;
    Ok(Outcome::success(format!("Moved {} to {}", src, target)))
}

fn list_entries(state: &SessionState) -> Step {
    let here = state.current_path();
    let entries = state
        .list_entries()
        .map_err(|e| io_failure("list", &here, e))?;

    let message = if entries.is_empty() {
        format!("{} is empty", here)
    } else {
        let shown: Vec<String> = entries.iter().map(ToString::to_string).collect();
        format!("{} contains: {}", here, shown.join(", "))
    };
    Ok(Outcome::success_with(message, OutcomeData::Listing(entries)))
}

fn entry_size(state: &SessionState, expr: &PathExpr) -> Step {
    let path = contained(state.resolve(expr))?;
    if !exists(&path) {
        return Err(not_found(&path));
    }
    let bytes = disk_usage(path.as_path()).map_err(|e| io_failure("measure", &path, e))?;
    Ok(Outcome::success_with(
        format!("{} is {}", path, format_size(bytes)),
        OutcomeData::Size(bytes),
    ))
}

/// Total bytes below `path`; links count as themselves
fn disk_usage(path: &Path) -> io::Result<u64> {
    let meta = fs::symlink_metadata(path)?;
    if !meta.is_dir() {
        return Ok(meta.len());
    }
    let mut total = 0;
    for entry in fs::read_dir(path)? {
        total += disk_usage(&entry?.path())?;
    }
    Ok(total)
}

/// Human readable size, 1024-based
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}

fn render_tree(dir: &Path, prefix: &str, depth: usize, lines: &mut Vec<String>) -> io::Result<()> {
    if depth == 0 {
        return Ok(());
    }
    let entries = list_dir(dir)?;
    let count = entries.len();
    for (i, entry) in entries.into_iter().enumerate() {
        let last = i + 1 == count;
        let branch = if last { "└── " } else { "├── " };
        match entry.kind {
            EntryKind::Directory => {
                lines.push(format!("{}{}{}/", prefix, branch, entry.name));
                let child_prefix = format!("{}{}", prefix, if last { "    " } else { "│   " });
                render_tree(&dir.join(&entry.name), &child_prefix, depth - 1, lines)?;
            }
            EntryKind::Link => lines.push(format!("{}{}{} (link)", prefix, branch, entry.name)),
            EntryKind::File => lines.push(format!("{}{}{}", prefix, branch, entry.name)),
        }
    }
    Ok(())
}

fn show_history(state: &SessionState, count: Option<usize>) -> Step {
    let records: Vec<_> = state
        .recent(count.filter(|&n| n > 0).unwrap_or(DEFAULT_HISTORY_SHOWN))
        .into_iter()
        .map(HistoryEntry::to_record)
        .collect();

    let message = if records.is_empty() {
        "No commands yet".to_string()
    } else {
        let shown: Vec<String> = records.iter().map(|r| r.raw_text.clone()).collect();
        format!("Last {} commands: {}", records.len(), shown.join("; "))
    };
    Ok(Outcome::success_with(message, OutcomeData::History(records)))
}

fn append_file(state: &SessionState, text: &PathExpr, expr: &PathExpr) -> Step {
    let path = contained(state.resolve(expr))?;
    if path.as_path().is_dir() {
        return Err(Outcome::failure(
            FailureKind::NotAFile,
            format!("{} is a folder, not a file", path),
        ));
    }
    ensure_parent_dir(state, &path)?;

    let mut file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(path.as_path())
        .map_err(|e| io_failure("write to", &path, e))?;
    writeln!(file, "{}", text.as_str()).map_err(|e| io_failure("write to", &path, e))?;
    Ok(Outcome::success(format!("Appended to {}", path)))
}

/// Create an empty file, or bump the modification time of an existing one
fn touch_file(state: &SessionState, expr: &PathExpr) -> Step {
    let path = contained(state.resolve(expr))?;
    match fs::metadata(path.as_path()) {
        Ok(meta) if meta.is_dir() => Err(Outcome::failure(
            FailureKind::NotAFile,
            format!("{} is a folder, not a file", path),
        )),
        Ok(_) => {
            OpenOptions::new()
                .append(true)
                .open(path.as_path())
                .and_then(|file| file.set_modified(SystemTime::now()))
                .map_err(|e| io_failure("touch", &path, e))?;
            Ok(Outcome::success(format!("Touched {}", path)))
        }
        Err(_) => create_file(state, expr),
    }
}

fn recent_files(state: &SessionState, count: Option<usize>) -> Step {
    let count = count.filter(|&n| n > 0).unwrap_or(DEFAULT_RECENT_FILES);
    let here = state.current_path();
    let mut files = Vec::new();
    walk(here.as_path(), &here.to_string(), &mut |entry| {
        if entry.kind == EntryKind::File {
            match fs::symlink_metadata(&entry.path).and_then(|meta| meta.modified()) {
                Ok(modified) => files.push((modified, entry.shown.clone())),
                Err(e) => tracing::debug!("No modification time for {}: {}", entry.shown, e),
            }
        }
        true
    })
    .map_err(|e| io_failure("list", &here, e))?;

    files.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
    files.truncate(count);
    let lines: Vec<String> = files
        .into_iter()
        .map(|(modified, shown)| {
            let stamp = DateTime::<Local>::from(modified).format("%Y-%m-%d %H:%M");
            format!("{}  {}", stamp, shown)
        })
        .collect();

    let message = if lines.is_empty() {
        format!("There are no files below {}", here)
    } else {
        format!("Most recent {} below {}", plural(lines.len(), "file", "files"), here)
    };
    Ok(Outcome::success_with(message, OutcomeData::Lines(lines)))
}

fn show_stats(state: &SessionState) -> Step {
    let here = state.current_path();
    let entries = state
        .list_entries()
        .map_err(|e| io_failure("list", &here, e))?;
    let stats = FolderStats::tally(&entries);

    let mut parts = vec![
        plural(stats.files, "file", "files"),
        plural(stats.folders, "folder", "folders"),
    ];
    if stats.links > 0 {
        parts.push(plural(stats.links, "link", "links"));
    }
    Ok(Outcome::success_with(
        format!(
            "{} has {} ({} in total)",
            here,
            parts.join(", "),
            plural(stats.total(), "entry", "entries")
        ),
        OutcomeData::Stats(stats),
    ))
}

fn plural(n: usize, one: &str, many: &str) -> String {
    format!("{} {}", n, if n == 1 { one } else { many })
}

/// Lowercased search text; blank queries are refused
fn search_term(query: &PathExpr) -> std::result::Result<String, Outcome> {
    let needle = query.as_str().trim().to_lowercase();
    if needle.is_empty() {
        return Err(Outcome::failure(
            FailureKind::ParseFailure,
            "Say what to search for",
        ));
    }
    Ok(needle)
}

/// Up to `limit` numbered lines of `path` containing `needle`, case-insensitively
fn matching_lines(path: &Path, needle: &str, limit: usize) -> io::Result<Vec<(usize, String)>> {
    let file = fs::File::open(path)?;
    let mut found = Vec::new();
    for (i, line) in BufReader::new(file).split(b'\n').enumerate() {
        if found.len() == limit {
            break;
        }
        let line = line?;
        let text = String::from_utf8_lossy(&line);
        if text.to_lowercase().contains(needle) {
            found.push((i + 1, text.trim().to_string()));
        }
    }
    Ok(found)
}

/// One entry met while walking a folder
struct Walked {
    path: PathBuf,
    name: String,
    /// Sandbox-relative form for messages
    shown: String,
    kind: EntryKind,
}

/// Visit every entry below `dir` in listing order, never following links
///
/// `visit` returns false to stop early, in which case so does `walk`.
/// Subfolders that cannot be read are skipped.
fn walk<F>(dir: &Path, shown: &str, visit: &mut F) -> io::Result<bool>
where
    F: FnMut(&Walked) -> bool,
{
    for entry in list_dir(dir)? {
        let walked = Walked {
            path: dir.join(&entry.name),
            shown: format!("{}/{}", shown.trim_end_matches('/'), entry.name),
            name: entry.name,
            kind: entry.kind,
        };
        if !visit(&walked) {
            return Ok(false);
        }
        if walked.kind == EntryKind::Directory {
            match walk(&walked.path, &walked.shown, visit) {
                Ok(true) => {}
                Ok(false) => return Ok(false),
                Err(e) => tracing::debug!("Skipping unreadable {}: {}", walked.shown, e),
            }
        }
    }
    Ok(true)
}
