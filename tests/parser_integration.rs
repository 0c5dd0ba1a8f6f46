//! Integration tests for the command parser
//!
//! Phrasings a user is likely to say (or a transcriber is likely to
//! produce), checked against the intent and arguments they should yield.

use voice_shell::command::{Command, Intent};
use voice_shell::parser::parse_command;

fn args(cmd: &Command) -> (Option<&str>, Option<&str>) {
    (
        cmd.primary_arg().map(|a| a.as_str()),
        cmd.secondary_arg().map(|a| a.as_str()),
    )
}

fn assert_parses(input: &str, intent: Intent, primary: Option<&str>, secondary: Option<&str>) {
    let cmd = parse_command(input);
    assert_eq!(cmd.intent(), intent, "intent for {:?}", input);
    assert_eq!(args(&cmd), (primary, secondary), "arguments for {:?}", input);
}

// ============================================================================
// Scenario phrases
// ============================================================================

#[test]
fn test_scenario_phrases() {
    assert_parses("create file notes.txt", Intent::CreateFile, Some("notes.txt"), None);
    assert_parses(
        "rename data.txt to backup.txt",
        Intent::RenameEntry,
        Some("data.txt"),
        Some("backup.txt"),
    );
    assert_parses("change directory to ../../etc", Intent::ChangeDir, Some("../../etc"), None);
    assert_parses("go back", Intent::GoBack, None, None);
    assert_parses("open calculator", Intent::LaunchUtility, Some("calculator"), None);
    assert_parses("open powershell", Intent::LaunchUtility, Some("powershell"), None);

    let cmd = parse_command("blah blah");
    assert_eq!(cmd.intent(), Intent::Unrecognized);
    assert_eq!(cmd.raw_text(), "blah blah");
}

// ============================================================================
// Synonyms and filler
// ============================================================================

#[test]
fn test_create_synonyms() {
    assert_parses("make a new folder called Reports", Intent::CreateDir, Some("Reports"), None);
    assert_parses("add directory src", Intent::CreateDir, Some("src"), None);
    assert_parses("new file named todo.md", Intent::CreateFile, Some("todo.md"), None);
    assert_parses("please create an empty file a.txt", Intent::CreateFile, Some("a.txt"), None);
}

#[test]
fn test_delete_synonyms() {
    assert_parses("delete notes.txt", Intent::DeleteEntry, Some("notes.txt"), None);
    assert_parses("remove the folder old", Intent::DeleteEntry, Some("old"), None);
    assert_parses("can you trash file junk.log", Intent::DeleteEntry, Some("junk.log"), None);
}

#[test]
fn test_copy_and_move() {
    assert_parses("copy a.txt to backup", Intent::CopyEntry, Some("a.txt"), Some("backup"));
    assert_parses(
        "move the file report.pdf into archive",
        Intent::MoveEntry,
        Some("report.pdf"),
        Some("archive"),
    );
}

#[test]
fn test_navigation_phrases() {
    assert_parses("cd docs", Intent::ChangeDir, Some("docs"), None);
    assert_parses("go to the folder projects", Intent::ChangeDir, Some("projects"), None);
    assert_parses("open folder music", Intent::ChangeDir, Some("music"), None);
    assert_parses("switch to /", Intent::ChangeDir, Some("/"), None);
    assert_parses("go up", Intent::GoBack, None, None);
    assert_parses("back", Intent::GoBack, None, None);
    assert_parses("parent folder", Intent::GoBack, None, None);
    assert_parses("where am I?", Intent::WhereAmI, None, None);
    assert_parses("pwd", Intent::WhereAmI, None, None);
    assert_parses("what's the current directory", Intent::WhereAmI, None, None);
}

#[test]
fn test_listing_and_info_phrases() {
    assert_parses("list files", Intent::ListEntries, None, None);
    assert_parses("show me everything here", Intent::ListEntries, None, None);
    assert_parses("read notes.txt", Intent::ReadFile, Some("notes.txt"), None);
    assert_parses("open file notes.txt", Intent::ReadFile, Some("notes.txt"), None);
    assert_parses("what is the size of docs", Intent::EntrySize, Some("docs"), None);
    assert_parses("how big is video.mp4", Intent::EntrySize, Some("video.mp4"), None);
    assert_parses("help", Intent::Help, None, None);
    assert_parses("what can you do", Intent::Help, None, None);
    assert_parses("clear history", Intent::ClearHistory, None, None);
    assert_parses("exit", Intent::Exit, None, None);
    assert_parses("goodbye", Intent::Exit, None, None);
}

#[test]
fn test_search_and_content_phrases() {
    assert_parses("search report", Intent::SearchEntries, Some("report"), None);
    assert_parses("find files named budget", Intent::SearchEntries, Some("budget"), None);
    assert_parses("look for the folder photos", Intent::SearchEntries, Some("photos"), None);
    assert_parses("grep \"to do\"", Intent::GrepFiles, Some("to do"), None);
    assert_parses("grep 'error'", Intent::GrepFiles, Some("error"), None);
    assert_parses("search in files \"fixme\"", Intent::GrepFiles, Some("fixme"), None);
    assert_parses(
        "append \"buy milk\" to file todo.txt",
        Intent::AppendFile,
        Some("buy milk"),
        Some("todo.txt"),
    );
    assert_parses(
        "write 'call home' into file notes dot txt",
        Intent::AppendFile,
        Some("call home"),
        Some("notes.txt"),
    );
    assert_parses("touch stamp.txt", Intent::TouchFile, Some("stamp.txt"), None);
    assert_parses("stats", Intent::ShowStats, None, None);
    assert_parses("stats here", Intent::ShowStats, None, None);
    assert_parses("show folder statistics", Intent::ShowStats, None, None);
}

#[test]
fn test_counts() {
    let cmd = parse_command("show my recent history");
    assert_eq!(cmd.intent(), Intent::ShowHistory);
    assert_eq!(cmd.limit(), None);

    let cmd = parse_command("show history 5");
    assert_eq!(cmd.intent(), Intent::ShowHistory);
    assert_eq!(cmd.limit(), Some(5));

    let cmd = parse_command("show tree depth 3");
    assert_eq!(cmd.intent(), Intent::ShowTree);
    assert_eq!(cmd.limit(), Some(3));

    let cmd = parse_command("recent files 5");
    assert_eq!(cmd.intent(), Intent::RecentFiles);
    assert_eq!(cmd.limit(), Some(5));

    let cmd = parse_command("show me the most recently changed files");
    assert_eq!(cmd.intent(), Intent::RecentFiles);
    assert_eq!(cmd.limit(), None);
}

// ============================================================================
// Tolerance
// ============================================================================

#[test]
fn test_case_and_punctuation() {
    assert_parses("CREATE FILE Notes.TXT.", Intent::CreateFile, Some("Notes.TXT"), None);
    assert_parses("Go Back!", Intent::GoBack, None, None);
    assert_parses("cd ..", Intent::ChangeDir, Some(".."), None);
}

#[test]
fn test_spoken_punctuation_in_paths() {
    assert_parses(
        "create file my underscore notes dot txt",
        Intent::CreateFile,
        Some("my_notes.txt"),
        None,
    );
    assert_parses("cd projects slash web", Intent::ChangeDir, Some("projects/web"), None);
}

#[test]
fn test_parse_is_total_on_odd_input() {
    for input in ["", "   ", "?!.,", "\"", "'unterminated", "create", "rename a to", "🚀"] {
        let cmd = parse_command(input);
        assert!(Intent::ALL.contains(&cmd.intent()));
    }
    assert_eq!(parse_command("create").intent(), Intent::Unrecognized);
    assert_eq!(parse_command("").intent(), Intent::Unrecognized);
}
