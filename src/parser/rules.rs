//! Ordered intent rules
//!
//! Each rule is a small pattern over tokens. Rules are tried top to bottom:
//! two-argument forms first, then one-argument, then zero-argument. The
//! first rule that matches the whole (filler-stripped) utterance wins.

use crate::command::intent::Intent;
use crate::parser::tokenizer::Token;

/// One element of a rule pattern
#[derive(Debug, Clone, Copy)]
pub enum Part {
    /// Exactly one token from the set
    Word(&'static [&'static str]),
    /// Any run of tokens from the set, possibly empty
    Skip(&'static [&'static str]),
    /// One or more free-form tokens, captured as a path argument
    Arg,
    /// An optional number
    Count,
}

#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub intent: Intent,
    pub parts: &'static [Part],
}

/// What a successful match captured
#[derive(Debug, Default)]
pub struct Captures<'t> {
    pub args: Vec<&'t [Token]>,
    pub count: Option<usize>,
}

impl Rule {
    /// Number of arguments this rule captures
    pub fn arg_count(&self) -> usize {
        self.parts.iter().filter(|p| matches!(p, Part::Arg)).count()
    }

    pub fn matches<'t>(&self, tokens: &'t [Token]) -> Option<Captures<'t>> {
        let mut captures = Captures::default();
        if match_parts(self.parts, tokens, &mut captures) {
            Some(captures)
        } else {
            None
        }
    }
}

/// Backtracking matcher; the pattern must consume every token
///
/// `Skip` is greedy, `Arg` is lazy so the first connective ends it.
fn match_parts<'t>(parts: &[Part], tokens: &'t [Token], captures: &mut Captures<'t>) -> bool {
    let Some((part, rest)) = parts.split_first() else {
        return tokens.is_empty();
    };

    match *part {
        Part::Word(words) => match tokens.split_first() {
            Some((token, remaining)) if token.is_any(words) => {
                match_parts(rest, remaining, captures)
            }
            _ => false,
        },
        Part::Skip(words) => {
            let run = tokens.iter().take_while(|t| t.is_any(words)).count();
            (0..=run)
                .rev()
                .any(|n| match_parts(rest, &tokens[n..], captures))
        }
        Part::Arg => {
            for n in 1..=tokens.len() {
                captures.args.push(&tokens[..n]);
                if match_parts(rest, &tokens[n..], captures) {
                    return true;
                }
                captures.args.pop();
            }
            false
        }
        Part::Count => {
            if let Some((token, remaining)) = tokens.split_first() {
                if let Ok(n) = token.norm.parse::<usize>() {
                    captures.count = Some(n);
                    if match_parts(rest, remaining, captures) {
                        return true;
                    }
                    captures.count = None;
                }
            }
            match_parts(rest, tokens, captures)
        }
    }
}

// ============================================================================
// Vocabulary
// ============================================================================

const CREATE: &[&str] = &["create", "make", "add", "new"];
const DELETE: &[&str] = &["delete", "remove", "rm", "del", "trash"];
const RENAME: &[&str] = &["rename"];
const COPY: &[&str] = &["copy", "cp", "duplicate"];
const MOVE: &[&str] = &["move", "mv"];
const APPEND: &[&str] = &["append", "write"];
const SEARCH: &[&str] = &["search", "find", "locate", "look"];
const LAUNCH: &[&str] = &["open", "launch", "start", "run"];

const DIR_NOUN: &[&str] = &["folder", "directory", "dir", "subfolder", "subdirectory"];
const FILE_NOUN: &[&str] = &["file", "document"];
const NAMING: &[&str] = &["called", "named", "titled"];
const NEW_ADJ: &[&str] = &["a", "an", "the", "new", "empty", "blank"];
const ENTRY: &[&str] = &[
    "the", "a", "file", "folder", "directory", "dir", "item", "entry", "called", "named",
];
const RENAME_TO: &[&str] = &["to", "as", "into"];
const PLACE_TO: &[&str] = &["to", "into", "in", "inside"];

// ============================================================================
// Rule table
// ============================================================================

use Part::{Arg, Count, Skip, Word};

pub static RULES: &[Rule] = &[
    // --- two arguments ---
    Rule {
        intent: Intent::RenameEntry,
        parts: &[Word(RENAME), Skip(ENTRY), Arg, Word(RENAME_TO), Skip(NAMING), Arg],
    },
    Rule {
        intent: Intent::CopyEntry,
        parts: &[Word(COPY), Skip(ENTRY), Arg, Word(PLACE_TO), Skip(&["the"]), Arg],
    },
    Rule {
        intent: Intent::MoveEntry,
        parts: &[Word(MOVE), Skip(ENTRY), Arg, Word(PLACE_TO), Skip(&["the"]), Arg],
    },
    Rule {
        intent: Intent::AppendFile,
        parts: &[
            Word(APPEND),
            Arg,
            Word(&["to", "into"]),
            Skip(&["the", "end", "of", "file", "document"]),
            Arg,
        ],
    },
    // --- one argument ---
    Rule {
        intent: Intent::CreateDir,
        parts: &[Word(CREATE), Skip(NEW_ADJ), Word(DIR_NOUN), Skip(NAMING), Arg],
    },
    Rule {
        intent: Intent::CreateFile,
        parts: &[Word(CREATE), Skip(NEW_ADJ), Word(FILE_NOUN), Skip(NAMING), Arg],
    },
    Rule {
        intent: Intent::DeleteEntry,
        parts: &[Word(DELETE), Skip(ENTRY), Arg],
    },
    Rule {
        intent: Intent::ReadFile,
        parts: &[
            Word(&["show", "display", "print", "open", "view"]),
            Skip(&["me", "the", "contents", "content", "of"]),
            Word(FILE_NOUN),
            Skip(NAMING),
            Arg,
        ],
    },
    Rule {
        intent: Intent::ReadFile,
        parts: &[
            Word(&["read", "cat"]),
            Skip(&["me", "the", "file", "contents", "content", "of"]),
            Arg,
        ],
    },
    Rule {
        intent: Intent::EntrySize,
        parts: &[
            Skip(&["what", "what's", "whats", "is", "the", "show", "get", "tell", "me"]),
            Word(&["size"]),
            Word(&["of"]),
            Skip(ENTRY),
            Arg,
        ],
    },
    Rule {
        intent: Intent::EntrySize,
        parts: &[
            Word(&["how"]),
            Word(&["big", "large"]),
            Word(&["is"]),
            Skip(ENTRY),
            Arg,
        ],
    },
    Rule {
        intent: Intent::ChangeDir,
        parts: &[
            Word(&["open", "enter"]),
            Skip(&["the"]),
            Word(DIR_NOUN),
            Skip(NAMING),
            Arg,
        ],
    },
    Rule {
        intent: Intent::ChangeDir,
        parts: &[
            Word(&["cd", "chdir", "enter"]),
            Skip(&["to", "into", "the", "folder", "directory", "dir"]),
            Arg,
        ],
    },
    Rule {
        intent: Intent::ChangeDir,
        parts: &[
            Word(&["change", "switch"]),
            Skip(&["the", "current", "working", "directory", "dir", "folder", "to", "into"]),
            Arg,
        ],
    },
    Rule {
        intent: Intent::ChangeDir,
        parts: &[
            Word(&["go", "navigate", "move", "head", "step"]),
            Word(&["to", "into", "inside"]),
            Skip(&["the", "folder", "directory", "dir"]),
            Arg,
        ],
    },
    Rule {
        intent: Intent::GrepFiles,
        parts: &[Word(&["grep"]), Skip(&["for"]), Arg],
    },
    Rule {
        intent: Intent::GrepFiles,
        parts: &[
            Word(SEARCH),
            Skip(&["for"]),
            Word(&["in", "inside", "through"]),
            Skip(&["the", "all", "my"]),
            Word(&["files", "file", "contents"]),
            Skip(&["for"]),
            Arg,
        ],
    },
    Rule {
        intent: Intent::SearchEntries,
        parts: &[
            Word(SEARCH),
            Skip(&[
                "for", "the", "a", "an", "file", "files", "folder", "folders", "named", "called",
            ]),
            Arg,
        ],
    },
    Rule {
        intent: Intent::TouchFile,
        parts: &[Word(&["touch"]), Skip(&["the", "file"]), Arg],
    },
    Rule {
        intent: Intent::LaunchUtility,
        parts: &[Word(LAUNCH), Arg],
    },
    // --- zero arguments ---
    Rule {
        intent: Intent::ClearHistory,
        parts: &[
            Word(&["clear", "erase", "reset", "wipe"]),
            Skip(&["the", "my", "command", "commands"]),
            Word(&["history"]),
        ],
    },
    Rule {
        intent: Intent::ShowHistory,
        parts: &[
            Skip(&[
                "show", "display", "view", "list", "me", "the", "my", "command", "commands",
                "recent",
            ]),
            Word(&["history"]),
            Count,
            Skip(&["entries", "commands", "items"]),
        ],
    },
    Rule {
        intent: Intent::ShowTree,
        parts: &[
            Skip(&["show", "display", "print", "draw", "me", "the", "a", "directory", "folder"]),
            Word(&["tree"]),
            Skip(&["view", "with", "of", "to", "depth", "level"]),
            Count,
            Skip(&["levels", "level", "deep"]),
        ],
    },
    Rule {
        intent: Intent::RecentFiles,
        parts: &[
            Skip(&["show", "list", "display", "me", "the", "my", "most"]),
            Word(&["recent", "recently", "latest", "newest"]),
            Skip(&["modified", "changed", "edited", "updated"]),
            Word(&["files", "file"]),
            Count,
        ],
    },
    Rule {
        intent: Intent::ShowStats,
        parts: &[
            Skip(&["show", "display", "give", "me", "the", "folder", "directory"]),
            Word(&["stats", "statistics", "summary"]),
            Skip(&["here", "for", "of", "this", "the", "current", "folder", "directory"]),
        ],
    },
    Rule {
        intent: Intent::Help,
        parts: &[
            Skip(&["show", "me", "the", "list", "of", "available", "all", "your", "get"]),
            Word(&["help", "commands", "options"]),
            Skip(&["me", "menu"]),
        ],
    },
    Rule {
        intent: Intent::Help,
        parts: &[
            Word(&["what"]),
            Word(&["can"]),
            Word(&["you", "i"]),
            Word(&["do", "say"]),
        ],
    },
    Rule {
        intent: Intent::Exit,
        parts: &[
            Word(&["exit", "quit", "goodbye", "bye", "stop", "close"]),
            Skip(&["the", "shell", "program", "now"]),
        ],
    },
    Rule {
        intent: Intent::Exit,
        parts: &[Word(&["good"]), Word(&["bye", "night"])],
    },
    Rule {
        intent: Intent::WhereAmI,
        parts: &[
            Skip(&["show", "tell", "me"]),
            Word(&["where"]),
            Word(&["am", "are"]),
            Word(&["i", "we"]),
        ],
    },
    Rule {
        intent: Intent::WhereAmI,
        parts: &[
            Skip(&["show", "tell", "me"]),
            Word(&["where"]),
            Word(&["i", "we"]),
            Word(&["am", "are"]),
        ],
    },
    Rule {
        intent: Intent::WhereAmI,
        parts: &[Word(&["pwd"])],
    },
    Rule {
        intent: Intent::WhereAmI,
        parts: &[
            Word(&["show", "print", "display", "tell", "what", "what's", "whats", "which"]),
            Skip(&["me", "the", "is", "my", "current", "working", "present"]),
            Word(&["directory", "dir", "folder", "location", "path"]),
            Skip(&["is", "am", "i", "in", "this", "it"]),
        ],
    },
    Rule {
        intent: Intent::WhereAmI,
        parts: &[
            Word(&["current"]),
            Skip(&["working"]),
            Word(&["location", "directory", "folder", "path"]),
        ],
    },
    Rule {
        intent: Intent::GoBack,
        parts: &[
            Skip(&["go", "move", "step", "navigate", "head"]),
            Word(&["back", "up", "out"]),
            Skip(&["one", "a", "level", "directory", "folder", "dir"]),
        ],
    },
    Rule {
        intent: Intent::GoBack,
        parts: &[
            Skip(&["the"]),
            Word(&["parent"]),
            Skip(&["directory", "folder", "dir"]),
        ],
    },
    Rule {
        intent: Intent::ListEntries,
        parts: &[
            Word(&["list", "ls", "dir", "show", "display"]),
            Skip(&[
                "me", "all", "the", "files", "file", "contents", "content", "folders", "everything",
                "items", "entries", "of", "this", "here", "in", "current", "directory", "folder",
            ]),
        ],
    },
    Rule {
        intent: Intent::ListEntries,
        parts: &[
            Word(&["what", "what's", "whats"]),
            Skip(&["files", "file", "folders", "is", "are", "in", "there"]),
            Word(&["here", "inside"]),
        ],
    },
];
