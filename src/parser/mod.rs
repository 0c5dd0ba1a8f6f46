//! Parse natural language utterances into structured commands
//!
//! Parsing is total: every input, including empty strings and noise,
//! produces a `Command`. Input that matches no rule becomes
//! `Intent::Unrecognized` so the executor can answer uniformly. The parser
//! never touches the filesystem; arguments stay unresolved `PathExpr`s.

pub mod rules;
pub mod tokenizer;

pub use rules::{Rule, RULES};
pub use tokenizer::{tokenize, Token};

use crate::command::intent::Command;
use crate::core::types::PathExpr;

/// Politeness and hesitation words dropped from the start of an utterance
const LEADING_FILLER: &[&str] = &[
    "please", "can", "could", "would", "will", "you", "kindly", "hey", "ok", "okay", "now", "just",
    "i", "want", "to", "like", "need", "and", "um", "uh", "so",
];

/// Dropped from the end of an utterance
const TRAILING_FILLER: &[&str] = &["please", "thanks", "now"];

/// Spoken names for path punctuation inside arguments
const SPOKEN_SYMBOLS: &[(&str, &str)] = &[
    ("dot", "."),
    ("period", "."),
    ("point", "."),
    ("slash", "/"),
    ("backslash", "\\"),
    ("underscore", "_"),
    ("dash", "-"),
    ("hyphen", "-"),
];

/// Parse one utterance
pub fn parse_command(raw_text: &str) -> Command {
    let raw_text = raw_text.trim();
    let tokens = tokenize(raw_text);
    let tokens = strip_filler(&tokens);

    for rule in RULES {
        let Some(captures) = rule.matches(tokens) else {
            continue;
        };

        let mut args = captures
            .args
            .iter()
            .map(|tokens| PathExpr::new(join_argument(tokens)));
        match Command::build(rule.intent, args.next(), args.next(), raw_text) {
            Ok(command) => {
                tracing::debug!("Parsed '{}' as {}", raw_text, rule.intent);
                return command.with_limit(captures.count);
            }
            Err(e) => {
                debug_assert!(false, "rule table is inconsistent: {}", e);
                tracing::error!("Skipping malformed rule for {}: {}", rule.intent, e);
            }
        }
    }

    tracing::debug!("No rule matched '{}'", raw_text);
    Command::unrecognized(raw_text)
}

fn strip_filler(tokens: &[Token]) -> &[Token] {
    let start = tokens
        .iter()
        .take_while(|t| t.is_any(LEADING_FILLER))
        .count();
    let tokens = &tokens[start..];
    let end = tokens.len()
        - tokens
            .iter()
            .rev()
            .take_while(|t| t.is_any(TRAILING_FILLER))
            .count();
    &tokens[..end]
}

/// Rebuild an argument from its tokens
///
/// Spoken punctuation glues its neighbours together ("notes dot txt" ->
/// "notes.txt"); other words join with single spaces. A single token is
/// always taken literally, so a file may still be called "dash".
fn join_argument(tokens: &[Token]) -> String {
    if let [only] = tokens {
        return only.text.clone();
    }

    let mut out = String::new();
    let mut glued = true;
    for token in tokens {
        let symbol = SPOKEN_SYMBOLS
            .iter()
            .find(|(word, _)| !token.quoted && token.norm == *word)
            .map(|(_, symbol)| *symbol);
        match symbol {
            Some(symbol) => {
                out.push_str(symbol);
                glued = true;
            }
            None => {
                if !glued {
                    out.push(' ');
                }
                out.push_str(&token.text);
                glued = false;
            }
        }
    }
    out
}
