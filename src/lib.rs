//! Voice Shell - a sandboxed, natural-language file shell
//!
//! Utterances flow through one pipeline:
//! text -> parser -> Command -> executor (resolver guards every path) -> Outcome

pub mod command;
pub mod core;
pub mod parser;
pub mod session;
pub mod shell;
