//! Quote-aware tokenizer for utterances

use nom::{
    branch::alt,
    bytes::complete::{take_till, take_while1},
    character::complete::{char, multispace0},
    combinator::map,
    multi::many0,
    sequence::{delimited, preceded},
    IResult, Parser,
};

/// One word (or quoted phrase) of an utterance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// As typed, minus trailing sentence punctuation for bare words
    pub text: String,
    /// Lowercased `text`, used for keyword matching
    pub norm: String,
    /// Quoted tokens are always arguments, never keywords
    pub quoted: bool,
}

impl Token {
    fn bare(raw: &str) -> Self {
        let text = trim_trailing_punctuation(raw).to_string();
        Self {
            norm: text.to_lowercase(),
            text,
            quoted: false,
        }
    }

    fn quoted(inner: &str) -> Self {
        Self {
            text: inner.to_string(),
            norm: inner.to_lowercase(),
            quoted: true,
        }
    }

    /// True when this token is one of `words` (and not quoted)
    pub fn is_any(&self, words: &[&str]) -> bool {
        !self.quoted && words.contains(&self.norm.as_str())
    }
}

/// Split an utterance into tokens, keeping quoted substrings whole
///
/// Never fails: an unterminated quote is just part of a bare word.
pub fn tokenize(input: &str) -> Vec<Token> {
    let tokens = match many0(preceded(multispace0, token)).parse(input) {
        Ok((_, tokens)) => tokens,
        Err(_) => Vec::new(),
    };
    tokens
        .into_iter()
        .filter(|t| t.quoted || !t.text.is_empty())
        .collect()
}

fn token(input: &str) -> IResult<&str, Token> {
    alt((map(quoted, Token::quoted), map(bare, Token::bare))).parse(input)
}

fn quoted(input: &str) -> IResult<&str, &str> {
    alt((
        delimited(char('"'), take_till(|c| c == '"'), char('"')),
        delimited(char('\''), take_till(|c| c == '\''), char('\'')),
    ))
    .parse(input)
}

fn bare(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| !c.is_whitespace()).parse(input)
}

/// Drop sentence punctuation a transcriber or typist leaves at word ends
///
/// A trailing `.` is kept when the last path segment is only dots, so
/// `..` and `../..` survive.
fn trim_trailing_punctuation(word: &str) -> &str {
    let trimmed = word.trim_end_matches(['!', '?', ',', ';', ':']);
    let last_segment = trimmed.rsplit(['/', '\\']).next().unwrap_or(trimmed);
    if trimmed.ends_with('.') && !last_segment.chars().all(|c| c == '.') {
        trimmed.trim_end_matches('.')
    } else {
        trimmed
    }
}
