//! Collaborators at the edge of the core: input, spoken/printed output and
//! the append-only audit log
//!
//! The core only sees finished utterances and hands back finished replies.
//! Anything that blocks (reading a line, capturing audio, playing speech)
//! happens behind these traits.

use crate::command::outcome::OutcomeData;
use crate::core::error::Result;
use crate::session::history::LogRecord;
use crate::shell::driver::Reply;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, Write};
use std::path::Path;

/// One capture from the input collaborator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Utterance {
    /// Transcribed or typed text
    Text(String),
    /// Capture produced nothing usable (silence, failed transcription, blank line)
    NoInput,
}

/// Supplies utterances; `None` means the input is exhausted
pub trait InputSource {
    fn next_utterance(&mut self) -> Option<Utterance>;
}

/// Reads one utterance per line
#[derive(Debug)]
pub struct TextInput<R: BufRead> {
    reader: R,
}

impl<R: BufRead> TextInput<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl TextInput<io::StdinLock<'static>> {
    pub fn stdin() -> Self {
        Self::new(io::stdin().lock())
    }
}

impl<R: BufRead> InputSource for TextInput<R> {
    fn next_utterance(&mut self) -> Option<Utterance> {
        let mut line = String::new();
        match self.reader.read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => {
                let text = line.trim();
                if text.is_empty() {
                    Some(Utterance::NoInput)
                } else {
                    Some(Utterance::Text(text.to_string()))
                }
            }
            Err(e) => {
                tracing::warn!("Input failed: {}", e);
                None
            }
        }
    }
}

/// Delivers replies to the user
pub trait Speaker {
    fn deliver(&mut self, reply: &Reply) -> io::Result<()>;
}

/// Prints replies, with file contents, trees and history below the message
#[derive(Debug)]
pub struct ConsoleSpeaker<W: Write> {
    out: W,
}

impl<W: Write> ConsoleSpeaker<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl ConsoleSpeaker<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> Speaker for ConsoleSpeaker<W> {
    fn deliver(&mut self, reply: &Reply) -> io::Result<()> {
        writeln!(self.out, "{}", reply.message)?;
        match reply.outcome.as_ref().and_then(|o| o.data()) {
            Some(OutcomeData::Lines(lines)) => {
                for line in lines {
                    writeln!(self.out, "  {}", line)?;
                }
            }
            Some(OutcomeData::History(records)) => {
                for record in records {
                    writeln!(self.out, "  {}", record)?;
                }
            }
            _ => {}
        }
        self.out.flush()
    }
}

/// Append-only store for audit records
pub trait LogSink {
    fn append(&mut self, record: &LogRecord) -> Result<()>;
}

/// One JSON object per line, appended to a file
#[derive(Debug)]
pub struct JsonlLog {
    file: File,
}

impl JsonlLog {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        tracing::info!("Audit log at {}", path.display());
        Ok(Self { file })
    }
}

impl LogSink for JsonlLog {
    fn append(&mut self, record: &LogRecord) -> Result<()> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');
        self.file.write_all(line.as_bytes())?;
        self.file.flush()?;
        Ok(())
    }
}

/// Keeps records in memory
#[derive(Debug, Default)]
pub struct MemoryLog {
    records: Vec<LogRecord>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[LogRecord] {
        &self.records
    }
}

impl LogSink for MemoryLog {
    fn append(&mut self, record: &LogRecord) -> Result<()> {
        self.records.push(record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::intent::{Command, Intent};
    use crate::command::outcome::Outcome;
    use crate::session::history::HistoryEntry;
    use std::io::Cursor;

    #[test]
    fn test_text_input_lines() {
        let mut input = TextInput::new(Cursor::new("list files\n\n   \ngo back\n"));
        assert_eq!(input.next_utterance(), Some(Utterance::Text("list files".into())));
        assert_eq!(input.next_utterance(), Some(Utterance::NoInput));
        assert_eq!(input.next_utterance(), Some(Utterance::NoInput));
        assert_eq!(input.next_utterance(), Some(Utterance::Text("go back".into())));
        assert_eq!(input.next_utterance(), None);
    }

    #[test]
    fn test_jsonl_log_appends() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("logs/audit.jsonl");
        let record = HistoryEntry::new(Command::unrecognized("blah"), Outcome::success("ok"))
            .to_record();

        let mut log = JsonlLog::open(&path).unwrap();
        log.append(&record).unwrap();
        drop(log);
        let mut log = JsonlLog::open(&path).unwrap();
        log.append(&record).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        let back: LogRecord = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(back.intent, Intent::Unrecognized);
    }

    #[test]
    fn test_console_speaker_prints_lines() {
        let reply = Reply {
            message: "/a.txt (2 lines)".into(),
            outcome: Some(Outcome::success_with(
                "/a.txt (2 lines)",
                OutcomeData::Lines(vec!["one".into(), "two".into()]),
            )),
            exit: false,
        };
        let mut speaker = ConsoleSpeaker::new(Vec::new());
        speaker.deliver(&reply).unwrap();
        let printed = String::from_utf8(speaker.into_inner()).unwrap();
        assert_eq!(printed, "/a.txt (2 lines)\n  one\n  two\n");
    }
}
