//! The body of the read-parse-execute loop
//!
//! One utterance is handled to completion before the next is accepted.
//! `Shell` owns the only `SessionState`, so nothing else can change the
//! current directory or history while a command runs.

use crate::command::executor::CommandExecutor;
use crate::command::intent::{Command, Intent};
use crate::command::outcome::{FailureKind, Outcome};
use crate::core::config::ShellConfig;
use crate::core::error::Result;
use crate::core::types::SandboxRoot;
use crate::parser::{parse_command, tokenize};
use crate::session::history::LogRecord;
use crate::session::state::SessionState;
use crate::shell::io::{JsonlLog, LogSink, Utterance};

/// Words that confirm a pending folder delete
const CONFIRM: &[&str] = &["yes", "y", "yeah", "yep", "sure", "confirm"];

/// May follow a confirmation word ("yes please", "sure do it")
const CONFIRM_TAIL: &[&str] = &["please", "do", "it"];

/// What the shell says back for one utterance
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub message: String,
    /// `None` when nothing was executed
    pub outcome: Option<Outcome>,
    /// The user asked to leave
    pub exit: bool,
}

impl Reply {
    fn notice(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            outcome: None,
            exit: false,
        }
    }
}

pub struct Shell {
    state: SessionState,
    executor: CommandExecutor,
    log: Option<Box<dyn LogSink>>,
    /// A folder delete waiting for "yes"
    pending: Option<Command>,
}

impl Shell {
    pub fn new(state: SessionState, executor: CommandExecutor) -> Self {
        Self {
            state,
            executor,
            log: None,
            pending: None,
        }
    }

    pub fn with_log(mut self, log: Box<dyn LogSink>) -> Self {
        self.log = Some(log);
        self
    }

    /// Open the sandbox and audit log named in `config`
    pub fn from_config(config: &ShellConfig) -> Result<Self> {
        let root = SandboxRoot::open(&config.sandbox_root)?;
        tracing::info!("Sandbox root is {}", root.path().display());

        let state = SessionState::new(root, config.history_capacity);
        let shell = Self::new(state, CommandExecutor::from_config(config));
        Ok(match &config.log_file {
            Some(path) => shell.with_log(Box::new(JsonlLog::open(path)?)),
            None => shell,
        })
    }

    /// Read-only view for prompts and dashboards
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn executor(&self) -> &CommandExecutor {
        &self.executor
    }

    pub fn has_pending_confirmation(&self) -> bool {
        self.pending.is_some()
    }

    /// Handle one utterance to completion
    pub fn handle(&mut self, utterance: Utterance) -> Reply {
        let text = match utterance {
            Utterance::Text(text) if !text.trim().is_empty() => text,
            _ => return Reply::notice("Sorry, I didn't catch that"),
        };

        let Some(pending) = self.pending.take() else {
            return self.run(parse_command(&text));
        };
        if is_confirmation(&text) {
            return self.run(pending.into_recursive());
        }

        // Anything but a yes cancels; a recognized command still runs
        let notice = self.cancel(&pending);
        let cmd = parse_command(&text);
        if cmd.intent() == Intent::Unrecognized {
            return Reply::notice(notice);
        }
        let mut reply = self.run(cmd);
        reply.message = format!("{}. {}", notice, reply.message);
        reply
    }

    /// Drop a pending delete and audit-log that it was declined
    fn cancel(&mut self, pending: &Command) -> String {
        let target = pending.primary_arg().map(|p| p.to_string()).unwrap_or_default();
        tracing::info!("Delete of '{}' cancelled", target);
        let notice = format!("Okay, I left {} alone", target);
        self.write_log(&LogRecord::cancelled(pending, notice.as_str()));
        notice
    }

    fn run(&mut self, cmd: Command) -> Reply {
        let outcome = self.executor.execute(&cmd, &mut self.state);

        if cmd.intent().is_recorded() {
            if let Some(record) = self.state.history().back().map(|entry| entry.to_record()) {
                self.write_log(&record);
            }
        }

        if outcome.failure_kind() == Some(FailureKind::DirectoryNotEmpty) && !cmd.is_recursive() {
            self.pending = Some(cmd.clone());
        }

        Reply {
            message: outcome.message().to_string(),
            exit: cmd.intent() == Intent::Exit,
            outcome: Some(outcome),
        }
    }

    fn write_log(&mut self, record: &LogRecord) {
        let Some(log) = self.log.as_mut() else {
            return;
        };
        if let Err(e) = log.append(record) {
            tracing::warn!("Could not write audit record: {}", e);
        }
    }
}

fn is_confirmation(text: &str) -> bool {
    let tokens = tokenize(text);
    match tokens.split_first() {
        Some((first, rest)) => first.is_any(CONFIRM) && rest.iter().all(|t| t.is_any(CONFIRM_TAIL)),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::launcher::{AllowList, ProcessLauncher};
    use std::fs;

    fn shell() -> (tempfile::TempDir, Shell) {
        let tmp = tempfile::tempdir().unwrap();
        let root = SandboxRoot::open(tmp.path()).unwrap();
        let executor = CommandExecutor::new(AllowList::new(Default::default()), Box::new(ProcessLauncher));
        (tmp, Shell::new(SessionState::new(root, 20), executor))
    }

    fn say(shell: &mut Shell, text: &str) -> Reply {
        shell.handle(Utterance::Text(text.to_string()))
    }

    #[test]
    fn test_no_input_is_not_recorded() {
        let (_tmp, mut shell) = shell();
        let reply = shell.handle(Utterance::NoInput);
        assert!(reply.outcome.is_none());
        let reply = say(&mut shell, "   ");
        assert!(reply.outcome.is_none());
        assert!(shell.state().history().is_empty());
    }

    #[test]
    fn test_confirmed_delete() {
        let (_tmp, mut shell) = shell();
        let docs = shell.state().root().path().join("docs");
        fs::create_dir(&docs).unwrap();
        fs::write(docs.join("a.txt"), b"a").unwrap();

        let reply = say(&mut shell, "delete folder docs");
        assert_eq!(
            reply.outcome.unwrap().failure_kind(),
            Some(FailureKind::DirectoryNotEmpty)
        );
        assert!(shell.has_pending_confirmation());

        let reply = say(&mut shell, "yes please");
        assert!(reply.outcome.unwrap().is_success());
        assert!(!docs.exists());
        assert!(!shell.has_pending_confirmation());
        assert_eq!(shell.state().history().len(), 2);
    }

    #[test]
    fn test_anything_else_cancels_delete() {
        let (_tmp, mut shell) = shell();
        let docs = shell.state().root().path().join("docs");
        fs::create_dir(&docs).unwrap();
        fs::write(docs.join("a.txt"), b"a").unwrap();

        say(&mut shell, "delete docs");
        let reply = say(&mut shell, "list files");
        assert!(reply.outcome.unwrap().is_success());
        assert!(reply.message.starts_with("Okay, I left docs alone. / contains"));
        assert!(docs.exists());
        assert!(!shell.has_pending_confirmation());

        let reply = say(&mut shell, "yes");
        assert_eq!(
            reply.outcome.unwrap().failure_kind(),
            Some(FailureKind::ParseFailure)
        );
    }

    #[test]
    fn test_refusal_only_cancels() {
        let (_tmp, mut shell) = shell();
        let docs = shell.state().root().path().join("docs");
        fs::create_dir(&docs).unwrap();
        fs::write(docs.join("a.txt"), b"a").unwrap();

        say(&mut shell, "delete docs");
        let reply = say(&mut shell, "no");
        assert!(reply.outcome.is_none());
        assert_eq!(reply.message, "Okay, I left docs alone");
        assert_eq!(shell.state().history().len(), 1);
    }

    #[test]
    fn test_exit_while_delete_pending() {
        let (_tmp, mut shell) = shell();
        let docs = shell.state().root().path().join("docs");
        fs::create_dir(&docs).unwrap();
        fs::write(docs.join("a.txt"), b"a").unwrap();

        say(&mut shell, "delete docs");
        let reply = say(&mut shell, "exit");
        assert!(reply.exit);
        assert!(docs.exists());
    }

    #[test]
    fn test_exit_sets_flag() {
        let (_tmp, mut shell) = shell();
        assert!(!say(&mut shell, "where am i").exit);
        assert!(say(&mut shell, "exit").exit);
    }

    #[test]
    fn test_confirmation_words() {
        assert!(is_confirmation("yes"));
        assert!(is_confirmation("Yeah!"));
        assert!(is_confirmation("sure, do it"));
        assert!(!is_confirmation("no"));
        assert!(!is_confirmation("yes delete the other one"));
        assert!(!is_confirmation(""));
    }
}
