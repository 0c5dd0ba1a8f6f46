//! Utility allow-list and process launching
//!
//! The only operation that reaches outside the sandbox. A program is never
//! derived from user text: the spoken name is looked up in a fixed table and
//! only the table's program and arguments are ever executed.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io;
use std::path::Path;
use std::process::{Command, Stdio};

/// A program the shell may start, with fixed arguments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtilitySpec {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl UtilitySpec {
    pub fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }
}

/// Words that may surround a utility name without changing it
const NAME_FILLER: &[&str] = &["the", "a", "an", "app", "application", "program", "my"];

/// Spoken utility names mapped to the programs they start
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowList {
    entries: BTreeMap<String, UtilitySpec>,
}

impl AllowList {
    pub fn new(entries: BTreeMap<String, UtilitySpec>) -> Self {
        Self { entries }
    }

    /// Operator table from configuration, or the platform defaults if empty
    pub fn from_config(utilities: &BTreeMap<String, UtilitySpec>) -> Self {
        if utilities.is_empty() {
            Self::platform_default()
        } else {
            Self::new(utilities.clone())
        }
    }

    pub fn platform_default() -> Self {
        let mut entries = BTreeMap::new();

        #[cfg(windows)]
        {
            entries.insert("calculator".into(), UtilitySpec::new("calc", &[]));
            entries.insert("calc".into(), UtilitySpec::new("calc", &[]));
            entries.insert("notepad".into(), UtilitySpec::new("notepad", &[]));
            entries.insert("editor".into(), UtilitySpec::new("notepad", &[]));
            entries.insert("text-editor".into(), UtilitySpec::new("notepad", &[]));
            entries.insert("paint".into(), UtilitySpec::new("mspaint", &[]));
            entries.insert("explorer".into(), UtilitySpec::new("explorer", &["."]));
        }

        #[cfg(target_os = "macos")]
        {
            let calculator = UtilitySpec::new("open", &["-a", "Calculator"]);
            let editor = UtilitySpec::new("open", &["-a", "TextEdit"]);
            entries.insert("calculator".into(), calculator.clone());
            entries.insert("calc".into(), calculator);
            entries.insert("editor".into(), editor.clone());
            entries.insert("text-editor".into(), editor.clone());
            entries.insert("textedit".into(), editor);
            entries.insert("finder".into(), UtilitySpec::new("open", &["."]));
        }

        #[cfg(all(not(windows), not(target_os = "macos")))]
        {
            let calculator = UtilitySpec::new("gnome-calculator", &[]);
            let editor = UtilitySpec::new("gedit", &[]);
            entries.insert("calculator".into(), calculator.clone());
            entries.insert("calc".into(), calculator);
            entries.insert("editor".into(), editor.clone());
            entries.insert("text-editor".into(), editor.clone());
            entries.insert("gedit".into(), editor.clone());
            entries.insert("notepad".into(), editor);
            entries.insert("code".into(), UtilitySpec::new("code", &["."]));
        }

        Self { entries }
    }

    /// Find the utility a spoken name refers to
    ///
    /// Filler words are dropped and the rest joined with `-`, so
    /// "the text editor" looks up `text-editor`. Anything not in the table
    /// is `None`.
    pub fn lookup(&self, spoken: &str) -> Option<&UtilitySpec> {
        let lowered = spoken.to_lowercase();
        let words: Vec<&str> = lowered
            .split_whitespace()
            .filter(|w| !NAME_FILLER.contains(w))
            .collect();
        if words.is_empty() {
            return None;
        }
        self.entries.get(&words.join("-"))
    }

    /// Allowed names in sorted order, for help text
    pub fn names(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }
}

impl Default for AllowList {
    fn default() -> Self {
        Self::platform_default()
    }
}

/// Starts an allow-listed program on the host
pub trait Launcher {
    fn launch(&self, utility: &UtilitySpec, working_dir: &Path) -> io::Result<()>;
}

/// Spawns the program directly (no shell) and does not wait for it
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessLauncher;

impl Launcher for ProcessLauncher {
    fn launch(&self, utility: &UtilitySpec, working_dir: &Path) -> io::Result<()> {
        let child = Command::new(&utility.program)
            .args(&utility.args)
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        tracing::debug!("Started {} (pid {})", utility.program, child.id());
        Ok(())
    }
}
