//! Voice Shell - Entry Point
//!
//! Loads configuration, opens the sandbox and runs the single-threaded
//! read/parse/execute loop over stdin.

use clap::Parser;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use voice_shell::core::config::{InputMode, ShellConfig};
use voice_shell::core::error::Result;
use voice_shell::shell::{ConsoleSpeaker, InputSource, Shell, Speaker, TextInput};

#[derive(Parser, Debug)]
#[command(name = "vsh")]
#[command(about = "A sandboxed file shell driven by natural language")]
struct Args {
    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Sandbox directory (created if missing)
    #[arg(long)]
    sandbox: Option<PathBuf>,

    /// Print replies only, never speak them
    #[arg(long)]
    no_tts: bool,

    /// Read typed commands
    #[arg(long, conflicts_with = "voice")]
    text: bool,

    /// Read transcribed speech
    #[arg(long)]
    voice: bool,

    /// Append the audit log to this file
    #[arg(long, conflicts_with = "no_log")]
    log_file: Option<PathBuf>,

    /// Do not write an audit log
    #[arg(long)]
    no_log: bool,

    /// Number of commands kept in history
    #[arg(long)]
    history_capacity: Option<usize>,
}

impl Args {
    /// Layer command line flags over the file configuration
    fn apply(&self, config: &mut ShellConfig) {
        if let Some(sandbox) = &self.sandbox {
            config.sandbox_root = sandbox.clone();
        }
        if self.no_tts {
            config.tts = false;
        }
        if self.text {
            config.input_mode = InputMode::Text;
        }
        if self.voice {
            config.input_mode = InputMode::Voice;
        }
        if let Some(path) = &self.log_file {
            config.log_file = Some(path.clone());
        }
        if self.no_log {
            config.log_file = None;
        }
        if let Some(capacity) = self.history_capacity {
            config.history_capacity = capacity;
        }
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "voice_shell=info".into()),
    );

    // stdout belongs to the conversation
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing();

    let mut config = match &args.config {
        Some(path) => ShellConfig::load(path)?,
        None => ShellConfig::default(),
    };
    args.apply(&mut config);
    config.validate()?;

    if config.input_mode == InputMode::Voice {
        tracing::warn!("No speech recognizer is available; reading typed commands instead");
    }
    if config.tts {
        tracing::info!("Speech output is not available; replies are printed");
    }

    let mut shell = Shell::from_config(&config)?;
    let mut input = TextInput::stdin();
    let mut speaker = ConsoleSpeaker::stdout();

    tracing::info!("Voice shell starting");
    println!("\n=== VOICE SHELL ===");
    println!("Say \"help\" to hear what I can do, \"exit\" to leave.");
    println!();

    loop {
        print!("{}> ", shell.state().display_cwd());
        io::stdout().flush()?;

        let Some(utterance) = input.next_utterance() else {
            println!();
            break;
        };

        let reply = shell.handle(utterance);
        speaker.deliver(&reply)?;
        if reply.exit {
            break;
        }
    }

    tracing::info!("Voice shell stopped");
    Ok(())
}
