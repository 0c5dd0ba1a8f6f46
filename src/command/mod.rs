//! Command pipeline
//!
//! Command -> resolver (PathExpr -> AbsolutePath) -> executor -> Outcome

pub mod executor;
pub mod intent;
pub mod launcher;
pub mod outcome;
pub mod resolver;

pub use executor::CommandExecutor;
pub use intent::{Command, Intent};
pub use launcher::{AllowList, Launcher, ProcessLauncher, UtilitySpec};
pub use outcome::{EntryKind, FailureKind, FolderStats, ListingEntry, Outcome, OutcomeData};
pub use resolver::resolve;
