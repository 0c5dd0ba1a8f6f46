//! Session state owned by the single execution loop

pub mod history;
pub mod state;

pub use history::{HistoryEntry, LogRecord};
pub use state::SessionState;
