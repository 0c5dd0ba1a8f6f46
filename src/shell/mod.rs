//! Shell driver and its collaborators

pub mod driver;
pub mod io;

pub use driver::{Reply, Shell};
pub use io::{ConsoleSpeaker, InputSource, JsonlLog, LogSink, MemoryLog, Speaker, TextInput, Utterance};
