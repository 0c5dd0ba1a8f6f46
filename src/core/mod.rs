pub mod config;
pub mod error;
pub mod types;

pub use config::{InputMode, ShellConfig};
pub use error::{ContainmentError, NavigationError, Result, ShellError};
pub use types::{AbsolutePath, PathExpr, RelativePath, SandboxRoot};
