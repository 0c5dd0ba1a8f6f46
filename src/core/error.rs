use thiserror::Error;

/// Process-level failures: start-up, configuration and collaborator I/O.
///
/// Nothing a user can trigger by speaking a command ends up here; those
/// become `Outcome::Failure` values instead.
#[derive(Error, Debug)]
pub enum ShellError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Sandbox error: {0}")]
    Sandbox(String),

    #[error("Malformed command: {intent} expects {expected} argument(s), got {actual}")]
    Arity {
        intent: String,
        expected: usize,
        actual: usize,
    },
}

pub type Result<T> = std::result::Result<T, ShellError>;

/// A path expression could not be mapped to a location inside the sandbox.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContainmentError {
    #[error("the path is empty")]
    Empty,

    #[error("the path contains a character that is not allowed in file names: {ch:?}")]
    InvalidCharacter { ch: char },

    #[error("host paths like '{0}' are not allowed")]
    AbsoluteHostPath(String),

    #[error("'{0}' would leave the sandbox")]
    EscapesRoot(String),

    #[error("'{0}' leads through a link that points outside the sandbox")]
    SymlinkEscape(String),

    #[error("'{0}' leads through a link that cannot be resolved")]
    UnresolvableLink(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NavigationError {
    #[error(transparent)]
    Containment(#[from] ContainmentError),

    #[error("there is no folder called '{0}'")]
    NotFound(String),

    #[error("'{0}' is not a folder")]
    NotADirectory(String),

    #[error("already at the top of the sandbox")]
    AtRoot,
}
