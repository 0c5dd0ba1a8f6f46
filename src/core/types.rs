//! Path types shared by the parser, resolver, session and executor
//!
//! A `PathExpr` is whatever the user said. It only becomes an `AbsolutePath`
//! by passing through `command::resolver::resolve`, which is the one place
//! that constructs `AbsolutePath` and `RelativePath` values from user input.

use crate::core::error::{Result, ShellError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// The directory outside of which no file operation may take effect
///
/// Always absolute and canonical, so symlinked parents of the sandbox are
/// already resolved and containment checks can compare real paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxRoot(PathBuf);

impl SandboxRoot {
    /// Open the sandbox directory, creating it if it does not exist yet
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            std::fs::create_dir_all(path)?;
            tracing::info!("Created sandbox directory {}", path.display());
        }
        let canonical = path.canonicalize()?;
        if !canonical.is_dir() {
            return Err(ShellError::Sandbox(format!(
                "{} exists but is not a directory",
                path.display()
            )));
        }
        Ok(Self(canonical))
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    /// Absolute location of an already validated relative path
    pub fn join(&self, rel: &RelativePath) -> AbsolutePath {
        let mut full = self.0.clone();
        for segment in rel.segments() {
            full.push(segment);
        }
        AbsolutePath {
            full,
            rel: rel.clone(),
        }
    }
}

/// An unvalidated path exactly as the user phrased it
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PathExpr(String);

impl PathExpr {
    pub fn new(expr: impl Into<String>) -> Self {
        Self(expr.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// A bare name has no separators and is not `.` or `..`
    pub fn is_bare_name(&self) -> bool {
        let s = self.0.trim();
        !s.is_empty() && !s.contains(['/', '\\']) && s != "." && s != ".."
    }
}

impl fmt::Display for PathExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PathExpr {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Location below the sandbox root, as normalized path segments
///
/// Never contains `.`, `..`, empty segments or separators.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct RelativePath(Vec<String>);

impl RelativePath {
    /// The sandbox root itself
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub(crate) fn from_segments(segments: Vec<String>) -> Self {
        Self(segments)
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// Last segment, or `None` at the root
    pub fn name(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    /// The containing directory, or `None` at the root
    pub fn parent(&self) -> Option<RelativePath> {
        let (_, rest) = self.0.split_last()?;
        Some(Self(rest.to_vec()))
    }

    /// True when `self` equals `other` or lies underneath it
    pub fn starts_with(&self, other: &RelativePath) -> bool {
        self.0.len() >= other.0.len() && self.0[..other.0.len()] == other.0[..]
    }
}

impl fmt::Display for RelativePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("/");
        }
        for segment in &self.0 {
            write!(f, "/{}", segment)?;
        }
        Ok(())
    }
}

/// A path proven to lie inside the sandbox
///
/// Carries its sandbox-relative form so messages never have to show the
/// host layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbsolutePath {
    full: PathBuf,
    rel: RelativePath,
}

impl AbsolutePath {
    pub fn as_path(&self) -> &Path {
        &self.full
    }

    pub fn relative(&self) -> &RelativePath {
        &self.rel
    }

    /// Entry name for messages; the root displays as "/"
    pub fn name(&self) -> &str {
        self.rel.name().unwrap_or("/")
    }

    pub fn is_root(&self) -> bool {
        self.rel.is_root()
    }
}

impl AsRef<Path> for AbsolutePath {
    fn as_ref(&self) -> &Path {
        &self.full
    }
}

impl fmt::Display for AbsolutePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.rel.fmt(f)
    }
}
