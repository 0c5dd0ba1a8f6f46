//! Path resolution - maps user path expressions to locations inside the sandbox
//!
//! `resolve` is the only way to turn a `PathExpr` into an `AbsolutePath`.
//! It normalizes lexically (so `..` can never climb above the root) and then
//! checks the real location of whatever already exists on disk, which
//! catches symlinks that point out of the sandbox.

use crate::core::error::ContainmentError;
use crate::core::types::{AbsolutePath, PathExpr, RelativePath, SandboxRoot};
use std::fs;

#[cfg(windows)]
const FORBIDDEN_CHARS: &[char] = &['<', '>', ':', '"', '|', '?', '*'];
#[cfg(not(windows))]
const FORBIDDEN_CHARS: &[char] = &[];

/// Resolve `expr` relative to `cwd` inside `root`
///
/// A leading separator anchors the expression at the sandbox root, the same
/// way "where am i" reports locations. Performs read-only filesystem queries
/// only.
pub fn resolve(
    root: &SandboxRoot,
    cwd: &RelativePath,
    expr: &PathExpr,
) -> Result<AbsolutePath, ContainmentError> {
    let raw = expr.as_str().trim();
    if raw.is_empty() {
        return Err(ContainmentError::Empty);
    }
    if is_host_absolute(raw) {
        return Err(ContainmentError::AbsoluteHostPath(raw.to_string()));
    }
    if let Some(ch) = raw
        .chars()
        .find(|c| c.is_control() || FORBIDDEN_CHARS.contains(c))
    {
        return Err(ContainmentError::InvalidCharacter { ch });
    }

    let anchored = raw.starts_with(['/', '\\']);
    let mut stack: Vec<String> = if anchored {
        Vec::new()
    } else {
        cwd.segments().to_vec()
    };

    for segment in raw.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                if stack.pop().is_none() {
                    return Err(ContainmentError::EscapesRoot(raw.to_string()));
                }
            }
            name => stack.push(name.to_string()),
        }
    }

    let path = root.join(&RelativePath::from_segments(stack));
    check_real_location(root, &path, raw)?;
    Ok(path)
}

/// Drive letters and home shortcuts name host locations, not sandbox ones
fn is_host_absolute(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    let drive = bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':';
    let home = raw == "~" || raw.starts_with("~/") || raw.starts_with("~\\");
    drive || home
}

/// The deepest part of `path` that exists must really live under the root
fn check_real_location(
    root: &SandboxRoot,
    path: &AbsolutePath,
    raw: &str,
) -> Result<(), ContainmentError> {
    let mut ancestor = path.as_path().to_path_buf();
    loop {
        if fs::symlink_metadata(&ancestor).is_ok() {
            return match ancestor.canonicalize() {
                Ok(real) if real.starts_with(root.path()) => Ok(()),
                Ok(_) => {
                    tracing::warn!("Rejected '{}': link target outside sandbox", raw);
                    Err(ContainmentError::SymlinkEscape(raw.to_string()))
                }
                Err(_) => Err(ContainmentError::UnresolvableLink(raw.to_string())),
            };
        }
        if !ancestor.pop() {
            return Err(ContainmentError::UnresolvableLink(raw.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sandbox() -> (tempfile::TempDir, SandboxRoot) {
        let tmp = tempfile::tempdir().unwrap();
        let root = SandboxRoot::open(tmp.path()).unwrap();
        (tmp, root)
    }

    fn rel(segments: &[&str]) -> RelativePath {
        RelativePath::from_segments(segments.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_resolve_bare_name() {
        let (_tmp, root) = sandbox();
        let path = resolve(&root, &RelativePath::root(), &"notes.txt".into()).unwrap();
        assert_eq!(path.as_path(), root.path().join("notes.txt"));
        assert_eq!(path.to_string(), "/notes.txt");
    }

    #[test]
    fn test_resolve_against_cwd() {
        let (_tmp, root) = sandbox();
        std::fs::create_dir(root.path().join("docs")).unwrap();
        let path = resolve(&root, &rel(&["docs"]), &"a.txt".into()).unwrap();
        assert_eq!(path.relative(), &rel(&["docs", "a.txt"]));
    }

    #[test]
    fn test_dots_collapse() {
        let (_tmp, root) = sandbox();
        let path = resolve(&root, &rel(&["a", "b"]), &"./../c/./d/..".into()).unwrap();
        assert_eq!(path.relative(), &rel(&["a", "c"]));
    }

    #[test]
    fn test_parent_of_root_rejected() {
        let (_tmp, root) = sandbox();
        let result = resolve(&root, &RelativePath::root(), &"../../etc".into());
        assert_eq!(
            result,
            Err(ContainmentError::EscapesRoot("../../etc".to_string()))
        );
    }

    #[test]
    fn test_climb_back_to_root_allowed() {
        let (_tmp, root) = sandbox();
        let path = resolve(&root, &rel(&["a"]), &"..".into()).unwrap();
        assert!(path.is_root());
    }

    #[test]
    fn test_temporary_escape_rejected() {
        // Going above the root and back in still counts as escaping
        let (_tmp, root) = sandbox();
        let result = resolve(&root, &rel(&["a"]), &"../../a".into());
        assert!(matches!(result, Err(ContainmentError::EscapesRoot(_))));
    }

    #[test]
    fn test_leading_separator_anchors_at_root() {
        let (_tmp, root) = sandbox();
        let path = resolve(&root, &rel(&["a", "b"]), &"/etc/passwd".into()).unwrap();
        assert_eq!(path.relative(), &rel(&["etc", "passwd"]));
        assert!(path.as_path().starts_with(root.path()));
    }

    #[test]
    fn test_empty_and_whitespace_rejected() {
        let (_tmp, root) = sandbox();
        assert_eq!(
            resolve(&root, &RelativePath::root(), &"".into()),
            Err(ContainmentError::Empty)
        );
        assert_eq!(
            resolve(&root, &RelativePath::root(), &"   ".into()),
            Err(ContainmentError::Empty)
        );
    }

    #[test]
    fn test_control_characters_rejected() {
        let (_tmp, root) = sandbox();
        let result = resolve(&root, &RelativePath::root(), &"bad\0name".into());
        assert_eq!(result, Err(ContainmentError::InvalidCharacter { ch: '\0' }));
    }

    #[test]
    fn test_host_paths_rejected() {
        let (_tmp, root) = sandbox();
        for expr in ["C:\\Windows", "~/secrets", "~"] {
            let result = resolve(&root, &RelativePath::root(), &expr.into());
            assert!(matches!(result, Err(ContainmentError::AbsoluteHostPath(_))));
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_escape_rejected() {
        let (_tmp, root) = sandbox();
        let outside = tempfile::tempdir().unwrap();
        std::os::unix::fs::symlink(outside.path(), root.path().join("portal")).unwrap();

        let through = resolve(&root, &RelativePath::root(), &"portal/file.txt".into());
        assert!(matches!(through, Err(ContainmentError::SymlinkEscape(_))));

        let link_itself = resolve(&root, &RelativePath::root(), &"portal".into());
        assert!(matches!(link_itself, Err(ContainmentError::SymlinkEscape(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_inside_sandbox_allowed() {
        let (_tmp, root) = sandbox();
        std::fs::create_dir(root.path().join("real")).unwrap();
        std::os::unix::fs::symlink(root.path().join("real"), root.path().join("alias")).unwrap();

        let path = resolve(&root, &RelativePath::root(), &"alias/new.txt".into()).unwrap();
        assert_eq!(path.relative(), &rel(&["alias", "new.txt"]));
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_symlink_rejected() {
        let (_tmp, root) = sandbox();
        std::os::unix::fs::symlink("/definitely/not/here", root.path().join("ghost")).unwrap();
        let result = resolve(&root, &RelativePath::root(), &"ghost".into());
        assert!(matches!(result, Err(ContainmentError::UnresolvableLink(_))));
    }
}
