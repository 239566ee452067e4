//! Normalized path handling for cross-platform compatibility

use std::path::{Path, PathBuf};

/// A path normalized to use forward slashes internally.
///
/// Provides consistent path handling across platforms by normalizing
/// all paths to forward slashes internally and converting to
/// platform-native format only at I/O boundaries.
///
/// Dot segments are resolved on construction. A leading `..` on a relative
/// path is dropped, so a relative path can never climb above its base.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NormalizedPath {
    /// Internal representation always uses forward slashes
    inner: String,
}

impl NormalizedPath {
    /// Create a new NormalizedPath from any path-like input.
    ///
    /// Converts backslashes to forward slashes and resolves `.` and `..`.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path_str = path.as_ref().to_string_lossy();
        Self {
            inner: clean(&path_str.replace('\\', "/")),
        }
    }

    /// Get the internal normalized string representation.
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Convert to a platform-native PathBuf for I/O operations.
    pub fn to_native(&self) -> PathBuf {
        PathBuf::from(&self.inner)
    }

    /// Join this path with a segment.
    ///
    /// The result is cleaned, so `..` inside `segment` is resolved against
    /// this path. Use [`NormalizedPath::starts_with`] afterwards for
    /// boundary checks.
    pub fn join(&self, segment: &str) -> Self {
        let segment_normalized = segment.replace('\\', "/");
        let joined = if self.inner.is_empty() {
            segment_normalized
        } else if self.inner.ends_with('/') {
            format!("{}{}", self.inner, segment_normalized)
        } else {
            format!("{}/{}", self.inner, segment_normalized)
        };
        Self {
            inner: clean(&joined),
        }
    }

    /// Get the parent directory.
    pub fn parent(&self) -> Option<Self> {
        let trimmed = self.inner.trim_end_matches('/');
        match trimmed.rfind('/') {
            Some(idx) if idx > 0 => Some(Self {
                inner: trimmed[..idx].to_string(),
            }),
            Some(0) if trimmed.len() > 1 => Some(Self {
                inner: "/".to_string(),
            }),
            _ => None,
        }
    }

    /// Get the file name component.
    pub fn file_name(&self) -> Option<&str> {
        let trimmed = self.inner.trim_end_matches('/');
        trimmed.rsplit('/').next().filter(|name| !name.is_empty())
    }

    /// Get the extension if present.
    pub fn extension(&self) -> Option<&str> {
        self.file_name().and_then(|name| {
            let idx = name.rfind('.')?;
            if idx == 0 {
                None
            } else {
                Some(&name[idx + 1..])
            }
        })
    }

    /// Whether this path is absolute (starts with `/` or a drive letter).
    pub fn is_absolute(&self) -> bool {
        self.inner.starts_with('/') || has_drive_prefix(&self.inner)
    }

    /// Component-wise prefix check.
    ///
    /// `/repo/inbox` starts with `/repo` but `/repository` does not.
    pub fn starts_with(&self, base: &NormalizedPath) -> bool {
        self.strip_prefix(base).is_some()
    }

    /// Express this path relative to `base`.
    ///
    /// Returns `None` when the path does not live under `base`. Returns an
    /// empty string when both paths are equal.
    pub fn strip_prefix(&self, base: &NormalizedPath) -> Option<&str> {
        if base.inner == "/" {
            return self.inner.strip_prefix('/');
        }
        let base = base.inner.trim_end_matches('/');
        if base.is_empty() || base == "." {
            return if self.is_absolute() { None } else { Some(&self.inner) };
        }
        let rest = self.inner.strip_prefix(base)?;
        if rest.is_empty() {
            Some(rest)
        } else {
            rest.strip_prefix('/')
        }
    }

    /// Check if this path exists on the filesystem.
    pub fn exists(&self) -> bool {
        self.to_native().exists()
    }

    /// Check if this is a directory.
    pub fn is_dir(&self) -> bool {
        self.to_native().is_dir()
    }

    /// Check if this is a file.
    pub fn is_file(&self) -> bool {
        self.to_native().is_file()
    }
}

/// Resolve `.`, `..` and duplicate separators in a forward-slash path.
fn clean(path: &str) -> String {
    if path.is_empty() {
        return String::new();
    }

    let (prefix, rest) = if let Some(rest) = path.strip_prefix("//") {
        if rest.starts_with('/') {
            ("/", rest.trim_start_matches('/'))
        } else {
            ("//", rest)
        }
    } else if let Some(rest) = path.strip_prefix('/') {
        ("/", rest)
    } else {
        ("", path)
    };

    let mut parts: Vec<&str> = Vec::new();
    for component in rest.split('/') {
        match component {
            "" | "." => {}
            ".." => {
                // Drive letters anchor the path the same way "/" does.
                if parts.last().is_some_and(|last| !is_drive(last)) {
                    parts.pop();
                }
            }
            other => parts.push(other),
        }
    }

    let body = parts.join("/");
    if prefix.is_empty() && body.is_empty() {
        ".".to_string()
    } else {
        format!("{prefix}{body}")
    }
}

fn is_drive(component: &str) -> bool {
    let bytes = component.as_bytes();
    bytes.len() == 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

fn has_drive_prefix(path: &str) -> bool {
    path.split('/').next().is_some_and(is_drive)
}

/// Reduce a caller-supplied filename to a single safe path component.
///
/// Only the final component survives; directory parts, empty names and
/// dot names collapse to `fallback`.
pub fn sanitize_file_name(name: &str, fallback: &str) -> String {
    let normalized = name.replace('\\', "/");
    let base = normalized
        .rsplit('/')
        .next()
        .map(str::trim)
        .unwrap_or_default();
    match base {
        "" | "." | ".." => fallback.to_string(),
        other => other.to_string(),
    }
}

impl AsRef<Path> for NormalizedPath {
    fn as_ref(&self) -> &Path {
        Path::new(&self.inner)
    }
}

impl std::fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl From<&str> for NormalizedPath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for NormalizedPath {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<PathBuf> for NormalizedPath {
    fn from(p: PathBuf) -> Self {
        Self::new(p)
    }
}

impl From<&Path> for NormalizedPath {
    fn from(p: &Path) -> Self {
        Self::new(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_keeps_single_dot_for_empty_relative() {
        assert_eq!(NormalizedPath::new("a/..").as_str(), ".");
    }

    #[test]
    fn parent_of_root_child_is_root() {
        let path = NormalizedPath::new("/inbox");
        assert_eq!(path.parent().unwrap().as_str(), "/");
        assert!(NormalizedPath::new("/").parent().is_none());
    }

    #[test]
    fn strip_prefix_respects_component_boundaries() {
        let root = NormalizedPath::new("/data/repo");
        assert_eq!(
            NormalizedPath::new("/data/repo/inbox/a.jpg").strip_prefix(&root),
            Some("inbox/a.jpg")
        );
        assert_eq!(NormalizedPath::new("/data/repo").strip_prefix(&root), Some(""));
        assert_eq!(NormalizedPath::new("/data/repository").strip_prefix(&root), None);
    }

    #[test]
    fn windows_drive_is_not_popped() {
        let path = NormalizedPath::new("C:\\photos\\..\\..\\x.jpg");
        assert_eq!(path.as_str(), "C:/x.jpg");
        assert!(path.is_absolute());
    }

    #[test]
    fn sanitize_takes_last_component() {
        assert_eq!(sanitize_file_name("../../etc/passwd", "upload"), "passwd");
        assert_eq!(sanitize_file_name("C:\\Users\\me\\IMG_1.JPG", "upload"), "IMG_1.JPG");
        assert_eq!(sanitize_file_name("..", "upload"), "upload");
        assert_eq!(sanitize_file_name("dir/", "upload"), "upload");
    }
}
