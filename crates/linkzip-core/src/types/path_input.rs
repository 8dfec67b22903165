//! Caller-supplied path input.

use std::path::Path;
use std::path::PathBuf;

/// A path as handed to a public operation: either raw text or a structured
/// filesystem path.
///
/// Every public operation accepts `impl Into<PathInput>` and normalizes it to
/// a single [`PathBuf`] on entry, so callers can pass `&str`, `String`,
/// `&Path` or `PathBuf` interchangeably.
///
/// # Examples
///
/// ```
/// use linkzip_core::types::PathInput;
/// use std::path::Path;
///
/// let raw = PathInput::from("a/b/c");
/// let structured = PathInput::from(Path::new("a/b/c"));
/// assert_eq!(raw.as_path(), structured.as_path());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathInput {
    /// Raw string path.
    Raw(String),
    /// Structured filesystem path.
    Structured(PathBuf),
}

impl PathInput {
    /// Borrows the input as a filesystem path.
    #[must_use]
    pub fn as_path(&self) -> &Path {
        match self {
            Self::Raw(raw) => Path::new(raw),
            Self::Structured(path) => path,
        }
    }

    /// Converts the input into its canonical owned representation.
    #[must_use]
    pub fn into_path_buf(self) -> PathBuf {
        match self {
            Self::Raw(raw) => PathBuf::from(raw),
            Self::Structured(path) => path,
        }
    }
}

impl From<&str> for PathInput {
    fn from(value: &str) -> Self {
        Self::Raw(value.to_owned())
    }
}

impl From<String> for PathInput {
    fn from(value: String) -> Self {
        Self::Raw(value)
    }
}

impl From<&String> for PathInput {
    fn from(value: &String) -> Self {
        Self::Raw(value.clone())
    }
}

impl From<&Path> for PathInput {
    fn from(value: &Path) -> Self {
        Self::Structured(value.to_path_buf())
    }
}

impl From<PathBuf> for PathInput {
    fn from(value: PathBuf) -> Self {
        Self::Structured(value)
    }
}

impl From<&PathBuf> for PathInput {
    fn from(value: &PathBuf) -> Self {
        Self::Structured(value.clone())
    }
}

impl AsRef<Path> for PathInput {
    fn as_ref(&self) -> &Path {
        self.as_path()
    }
}
