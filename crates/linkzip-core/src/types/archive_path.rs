//! Normalized entry names inside an archive.

use crate::ArchiveError;
use crate::Result;
use crate::types::PathInput;
use std::fmt;
use std::path::Component;
use std::path::Path;

/// A normalized, forward-slash separated, relative entry name.
///
/// Directory entries carry exactly one trailing slash. Apart from separator
/// and root handling the text is opaque: no escaping or `..` resolution is
/// applied.
///
/// # Examples
///
/// ```
/// use linkzip_core::types::ArchivePath;
/// use std::path::Path;
///
/// let path = ArchivePath::from_path(Path::new("/tmp/./data/file.txt"))?;
/// assert_eq!(path.as_str(), "tmp/data/file.txt");
///
/// let dir = ArchivePath::from_name("a/b//").to_directory();
/// assert_eq!(dir.as_str(), "a/b/");
/// # Ok::<(), linkzip_core::ArchiveError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArchivePath(String);

impl ArchivePath {
    /// Builds an archive path from a filesystem path.
    ///
    /// Root and prefix components and `.` components are dropped, so absolute
    /// paths become relative. Trailing separators are not kept; use
    /// [`ArchivePath::to_directory`] for directory names.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPath` if a component is not valid UTF-8.
    pub fn from_path(path: &Path) -> Result<Self> {
        let mut parts: Vec<&str> = Vec::new();
        for component in path.components() {
            match component {
                Component::Prefix(_) | Component::RootDir | Component::CurDir => {}
                Component::ParentDir => parts.push(".."),
                Component::Normal(name) => {
                    let name = name.to_str().ok_or_else(|| {
                        ArchiveError::invalid_path(path, "path is not valid UTF-8")
                    })?;
                    parts.push(name);
                }
            }
        }
        Ok(Self(parts.join("/")))
    }

    /// Builds an archive path from an entry name, such as caller input or a
    /// name read back from another archive.
    ///
    /// Empty and `.` segments are dropped, so leading slashes, `./` prefixes
    /// and doubled separators all collapse. `..` is kept. A trailing slash
    /// survives as the directory marker unless nothing else is left.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        #[cfg(windows)]
        let name = &name.replace('\\', "/");

        let parts: Vec<&str> = name
            .split('/')
            .filter(|part| !part.is_empty() && *part != ".")
            .collect();
        let mut joined = parts.join("/");
        if !joined.is_empty() && name.ends_with('/') {
            joined.push('/');
        }
        Self(joined)
    }

    /// Normalizes caller input.
    ///
    /// Raw strings are treated as entry names and keep a trailing slash;
    /// structured paths go through [`ArchivePath::from_path`].
    pub fn from_input(input: PathInput) -> Result<Self> {
        match input {
            PathInput::Raw(raw) => Ok(Self::from_name(&raw)),
            PathInput::Structured(path) => Self::from_path(&path),
        }
    }

    /// Returns this path with exactly one trailing slash.
    #[must_use]
    pub fn to_directory(&self) -> Self {
        let trimmed = self.0.trim_end_matches('/');
        Self(format!("{trimmed}/"))
    }

    /// Returns `true` if the name ends with a slash.
    #[must_use]
    pub fn is_directory(&self) -> bool {
        self.0.ends_with('/')
    }

    /// Returns `true` if the name has no content besides slashes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.trim_matches('/').is_empty()
    }

    /// Returns the entry name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the path and returns the entry name.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ArchivePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ArchivePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
