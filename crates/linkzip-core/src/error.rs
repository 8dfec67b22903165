//! Error types for archive creation operations.

use std::path::Path;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using `ArchiveError`.
pub type Result<T> = std::result::Result<T, ArchiveError>;

/// Errors that can occur while building an archive.
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A root or referenced path does not exist.
    #[error("path does not exist: {path}")]
    PathNotFound {
        /// The missing path.
        path: PathBuf,
    },

    /// Path is neither a regular file, a directory, nor a symlink, or cannot
    /// be represented as an archive path.
    #[error("invalid path {path}: {reason}")]
    InvalidPath {
        /// The offending path.
        path: PathBuf,
        /// Why the path was rejected.
        reason: String,
    },

    /// A path expected to be a regular file was something else at build
    /// time.
    #[error("not a regular file: {path}")]
    NotARegularFile {
        /// The offending path.
        path: PathBuf,
    },

    /// An entry with the same archive path was already committed.
    #[error("{name} already exists in archive")]
    DuplicateEntry {
        /// The colliding archive path.
        name: String,
    },

    /// An input archive is unreadable, or the archive writer rejected an
    /// entry.
    #[error("invalid archive: {0}")]
    InvalidArchive(String),

    /// The session was already closed.
    #[error("archive session is closed")]
    ArchiveClosed,

    /// Compression level is out of range.
    #[error("invalid compression level {level}: must be 0-9")]
    InvalidCompressionLevel {
        /// The rejected level.
        level: u8,
    },

    /// Permission bits do not fit in 9 bits.
    #[error("invalid permissions {mode:#o}: must be at most 0o777")]
    InvalidPermissions {
        /// The rejected mode.
        mode: u32,
    },
}

impl ArchiveError {
    /// Returns `true` if this error is an archive path collision.
    ///
    /// # Examples
    ///
    /// ```
    /// use linkzip_core::ArchiveError;
    ///
    /// let err = ArchiveError::DuplicateEntry {
    ///     name: "f.bin".to_string(),
    /// };
    /// assert!(err.is_duplicate());
    /// assert!(!ArchiveError::ArchiveClosed.is_duplicate());
    /// ```
    #[must_use]
    pub const fn is_duplicate(&self) -> bool {
        matches!(self, Self::DuplicateEntry { .. })
    }

    /// Returns the filesystem path this error refers to, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::PathNotFound { path }
            | Self::InvalidPath { path, .. }
            | Self::NotARegularFile { path } => Some(path),
            _ => None,
        }
    }

    pub(crate) fn invalid_path(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Maps an I/O error on `path`, turning `NotFound` into `PathNotFound`.
    pub(crate) fn from_io(path: &Path, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            Self::PathNotFound {
                path: path.to_path_buf(),
            }
        } else {
            Self::Io(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ArchiveError::DuplicateEntry {
            name: "a/b/".to_string(),
        };
        assert_eq!(err.to_string(), "a/b/ already exists in archive");

        let err = ArchiveError::PathNotFound {
            path: PathBuf::from("/missing"),
        };
        assert_eq!(err.to_string(), "path does not exist: /missing");
    }

    #[test]
    fn test_invalid_permissions_display_is_octal() {
        let err = ArchiveError::InvalidPermissions { mode: 0o1777 };
        assert_eq!(
            err.to_string(),
            "invalid permissions 0o1777: must be at most 0o777"
        );
    }

    #[test]
    fn test_path_accessor() {
        let err = ArchiveError::NotARegularFile {
            path: PathBuf::from("dir"),
        };
        assert_eq!(err.path(), Some(Path::new("dir")));
        assert_eq!(ArchiveError::ArchiveClosed.path(), None);
    }

    #[test]
    fn test_from_io_maps_not_found() {
        let err = ArchiveError::from_io(
            Path::new("gone.txt"),
            std::io::Error::from(std::io::ErrorKind::NotFound),
        );
        assert!(matches!(err, ArchiveError::PathNotFound { .. }));

        let err = ArchiveError::from_io(
            Path::new("locked.txt"),
            std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        );
        assert!(matches!(err, ArchiveError::Io(_)));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::other("boom");
        let err: ArchiveError = io_err.into();
        assert!(matches!(err, ArchiveError::Io(_)));
        assert!(err.to_string().contains("boom"));
    }
}
