//! Filesystem object classification.
//!
//! Classification never follows symlinks: a link to a directory is a
//! [`ObjectKind::Symlink`], not a [`ObjectKind::Directory`].

use crate::ArchiveError;
use crate::Result;
use crate::types::PathInput;
use std::fs;
use std::fs::Metadata;
use std::path::Path;
use std::path::PathBuf;

/// A filesystem object with its classified kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FsObject {
    /// Filesystem path of the object, as listed or given.
    pub path: PathBuf,

    /// Kind of the object itself.
    pub kind: ObjectKind,
}

/// Kind of a filesystem object, determined by its own link status.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    /// Regular file.
    File,

    /// Directory.
    Directory,

    /// Symbolic link.
    Symlink {
        /// Unresolved link target, exactly as stored in the link.
        target: PathBuf,
        /// The link's own permission bits (`mode & 0o777`).
        permissions: u32,
    },
}

impl FsObject {
    /// Returns `true` for a regular file.
    #[must_use]
    pub fn is_file(&self) -> bool {
        self.kind == ObjectKind::File
    }

    /// Returns `true` for a directory that is not a symlink.
    #[must_use]
    pub fn is_dir(&self) -> bool {
        self.kind == ObjectKind::Directory
    }

    /// Returns `true` for a symbolic link.
    #[must_use]
    pub fn is_symlink(&self) -> bool {
        matches!(self.kind, ObjectKind::Symlink { .. })
    }
}

/// Classifies a path without following it if it is a symlink.
///
/// # Examples
///
/// ```no_run
/// use linkzip_core::creation::classify::classify;
/// use linkzip_core::creation::classify::ObjectKind;
///
/// let object = classify("/usr/bin")?;
/// assert_eq!(object.kind, ObjectKind::Directory);
/// # Ok::<(), linkzip_core::ArchiveError>(())
/// ```
///
/// # Errors
///
/// Returns `InvalidPath` if the path does not exist or is a device, socket,
/// FIFO, or other unsupported object. Other metadata failures are returned as
/// `Io`.
pub fn classify(path: impl Into<PathInput>) -> Result<FsObject> {
    let path = path.into().into_path_buf();
    let metadata = match fs::symlink_metadata(&path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ArchiveError::invalid_path(&path, "path does not exist"));
        }
        Err(e) => return Err(e.into()),
    };

    let file_type = metadata.file_type();
    let kind = if file_type.is_symlink() {
        symlink_kind(&path, &metadata)?
    } else if file_type.is_file() {
        ObjectKind::File
    } else if file_type.is_dir() {
        ObjectKind::Directory
    } else {
        return Err(unsupported(&path));
    };

    Ok(FsObject { path, kind })
}

/// Reads the target and permission bits of a symlink whose link metadata is
/// already known.
pub(crate) fn symlink_kind(path: &Path, metadata: &Metadata) -> Result<ObjectKind> {
    let target = fs::read_link(path).map_err(|e| ArchiveError::from_io(path, e))?;
    Ok(ObjectKind::Symlink {
        target,
        permissions: link_permissions(metadata),
    })
}

pub(crate) fn unsupported(path: &Path) -> ArchiveError {
    ArchiveError::invalid_path(path, "not a regular file, directory, or symlink")
}

#[cfg(unix)]
fn link_permissions(metadata: &Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o777
}

#[cfg(not(unix))]
fn link_permissions(_metadata: &Metadata) -> u32 {
    crate::creation::config::DEFAULT_SYMLINK_PERMISSIONS
}
