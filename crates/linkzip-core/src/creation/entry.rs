//! Archive entry construction.
//!
//! Each classified object maps to exactly one entry kind:
//!
//! | Object    | Entry                                  | Payload          |
//! |-----------|----------------------------------------|------------------|
//! | Directory | [`EntryKind::DirectoryMarker`], `name/` | empty            |
//! | Symlink   | [`EntryKind::Symlink`]                 | link target text |
//! | File      | [`EntryKind::File`]                    | file content     |
//!
//! Symlinks carry `(S_IFLNK | permissions) << 16` in the ZIP external
//! attributes field, which is where Unix-aware readers look for the file type.

use crate::ArchiveError;
use crate::Result;
use crate::creation::classify::FsObject;
use crate::creation::classify::ObjectKind;
use crate::creation::config::CreationConfig;
use crate::types::ArchivePath;
use std::fmt;
use std::fs;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::path::PathBuf;

/// Unix file-type bits for a symbolic link (`S_IFLNK`, `0xA000`).
pub const S_IFLNK: u32 = 0o120_000;

/// Unix file-type bits for a directory (`S_IFDIR`).
pub const S_IFDIR: u32 = 0o040_000;

/// Unix file-type bits for a regular file (`S_IFREG`).
pub const S_IFREG: u32 = 0o100_000;

/// Mask selecting the file-type bits of a Unix mode.
pub const S_IFMT: u32 = 0o170_000;

/// Permission bits written for directory markers.
pub const DIRECTORY_PERMISSIONS: u32 = 0o755;

/// A single entry ready to be committed to an archive.
#[derive(Debug)]
pub struct ArchiveEntry {
    path: ArchivePath,
    kind: EntryKind,
}

/// Kind and payload of an [`ArchiveEntry`].
#[derive(Debug)]
pub enum EntryKind {
    /// Directory marker with an empty payload.
    DirectoryMarker,

    /// Symbolic link whose payload is the target text.
    Symlink {
        /// Unresolved link target.
        target: String,
        /// Permission bits, at most `0o777`.
        permissions: u32,
    },

    /// Regular file whose payload is streamed from `source`.
    File {
        /// Content source.
        source: FileSource,
        /// Permission bits to record, if any.
        permissions: Option<u32>,
    },
}

/// Where a file entry's content comes from.
pub enum FileSource {
    /// An open regular file.
    Disk {
        /// Path the file was opened from.
        path: PathBuf,
        /// The open handle.
        file: File,
    },
    /// An in-memory buffer.
    Memory(std::io::Cursor<Vec<u8>>),
    /// Any other byte stream, read once while committing.
    Reader(Box<dyn Read + Send>),
}

impl fmt::Debug for FileSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disk { path, .. } => f.debug_struct("Disk").field("path", path).finish(),
            Self::Memory(cursor) => f.debug_tuple("Memory").field(&cursor.get_ref().len()).finish(),
            Self::Reader(_) => f.write_str("Reader"),
        }
    }
}

impl Read for FileSource {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            Self::Disk { file, .. } => file.read(buf),
            Self::Memory(cursor) => cursor.read(buf),
            Self::Reader(reader) => reader.read(buf),
        }
    }
}

impl ArchiveEntry {
    /// Creates a directory marker. The name is forced to end with exactly one
    /// slash.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPath` if the name is empty.
    pub fn directory(path: ArchivePath) -> Result<Self> {
        if path.is_empty() {
            return Err(empty_name());
        }
        Ok(Self {
            path: path.to_directory(),
            kind: EntryKind::DirectoryMarker,
        })
    }

    /// Creates a symlink entry that is not backed by a filesystem object.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPath` if the name is empty and `InvalidPermissions` if
    /// `permissions` exceeds `0o777`.
    pub fn symlink(path: ArchivePath, target: impl Into<String>, permissions: u32) -> Result<Self> {
        if path.is_empty() {
            return Err(empty_name());
        }
        if permissions > 0o777 {
            return Err(ArchiveError::InvalidPermissions { mode: permissions });
        }
        Ok(Self {
            path,
            kind: EntryKind::Symlink {
                target: target.into(),
                permissions,
            },
        })
    }

    /// Creates a file entry from an in-memory buffer.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPath` if the name is empty.
    pub fn bytes(path: ArchivePath, data: Vec<u8>, permissions: Option<u32>) -> Result<Self> {
        if path.is_empty() {
            return Err(empty_name());
        }
        Ok(Self {
            path,
            kind: EntryKind::File {
                source: FileSource::Memory(std::io::Cursor::new(data)),
                permissions,
            },
        })
    }

    /// Creates a file entry whose content is streamed from `reader` when the
    /// entry is committed.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPath` if the name is empty.
    pub fn reader(
        path: ArchivePath,
        reader: impl Read + Send + 'static,
        permissions: Option<u32>,
    ) -> Result<Self> {
        if path.is_empty() {
            return Err(empty_name());
        }
        Ok(Self {
            path,
            kind: EntryKind::File {
                source: FileSource::Reader(Box::new(reader)),
                permissions,
            },
        })
    }

    /// Opens `file_path` and creates a file entry streaming its content.
    ///
    /// The regular-file check follows symlinks and is repeated on the open
    /// handle; it is best-effort against concurrent changes to the tree.
    ///
    /// # Errors
    ///
    /// Returns `PathNotFound` if the file is missing, `NotARegularFile` if it
    /// is something else, and `InvalidPath` if the name is empty.
    pub fn file(path: ArchivePath, file_path: &Path, preserve_permissions: bool) -> Result<Self> {
        if path.is_empty() {
            return Err(empty_name());
        }

        let metadata = fs::metadata(file_path).map_err(|e| ArchiveError::from_io(file_path, e))?;
        if !metadata.is_file() {
            return Err(ArchiveError::NotARegularFile {
                path: file_path.to_path_buf(),
            });
        }

        let file = File::open(file_path).map_err(|e| ArchiveError::from_io(file_path, e))?;
        let metadata = file.metadata()?;
        if !metadata.is_file() {
            return Err(ArchiveError::NotARegularFile {
                path: file_path.to_path_buf(),
            });
        }

        let permissions = preserve_permissions.then(|| file_permissions(&metadata));

        Ok(Self {
            path,
            kind: EntryKind::File {
                source: FileSource::Disk {
                    path: file_path.to_path_buf(),
                    file,
                },
                permissions,
            },
        })
    }

    /// Returns the entry name.
    #[must_use]
    pub fn path(&self) -> &ArchivePath {
        &self.path
    }

    /// Returns the entry kind.
    #[must_use]
    pub fn kind(&self) -> &EntryKind {
        &self.kind
    }

    /// Returns the full Unix mode (type and permission bits) recorded for
    /// this entry, if any.
    #[must_use]
    pub fn unix_mode(&self) -> Option<u32> {
        match &self.kind {
            EntryKind::DirectoryMarker => Some(S_IFDIR | DIRECTORY_PERMISSIONS),
            EntryKind::Symlink { permissions, .. } => Some(S_IFLNK | permissions),
            EntryKind::File { permissions, .. } => permissions.map(|p| S_IFREG | p),
        }
    }

    /// Returns the value of the ZIP external attributes field: the Unix mode
    /// shifted into the upper 16 bits.
    ///
    /// # Examples
    ///
    /// ```
    /// use linkzip_core::creation::entry::ArchiveEntry;
    /// use linkzip_core::types::ArchivePath;
    ///
    /// let entry = ArchiveEntry::symlink(ArchivePath::from_name("link"), "target", 0o777)?;
    /// assert_eq!(entry.external_attributes(), 0xA1FF_0000);
    /// # Ok::<(), linkzip_core::ArchiveError>(())
    /// ```
    #[must_use]
    pub fn external_attributes(&self) -> u32 {
        self.unix_mode().map_or(0, |mode| mode << 16)
    }

    /// Returns the payload if it is known without reading from disk.
    #[must_use]
    pub fn payload(&self) -> Option<&[u8]> {
        match &self.kind {
            EntryKind::DirectoryMarker => Some(&[]),
            EntryKind::Symlink { target, .. } => Some(target.as_bytes()),
            EntryKind::File {
                source: FileSource::Memory(cursor),
                ..
            } => Some(cursor.get_ref()),
            EntryKind::File {
                source: FileSource::Disk { .. } | FileSource::Reader(_),
                ..
            } => None,
        }
    }

    pub(crate) fn into_parts(self) -> (ArchivePath, EntryKind) {
        (self.path, self.kind)
    }
}

/// Builds the entry for a classified filesystem object.
///
/// # Examples
///
/// ```no_run
/// use linkzip_core::creation::CreationConfig;
/// use linkzip_core::creation::classify::classify;
/// use linkzip_core::creation::entry::build_entry;
/// use linkzip_core::types::ArchivePath;
///
/// let object = classify("docs")?;
/// let entry = build_entry(&object, ArchivePath::from_name("docs"), &CreationConfig::default())?;
/// assert_eq!(entry.path().as_str(), "docs/");
/// # Ok::<(), linkzip_core::ArchiveError>(())
/// ```
///
/// # Errors
///
/// Returns `InvalidPath` for an empty name or a non-UTF-8 symlink target,
/// and the errors of [`ArchiveEntry::file`] for regular files.
pub fn build_entry(
    object: &FsObject,
    archive_path: ArchivePath,
    config: &CreationConfig,
) -> Result<ArchiveEntry> {
    match &object.kind {
        ObjectKind::Directory => ArchiveEntry::directory(archive_path),
        ObjectKind::Symlink {
            target,
            permissions,
        } => {
            let target = target.to_str().ok_or_else(|| {
                ArchiveError::invalid_path(&object.path, "symlink target is not valid UTF-8")
            })?;
            ArchiveEntry::symlink(archive_path, target, *permissions)
        }
        ObjectKind::File => {
            ArchiveEntry::file(archive_path, &object.path, config.preserve_permissions)
        }
    }
}

fn empty_name() -> ArchiveError {
    ArchiveError::invalid_path("", "archive path is empty")
}

#[cfg(unix)]
fn file_permissions(metadata: &fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o777
}

#[cfg(not(unix))]
fn file_permissions(metadata: &fs::Metadata) -> u32 {
    if metadata.permissions().readonly() {
        0o444
    } else {
        0o644
    }
}
