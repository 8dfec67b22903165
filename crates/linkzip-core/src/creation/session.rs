//! Archive sessions.
//!
//! An [`ArchiveSession`] owns one ZIP writer backed by an in-memory buffer.
//! Entries are committed one at a time; every name is checked against the
//! names already committed before anything is written. Closing finalizes the
//! central directory and, when a destination was configured, persists the
//! finished bytes through a temporary file in the destination's directory.

use crate::ArchiveError;
use crate::Result;
use crate::creation::classify::FsObject;
use crate::creation::classify::classify;
use crate::creation::config::CreationConfig;
use crate::creation::entry::ArchiveEntry;
use crate::creation::entry::DIRECTORY_PERMISSIONS;
use crate::creation::entry::EntryKind;
use crate::creation::entry::build_entry;
use crate::creation::report::CreationReport;
use crate::creation::walker::TreeLister;
use crate::types::ArchivePath;
use crate::types::PathInput;
use std::collections::HashSet;
use std::fmt;
use std::io::Cursor;
use std::io::Read;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use tempfile::NamedTempFile;
use tracing::debug;
use tracing::trace;
use tracing::warn;
use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// Result of the best-effort persist step of [`ArchiveSession::close`].
///
/// A failed persist is reported here instead of as an error so the caller
/// decides whether it is fatal.
#[derive(Debug)]
#[must_use]
pub enum PersistOutcome {
    /// No destination was configured; the archive lives only in memory.
    NotRequested,

    /// The archive was written to this path.
    Persisted(PathBuf),

    /// Writing the archive to its destination failed. The in-memory archive
    /// is still complete.
    Failed {
        /// The configured destination.
        path: PathBuf,
        /// The underlying failure.
        error: std::io::Error,
    },

    /// The session had already been closed; nothing was done.
    AlreadyClosed,
}

impl PersistOutcome {
    /// Returns `true` if persisting to the destination failed.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// Converts a failed persist into an error.
    pub fn into_result(self) -> Result<()> {
        match self {
            Self::Failed { error, .. } => Err(ArchiveError::Io(error)),
            _ => Ok(()),
        }
    }
}

enum SinkState {
    Writing(Box<ZipWriter<Cursor<Vec<u8>>>>),
    Finished(Vec<u8>),
    Failed,
}

/// An exclusively owned, in-progress ZIP archive.
///
/// # Examples
///
/// ```no_run
/// use linkzip_core::ArchiveSession;
///
/// let mut session = ArchiveSession::new().with_destination("out.zip");
/// session.add_tree("project")?;
/// session.add_symlink("latest", "project/v2")?;
/// session.add_bytes(b"built by ci\n".to_vec(), "BUILD_INFO")?;
/// session.close()?.into_result()?;
/// # Ok::<(), linkzip_core::ArchiveError>(())
/// ```
pub struct ArchiveSession {
    state: SinkState,
    names: HashSet<String>,
    order: Vec<String>,
    destination: Option<PathBuf>,
    config: CreationConfig,
    file_options: SimpleFileOptions,
    report: CreationReport,
    buffer: Vec<u8>,
}

impl ArchiveSession {
    /// Creates an in-memory session with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::from_valid_config(CreationConfig::default())
    }

    /// Creates an in-memory session with a custom configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration does not validate.
    pub fn with_config(config: CreationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_valid_config(config))
    }

    fn from_valid_config(config: CreationConfig) -> Self {
        Self {
            state: SinkState::Writing(Box::new(ZipWriter::new(Cursor::new(Vec::new())))),
            names: HashSet::new(),
            order: Vec::new(),
            destination: None,
            file_options: config.zip_options(),
            config,
            report: CreationReport::default(),
            buffer: vec![0u8; COPY_BUFFER_SIZE],
        }
    }

    /// Sets a destination path the archive is persisted to on close.
    #[must_use]
    pub fn with_destination(mut self, path: impl Into<PathInput>) -> Self {
        self.destination = Some(path.into().into_path_buf());
        self
    }

    /// Returns the configured destination, if any.
    #[must_use]
    pub fn destination(&self) -> Option<&Path> {
        self.destination.as_deref()
    }

    /// Returns the session configuration.
    #[must_use]
    pub fn config(&self) -> &CreationConfig {
        &self.config
    }

    /// Returns the counters for entries committed so far.
    #[must_use]
    pub fn report(&self) -> &CreationReport {
        &self.report
    }

    pub(crate) fn report_mut(&mut self) -> &mut CreationReport {
        &mut self.report
    }

    /// Returns the committed entry names in commit order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.order
    }

    /// Returns `true` if an entry with exactly this name was committed.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Returns the number of committed entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns `true` if nothing was committed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Returns `true` once [`ArchiveSession::close`] has run.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        !matches!(self.state, SinkState::Writing(_))
    }

    /// Adds every object under `root`, named relative to `root`.
    ///
    /// The root directory itself produces no entry. A root that is a single
    /// file is stored under its file name. Symlinks are stored as links and
    /// symlinked directories are not descended into.
    ///
    /// The first failure aborts the walk. Entries committed before it stay
    /// in the archive.
    ///
    /// # Errors
    ///
    /// Returns `PathNotFound` if `root` does not exist, and any listing,
    /// build, or commit error (`DuplicateEntry`, `NotARegularFile`,
    /// `InvalidPath`, `Io`).
    pub fn add_tree(&mut self, root: impl Into<PathInput>) -> Result<()> {
        let root = root.into().into_path_buf();
        if !root.exists() {
            return Err(ArchiveError::PathNotFound { path: root });
        }
        debug!("Adding tree: {}", root.display());

        let lister = TreeLister::new(&root).with_sorted(self.config.sort_entries);
        for object in lister.list()? {
            let object = object?;
            if let Some(archive_path) = tree_archive_path(&root, &object)? {
                self.add_object(&object, archive_path)?;
            }
        }
        Ok(())
    }

    /// Classifies `path` and adds it under its own normalized path.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPath` for missing or unsupported objects, and any
    /// build or commit error.
    pub fn add_path(&mut self, path: impl Into<PathInput>) -> Result<()> {
        let path = path.into().into_path_buf();
        let archive_path = ArchivePath::from_path(&path)?;
        self.add_object(&classify(path)?, archive_path)
    }

    /// Classifies `path` and adds it under `archive_path`.
    ///
    /// # Errors
    ///
    /// Same as [`ArchiveSession::add_path`].
    pub fn add_path_as(
        &mut self,
        path: impl Into<PathInput>,
        archive_path: impl Into<PathInput>,
    ) -> Result<()> {
        let archive_path = ArchivePath::from_input(archive_path.into())?;
        self.add_object(&classify(path)?, archive_path)
    }

    fn add_object(&mut self, object: &FsObject, archive_path: ArchivePath) -> Result<()> {
        if object.is_dir() && archive_path.is_empty() {
            return Ok(());
        }
        let entry = build_entry(object, archive_path, &self.config)?;
        self.commit(entry)
    }

    /// Adds a regular file under its own normalized path.
    ///
    /// The regular-file check follows symlinks.
    ///
    /// # Errors
    ///
    /// Returns `NotARegularFile`, `PathNotFound`, or `DuplicateEntry`.
    pub fn add_file(&mut self, path: impl Into<PathInput>) -> Result<()> {
        let path = path.into().into_path_buf();
        let archive_path = ArchivePath::from_path(&path)?;
        self.add_file_inner(&path, archive_path)
    }

    /// Adds a regular file under `archive_path`.
    ///
    /// # Errors
    ///
    /// Same as [`ArchiveSession::add_file`].
    pub fn add_file_as(
        &mut self,
        path: impl Into<PathInput>,
        archive_path: impl Into<PathInput>,
    ) -> Result<()> {
        let path = path.into().into_path_buf();
        let archive_path = ArchivePath::from_input(archive_path.into())?;
        self.add_file_inner(&path, archive_path)
    }

    fn add_file_inner(&mut self, path: &Path, archive_path: ArchivePath) -> Result<()> {
        let entry = ArchiveEntry::file(archive_path, path, self.config.preserve_permissions)?;
        self.commit(entry)
    }

    /// Adds a directory marker named `path/`.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateEntry` if `path/` already exists and `InvalidPath`
    /// if the name is empty.
    pub fn add_dir_entry(&mut self, path: impl Into<PathInput>) -> Result<()> {
        let archive_path = ArchivePath::from_input(path.into())?;
        self.commit(ArchiveEntry::directory(archive_path)?)
    }

    /// Adds a symlink entry without touching the filesystem, using the
    /// configured default permissions.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateEntry`, or `InvalidPath` for an empty name or a
    /// target that is not valid UTF-8.
    pub fn add_symlink(
        &mut self,
        link: impl Into<PathInput>,
        target: impl Into<PathInput>,
    ) -> Result<()> {
        let permissions = self.config.symlink_permissions;
        self.add_symlink_with_permissions(link, target, permissions)
    }

    /// Adds a symlink entry with explicit permission bits.
    ///
    /// # Errors
    ///
    /// Same as [`ArchiveSession::add_symlink`], plus `InvalidPermissions`
    /// for bits above `0o777`.
    pub fn add_symlink_with_permissions(
        &mut self,
        link: impl Into<PathInput>,
        target: impl Into<PathInput>,
        permissions: u32,
    ) -> Result<()> {
        let link = ArchivePath::from_input(link.into())?;
        let target = target.into().into_path_buf();
        let target = target
            .to_str()
            .ok_or_else(|| ArchiveError::invalid_path(&target, "symlink target is not valid UTF-8"))?;
        self.commit(ArchiveEntry::symlink(link, target, permissions)?)
    }

    /// Adds a file entry whose content is `data`.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateEntry` or `InvalidPath` for an empty name.
    pub fn add_bytes(
        &mut self,
        data: impl Into<Vec<u8>>,
        archive_path: impl Into<PathInput>,
    ) -> Result<()> {
        let archive_path = ArchivePath::from_input(archive_path.into())?;
        self.commit(ArchiveEntry::bytes(archive_path, data.into(), None)?)
    }

    /// Adds a file entry whose content is read from `reader`.
    ///
    /// If reading fails partway, the partial entry is discarded and the name
    /// stays free.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateEntry`, `InvalidPath` for an empty name, or the
    /// reader's `Io` error.
    pub fn add_reader(
        &mut self,
        reader: impl Read + Send + 'static,
        archive_path: impl Into<PathInput>,
    ) -> Result<()> {
        let archive_path = ArchivePath::from_input(archive_path.into())?;
        self.commit(ArchiveEntry::reader(archive_path, reader, None)?)
    }

    /// Writes one entry, rejecting names that were already committed.
    pub(crate) fn commit(&mut self, entry: ArchiveEntry) -> Result<()> {
        let SinkState::Writing(zip) = &mut self.state else {
            return Err(ArchiveError::ArchiveClosed);
        };

        let (path, kind) = entry.into_parts();
        let name = path.into_string();
        if self.names.contains(&name) {
            return Err(ArchiveError::DuplicateEntry { name });
        }

        match kind {
            EntryKind::DirectoryMarker => {
                debug!("Adding directory: {name}");
                zip.add_directory(
                    name.as_str(),
                    stored_options().unix_permissions(DIRECTORY_PERMISSIONS),
                )
                .map_err(|e| writer_error("failed to add directory", &e))?;
                self.report.directories_added += 1;
            }
            EntryKind::Symlink {
                target,
                permissions,
            } => {
                debug!("Adding symlink: {name} => {target}");
                zip.add_symlink(
                    name.as_str(),
                    target.as_str(),
                    stored_options().unix_permissions(permissions),
                )
                .map_err(|e| writer_error("failed to add symlink", &e))?;
                self.report.symlinks_added += 1;
            }
            EntryKind::File {
                mut source,
                permissions,
            } => {
                debug!("Adding file: {name}");
                let options = match permissions {
                    Some(mode) => self.file_options.unix_permissions(mode),
                    None => self.file_options,
                };
                zip.start_file(name.as_str(), options)
                    .map_err(|e| writer_error("failed to start file", &e))?;
                let written = match copy_with_buffer(&mut source, &mut **zip, &mut self.buffer) {
                    Ok(written) => written,
                    Err(e) => {
                        // Drop the truncated entry so the archive matches `names`.
                        if let Err(abort) = zip.abort_file() {
                            warn!("Failed to discard partial entry {name}: {abort}");
                            self.state = SinkState::Failed;
                            return Err(writer_error("failed to discard partial entry", &abort));
                        }
                        debug!("Discarded partial entry: {name}");
                        return Err(e);
                    }
                };
                self.report.files_added += 1;
                self.report.bytes_written += written;
            }
        }

        self.names.insert(name.clone());
        self.order.push(name);
        Ok(())
    }

    /// Finalizes the archive and persists it to the destination, if any.
    ///
    /// Only the first call does work; later calls return
    /// [`PersistOutcome::AlreadyClosed`]. A failure to persist is returned
    /// as [`PersistOutcome::Failed`] and logged, never as an error.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArchive` if the ZIP writer cannot be finalized.
    pub fn close(&mut self) -> Result<PersistOutcome> {
        let zip = match std::mem::replace(&mut self.state, SinkState::Failed) {
            SinkState::Writing(zip) => *zip,
            finished @ SinkState::Finished(_) => {
                self.state = finished;
                return Ok(PersistOutcome::AlreadyClosed);
            }
            SinkState::Failed => return Ok(PersistOutcome::AlreadyClosed),
        };

        let bytes = zip
            .finish()
            .map_err(|e| writer_error("failed to finish ZIP archive", &e))?
            .into_inner();
        self.report.bytes_compressed = bytes.len() as u64;

        let outcome = match &self.destination {
            None => PersistOutcome::NotRequested,
            Some(destination) => match persist(destination, &bytes) {
                Ok(()) => {
                    debug!("Wrote archive to {}", destination.display());
                    PersistOutcome::Persisted(destination.clone())
                }
                Err(error) => {
                    warn!(
                        "Failed to write archive to {}: {error}",
                        destination.display()
                    );
                    PersistOutcome::Failed {
                        path: destination.clone(),
                        error,
                    }
                }
            },
        };

        self.state = SinkState::Finished(bytes);
        Ok(outcome)
    }

    /// Returns the finished archive bytes, or `None` while still open.
    #[must_use]
    pub fn content(&self) -> Option<&[u8]> {
        match &self.state {
            SinkState::Finished(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Closes the session if needed and returns the archive bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if finalizing fails, or `ArchiveClosed` if an
    /// earlier finalization failed.
    pub fn into_bytes(mut self) -> Result<Vec<u8>> {
        let outcome = self.close()?;
        if outcome.is_failure() {
            debug!("Returning archive bytes despite failed persist");
        }
        match std::mem::replace(&mut self.state, SinkState::Failed) {
            SinkState::Finished(bytes) => Ok(bytes),
            _ => Err(ArchiveError::ArchiveClosed),
        }
    }
}

impl Default for ArchiveSession {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ArchiveSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArchiveSession")
            .field("entries", &self.order.len())
            .field("destination", &self.destination)
            .field("closed", &self.is_closed())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Drop for ArchiveSession {
    fn drop(&mut self) {
        if matches!(self.state, SinkState::Writing(_))
            && let Err(e) = self.close()
        {
            warn!("Failed to close archive session: {e}");
        }
    }
}

/// Computes the name of a listed object relative to the tree root.
///
/// Returns `None` for the root directory itself.
fn tree_archive_path(root: &Path, object: &FsObject) -> Result<Option<ArchivePath>> {
    let relative = object.path.strip_prefix(root).map_err(|_| {
        ArchiveError::invalid_path(&object.path, "listed path is outside the tree root")
    })?;

    if !relative.as_os_str().is_empty() {
        return ArchivePath::from_path(relative).map(Some);
    }
    if object.is_dir() {
        return Ok(None);
    }

    let name = root
        .file_name()
        .ok_or_else(|| ArchiveError::invalid_path(root, "cannot determine file name"))?;
    ArchivePath::from_path(Path::new(name)).map(Some)
}

/// Options for entries whose payload is never compressed.
fn stored_options() -> SimpleFileOptions {
    SimpleFileOptions::default().compression_method(CompressionMethod::Stored)
}

fn writer_error(context: &str, err: &zip::result::ZipError) -> ArchiveError {
    ArchiveError::InvalidArchive(format!("{context}: {err}"))
}

fn copy_with_buffer<R: Read, W: Write>(
    reader: &mut R,
    writer: &mut W,
    buffer: &mut [u8],
) -> Result<u64> {
    let mut bytes_written = 0u64;
    loop {
        let bytes_read = reader.read(buffer)?;
        if bytes_read == 0 {
            break;
        }
        writer.write_all(&buffer[..bytes_read])?;
        bytes_written += bytes_read as u64;
        trace!("Copied {bytes_read} bytes");
    }
    Ok(bytes_written)
}

fn persist(destination: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let dir = destination
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut temp = NamedTempFile::new_in(dir)?;
    temp.write_all(bytes)?;
    temp.as_file().sync_all()?;
    temp.persist(destination).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_utils::read_zip_entries;
    use std::fs;
    use std::io;
    use tempfile::TempDir;

    /// Yields `remaining` bytes, then fails every read.
    struct FailingReader {
        remaining: usize,
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.remaining == 0 {
                return Err(io::Error::other("device went away"));
            }
            let n = buf.len().min(self.remaining);
            buf[..n].fill(b'x');
            self.remaining -= n;
            Ok(n)
        }
    }

    fn archived_names(bytes: &[u8]) -> Vec<String> {
        read_zip_entries(bytes).into_iter().map(|e| e.name).collect()
    }

    #[test]
    fn test_add_dir_entry() {
        let mut session = ArchiveSession::new();
        session.add_dir_entry("a/b/c/d").unwrap();

        let entries = read_zip_entries(&session.into_bytes().unwrap());
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "a/b/c/d/");
        assert!(entries[0].is_dir);
    }

    #[test]
    fn test_add_dir_entry_twice_is_duplicate() {
        let mut session = ArchiveSession::new();
        session.add_dir_entry("a/b").unwrap();
        let err = session.add_dir_entry("a/b/").unwrap_err();
        assert!(matches!(err, ArchiveError::DuplicateEntry { ref name } if name == "a/b/"));
        assert_eq!(session.len(), 1);
    }

    #[test]
    fn test_dir_entry_does_not_collide_with_file() {
        let mut session = ArchiveSession::new();
        session.add_bytes(b"x".to_vec(), "name").unwrap();
        session.add_dir_entry("name").unwrap();
        assert_eq!(session.names(), ["name", "name/"]);
    }

    #[test]
    fn test_add_symlink() {
        let mut session = ArchiveSession::new();
        session.add_symlink("symlink", "a/b/c/d").unwrap();

        let entries = read_zip_entries(&session.into_bytes().unwrap());
        let link = &entries[0];
        assert_eq!(link.name, "symlink");
        assert_eq!(link.data, b"a/b/c/d");
        assert_eq!(link.external_attributes() & 0xA000_0000, 0xA000_0000);
        assert_eq!(link.unix_mode, Some(0o120_777));
    }

    #[test]
    fn test_add_symlink_with_permissions() {
        let mut session = ArchiveSession::new();
        session
            .add_symlink_with_permissions("link", "hello.txt", 0o644)
            .unwrap();

        let entries = read_zip_entries(&session.into_bytes().unwrap());
        assert_eq!(entries[0].unix_mode, Some(0o120_644));
        assert_eq!(entries[0].external_attributes() >> 28, 0xA);
    }

    #[test]
    fn test_add_bytes() {
        let mut session = ArchiveSession::new();
        session.add_bytes(b"ABC".to_vec(), "filename.bin").unwrap();

        let entries = read_zip_entries(&session.into_bytes().unwrap());
        assert!(!entries[0].is_dir);
        assert_eq!(entries[0].data, b"ABC");
    }

    #[test]
    fn test_add_bytes_twice_keeps_first() {
        let mut session = ArchiveSession::new();
        session.add_bytes(b"first".to_vec(), "f.bin").unwrap();
        let err = session.add_bytes(b"second".to_vec(), "f.bin").unwrap_err();
        assert!(err.is_duplicate());

        let entries = read_zip_entries(&session.into_bytes().unwrap());
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].data, b"first");
    }

    #[test]
    fn test_add_path_file_strips_leading_slash() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("filename.txt");
        fs::write(&file, "Hello, world!\n").unwrap();

        let mut session = ArchiveSession::new();
        session.add_path(&file).unwrap();

        let expected = file.to_str().unwrap().trim_start_matches('/').to_string();
        let entries = read_zip_entries(&session.into_bytes().unwrap());
        assert_eq!(entries[0].name, expected);
        assert!(!entries[0].is_dir);
    }

    #[cfg(unix)]
    #[test]
    fn test_add_path_with_directory_symlink() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("a/b/c/d");
        fs::create_dir_all(&dir).unwrap();
        let link = temp.path().join("symlink");
        std::os::unix::fs::symlink(&dir, &link).unwrap();

        let mut session = ArchiveSession::new();
        session.add_path_as(&link, "symlink").unwrap();

        let entries = read_zip_entries(&session.into_bytes().unwrap());
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].external_attributes() & 0xA000_0000, 0xA000_0000);
        assert_eq!(entries[0].data, dir.to_str().unwrap().as_bytes());
    }

    #[cfg(unix)]
    #[test]
    fn test_add_path_file_symlink() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("filename.txt");
        fs::write(&file, "Hello, world!\n").unwrap();
        let link = temp.path().join("filename.symlink");
        std::os::unix::fs::symlink(&file, &link).unwrap();

        let mut session = ArchiveSession::new();
        session.add_path_as(&link, "filename.symlink").unwrap();

        let entries = read_zip_entries(&session.into_bytes().unwrap());
        assert_eq!(entries[0].name, "filename.symlink");
        assert_eq!(entries[0].external_attributes() & 0xA000_0000, 0xA000_0000);
    }

    #[test]
    fn test_add_path_current_dir_is_skipped() {
        let temp = TempDir::new().unwrap();
        let mut session = ArchiveSession::new();
        session.add_path_as(temp.path(), ".").unwrap();
        assert!(session.is_empty());
    }

    #[test]
    fn test_add_file_rejects_directory() {
        let temp = TempDir::new().unwrap();
        let mut session = ArchiveSession::new();
        let err = session.add_file(temp.path()).unwrap_err();
        assert!(matches!(err, ArchiveError::NotARegularFile { .. }));
    }

    #[test]
    fn test_add_file_as_streams_content() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("big.bin");
        let content: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        fs::write(&file, &content).unwrap();

        let mut session = ArchiveSession::new();
        session.add_file_as(&file, "data/big.bin").unwrap();
        assert_eq!(session.report().bytes_written, content.len() as u64);

        let entries = read_zip_entries(&session.into_bytes().unwrap());
        assert_eq!(entries[0].name, "data/big.bin");
        assert_eq!(entries[0].data, content);
    }

    #[test]
    fn test_add_tree() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("a/b/c/d")).unwrap();
        fs::write(root.join("filename.txt"), "Hello, world!\n").unwrap();

        let mut session = ArchiveSession::new();
        session.add_tree(root).unwrap();

        assert_eq!(
            session.names(),
            ["a/", "a/b/", "a/b/c/", "a/b/c/d/", "filename.txt"]
        );
        assert_eq!(session.report().directories_added, 4);
        assert_eq!(session.report().files_added, 1);
    }

    #[test]
    fn test_add_tree_single_file_uses_file_name() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("solo.txt");
        fs::write(&file, "solo").unwrap();

        let mut session = ArchiveSession::new();
        session.add_tree(&file).unwrap();
        assert_eq!(session.names(), ["solo.txt"]);
    }

    #[test]
    fn test_add_tree_missing_root() {
        let temp = TempDir::new().unwrap();
        let mut session = ArchiveSession::new();
        let err = session.add_tree(temp.path().join("nope")).unwrap_err();
        assert!(matches!(err, ArchiveError::PathNotFound { .. }));
    }

    #[test]
    fn test_add_tree_duplicate_is_fail_fast_without_rollback() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        for name in ["a.txt", "b.txt", "c.txt"] {
            fs::write(root.join(name), name).unwrap();
        }

        let mut session = ArchiveSession::new();
        session.add_bytes(b"existing".to_vec(), "b.txt").unwrap();

        let err = session.add_tree(root).unwrap_err();
        assert!(matches!(err, ArchiveError::DuplicateEntry { ref name } if name == "b.txt"));
        // a.txt was committed before the collision and is not rolled back;
        // c.txt was never reached.
        assert_eq!(session.names(), ["b.txt", "a.txt"]);
    }

    #[test]
    fn test_close_twice_is_noop() {
        let mut session = ArchiveSession::new();
        session.add_bytes(b"x".to_vec(), "x").unwrap();

        assert!(matches!(
            session.close().unwrap(),
            PersistOutcome::NotRequested
        ));
        let len = session.content().unwrap().len();
        assert!(matches!(
            session.close().unwrap(),
            PersistOutcome::AlreadyClosed
        ));
        assert_eq!(session.content().unwrap().len(), len);
        assert_eq!(session.report().bytes_compressed, len as u64);
    }

    #[test]
    fn test_add_after_close_fails() {
        let mut session = ArchiveSession::new();
        let _ = session.close().unwrap();
        let err = session.add_bytes(b"x".to_vec(), "x").unwrap_err();
        assert!(matches!(err, ArchiveError::ArchiveClosed));
    }

    #[test]
    fn test_close_persists_to_destination() {
        let temp = TempDir::new().unwrap();
        let output = temp.path().join("out.zip");

        let mut session = ArchiveSession::new().with_destination(&output);
        session.add_bytes(b"payload".to_vec(), "p.txt").unwrap();
        let outcome = session.close().unwrap();

        assert!(matches!(outcome, PersistOutcome::Persisted(ref p) if *p == output));
        assert_eq!(fs::read(&output).unwrap(), session.content().unwrap());
    }

    #[test_log::test]
    fn test_close_persist_failure_is_reported_not_raised() {
        let temp = TempDir::new().unwrap();
        let output = temp.path().join("missing-dir/out.zip");

        let mut session = ArchiveSession::new().with_destination(&output);
        session.add_bytes(b"payload".to_vec(), "p.txt").unwrap();
        let outcome = session.close().unwrap();

        assert!(outcome.is_failure());
        assert!(session.content().is_some());
        assert!(outcome.into_result().is_err());
    }

    #[test]
    fn test_drop_closes_and_persists() {
        let temp = TempDir::new().unwrap();
        let output = temp.path().join("dropped.zip");
        {
            let mut session = ArchiveSession::new().with_destination(&output);
            session.add_bytes(b"x".to_vec(), "x").unwrap();
        }
        let entries = read_zip_entries(&fs::read(&output).unwrap());
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_stored_compression() {
        let config = CreationConfig::default().with_compression_level(0);
        let mut session = ArchiveSession::with_config(config).unwrap();
        session.add_bytes(vec![b'a'; 4096], "a.txt").unwrap();

        let entries = read_zip_entries(&session.into_bytes().unwrap());
        assert_eq!(entries[0].data.len(), 4096);
    }

    #[test]
    fn test_with_config_rejects_invalid() {
        let config = CreationConfig {
            compression_level: Some(12),
            ..CreationConfig::default()
        };
        assert!(matches!(
            ArchiveSession::with_config(config).unwrap_err(),
            ArchiveError::InvalidCompressionLevel { level: 12 }
        ));
    }

    #[test]
    fn test_add_reader() {
        let mut session = ArchiveSession::new();
        session
            .add_reader(io::Cursor::new(b"streamed".to_vec()), "s.txt")
            .unwrap();

        let entries = read_zip_entries(&session.into_bytes().unwrap());
        assert_eq!(entries[0].name, "s.txt");
        assert_eq!(entries[0].data, b"streamed");
    }

    #[test_log::test]
    fn test_read_failure_discards_partial_entry() {
        let mut session = ArchiveSession::new();
        session.add_bytes(b"before".to_vec(), "before.txt").unwrap();

        let reader = FailingReader {
            remaining: 3 * COPY_BUFFER_SIZE + 17,
        };
        let err = session.add_reader(reader, "m").unwrap_err();
        assert!(matches!(err, ArchiveError::Io(_)));
        assert!(!session.contains("m"));
        assert_eq!(session.report().files_added, 1);
        assert_eq!(session.report().bytes_written, 6);

        session.add_bytes(b"ok".to_vec(), "m").unwrap();

        let entries = read_zip_entries(&session.into_bytes().unwrap());
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "before.txt");
        assert_eq!(entries[0].data, b"before");
        assert_eq!(entries[1].name, "m");
        assert_eq!(entries[1].data, b"ok");
    }

    #[test]
    fn test_read_failure_on_first_byte_with_stored_entries() {
        let config = CreationConfig::default().with_compression_level(0);
        let mut session = ArchiveSession::with_config(config).unwrap();

        let err = session
            .add_reader(FailingReader { remaining: 0 }, "empty-fail")
            .unwrap_err();
        assert!(matches!(err, ArchiveError::Io(_)));
        assert!(session.is_empty());

        let bytes = session.into_bytes().unwrap();
        assert!(archived_names(&bytes).is_empty());
    }

    #[test]
    fn test_names_match_archive_after_failed_adds() {
        let temp = TempDir::new().unwrap();
        let mut session = ArchiveSession::new();

        session.add_bytes(b"a".to_vec(), "a.txt").unwrap();
        assert!(session.add_bytes(b"again".to_vec(), "a.txt").is_err());
        assert!(session.add_file_as(temp.path(), "dir-as-file").is_err());
        assert!(session.add_file(temp.path().join("missing")).is_err());
        assert!(
            session
                .add_symlink_with_permissions("link", "a.txt", 0o1777)
                .is_err()
        );
        assert!(session.add_dir_entry(".").is_err());
        assert!(
            session
                .add_reader(FailingReader { remaining: 10 }, "partial.bin")
                .is_err()
        );
        session.add_symlink("link", "a.txt").unwrap();

        let names = session.names().to_vec();
        let report = session.report().clone();
        let bytes = session.into_bytes().unwrap();

        assert_eq!(archived_names(&bytes), names);
        assert_eq!(names, ["a.txt", "link"]);
        assert_eq!(report.total_entries(), names.len());
    }

    #[test]
    fn test_raw_names_are_normalized_before_duplicate_check() {
        let mut session = ArchiveSession::new();
        session.add_symlink("./link", "t").unwrap();
        session.add_dir_entry("a//b").unwrap();
        session.add_bytes(b"x".to_vec(), "a/./b/c.txt").unwrap();

        assert_eq!(session.names(), ["link", "a/b/", "a/b/c.txt"]);
        assert!(session.add_symlink("link", "t").unwrap_err().is_duplicate());
        assert!(session.add_dir_entry("./a/b/").unwrap_err().is_duplicate());
    }

    #[test]
    fn test_add_path_as_dot_slash_is_skipped() {
        let temp = TempDir::new().unwrap();
        let mut session = ArchiveSession::new();
        session.add_path_as(temp.path(), "./").unwrap();
        session.add_path_as(temp.path(), String::from(".")).unwrap();
        assert!(session.is_empty());
        assert!(archived_names(&session.into_bytes().unwrap()).is_empty());
    }

    #[test]
    fn test_directory_marker_mode() {
        let mut session = ArchiveSession::new();
        session.add_dir_entry("d").unwrap();

        let entries = read_zip_entries(&session.into_bytes().unwrap());
        assert_eq!(entries[0].unix_mode, Some(0o040_755));
    }
}
