//! Copying entries from an existing ZIP archive into a session.

use crate::ArchiveError;
use crate::Result;
use crate::creation::entry::ArchiveEntry;
use crate::creation::entry::S_IFLNK;
use crate::creation::entry::S_IFMT;
use crate::creation::session::ArchiveSession;
use crate::types::ArchivePath;
use crate::types::PathInput;
use std::fs::File;
use std::io::BufReader;
use std::io::Read;
use std::io::Seek;
use tracing::debug;

impl ArchiveSession {
    /// Copies every entry of a ZIP archive into this session, in the
    /// source's order.
    ///
    /// Directory markers stay directory markers and symlink entries stay
    /// symlinks with their permission bits. Everything else becomes a file
    /// entry with the source's content and, when present, its mode.
    ///
    /// The first failure aborts the merge. Entries committed before it stay
    /// in the archive.
    ///
    /// Returns the number of entries copied.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArchive` if `reader` is not a readable ZIP archive,
    /// and `DuplicateEntry` on the first name already in this session.
    pub fn add_zip_contents<R: Read + Seek>(&mut self, reader: R) -> Result<usize> {
        let mut archive = zip::ZipArchive::new(reader)
            .map_err(|e| ArchiveError::InvalidArchive(format!("failed to open ZIP archive: {e}")))?;

        debug!("Merging {} entries from ZIP archive", archive.len());

        let mut merged = 0;
        for i in 0..archive.len() {
            let entry = {
                let mut source = archive.by_index(i).map_err(|e| {
                    ArchiveError::InvalidArchive(format!("failed to read ZIP entry {i}: {e}"))
                })?;
                source_entry(&mut source)?
            };
            self.commit(entry)?;
            self.report_mut().entries_merged += 1;
            merged += 1;
        }

        Ok(merged)
    }

    /// Opens the ZIP archive at `path` and merges its entries.
    ///
    /// # Errors
    ///
    /// Returns `PathNotFound` if the file does not exist, and the errors of
    /// [`ArchiveSession::add_zip_contents`].
    pub fn add_zip_file(&mut self, path: impl Into<PathInput>) -> Result<usize> {
        let path = path.into().into_path_buf();
        let file = File::open(&path).map_err(|e| ArchiveError::from_io(&path, e))?;
        debug!("Merging archive: {}", path.display());
        self.add_zip_contents(BufReader::new(file))
    }
}

fn source_entry<R: Read>(source: &mut zip::read::ZipFile<'_, R>) -> Result<ArchiveEntry> {
    let path = ArchivePath::from_name(source.name());
    if source.is_dir() {
        return ArchiveEntry::directory(path);
    }

    let capacity = usize::try_from(source.size()).unwrap_or(0);
    let mut data = Vec::with_capacity(capacity);
    source.read_to_end(&mut data).map_err(|e| {
        ArchiveError::InvalidArchive(format!("failed to read '{}': {e}", source.name()))
    })?;

    match source.unix_mode() {
        Some(mode) if mode & S_IFMT == S_IFLNK => {
            let target = String::from_utf8(data).map_err(|_| {
                ArchiveError::InvalidArchive(format!(
                    "symlink target of '{}' is not valid UTF-8",
                    source.name()
                ))
            })?;
            ArchiveEntry::symlink(path, target, mode & 0o777)
        }
        mode => ArchiveEntry::bytes(path, data, mode.map(|m| m & 0o777)),
    }
}
