//! Test utilities for building source archives and inspecting results.
//!
//! # Panics
//!
//! All functions in this module may panic on I/O errors since they are
//! designed for test use only where panics are acceptable.

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::io::Cursor;
use std::io::Read;
use std::io::Write;
use zip::write::SimpleFileOptions;

/// One entry read back from a finished archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZipEntryInfo {
    /// Stored name.
    pub name: String,
    /// Whether the reader treats the entry as a directory.
    pub is_dir: bool,
    /// Unix mode from the external attributes, if recorded.
    pub unix_mode: Option<u32>,
    /// Uncompressed payload.
    pub data: Vec<u8>,
}

impl ZipEntryInfo {
    /// The Unix half of the external attributes field (`mode << 16`).
    #[must_use]
    pub fn external_attributes(&self) -> u32 {
        self.unix_mode.map_or(0, |mode| mode << 16)
    }
}

/// Reads every entry of an in-memory ZIP archive, in stored order.
///
/// # Examples
///
/// ```
/// use linkzip_core::ArchiveSession;
/// use linkzip_core::test_utils::read_zip_entries;
///
/// let mut session = ArchiveSession::new();
/// session.add_bytes(b"hello".to_vec(), "hello.txt").unwrap();
///
/// let entries = read_zip_entries(&session.into_bytes().unwrap());
/// assert_eq!(entries[0].name, "hello.txt");
/// assert_eq!(entries[0].data, b"hello");
/// ```
#[must_use]
pub fn read_zip_entries(bytes: &[u8]) -> Vec<ZipEntryInfo> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    (0..archive.len())
        .map(|i| {
            let mut file = archive.by_index(i).unwrap();
            let mut data = Vec::new();
            file.read_to_end(&mut data).unwrap();
            ZipEntryInfo {
                name: file.name().to_string(),
                is_dir: file.is_dir(),
                unix_mode: file.unix_mode(),
                data,
            }
        })
        .collect()
}

/// Builder for ZIP source archives with various entry types.
///
/// # Examples
///
/// ```
/// use linkzip_core::test_utils::ZipTestBuilder;
///
/// let zip_data = ZipTestBuilder::new()
///     .add_directory("dir/")
///     .add_file("dir/file.txt", b"content")
///     .add_symlink("dir/link", "file.txt")
///     .build();
/// ```
pub struct ZipTestBuilder {
    zip: zip::ZipWriter<Cursor<Vec<u8>>>,
}

impl ZipTestBuilder {
    /// Creates a new ZIP test builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            zip: zip::ZipWriter::new(Cursor::new(Vec::new())),
        }
    }

    /// Adds a regular file with mode 0o644.
    #[must_use]
    pub fn add_file(self, path: &str, data: &[u8]) -> Self {
        self.add_file_with_mode(path, data, 0o644)
    }

    /// Adds a regular file with a custom mode.
    #[must_use]
    pub fn add_file_with_mode(mut self, path: &str, data: &[u8], mode: u32) -> Self {
        let options = stored().unix_permissions(mode);
        self.zip.start_file(path, options).unwrap();
        self.zip.write_all(data).unwrap();
        self
    }

    /// Adds a directory marker.
    #[must_use]
    pub fn add_directory(mut self, path: &str) -> Self {
        self.zip
            .add_directory(path, stored().unix_permissions(0o755))
            .unwrap();
        self
    }

    /// Adds a symlink entry with mode 0o777.
    #[must_use]
    pub fn add_symlink(mut self, path: &str, target: &str) -> Self {
        self.zip
            .add_symlink(path, target, stored().unix_permissions(0o777))
            .unwrap();
        self
    }

    /// Finishes the archive and returns its bytes.
    #[must_use]
    pub fn build(self) -> Vec<u8> {
        self.zip.finish().unwrap().into_inner()
    }
}

impl Default for ZipTestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn stored() -> SimpleFileOptions {
    SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored)
}
