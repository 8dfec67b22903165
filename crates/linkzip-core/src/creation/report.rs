//! Archive session reporting.

/// Counters describing what an archive session committed.
///
/// # Examples
///
/// ```
/// use linkzip_core::creation::CreationReport;
///
/// let mut report = CreationReport::default();
/// report.files_added = 2;
/// report.symlinks_added = 1;
/// report.bytes_written = 1000;
/// report.bytes_compressed = 250;
///
/// assert_eq!(report.total_entries(), 3);
/// assert_eq!(report.compression_ratio(), 4.0);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreationReport {
    /// Number of regular file entries, including in-memory buffers.
    pub files_added: usize,

    /// Number of directory markers.
    pub directories_added: usize,

    /// Number of symlink entries.
    pub symlinks_added: usize,

    /// Number of entries copied in from other archives. These are also
    /// counted under their kind.
    pub entries_merged: usize,

    /// Uncompressed bytes of file content written.
    pub bytes_written: u64,

    /// Size of the finished archive. Zero until the session is closed.
    pub bytes_compressed: u64,
}

impl CreationReport {
    /// Creates a new empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of entries committed, of every kind.
    #[must_use]
    pub fn total_entries(&self) -> usize {
        self.files_added + self.directories_added + self.symlinks_added
    }

    /// Returns the compression ratio (uncompressed / compressed).
    ///
    /// Returns 0.0 if either size is 0.
    #[must_use]
    pub fn compression_ratio(&self) -> f64 {
        if self.bytes_compressed == 0 || self.bytes_written == 0 {
            return 0.0;
        }
        self.bytes_written as f64 / self.bytes_compressed as f64
    }
}
