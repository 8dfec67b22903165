//! Configuration for archive sessions.

use crate::ArchiveError;
use crate::Result;
use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

/// Permission bits given to a synthetic symlink when the caller supplies none.
pub const DEFAULT_SYMLINK_PERMISSIONS: u32 = 0o777;

/// Configuration for archive sessions.
///
/// Controls compression, whether file modes are recorded, the default
/// permissions of synthetic symlinks, and listing order.
///
/// # Examples
///
/// ```
/// use linkzip_core::creation::CreationConfig;
///
/// let config = CreationConfig::default()
///     .with_compression_level(9)
///     .with_preserve_permissions(false);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreationConfig {
    /// Compression level.
    ///
    /// `None` or `Some(0)` stores entries uncompressed. 1 (fastest) to 9
    /// (best) selects Deflate.
    ///
    /// Default: `Some(6)`.
    pub compression_level: Option<u8>,

    /// Record the Unix mode of regular files in their entries.
    ///
    /// Default: `true`.
    pub preserve_permissions: bool,

    /// Permission bits for symlinks that are not backed by a filesystem
    /// object.
    ///
    /// Default: `0o777`.
    pub symlink_permissions: u32,

    /// Sort siblings by file name while listing a tree.
    ///
    /// Default: `true`.
    pub sort_entries: bool,
}

impl Default for CreationConfig {
    fn default() -> Self {
        Self {
            compression_level: Some(6),
            preserve_permissions: true,
            symlink_permissions: DEFAULT_SYMLINK_PERMISSIONS,
            sort_entries: true,
        }
    }
}

impl CreationConfig {
    /// Creates a new `CreationConfig` with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the compression level.
    ///
    /// # Panics
    ///
    /// Panics if the level is above 9. Use `validate()` for non-panicking
    /// validation.
    #[must_use]
    pub fn with_compression_level(mut self, level: u8) -> Self {
        assert!(level <= 9, "compression level must be 0-9");
        self.compression_level = Some(level);
        self
    }

    /// Sets whether to record file permissions.
    #[must_use]
    pub fn with_preserve_permissions(mut self, preserve: bool) -> Self {
        self.preserve_permissions = preserve;
        self
    }

    /// Sets the default permissions of synthetic symlinks.
    #[must_use]
    pub fn with_symlink_permissions(mut self, mode: u32) -> Self {
        self.symlink_permissions = mode;
        self
    }

    /// Sets whether listings are sorted by file name.
    #[must_use]
    pub fn with_sort_entries(mut self, sort: bool) -> Self {
        self.sort_entries = sort;
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Compression level is above 9
    /// - Symlink permissions do not fit in 9 bits
    pub fn validate(&self) -> Result<()> {
        if let Some(level) = self.compression_level
            && level > 9
        {
            return Err(ArchiveError::InvalidCompressionLevel { level });
        }
        if self.symlink_permissions > 0o777 {
            return Err(ArchiveError::InvalidPermissions {
                mode: self.symlink_permissions,
            });
        }
        Ok(())
    }

    /// Base ZIP options for every entry written under this configuration.
    pub(crate) fn zip_options(&self) -> SimpleFileOptions {
        match self.compression_level {
            None | Some(0) => {
                SimpleFileOptions::default().compression_method(CompressionMethod::Stored)
            }
            Some(level) => SimpleFileOptions::default()
                .compression_method(CompressionMethod::Deflated)
                .compression_level(Some(i64::from(level))),
        }
    }
}
