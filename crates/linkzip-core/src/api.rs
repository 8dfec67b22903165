//! High-level public API for archiving whole trees.

use crate::Result;
use crate::creation::ArchiveSession;
use crate::creation::CreationConfig;
use crate::creation::CreationReport;
use crate::types::PathInput;

/// Archives the tree at `root` into a ZIP file at `output`.
///
/// Entries are named relative to `root`. Symlinks are stored as links.
///
/// # Errors
///
/// Returns an error if:
/// - The configuration is invalid
/// - `root` does not exist
/// - An object in the tree is unsupported or unreadable
/// - The archive cannot be written to `output`
///
/// # Examples
///
/// ```no_run
/// use linkzip_core::archive_tree;
/// use linkzip_core::creation::CreationConfig;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = CreationConfig::default().with_compression_level(9);
/// let report = archive_tree("venv/", "venv.zip", &config)?;
/// println!("Wrote {} entries", report.total_entries());
/// # Ok(())
/// # }
/// ```
pub fn archive_tree(
    root: impl Into<PathInput>,
    output: impl Into<PathInput>,
    config: &CreationConfig,
) -> Result<CreationReport> {
    let mut session = ArchiveSession::with_config(config.clone())?;
    session.add_tree(root)?;

    // The destination is attached only once the tree is complete, so a
    // failed walk never leaves a partial archive behind.
    let mut session = session.with_destination(output);
    session.close()?.into_result()?;
    Ok(session.report().clone())
}

/// Archives the tree at `root` and returns the ZIP bytes.
///
/// # Errors
///
/// Same as [`archive_tree`], except that nothing is written to disk.
pub fn archive_tree_to_vec(root: impl Into<PathInput>, config: &CreationConfig) -> Result<Vec<u8>> {
    let mut session = ArchiveSession::with_config(config.clone())?;
    session.add_tree(root)?;
    session.into_bytes()
}
