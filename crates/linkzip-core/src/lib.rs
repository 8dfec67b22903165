//! Symlink-preserving ZIP archive creation.
//!
//! `linkzip-core` builds ZIP archives from filesystem trees without
//! flattening symbolic links. A link is stored as an entry whose payload is
//! the link's target and whose external attributes carry the Unix
//! `S_IFLNK` file type, so Unix-aware extractors recreate the link instead
//! of a copy of what it points to. Symlinked directories are never
//! descended into.
//!
//! # Examples
//!
//! ```no_run
//! use linkzip_core::archive_tree;
//! use linkzip_core::creation::CreationConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let report = archive_tree("app/", "app.zip", &CreationConfig::default())?;
//! println!(
//!     "Archived {} files and {} symlinks",
//!     report.files_added, report.symlinks_added
//! );
//! # Ok(())
//! # }
//! ```
//!
//! Finer control goes through an [`ArchiveSession`]:
//!
//! ```
//! use linkzip_core::ArchiveSession;
//!
//! let mut session = ArchiveSession::new();
//! session.add_dir_entry("bin")?;
//! session.add_symlink("bin/python", "python3.12")?;
//! let bytes = session.into_bytes()?;
//! assert!(!bytes.is_empty());
//! # Ok::<(), linkzip_core::ArchiveError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod api;
pub mod creation;
pub mod error;
#[doc(hidden)]
pub mod test_utils;
pub mod types;

pub use api::archive_tree;
pub use api::archive_tree_to_vec;
pub use creation::ArchiveSession;
pub use creation::CreationConfig;
pub use creation::CreationReport;
pub use creation::PersistOutcome;
pub use error::ArchiveError;
pub use error::Result;

pub use types::ArchivePath;
pub use types::PathInput;
