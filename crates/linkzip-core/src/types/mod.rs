//! Path types used at the public boundary.
//!
//! Caller paths arrive as [`PathInput`] and are normalized once on entry.
//! Entry names inside an archive are always [`ArchivePath`] values.

pub mod archive_path;
pub mod path_input;

pub use archive_path::ArchivePath;
pub use path_input::PathInput;
