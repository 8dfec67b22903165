//! Archive creation.
//!
//! Objects flow through three stages: [`classify`] decides what a path is
//! without following links, [`entry`] turns a classified object into an
//! archive entry, and [`ArchiveSession`] commits entries to a ZIP writer.
//! [`walker`] lists whole trees for [`ArchiveSession::add_tree`].

pub mod classify;
pub mod config;
pub mod entry;
mod merge;
pub mod report;
pub mod session;
pub mod walker;

pub use classify::FsObject;
pub use classify::ObjectKind;
pub use config::CreationConfig;
pub use entry::ArchiveEntry;
pub use entry::EntryKind;
pub use report::CreationReport;
pub use session::ArchiveSession;
pub use session::PersistOutcome;
pub use walker::Listing;
pub use walker::TreeLister;
pub use walker::generate_listing;
