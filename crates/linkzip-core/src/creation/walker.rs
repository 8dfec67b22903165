//! Directory tree listing.
//!
//! A listing is a top-down enumeration of the objects under a root: the root
//! first, every directory before its own children, and symlinks emitted
//! without being traversed. Because symlinked directories are never entered,
//! cyclic links cannot make a listing infinite.

use crate::ArchiveError;
use crate::Result;
use crate::creation::classify::FsObject;
use crate::creation::classify::ObjectKind;
use crate::creation::classify::classify;
use crate::creation::classify::symlink_kind;
use crate::creation::classify::unsupported;
use crate::types::PathInput;
use std::path::Path;
use std::path::PathBuf;
use walkdir::WalkDir;

/// Lists the filesystem objects under a root.
///
/// # Examples
///
/// ```no_run
/// use linkzip_core::creation::walker::TreeLister;
///
/// let lister = TreeLister::new("./project");
/// for object in lister.list()? {
///     let object = object?;
///     println!("{} ({:?})", object.path.display(), object.kind);
/// }
/// # Ok::<(), linkzip_core::ArchiveError>(())
/// ```
#[derive(Debug, Clone)]
pub struct TreeLister {
    root: PathBuf,
    absolute: bool,
    sorted: bool,
}

impl TreeLister {
    /// Creates a lister for `root`. Paths are emitted relative to the root as
    /// given, with siblings sorted by file name.
    #[must_use]
    pub fn new(root: impl Into<PathInput>) -> Self {
        Self {
            root: root.into().into_path_buf(),
            absolute: false,
            sorted: true,
        }
    }

    /// Emits absolute paths, made absolute against the current directory
    /// without resolving symlinks.
    #[must_use]
    pub fn with_absolute_paths(mut self, absolute: bool) -> Self {
        self.absolute = absolute;
        self
    }

    /// Sets whether siblings are sorted by file name.
    #[must_use]
    pub fn with_sorted(mut self, sorted: bool) -> Self {
        self.sorted = sorted;
        self
    }

    /// Returns the root this lister walks.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Starts a fresh traversal.
    ///
    /// If the root is a regular file the listing holds only the root.
    /// Otherwise the directory is walked without following symlinks; errors
    /// for individual objects are yielded as `Err` items.
    ///
    /// # Errors
    ///
    /// Returns `PathNotFound` if the root does not exist.
    pub fn list(&self) -> Result<Listing> {
        if !self.root.exists() {
            return Err(ArchiveError::PathNotFound {
                path: self.root.clone(),
            });
        }

        let root = if self.absolute {
            std::path::absolute(&self.root)?
        } else {
            self.root.clone()
        };

        if root.is_file() {
            return Ok(Listing {
                inner: ListingInner::Single(Some(classify(root))),
            });
        }

        let mut walker = WalkDir::new(&root).follow_links(false);
        if self.sorted {
            walker = walker.sort_by_file_name();
        }

        Ok(Listing {
            inner: ListingInner::Walk(walker.into_iter()),
        })
    }
}

/// A lazy, finite listing produced by [`TreeLister::list`].
#[derive(Debug)]
pub struct Listing {
    inner: ListingInner,
}

#[derive(Debug)]
enum ListingInner {
    Single(Option<Result<FsObject>>),
    Walk(walkdir::IntoIter),
}

impl Iterator for Listing {
    type Item = Result<FsObject>;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.inner {
            ListingInner::Single(item) => item.take(),
            ListingInner::Walk(entries) => entries
                .next()
                .map(|entry| entry.map_err(walk_error).and_then(|e| classify_entry(&e))),
        }
    }
}

/// Collects the full listing of `root` into a vector.
///
/// # Examples
///
/// ```no_run
/// use linkzip_core::creation::walker::generate_listing;
///
/// let listing = generate_listing("./src")?;
/// println!("{} objects", listing.len());
/// # Ok::<(), linkzip_core::ArchiveError>(())
/// ```
///
/// # Errors
///
/// Returns the first error encountered while walking.
pub fn generate_listing(root: impl Into<PathInput>) -> Result<Vec<FsObject>> {
    TreeLister::new(root).list()?.collect()
}

/// Classifies a walked entry, reusing the file type the walk already read.
fn classify_entry(entry: &walkdir::DirEntry) -> Result<FsObject> {
    let path = entry.path();
    let file_type = entry.file_type();

    let kind = if file_type.is_symlink() {
        let metadata = entry.metadata().map_err(walk_error)?;
        symlink_kind(path, &metadata)?
    } else if file_type.is_dir() {
        ObjectKind::Directory
    } else if file_type.is_file() {
        ObjectKind::File
    } else {
        return Err(unsupported(path));
    };

    Ok(FsObject {
        path: path.to_path_buf(),
        kind,
    })
}

fn walk_error(err: walkdir::Error) -> ArchiveError {
    let vanished = err
        .io_error()
        .is_some_and(|e| e.kind() == std::io::ErrorKind::NotFound);
    match err.path() {
        Some(path) if vanished => ArchiveError::PathNotFound {
            path: path.to_path_buf(),
        },
        _ => ArchiveError::Io(std::io::Error::other(format!("walkdir error: {err}"))),
    }
}
