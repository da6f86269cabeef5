//! Directory tree walking with exclusion filtering.
//!
//! The walk is a pre-order, parent-before-children traversal with siblings
//! sorted by file name, so a fixed filesystem snapshot always yields the same
//! sequence. Symlinks are never followed.

use crate::ArchiveError;
use crate::Result;
use crate::entry::EntryKind;
use regex::Regex;
use std::path::Path;
use std::path::PathBuf;
use tracing::debug;
use walkdir::WalkDir;

/// Walks a source tree, skipping directories and excluded paths.
///
/// # Examples
///
/// ```no_run
/// use modzip_core::walker::ModuleWalker;
/// use modzip_core::walker::Visit;
/// use regex::Regex;
/// use std::path::Path;
///
/// let exclude = Regex::new(r"/\.git/").unwrap();
/// let walker = ModuleWalker::new(Path::new("./project"), Some(&exclude));
///
/// for visit in walker.walk() {
///     if let Visit::Entry(node) = visit.unwrap() {
///         println!("would add: {}", node.path.display());
///     }
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ModuleWalker<'a> {
    root: &'a Path,
    exclude: Option<&'a Regex>,
}

impl<'a> ModuleWalker<'a> {
    /// Creates a walker for `root`.
    ///
    /// `exclude` is matched anywhere in each visited path; `None` excludes
    /// nothing. Paths that are not valid UTF-8 are matched in their lossy
    /// form, with U+FFFD in place of the invalid bytes.
    #[must_use]
    pub fn new(root: &'a Path, exclude: Option<&'a Regex>) -> Self {
        Self { root, exclude }
    }

    /// Returns an iterator over the visited non-directory nodes.
    ///
    /// Directories are descended into but never yielded, even when they match
    /// the exclusion pattern; their children are tested one by one.
    ///
    /// # Errors
    ///
    /// Items are errors if the walk cannot read a directory or a node's
    /// metadata. Callers abort on the first error.
    pub fn walk(&self) -> impl Iterator<Item = Result<Visit>> + 'a {
        let exclude = self.exclude;

        WalkDir::new(self.root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_map(move |entry| match entry {
                Ok(entry) => classify(&entry, exclude).transpose(),
                Err(e) => Some(Err(traversal_error(e))),
            })
    }
}

/// Outcome of visiting one non-directory node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Visit {
    /// Node to be materialized and archived.
    Entry(SourceNode),

    /// Node skipped because its path matched the exclusion pattern.
    Excluded(PathBuf),
}

/// A non-directory node that passed the exclusion filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceNode {
    /// Full filesystem path of the node.
    pub path: PathBuf,

    /// How the node is stored.
    pub kind: EntryKind,
}

fn classify(entry: &walkdir::DirEntry, exclude: Option<&Regex>) -> Result<Option<Visit>> {
    let path = entry.path();

    // Not following links, so this is the node's own lstat.
    let metadata = entry.metadata().map_err(|e| stat_error(path, e))?;
    let file_type = metadata.file_type();
    if file_type.is_dir() {
        return Ok(None);
    }

    if let Some(pattern) = exclude
        && pattern.is_match(&path.to_string_lossy())
    {
        debug!(path = %path.display(), "excluding path from module archive");
        return Ok(Some(Visit::Excluded(path.to_path_buf())));
    }

    let kind = if file_type.is_symlink() {
        EntryKind::Symlink
    } else {
        EntryKind::File
    };

    Ok(Some(Visit::Entry(SourceNode {
        path: path.to_path_buf(),
        kind,
    })))
}

fn traversal_error(err: walkdir::Error) -> ArchiveError {
    let path = err.path().map(Path::to_path_buf).unwrap_or_default();
    ArchiveError::Traversal { path, source: err }
}

fn stat_error(path: &Path, err: walkdir::Error) -> ArchiveError {
    let source = err
        .into_io_error()
        .unwrap_or_else(|| std::io::Error::other("metadata unavailable"));
    ArchiveError::Stat {
        path: path.to_path_buf(),
        source,
    }
}
