//! Error types for module archiving operations.

use std::path::Path;
use std::path::PathBuf;
use thiserror::Error;
use zip::result::ZipError;

/// Result type alias using `ArchiveError`.
pub type Result<T> = std::result::Result<T, ArchiveError>;

/// Coarse classification of an [`ArchiveError`].
///
/// Every failure aborts the whole archiving pass; the kind tells callers which
/// stage gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The directory walk itself could not continue.
    Traversal,
    /// A symlink's target could not be read.
    LinkResolution,
    /// Metadata for a file or link was unavailable.
    Stat,
    /// A regular file could not be opened for reading.
    Open,
    /// The ZIP container rejected a new entry.
    ContainerEntry,
    /// Streaming entry bytes into the container failed.
    Copy,
    /// Writing the central directory failed.
    Finalize,
    /// Inputs were rejected before any entry was written.
    Precondition,
    /// Any other I/O failure (e.g. creating the output file).
    Io,
}

/// Errors that can occur while packing a module archive.
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// I/O operation failed outside of entry processing.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Source directory does not exist.
    #[error("source path not found: {path}")]
    SourceNotFound {
        /// The missing source path.
        path: PathBuf,
    },

    /// Source path exists but is not a directory.
    #[error("source path is not a directory: {path}")]
    NotADirectory {
        /// The offending source path.
        path: PathBuf,
    },

    /// Exclusion pattern failed to compile.
    #[error("invalid exclusion pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// Required builder input is missing or inconsistent.
    #[error("invalid configuration: {reason}")]
    InvalidConfiguration {
        /// What is wrong with the configuration.
        reason: String,
    },

    /// Compression level is outside 0-9.
    #[error("invalid compression level {level}, must be 0-9")]
    InvalidCompressionLevel {
        /// The rejected level.
        level: u8,
    },

    /// Directory traversal failed.
    #[error("cannot traverse {path}: {source}")]
    Traversal {
        /// Path being visited when the walk failed.
        path: PathBuf,
        /// Underlying walk error.
        #[source]
        source: walkdir::Error,
    },

    /// Symlink target could not be read.
    #[error("cannot read symlink target for {path}: {source}")]
    LinkResolution {
        /// The symlink path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Metadata could not be read.
    #[error("cannot read metadata for {path}: {source}")]
    Stat {
        /// The path whose metadata was requested.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Regular file could not be opened.
    #[error("cannot open {path}: {source}")]
    Open {
        /// The file path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A path is not valid UTF-8, so it has no ZIP entry name.
    #[error("path is not valid UTF-8 and cannot be named in the archive: {path}")]
    NonUtf8Path {
        /// The offending filesystem path.
        path: PathBuf,
    },

    /// An entry with the same name was already written.
    #[error("duplicate archive entry: {name}")]
    DuplicateName {
        /// The archive entry name.
        name: String,
    },

    /// The ZIP writer refused to start a new entry.
    #[error("cannot create archive entry {name}: {source}")]
    ContainerEntry {
        /// The archive entry name.
        name: String,
        /// Underlying ZIP error.
        #[source]
        source: ZipError,
    },

    /// Copying entry bytes failed (read error, write error or short read).
    #[error("failed to copy {path} into the archive: {source}")]
    Copy {
        /// The source path being copied.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Writing the ZIP central directory failed.
    #[error("failed to finish ZIP archive: {0}")]
    Finalize(#[source] ZipError),
}

impl ArchiveError {
    /// Returns the classification of this error.
    ///
    /// # Examples
    ///
    /// ```
    /// use modzip_core::ArchiveError;
    /// use modzip_core::ErrorKind;
    ///
    /// let err = ArchiveError::DuplicateName {
    ///     name: "m@v1.0.0/a.go".to_string(),
    /// };
    /// assert_eq!(err.kind(), ErrorKind::ContainerEntry);
    /// ```
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Io(_) => ErrorKind::Io,
            Self::SourceNotFound { .. }
            | Self::NotADirectory { .. }
            | Self::InvalidPattern(_)
            | Self::InvalidConfiguration { .. }
            | Self::InvalidCompressionLevel { .. } => ErrorKind::Precondition,
            Self::Traversal { .. } => ErrorKind::Traversal,
            Self::LinkResolution { .. } => ErrorKind::LinkResolution,
            Self::Stat { .. } => ErrorKind::Stat,
            Self::Open { .. } => ErrorKind::Open,
            Self::NonUtf8Path { .. } | Self::DuplicateName { .. } | Self::ContainerEntry { .. } => {
                ErrorKind::ContainerEntry
            }
            Self::Copy { .. } => ErrorKind::Copy,
            Self::Finalize(_) => ErrorKind::Finalize,
        }
    }

    /// Returns the filesystem path the error refers to, if any.
    ///
    /// Traversal errors report the path walkdir was visiting, which may be
    /// absent for errors raised before the first entry.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::SourceNotFound { path }
            | Self::NotADirectory { path }
            | Self::Traversal { path, .. }
            | Self::LinkResolution { path, .. }
            | Self::Stat { path, .. }
            | Self::Open { path, .. }
            | Self::NonUtf8Path { path }
            | Self::Copy { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Returns the archive entry name the error refers to, if any.
    #[must_use]
    pub fn entry_name(&self) -> Option<&str> {
        match self {
            Self::DuplicateName { name } | Self::ContainerEntry { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Returns `true` if the archive may already hold some entries.
    ///
    /// Precondition failures are raised before the ZIP writer exists, so
    /// nothing was written to the sink.
    #[must_use]
    pub const fn may_leave_partial_archive(&self) -> bool {
        !matches!(self.kind(), ErrorKind::Precondition | ErrorKind::Io)
    }
}
