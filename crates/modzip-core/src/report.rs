//! Module archiving reporting.

use crate::writer::WriterStats;
use std::time::Duration;

/// Report of a completed archiving pass.
///
/// # Examples
///
/// ```
/// use modzip_core::ArchiveReport;
///
/// let mut report = ArchiveReport::default();
/// report.files_added = 10;
/// report.bytes_written = 1024;
/// report.bytes_compressed = 512;
///
/// assert_eq!(report.compression_ratio(), 2.0);
/// assert_eq!(report.compression_percentage(), 50.0);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveReport {
    /// Regular files added to the archive.
    pub files_added: usize,

    /// Symlinks added to the archive (stored as their target text).
    pub symlinks_added: usize,

    /// Paths skipped because they matched the exclusion pattern.
    pub entries_excluded: usize,

    /// Total entry body bytes (uncompressed).
    pub bytes_written: u64,

    /// Size of the finished archive in the sink.
    pub bytes_compressed: u64,

    /// Duration of the archiving pass.
    pub duration: Duration,
}

impl ArchiveReport {
    /// Creates a new empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_writer(stats: WriterStats, entries_excluded: usize) -> Self {
        Self {
            files_added: stats.files_added,
            symlinks_added: stats.symlinks_added,
            entries_excluded,
            bytes_written: stats.bytes_written,
            ..Self::default()
        }
    }

    /// Returns the number of entries in the archive.
    #[must_use]
    pub fn entries_added(&self) -> usize {
        self.files_added + self.symlinks_added
    }

    /// Returns the compression ratio (uncompressed / compressed).
    ///
    /// Returns 0.0 if either side is 0.
    #[must_use]
    pub fn compression_ratio(&self) -> f64 {
        if self.bytes_compressed == 0 || self.bytes_written == 0 {
            return 0.0;
        }
        self.bytes_written as f64 / self.bytes_compressed as f64
    }

    /// Returns the compression percentage (space saved).
    ///
    /// Returns 0.0 if nothing was written or the archive is larger than its
    /// contents, which is common for small modules because of ZIP headers.
    #[must_use]
    pub fn compression_percentage(&self) -> f64 {
        if self.bytes_written == 0 {
            return 0.0;
        }
        let saved = self.bytes_written.saturating_sub(self.bytes_compressed);
        (saved as f64 / self.bytes_written as f64) * 100.0
    }
}
