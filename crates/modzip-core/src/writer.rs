//! ZIP container writer for module archives.
//!
//! [`ModuleZipWriter`] owns the `zip` crate writer for the whole operation.
//! Entries are created with their final `module@version/...` names and
//! bodies are copied with an exact length; [`finish`](ModuleZipWriter::finish)
//! consumes the writer, so the central directory is written at most once.

use crate::ArchiveError;
use crate::Result;
use crate::config::ArchiveConfig;
use crate::copy::CopyBuffer;
use crate::copy::copy_exact;
use crate::entry::ArchivableEntry;
use crate::entry::EntryKind;
use std::collections::HashSet;
use std::io::Seek;
use std::io::Write;
use tracing::trace;
use tracing::warn;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// Entries at or above this size need ZIP64 headers.
const ZIP64_THRESHOLD: u64 = 0xFFFF_FFFF;

/// Running totals of what has been written so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriterStats {
    /// Regular-file entries written.
    pub files_added: usize,

    /// Symlink entries written.
    pub symlinks_added: usize,

    /// Uncompressed body bytes written across all entries.
    pub bytes_written: u64,
}

/// A finalized archive.
#[derive(Debug)]
pub struct FinishedArchive<W> {
    /// The sink, positioned after the end of the central directory.
    pub sink: W,

    /// Bytes the archive occupies in the sink.
    pub bytes_compressed: u64,

    /// Totals over every entry written.
    pub stats: WriterStats,
}

/// ZIP writer that refuses duplicate names and copies exact entry lengths.
///
/// # Examples
///
/// ```
/// use modzip_core::ArchiveConfig;
/// use modzip_core::writer::ModuleZipWriter;
/// use std::io::Cursor;
///
/// let writer = ModuleZipWriter::new(Cursor::new(Vec::new()), &ArchiveConfig::default())?;
/// let archive = writer.finish()?;
/// assert_eq!(archive.stats.files_added, 0);
/// assert!(archive.bytes_compressed > 0); // end-of-central-directory record
/// # Ok::<(), modzip_core::ArchiveError>(())
/// ```
pub struct ModuleZipWriter<W: Write + Seek> {
    zip: ZipWriter<W>,
    options: SimpleFileOptions,
    preserve_permissions: bool,
    names: HashSet<String>,
    buffer: CopyBuffer,
    start_offset: u64,
    stats: WriterStats,
}

impl<W: Write + Seek> ModuleZipWriter<W> {
    /// Starts a ZIP container at the sink's current position.
    ///
    /// # Errors
    ///
    /// Returns an error if the sink position cannot be queried.
    pub fn new(mut sink: W, config: &ArchiveConfig) -> Result<Self> {
        let start_offset = sink.stream_position()?;

        Ok(Self {
            zip: ZipWriter::new(sink),
            options: config.file_options(),
            preserve_permissions: config.preserve_permissions,
            names: HashSet::new(),
            buffer: CopyBuffer::new(),
            start_offset,
            stats: WriterStats::default(),
        })
    }

    /// Adds `entry` under `name` and copies exactly `entry.size()` bytes.
    ///
    /// Returns the number of body bytes written. The entry (and its open file
    /// handle, if any) is dropped before this returns, on every path.
    ///
    /// # Errors
    ///
    /// - [`ArchiveError::DuplicateName`] if `name` was already written
    /// - [`ArchiveError::ContainerEntry`] if the ZIP writer rejects the entry
    /// - [`ArchiveError::Copy`] on read failure, write failure or short read;
    ///   the partial entry is discarded
    pub fn add_entry(&mut self, name: &str, mut entry: ArchivableEntry) -> Result<u64> {
        if self.names.contains(name) {
            return Err(ArchiveError::DuplicateName {
                name: name.to_string(),
            });
        }

        let options = self.entry_options(&entry);
        self.zip
            .start_file(name, options)
            .map_err(|source| ArchiveError::ContainerEntry {
                name: name.to_string(),
                source,
            })?;
        self.names.insert(name.to_string());

        let size = entry.size();
        let written = match copy_exact(&mut entry, &mut self.zip, size, &mut self.buffer) {
            Ok(written) => written,
            Err(source) => {
                // Drop the half-written entry so finish() leaves only complete ones
                if let Err(abort_err) = self.zip.abort_file() {
                    warn!(name, error = %abort_err, "could not discard partial archive entry");
                }
                self.names.remove(name);
                return Err(ArchiveError::Copy {
                    path: entry.path().to_path_buf(),
                    source,
                });
            }
        };

        match entry.kind() {
            EntryKind::File => self.stats.files_added += 1,
            EntryKind::Symlink => self.stats.symlinks_added += 1,
        }
        self.stats.bytes_written += written;
        trace!(name, size = written, kind = ?entry.kind(), "added archive entry");

        Ok(written)
    }

    /// Returns the totals so far.
    #[must_use]
    pub fn stats(&self) -> WriterStats {
        self.stats
    }

    #[cfg(test)]
    fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Writes the central directory and returns the sink.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Finalize`] if the trailer cannot be written.
    pub fn finish(self) -> Result<FinishedArchive<W>> {
        let stats = self.stats;
        let start_offset = self.start_offset;
        let mut sink = self.zip.finish().map_err(ArchiveError::Finalize)?;
        let end_offset = sink.stream_position()?;

        Ok(FinishedArchive {
            sink,
            bytes_compressed: end_offset.saturating_sub(start_offset),
            stats,
        })
    }

    fn entry_options(&self, entry: &ArchivableEntry) -> SimpleFileOptions {
        let mut options = self.options;
        if entry.size() >= ZIP64_THRESHOLD {
            options = options.large_file(true);
        }
        if self.preserve_permissions
            && let Some(mode) = entry.metadata().mode
        {
            options = options.unix_permissions(mode & 0o777);
        }
        options
    }
}
