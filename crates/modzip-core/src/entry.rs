//! Materializing filesystem nodes into archivable entries.
//!
//! Every emitted node becomes one [`ArchivableEntry`]: a declared size plus a
//! byte source the writer reads exactly that many bytes from. Regular files
//! stream from their open handle; symlinks are stored as the text of their
//! target, held in memory, so the writer never has to tell the two apart.

use crate::ArchiveError;
use crate::Result;
use std::fs::File;
use std::fs::Metadata;
use std::io;
use std::io::Cursor;
use std::io::Read;
use std::path::Path;
use std::path::PathBuf;

/// Kind of a node that becomes an archive entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Regular file (or any other non-directory, non-symlink node).
    File,

    /// Symbolic link, stored as its target text.
    Symlink,
}

/// Filesystem access used while materializing entries.
///
/// [`LocalFs`] is the real implementation. Tests substitute their own to
/// inject failures that cannot be produced on disk, such as a file that
/// refuses to open when running as root.
pub trait SourceFs {
    /// Opens a regular file for reading.
    fn open(&self, path: &Path) -> io::Result<File>;

    /// Reads the target of a symbolic link without following it.
    fn read_link(&self, path: &Path) -> io::Result<PathBuf>;

    /// Reads metadata of `path` itself, not of what it points to.
    fn symlink_metadata(&self, path: &Path) -> io::Result<Metadata>;
}

/// [`SourceFs`] backed by `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl SourceFs for LocalFs {
    fn open(&self, path: &Path) -> io::Result<File> {
        File::open(path)
    }

    fn read_link(&self, path: &Path) -> io::Result<PathBuf> {
        std::fs::read_link(path)
    }

    fn symlink_metadata(&self, path: &Path) -> io::Result<Metadata> {
        std::fs::symlink_metadata(path)
    }
}

impl<T: SourceFs + ?Sized> SourceFs for &T {
    fn open(&self, path: &Path) -> io::Result<File> {
        (**self).open(path)
    }

    fn read_link(&self, path: &Path) -> io::Result<PathBuf> {
        (**self).read_link(path)
    }

    fn symlink_metadata(&self, path: &Path) -> io::Result<Metadata> {
        (**self).symlink_metadata(path)
    }
}

/// Metadata recorded for an archive entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryMetadata {
    /// Number of bytes the entry's byte source yields.
    pub size: u64,

    /// Unix mode bits of the file or link itself, when the platform has them.
    pub mode: Option<u32>,

    /// Whether the entry is a regular file or a symlink.
    pub kind: EntryKind,
}

impl EntryMetadata {
    fn from_fs(metadata: &Metadata, size: u64, kind: EntryKind) -> Self {
        Self {
            size,
            mode: unix_mode(metadata),
            kind,
        }
    }
}

#[cfg(unix)]
fn unix_mode(metadata: &Metadata) -> Option<u32> {
    use std::os::unix::fs::PermissionsExt;
    Some(metadata.permissions().mode())
}

#[cfg(not(unix))]
fn unix_mode(_metadata: &Metadata) -> Option<u32> {
    None
}

/// Byte source of an entry.
#[derive(Debug)]
pub enum ByteSource {
    /// Open handle of a regular file, closed on drop.
    File(File),

    /// In-memory bytes, used for symlink targets.
    Buffer(Cursor<Vec<u8>>),
}

impl Read for ByteSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::File(file) => file.read(buf),
            Self::Buffer(cursor) => cursor.read(buf),
        }
    }
}

/// One unit of work for the archive writer.
///
/// Created, consumed and dropped within a single traversal step, so at most
/// one source file is open at any time.
#[derive(Debug)]
pub struct ArchivableEntry {
    path: PathBuf,
    metadata: EntryMetadata,
    source: ByteSource,
}

impl ArchivableEntry {
    /// Materializes the node at `path` as an entry of the given kind.
    ///
    /// Symlinks are read with `read_link` and described by the link's own
    /// metadata; their byte source is the target text. Regular files are
    /// opened and sized from the open handle.
    ///
    /// # Errors
    ///
    /// - [`ArchiveError::LinkResolution`] if a symlink target cannot be read
    /// - [`ArchiveError::Stat`] if metadata is unavailable
    /// - [`ArchiveError::Open`] if a regular file cannot be opened
    pub fn materialize<F: SourceFs + ?Sized>(path: &Path, kind: EntryKind, fs: &F) -> Result<Self> {
        match kind {
            EntryKind::Symlink => Self::symlink(path, fs),
            EntryKind::File => Self::file(path, fs),
        }
    }

    fn symlink<F: SourceFs + ?Sized>(path: &Path, fs: &F) -> Result<Self> {
        let target = fs
            .read_link(path)
            .map_err(|source| ArchiveError::LinkResolution {
                path: path.to_path_buf(),
                source,
            })?;
        let link_metadata = fs
            .symlink_metadata(path)
            .map_err(|source| ArchiveError::Stat {
                path: path.to_path_buf(),
                source,
            })?;

        Ok(Self::from_link_target(path, target, &link_metadata))
    }

    fn file<F: SourceFs + ?Sized>(path: &Path, fs: &F) -> Result<Self> {
        let file = fs.open(path).map_err(|source| ArchiveError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let file_metadata = file.metadata().map_err(|source| ArchiveError::Stat {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Self {
            path: path.to_path_buf(),
            metadata: EntryMetadata::from_fs(&file_metadata, file_metadata.len(), EntryKind::File),
            source: ByteSource::File(file),
        })
    }

    /// Builds a symlink entry from an already-read target and the link's own
    /// `symlink_metadata`.
    pub(crate) fn from_link_target(path: &Path, target: PathBuf, link_metadata: &Metadata) -> Self {
        let bytes = target.into_os_string().into_encoded_bytes();
        let size = bytes.len() as u64;

        Self {
            path: path.to_path_buf(),
            metadata: EntryMetadata::from_fs(link_metadata, size, EntryKind::Symlink),
            source: ByteSource::Buffer(Cursor::new(bytes)),
        }
    }

    /// Returns the filesystem path this entry was read from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the entry metadata.
    #[must_use]
    pub fn metadata(&self) -> &EntryMetadata {
        &self.metadata
    }

    /// Returns the declared body length in bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.metadata.size
    }

    /// Returns the entry kind.
    #[must_use]
    pub fn kind(&self) -> EntryKind {
        self.metadata.kind
    }
}

impl Read for ArchivableEntry {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.source.read(buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    struct DenyOpen;

    impl SourceFs for DenyOpen {
        fn open(&self, _path: &Path) -> io::Result<File> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"))
        }

        fn read_link(&self, _path: &Path) -> io::Result<PathBuf> {
            Err(io::Error::new(io::ErrorKind::InvalidInput, "not a link"))
        }

        fn symlink_metadata(&self, path: &Path) -> io::Result<Metadata> {
            fs::symlink_metadata(path)
        }
    }

    #[test]
    fn test_regular_file_entry() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("x.go");
        fs::write(&path, "package x").unwrap();

        let mut entry = ArchivableEntry::materialize(&path, EntryKind::File, &LocalFs).unwrap();
        assert_eq!(entry.kind(), EntryKind::File);
        assert_eq!(entry.size(), 9);
        assert_eq!(entry.path(), path);

        let mut body = String::new();
        entry.read_to_string(&mut body).unwrap();
        assert_eq!(body, "package x");
    }

    #[test]
    fn test_empty_file_entry() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("empty");
        fs::write(&path, "").unwrap();

        let entry = ArchivableEntry::materialize(&path, EntryKind::File, &LocalFs).unwrap();
        assert_eq!(entry.size(), 0);
    }

    #[test]
    fn test_missing_file_is_open_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("gone.go");

        let err = ArchivableEntry::materialize(&path, EntryKind::File, &LocalFs).unwrap_err();
        assert!(matches!(err, ArchiveError::Open { .. }));
        assert_eq!(err.path(), Some(path.as_path()));
    }

    #[test]
    fn test_injected_open_failure() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("locked.go");
        fs::write(&path, "package locked").unwrap();

        let err = ArchivableEntry::materialize(&path, EntryKind::File, &DenyOpen).unwrap_err();
        assert!(matches!(err, ArchiveError::Open { .. }));
    }

    #[test]
    fn test_link_resolution_failure() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("plain");
        fs::write(&path, "data").unwrap();

        let err = ArchivableEntry::materialize(&path, EntryKind::Symlink, &DenyOpen).unwrap_err();
        assert!(matches!(err, ArchiveError::LinkResolution { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_from_link_target_sizes_by_target_text() {
        let temp = TempDir::new().unwrap();
        let link = temp.path().join("link");
        std::os::unix::fs::symlink("../shared/util.go", &link).unwrap();
        let metadata = fs::symlink_metadata(&link).unwrap();

        let mut entry = ArchivableEntry::from_link_target(
            &link,
            PathBuf::from("../shared/util.go"),
            &metadata,
        );
        assert_eq!(entry.kind(), EntryKind::Symlink);
        assert_eq!(entry.size(), 17);

        let mut body = Vec::new();
        entry.read_to_end(&mut body).unwrap();
        assert_eq!(body, b"../shared/util.go");
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_entry_stores_target_not_content() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::write(root.join("x.go"), "package x").unwrap();
        std::os::unix::fs::symlink("x.go", root.join("link")).unwrap();

        let mut entry =
            ArchivableEntry::materialize(&root.join("link"), EntryKind::Symlink, &LocalFs).unwrap();
        assert_eq!(entry.kind(), EntryKind::Symlink);
        assert_eq!(entry.size(), 4);

        let mut body = String::new();
        entry.read_to_string(&mut body).unwrap();
        assert_eq!(body, "x.go");
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_symlink_is_still_materialized() {
        let temp = TempDir::new().unwrap();
        let link = temp.path().join("dangling");
        std::os::unix::fs::symlink("does/not/exist", &link).unwrap();

        let entry = ArchivableEntry::materialize(&link, EntryKind::Symlink, &LocalFs).unwrap();
        assert_eq!(entry.size(), "does/not/exist".len() as u64);
    }

    #[cfg(unix)]
    #[test]
    fn test_file_mode_recorded() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let path = temp.path().join("run.sh");
        fs::write(&path, "#!/bin/sh\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();

        let entry = ArchivableEntry::materialize(&path, EntryKind::File, &LocalFs).unwrap();
        assert_eq!(entry.metadata().mode.map(|m| m & 0o777), Some(0o755));
    }
}
