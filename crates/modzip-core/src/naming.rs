//! Archive entry naming.
//!
//! Module proxies expect every entry of a module ZIP to live under a single
//! top-level directory named `module@version`. This module computes those
//! names from filesystem paths.

use crate::ArchiveError;
use crate::Result;
use std::fmt;
use std::path::Path;

/// Separator used inside ZIP entry names, regardless of the host platform.
pub const ZIP_SEPARATOR: char = '/';

/// A module path paired with one of its versions.
///
/// Rendered as `module@version`, which is the top-level directory of every
/// entry in the produced archive. Neither part is validated.
///
/// # Examples
///
/// ```
/// use modzip_core::ModuleVersion;
///
/// let id = ModuleVersion::new("github.com/acme/widgets", "v1.4.0");
/// assert_eq!(id.to_string(), "github.com/acme/widgets@v1.4.0");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModuleVersion {
    module: String,
    version: String,
}

impl ModuleVersion {
    /// Creates a new module identifier.
    #[must_use]
    pub fn new(module: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            version: version.into(),
        }
    }

    /// Returns the module path.
    #[must_use]
    pub fn module(&self) -> &str {
        &self.module
    }

    /// Returns the version string.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Computes the archive entry name for `entry_path` under `source_path`.
    ///
    /// See [`archive_name`]. Unlike it, paths that are not valid UTF-8 are
    /// rejected rather than converted lossily, so distinct paths can never
    /// share a name.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::NonUtf8Path`] if either path is not valid
    /// UTF-8.
    pub fn entry_name(&self, source_path: &Path, entry_path: &Path) -> Result<String> {
        for path in [source_path, entry_path] {
            if path.to_str().is_none() {
                return Err(ArchiveError::NonUtf8Path {
                    path: entry_path.to_path_buf(),
                });
            }
        }
        Ok(archive_name(source_path, entry_path, &self.module, &self.version))
    }
}

impl fmt::Display for ModuleVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.module, self.version)
    }
}

/// Computes the archive name `module@version/relative-path` for an entry.
///
/// The `source_path` prefix is removed from `entry_path` as a plain string
/// prefix, then any leading path separators are trimmed. The remainder is
/// joined to `module@version` with `/`, and host separators inside it are
/// converted to `/`. No `..` or duplicate-separator normalization happens;
/// the walker only supplies paths physically under `source_path`.
///
/// If `entry_path` does not start with `source_path` the whole entry path is
/// used as the relative part. Non-UTF-8 bytes are replaced with U+FFFD; use
/// [`ModuleVersion::entry_name`] to reject such paths instead.
///
/// # Examples
///
/// ```
/// use modzip_core::archive_name;
/// use std::path::Path;
///
/// let name = archive_name(Path::new("/a/b"), Path::new("/a/b/c/d.go"), "mod", "v1.2.3");
/// assert_eq!(name, "mod@v1.2.3/c/d.go");
/// ```
#[must_use]
pub fn archive_name(source_path: &Path, entry_path: &Path, module: &str, version: &str) -> String {
    let source = source_path.to_string_lossy();
    let entry = entry_path.to_string_lossy();

    let relative = entry.strip_prefix(source.as_ref()).unwrap_or(entry.as_ref());
    let relative = relative.trim_start_matches(std::path::is_separator);

    let mut name = format!("{module}@{version}");
    if relative.is_empty() {
        return name;
    }
    name.push(ZIP_SEPARATOR);
    push_with_zip_separators(&mut name, relative);
    name
}

#[cfg(windows)]
fn push_with_zip_separators(name: &mut String, relative: &str) {
    name.extend(relative.chars().map(|c| {
        if std::path::is_separator(c) {
            ZIP_SEPARATOR
        } else {
            c
        }
    }));
}

#[cfg(not(windows))]
fn push_with_zip_separators(name: &mut String, relative: &str) {
    name.push_str(relative);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_archive_name_basic() {
        let name = archive_name(Path::new("/a/b"), Path::new("/a/b/c/d.go"), "mod", "v1.2.3");
        assert_eq!(name, "mod@v1.2.3/c/d.go");
    }

    #[test]
    fn test_archive_name_trailing_separator_on_root() {
        let name = archive_name(Path::new("/a/b/"), Path::new("/a/b/c.go"), "m", "v1");
        assert_eq!(name, "m@v1/c.go");
    }

    #[test]
    fn test_archive_name_strips_repeated_leading_separators() {
        let name = archive_name(Path::new("/a"), Path::new("/a///x/y.go"), "m", "v1");
        assert_eq!(name, "m@v1/x/y.go");
    }

    #[test]
    fn test_archive_name_relative_root() {
        let root = PathBuf::from("project");
        let entry = root.join("pkg").join("util.go");
        let name = archive_name(&root, &entry, "example.com/p", "v0.0.1");
        assert_eq!(name, "example.com/p@v0.0.1/pkg/util.go");
    }

    #[test]
    fn test_archive_name_entry_is_root() {
        let name = archive_name(Path::new("/a/b"), Path::new("/a/b"), "m", "v1");
        assert_eq!(name, "m@v1");
    }

    #[test]
    fn test_archive_name_keeps_dot_dot_verbatim() {
        let name = archive_name(Path::new("/a"), Path::new("/a/x/../y"), "m", "v1");
        assert_eq!(name, "m@v1/x/../y");
    }

    #[test]
    fn test_archive_name_module_and_version_verbatim() {
        let name = archive_name(Path::new("/r"), Path::new("/r/f"), "Weird Mod", "not-a-semver");
        assert_eq!(name, "Weird Mod@not-a-semver/f");
    }

    #[test]
    fn test_module_version_display_and_accessors() {
        let id = ModuleVersion::new("example.com/m", "v2.0.0+incompatible");
        assert_eq!(id.module(), "example.com/m");
        assert_eq!(id.version(), "v2.0.0+incompatible");
        assert_eq!(id.to_string(), "example.com/m@v2.0.0+incompatible");
    }

    #[test]
    fn test_module_version_entry_name() {
        let id = ModuleVersion::new("m", "v1.0.0");
        assert_eq!(
            id.entry_name(Path::new("/src"), Path::new("/src/x.go")).unwrap(),
            "m@v1.0.0/x.go"
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_entry_name_rejects_non_utf8() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let id = ModuleVersion::new("m", "v1");
        let root = Path::new("/src");
        let first = root.join(OsStr::from_bytes(b"a\xff"));
        let second = root.join(OsStr::from_bytes(b"a\xfe"));

        // Lossy naming would give both the same name
        assert_eq!(
            archive_name(root, &first, "m", "v1"),
            archive_name(root, &second, "m", "v1")
        );

        let err = id.entry_name(root, &first).unwrap_err();
        assert!(matches!(err, ArchiveError::NonUtf8Path { ref path } if *path == first));
    }

    #[test]
    fn test_distinct_paths_give_distinct_names() {
        let root = Path::new("/root");
        let a = archive_name(root, Path::new("/root/a/b"), "m", "v1");
        let b = archive_name(root, Path::new("/root/a_b"), "m", "v1");
        let c = archive_name(root, Path::new("/root/ab"), "m", "v1");
        assert_ne!(a, b);
        assert_ne!(b, c);
        assert_ne!(a, c);
    }
}
