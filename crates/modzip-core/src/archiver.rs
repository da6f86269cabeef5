//! Builder for packing module archives with a fluent API.

use std::io::Seek;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use regex::Regex;

use crate::ArchiveConfig;
use crate::ArchiveError;
use crate::ArchiveReport;
use crate::ModuleVersion;
use crate::Result;
use crate::api::archive_into;
use crate::api::archive_into_file;
use crate::entry::LocalFs;
use crate::entry::SourceFs;

/// Builder for packing a module archive.
///
/// # Examples
///
/// ```no_run
/// use modzip_core::ModuleArchiver;
///
/// let report = ModuleArchiver::new()
///     .source("./widgets")
///     .module("example.com/widgets", "v1.2.3")
///     .exclude_pattern(r"/\.git/")?
///     .compression_level(9)
///     .write_to_path("v1.2.3.zip")?;
///
/// println!("Packed {} entries", report.entries_added());
/// # Ok::<(), modzip_core::ArchiveError>(())
/// ```
#[derive(Debug)]
pub struct ModuleArchiver<F: SourceFs = LocalFs> {
    source: Option<PathBuf>,
    module: Option<ModuleVersion>,
    config: ArchiveConfig,
    fs: F,
}

impl Default for ModuleArchiver {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleArchiver {
    /// Creates a new `ModuleArchiver` reading from the local filesystem.
    #[must_use]
    pub fn new() -> Self {
        Self {
            source: None,
            module: None,
            config: ArchiveConfig::default(),
            fs: LocalFs,
        }
    }
}

impl<F: SourceFs> ModuleArchiver<F> {
    /// Sets the root directory to pack.
    #[must_use]
    pub fn source<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.source = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the module path and version used to prefix entry names.
    ///
    /// # Examples
    ///
    /// ```
    /// use modzip_core::ModuleArchiver;
    ///
    /// let archiver = ModuleArchiver::new().module("example.com/widgets", "v1.2.3");
    /// ```
    #[must_use]
    pub fn module(mut self, module: impl Into<String>, version: impl Into<String>) -> Self {
        self.module = Some(ModuleVersion::new(module, version));
        self
    }

    /// Sets the full configuration, replacing earlier settings.
    #[must_use]
    pub fn config(mut self, config: ArchiveConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the exclusion pattern.
    #[must_use]
    pub fn exclude(mut self, pattern: Regex) -> Self {
        self.config.exclude = Some(pattern);
        self
    }

    /// Compiles and sets the exclusion pattern.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::InvalidPattern`] if the pattern does not
    /// compile.
    pub fn exclude_pattern(mut self, pattern: &str) -> Result<Self> {
        self.config.exclude = Some(Regex::new(pattern)?);
        Ok(self)
    }

    /// Sets the compression level (0 = stored, 1-9 = deflate).
    #[must_use]
    pub fn compression_level(mut self, level: u8) -> Self {
        self.config.compression_level = Some(level);
        self
    }

    /// Sets whether to record permission bits.
    ///
    /// Default: `true`.
    #[must_use]
    pub fn preserve_permissions(mut self, preserve: bool) -> Self {
        self.config.preserve_permissions = preserve;
        self
    }

    /// Replaces the filesystem entries are read through.
    #[must_use]
    pub fn filesystem<G: SourceFs>(self, fs: G) -> ModuleArchiver<G> {
        ModuleArchiver {
            source: self.source,
            module: self.module,
            config: self.config,
            fs,
        }
    }

    /// Packs the archive into `sink`.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::InvalidConfiguration`] if the source or the
    /// module is not set, and otherwise any error of
    /// [`archive_project_with_config`](crate::archive_project_with_config).
    pub fn write_to<W: Write + Seek>(&self, sink: W) -> Result<ArchiveReport> {
        let (source, module) = self.required()?;
        archive_into(sink, source, module, &self.config, &self.fs).map(|(report, _)| report)
    }

    /// Packs the archive into a newly created file at `output`.
    ///
    /// # Errors
    ///
    /// See [`write_to`](Self::write_to). Also fails if the output file
    /// cannot be created or flushed.
    pub fn write_to_path<P: AsRef<Path>>(&self, output: P) -> Result<ArchiveReport> {
        let (source, module) = self.required()?;
        archive_into_file(output.as_ref(), source, module, &self.config, &self.fs)
    }

    fn required(&self) -> Result<(&Path, &ModuleVersion)> {
        let source = self
            .source
            .as_deref()
            .ok_or_else(|| ArchiveError::InvalidConfiguration {
                reason: "source directory not set".to_string(),
            })?;
        let module = self
            .module
            .as_ref()
            .ok_or_else(|| ArchiveError::InvalidConfiguration {
                reason: "module and version not set".to_string(),
            })?;
        Ok((source, module))
    }
}
