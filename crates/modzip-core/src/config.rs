//! Configuration for module archiving.

use crate::ArchiveError;
use crate::Result;
use regex::Regex;
use zip::CompressionMethod;
use zip::DateTime;
use zip::write::SimpleFileOptions;

/// Default deflate level, balanced between speed and size.
pub const DEFAULT_COMPRESSION_LEVEL: u8 = 6;

/// Configuration for packing a module archive.
///
/// # Examples
///
/// ```
/// use modzip_core::ArchiveConfig;
///
/// // Nothing excluded, deflate level 6
/// let config = ArchiveConfig::default();
///
/// // Skip VCS metadata and store entries uncompressed
/// let custom = ArchiveConfig::default()
///     .with_exclude_pattern(r"/\.git/")?
///     .with_compression_level(0);
/// assert!(custom.validate().is_ok());
/// # Ok::<(), modzip_core::ArchiveError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ArchiveConfig {
    /// Pattern tested against the full path of every visited entry.
    ///
    /// A match anywhere in the path excludes the entry; the pattern is not
    /// anchored. `None` excludes nothing.
    ///
    /// Default: `None`.
    pub exclude: Option<Regex>,

    /// Compression level.
    ///
    /// `0` stores entries uncompressed, `1`-`9` select deflate levels.
    /// `None` uses the `zip` crate's deflate default.
    ///
    /// Default: `Some(6)`.
    pub compression_level: Option<u8>,

    /// Record Unix permission bits of files and links in the archive.
    ///
    /// Default: `true`.
    pub preserve_permissions: bool,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            exclude: None,
            compression_level: Some(DEFAULT_COMPRESSION_LEVEL),
            preserve_permissions: true,
        }
    }
}

impl ArchiveConfig {
    /// Creates a new `ArchiveConfig` with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a pre-compiled exclusion pattern.
    #[must_use]
    pub fn with_exclude(mut self, pattern: Regex) -> Self {
        self.exclude = Some(pattern);
        self
    }

    /// Compiles and sets an exclusion pattern.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::InvalidPattern`] if the pattern does not
    /// compile.
    pub fn with_exclude_pattern(mut self, pattern: &str) -> Result<Self> {
        self.exclude = Some(Regex::new(pattern)?);
        Ok(self)
    }

    /// Sets the compression level (0 = stored, 1-9 = deflate).
    ///
    /// Out-of-range levels are reported by [`validate`](Self::validate).
    #[must_use]
    pub fn with_compression_level(mut self, level: u8) -> Self {
        self.compression_level = Some(level);
        self
    }

    /// Sets whether to record permission bits.
    #[must_use]
    pub fn with_preserve_permissions(mut self, preserve: bool) -> Self {
        self.preserve_permissions = preserve;
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the compression level is above 9.
    pub fn validate(&self) -> Result<()> {
        if let Some(level) = self.compression_level
            && level > 9
        {
            return Err(ArchiveError::InvalidCompressionLevel { level });
        }
        Ok(())
    }

    /// Builds the base ZIP entry options for this configuration.
    ///
    /// Timestamps are pinned to the ZIP epoch so the same tree always packs
    /// to the same bytes.
    pub(crate) fn file_options(&self) -> SimpleFileOptions {
        let options = SimpleFileOptions::default().last_modified_time(DateTime::default());
        match self.compression_level {
            Some(0) => options.compression_method(CompressionMethod::Stored),
            Some(level) => options
                .compression_method(CompressionMethod::Deflated)
                .compression_level(Some(i64::from(level))),
            None => options.compression_method(CompressionMethod::Deflated),
        }
    }
}
