//! Packs a source tree into a module ZIP archive.
//!
//! `modzip-core` walks a directory and writes every non-directory node into
//! a ZIP container under `module@version/<relative-path>`, the layout module
//! proxies serve. Paths matching an exclusion pattern are skipped, symlinks
//! are stored as the text of their target, and file bodies are copied with
//! their exact declared length. The first failure aborts the walk, but the
//! archive trailer is always written.
//!
//! # Examples
//!
//! ```no_run
//! use modzip_core::archive_project;
//! use regex::Regex;
//! use std::fs::File;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let exclude = Regex::new(r"/\.git/|/testdata/")?;
//! let out = File::create("v1.4.0.zip")?;
//! let report = archive_project(out, "./widgets", "github.com/acme/widgets", "v1.4.0", &exclude)?;
//! println!("Packed {} entries", report.entries_added());
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod api;
pub mod archiver;
pub mod config;
pub mod copy;
pub mod entry;
pub mod error;
pub mod naming;
pub mod report;
pub mod walker;
pub mod writer;

// Re-export main API types
pub use api::archive_project;
pub use api::archive_project_to_path;
pub use api::archive_project_with_config;
pub use archiver::ModuleArchiver;
pub use config::ArchiveConfig;
pub use error::ArchiveError;
pub use error::ErrorKind;
pub use error::Result;
pub use naming::ModuleVersion;
pub use naming::archive_name;
pub use report::ArchiveReport;

pub use entry::ArchivableEntry;
pub use entry::EntryKind;
pub use entry::LocalFs;
pub use entry::SourceFs;
