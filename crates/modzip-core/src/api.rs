//! High-level public API for packing module archives.

use std::fs::File;
use std::io::BufWriter;
use std::io::Seek;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::time::Instant;

use regex::Regex;
use tracing::debug;
use tracing::warn;

use crate::ArchiveConfig;
use crate::ArchiveError;
use crate::ArchiveReport;
use crate::ModuleVersion;
use crate::Result;
use crate::entry::ArchivableEntry;
use crate::entry::LocalFs;
use crate::entry::SourceFs;
use crate::walker::ModuleWalker;
use crate::walker::Visit;
use crate::writer::ModuleZipWriter;

/// Packs the tree at `source_path` into a module ZIP written to `sink`.
///
/// Every non-directory node whose full path does not match `exclude`
/// (matched anywhere in the path, not anchored) becomes an entry named
/// `module@version/<relative-path>`. Symlinks are stored as their target
/// text. Entries are deflated at level 6.
///
/// Pass `&mut sink` to keep using the sink afterwards.
///
/// # Errors
///
/// Returns the first error encountered; the walk stops there. The archive
/// trailer is still written on a best-effort basis, so after a failure the
/// sink may hold a truncated but readable archive.
///
/// # Examples
///
/// ```no_run
/// use modzip_core::archive_project;
/// use regex::Regex;
/// use std::fs::File;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let exclude = Regex::new(r"/\.git/")?;
/// let out = File::create("v1.2.3.zip")?;
/// let report = archive_project(out, "./widgets", "example.com/widgets", "v1.2.3", &exclude)?;
/// println!("Packed {} entries", report.entries_added());
/// # Ok(())
/// # }
/// ```
pub fn archive_project<W: Write + Seek, P: AsRef<Path>>(
    sink: W,
    source_path: P,
    module: &str,
    version: &str,
    exclude: &Regex,
) -> Result<ArchiveReport> {
    let config = ArchiveConfig::default().with_exclude(exclude.clone());
    archive_project_with_config(sink, source_path, &ModuleVersion::new(module, version), &config)
}

/// Packs a module archive with full configuration control.
///
/// # Errors
///
/// See [`archive_project`]. Also fails with a precondition error if the
/// configuration is invalid or `source_path` is not an existing directory.
pub fn archive_project_with_config<W: Write + Seek, P: AsRef<Path>>(
    sink: W,
    source_path: P,
    module: &ModuleVersion,
    config: &ArchiveConfig,
) -> Result<ArchiveReport> {
    archive_into(sink, source_path.as_ref(), module, config, &LocalFs).map(|(report, _)| report)
}

/// Packs a module archive into a newly created file at `output`.
///
/// An existing file at `output` is truncated. If `output` lies inside
/// `source_path` it is left out of the archive.
///
/// # Errors
///
/// See [`archive_project_with_config`]. Also fails if the output file
/// cannot be created or flushed.
///
/// # Examples
///
/// ```no_run
/// use modzip_core::ArchiveConfig;
/// use modzip_core::ModuleVersion;
/// use modzip_core::archive_project_to_path;
///
/// let config = ArchiveConfig::default().with_exclude_pattern(r"/testdata/")?;
/// let module = ModuleVersion::new("example.com/widgets", "v1.2.3");
/// let report = archive_project_to_path("v1.2.3.zip", "./widgets", &module, &config)?;
/// println!("{} bytes", report.bytes_compressed);
/// # Ok::<(), modzip_core::ArchiveError>(())
/// ```
pub fn archive_project_to_path<P: AsRef<Path>, Q: AsRef<Path>>(
    output: P,
    source_path: Q,
    module: &ModuleVersion,
    config: &ArchiveConfig,
) -> Result<ArchiveReport> {
    archive_into_file(output.as_ref(), source_path.as_ref(), module, config, &LocalFs)
}

/// Creates `output` once the preconditions hold, packs into it and syncs it.
pub(crate) fn archive_into_file<F: SourceFs + ?Sized>(
    output: &Path,
    source: &Path,
    module: &ModuleVersion,
    config: &ArchiveConfig,
    fs: &F,
) -> Result<ArchiveReport> {
    check_preconditions(source, config)?;

    let file = File::create(output)?;
    let own_output = output_within_source(output, source)?;
    let (report, sink) = archive_into_skipping(
        BufWriter::new(file),
        source,
        module,
        config,
        fs,
        own_output.as_deref(),
    )?;
    sink.into_inner()
        .map_err(std::io::IntoInnerError::into_error)?
        .sync_all()?;

    Ok(report)
}

/// Walks, materializes and writes every entry, then finalizes the archive.
///
/// The writer is finalized on both the success and the failure path; on
/// failure the finalize result is dropped in favor of the first error.
pub(crate) fn archive_into<W, F>(
    sink: W,
    source: &Path,
    module: &ModuleVersion,
    config: &ArchiveConfig,
    fs: &F,
) -> Result<(ArchiveReport, W)>
where
    W: Write + Seek,
    F: SourceFs + ?Sized,
{
    archive_into_skipping(sink, source, module, config, fs, None)
}

/// Like [`archive_into`], leaving out the node at `skip` (relative to
/// `source`), which is the archive being written.
fn archive_into_skipping<W, F>(
    sink: W,
    source: &Path,
    module: &ModuleVersion,
    config: &ArchiveConfig,
    fs: &F,
    skip: Option<&Path>,
) -> Result<(ArchiveReport, W)>
where
    W: Write + Seek,
    F: SourceFs + ?Sized,
{
    check_preconditions(source, config)?;

    let start = Instant::now();
    let mut writer = ModuleZipWriter::new(sink, config)?;

    match write_entries(&mut writer, source, module, config, fs, skip) {
        Ok(entries_excluded) => {
            let archive = writer.finish()?;

            let mut report = ArchiveReport::from_writer(archive.stats, entries_excluded);
            report.bytes_compressed = archive.bytes_compressed;
            report.duration = start.elapsed();

            debug!(
                module = %module,
                entries = report.entries_added(),
                excluded = report.entries_excluded,
                bytes = report.bytes_compressed,
                "module archive written"
            );
            Ok((report, archive.sink))
        }
        Err(err) => {
            if let Err(finish_err) = writer.finish() {
                warn!(error = %finish_err, "could not finalize archive after failure");
            }
            Err(err)
        }
    }
}

fn write_entries<W, F>(
    writer: &mut ModuleZipWriter<W>,
    source: &Path,
    module: &ModuleVersion,
    config: &ArchiveConfig,
    fs: &F,
    skip: Option<&Path>,
) -> Result<usize>
where
    W: Write + Seek,
    F: SourceFs + ?Sized,
{
    let walker = ModuleWalker::new(source, config.exclude.as_ref());
    let mut excluded = 0;

    for visit in walker.walk() {
        match visit? {
            Visit::Excluded(_) => excluded += 1,
            Visit::Entry(node) if skip.is_some() && node.path.strip_prefix(source).ok() == skip => {
                debug!(path = %node.path.display(), "leaving archive output out of itself");
            }
            Visit::Entry(node) => {
                let name = module.entry_name(source, &node.path)?;
                let entry = ArchivableEntry::materialize(&node.path, node.kind, fs)?;
                writer.add_entry(&name, entry)?;
            }
        }
    }

    Ok(excluded)
}

/// Returns the location of `output` relative to `source` when the output
/// file sits inside the tree being packed.
///
/// Both paths are canonicalized; the walk never follows symlinks, so a node
/// below the canonical source is reached at the same relative path.
fn output_within_source(output: &Path, source: &Path) -> Result<Option<PathBuf>> {
    let canonical = |path: &Path| {
        std::fs::canonicalize(path).map_err(|source| ArchiveError::Stat {
            path: path.to_path_buf(),
            source,
        })
    };
    let output = canonical(output)?;
    let source = canonical(source)?;

    Ok(output.strip_prefix(&source).ok().map(Path::to_path_buf))
}

fn check_preconditions(source: &Path, config: &ArchiveConfig) -> Result<()> {
    config.validate()?;

    match std::fs::metadata(source) {
        Ok(metadata) if metadata.is_dir() => Ok(()),
        Ok(_) => Err(ArchiveError::NotADirectory {
            path: source.to_path_buf(),
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(ArchiveError::SourceNotFound {
            path: source.to_path_buf(),
        }),
        Err(source_err) => Err(ArchiveError::Stat {
            path: source.to_path_buf(),
            source: source_err,
        }),
    }
}
