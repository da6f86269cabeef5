//! Example: packing a module directory with modzip-core
//!
//! Run with: `cargo run --example archive_module -- <dir> <module> <version> [exclude-regex]`
//!
//! Set `RUST_LOG=modzip_core=debug` to see excluded paths.

use modzip_core::ModuleArchiver;
use std::io::Cursor;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let (Some(source), Some(module), Some(version)) = (args.next(), args.next(), args.next())
    else {
        eprintln!("usage: archive_module <dir> <module> <version> [exclude-regex]");
        std::process::exit(2);
    };
    let exclude = args.next().unwrap_or_else(|| r"/\.git/".to_string());

    let archiver = ModuleArchiver::new()
        .source(&source)
        .module(&module, &version)
        .exclude_pattern(&exclude)?;

    // Example 1: pack into memory
    let mut buffer = Cursor::new(Vec::new());
    let report = archiver.write_to(&mut buffer)?;
    println!("In memory: {} bytes", buffer.get_ref().len());
    println!("  Files:    {}", report.files_added);
    println!("  Symlinks: {}", report.symlinks_added);
    println!("  Excluded: {}", report.entries_excluded);

    // Example 2: pack into a file named after the version
    let output = format!("{version}.zip");
    let report = archiver.write_to_path(&output)?;
    println!("\nWrote {output}");
    println!(
        "  {} entries, {} -> {} bytes ({:.1}% saved) in {:?}",
        report.entries_added(),
        report.bytes_written,
        report.bytes_compressed,
        report.compression_percentage(),
        report.duration
    );

    Ok(())
}
