//! Main entry point for the zipexplore CLI application.
//!
//! This binary parses a ZIP archive from the local filesystem or a remote
//! HTTP URL and prints its structure, listing, or decoded contents.

use anyhow::{Context, Result};
use clap::Parser;
use std::fs::File;
use std::io::{BufReader, Read, Seek, Write};
use std::path::Path;

use zipexplore::{Cli, HttpRangeReader, LocalHeader, ZipFile, parse_with_options};

/// Read-ahead for remote sources, large enough to hold a maximal end record.
const REMOTE_BUFFER_SIZE: usize = 128 * 1024;

/// Application entry point.
///
/// Parses command-line arguments, builds the archive from the requested
/// source and dispatches to the selected output mode.
fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(cli.log_filter()))
        .format_timestamp(None)
        .init();

    if cli.is_http_url() {
        // Handle remote ZIP file via HTTP Range requests
        let reader = BufReader::with_capacity(
            REMOTE_BUFFER_SIZE,
            HttpRangeReader::new(cli.file.clone())?,
        );
        let (archive, reader) = load(reader, &cli)?;
        process_zip(&archive, &cli)?;

        // Display network transfer statistics for HTTP sources
        if !cli.is_quiet() {
            let transferred = reader.get_ref().transferred_bytes();
            eprintln!("\nTotal bytes transferred: {}", format_size(transferred));
        }
    } else {
        let file = File::open(Path::new(&cli.file))
            .with_context(|| format!("cannot open {}", cli.file))?;
        let (archive, _) = load(BufReader::new(file), &cli)?;
        process_zip(&archive, &cli)?;
    }

    Ok(())
}

/// Parse the archive, handing the source back for post-parse statistics.
fn load<R: Read + Seek>(mut source: R, cli: &Cli) -> Result<(ZipFile, R)> {
    let archive = parse_with_options(&mut source, cli.parse_options())
        .with_context(|| format!("failed to parse {}", cli.file))?;
    Ok((archive, source))
}

/// Process a parsed ZIP archive based on CLI options.
fn process_zip(archive: &ZipFile, cli: &Cli) -> Result<()> {
    if cli.structure {
        dump_structure(archive, cli);
        return Ok(());
    }

    if cli.pipe {
        return pipe_contents(archive, cli);
    }

    list_files(archive, cli);
    Ok(())
}

/// Whether an entry name is selected by the positional FILES arguments.
fn is_selected(cli: &Cli, name: &str) -> bool {
    if cli.files.is_empty() {
        return true;
    }

    cli.files.iter().any(|f| {
        if has_glob_chars(f) {
            glob_match(f, name)
        } else {
            let basename = Path::new(name)
                .file_name()
                .map(|s| s.to_string_lossy())
                .unwrap_or_default();
            name == f.as_str() || basename == *f
        }
    })
}

/// Print every local header, central directory entry and the end record.
fn dump_structure(archive: &ZipFile, cli: &Cli) {
    println!("Local headers ({}):", archive.local_headers().len());
    for header in archive.local_headers() {
        if !is_selected(cli, &header.name) {
            continue;
        }
        println!(
            "  @{:<10} {}  version={} flags={:02x}{:02x} zip64={} crc32={:08x} modified={} extra={}",
            header.offset,
            header,
            header.version,
            header.flags[0],
            header.flags[1],
            header.is_zip64,
            header.crc32,
            format_timestamp(header),
            header.extra_field.len()
        );
    }

    println!("\nCentral directory ({}):", archive.central_directory().len());
    for entry in archive.central_directory() {
        if !is_selected(cli, &entry.file_name) {
            continue;
        }
        println!(
            "  {}  version={} flags={:02x}{:02x} crc32={:08x} attrs={:08x} comment={:?}",
            entry,
            entry.version_needed,
            entry.flags[0],
            entry.flags[1],
            entry.crc32,
            entry.external_attributes,
            entry.comment
        );
    }

    let end = archive.end_record();
    println!("\nEnd of central directory:");
    println!("  @{:<10} {}", end.offset, end);
}

/// Write decoded contents of the selected entries to stdout.
fn pipe_contents(archive: &ZipFile, cli: &Cli) -> Result<()> {
    let selected: Vec<&LocalHeader> = archive
        .local_headers()
        .iter()
        .filter(|h| !h.name.ends_with('/') && is_selected(cli, &h.name))
        .collect();

    let show_filename = selected.len() > 1;
    let mut stdout = std::io::stdout().lock();

    for header in selected {
        if show_filename {
            writeln!(stdout, "--- {} ---", header.name)?;
        }
        let data = header.decompressed()?;
        stdout.write_all(&data)?;
    }

    stdout.flush()?;
    Ok(())
}

/// List files in the ZIP archive.
///
/// Supports two output formats:
/// - Simple format (`-l`): Just file names, one per line
/// - Verbose format (`-v`): Detailed table with size, compression ratio, and timestamps
fn list_files(archive: &ZipFile, cli: &Cli) {
    let verbose = cli.verbose && !cli.list;

    if verbose {
        println!(
            "{:>10}  {:>10}  {:>5}  {:>16}  {:<8}  Name",
            "Length", "Size", "Cmpr", "Modified", "Method"
        );
        println!("{}", "-".repeat(78));
    }

    let mut total_uncompressed = 0u64;
    let mut total_compressed = 0u64;
    let mut file_count = 0usize;

    for (entry, header) in archive.entries() {
        if !is_selected(cli, &entry.file_name) {
            continue;
        }

        if !verbose {
            println!("{}", entry.file_name);
            continue;
        }

        // Calculate compression ratio as percentage saved
        let ratio = if header.uncompressed_size > 0 {
            format!(
                "{:>4}%",
                100i64 - (header.compressed_size * 100 / header.uncompressed_size) as i64
            )
        } else {
            "  0%".to_string()
        };

        println!(
            "{:>10}  {:>10}  {}  {:>16}  {:<8}  {}",
            header.uncompressed_size,
            header.compressed_size,
            ratio,
            format_timestamp(header),
            header.compression_method.to_string(),
            entry.file_name
        );

        // Accumulate totals (excluding directories)
        if !entry.is_directory() {
            total_uncompressed += header.uncompressed_size;
            total_compressed += header.compressed_size;
            file_count += 1;
        }
    }

    if verbose {
        println!("{}", "-".repeat(78));
        let total_ratio = if total_uncompressed > 0 {
            format!(
                "{:>4}%",
                100i64 - (total_compressed * 100 / total_uncompressed) as i64
            )
        } else {
            "  0%".to_string()
        };
        println!(
            "{:>10}  {:>10}  {}  {:>26}  {} files",
            total_uncompressed, total_compressed, total_ratio, "", file_count
        );

        let comment = &archive.end_record().comment;
        if !comment.is_empty() && !cli.is_quiet() {
            println!("\nArchive comment: {}", comment);
        }
    }
}

fn format_timestamp(header: &LocalHeader) -> String {
    header
        .last_modified
        .map(|ts| ts.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "invalid".to_string())
}

/// Check if a pattern contains glob wildcard characters.
fn has_glob_chars(pattern: &str) -> bool {
    pattern.contains('*') || pattern.contains('?')
}

/// Simple glob pattern matching supporting `*` and `?` wildcards.
///
/// - `*` matches zero or more characters
/// - `?` matches exactly one character
fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern_chars: Vec<char> = pattern.chars().collect();
    let text_chars: Vec<char> = text.chars().collect();

    fn do_match(pattern: &[char], text: &[char]) -> bool {
        match (pattern.first(), text.first()) {
            (None, None) => true,
            (Some('*'), _) => {
                // Skip the star, or let it swallow one more character
                do_match(&pattern[1..], text) || (!text.is_empty() && do_match(pattern, &text[1..]))
            }
            (Some('?'), Some(_)) => do_match(&pattern[1..], &text[1..]),
            (Some(p), Some(t)) if *p == *t => do_match(&pattern[1..], &text[1..]),
            _ => false,
        }
    }

    do_match(&pattern_chars, &text_chars)
}

/// Format a byte size into a human-readable string.
fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}
