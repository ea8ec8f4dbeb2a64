//! jpegseg - Inspect JPEG structure and strip metadata
//!
//! This tool splits JPEG files into their marker segments and scan data,
//! lists them, or writes copies with APPn/COM segments removed while the
//! image data stays byte-for-byte identical.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser};
use jpegseg_core::{
    Error as JpegError, Image, KeepMarkers, Marker, Parser as JpegParser, ParserConfig, Unit,
};
use std::fs;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, trace, warn, Level};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

/// Inspect JPEG structure and strip metadata segments
#[derive(Parser, Debug)]
#[command(name = "jpegseg")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(flatten)]
    input: InputMode,

    /// Output directory for stripped images
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only list the units of each image without writing anything
    #[arg(long)]
    list_only: bool,

    /// Metadata marker to keep when stripping (e.g. APP2 or 0xE2); repeatable
    #[arg(long = "keep", value_name = "MARKER", value_parser = parse_marker)]
    keep: Vec<Marker>,

    /// Treat everything after the first EOI as trailing data, even if it
    /// starts another image
    #[arg(long)]
    no_concatenated: bool,

    /// Refuse images with more units than this (0 = unlimited)
    #[arg(long, default_value = "0", env = "JPEGSEG_MAX_UNITS")]
    max_units: usize,

    /// Dry run - don't write files, just show what would be written
    #[arg(long)]
    dry_run: bool,

    /// Overwrite existing files without prompting
    #[arg(long)]
    force: bool,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct InputMode {
    /// Path to a single JPEG file
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Path to a directory of JPEG files to process recursively
    #[arg(short, long)]
    directory: Option<PathBuf>,
}

/// Running totals across processed files
#[derive(Debug, Default)]
struct StripStats {
    files: usize,
    failed: usize,
    bytes_in: usize,
    bytes_out: usize,
    segments_removed: usize,
}

impl StripStats {
    fn record(&mut self, original: &Image, stripped: &Image) {
        self.files += 1;
        self.bytes_in += original.byte_len();
        self.bytes_out += stripped.byte_len();
        self.segments_removed += original
            .segments()
            .count()
            .saturating_sub(stripped.segments().count());
    }

    fn print_summary(&self) {
        info!(
            "Summary: {} stripped, {} failed, {} segments removed, {} -> {} bytes",
            self.files, self.failed, self.segments_removed, self.bytes_in, self.bytes_out
        );
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_target(false)
        .init();

    if let Some(ref file) = cli.input.file {
        process_single_file(&cli, file)
    } else if let Some(ref directory) = cli.input.directory {
        process_directory(&cli, directory)
    } else {
        bail!("Either --file or --directory must be specified")
    }
}

/// Accepts a marker name (`APP2`, case-insensitive) or a hex code (`0xE2`)
fn parse_marker(value: &str) -> std::result::Result<Marker, String> {
    if let Some(marker) = Marker::from_name(value) {
        return Ok(marker);
    }

    let hex = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .ok_or_else(|| format!("unknown marker '{}'", value))?;
    u8::from_str_radix(hex, 16)
        .map(Marker)
        .map_err(|_| format!("invalid marker code '{}'", value))
}

fn parser_for(cli: &Cli) -> JpegParser {
    JpegParser::with_config(
        ParserConfig::new()
            .concatenated_images(!cli.no_concatenated)
            .max_units(cli.max_units),
    )
}

/// Process a single JPEG file
fn process_single_file(cli: &Cli, file: &Path) -> Result<()> {
    if !file.exists() {
        bail!("Input file does not exist: {}", file.display());
    }
    if !file.is_file() {
        bail!("Input path is not a file: {}", file.display());
    }

    let name = file
        .file_name()
        .map(PathBuf::from)
        .with_context(|| format!("Input path has no file name: {}", file.display()))?;

    let mut stats = StripStats::default();
    process_jpeg(cli, file, &cli.output.join(name), &mut stats)?;

    if !cli.list_only && !cli.dry_run {
        stats.print_summary();
    }

    Ok(())
}

/// Process a directory of JPEG files recursively
fn process_directory(cli: &Cli, directory: &Path) -> Result<()> {
    if !directory.exists() {
        bail!("Directory does not exist: {}", directory.display());
    }
    if !directory.is_dir() {
        bail!("Path is not a directory: {}", directory.display());
    }

    info!("Scanning directory: {}", directory.display());

    let mut stats = StripStats::default();

    for entry in WalkDir::new(directory)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();

        if !path.is_file() {
            continue;
        }

        // Skip hidden files
        if path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with('.'))
            .unwrap_or(false)
        {
            continue;
        }

        if !is_likely_jpeg(path) {
            trace!("Skipping non-JPEG: {}", path.display());
            continue;
        }

        let relative = path.strip_prefix(directory).unwrap_or(path);
        let output_path = cli.output.join(relative);

        debug!("Processing image: {}", path.display());
        if let Err(e) = process_jpeg(cli, path, &output_path, &mut stats) {
            // Log error but continue with other files
            warn!("Error processing {}: {:#}", path.display(), e);
            stats.failed += 1;
        }
    }

    if !cli.list_only && !cli.dry_run {
        stats.print_summary();
    }

    Ok(())
}

/// Heuristic to determine if a file is a JPEG: known extension, or an
/// SOI marker in the first two bytes
fn is_likely_jpeg(path: &Path) -> bool {
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        let jpeg_extensions = ["jpg", "jpeg", "jpe", "jfif"];
        if jpeg_extensions.contains(&ext.to_lowercase().as_str()) {
            return true;
        }
    }

    if let Ok(mut file) = fs::File::open(path) {
        let mut magic = [0u8; 2];
        if file.read_exact(&mut magic).is_ok() {
            return magic == [0xFF, Marker::SOI.code()];
        }
    }

    false
}

/// Parse one file and either list it or write its stripped copy
fn process_jpeg(cli: &Cli, path: &Path, output_path: &Path, stats: &mut StripStats) -> Result<()> {
    trace!("Reading {}", path.display());
    let data = fs::read(path)
        .with_context(|| format!("Failed to read input file: {}", path.display()))?;

    let image = parser_for(cli)
        .parse(data)
        .with_context(|| format!("Failed to parse JPEG: {}", path.display()))?;

    debug!(
        "Parsed {} units ({} image(s)) from {}",
        image.len(),
        image.image_count(),
        path.display()
    );

    if cli.list_only {
        print!("{}", format_listing(path, &image));
        return Ok(());
    }

    let stripped = if cli.keep.is_empty() {
        image.strip()
    } else {
        image.strip_with(&KeepMarkers::new(cli.keep.iter().copied()))
    };

    if cli.dry_run {
        println!(
            "Would write: {} ({} -> {} bytes)",
            output_path.display(),
            image.byte_len(),
            stripped.byte_len()
        );
        return Ok(());
    }

    let written = write_image(output_path, &stripped, cli.force)?;
    println!("Wrote {} ({} bytes)", output_path.display(), written);
    stats.record(&image, &stripped);

    Ok(())
}

/// Short content digest of a unit (first 8 hex chars of blake3)
fn unit_digest(unit: &Unit) -> String {
    let hash = blake3::hash(unit.as_bytes());
    hash.to_hex()[..8].to_string()
}

/// Render one line per unit: offset, kind, marker, length, digest
fn format_listing(path: &Path, image: &Image) -> String {
    let mut out = format!(
        "{}: {} units, {} image(s), {} bytes\n",
        path.display(),
        image.len(),
        image.image_count(),
        image.byte_len()
    );

    let mut offset = 0;
    for unit in image {
        let marker = unit.marker().map(|m| m.to_string()).unwrap_or_default();
        out.push_str(&format!(
            "  {:#010x}  {:<8}  {:<6}  {:>8}  {}\n",
            offset,
            unit.kind(),
            marker,
            unit.len(),
            unit_digest(unit)
        ));
        offset += unit.len();
    }

    out
}

/// Write an image to disk, refusing to clobber existing files unless forced
fn write_image(output_path: &Path, image: &Image, force: bool) -> Result<usize> {
    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent).map_err(|e| JpegError::directory_create(parent, e))?;
    }

    if output_path.exists() && !force {
        bail!(
            "File already exists: {} (use --force to overwrite)",
            output_path.display()
        );
    }

    let file = fs::File::create(output_path).map_err(|e| JpegError::file_write(output_path, e))?;
    let mut writer = BufWriter::new(file);

    let written = image
        .write_to(&mut writer)
        .with_context(|| format!("Failed to write file: {}", output_path.display()))?;
    writer.flush().map_err(|e| JpegError::file_write(output_path, e))?;

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    /// SOI, APP1, COM, DQT, SOS, scan data, EOI
    fn sample_jpeg() -> Vec<u8> {
        let mut out = vec![0xFF, 0xD8];
        out.extend([0xFF, 0xE1, 0x00, 0x08, b'E', b'x', b'i', b'f', 0x00, 0x00]);
        out.extend([0xFF, 0xFE, 0x00, 0x04, b'h', b'i']);
        out.extend([0xFF, 0xDB, 0x00, 0x03, 0x00]);
        out.extend([0xFF, 0xDA, 0x00, 0x03, 0x01]);
        out.extend([0x11, 0xFF, 0x00, 0x22]);
        out.extend([0xFF, 0xD9]);
        out
    }

    /// The same image with APP1 and COM removed
    fn stripped_sample() -> Vec<u8> {
        let mut out = vec![0xFF, 0xD8];
        out.extend([0xFF, 0xDB, 0x00, 0x03, 0x00]);
        out.extend([0xFF, 0xDA, 0x00, 0x03, 0x01]);
        out.extend([0x11, 0xFF, 0x00, 0x22]);
        out.extend([0xFF, 0xD9]);
        out
    }

    #[test]
    fn test_parse_marker() {
        assert_eq!(parse_marker("APP2"), Ok(Marker::APP2));
        assert_eq!(parse_marker("com"), Ok(Marker::COM));
        assert_eq!(parse_marker("0xE5"), Ok(Marker::APP5));
        assert_eq!(parse_marker("0XC9"), Ok(Marker(0xC9)));
        assert!(parse_marker("APP99").is_err());
        assert!(parse_marker("0xZZ").is_err());
    }

    #[test]
    fn test_is_likely_jpeg() {
        let temp_dir = TempDir::new().unwrap();

        let by_ext = temp_dir.path().join("photo.JPG");
        fs::write(&by_ext, b"not even a jpeg").unwrap();
        assert!(is_likely_jpeg(&by_ext));

        let by_magic = temp_dir.path().join("blob");
        fs::write(&by_magic, sample_jpeg()).unwrap();
        assert!(is_likely_jpeg(&by_magic));

        let text = temp_dir.path().join("notes.txt");
        fs::write(&text, b"hello").unwrap();
        assert!(!is_likely_jpeg(&text));
    }

    #[test]
    fn test_unit_digest() {
        let image = JpegParser::new().parse(sample_jpeg()).unwrap();
        let first = unit_digest(&image.units()[0]);
        let last = unit_digest(&image.units()[image.len() - 1]);

        assert_eq!(first.len(), 8);
        assert_ne!(first, last);
    }

    #[test]
    fn test_format_listing() {
        let image = JpegParser::new().parse(sample_jpeg()).unwrap();
        let listing = format_listing(Path::new("sample.jpg"), &image);
        let lines: Vec<&str> = listing.lines().collect();

        assert_eq!(lines[0], "sample.jpg: 7 units, 1 image(s), 34 bytes");
        assert_eq!(lines.len(), 8);
        assert!(lines[2].contains("0x00000002"));
        assert!(lines[2].contains("APP1"));
        assert!(lines[6].contains("ecd"));
    }

    #[test]
    fn test_single_file_strip() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("in.jpg");
        let out_dir = temp_dir.path().join("out");
        fs::write(&input, sample_jpeg()).unwrap();

        let cli = Cli::parse_from([
            "jpegseg",
            "--file",
            input.to_str().unwrap(),
            "--output",
            out_dir.to_str().unwrap(),
        ]);
        process_single_file(&cli, &input).unwrap();

        let written = fs::read(out_dir.join("in.jpg")).unwrap();
        assert_eq!(written, stripped_sample());

        // second run refuses to overwrite
        assert!(process_single_file(&cli, &input).is_err());
    }

    #[test]
    fn test_keep_flag() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("in.jpg");
        fs::write(&input, sample_jpeg()).unwrap();

        let cli = Cli::parse_from([
            "jpegseg",
            "-f",
            input.to_str().unwrap(),
            "-o",
            temp_dir.path().join("out").to_str().unwrap(),
            "--keep",
            "COM",
        ]);
        let mut stats = StripStats::default();
        let output = temp_dir.path().join("out").join("in.jpg");
        process_jpeg(&cli, &input, &output, &mut stats).unwrap();

        let image = JpegParser::new().parse(fs::read(&output).unwrap()).unwrap();
        assert!(image.segments().any(|s| s.marker() == Marker::COM));
        assert!(image.segments().all(|s| s.marker() != Marker::APP1));
        assert_eq!(stats.segments_removed, 1);
    }

    #[test]
    fn test_directory_skips_broken_files() {
        let temp_dir = TempDir::new().unwrap();
        let input_dir = temp_dir.path().join("in");
        let out_dir = temp_dir.path().join("out");
        fs::create_dir_all(input_dir.join("nested")).unwrap();
        fs::write(input_dir.join("nested/a.jpg"), sample_jpeg()).unwrap();
        fs::write(input_dir.join("broken.jpg"), [0xFF, 0xD8, 0xFF]).unwrap();
        fs::write(input_dir.join(".hidden.jpg"), sample_jpeg()).unwrap();

        let cli = Cli::parse_from([
            "jpegseg",
            "-d",
            input_dir.to_str().unwrap(),
            "-o",
            out_dir.to_str().unwrap(),
        ]);
        process_directory(&cli, &input_dir).unwrap();

        assert_eq!(
            fs::read(out_dir.join("nested/a.jpg")).unwrap(),
            stripped_sample()
        );
        assert!(!out_dir.join("broken.jpg").exists());
        assert!(!out_dir.join(".hidden.jpg").exists());
    }

    #[test]
    fn test_write_image_force() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("x.jpg");
        let image = JpegParser::new().parse(sample_jpeg()).unwrap();

        assert_eq!(write_image(&path, &image, false).unwrap(), 34);
        assert!(write_image(&path, &image, false).is_err());
        assert_eq!(write_image(&path, &image.strip(), true).unwrap(), 18);
        assert_eq!(fs::read(&path).unwrap(), stripped_sample());
    }

    #[test]
    fn test_write_image_io_errors() {
        let temp_dir = TempDir::new().unwrap();
        let image = JpegParser::new().parse(sample_jpeg()).unwrap();

        // parent "directory" is a regular file
        let blocker = temp_dir.path().join("blocker");
        fs::write(&blocker, b"").unwrap();
        let err = write_image(&blocker.join("x.jpg"), &image, false).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<JpegError>(),
            Some(JpegError::DirectoryCreate { .. })
        ));

        // target is an existing directory
        let dir_target = temp_dir.path().join("taken.jpg");
        fs::create_dir_all(&dir_target).unwrap();
        let err = write_image(&dir_target, &image, true).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<JpegError>(),
            Some(JpegError::FileWrite { .. })
        ));
    }

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
