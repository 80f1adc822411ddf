use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use checksum_collector::prelude::*;
use checksum_collector::utils::setup_logging;

/// Exit status after a Ctrl-C (128 + SIGINT)
const EXIT_INTERRUPTED: u8 = 130;

#[derive(Parser)]
#[command(name = "collect_checksums")]
#[command(about = "Collect checksums of a file or directory tree into a CSV report", long_about = None)]
struct Cli {
    /// File or directory to process
    path: PathBuf,

    /// Output CSV filename (overwritten unless --append)
    #[arg(default_value = DEFAULT_OUTPUT)]
    output: PathBuf,

    /// Digest algorithm(s), comma separated
    #[arg(
        short,
        long = "algorithm",
        value_enum,
        value_delimiter = ',',
        default_value = "md5"
    )]
    algorithms: Vec<DigestAlgorithm>,

    /// Read buffer size in bytes
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,

    /// Append rows to an existing report instead of overwriting it
    #[arg(long)]
    append: bool,

    /// Include hidden files (dot-files, Windows hidden attribute)
    #[arg(long)]
    include_hidden: bool,

    /// Follow symbolic links while walking directories
    #[arg(long)]
    follow_links: bool,

    /// Maximum directory depth to descend
    #[arg(long)]
    max_depth: Option<usize>,

    /// Run in batch mode (no progress spinner)
    #[arg(long)]
    batch: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn to_config(&self) -> CollectorConfig {
        CollectorConfig {
            target: self.path.clone(),
            output: self.output.clone(),
            algorithms: self.algorithms.clone(),
            chunk_size: self.chunk_size,
            scan: ScanOptions {
                include_hidden: self.include_hidden,
                follow_links: self.follow_links,
                max_depth: self.max_depth,
            },
            mode: if self.append {
                WriteMode::Append
            } else {
                WriteMode::Truncate
            },
        }
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    // Set up graceful shutdown handler
    let shutdown_requested = Arc::new(AtomicBool::new(false));
    let shutdown_flag = shutdown_requested.clone();

    ctrlc::set_handler(move || {
        eprintln!("\nShutdown requested. Finishing current file...");
        shutdown_flag.store(true, Ordering::SeqCst);
    })
    .context("Error setting Ctrl-C handler")?;

    let progress = if cli.batch {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {pos} file(s) {wide_msg}")
                .context("Invalid progress template")?,
        );
        pb.enable_steady_tick(Duration::from_millis(120));
        pb
    };

    let collector = Collector::new(cli.to_config())
        .with_progress(progress.clone())
        .with_shutdown_flag(shutdown_requested);

    let result = collector.run();
    progress.finish_and_clear();

    let summary = result
        .with_context(|| format!("Failed to collect checksums for {}", cli.path.display()))?;

    println!("==================================================");
    println!("CHECKSUMS COMPLETE");
    println!("==================================================");
    println!("Files processed: {}", summary.processed);
    println!("Files skipped: {}", summary.skipped_count());
    if !summary.excluded.is_empty() {
        println!("Files excluded (report itself): {}", summary.excluded.len());
    }
    println!("Rows written: {}", summary.rows_written);
    println!("Bytes hashed: {}", summary.bytes_hashed);
    println!();

    if summary.interrupted {
        eprintln!("Interrupted: partial report saved to {:?}", cli.output);
        return Ok(ExitCode::from(EXIT_INTERRUPTED));
    }

    println!("Report saved to: {:?}", cli.output);
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["collect_checksums", "media"]).unwrap();
        let config = cli.to_config();
        assert_eq!(config.output, PathBuf::from("checksums.csv"));
        assert_eq!(config.algorithms, vec![DigestAlgorithm::Md5]);
        assert_eq!(config.chunk_size, DEFAULT_CHUNK_SIZE);
        assert_eq!(config.mode, WriteMode::Truncate);
        assert!(!config.scan.include_hidden);
    }

    #[test]
    fn test_explicit_output_and_algorithms() {
        let cli = Cli::try_parse_from([
            "collect_checksums",
            "media",
            "fixity.csv",
            "--algorithm",
            "sha256,blake3",
            "--append",
            "--max-depth",
            "2",
        ])
        .unwrap();
        let config = cli.to_config();
        assert_eq!(config.output, PathBuf::from("fixity.csv"));
        assert_eq!(
            config.algorithms,
            vec![DigestAlgorithm::Sha256, DigestAlgorithm::Blake3]
        );
        assert_eq!(config.mode, WriteMode::Append);
        assert_eq!(config.scan.max_depth, Some(2));
    }
}
