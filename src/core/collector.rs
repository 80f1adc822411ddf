//! The collection pipeline: resolve the target, hash each file, write rows

use indicatif::ProgressBar;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::digest::{DigestAlgorithm, DigestComputer, DEFAULT_CHUNK_SIZE};
use super::error::{CollectorError, Result};
use crate::reporting::report_writer::{FileRecord, ReportWriter, WriteMode};
use crate::scanner::file_scanner::{resolve_target, ScanOptions};

/// Everything a run needs to know
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// File or directory to process
    pub target: PathBuf,
    /// CSV report destination
    pub output: PathBuf,
    pub algorithms: Vec<DigestAlgorithm>,
    /// Read buffer size in bytes
    pub chunk_size: usize,
    pub scan: ScanOptions,
    pub mode: WriteMode,
}

impl CollectorConfig {
    /// MD5, 1 MiB reads, hidden files skipped, report truncated
    pub fn new(target: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            target: target.into(),
            output: output.into(),
            algorithms: vec![DigestAlgorithm::default()],
            chunk_size: DEFAULT_CHUNK_SIZE,
            scan: ScanOptions::default(),
            mode: WriteMode::default(),
        }
    }
}

/// A file (or walk entry) that was left out of the report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    pub path: Option<PathBuf>,
    pub reason: String,
}

/// Outcome of a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Files hashed and written to the report
    pub processed: usize,
    pub skipped: Vec<SkippedFile>,
    /// Data rows written (one per file and algorithm)
    pub rows_written: u64,
    pub bytes_hashed: u64,
    /// Files found by the walk but deliberately not hashed (the report itself)
    pub excluded: Vec<PathBuf>,
    /// The run stopped early on a shutdown request
    pub interrupted: bool,
}

impl RunSummary {
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }
}

/// Drives one checksum collection run
pub struct Collector {
    config: CollectorConfig,
    progress: ProgressBar,
    shutdown: Arc<AtomicBool>,
}

impl Collector {
    pub fn new(config: CollectorConfig) -> Self {
        Self {
            config,
            progress: ProgressBar::hidden(),
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Report progress on `progress`, advanced once per processed or skipped entry
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    /// Stop after the current file once `flag` is set
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown = flag;
        self
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    /// Run the pipeline to completion
    ///
    /// The target is resolved before the report is opened, so a missing
    /// input never creates or truncates the CSV. Files that cannot be read
    /// are logged, recorded in the summary, and left out of the report.
    ///
    /// # Errors
    /// Only fatal errors: the target is missing or unsupported, the report
    /// would overwrite the target file, or the report cannot be written.
    pub fn run(&self) -> Result<RunSummary> {
        let files = resolve_target(&self.config.target, &self.config.scan)?;
        if same_file(&self.config.target, &self.config.output) {
            return Err(CollectorError::OutputIsInput(self.config.output.clone()));
        }
        let computer =
            DigestComputer::new(&self.config.algorithms).with_chunk_size(self.config.chunk_size);

        let mut report = ReportWriter::create(&self.config.output, self.config.mode)?;
        let output_identity = fs::canonicalize(&self.config.output).ok();
        let mut summary = RunSummary::default();

        log::debug!(
            "Collecting {} checksums under {}",
            algorithm_list(computer.algorithms()),
            self.config.target.display()
        );

        for item in files {
            if self.shutdown.load(Ordering::SeqCst) {
                summary.interrupted = true;
                break;
            }

            let path = match item {
                Ok(path) => path,
                Err(e) => {
                    self.skip(&mut summary, e);
                    continue;
                }
            };

            if is_output_file(&path, output_identity.as_deref()) {
                self.progress
                    .suspend(|| log::info!("Not hashing the report itself: {}", path.display()));
                summary.excluded.push(path);
                continue;
            }

            self.progress.set_message(path.display().to_string());

            match computer.compute_file(&path) {
                Ok(result) => {
                    log::debug!(
                        "{} ({} bytes): {}",
                        path.display(),
                        result.size_bytes,
                        result
                            .digests
                            .iter()
                            .map(|d| format!("{}={}", d.algorithm, d.value))
                            .collect::<Vec<_>>()
                            .join(" ")
                    );
                    summary.bytes_hashed += result.size_bytes;
                    report.write_record(&FileRecord::new(path, result))?;
                    summary.processed += 1;
                    self.progress.inc(1);
                }
                Err(e) => self.skip(&mut summary, e),
            }
        }

        summary.rows_written = report.rows_written();
        report.finish()?;

        Ok(summary)
    }

    fn skip(&self, summary: &mut RunSummary, err: CollectorError) {
        self.progress.suspend(|| log::warn!("Skipped: {}", err));
        self.progress.inc(1);
        summary.skipped.push(SkippedFile {
            path: err.path().map(Path::to_path_buf),
            reason: err.to_string(),
        });
    }
}

fn algorithm_list(algorithms: &[DigestAlgorithm]) -> String {
    algorithms
        .iter()
        .map(|a| a.name())
        .collect::<Vec<_>>()
        .join("+")
}

// Both paths must exist; a report that is not there yet cannot be the input.
fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

// Cheap name check first; canonicalize only on a match.
fn is_output_file(path: &Path, output: Option<&Path>) -> bool {
    let Some(output) = output else {
        return false;
    };
    if path.file_name() != output.file_name() {
        return false;
    }
    fs::canonicalize(path)
        .map(|p| p == output)
        .unwrap_or(false)
}
