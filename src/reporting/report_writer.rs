//! CSV report writing
//!
//! Every report starts with the same header:
//!
//! ```text
//! path,size_bytes,digest_algorithm,digest_value
//! ```
//!
//! followed by one row per file and algorithm. Quoting follows RFC 4180, so
//! paths containing commas, quotes, or newlines survive a round trip.

use csv::WriterBuilder;
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::core::digest::{Digest, FileDigests};
use crate::core::error::{CollectorError, Result};

/// Report filename used when none is given
pub const DEFAULT_OUTPUT: &str = "checksums.csv";

/// Column names, in output order
pub const HEADER: [&str; 4] = ["path", "size_bytes", "digest_algorithm", "digest_value"];

/// One processed file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub digests: Vec<Digest>,
}

impl FileRecord {
    pub fn new(path: PathBuf, result: FileDigests) -> Self {
        Self {
            path,
            size_bytes: result.size_bytes,
            digests: result.digests,
        }
    }
}

#[derive(Serialize)]
struct CsvRow<'a> {
    path: &'a str,
    size_bytes: u64,
    digest_algorithm: &'static str,
    digest_value: &'a str,
}

/// How to treat an existing report file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WriteMode {
    /// Truncate and start over
    #[default]
    Truncate,
    /// Add rows to the end; the header is written only if the file is new or empty
    Append,
}

/// Streams file records into a CSV destination
///
/// The destination is flushed by [`ReportWriter::finish`]. Dropping the
/// writer early still flushes buffered rows, but write errors are lost.
pub struct ReportWriter<W: Write> {
    writer: csv::Writer<W>,
    destination: PathBuf,
    rows_written: u64,
}

impl ReportWriter<File> {
    /// Open a report file on disk
    ///
    /// # Arguments
    /// * `output_path` - Path to the CSV file
    /// * `mode` - Truncate or append to an existing file
    pub fn create(output_path: &Path, mode: WriteMode) -> Result<Self> {
        let (file, write_header) = match mode {
            WriteMode::Truncate => (File::create(output_path), true),
            WriteMode::Append => {
                let empty = fs::metadata(output_path)
                    .map(|m| m.len() == 0)
                    .unwrap_or(true);
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(output_path);
                (file, empty)
            }
        };
        let file = file.map_err(|e| CollectorError::output(output_path, e))?;

        Self::from_writer(file, output_path, write_header)
    }
}

impl<W: Write> ReportWriter<W> {
    /// Wrap any writer; `destination` only labels errors
    pub fn from_writer(
        inner: W,
        destination: impl Into<PathBuf>,
        write_header: bool,
    ) -> Result<Self> {
        let mut report = Self {
            writer: WriterBuilder::new().has_headers(false).from_writer(inner),
            destination: destination.into(),
            rows_written: 0,
        };

        if write_header {
            report
                .writer
                .write_record(HEADER)
                .map_err(|e| CollectorError::output(&report.destination, e))?;
        }

        Ok(report)
    }

    /// Write one row per digest of `record`
    pub fn write_record(&mut self, record: &FileRecord) -> Result<()> {
        let path = record.path.to_string_lossy();

        for digest in &record.digests {
            let row = CsvRow {
                path: &path,
                size_bytes: record.size_bytes,
                digest_algorithm: digest.algorithm.name(),
                digest_value: &digest.value,
            };
            self.writer
                .serialize(row)
                .map_err(|e| CollectorError::output(&self.destination, e))?;
            self.rows_written += 1;
        }

        Ok(())
    }

    /// Push buffered rows to the destination
    pub fn flush(&mut self) -> Result<()> {
        self.writer
            .flush()
            .map_err(|e| CollectorError::output(&self.destination, e))
    }

    /// Data rows written so far (header excluded)
    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Flush and hand back the underlying writer
    pub fn finish(self) -> Result<W> {
        let Self {
            writer,
            destination,
            ..
        } = self;

        writer.into_inner().map_err(|e| {
            let source = std::io::Error::new(e.error().kind(), e.error().to_string());
            CollectorError::output(&destination, source)
        })
    }
}
