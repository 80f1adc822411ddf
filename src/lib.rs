//! Checksum Collector Library
//!
//! Walks a file or directory tree, streams every regular file through one or
//! more digest algorithms, and writes the results to a CSV report.

pub mod core;
pub mod reporting;
pub mod scanner;
pub mod utils;

pub use self::core::digest;
pub use reporting::report_writer;
pub use scanner::file_scanner;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::core::collector::{Collector, CollectorConfig, RunSummary, SkippedFile};
    pub use crate::core::digest::{
        hash_bytes, Digest, DigestAlgorithm, DigestComputer, FileDigests, DEFAULT_CHUNK_SIZE,
    };
    pub use crate::core::error::{CollectorError, Result};
    pub use crate::reporting::report_writer::{
        FileRecord, ReportWriter, WriteMode, DEFAULT_OUTPUT, HEADER,
    };
    pub use crate::scanner::file_scanner::{is_hidden_file, resolve_target, ScanOptions};
}
