//! Report output

pub mod report_writer;

pub use report_writer::{FileRecord, ReportWriter, WriteMode, DEFAULT_OUTPUT, HEADER};
