//! Target path resolution

pub mod file_scanner;

pub use file_scanner::{is_hidden_file, resolve_target, ResolvedFiles, ScanOptions};
