//! Hashing, errors, and the collection pipeline

pub mod collector;
pub mod digest;
pub mod error;

pub use collector::{Collector, CollectorConfig, RunSummary, SkippedFile};
pub use digest::{hash_bytes, Digest, DigestAlgorithm, DigestComputer, FileDigests};
pub use error::{CollectorError, Result};
