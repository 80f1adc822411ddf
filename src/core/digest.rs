//! Streaming file digests

use clap::ValueEnum;
use sha2::{Digest as _, Sha256};
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use super::error::{CollectorError, Result};

/// Default read buffer: 1 MiB
pub const DEFAULT_CHUNK_SIZE: usize = 1 << 20;

/// Supported digest algorithms
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, ValueEnum)]
pub enum DigestAlgorithm {
    #[default]
    Md5,
    Sha256,
    Blake3,
}

impl DigestAlgorithm {
    /// Name written to the `digest_algorithm` column
    pub fn name(self) -> &'static str {
        match self {
            DigestAlgorithm::Md5 => "md5",
            DigestAlgorithm::Sha256 => "sha256",
            DigestAlgorithm::Blake3 => "blake3",
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A finished digest, hex-encoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digest {
    pub algorithm: DigestAlgorithm,
    pub value: String,
}

/// Everything learned from one pass over a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDigests {
    pub size_bytes: u64,
    pub digests: Vec<Digest>,
}

impl FileDigests {
    /// Look up the digest for one algorithm
    pub fn get(&self, algorithm: DigestAlgorithm) -> Option<&str> {
        self.digests
            .iter()
            .find(|d| d.algorithm == algorithm)
            .map(|d| d.value.as_str())
    }
}

enum Hasher {
    Md5(md5::Context),
    Sha256(Sha256),
    Blake3(Box<blake3::Hasher>),
}

impl Hasher {
    fn new(algorithm: DigestAlgorithm) -> Self {
        match algorithm {
            DigestAlgorithm::Md5 => Hasher::Md5(md5::Context::new()),
            DigestAlgorithm::Sha256 => Hasher::Sha256(Sha256::new()),
            DigestAlgorithm::Blake3 => Hasher::Blake3(Box::new(blake3::Hasher::new())),
        }
    }

    fn update(&mut self, data: &[u8]) {
        match self {
            Hasher::Md5(ctx) => ctx.consume(data),
            Hasher::Sha256(hasher) => hasher.update(data),
            Hasher::Blake3(hasher) => {
                hasher.update(data);
            }
        }
    }

    fn finalize_hex(self) -> String {
        match self {
            Hasher::Md5(ctx) => format!("{:x}", ctx.compute()),
            Hasher::Sha256(hasher) => format!("{:x}", hasher.finalize()),
            Hasher::Blake3(hasher) => hasher.finalize().to_hex().to_string(),
        }
    }
}

/// Compute the digest of an in-memory buffer
///
/// Useful as an independent reference for file digests.
pub fn hash_bytes(algorithm: DigestAlgorithm, data: &[u8]) -> String {
    let mut hasher = Hasher::new(algorithm);
    hasher.update(data);
    hasher.finalize_hex()
}

/// Hashes file contents with one or more algorithms in a single read pass
#[derive(Debug, Clone)]
pub struct DigestComputer {
    algorithms: Vec<DigestAlgorithm>,
    chunk_size: usize,
}

impl Default for DigestComputer {
    fn default() -> Self {
        Self::new(&[DigestAlgorithm::default()])
    }
}

impl DigestComputer {
    /// Create a computer for the given algorithms
    ///
    /// Repeated algorithms are collapsed, keeping first-seen order. An empty
    /// list falls back to MD5.
    pub fn new(algorithms: &[DigestAlgorithm]) -> Self {
        let mut unique: Vec<DigestAlgorithm> = Vec::with_capacity(algorithms.len());
        for alg in algorithms {
            if !unique.contains(alg) {
                unique.push(*alg);
            }
        }
        if unique.is_empty() {
            unique.push(DigestAlgorithm::default());
        }

        Self {
            algorithms: unique,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Override the read buffer size (zero is treated as one byte)
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn algorithms(&self) -> &[DigestAlgorithm] {
        &self.algorithms
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Hash everything `reader` yields until EOF
    pub fn compute_reader<R: Read>(&self, mut reader: R) -> io::Result<FileDigests> {
        let mut hashers: Vec<(DigestAlgorithm, Hasher)> = self
            .algorithms
            .iter()
            .map(|alg| (*alg, Hasher::new(*alg)))
            .collect();
        let mut buffer = vec![0u8; self.chunk_size];
        let mut size_bytes: u64 = 0;

        loop {
            let bytes_read = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            size_bytes += bytes_read as u64;
            for (_, hasher) in hashers.iter_mut() {
                hasher.update(&buffer[..bytes_read]);
            }
        }

        let digests = hashers
            .into_iter()
            .map(|(algorithm, hasher)| Digest {
                algorithm,
                value: hasher.finalize_hex(),
            })
            .collect();

        Ok(FileDigests {
            size_bytes,
            digests,
        })
    }

    /// Open and hash a file
    ///
    /// # Errors
    /// `PermissionDenied` if the file cannot be opened for lack of access,
    /// `IoRead` for any other open or mid-stream read failure.
    pub fn compute_file(&self, path: &Path) -> Result<FileDigests> {
        let file = File::open(path).map_err(|e| CollectorError::from_io(path, e))?;
        self.compute_reader(file)
            .map_err(|e| CollectorError::from_io(path, e))
    }
}
