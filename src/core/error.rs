//! Error types for the checksum collector
//!
//! Errors fall into two classes: fatal ones abort the run (the input path is
//! missing, the report cannot be written), per-file ones are logged and the
//! run moves on to the next file.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while resolving, hashing, or reporting
#[derive(Error, Debug)]
pub enum CollectorError {
    /// The target path does not exist
    #[error("Path not found: {}", .0.display())]
    PathNotFound(PathBuf),

    /// The target exists but is neither a regular file nor a directory
    #[error("Not a regular file or directory: {}", .0.display())]
    UnsupportedPath(PathBuf),

    /// A file or directory could not be opened for lack of permission
    #[error("Permission denied: {}", path.display())]
    PermissionDenied {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Reading a file failed, either on open or mid-stream
    #[error("Failed to read '{}': {source}", path.display())]
    IoRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Following links led back to an ancestor directory
    #[error("Symlink loop at '{}' (points back to '{}')", path.display(), ancestor.display())]
    SymlinkLoop { path: PathBuf, ancestor: PathBuf },

    /// A symlink to something other than a regular file, left unfollowed
    #[error("Not following symlink '{}' (target is not a regular file)", .0.display())]
    UnfollowedLink(PathBuf),

    /// Directory traversal failed below the target
    #[error("Failed to traverse '{}': {source}", path.display())]
    Traversal {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The report destination is the file being checksummed
    #[error("Output '{}' is the input file", .0.display())]
    OutputIsInput(PathBuf),

    /// The CSV report could not be opened, written, or flushed
    #[error("Failed to write output '{}': {source}", path.display())]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, CollectorError>;

impl CollectorError {
    /// Classify an I/O error raised while reading `path`
    pub fn from_io(path: &Path, source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::PermissionDenied => CollectorError::PermissionDenied {
                path: path.to_path_buf(),
                source,
            },
            _ => CollectorError::IoRead {
                path: path.to_path_buf(),
                source,
            },
        }
    }

    /// Classify an error yielded by the directory walker
    pub fn from_walk(err: walkdir::Error) -> Self {
        let path = err.path().map(Path::to_path_buf).unwrap_or_default();

        if let Some(ancestor) = err.loop_ancestor() {
            return CollectorError::SymlinkLoop {
                ancestor: ancestor.to_path_buf(),
                path,
            };
        }

        let permission = err
            .io_error()
            .map(|e| e.kind() == io::ErrorKind::PermissionDenied)
            .unwrap_or(false);
        let source: io::Error = err.into();

        if permission {
            CollectorError::PermissionDenied { path, source }
        } else {
            CollectorError::Traversal { path, source }
        }
    }

    /// Wrap a failure on the report destination
    pub fn output(path: &Path, source: impl Into<io::Error>) -> Self {
        CollectorError::OutputWrite {
            path: path.to_path_buf(),
            source: source.into(),
        }
    }

    /// Whether this error must abort the whole run
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            CollectorError::PathNotFound(_)
                | CollectorError::UnsupportedPath(_)
                | CollectorError::OutputIsInput(_)
                | CollectorError::OutputWrite { .. }
        )
    }

    /// The path the error refers to, when there is one
    pub fn path(&self) -> Option<&Path> {
        match self {
            CollectorError::PathNotFound(path)
            | CollectorError::UnsupportedPath(path)
            | CollectorError::UnfollowedLink(path)
            | CollectorError::OutputIsInput(path) => Some(path),
            CollectorError::PermissionDenied { path, .. }
            | CollectorError::IoRead { path, .. }
            | CollectorError::SymlinkLoop { path, .. }
            | CollectorError::Traversal { path, .. }
            | CollectorError::OutputWrite { path, .. } => {
                if path.as_os_str().is_empty() {
                    None
                } else {
                    Some(path)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_denied_is_classified() {
        let err = CollectorError::from_io(
            Path::new("/locked"),
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(matches!(err, CollectorError::PermissionDenied { .. }));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_other_io_errors_are_read_errors() {
        let err = CollectorError::from_io(
            Path::new("/flaky"),
            io::Error::new(io::ErrorKind::UnexpectedEof, "eof"),
        );
        assert!(matches!(err, CollectorError::IoRead { .. }));
        assert_eq!(err.path(), Some(Path::new("/flaky")));
    }

    #[test]
    fn test_fatal_classification() {
        assert!(CollectorError::PathNotFound(PathBuf::from("missing")).is_fatal());
        assert!(CollectorError::UnsupportedPath(PathBuf::from("fifo")).is_fatal());
        assert!(CollectorError::OutputIsInput(PathBuf::from("same.csv")).is_fatal());
        assert!(!CollectorError::UnfollowedLink(PathBuf::from("dir_link")).is_fatal());
        assert!(CollectorError::output(
            Path::new("out.csv"),
            io::Error::new(io::ErrorKind::Other, "disk full")
        )
        .is_fatal());
    }

    #[test]
    fn test_display_includes_path() {
        let err = CollectorError::PathNotFound(PathBuf::from("/no/such/dir"));
        assert_eq!(err.to_string(), "Path not found: /no/such/dir");
    }
}
