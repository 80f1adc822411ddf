//! Target path resolution and file collection

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::core::error::{CollectorError, Result};

/// Controls which entries a directory walk yields
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// Include dot-files and files carrying the Windows hidden attribute
    pub include_hidden: bool,
    /// Follow symbolic links while walking
    pub follow_links: bool,
    /// Maximum recursion depth below the target (unlimited when `None`)
    pub max_depth: Option<usize>,
}

/// Check whether a file is hidden
///
/// Hidden means a name starting with `.`, or the hidden attribute on Windows.
pub fn is_hidden_file(path: &Path) -> bool {
    let dot_file = path
        .file_name()
        .map(|name| name.to_string_lossy().starts_with('.'))
        .unwrap_or(false);

    dot_file || has_hidden_attribute(path)
}

#[cfg(windows)]
fn has_hidden_attribute(path: &Path) -> bool {
    use std::os::windows::fs::MetadataExt;
    const FILE_ATTRIBUTE_HIDDEN: u32 = 0x2;

    fs::symlink_metadata(path)
        .map(|m| m.file_attributes() & FILE_ATTRIBUTE_HIDDEN != 0)
        .unwrap_or(false)
}

#[cfg(not(windows))]
fn has_hidden_attribute(_path: &Path) -> bool {
    false
}

enum Source {
    Single(Option<PathBuf>),
    Walk(walkdir::IntoIter),
}

/// Lazy sequence of regular files found under a target path
///
/// Items are `Err` for entries that could not be read; the walk carries on
/// past them.
pub struct ResolvedFiles {
    source: Source,
    include_hidden: bool,
    follow_links: bool,
}

impl Iterator for ResolvedFiles {
    type Item = Result<PathBuf>;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.source {
            Source::Single(path) => path.take().map(Ok),
            Source::Walk(walker) => loop {
                let entry = match walker.next()? {
                    Ok(entry) => entry,
                    Err(e) => return Some(Err(CollectorError::from_walk(e))),
                };

                if entry.file_type().is_dir() {
                    continue;
                }
                if !self.include_hidden && is_hidden_file(entry.path()) {
                    log::debug!("Skipping hidden file {}", entry.path().display());
                    continue;
                }

                // Unfollowed links still count when they point at a regular file.
                if entry.path_is_symlink() && !self.follow_links {
                    match fs::metadata(entry.path()) {
                        Ok(target) if target.is_file() => {}
                        Ok(_) => {
                            return Some(Err(CollectorError::UnfollowedLink(
                                entry.into_path(),
                            )))
                        }
                        Err(e) => return Some(Err(CollectorError::from_io(entry.path(), e))),
                    }
                } else if !entry.file_type().is_file() {
                    continue;
                }

                return Some(Ok(entry.into_path()));
            },
        }
    }
}

/// Resolve a user-supplied path into the files to process
///
/// # Arguments
/// * `target` - File or directory to process
/// * `options` - Walk settings for directory targets
///
/// # Returns
/// A lazy iterator over regular files. A file target yields itself, even if
/// hidden. A directory target yields every regular file beneath it, sorted
/// by file name at each level. Without `follow_links`, a symlink to a
/// regular file is yielded; dangling links and links to directories come
/// back as `Err` items.
///
/// # Errors
/// `PathNotFound` if `target` does not exist, `UnsupportedPath` if it is
/// neither a file nor a directory.
pub fn resolve_target(target: &Path, options: &ScanOptions) -> Result<ResolvedFiles> {
    let metadata = fs::metadata(target).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => CollectorError::PathNotFound(target.to_path_buf()),
        _ => CollectorError::from_io(target, e),
    })?;

    let source = if metadata.is_file() {
        Source::Single(Some(target.to_path_buf()))
    } else if metadata.is_dir() {
        let mut walker = WalkDir::new(target)
            .follow_links(options.follow_links)
            .sort_by_file_name();
        if let Some(depth) = options.max_depth {
            walker = walker.max_depth(depth);
        }
        Source::Walk(walker.into_iter())
    } else {
        return Err(CollectorError::UnsupportedPath(target.to_path_buf()));
    };

    Ok(ResolvedFiles {
        source,
        include_hidden: options.include_hidden,
        follow_links: options.follow_links,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::TempDir;

    fn collect_ok(files: ResolvedFiles) -> Vec<PathBuf> {
        files.filter_map(|item| item.ok()).collect()
    }

    #[test]
    fn test_single_file_target() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("test.txt");
        File::create(&file_path).unwrap();

        let files = collect_ok(resolve_target(&file_path, &ScanOptions::default()).unwrap());
        assert_eq!(files, vec![file_path]);
    }

    #[test]
    fn test_recursive_sorted_walk() {
        let temp_dir = TempDir::new().unwrap();
        let subdir = temp_dir.path().join("sub");
        fs::create_dir(&subdir).unwrap();

        let b = temp_dir.path().join("b.txt");
        let a = temp_dir.path().join("a.txt");
        let nested = subdir.join("c.txt");
        File::create(&b).unwrap();
        File::create(&a).unwrap();
        File::create(&nested).unwrap();

        let files = collect_ok(resolve_target(temp_dir.path(), &ScanOptions::default()).unwrap());
        assert_eq!(files, vec![a, b, nested]);
    }

    #[test]
    fn test_hidden_files_skipped_by_default() {
        let temp_dir = TempDir::new().unwrap();
        File::create(temp_dir.path().join(".DS_Store")).unwrap();
        File::create(temp_dir.path().join("visible.txt")).unwrap();

        let files = collect_ok(resolve_target(temp_dir.path(), &ScanOptions::default()).unwrap());
        assert_eq!(files.len(), 1);

        let options = ScanOptions {
            include_hidden: true,
            ..ScanOptions::default()
        };
        let files = collect_ok(resolve_target(temp_dir.path(), &options).unwrap());
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn test_explicit_hidden_file_is_kept() {
        let temp_dir = TempDir::new().unwrap();
        let hidden = temp_dir.path().join(".env");
        File::create(&hidden).unwrap();

        let files = collect_ok(resolve_target(&hidden, &ScanOptions::default()).unwrap());
        assert_eq!(files, vec![hidden]);
    }

    #[test]
    fn test_max_depth() {
        let temp_dir = TempDir::new().unwrap();
        let subdir = temp_dir.path().join("deep");
        fs::create_dir(&subdir).unwrap();
        File::create(temp_dir.path().join("top.txt")).unwrap();
        File::create(subdir.join("below.txt")).unwrap();

        let options = ScanOptions {
            max_depth: Some(1),
            ..ScanOptions::default()
        };
        let files = collect_ok(resolve_target(temp_dir.path(), &options).unwrap());
        assert_eq!(files, vec![temp_dir.path().join("top.txt")]);
    }

    #[test]
    fn test_missing_target() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope");

        let err = resolve_target(&missing, &ScanOptions::default()).err().unwrap();
        assert!(matches!(err, CollectorError::PathNotFound(_)));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_is_hidden_file() {
        assert!(is_hidden_file(Path::new("/data/.hidden")));
        assert!(!is_hidden_file(Path::new("/data/visible.txt")));
    }

    #[cfg(unix)]
    #[test]
    fn test_unfollowed_links() {
        let temp_dir = TempDir::new().unwrap();
        let outside = temp_dir.path().join("outside.txt");
        fs::write(&outside, b"hello").unwrap();
        let other_dir = temp_dir.path().join("elsewhere");
        fs::create_dir(&other_dir).unwrap();

        let input = temp_dir.path().join("input");
        fs::create_dir(&input).unwrap();
        File::create(input.join("a.txt")).unwrap();
        std::os::unix::fs::symlink(&outside, input.join("b_link.txt")).unwrap();
        std::os::unix::fs::symlink(&other_dir, input.join("c_dir_link")).unwrap();
        std::os::unix::fs::symlink(input.join("gone"), input.join("d_dangling")).unwrap();

        let items: Vec<_> = resolve_target(&input, &ScanOptions::default())
            .unwrap()
            .collect();
        assert_eq!(items.len(), 4);
        assert_eq!(items[0].as_ref().unwrap(), &input.join("a.txt"));
        assert_eq!(items[1].as_ref().unwrap(), &input.join("b_link.txt"));
        assert!(matches!(items[2], Err(CollectorError::UnfollowedLink(_))));
        assert!(matches!(items[3], Err(CollectorError::IoRead { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_loop_reported() {
        let temp_dir = TempDir::new().unwrap();
        let subdir = temp_dir.path().join("loop");
        fs::create_dir(&subdir).unwrap();
        std::os::unix::fs::symlink(temp_dir.path(), subdir.join("back")).unwrap();
        File::create(temp_dir.path().join("file.txt")).unwrap();

        let options = ScanOptions {
            follow_links: true,
            ..ScanOptions::default()
        };
        let items: Vec<_> = resolve_target(temp_dir.path(), &options).unwrap().collect();

        let loops = items
            .iter()
            .filter(|item| matches!(item, Err(CollectorError::SymlinkLoop { .. })))
            .count();
        let files = items.iter().filter(|item| item.is_ok()).count();
        assert_eq!(loops, 1);
        assert_eq!(files, 1);
    }
}
