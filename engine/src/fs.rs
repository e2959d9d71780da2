//! Filesystem enumeration.
//!
//! The walker never touches `std::fs` directly; it goes through the
//! `DirSource` trait, which mirrors the narrow host API the original
//! scripts were written against: list the subdirectories of a directory,
//! list its files with sizes, and stat one path. `LocalDirSource` is the
//! standard implementation over a local base directory.
//!
//! Enumeration order is whatever the underlying filesystem yields; the
//! walker promises stability between its two passes, not sorting.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::model::{ItemKind, SubPath};

/// One file entry as reported by `DirSource::list_files`.
#[derive(Debug, Clone)]
pub struct FsEntry {
    pub name: String,
    pub size_bytes: u64,
}

/// Narrow enumeration interface the walker runs against.
///
/// All paths are relative to the source root the implementation was
/// created with. Implementations must not mutate any filesystem state.
pub trait DirSource {
    /// Kind and size of one path.
    fn stat(&self, path: &SubPath) -> io::Result<(ItemKind, u64)>;

    /// Names of the subdirectories of `dir`, in native order.
    fn list_subdirectories(&self, dir: &SubPath) -> io::Result<Vec<String>>;

    /// Files of `dir` with their sizes, in native order.
    fn list_files(&self, dir: &SubPath) -> io::Result<Vec<FsEntry>>;
}

/// `DirSource` over a local directory tree.
#[derive(Debug)]
pub struct LocalDirSource {
    base: PathBuf,
}

impl LocalDirSource {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        LocalDirSource { base: base.into() }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Absolute (base-joined) path for a sub-path.
    pub fn full_path(&self, sub: &SubPath) -> PathBuf {
        sub.join(&self.base)
    }
}

impl DirSource for LocalDirSource {
    fn stat(&self, path: &SubPath) -> io::Result<(ItemKind, u64)> {
        let metadata = fs::metadata(self.full_path(path))?;
        if metadata.is_dir() {
            Ok((ItemKind::Directory, 0))
        } else {
            Ok((ItemKind::File, metadata.len()))
        }
    }

    fn list_subdirectories(&self, dir: &SubPath) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(self.full_path(dir))? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        Ok(names)
    }

    fn list_files(&self, dir: &SubPath) -> io::Result<Vec<FsEntry>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(self.full_path(dir))? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                entries.push(FsEntry {
                    name: entry.file_name().to_string_lossy().into_owned(),
                    size_bytes: entry.metadata()?.len(),
                });
            }
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(path: &Path, contents: &[u8]) {
        let mut file = fs::File::create(path).expect("Failed to create file");
        file.write_all(contents).expect("Failed to write file");
    }

    #[test]
    fn test_list_files_reports_sizes() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        write_file(&temp_dir.path().join("a.txt"), b"12345");
        write_file(&temp_dir.path().join("b.txt"), b"12");

        let source = LocalDirSource::new(temp_dir.path());
        let mut files = source
            .list_files(&SubPath::root())
            .expect("Failed to list files");
        files.sort_by(|a, b| a.name.cmp(&b.name));

        assert_eq!(files.len(), 2);
        assert_eq!(files[0].name, "a.txt");
        assert_eq!(files[0].size_bytes, 5);
        assert_eq!(files[1].size_bytes, 2);
    }

    #[test]
    fn test_list_subdirectories_excludes_files() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        fs::create_dir(temp_dir.path().join("sub")).expect("Failed to create subdir");
        write_file(&temp_dir.path().join("file.txt"), b"x");

        let source = LocalDirSource::new(temp_dir.path());
        let dirs = source
            .list_subdirectories(&SubPath::root())
            .expect("Failed to list subdirectories");

        assert_eq!(dirs, vec!["sub".to_string()]);
    }

    #[test]
    fn test_stat_distinguishes_kinds() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        fs::create_dir(temp_dir.path().join("sub")).expect("Failed to create subdir");
        write_file(&temp_dir.path().join("file.txt"), b"abc");

        let source = LocalDirSource::new(temp_dir.path());
        let (kind, size) = source
            .stat(&SubPath::root().child("file.txt"))
            .expect("Failed to stat file");
        assert_eq!(kind, ItemKind::File);
        assert_eq!(size, 3);

        let (kind, size) = source
            .stat(&SubPath::root().child("sub"))
            .expect("Failed to stat dir");
        assert_eq!(kind, ItemKind::Directory);
        assert_eq!(size, 0);
    }

    #[test]
    fn test_stat_missing_path_errors() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let source = LocalDirSource::new(temp_dir.path());
        let result = source.stat(&SubPath::root().child("nope"));
        assert!(result.is_err());
    }

    #[test]
    fn test_list_missing_directory_errors() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let source = LocalDirSource::new(temp_dir.path());
        assert!(source.list_files(&SubPath::root().child("nope")).is_err());
        assert!(source
            .list_subdirectories(&SubPath::root().child("nope"))
            .is_err());
    }
}
