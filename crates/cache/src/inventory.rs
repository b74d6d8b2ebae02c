//! Directory inventory
//!
//! Byte totals and file listings are re-derived from a fresh recursive scan
//! on every call: no in-memory index exists to desync from concurrent
//! mutation. Non-existent directories count as empty, and files that vanish
//! mid-scan (deleted by a concurrent prune) simply drop out of the result
//! instead of failing the walk.

use std::path::PathBuf;
use std::time::SystemTime;
use walkdir::WalkDir;

/// One file found during a scan.
#[derive(Debug, Clone)]
pub struct FileEntry {
    /// Absolute path of the file
    pub path: PathBuf,
    /// Size in bytes at scan time
    pub size: u64,
    /// Modification time at scan time
    pub modified: SystemTime,
}

/// Total size in bytes of all files under `dirs`.
#[must_use]
pub fn total_bytes(dirs: &[PathBuf]) -> u64 {
    dirs.iter()
        .flat_map(|dir| WalkDir::new(dir).into_iter().filter_map(std::result::Result::ok))
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| entry.metadata().ok())
        .map(|meta| meta.len())
        .sum()
}

/// Enumerate all files under `dirs` with size and mtime.
///
/// Entries whose metadata cannot be read (vanished, permission) are skipped.
#[must_use]
pub fn list_files(dirs: &[PathBuf]) -> Vec<FileEntry> {
    dirs.iter()
        .flat_map(|dir| WalkDir::new(dir).into_iter().filter_map(std::result::Result::ok))
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| {
            let meta = entry.metadata().ok()?;
            let modified = meta.modified().ok()?;
            Some(FileEntry {
                path: entry.into_path(),
                size: meta.len(),
                modified,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_directories_are_empty() {
        let tmp = TempDir::new().unwrap();
        let dirs = vec![tmp.path().join("does-not-exist")];
        assert_eq!(total_bytes(&dirs), 0);
        assert!(list_files(&dirs).is_empty());
    }

    #[test]
    fn totals_sum_across_directories() {
        let tmp = TempDir::new().unwrap();
        let a = tmp.path().join("a");
        let b = tmp.path().join("b");
        std::fs::create_dir_all(a.join("nested")).unwrap();
        std::fs::create_dir_all(&b).unwrap();
        std::fs::write(a.join("x.png"), vec![0u8; 100]).unwrap();
        std::fs::write(a.join("nested/y.png"), vec![0u8; 50]).unwrap();
        std::fs::write(b.join("z.pdf"), vec![0u8; 25]).unwrap();

        let dirs = vec![a, b];
        assert_eq!(total_bytes(&dirs), 175);

        let files = list_files(&dirs);
        assert_eq!(files.len(), 3);
        assert_eq!(files.iter().map(|f| f.size).sum::<u64>(), 175);
    }
}
