//! Crash-safe file replacement.
//!
//! Cache entries and the invalidation cursor are replaced with the
//! write-temp, fsync, rename, fsync-directory sequence. A reader therefore
//! sees the old content or the new content, never a torn write.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Syncs a file's contents and metadata to disk.
pub fn fsync_file(file: &File) -> io::Result<()> {
    file.sync_all()
}

/// Syncs a directory so that entries created, renamed or removed in it
/// survive a power loss.
pub fn fsync_dir(dir: &Path) -> io::Result<()> {
    OpenOptions::new().read(true).open(dir)?.sync_all()
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Replaces the file at `path` with `bytes`.
///
/// The parent directory is created if needed.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let parent = path.parent().filter(|p| !p.as_os_str().is_empty());
    if let Some(parent) = parent {
        std::fs::create_dir_all(parent)?;
    }

    let tmp = temp_path(path);
    {
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&tmp)?;
        file.write_all(bytes)?;
        fsync_file(&file)?;
    }
    std::fs::rename(&tmp, path)?;

    if let Some(parent) = parent {
        fsync_dir(parent)?;
    }
    Ok(())
}

/// Removes the file at `path`, reporting whether it existed.
pub fn remove_durable(path: &Path) -> io::Result<bool> {
    match std::fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e),
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fsync_dir(parent)?;
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn write_creates_missing_parents() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("entry");

        write_atomic(&path, b"first").unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"first");
    }

    #[test]
    fn write_replaces_and_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("entry");

        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"second");
        assert!(!temp_path(&path).exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn remove_reports_existence() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("entry");
        write_atomic(&path, b"x").unwrap();

        assert!(remove_durable(&path).unwrap());
        assert!(!remove_durable(&path).unwrap());
        assert!(!path.exists());
    }

    #[test]
    fn fsync_dir_fails_on_missing_directory() {
        assert!(fsync_dir(Path::new("/nonexistent/review-bot/dir")).is_err());
    }
}
