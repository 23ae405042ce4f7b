//! Atomic file writes
//!
//! Whole-file outputs (solver data files, solution dumps) are written to a
//! temporary file in the target directory, fsynced and renamed over the
//! destination, so the solver never reads a half-written data file.

use anyhow::{Context, Result};
use camino::Utf8Path;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Atomically replace `path` with `content`.
///
/// Parent directories are created as needed. Line endings are normalized to
/// LF.
pub fn write_file_atomic(path: &Path, content: &str) -> Result<()> {
    let normalized = content.replace("\r\n", "\n");
    write_bytes_atomic(path, normalized.as_bytes())
}

/// `write_file_atomic` for UTF-8 paths.
pub fn write_utf8_atomic(path: &Utf8Path, content: &str) -> Result<()> {
    write_file_atomic(path.as_std_path(), content)
}

/// Atomically replace `path` with raw bytes.
pub fn write_bytes_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)
        .with_context(|| format!("Failed to create parent directory: {}", parent.display()))?;

    let mut temp_file = NamedTempFile::new_in(parent)
        .with_context(|| format!("Failed to create temporary file in: {}", parent.display()))?;

    temp_file
        .write_all(bytes)
        .context("Failed to write content to temporary file")?;
    temp_file
        .as_file()
        .sync_all()
        .context("Failed to fsync temporary file")?;

    temp_file
        .persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("Failed to atomically write file: {}", path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_creates_parents_and_content() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("a").join("b").join("model.dat");
        write_file_atomic(&target, "n = 3;\r\nr = 1.5;\n").unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "n = 3;\nr = 1.5;\n");
    }

    #[test]
    fn test_write_replaces_existing_file() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("model.dat");
        fs::write(&target, "old").unwrap();
        write_bytes_atomic(&target, b"new").unwrap();
        assert_eq!(fs::read(&target).unwrap(), b"new");

        // no stray temporaries left next to the target
        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_write_utf8_path() {
        let dir = TempDir::new().unwrap();
        let target = camino::Utf8PathBuf::from_path_buf(dir.path().join("x.txt")).unwrap();
        write_utf8_atomic(&target, "ok").unwrap();
        assert_eq!(fs::read_to_string(target).unwrap(), "ok");
    }
}
