use std::{
  fs, io,
  io::Write,
  path::{Path, PathBuf},
};

use crate::file_system::FileSystem;

#[derive(Debug, Default, Clone, Copy)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
  fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
    fs::read(path)
  }

  fn read_to_string(&self, path: &Path) -> io::Result<String> {
    fs::read_to_string(path)
  }

  fn write_atomic(&self, path: &Path, content: &[u8]) -> io::Result<()> {
    let parent = match path.parent() {
      Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
      _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent)?;

    // The temporary file lives next to the destination so the final rename
    // never crosses a filesystem boundary.
    let mut staged = tempfile::Builder::new().prefix(".assetpack-").tempfile_in(&parent)?;
    staged.write_all(content)?;
    staged.as_file().sync_all()?;
    staged.persist(path).map_err(|err| err.error)?;
    Ok(())
  }

  fn exists(&self, path: &Path) -> bool {
    path.exists()
  }

  fn is_dir(&self, path: &Path) -> bool {
    path.is_dir()
  }

  fn file_size(&self, path: &Path) -> io::Result<u64> {
    fs::metadata(path).map(|meta| meta.len())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn write_atomic_creates_parents_and_replaces_content() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("nested/deeper/out.txt");

    OsFileSystem.write_atomic(&target, b"first").unwrap();
    OsFileSystem.write_atomic(&target, b"second").unwrap();

    assert_eq!(OsFileSystem.read_to_string(&target).unwrap(), "second");
    let leftovers = fs::read_dir(target.parent().unwrap())
      .unwrap()
      .filter_map(Result::ok)
      .filter(|entry| entry.file_name().to_string_lossy().starts_with(".assetpack-"))
      .count();
    assert_eq!(leftovers, 0);
  }

  #[test]
  fn file_size_reports_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("a.bin");
    OsFileSystem.write_atomic(&target, &[0u8; 7]).unwrap();
    assert_eq!(OsFileSystem.file_size(&target).unwrap(), 7);
    assert!(!OsFileSystem.is_dir(&target));
  }
}
