use std::{io, path::Path};

/// The filesystem operations the pipeline performs.
///
/// Writes must be atomic from a reader's point of view: a consumer either sees
/// the previous content or the complete new content, never a partial file.
pub trait FileSystem: Send + Sync {
  fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

  fn read_to_string(&self, path: &Path) -> io::Result<String>;

  /// Creates missing parent directories, then replaces `path` with `content`.
  fn write_atomic(&self, path: &Path, content: &[u8]) -> io::Result<()>;

  fn exists(&self, path: &Path) -> bool;

  fn is_dir(&self, path: &Path) -> bool;

  fn file_size(&self, path: &Path) -> io::Result<u64>;
}
