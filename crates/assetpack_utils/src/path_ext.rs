use std::path::{Path, PathBuf};

use sugar_path::SugarPath;

pub trait PathExt {
  /// Forward-slash form, used for anything user facing or written into outputs.
  fn to_slash_string(&self) -> String;

  /// `self` relative to `base` when it lives below it, otherwise unchanged.
  fn display_relative_to(&self, base: &Path) -> String;

  /// Replaces the extension, keeping the rest of the path untouched.
  fn with_swapped_extension(&self, extension: &str) -> PathBuf;
}

impl PathExt for Path {
  fn to_slash_string(&self) -> String {
    self.to_slash_lossy().into_owned()
  }

  fn display_relative_to(&self, base: &Path) -> String {
    match self.strip_prefix(base) {
      Ok(relative) => relative.to_slash_string(),
      Err(_) => self.to_slash_string(),
    }
  }

  fn with_swapped_extension(&self, extension: &str) -> PathBuf {
    self.with_extension(extension)
  }
}

/// Joins a prefix and a name the way the resource manifest expects: plain
/// string concatenation, so `"static/"` + `"app.js"` and `"static/dist-"` +
/// `"app.js"` both behave.
pub fn join_prefixed(root: &Path, prefix: &str, name: &str) -> PathBuf {
  let joined = format!("{prefix}{name}");
  root.join(joined.trim_start_matches('/')).normalize()
}

#[test]
fn test_join_prefixed() {
  let root = Path::new("/project");
  assert_eq!(
    join_prefixed(root, "karl/views/static/", "dist/app.js"),
    PathBuf::from("/project/karl/views/static/dist/app.js")
  );
  assert_eq!(join_prefixed(root, "static/min-", "a.js"), PathBuf::from("/project/static/min-a.js"));
}

#[test]
fn test_display_relative_to() {
  let root = Path::new("/project");
  assert_eq!(Path::new("/project/a/b.css").display_relative_to(root), "a/b.css");
  assert_eq!(Path::new("/elsewhere/b.css").display_relative_to(root), "/elsewhere/b.css");
}
