use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
  Vendor,
  Script,
  SourceMap,
  Optimized,
  Stylesheet,
  Stamp,
}

impl AssetKind {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Vendor => "vendor",
      Self::Script => "script",
      Self::SourceMap => "map",
      Self::Optimized => "module",
      Self::Stylesheet => "style",
      Self::Stamp => "stamp",
    }
  }
}

/// A file the pipeline wrote.
#[derive(Debug, Clone)]
pub struct OutputAsset {
  pub kind: AssetKind,
  pub path: PathBuf,
  pub size: usize,
}

impl OutputAsset {
  pub fn new(kind: AssetKind, path: impl Into<PathBuf>, size: usize) -> Self {
    Self { kind, path: path.into(), size }
  }
}
