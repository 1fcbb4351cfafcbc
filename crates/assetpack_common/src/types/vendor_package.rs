use std::path::PathBuf;

/// A third-party tree mirrored into the distribution tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorPackage {
  pub name: String,
  pub source: PathBuf,
  pub destination: PathBuf,
  /// Glob over paths relative to `source`; everything is copied when absent.
  pub include: Option<String>,
}
