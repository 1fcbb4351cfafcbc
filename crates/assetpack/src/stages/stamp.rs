use std::path::PathBuf;

use assetpack_common::{AssetKind, NormalizedOptions, OutputAsset, ResourceManifest};
use assetpack_error::{BuildDiagnostic, BuildResult};
use assetpack_fs::FileSystem;
use tracing::info;

use crate::utils::render_template::{render_template, timestamp};

/// Records when the resources were last generated.
pub struct StampStage<'a> {
  fs: &'a dyn FileSystem,
  options: &'a NormalizedOptions,
  manifest: &'a ResourceManifest,
}

impl<'a> StampStage<'a> {
  pub fn new(
    fs: &'a dyn FileSystem,
    options: &'a NormalizedOptions,
    manifest: &'a ResourceManifest,
  ) -> Self {
    Self { fs, options, manifest }
  }

  pub fn path(&self) -> PathBuf {
    self.manifest.resolve(&self.options.cwd, &self.options.stamp.path)
  }

  pub fn run(&self) -> BuildResult<Vec<OutputAsset>> {
    let path = self.path();
    let content =
      render_template(&self.options.stamp.template, &[("timestamp", timestamp().as_str())]);
    self
      .fs
      .write_atomic(&path, content.as_bytes())
      .map_err(|err| BuildDiagnostic::io("write", &path, err))?;
    info!("stamped {}", path.display());
    Ok(vec![OutputAsset::new(AssetKind::Stamp, path, content.len())])
  }
}
