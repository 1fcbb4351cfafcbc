use std::path::{Path, PathBuf};

use assetpack_common::{
  ModuleConfig, NormalizedCssOptions, NormalizedOptimizerOptions, NormalizedOptions,
  NormalizedStampOptions, NormalizedVendorOptions, OptimizerOptions, ProjectOptions,
};
use assetpack_error::{BuildDiagnostic, BuildResult};
use sugar_path::SugarPath;

pub const DEFAULT_CONFIG_FILE: &str = "assetpack.json";
pub const DEFAULT_BANNER: &str = "/*\n * {name} generated resources at {timestamp}\n */\n";
pub const DEFAULT_STAMP_TEMPLATE: &str = "resources generated at {timestamp}\n";

pub fn normalize_options(raw_options: ProjectOptions) -> BuildResult<NormalizedOptions> {
  let cwd = raw_options.cwd.unwrap_or_else(|| PathBuf::from(".")).absolutize();
  let config_path =
    raw_options.config_path.unwrap_or_else(|| cwd.join(DEFAULT_CONFIG_FILE));
  let minify = raw_options.minify.unwrap_or(true);

  let raw_vendor = raw_options.vendor.unwrap_or_default();
  let vendor = NormalizedVendorOptions {
    source_root: cwd
      .join(raw_vendor.source_root.as_deref().unwrap_or("bower_components"))
      .normalize(),
    dest_dir: raw_vendor.dest_dir.unwrap_or_else(|| "dist/".to_string()),
    packages: raw_vendor.packages.unwrap_or_default(),
    copies: raw_vendor.copies.unwrap_or_default(),
  };

  let optimizer = raw_options
    .optimizer
    .map(|raw| normalize_optimizer(&raw, &cwd, minify, &config_path))
    .transpose()?;

  let raw_css = raw_options.css.unwrap_or_default();
  let css = NormalizedCssOptions {
    inline_urls: raw_css.inline_urls.unwrap_or(true),
    inline_max_size: raw_css.inline_max_size,
    watch: raw_css.watch.unwrap_or_default(),
    debounce_ms: raw_css.debounce_ms.unwrap_or(100),
  };

  let raw_stamp = raw_options.stamp.unwrap_or_default();
  let stamp = NormalizedStampOptions {
    path: raw_stamp.path.unwrap_or_else(|| "dist/stampfile".to_string()),
    template: raw_stamp.template.unwrap_or_else(|| DEFAULT_STAMP_TEMPLATE.to_string()),
  };

  Ok(NormalizedOptions {
    manifest: PathBuf::from(raw_options.manifest.as_deref().unwrap_or("resources.json")),
    minify,
    banner: raw_options.banner.unwrap_or_else(|| DEFAULT_BANNER.to_string()),
    vendor,
    optimizer,
    css,
    stamp,
    cwd,
  })
}

fn normalize_optimizer(
  raw: &OptimizerOptions,
  cwd: &Path,
  minify: bool,
  config_path: &Path,
) -> BuildResult<NormalizedOptimizerOptions> {
  let missing =
    |field: &str| BuildDiagnostic::config(config_path, format!("optimizer.{field} is required"));

  let entry = raw.entry.clone().filter(|entry| !entry.is_empty()).ok_or_else(|| missing("entry"))?;
  let out = raw.out.as_deref().filter(|out| !out.is_empty()).ok_or_else(|| missing("out"))?;

  Ok(NormalizedOptimizerOptions {
    base_url: cwd.join(raw.base_url.as_deref().unwrap_or_default()).normalize(),
    entry,
    out: cwd.join(out).normalize(),
    modules: ModuleConfig::build(raw),
    minify: raw.minify.unwrap_or(minify),
  })
}
