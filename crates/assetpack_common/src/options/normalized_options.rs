use std::path::PathBuf;

use crate::{CopyEntry, ModuleConfig};

#[derive(Debug)]
pub struct NormalizedOptions {
  pub cwd: PathBuf,
  /// Manifest path relative to `cwd`.
  pub manifest: PathBuf,
  pub minify: bool,
  pub banner: String,
  pub vendor: NormalizedVendorOptions,
  pub optimizer: Option<NormalizedOptimizerOptions>,
  pub css: NormalizedCssOptions,
  pub stamp: NormalizedStampOptions,
}

#[derive(Debug)]
pub struct NormalizedVendorOptions {
  pub source_root: PathBuf,
  pub dest_dir: String,
  pub packages: Vec<String>,
  pub copies: Vec<CopyEntry>,
}

#[derive(Debug)]
pub struct NormalizedOptimizerOptions {
  pub base_url: PathBuf,
  pub entry: String,
  pub out: PathBuf,
  pub modules: ModuleConfig,
  pub minify: bool,
}

#[derive(Debug)]
pub struct NormalizedCssOptions {
  pub inline_urls: bool,
  pub inline_max_size: Option<u64>,
  pub watch: Vec<String>,
  pub debounce_ms: u64,
}

#[derive(Debug)]
pub struct NormalizedStampOptions {
  /// Relative to the manifest's static prefix.
  pub path: String,
  pub template: String,
}
