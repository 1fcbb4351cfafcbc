pub mod normalized_options;

use std::path::PathBuf;

use assetpack_utils::indexmap::FxIndexMap;
use serde::Deserialize;

/// Raw contents of `assetpack.json`. Every field is optional here; defaults are
/// applied once by `normalize_options`.
#[derive(Default, Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProjectOptions {
  #[serde(skip)]
  pub cwd: Option<PathBuf>,
  /// Where the options were read from, named by configuration errors.
  #[serde(skip)]
  pub config_path: Option<PathBuf>,
  pub manifest: Option<String>,
  pub minify: Option<bool>,
  pub banner: Option<String>,
  pub vendor: Option<VendorOptions>,
  pub optimizer: Option<OptimizerOptions>,
  pub css: Option<CssOptions>,
  pub stamp: Option<StampOptions>,
}

#[derive(Default, Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct VendorOptions {
  pub source_root: Option<String>,
  pub dest_dir: Option<String>,
  pub packages: Option<Vec<String>>,
  pub copies: Option<Vec<CopyEntry>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CopyEntry {
  pub from: String,
  pub to: String,
  pub include: Option<String>,
}

#[derive(Default, Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct OptimizerOptions {
  pub base_url: Option<String>,
  pub entry: Option<String>,
  pub out: Option<String>,
  pub paths: Option<FxIndexMap<String, String>>,
  pub shim: Option<FxIndexMap<String, RawShim>>,
  pub stub_modules: Option<Vec<String>>,
  pub stub_globals: Option<FxIndexMap<String, String>>,
  pub path_remap: Option<Vec<PathRemap>>,
  pub module_groups: Option<Vec<ModuleGroup>>,
  pub minify: Option<bool>,
}

/// A shim is either a bare dependency list or a full configuration object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawShim {
  Deps(Vec<String>),
  Config(RawShimConfig),
}

#[derive(Default, Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RawShimConfig {
  #[serde(default)]
  pub deps: Vec<String>,
  pub exports: Option<String>,
  pub init: Option<crate::InitDescription>,
}

/// Rewrites a path-table value that starts with `from`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PathRemap {
  pub from: String,
  pub to: String,
}

/// Generates one path entry, and a shim when `deps` is given, per name.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ModuleGroup {
  pub prefix: String,
  pub names: Vec<String>,
  /// Path template, `{name}` is replaced by every entry of `names`.
  pub path: String,
  #[serde(default)]
  pub deps: Option<Vec<String>>,
}

#[derive(Default, Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CssOptions {
  pub inline_urls: Option<bool>,
  pub inline_max_size: Option<u64>,
  pub watch: Option<Vec<String>>,
  pub debounce_ms: Option<u64>,
}

#[derive(Default, Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct StampOptions {
  pub path: Option<String>,
  pub template: Option<String>,
}
