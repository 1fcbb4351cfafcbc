use assetpack_utils::indexmap::FxIndexMap;
use serde::{Deserialize, Serialize};

use crate::{OptimizerOptions, PathRemap, RawShim};

/// Logical module name to base-relative path without the `.js` suffix.
pub type ModulePathTable = FxIndexMap<String, String>;
pub type ShimTable = FxIndexMap<String, ShimConfig>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShimConfig {
  pub deps: Vec<String>,
  pub exports: Option<ShimExport>,
}

/// What a shimmed script hands to its dependents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShimExport {
  /// Dotted global path, e.g. `tinymce.util.Tools`.
  Path(String),
  Init(InitDescription),
}

/// Data-only replacement for an init callback: a list of global assignments
/// followed by the global path whose value becomes the module value.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct InitDescription {
  #[serde(default)]
  pub assign: Vec<GlobalAssignment>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub returns: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GlobalAssignment {
  pub path: String,
  pub value: serde_json::Value,
}

/// Modules supplied by the page at runtime, keyed by module name, valued by
/// the global path they are looked up from.
#[derive(Default, Debug, Clone)]
pub struct StubSet {
  globals: FxIndexMap<String, String>,
}

impl StubSet {
  pub fn insert(&mut self, name: impl Into<String>, global_path: impl Into<String>) {
    self.globals.insert(name.into(), global_path.into());
  }

  pub fn global_path(&self, name: &str) -> Option<&str> {
    self.globals.get(name).map(String::as_str)
  }
}

/// Module configuration of the optimizer after groups and path remapping have
/// been expanded.
#[derive(Default, Debug, Clone)]
pub struct ModuleConfig {
  pub paths: ModulePathTable,
  pub shims: ShimTable,
  pub stubs: StubSet,
}

impl ModuleConfig {
  pub fn build(raw: &OptimizerOptions) -> Self {
    let mut paths = raw.paths.clone().unwrap_or_default();
    let mut shims = ShimTable::default();

    for group in raw.module_groups.iter().flatten() {
      for name in &group.names {
        let module_name = format!("{}{name}", group.prefix);
        paths.insert(module_name.clone(), group.path.replace("{name}", name));
        if let Some(deps) = &group.deps {
          shims.insert(module_name, ShimConfig { deps: deps.clone(), exports: None });
        }
      }
    }

    let remaps = raw.path_remap.as_deref().unwrap_or_default();
    for path in paths.values_mut() {
      if let Some(remapped) = apply_path_remap(remaps, path) {
        *path = remapped;
      }
    }

    // Explicit shims win over the ones generated from groups.
    for (name, shim) in raw.shim.iter().flatten() {
      shims.insert(name.clone(), normalize_shim(shim));
    }

    let mut stubs = StubSet::default();
    let stub_globals = raw.stub_globals.as_ref();
    for name in raw.stub_modules.iter().flatten() {
      let global = stub_globals.and_then(|globals| globals.get(name)).unwrap_or(name);
      stubs.insert(name.clone(), global.clone());
    }

    Self { paths, shims, stubs }
  }
}

/// First matching rule wins. Returns `None` when no rule applies.
pub fn apply_path_remap(remaps: &[PathRemap], path: &str) -> Option<String> {
  remaps
    .iter()
    .find_map(|remap| path.strip_prefix(remap.from.as_str()).map(|rest| format!("{}{rest}", remap.to)))
}

fn normalize_shim(shim: &RawShim) -> ShimConfig {
  match shim {
    RawShim::Deps(deps) => ShimConfig { deps: deps.clone(), exports: None },
    RawShim::Config(config) => {
      let exports = match (&config.init, &config.exports) {
        (Some(init), exports) => {
          let mut init = init.clone();
          if init.returns.is_none() {
            init.returns.clone_from(exports);
          }
          Some(ShimExport::Init(init))
        }
        (None, Some(path)) => Some(ShimExport::Path(path.clone())),
        (None, None) => None,
      };
      ShimConfig { deps: config.deps.clone(), exports }
    }
  }
}
