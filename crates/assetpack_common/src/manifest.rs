use std::path::{Path, PathBuf};

use assetpack_error::{BuildDiagnostic, BuildError, BuildResult};
use assetpack_fs::FileSystem;
use assetpack_utils::{
  indexmap::FxIndexMap,
  path_ext::{PathExt, join_prefixed},
};
use rustc_hash::FxHashMap;
use serde::Deserialize;

/// The resource manifest shared with the web application: which files make up
/// every script bundle and which stylesheets exist.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceManifest {
  #[serde(skip)]
  pub path: PathBuf,
  pub static_prefix: String,
  pub min_prefix: String,
  /// Bundle name to ordered refs, relative to `static_prefix`.
  pub js: FxIndexMap<String, Vec<String>>,
  pub css: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct BundleSpec {
  pub name: String,
  /// `(manifest ref, absolute path)` in declaration order.
  pub sources: Vec<(String, PathBuf)>,
  pub output: PathBuf,
  pub map_output: PathBuf,
}

impl BundleSpec {
  /// `<name>.min.js`, as referenced from the banner and the map comment.
  pub fn file_name(&self) -> String {
    format!("{}.min.js", self.name)
  }

  pub fn map_file_name(&self) -> String {
    format!("{}.min.js.map", self.name)
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleSheet {
  pub name: String,
  pub source: PathBuf,
  pub output: PathBuf,
}

impl ResourceManifest {
  /// `path` is relative to `root`.
  pub fn load(fs: &dyn FileSystem, root: &Path, path: &Path) -> BuildResult<Self> {
    let full_path = root.join(path);
    let content = fs
      .read_to_string(&full_path)
      .map_err(|err| BuildDiagnostic::io("read manifest", &full_path, err))?;
    Self::parse(&content, path)
  }

  pub fn parse(content: &str, path: &Path) -> BuildResult<Self> {
    let mut manifest: Self = serde_json::from_str(content)
      .map_err(|err| BuildDiagnostic::config(path, err.to_string()))?;
    manifest.path = path.to_path_buf();
    Ok(manifest)
  }

  pub fn static_root(&self, root: &Path) -> PathBuf {
    join_prefixed(root, &self.static_prefix, "")
  }

  pub fn min_dir(&self, root: &Path) -> PathBuf {
    join_prefixed(root, &self.static_prefix, &self.min_prefix)
  }

  pub fn resolve(&self, root: &Path, relative: &str) -> PathBuf {
    join_prefixed(root, &self.static_prefix, relative)
  }

  pub fn bundle_specs(&self, root: &Path) -> Vec<BundleSpec> {
    self
      .js
      .iter()
      .map(|(name, refs)| {
        let output = self.resolve(root, &format!("{}{name}.min.js", self.min_prefix));
        let map_output = self.resolve(root, &format!("{}{name}.min.js.map", self.min_prefix));
        BundleSpec {
          name: name.clone(),
          sources: refs.iter().map(|item| (item.clone(), self.resolve(root, item))).collect(),
          output,
          map_output,
        }
      })
      .collect()
  }

  pub fn style_sheets(&self, root: &Path) -> Vec<StyleSheet> {
    self
      .css
      .iter()
      .map(|name| {
        let source = self.resolve(root, &format!("{name}.less"));
        let output = source.with_swapped_extension("css");
        StyleSheet { name: name.clone(), source, output }
      })
      .collect()
  }

  /// Checks names, sources and that no two outputs share a path. `extra` are
  /// outputs produced outside the manifest, labelled for error messages.
  pub fn validate(
    &self,
    fs: &dyn FileSystem,
    root: &Path,
    extra: &[(&str, PathBuf)],
  ) -> BuildResult<()> {
    let mut errors = BuildError::default();
    let mut owners: FxHashMap<PathBuf, String> = FxHashMap::default();
    let mut claim = |path: PathBuf, owner: String, errors: &mut BuildError| {
      if let Some(previous) = owners.get(&path) {
        errors.push(
          BuildDiagnostic::config(
            &self.path,
            format!(
              "output {} of {owner} collides with {previous}",
              path.display_relative_to(root)
            ),
          )
          .into(),
        );
      } else {
        owners.insert(path, owner);
      }
    };

    for spec in self.bundle_specs(root) {
      if spec.name.is_empty() {
        errors.push(BuildDiagnostic::config(&self.path, "bundle name must not be empty").into());
        continue;
      }
      claim(spec.output.clone(), format!("bundle \"{}\"", spec.name), &mut errors);
      claim(spec.map_output.clone(), format!("source map of bundle \"{}\"", spec.name), &mut errors);
    }

    for sheet in self.style_sheets(root) {
      if sheet.name.is_empty() {
        errors.push(BuildDiagnostic::config(&self.path, "style name must not be empty").into());
        continue;
      }
      if !fs.exists(&sheet.source) {
        errors.push(
          BuildDiagnostic::config(
            &self.path,
            format!(
              "style \"{}\" has no source at {}",
              sheet.name,
              sheet.source.display_relative_to(root)
            ),
          )
          .into(),
        );
      }
      claim(sheet.output.clone(), format!("style \"{}\"", sheet.name), &mut errors);
    }

    for (label, path) in extra {
      claim(path.clone(), (*label).to_string(), &mut errors);
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
  }
}
