use std::path::{Path, PathBuf};

use arcstr::ArcStr;
use assetpack_common::ModuleConfig;
use assetpack_error::BuildDiagnostic;
use sugar_path::SugarPath;

use crate::module_name::normalize_module_name;

const PSEUDO_MODULES: [&str; 3] = ["require", "exports", "module"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedKind {
  /// Provided by the page; `global` is the lookup path.
  Stub { global: String },
  /// `require`, `exports` and `module`, provided by the runtime.
  Pseudo,
  Script { path: PathBuf },
  /// Resource of the `text!` plugin, inlined as a string.
  Text { path: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveReturn {
  /// Normalized module name, the key the module is registered under.
  pub name: ArcStr,
  pub kind: ResolvedKind,
}

#[derive(Debug)]
pub struct ModuleResolver<'a> {
  base_dir: PathBuf,
  config: &'a ModuleConfig,
}

impl<'a> ModuleResolver<'a> {
  pub fn new(base_dir: impl Into<PathBuf>, config: &'a ModuleConfig) -> Self {
    Self { base_dir: base_dir.into(), config }
  }

  pub fn config(&self) -> &ModuleConfig {
    self.config
  }

  pub fn resolve(&self, name: &str, importer: &str) -> Result<ResolveReturn, BuildDiagnostic> {
    let unresolved =
      || BuildDiagnostic::UnresolvedModule { name: name.to_string(), importer: importer.to_string() };

    if let Some((plugin, resource)) = name.split_once('!') {
      if plugin != "text" {
        return Err(BuildDiagnostic::UnsupportedPlugin {
          name: name.to_string(),
          plugin: plugin.to_string(),
        });
      }
      let resource = normalize_module_name(resource, Some(importer)).ok_or_else(unresolved)?;
      let path = self.lookup_path(&resource).ok_or_else(unresolved)?;
      return Ok(ResolveReturn {
        name: arcstr::format!("text!{resource}"),
        kind: ResolvedKind::Text { path: self.base_dir.join(path).normalize() },
      });
    }

    let normalized = normalize_module_name(name, Some(importer)).ok_or_else(unresolved)?;

    if let Some(global) = self.config.stubs.global_path(&normalized) {
      return Ok(ResolveReturn {
        name: normalized.into(),
        kind: ResolvedKind::Stub { global: global.to_string() },
      });
    }

    if PSEUDO_MODULES.contains(&normalized.as_str()) {
      return Ok(ResolveReturn { name: normalized.into(), kind: ResolvedKind::Pseudo });
    }

    let path = self.lookup_path(&normalized).ok_or_else(unresolved)?;
    let file = if Path::new(&path).extension().is_some_and(|ext| ext == "js") {
      path
    } else {
      format!("{path}.js")
    };
    Ok(ResolveReturn {
      name: normalized.into(),
      kind: ResolvedKind::Script { path: self.base_dir.join(file).normalize() },
    })
  }

  /// Exact path entry first, then the longest prefix ending at a `/` boundary.
  fn lookup_path(&self, name: &str) -> Option<String> {
    if let Some(path) = self.config.paths.get(name) {
      return Some(path.clone());
    }

    let mut prefix = name;
    while let Some((head, _)) = prefix.rsplit_once('/') {
      if let Some(path) = self.config.paths.get(head) {
        let rest = &name[head.len()..];
        return Some(format!("{path}{rest}"));
      }
      prefix = head;
    }
    None
  }

  /// Every shim dependency that is neither a known path nor a stub.
  pub fn check_shims(&self) -> Vec<BuildDiagnostic> {
    self
      .config
      .shims
      .iter()
      .flat_map(|(shim, config)| config.deps.iter().map(move |dep| (shim, dep)))
      .filter(|(shim, dep)| self.resolve(dep, shim).is_err())
      .map(|(shim, dep)| BuildDiagnostic::UnresolvedShimDependency {
        shim: shim.clone(),
        name: dep.clone(),
      })
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use assetpack_common::{ShimConfig, ShimTable};
  use pretty_assertions::assert_eq;

  use super::*;

  fn config() -> ModuleConfig {
    let mut config = ModuleConfig::default();
    config.paths.insert("tinymce".into(), "dist/tinymce/tinymce".into());
    config.paths.insert("mockup-patterns-tinymce".into(), "dist/mockup/patterns/tinymce".into());
    config.paths.insert("mockup-patterns".into(), "dist/mockup/patterns".into());
    config.paths.insert("moment".into(), "dist/moment/moment.js".into());
    config.stubs.insert("jquery", "jQuery");
    let mut shims = ShimTable::default();
    shims.insert("tinymce".into(), ShimConfig { deps: vec!["jquery".into()], exports: None });
    config.shims = shims;
    config
  }

  #[test]
  fn resolution_order() {
    let config = config();
    let resolver = ModuleResolver::new("/base", &config);

    assert_eq!(
      resolver.resolve("jquery", "app").unwrap().kind,
      ResolvedKind::Stub { global: "jQuery".into() }
    );
    assert_eq!(resolver.resolve("module", "app").unwrap().kind, ResolvedKind::Pseudo);
    assert_eq!(
      resolver.resolve("tinymce", "app").unwrap().kind,
      ResolvedKind::Script { path: PathBuf::from("/base/dist/tinymce/tinymce.js") }
    );
    assert_eq!(
      resolver.resolve("moment", "app").unwrap().kind,
      ResolvedKind::Script { path: PathBuf::from("/base/dist/moment/moment.js") }
    );
  }

  #[test]
  fn longest_prefix_wins() {
    let config = config();
    let resolver = ModuleResolver::new("/base", &config);

    let resolved = resolver.resolve("mockup-patterns-tinymce/js/links", "app").unwrap();
    assert_eq!(resolved.name, "mockup-patterns-tinymce/js/links");
    assert_eq!(
      resolved.kind,
      ResolvedKind::Script { path: PathBuf::from("/base/dist/mockup/patterns/tinymce/js/links.js") }
    );
    // `mockup-patterns` is not a segment prefix of `mockup-patternsx`.
    assert!(resolver.resolve("mockup-patternsx/a", "app").is_err());
  }

  #[test]
  fn relative_names_are_resolved_against_the_importer() {
    let config = config();
    let resolver = ModuleResolver::new("/base", &config);

    let resolved = resolver.resolve("./utils", "mockup-patterns-tinymce/js/links").unwrap();
    assert_eq!(resolved.name, "mockup-patterns-tinymce/js/utils");

    let text = resolver.resolve("text!./templates/link.xml", "mockup-patterns-tinymce/pattern").unwrap();
    assert_eq!(text.name, "text!mockup-patterns-tinymce/templates/link.xml");
    assert_eq!(
      text.kind,
      ResolvedKind::Text { path: PathBuf::from("/base/dist/mockup/patterns/tinymce/templates/link.xml") }
    );
  }

  #[test]
  fn unresolved_names_and_plugins() {
    let config = config();
    let resolver = ModuleResolver::new("/base", &config);

    let error = resolver.resolve("foo", "app").unwrap_err();
    assert_eq!(error.to_string(), "Cannot resolve module \"foo\" required by \"app\"");

    let error = resolver.resolve("css!style", "app").unwrap_err();
    assert!(matches!(error, BuildDiagnostic::UnsupportedPlugin { plugin, .. } if plugin == "css"));
  }

  #[test]
  fn shim_dependencies_must_resolve() {
    let mut config = config();
    assert!(ModuleResolver::new("/base", &config).check_shims().is_empty());

    config.shims.insert("tinymce-link".into(), ShimConfig {
      deps: vec!["tinymce".into(), "underscore".into()],
      exports: None,
    });
    let errors = ModuleResolver::new("/base", &config).check_shims();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].to_string().contains("\"underscore\""));
  }
}
