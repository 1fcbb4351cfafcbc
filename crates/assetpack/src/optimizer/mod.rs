mod generate_stage;
mod link_stage;
mod runtime;
mod scan_stage;

use assetpack_common::{AssetKind, NormalizedOptimizerOptions, OutputAsset};
use assetpack_ecmascript::EcmaCompiler;
use assetpack_error::{BuildDiagnostic, BuildError, BuildResult};
use assetpack_fs::FileSystem;
use assetpack_resolver::ModuleResolver;
use tracing::{debug, info};

use self::{generate_stage::GenerateStage, link_stage::LinkStage, scan_stage::ScanStage};

/// Bundles the AMD module graph reachable from one entry into a single
/// loader-free script.
pub struct OptimizeStage<'a> {
  fs: &'a dyn FileSystem,
  options: &'a NormalizedOptimizerOptions,
}

impl<'a> OptimizeStage<'a> {
  pub fn new(fs: &'a dyn FileSystem, options: &'a NormalizedOptimizerOptions) -> Self {
    Self { fs, options }
  }

  pub fn run(&self) -> BuildResult<Vec<OutputAsset>> {
    let code = self.bundle()?;
    let out = &self.options.out;
    self
      .fs
      .write_atomic(out, code.as_bytes())
      .map_err(|err| BuildDiagnostic::io("write", out, err))?;
    info!("optimized {} into {}", self.options.entry, out.display());
    Ok(vec![OutputAsset::new(AssetKind::Optimized, out, code.len())])
  }

  /// Everything but the write, so a failure never leaves a partial output.
  pub fn bundle(&self) -> BuildResult<String> {
    let resolver = ModuleResolver::new(&self.options.base_url, &self.options.modules);

    let shim_errors = resolver.check_shims();
    if !shim_errors.is_empty() {
      return Err(BuildError(shim_errors.into_iter().map(anyhow::Error::from).collect()));
    }

    let graph = ScanStage::new(self.fs, &resolver).scan(&self.options.entry)?;
    let sorted_modules = LinkStage::new(&graph).sort_modules()?;
    debug!("{} modules reachable from {}", sorted_modules.len(), self.options.entry);

    let code = GenerateStage::new(&graph, &sorted_modules).render()?;
    if self.options.minify {
      Ok(EcmaCompiler::minify(&code, &self.options.out, None)?.code)
    } else {
      Ok(code)
    }
  }
}

#[cfg(test)]
mod tests {
  use std::{fs, path::Path};

  use assetpack_common::{ModuleConfig, OptimizerOptions};
  use assetpack_error::DiagnosticKind;
  use assetpack_fs::OsFileSystem;

  use super::*;

  fn write(root: &Path, path: &str, content: &str) {
    let path = root.join(path);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
  }

  fn options(root: &Path, config: &str, minify: bool) -> NormalizedOptimizerOptions {
    let raw: OptimizerOptions = serde_json::from_str(config).unwrap();
    NormalizedOptimizerOptions {
      base_url: root.to_path_buf(),
      entry: raw.entry.clone().unwrap(),
      out: root.join("out/bundle.js"),
      modules: ModuleConfig::build(&raw),
      minify,
    }
  }

  fn fixture(root: &Path) {
    write(
      root,
      "js/app.js",
      "define(['jquery', 'tinymce', './helpers', 'text!./tpl/link.html'], \
       function ($, tinymce, helpers, tpl) {\n  return { tpl: tpl };\n});\n",
    );
    write(root, "js/helpers.js", "define(function (require) {\n  var util = require('util');\n  return util;\n});\n");
    write(root, "js/util.js", "\"use strict\";\nvar util = { answer: 42 };\n");
    write(root, "js/tpl/link.html", "<a href=\"#\">link</a>\n");
    write(root, "vendor/tinymce.js", "window.tinymce = { version: 4 };\n");
  }

  const CONFIG: &str = r#"{
    "entry": "app",
    "paths": {
      "app": "js/app",
      "helpers": "js/helpers",
      "util": "js/util",
      "tpl": "js/tpl",
      "tinymce": "vendor/tinymce"
    },
    "shim": {
      "tinymce": {
        "deps": ["jquery"],
        "exports": "tinymce",
        "init": { "assign": [{ "path": "tinymce.baseURL", "value": "/static/tinymce" }] }
      }
    },
    "stubModules": ["jquery"],
    "stubGlobals": { "jquery": "jQuery" }
  }"#;

  #[test]
  fn renders_every_kind_of_module_in_dependency_order() {
    let dir = tempfile::tempdir().unwrap();
    fixture(dir.path());
    let options = options(dir.path(), CONFIG, false);

    let code = OptimizeStage::new(&OsFileSystem, &options).bundle().unwrap();

    assert!(code.starts_with("var define, require, amdLookup, amdInit, amdStart;\n"));
    assert!(code.contains("define(\"jquery\", [], function () { return amdLookup(\"jQuery\"); });"));
    assert!(code.contains(
      "return amdInit({\"assign\":[{\"path\":\"tinymce.baseURL\",\"value\":\"/static/tinymce\"}],\"returns\":\"tinymce\"});"
    ));
    assert!(code.contains(
      "(function (root) {\ndefine(\"tinymce\", [\"jquery\"], function () {\nreturn (function () {\nwindow.tinymce"
    ));
    assert!(code.contains("}).apply(root, arguments);\n});\n})(this);\n"));
    assert!(code.contains("define(\"app\", ['jquery'"));
    assert!(code.contains("define(\"helpers\", function (require)"));
    assert!(code.contains(
      "define(\"text!tpl/link.html\", [], function () { return \"<a href=\\\"#\\\">link</a>\\n\"; });"
    ));
    assert!(code.contains("\nvar util = { answer: 42 };\n\ndefine(\"util\", [], function () {});"));

    let position = |needle: &str| code.find(needle).unwrap();
    assert!(position("define(\"jquery\"") < position("define(\"tinymce\""));
    assert!(position("define(\"util\"") < position("define(\"helpers\""));
    assert!(position("define(\"helpers\"") < position("define(\"text!tpl/link.html\""));
    assert!(position("define(\"text!tpl/link.html\"") < position("define(\"app\""));
    assert_eq!(code.matches("amdStart(").count(), 1);
    assert!(code.ends_with("\namdStart(\"app\");\n"));
  }

  #[test]
  fn output_is_byte_identical_across_runs() {
    let dir = tempfile::tempdir().unwrap();
    fixture(dir.path());
    let options = options(dir.path(), CONFIG, true);
    let stage = OptimizeStage::new(&OsFileSystem, &options);

    let first = stage.bundle().unwrap();
    let second = stage.bundle().unwrap();

    assert_eq!(first, second);
    assert!(first.contains("\"text!tpl/link.html\""));
    assert!(first.contains("\"jQuery\""));
    assert!(!first.contains(dir.path().to_str().unwrap()));
  }

  #[test]
  fn plain_scripts_keep_their_globals_when_minified() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "app.js", "define(['legacy'], function () {\n  return window.karlGlobal;\n});\n");
    write(
      dir.path(),
      "legacy.js",
      "var karlGlobal = { answer: 42 };\nfunction karlHelper(value) {\n  return karlGlobal.answer + value;\n}\n",
    );
    let options =
      options(dir.path(), r#"{"entry": "app", "paths": {"app": "app", "legacy": "legacy"}}"#, true);

    let code = OptimizeStage::new(&OsFileSystem, &options).bundle().unwrap();

    assert!(code.contains("karlGlobal"));
    assert!(code.contains("function karlHelper("));
    assert!(code.contains("42"));
    assert!(code.find("karlHelper").unwrap() < code.find("\"legacy\"").unwrap());
    assert!(!code.contains('`'));
  }

  #[test]
  fn cycles_fail_without_writing() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a.js", "define(['b'], function () {});");
    write(dir.path(), "b.js", "define(['a'], function () {});");
    let options = options(dir.path(), r#"{"entry": "a", "paths": {"a": "a", "b": "b"}}"#, true);

    let error = OptimizeStage::new(&OsFileSystem, &options).run().unwrap_err();

    assert_eq!(error.kinds(), vec![DiagnosticKind::Resolution]);
    assert_eq!(error.to_string(), "Circular dependency: a -> b -> a");
    assert!(!options.out.exists());
  }

  #[test]
  fn unresolved_names_are_all_reported_before_writing() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "app.js", "define(['foo', 'lib'], function () {});");
    write(dir.path(), "lib.js", "require(['bar'], function () {});");
    let options =
      options(dir.path(), r#"{"entry": "app", "paths": {"app": "app", "lib": "lib"}}"#, true);

    let error = OptimizeStage::new(&OsFileSystem, &options).run().unwrap_err();

    assert_eq!(error.kinds(), vec![DiagnosticKind::Resolution, DiagnosticKind::Resolution]);
    let message = error.to_string();
    assert!(message.contains("Cannot resolve module \"foo\" required by \"app\""));
    assert!(message.contains("Cannot resolve module \"bar\" required by \"lib\""));
    assert!(!options.out.exists());
  }

  #[test]
  fn unresolved_shim_dependencies_fail_before_scanning() {
    let dir = tempfile::tempdir().unwrap();
    let options = options(
      dir.path(),
      r#"{"entry": "app", "paths": {"app": "app"}, "shim": {"app": ["missing"]}}"#,
      true,
    );

    let error = OptimizeStage::new(&OsFileSystem, &options).bundle().unwrap_err();

    assert_eq!(error.len(), 1);
    assert!(error.to_string().contains("Shim \"app\" depends on \"missing\""));
  }

  #[test]
  fn two_anonymous_defines_are_ambiguous() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "app.js", "define([], function () {});\ndefine([], function () {});\n");
    let options = options(dir.path(), r#"{"entry": "app", "paths": {"app": "app"}}"#, true);

    let error = OptimizeStage::new(&OsFileSystem, &options).bundle().unwrap_err();

    assert_eq!(error.kinds(), vec![DiagnosticKind::Resolution]);
    assert!(error.to_string().contains("2 anonymous define() calls"));
  }

  #[test]
  fn an_anonymous_define_beside_the_named_one_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "app.js", "define('app', [], function () {});\ndefine([], function () {});\n");
    let options = options(dir.path(), r#"{"entry": "app", "paths": {"app": "app"}}"#, false);

    let error = OptimizeStage::new(&OsFileSystem, &options).bundle().unwrap_err();

    assert_eq!(error.kinds(), vec![DiagnosticKind::Resolution]);
    assert!(error.to_string().contains("defines itself by name and also contains an anonymous define()"));
  }
}
