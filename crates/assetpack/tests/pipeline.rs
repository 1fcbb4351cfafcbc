use std::{fs, path::Path};

use assetpack::{Command, DiagnosticKind, Pipeline, Task};
use tempfile::TempDir;

const MANIFEST: &str = r#"{
  "staticPrefix": "static/",
  "minPrefix": "dist/min/",
  "js": {
    "karl-ui": ["dist/jquery/dist/jquery.js", "js/karl.js"],
    "karl-tagbox": ["js/tagbox.js"]
  },
  "css": ["karl"]
}"#;

const CONFIG: &str = r#"{
  "manifest": "resources.json",
  "vendor": { "packages": ["jquery"] },
  "optimizer": {
    "baseUrl": "static",
    "entry": "karl-app",
    "out": "static/dist/karl-app.min.js",
    "paths": { "karl-app": "js/app", "karl-tagbox": "js/tagbox-module" },
    "stubModules": ["jquery"],
    "stubGlobals": { "jquery": "jQuery" }
  }
}"#;

fn write(root: &Path, path: &str, content: &str) {
  let path = root.join(path);
  fs::create_dir_all(path.parent().unwrap()).unwrap();
  fs::write(path, content).unwrap();
}

fn project(manifest: &str, config: &str) -> TempDir {
  let dir = tempfile::tempdir().unwrap();
  let root = dir.path();
  write(root, "assetpack.json", config);
  write(root, "resources.json", manifest);
  write(root, "bower_components/jquery/dist/jquery.js", "window.jQuery = \"jquery-source\";\n");
  write(root, "bower_components/jquery/README.md", "# jQuery\n");
  write(root, "static/js/karl.js", "window.karl = \"karl-source\";\n");
  write(root, "static/js/tagbox.js", "window.tagbox = \"tagbox-source\";\n");
  write(root, "static/js/app.js", "define(['jquery', 'karl-tagbox'], function ($, tagbox) {\n  return tagbox;\n});\n");
  write(root, "static/js/tagbox-module.js", "define([], function () {\n  return \"tagbox-module\";\n});\n");
  write(root, "static/karl.less", "@import \"less/vars\";\n.header { color: @brand; }\n");
  write(root, "static/less/vars.less", "@brand: red;\n");
  dir
}

fn pipeline(dir: &TempDir) -> Pipeline {
  Pipeline::from_config_file(dir.path(), Path::new("assetpack.json")).unwrap()
}

fn read(dir: &TempDir, path: &str) -> String {
  fs::read_to_string(dir.path().join(path)).unwrap()
}

#[tokio::test]
async fn install_produces_every_output_and_the_stamp() {
  let dir = project(MANIFEST, CONFIG);

  let outputs = pipeline(&dir).run(Command::Install).await.into_result().unwrap();

  // One vendor tree, two bundles with their maps, the optimized bundle, one
  // stylesheet and the stamp.
  assert_eq!(outputs.len(), 8);
  assert!(dir.path().join("static/dist/jquery/README.md").exists());
  for name in ["karl-ui", "karl-tagbox"] {
    assert!(dir.path().join(format!("static/dist/min/{name}.min.js")).exists());
    assert!(dir.path().join(format!("static/dist/min/{name}.min.js.map")).exists());
  }
  assert_eq!(read(&dir, "static/karl.css"), ".header{color:red}");
  assert!(read(&dir, "static/dist/stampfile").starts_with("resources generated at "));

  let bundle = read(&dir, "static/dist/min/karl-ui.min.js");
  assert!(bundle.find("jquery-source").unwrap() < bundle.find("karl-source").unwrap());
  assert!(bundle.ends_with("//# sourceMappingURL=karl-ui.min.js.map\n"));

  let optimized = read(&dir, "static/dist/karl-app.min.js");
  assert!(optimized.contains("tagbox-module"));
  assert!(optimized.contains("jQuery"));
  assert!(!optimized.contains("jquery-source"));
}

#[tokio::test]
async fn an_empty_js_section_produces_no_scripts() {
  let dir = project(
    r#"{"staticPrefix": "static/", "minPrefix": "dist/min/", "js": {}, "css": []}"#,
    r#"{"manifest": "resources.json"}"#,
  );

  let outputs = pipeline(&dir).run(Command::ProcessJs).await.into_result().unwrap();

  assert!(outputs.is_empty());
  assert!(!dir.path().join("static/dist/min").exists());
}

#[tokio::test]
async fn unresolved_modules_fail_before_anything_is_written() {
  let dir = project(MANIFEST, CONFIG);
  write(dir.path(), "static/js/app.js", "define(['jquery', 'foo'], function () {});\n");

  let error = pipeline(&dir).run(Command::OptimizeJs).await.into_result().unwrap_err();

  assert_eq!(error.kinds(), vec![DiagnosticKind::Resolution]);
  assert!(error.to_string().contains("\"foo\""));
  assert!(!dir.path().join("static/dist/karl-app.min.js").exists());
}

#[tokio::test]
async fn copying_twice_leaves_the_tree_untouched() {
  let dir = project(MANIFEST, CONFIG);
  let pipeline = pipeline(&dir);
  let copied = dir.path().join("static/dist/jquery/dist/jquery.js");

  pipeline.run(Command::Copy).await.into_result().unwrap();
  let first = fs::metadata(&copied).unwrap().modified().unwrap();
  pipeline.run(Command::Copy).await.into_result().unwrap();

  assert_eq!(fs::metadata(&copied).unwrap().modified().unwrap(), first);
  assert_eq!(read(&dir, "static/dist/jquery/dist/jquery.js"), "window.jQuery = \"jquery-source\";\n");
}

#[test]
fn colliding_outputs_are_rejected_up_front() {
  let config = CONFIG.replace("static/dist/karl-app.min.js", "static/dist/min/karl-ui.min.js");
  let dir = project(MANIFEST, &config);

  let Err(error) = Pipeline::from_config_file(dir.path(), Path::new("assetpack.json")) else {
    panic!("the optimizer output collides with a bundle");
  };

  assert_eq!(error.kinds(), vec![DiagnosticKind::Config]);
  assert!(error.to_string().contains("optimizer output collides with bundle \"karl-ui\""));
  assert!(!dir.path().join("static/dist").exists());
}

#[tokio::test]
async fn a_failed_task_skips_only_the_stamp() {
  let dir = project(MANIFEST, CONFIG);
  fs::remove_file(dir.path().join("static/js/tagbox.js")).unwrap();

  let report = pipeline(&dir).run(Command::Install).await;

  assert_eq!(report.failed, vec![Task::ConcatJs]);
  assert_eq!(report.skipped, vec![Task::Stamp]);
  assert_eq!(report.errors.kinds(), vec![DiagnosticKind::Io]);
  assert!(dir.path().join("static/karl.css").exists());
  assert!(dir.path().join("static/dist/min/karl-ui.min.js").exists());
  assert!(!dir.path().join("static/dist/stampfile").exists());
}

#[test]
fn unknown_configuration_fields_are_config_errors() {
  let dir = project(MANIFEST, r#"{"manifest": "resources.json", "minfy": true}"#);

  let Err(error) = Pipeline::from_config_file(dir.path(), Path::new("assetpack.json")) else {
    panic!("misspelled fields are rejected");
  };

  assert_eq!(error.kinds(), vec![DiagnosticKind::Config]);
  assert!(error.to_string().contains("assetpack.json"));
}
