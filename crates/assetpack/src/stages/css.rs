use std::path::PathBuf;

use anyhow::Context;
use assetpack_common::{AssetKind, NormalizedOptions, OutputAsset, ResourceManifest, StyleSheet};
use assetpack_css::{CssCompileOptions, StylesheetCompiler};
use assetpack_error::{BuildDiagnostic, BuildResult};
use assetpack_fs::FileSystem;
use assetpack_utils::rayon::{IntoParallelRefIterator, ParallelIterator};
use tracing::{info, warn};

use super::collect_outputs;

pub struct StylesheetOutput {
  pub asset: OutputAsset,
  /// Every file the stylesheet was compiled from, the source included.
  pub dependencies: Vec<PathBuf>,
}

pub struct CssStage<'a> {
  fs: &'a dyn FileSystem,
  options: &'a NormalizedOptions,
  manifest: &'a ResourceManifest,
}

impl<'a> CssStage<'a> {
  pub fn new(
    fs: &'a dyn FileSystem,
    options: &'a NormalizedOptions,
    manifest: &'a ResourceManifest,
  ) -> Self {
    Self { fs, options, manifest }
  }

  pub fn run(&self) -> BuildResult<Vec<OutputAsset>> {
    let compile_options = css_compile_options(self.options);
    let sheets = self.manifest.style_sheets(&self.options.cwd);
    let results = sheets
      .par_iter()
      .map(|sheet| compile_stylesheet(self.fs, &compile_options, sheet).map(|out| vec![out.asset]))
      .collect::<Vec<_>>();
    collect_outputs(results)
  }
}

pub fn css_compile_options(options: &NormalizedOptions) -> CssCompileOptions {
  CssCompileOptions {
    inline_urls: options.css.inline_urls,
    inline_max_size: options.css.inline_max_size,
    minify: options.minify,
  }
}

/// Compiles one stylesheet and writes it next to its source.
pub fn compile_stylesheet(
  fs: &dyn FileSystem,
  options: &CssCompileOptions,
  sheet: &StyleSheet,
) -> BuildResult<StylesheetOutput> {
  let compiled = StylesheetCompiler::new(fs, options)
    .compile(&sheet.source)
    .map_err(anyhow::Error::from)
    .with_context(|| format!("Failed to build style \"{}\"", sheet.name))?;

  for warning in &compiled.warnings {
    warn!("{}: {warning}", sheet.name);
  }

  fs.write_atomic(&sheet.output, compiled.code.as_bytes())
    .map_err(|err| BuildDiagnostic::io("write", &sheet.output, err))?;
  info!("compiled {} from {} files", sheet.output.display(), compiled.dependencies.len() + 1);

  let mut dependencies = Vec::with_capacity(compiled.dependencies.len() + 1);
  dependencies.push(sheet.source.clone());
  dependencies.extend(compiled.dependencies);
  Ok(StylesheetOutput {
    asset: OutputAsset::new(AssetKind::Stylesheet, &sheet.output, compiled.code.len()),
    dependencies,
  })
}

#[cfg(test)]
mod tests {
  use std::{fs, path::Path};

  use assetpack_common::ProjectOptions;
  use assetpack_error::DiagnosticKind;
  use assetpack_fs::OsFileSystem;

  use super::*;
  use crate::utils::normalize_options::normalize_options;

  #[test]
  fn broken_stylesheets_do_not_stop_their_siblings() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let static_dir = root.join("static");
    fs::create_dir_all(static_dir.join("less")).unwrap();
    fs::write(static_dir.join("less/colors.less"), "@brand: #ff0000;\n").unwrap();
    fs::write(
      static_dir.join("karl.less"),
      "@import \"less/colors\";\n// dropped\n.header { color: @brand; }\n",
    )
    .unwrap();
    fs::write(static_dir.join("broken.less"), ".header { color: @missing; }\n").unwrap();

    let options =
      normalize_options(ProjectOptions { cwd: Some(root.to_path_buf()), ..Default::default() })
        .unwrap();
    let manifest = ResourceManifest::parse(
      r#"{"staticPrefix": "static/", "minPrefix": "min/", "js": {}, "css": ["karl", "broken"]}"#,
      Path::new("resources.json"),
    )
    .unwrap();

    let error = CssStage::new(&OsFileSystem, &options, &manifest).run().unwrap_err();

    assert_eq!(error.kinds(), vec![DiagnosticKind::Compile]);
    assert!(error.to_string().contains("\"broken\""));
    assert_eq!(fs::read_to_string(static_dir.join("karl.css")).unwrap(), ".header{color:red}");
    assert!(!static_dir.join("broken.css").exists());
  }

  #[test]
  fn dependencies_include_the_source_and_its_imports() {
    let dir = tempfile::tempdir().unwrap();
    let static_dir = dir.path().join("static");
    fs::create_dir_all(&static_dir).unwrap();
    fs::write(static_dir.join("base.less"), "a { color: blue; }\n").unwrap();
    fs::write(static_dir.join("site.less"), "@import \"base\";\n").unwrap();
    let sheet = StyleSheet {
      name: "site".to_string(),
      source: static_dir.join("site.less"),
      output: static_dir.join("site.css"),
    };

    let output = compile_stylesheet(&OsFileSystem, &CssCompileOptions::default(), &sheet).unwrap();

    assert_eq!(output.dependencies.len(), 2);
    assert_eq!(output.dependencies[0], static_dir.join("site.less"));
    assert!(output.dependencies[1].ends_with("base.less"));
    let written = fs::read_to_string(static_dir.join("site.css")).unwrap();
    assert_eq!(output.asset.size, written.len());
    assert!(written.starts_with("a{color:"));
  }
}
