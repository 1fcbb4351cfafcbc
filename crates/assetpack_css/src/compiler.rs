use std::path::{Path, PathBuf};

use assetpack_error::BuildDiagnostic;
use assetpack_fs::FileSystem;
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};

use crate::{evaluator::evaluate, loader::StylesheetLoader, printer::print, url_inliner::UrlInliner};

#[derive(Debug, Clone)]
pub struct CssCompileOptions {
  pub inline_urls: bool,
  /// Files larger than this many bytes are never inlined.
  pub inline_max_size: Option<u64>,
  pub minify: bool,
}

impl Default for CssCompileOptions {
  fn default() -> Self {
    Self { inline_urls: true, inline_max_size: None, minify: true }
  }
}

#[derive(Debug)]
pub struct CompiledStylesheet {
  pub code: String,
  /// Files imported by the stylesheet, a change to any of them requires a rebuild.
  pub dependencies: Vec<PathBuf>,
  pub warnings: Vec<String>,
}

pub struct StylesheetCompiler<'a> {
  fs: &'a dyn FileSystem,
  options: &'a CssCompileOptions,
}

impl<'a> StylesheetCompiler<'a> {
  pub fn new(fs: &'a dyn FileSystem, options: &'a CssCompileOptions) -> Self {
    Self { fs, options }
  }

  pub fn compile(&self, path: &Path) -> Result<CompiledStylesheet, BuildDiagnostic> {
    let inliner = self
      .options
      .inline_urls
      .then(|| UrlInliner { fs: self.fs, max_size: self.options.inline_max_size });
    let loaded = StylesheetLoader::new(self.fs, inliner).load(path)?;

    let items = evaluate(&loaded.nodes).map_err(|message| BuildDiagnostic::compile(path, message))?;
    let css = print(&items);
    let code = self.finish(&css, path).map_err(|message| BuildDiagnostic::compile(path, message))?;

    Ok(CompiledStylesheet { code, dependencies: loaded.dependencies, warnings: loaded.warnings })
  }

  fn finish(&self, css: &str, path: &Path) -> Result<String, String> {
    let mut sheet = StyleSheet::parse(
      css,
      ParserOptions { filename: path.display().to_string(), ..ParserOptions::default() },
    )
    .map_err(|err| err.to_string())?;

    if self.options.minify {
      sheet.minify(MinifyOptions::default()).map_err(|err| err.to_string())?;
    }

    let printed = sheet
      .to_css(PrinterOptions { minify: self.options.minify, ..PrinterOptions::default() })
      .map_err(|err| err.to_string())?;
    Ok(printed.code)
  }
}
