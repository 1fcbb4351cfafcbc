use std::path::{Path, PathBuf};

use assetpack_error::BuildDiagnostic;
use oxc::{
  allocator::Allocator,
  ast::ast::Program,
  codegen::{Codegen, CodegenOptions, CommentOptions},
  diagnostics::OxcDiagnostic,
  minifier::{CompressOptions, MangleOptions, Minifier, MinifierOptions},
  parser::Parser,
  span::SourceType,
  syntax::es_target::ESTarget,
};

pub struct MinifyReturn {
  pub code: String,
  /// JSON source map against the minifier's input, when one was requested.
  pub map: Option<String>,
}

pub struct EcmaCompiler;

impl EcmaCompiler {
  /// Classic scripts: top-level declarations are globals, no import/export.
  pub fn source_type() -> SourceType {
    SourceType::default().with_script(true)
  }

  pub fn parse<'a>(
    allocator: &'a Allocator,
    source: &'a str,
    path: &Path,
  ) -> Result<Program<'a>, BuildDiagnostic> {
    let ret = Parser::new(allocator, source, Self::source_type()).parse();
    if ret.panicked || !ret.errors.is_empty() {
      return Err(BuildDiagnostic::compile(path, describe_errors(&ret.errors, source)));
    }
    Ok(ret.program)
  }

  /// Replaces `"use strict"` prologue directives with spaces so that every
  /// other character keeps its line and column.
  pub fn blank_use_strict(source: &str, path: &Path) -> Result<String, BuildDiagnostic> {
    let allocator = Allocator::default();
    let program = Self::parse(&allocator, source, path)?;

    let mut blanked = source.to_string();
    for directive in program.directives.iter().filter(|d| d.directive == "use strict") {
      let span = directive.span;
      let range = span.start as usize..span.end as usize;
      blanked.replace_range(range.clone(), &" ".repeat(range.len()));
    }
    Ok(blanked)
  }

  /// Whole-script-safe minification: top-level names are never mangled,
  /// string literals and property names are left alone and nothing newer
  /// than ES5 is introduced. Whitespace is kept because the whitespace-free
  /// printer quotes strings with backticks.
  pub fn minify(
    source: &str,
    path: &Path,
    source_map_path: Option<&str>,
  ) -> Result<MinifyReturn, BuildDiagnostic> {
    let allocator = Allocator::default();
    let mut program = Self::parse(&allocator, source, path)?;

    let ret = Minifier::new(MinifierOptions {
      mangle: Some(MangleOptions { top_level: false, ..MangleOptions::default() }),
      compress: Some(CompressOptions { target: ESTarget::ES5, ..CompressOptions::default() }),
    })
    .build(&allocator, &mut program);

    let ret = Codegen::new()
      .with_options(CodegenOptions {
        comments: CommentOptions::disabled(),
        source_map_path: source_map_path.map(PathBuf::from),
        ..CodegenOptions::default()
      })
      .with_scoping(ret.scoping)
      .build(&program);

    Ok(MinifyReturn { code: ret.code, map: ret.map.map(|map| map.to_json_string()) })
  }
}

fn describe_errors(errors: &[OxcDiagnostic], source: &str) -> String {
  errors
    .iter()
    .map(|error| {
      let offset = error.labels.as_ref().and_then(|labels| labels.first()).map(|label| label.offset());
      match offset {
        Some(offset) => {
          let (line, column) = line_column(source, offset);
          format!("{error} ({line}:{column})")
        }
        None => error.to_string(),
      }
    })
    .collect::<Vec<_>>()
    .join("; ")
}

/// One based line and column of a byte offset.
fn line_column(source: &str, offset: usize) -> (usize, usize) {
  let before = &source[..offset.min(source.len())];
  let line = before.matches('\n').count() + 1;
  let column = before.rfind('\n').map_or(before.len(), |idx| before.len() - idx - 1) + 1;
  (line, column)
}
