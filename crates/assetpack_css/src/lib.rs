// Compiles the LESS subset used by the stylesheets into plain, minified CSS.

mod compiler;
mod evaluator;
mod loader;
mod parser;
mod printer;
mod scanner;
mod url_inliner;

pub use crate::{
  compiler::{CompiledStylesheet, CssCompileOptions, StylesheetCompiler},
  evaluator::evaluate,
  loader::LoadedStylesheet,
  parser::{Node, parse},
  printer::CssItem,
};
