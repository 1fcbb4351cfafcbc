use std::{cell::Cell, path::Path};

use assetpack_error::BuildDiagnostic;
use oxc::{
  allocator::Allocator,
  ast::ast::{self, Argument, ArrayExpressionElement},
  ast_visit::{Visit, walk},
  semantic::{ScopeFlags, ScopeId},
  span::GetSpan,
};

use crate::EcmaCompiler;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefineCall {
  pub name: Option<String>,
  /// The literal dependency array, or for a sugared factory
  /// (`define(function (require) { ... })`) its `require("x")` calls.
  pub deps: Vec<String>,
  /// Byte offset of the first argument, where a missing name gets injected.
  pub args_start: u32,
}

#[derive(Debug, Default)]
pub struct AmdScanResult {
  pub defines: Vec<DefineCall>,
  /// Dependencies of `require([...])` calls outside of any function.
  pub top_level_requires: Vec<String>,
  /// Dependencies of `require([...])` calls inside functions, loaded lazily.
  pub nested_requires: Vec<String>,
}

impl AmdScanResult {
  pub fn anonymous_defines(&self) -> impl Iterator<Item = &DefineCall> {
    self.defines.iter().filter(|define| define.name.is_none())
  }

  pub fn named_define(&self, name: &str) -> Option<&DefineCall> {
    self.defines.iter().find(|define| define.name.as_deref() == Some(name))
  }
}

pub fn scan_amd(source: &str, path: &Path) -> Result<AmdScanResult, BuildDiagnostic> {
  let allocator = Allocator::default();
  let program = EcmaCompiler::parse(&allocator, source, path)?;
  let mut scanner = AmdScanner::default();
  scanner.visit_program(&program);
  Ok(scanner.result)
}

#[derive(Default)]
struct AmdScanner {
  result: AmdScanResult,
  scope_stack: Vec<bool>,
  function_depth: usize,
}

impl AmdScanner {
  fn scan_define(&mut self, call: &ast::CallExpression) {
    let Some(first) = call.arguments.first() else {
      return;
    };

    let mut idx = 0;
    let name = match first {
      Argument::StringLiteral(lit) => {
        idx += 1;
        Some(lit.value.to_string())
      }
      _ => None,
    };

    let deps = match call.arguments.get(idx) {
      Some(Argument::ArrayExpression(array)) => {
        idx += 1;
        Some(string_elements(array))
      }
      _ => None,
    };

    let deps = deps.unwrap_or_else(|| match call.arguments.get(idx) {
      Some(factory) if takes_parameters(factory) => {
        let mut collector = SugarRequires::default();
        collector.visit_argument(factory);
        collector.deps
      }
      _ => Vec::new(),
    });

    self.result.defines.push(DefineCall { name, deps, args_start: first.span().start });
  }

  fn scan_require(&mut self, call: &ast::CallExpression) {
    let Some(Argument::ArrayExpression(array)) = call.arguments.first() else {
      return;
    };
    let deps = string_elements(array);
    if self.function_depth == 0 {
      self.result.top_level_requires.extend(deps);
    } else {
      self.result.nested_requires.extend(deps);
    }
  }
}

impl<'a> Visit<'a> for AmdScanner {
  fn enter_scope(&mut self, flags: ScopeFlags, _scope_id: &Cell<Option<ScopeId>>) {
    let is_function = flags.contains(ScopeFlags::Function);
    if is_function {
      self.function_depth += 1;
    }
    self.scope_stack.push(is_function);
  }

  fn leave_scope(&mut self) {
    if self.scope_stack.pop() == Some(true) {
      self.function_depth -= 1;
    }
  }

  fn visit_call_expression(&mut self, call: &ast::CallExpression<'a>) {
    if call.callee.is_specific_id("define") {
      self.scan_define(call);
    } else if call.callee.is_specific_id("require") {
      self.scan_require(call);
    }
    walk::walk_call_expression(self, call);
  }
}

/// Collects `require("x")` calls of a sugared define factory.
#[derive(Default)]
struct SugarRequires {
  deps: Vec<String>,
}

impl<'a> Visit<'a> for SugarRequires {
  fn visit_call_expression(&mut self, call: &ast::CallExpression<'a>) {
    if call.callee.is_specific_id("require") && call.arguments.len() == 1 {
      if let Some(Argument::StringLiteral(lit)) = call.arguments.first() {
        let dep = lit.value.as_str();
        if !self.deps.iter().any(|known| known == dep) {
          self.deps.push(dep.to_string());
        }
      }
    }
    walk::walk_call_expression(self, call);
  }
}

fn string_elements(array: &ast::ArrayExpression) -> Vec<String> {
  array
    .elements
    .iter()
    .filter_map(|element| match element {
      ArrayExpressionElement::StringLiteral(lit) => Some(lit.value.to_string()),
      _ => None,
    })
    .collect()
}

fn takes_parameters(factory: &Argument) -> bool {
  match factory {
    Argument::FunctionExpression(func) => !func.params.items.is_empty(),
    Argument::ArrowFunctionExpression(arrow) => !arrow.params.items.is_empty(),
    _ => false,
  }
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;

  use super::*;

  fn scan(source: &str) -> AmdScanResult {
    scan_amd(source, Path::new("test.js")).unwrap()
  }

  #[test]
  fn named_and_anonymous_defines() {
    let result = scan(
      "define('karl-ui', ['jquery', 'underscore'], function ($, _) {});\ndefine([\"tinymce\"], function () {});",
    );

    assert_eq!(result.defines.len(), 2);
    assert_eq!(result.named_define("karl-ui").unwrap().deps, vec!["jquery", "underscore"]);
    let anonymous = result.anonymous_defines().collect::<Vec<_>>();
    assert_eq!(anonymous.len(), 1);
    assert_eq!(anonymous[0].deps, vec!["tinymce"]);
    assert_eq!(anonymous[0].args_start, 72);
  }

  #[test]
  fn sugared_factories_depend_on_their_requires() {
    let result = scan(
      "define(function (require) {\n  var $ = require('jquery');\n  var again = require('jquery');\n  require(['mockup-lazy'], function () {});\n  return require('./utils');\n});",
    );

    assert_eq!(result.defines[0].deps, vec!["jquery", "./utils"]);
    assert!(result.top_level_requires.is_empty());
    assert_eq!(result.nested_requires, vec!["mockup-lazy"]);
  }

  #[test]
  fn umd_wrappers_are_seen_through() {
    let result = scan(
      "(function (factory) {\n  if (typeof define === 'function' && define.amd) {\n    define(['jquery'], factory);\n  } else {\n    factory(jQuery);\n  }\n}(function ($) { return $; }));",
    );

    assert_eq!(result.defines, vec![DefineCall {
      name: None,
      deps: vec!["jquery".to_string()],
      args_start: 85,
    }]);
  }

  #[test]
  fn top_level_requires_are_eager() {
    let result = scan(
      "require(['karl-ui', 'mockup-patterns-tinymce'], function () {\n  require(['later']);\n});\nvar plain = 1;",
    );
    assert_eq!(result.top_level_requires, vec!["karl-ui", "mockup-patterns-tinymce"]);
    assert_eq!(result.nested_requires, vec!["later"]);
    assert!(result.defines.is_empty());
  }

  #[test]
  fn zero_parameter_factories_have_no_deps() {
    let result = scan("define(function () { return require('x'); });");
    assert!(result.defines[0].deps.is_empty());
  }
}
