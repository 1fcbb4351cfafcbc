use rustc_hash::FxHashMap;

use crate::{
  parser::{Node, split_arguments},
  printer::CssItem,
  scanner::{collapse_whitespace, is_ident_byte, is_url_start, skip_string, skip_url_body, split_top_level},
};

const MAX_VARIABLE_DEPTH: usize = 32;
const MAX_MIXIN_DEPTH: usize = 32;

/// Resolves variables and mixins and flattens nesting.
///
/// Variables are lazy: every definition of a block is visible in the whole
/// block and the last one wins.
pub fn evaluate(nodes: &[Node]) -> Result<Vec<CssItem>, String> {
  let mut evaluator = Evaluator::new(nodes);
  let mut declarations = Vec::new();
  let mut items = Vec::new();
  evaluator.eval_body(nodes, &[], &mut declarations, &mut items)?;

  if let Some((name, _)) = declarations.first() {
    return Err(format!("declaration `{name}` outside of a rule"));
  }

  // `@charset`, `@import` and friends must precede every rule.
  let mut output = evaluator.statements;
  output.extend(items);
  Ok(output)
}

#[derive(Clone)]
struct MixinDefinition<'a> {
  /// `None` for positional pattern arguments, which bind nothing.
  params: Vec<Option<(String, Option<String>)>>,
  children: &'a [Node],
}

struct Evaluator<'a> {
  mixins: FxHashMap<String, Vec<MixinDefinition<'a>>>,
  scopes: Vec<FxHashMap<String, String>>,
  statements: Vec<CssItem>,
  mixin_depth: usize,
}

impl<'a> Evaluator<'a> {
  fn new(nodes: &'a [Node]) -> Self {
    let mut mixins: FxHashMap<String, Vec<MixinDefinition<'a>>> = FxHashMap::default();
    for node in nodes {
      let Node::Rule { selector, children } = node else {
        continue;
      };
      let Some((name, params)) = mixin_head(selector) else {
        continue;
      };
      let params = params.map(|inner| split_arguments(inner).iter().map(|param| parse_param(param)).collect());
      mixins
        .entry(name.to_string())
        .or_default()
        .push(MixinDefinition { params: params.unwrap_or_default(), children });
    }
    Self { mixins, scopes: Vec::new(), statements: Vec::new(), mixin_depth: 0 }
  }

  fn eval_body(
    &mut self,
    nodes: &'a [Node],
    selectors: &[String],
    declarations: &mut Vec<(String, String)>,
    items: &mut Vec<CssItem>,
  ) -> Result<(), String> {
    let variables = nodes
      .iter()
      .filter_map(|node| match node {
        Node::Variable { name, value } => Some((name.clone(), value.clone())),
        _ => None,
      })
      .collect();
    self.scopes.push(variables);
    let result = self.eval_nodes(nodes, selectors, declarations, items);
    self.scopes.pop();
    result
  }

  fn eval_nodes(
    &mut self,
    nodes: &'a [Node],
    selectors: &[String],
    declarations: &mut Vec<(String, String)>,
    items: &mut Vec<CssItem>,
  ) -> Result<(), String> {
    for node in nodes {
      match node {
        Node::Variable { .. } => {}
        Node::Declaration { name, value } => {
          declarations.push((self.interpolate(name, 0)?, self.eval_value(value, 0)?));
        }
        Node::MixinCall { name, args, important } => {
          self.expand_mixin(name, args, *important, selectors, declarations, items)?;
        }
        Node::Rule { selector, children } => {
          if mixin_head(selector).is_some_and(|(_, params)| params.is_some()) {
            continue;
          }
          let selector = self.interpolate(selector, 0)?;
          let child_selectors = combine_selectors(selectors, &selector);
          let mut child_declarations = Vec::new();
          let mut child_items = Vec::new();
          self.eval_body(children, &child_selectors, &mut child_declarations, &mut child_items)?;
          if !child_declarations.is_empty() {
            items.push(CssItem::Rule { selectors: child_selectors, declarations: child_declarations });
          }
          items.extend(child_items);
        }
        Node::AtRule { name, prelude, children: None } => {
          let prelude = self.eval_value(prelude, 0)?;
          self.statements.push(CssItem::Statement(at_rule_text(name, &prelude)));
        }
        Node::AtRule { name, prelude, children: Some(children) } => {
          let prelude = at_rule_text(name, &self.eval_value(prelude, 0)?);
          let mut inner_declarations = Vec::new();
          let mut inner_items = Vec::new();

          if is_conditional(name) {
            // Bubbles up: the block wraps the current selectors.
            self.eval_body(children, selectors, &mut inner_declarations, &mut inner_items)?;
            let mut block_items = Vec::new();
            if !inner_declarations.is_empty() {
              if selectors.is_empty() {
                return Err(format!("declarations directly inside `{prelude}`"));
              }
              block_items
                .push(CssItem::Rule { selectors: selectors.to_vec(), declarations: inner_declarations });
            }
            block_items.extend(inner_items);
            items.push(CssItem::Block { prelude, items: block_items });
          } else if name.ends_with("keyframes") {
            self.eval_body(children, &[], &mut inner_declarations, &mut inner_items)?;
            if !inner_declarations.is_empty() {
              return Err(format!("declarations directly inside `{prelude}`"));
            }
            items.push(CssItem::Block { prelude, items: inner_items });
          } else {
            self.eval_body(children, &[], &mut inner_declarations, &mut inner_items)?;
            items.push(CssItem::DeclarationBlock { prelude, declarations: inner_declarations });
            items.extend(inner_items);
          }
        }
      }
    }
    Ok(())
  }

  fn expand_mixin(
    &mut self,
    name: &str,
    args: &[String],
    important: bool,
    selectors: &[String],
    declarations: &mut Vec<(String, String)>,
    items: &mut Vec<CssItem>,
  ) -> Result<(), String> {
    let definitions =
      self.mixins.get(name).cloned().ok_or_else(|| format!("undefined mixin `{name}`"))?;
    if self.mixin_depth >= MAX_MIXIN_DEPTH {
      return Err(format!("mixin `{name}` expands recursively"));
    }
    let args = args.iter().map(|arg| self.eval_value(arg, 0)).collect::<Result<Vec<_>, _>>()?;

    for definition in definitions {
      let mut frame = FxHashMap::default();
      for (idx, param) in definition.params.iter().enumerate() {
        let Some((param, default)) = param else {
          continue;
        };
        let value = match (args.get(idx), default) {
          (Some(arg), _) => arg.clone(),
          (None, Some(default)) => self.eval_value(default, 0)?,
          (None, None) => return Err(format!("mixin `{name}` is missing a value for @{param}")),
        };
        frame.insert(param.clone(), value);
      }
      frame.insert("arguments".to_string(), args.join(" "));

      let start = declarations.len();
      self.scopes.push(frame);
      self.mixin_depth += 1;
      let result = self.eval_body(definition.children, selectors, declarations, items);
      self.mixin_depth -= 1;
      self.scopes.pop();
      result?;

      if important {
        for (_, value) in &mut declarations[start..] {
          if !value.ends_with("!important") {
            value.push_str(" !important");
          }
        }
      }
    }
    Ok(())
  }

  fn variable(&self, name: &str, depth: usize) -> Result<String, String> {
    let raw = self
      .scopes
      .iter()
      .rev()
      .find_map(|scope| scope.get(name))
      .ok_or_else(|| format!("undefined variable @{name}"))?;
    self.eval_value(raw, depth + 1)
  }

  /// Substitutes `@name`, `@@name` and `@{name}` references and unwraps
  /// `~"escaped"` strings.
  fn eval_value(&self, raw: &str, depth: usize) -> Result<String, String> {
    if depth > MAX_VARIABLE_DEPTH {
      return Err(format!("variable references nest too deeply in `{raw}`"));
    }

    let bytes = raw.as_bytes();
    let mut out = String::with_capacity(raw.len());
    let mut copied_from = 0;
    let mut idx = 0;

    while idx < bytes.len() {
      let (replacement, end) = match bytes[idx] {
        b'~' if matches!(bytes.get(idx + 1), Some(b'"' | b'\'')) => {
          let end = skip_string(bytes, idx + 1);
          (self.interpolate(string_contents(raw, idx + 1, end), depth)?, end)
        }
        b'"' | b'\'' => {
          let end = skip_string(bytes, idx);
          (self.interpolate(&raw[idx..end], depth)?, end)
        }
        b'u' | b'U' if is_url_start(raw, idx) => {
          let end = skip_url_body(bytes, idx + 4);
          (self.interpolate(&raw[idx..end], depth)?, end)
        }
        b'@' => self.reference(raw, idx, depth)?,
        _ => {
          idx += 1;
          continue;
        }
      };
      out.push_str(&raw[copied_from..idx]);
      out.push_str(&replacement);
      idx = end;
      copied_from = end;
    }

    out.push_str(&raw[copied_from..]);
    Ok(out)
  }

  /// Resolves the reference starting at the `@` at `at`.
  fn reference(&self, raw: &str, at: usize, depth: usize) -> Result<(String, usize), String> {
    let bytes = raw.as_bytes();
    match bytes.get(at + 1) {
      Some(b'{') => {
        let close = raw[at..].find('}').map_or(raw.len(), |pos| at + pos);
        let value = self.variable(&raw[at + 2..close], depth)?;
        Ok((unquote(&value).to_string(), (close + 1).min(raw.len())))
      }
      Some(b'@') => {
        let end = ident_end(bytes, at + 2);
        let indirect = self.variable(&raw[at + 2..end], depth)?;
        Ok((self.variable(unquote(&indirect), depth)?, end))
      }
      _ => {
        let end = ident_end(bytes, at + 1);
        if end == at + 1 {
          return Ok(("@".to_string(), end));
        }
        Ok((self.variable(&raw[at + 1..end], depth)?, end))
      }
    }
  }

  /// Only resolves `@{name}`, for selectors, property names and strings.
  fn interpolate(&self, text: &str, depth: usize) -> Result<String, String> {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("@{") {
      let Some(close) = rest[start..].find('}') else {
        break;
      };
      out.push_str(&rest[..start]);
      let value = self.variable(&rest[start + 2..start + close], depth)?;
      out.push_str(unquote(&value));
      rest = &rest[start + close + 1..];
    }
    out.push_str(rest);
    Ok(out)
  }
}

/// `.name` or `.name(params)`, the latter with the raw parameter list.
fn mixin_head(selector: &str) -> Option<(&str, Option<&str>)> {
  if !(selector.starts_with('.') || selector.starts_with('#')) {
    return None;
  }
  let (name, params) = match selector.find('(') {
    Some(open) => {
      let inner = &selector[open + 1..];
      let inner = inner.trim_end().strip_suffix(')').unwrap_or(inner);
      (selector[..open].trim_end(), Some(inner))
    }
    None => (selector, None),
  };
  (name.len() > 1 && name.bytes().skip(1).all(is_ident_byte)).then_some((name, params))
}

fn parse_param(param: &str) -> Option<(String, Option<String>)> {
  let param = param.strip_prefix('@')?;
  match param.split_once(':') {
    Some((name, default)) => Some((name.trim().to_string(), Some(default.trim().to_string()))),
    None => Some((param.trim().to_string(), None)),
  }
}

fn combine_selectors(parents: &[String], selector: &str) -> Vec<String> {
  let children = split_top_level(selector, b',')
    .into_iter()
    .map(collapse_whitespace)
    .filter(|child| !child.is_empty())
    .collect::<Vec<_>>();

  if parents.is_empty() {
    return children.into_iter().map(|child| child.replace('&', "").trim().to_string()).collect();
  }

  parents
    .iter()
    .flat_map(|parent| {
      children.iter().map(move |child| {
        if child.contains('&') { child.replace('&', parent) } else { format!("{parent} {child}") }
      })
    })
    .collect()
}

fn is_conditional(name: &str) -> bool {
  matches!(name, "media" | "supports" | "document" | "-moz-document" | "container" | "layer")
}

fn at_rule_text(name: &str, prelude: &str) -> String {
  if prelude.is_empty() { format!("@{name}") } else { format!("@{name} {prelude}") }
}

fn ident_end(bytes: &[u8], from: usize) -> usize {
  bytes[from.min(bytes.len())..].iter().position(|b| !is_ident_byte(*b)).map_or(bytes.len(), |pos| from + pos)
}

/// The text between the quotes of the string spanning `start..end`.
fn string_contents(raw: &str, start: usize, end: usize) -> &str {
  let quote = raw.as_bytes()[start];
  let closed = end > start + 1 && raw.as_bytes()[end - 1] == quote;
  &raw[start + 1..if closed { end - 1 } else { end }]
}

fn unquote(value: &str) -> &str {
  let bytes = value.as_bytes();
  if bytes.len() >= 2 && (bytes[0] == b'"' || bytes[0] == b'\'') && bytes[bytes.len() - 1] == bytes[0] {
    &value[1..value.len() - 1]
  } else {
    value
  }
}
