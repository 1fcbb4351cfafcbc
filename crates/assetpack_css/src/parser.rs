use crate::scanner::{
  collapse_whitespace, is_ident_byte, skip_block_comment, skip_string, split_top_level,
  strip_block_comments,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
  Declaration { name: String, value: String },
  /// `@name: value;`
  Variable { name: String, value: String },
  /// `.name;`, `.name();` or `.name(args);`
  MixinCall { name: String, args: Vec<String>, important: bool },
  Rule { selector: String, children: Vec<Node> },
  /// `children` is `None` for statements such as `@import` or `@charset`.
  AtRule { name: String, prelude: String, children: Option<Vec<Node>> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
  pub message: String,
  /// One based.
  pub line: usize,
}

impl std::fmt::Display for ParseError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{} at line {}", self.message, self.line)
  }
}

pub fn parse(source: &str) -> Result<Vec<Node>, ParseError> {
  let mut parser = Parser { source, bytes: source.as_bytes(), pos: 0 };
  parser.parse_block(false)
}

struct Parser<'a> {
  source: &'a str,
  bytes: &'a [u8],
  pos: usize,
}

enum Terminator {
  OpenBrace,
  Semicolon,
  /// `}` or the end of input, left unconsumed.
  BlockEnd,
}

impl Parser<'_> {
  fn parse_block(&mut self, nested: bool) -> Result<Vec<Node>, ParseError> {
    let mut nodes = Vec::new();
    loop {
      self.skip_trivia();
      match self.bytes.get(self.pos) {
        None if nested => return Err(self.error("missing closing `}`")),
        None => return Ok(nodes),
        Some(b'}') if nested => {
          self.pos += 1;
          return Ok(nodes);
        }
        Some(b'}') => return Err(self.error("unexpected `}`")),
        Some(b';') => {
          self.pos += 1;
          continue;
        }
        Some(_) => {}
      }

      let start = self.pos;
      let (text, terminator) = self.read_prelude();
      let text = collapse_whitespace(&strip_block_comments(text));
      match terminator {
        Terminator::OpenBrace => {
          self.pos += 1;
          let children = self.parse_block(true)?;
          nodes.push(block_node(text, children));
        }
        Terminator::Semicolon | Terminator::BlockEnd => {
          if matches!(terminator, Terminator::Semicolon) {
            self.pos += 1;
          }
          let node = statement_node(&text).ok_or_else(|| ParseError {
            message: format!("expected a declaration, found `{text}`"),
            line: self.line_of(start),
          })?;
          nodes.push(node);
        }
      }
    }
  }

  /// Reads up to the next top-level `{`, `;` or `}` without consuming it.
  fn read_prelude(&mut self) -> (&str, Terminator) {
    let start = self.pos;
    let mut depth = 0usize;
    let mut idx = self.pos;

    while idx < self.bytes.len() {
      match self.bytes[idx] {
        b'"' | b'\'' => {
          idx = skip_string(self.bytes, idx);
          continue;
        }
        b'/' if self.bytes.get(idx + 1) == Some(&b'*') => {
          idx = skip_block_comment(self.bytes, idx);
          continue;
        }
        // `@{name}` interpolation, its braces are not a block.
        b'@' if self.bytes.get(idx + 1) == Some(&b'{') => {
          idx = self.bytes[idx..].iter().position(|b| *b == b'}').map_or(self.bytes.len(), |end| idx + end + 1);
          continue;
        }
        b'(' => depth += 1,
        b')' => depth = depth.saturating_sub(1),
        b'{' if depth == 0 => {
          self.pos = idx;
          return (&self.source[start..idx], Terminator::OpenBrace);
        }
        b';' if depth == 0 => {
          self.pos = idx;
          return (&self.source[start..idx], Terminator::Semicolon);
        }
        b'}' if depth == 0 => {
          self.pos = idx;
          return (&self.source[start..idx], Terminator::BlockEnd);
        }
        _ => {}
      }
      idx += 1;
    }

    self.pos = self.bytes.len();
    (&self.source[start..], Terminator::BlockEnd)
  }

  fn skip_trivia(&mut self) {
    while let Some(&byte) = self.bytes.get(self.pos) {
      if byte.is_ascii_whitespace() {
        self.pos += 1;
      } else if byte == b'/' && self.bytes.get(self.pos + 1) == Some(&b'*') {
        self.pos = skip_block_comment(self.bytes, self.pos);
      } else {
        break;
      }
    }
  }

  fn line_of(&self, pos: usize) -> usize {
    self.bytes[..pos.min(self.bytes.len())].iter().filter(|b| **b == b'\n').count() + 1
  }

  fn error(&self, message: &str) -> ParseError {
    ParseError { message: message.to_string(), line: self.line_of(self.pos) }
  }
}

fn split_at_rule(text: &str) -> (String, String) {
  let body = &text[1..];
  let end = body.bytes().position(|b| !is_ident_byte(b)).unwrap_or(body.len());
  (body[..end].to_ascii_lowercase(), body[end..].trim().to_string())
}

fn block_node(text: String, children: Vec<Node>) -> Node {
  if text.starts_with('@') {
    let (name, prelude) = split_at_rule(&text);
    Node::AtRule { name, prelude, children: Some(children) }
  } else {
    Node::Rule { selector: text, children }
  }
}

fn statement_node(text: &str) -> Option<Node> {
  if let Some(rest) = text.strip_prefix('@') {
    let name_len = rest.bytes().position(|b| !is_ident_byte(b)).unwrap_or(rest.len());
    let after = rest[name_len..].trim_start();
    if name_len > 0 {
      if let Some(value) = after.strip_prefix(':') {
        return Some(Node::Variable {
          name: rest[..name_len].to_string(),
          value: value.trim().to_string(),
        });
      }
    }
    let (name, prelude) = split_at_rule(text);
    return Some(Node::AtRule { name, prelude, children: None });
  }

  if text.starts_with('.') || text.starts_with('#') {
    return Some(mixin_call(text));
  }

  let (name, value) = text.split_once(':')?;
  let name = name.trim();
  (!name.is_empty()).then(|| Node::Declaration { name: name.to_string(), value: value.trim().to_string() })
}

fn mixin_call(text: &str) -> Node {
  let (text, important) = match text.strip_suffix("!important") {
    Some(rest) => (rest.trim_end(), true),
    None => (text, false),
  };
  let Some(open) = text.find('(') else {
    return Node::MixinCall { name: text.trim().to_string(), args: Vec::new(), important };
  };
  let inner = text[open + 1..].trim_end().strip_suffix(')').unwrap_or(&text[open + 1..]);
  Node::MixinCall { name: text[..open].trim().to_string(), args: split_arguments(inner), important }
}

/// Mixin arguments are separated by `;` when one is present, by `,` otherwise.
pub fn split_arguments(inner: &str) -> Vec<String> {
  if inner.trim().is_empty() {
    return Vec::new();
  }
  let separator = if split_top_level(inner, b';').len() > 1 { b';' } else { b',' };
  split_top_level(inner, separator)
    .into_iter()
    .map(str::trim)
    .filter(|arg| !arg.is_empty())
    .map(str::to_string)
    .collect()
}
