//! Byte level helpers shared by the comment stripper and the parser. Only
//! ASCII bytes are ever inspected, so every returned index is a char boundary.

/// Index just past the string starting at `start` (which holds the quote).
/// Unterminated strings end at the line break.
pub fn skip_string(bytes: &[u8], start: usize) -> usize {
  let quote = bytes[start];
  let mut idx = start + 1;
  while idx < bytes.len() {
    match bytes[idx] {
      b'\\' => idx += 2,
      b'\n' => return idx,
      byte if byte == quote => return idx + 1,
      _ => idx += 1,
    }
  }
  bytes.len()
}

/// Index just past the `*/` closing the comment that starts at `start`.
pub fn skip_block_comment(bytes: &[u8], start: usize) -> usize {
  let mut idx = start + 2;
  while idx + 1 < bytes.len() {
    if bytes[idx] == b'*' && bytes[idx + 1] == b'/' {
      return idx + 2;
    }
    idx += 1;
  }
  bytes.len()
}

/// `idx` points right after `url(`. Returns the index past the closing paren.
pub fn skip_url_body(bytes: &[u8], mut idx: usize) -> usize {
  while idx < bytes.len() {
    match bytes[idx] {
      b'"' | b'\'' => idx = skip_string(bytes, idx),
      b')' => return idx + 1,
      _ => idx += 1,
    }
  }
  bytes.len()
}

pub fn is_url_start(source: &str, idx: usize) -> bool {
  let bytes = source.as_bytes();
  source.get(idx..idx + 4).is_some_and(|head| head.eq_ignore_ascii_case("url("))
    && (idx == 0 || !is_ident_byte(bytes[idx - 1]))
}

pub fn is_ident_byte(byte: u8) -> bool {
  byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_'
}

/// Removes `//` comments. Strings, block comments and unquoted `url(...)`
/// bodies (which may contain `//`) are left alone.
pub fn strip_line_comments(source: &str) -> String {
  let bytes = source.as_bytes();
  let mut stripped = String::with_capacity(source.len());
  let mut copied_from = 0;
  let mut idx = 0;

  while idx < bytes.len() {
    match bytes[idx] {
      b'"' | b'\'' => idx = skip_string(bytes, idx),
      b'/' if bytes.get(idx + 1) == Some(&b'*') => idx = skip_block_comment(bytes, idx),
      b'/' if bytes.get(idx + 1) == Some(&b'/') => {
        stripped.push_str(&source[copied_from..idx]);
        idx = memchr_newline(bytes, idx);
        copied_from = idx;
      }
      b'u' | b'U' if is_url_start(source, idx) => idx = skip_url_body(bytes, idx + 4),
      _ => idx += 1,
    }
  }

  stripped.push_str(&source[copied_from..]);
  stripped
}

/// Removes `/* */` comments from a single selector or value.
pub fn strip_block_comments(text: &str) -> String {
  let bytes = text.as_bytes();
  let mut stripped = String::with_capacity(text.len());
  let mut copied_from = 0;
  let mut idx = 0;

  while idx < bytes.len() {
    match bytes[idx] {
      b'"' | b'\'' => idx = skip_string(bytes, idx),
      b'/' if bytes.get(idx + 1) == Some(&b'*') => {
        stripped.push_str(&text[copied_from..idx]);
        idx = skip_block_comment(bytes, idx);
        copied_from = idx;
      }
      _ => idx += 1,
    }
  }

  stripped.push_str(&text[copied_from..]);
  stripped
}

/// Splits on `separator` outside of strings, parens and brackets.
pub fn split_top_level(text: &str, separator: u8) -> Vec<&str> {
  let bytes = text.as_bytes();
  let mut parts = Vec::new();
  let mut depth = 0usize;
  let mut start = 0;
  let mut idx = 0;

  while idx < bytes.len() {
    match bytes[idx] {
      b'"' | b'\'' => {
        idx = skip_string(bytes, idx);
        continue;
      }
      b'(' | b'[' => depth += 1,
      b')' | b']' => depth = depth.saturating_sub(1),
      byte if byte == separator && depth == 0 => {
        parts.push(&text[start..idx]);
        start = idx + 1;
      }
      _ => {}
    }
    idx += 1;
  }

  parts.push(&text[start..]);
  parts
}

/// Collapses whitespace runs outside of strings into a single space.
pub fn collapse_whitespace(text: &str) -> String {
  let mut collapsed = String::with_capacity(text.len());
  let mut pending_space = false;
  let mut quote = None;
  let mut escaped = false;

  for ch in text.trim().chars() {
    if let Some(open) = quote {
      collapsed.push(ch);
      if escaped {
        escaped = false;
      } else if ch == '\\' {
        escaped = true;
      } else if ch == open {
        quote = None;
      }
      continue;
    }
    if ch.is_whitespace() {
      pending_space = true;
      continue;
    }
    if pending_space {
      collapsed.push(' ');
      pending_space = false;
    }
    if ch == '"' || ch == '\'' {
      quote = Some(ch);
    }
    collapsed.push(ch);
  }
  collapsed
}

fn memchr_newline(bytes: &[u8], from: usize) -> usize {
  bytes[from..].iter().position(|byte| *byte == b'\n').map_or(bytes.len(), |pos| from + pos)
}
