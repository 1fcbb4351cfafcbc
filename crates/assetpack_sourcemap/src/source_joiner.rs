use crate::lines_count::lines_count;

/// Joins sources with a newline between each, remembering on which line of
/// the joined text every source starts.
#[derive(Default)]
pub struct SourceJoiner {
  entries: Vec<(String, String, String)>,
}

impl SourceJoiner {
  /// `code` is what gets joined, `original` is what a source map should embed
  /// as the source's content. They must share line and column positions.
  pub fn append_source(
    &mut self,
    name: impl Into<String>,
    code: impl Into<String>,
    original: impl Into<String>,
  ) {
    self.entries.push((name.into(), code.into(), original.into()));
  }

  pub fn join(self) -> JoinedSource {
    let size_hint = self.entries.iter().map(|(_, code, _)| code.len() + 1).sum::<usize>();
    let mut code = String::with_capacity(size_hint);
    let mut entries = Vec::with_capacity(self.entries.len());
    let mut next_line = 0;

    let count = self.entries.len();
    for (idx, (name, source, original)) in self.entries.into_iter().enumerate() {
      let line_count = lines_count(&source) + 1;
      code.push_str(&source);
      if idx + 1 < count {
        code.push('\n');
      }
      entries.push(JoinedEntry { name, content: original, start_line: next_line, line_count });
      next_line += line_count;
    }

    JoinedSource { code, entries }
  }
}

#[derive(Debug)]
pub struct JoinedEntry {
  pub name: String,
  pub content: String,
  /// Zero based line of the joined text where this source begins.
  pub start_line: u32,
  pub line_count: u32,
}

#[derive(Debug)]
pub struct JoinedSource {
  pub code: String,
  pub entries: Vec<JoinedEntry>,
}

impl JoinedSource {
  /// Maps a zero based line of the joined text back to `(entry index, line in entry)`.
  pub fn locate(&self, line: u32) -> Option<(usize, u32)> {
    let idx = self.entries.partition_point(|entry| entry.start_line <= line).checked_sub(1)?;
    let entry = &self.entries[idx];
    let local = line - entry.start_line;
    (local < entry.line_count).then_some((idx, local))
  }
}
