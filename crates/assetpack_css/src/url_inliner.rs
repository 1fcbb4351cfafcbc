use std::path::Path;

use assetpack_fs::FileSystem;
use assetpack_utils::data_url::to_data_url;
use css_module_lexer::{Dependency, Mode, UrlRangeKind, collect_dependencies};

/// Replaces local `url()` references with base64 `data:` URIs. Paths are
/// relative to `file`, the stylesheet the references appear in.
pub struct UrlInliner<'a> {
  pub fs: &'a dyn FileSystem,
  pub max_size: Option<u64>,
}

impl UrlInliner<'_> {
  /// Returns the rewritten source and a warning for every reference that
  /// points to a missing file.
  pub fn inline(&self, source: &str, file: &Path) -> (String, Vec<String>) {
    let (dependencies, _) = collect_dependencies(source, Mode::Css);
    let base = file.parent().unwrap_or_else(|| Path::new(""));

    let mut warnings = Vec::new();
    let mut edits = Vec::new();
    for dependency in dependencies {
      let Dependency::Url { request, range, kind } = dependency else {
        continue;
      };
      if !is_inlinable(request) {
        continue;
      }

      let target = base.join(request);
      if !self.fs.exists(&target) {
        warnings.push(format!("{} references missing file {request}", file.display()));
        continue;
      }
      if let Some(max_size) = self.max_size {
        if !self.fs.file_size(&target).is_ok_and(|size| size <= max_size) {
          continue;
        }
      }
      let Ok(bytes) = self.fs.read(&target) else {
        warnings.push(format!("{} references unreadable file {request}", file.display()));
        continue;
      };

      let data_url = to_data_url(&target, &bytes);
      let replacement = match kind {
        UrlRangeKind::Function => format!("url({data_url})"),
        UrlRangeKind::String => format!("\"{data_url}\""),
      };
      edits.push((range.start as usize, range.end as usize, replacement));
    }

    let mut rewritten = String::with_capacity(source.len());
    let mut copied_from = 0;
    for (start, end, replacement) in edits {
      rewritten.push_str(&source[copied_from..start]);
      rewritten.push_str(&replacement);
      copied_from = end;
    }
    rewritten.push_str(&source[copied_from..]);
    (rewritten, warnings)
  }
}

/// Absolute, external, data and parameterized URLs are left alone, as are
/// ones still holding a LESS interpolation.
fn is_inlinable(request: &str) -> bool {
  !(request.is_empty()
    || request.starts_with('/')
    || request.starts_with("data:")
    || request.contains("://")
    || request.contains(['?', '#', '@']))
}
