use std::path::{Path, PathBuf};

use assetpack_error::BuildDiagnostic;
use assetpack_fs::FileSystem;
use assetpack_utils::indexmap::FxIndexSet;
use sugar_path::SugarPath;

use crate::{
  parser::{Node, parse},
  scanner::strip_line_comments,
  url_inliner::UrlInliner,
};

#[derive(Debug)]
pub struct LoadedStylesheet {
  /// The entry's syntax tree with every LESS import spliced in.
  pub nodes: Vec<Node>,
  /// Every imported file, in first-import order. The entry is not included.
  pub dependencies: Vec<PathBuf>,
  pub warnings: Vec<String>,
}

pub struct StylesheetLoader<'a> {
  fs: &'a dyn FileSystem,
  inliner: Option<UrlInliner<'a>>,
  seen: FxIndexSet<PathBuf>,
  warnings: Vec<String>,
}

impl<'a> StylesheetLoader<'a> {
  pub fn new(fs: &'a dyn FileSystem, inliner: Option<UrlInliner<'a>>) -> Self {
    Self { fs, inliner, seen: FxIndexSet::default(), warnings: Vec::new() }
  }

  pub fn load(mut self, entry: &Path) -> Result<LoadedStylesheet, BuildDiagnostic> {
    self.seen.insert(entry.to_path_buf());
    let nodes = self.load_file(entry)?;
    Ok(LoadedStylesheet {
      nodes,
      dependencies: self.seen.into_iter().skip(1).collect(),
      warnings: self.warnings,
    })
  }

  fn load_file(&mut self, path: &Path) -> Result<Vec<Node>, BuildDiagnostic> {
    let source = self.fs.read_to_string(path).map_err(|err| BuildDiagnostic::io("read", path, err))?;
    let mut source = strip_line_comments(&source);
    if let Some(inliner) = &self.inliner {
      let (inlined, warnings) = inliner.inline(&source, path);
      source = inlined;
      self.warnings.extend(warnings);
    }
    let nodes = parse(&source).map_err(|err| BuildDiagnostic::compile(path, err.to_string()))?;
    self.expand_imports(nodes, path)
  }

  /// LESS imports are imported once: a file seen before is dropped.
  fn expand_imports(&mut self, nodes: Vec<Node>, path: &Path) -> Result<Vec<Node>, BuildDiagnostic> {
    let mut expanded = Vec::with_capacity(nodes.len());
    for node in nodes {
      match node {
        Node::AtRule { ref name, ref prelude, children: None } if name == "import" => {
          let Some(target) = less_import_target(prelude) else {
            expanded.push(node);
            continue;
          };
          let resolved = resolve_import(path, target);
          if self.seen.insert(resolved.clone()) {
            expanded.extend(self.load_file(&resolved)?);
          }
        }
        Node::Rule { selector, children } => {
          let children = self.expand_imports(children, path)?;
          expanded.push(Node::Rule { selector, children });
        }
        Node::AtRule { name, prelude, children: Some(children) } => {
          let children = self.expand_imports(children, path)?;
          expanded.push(Node::AtRule { name, prelude, children: Some(children) });
        }
        other => expanded.push(other),
      }
    }
    Ok(expanded)
  }
}

/// The target of an `@import` that LESS inlines, `None` for plain CSS imports
/// which stay in the output.
fn less_import_target(prelude: &str) -> Option<&str> {
  let mut rest = prelude.trim();
  let mut force_less = false;
  if rest.starts_with('(') {
    let close = rest.find(')')?;
    let options = &rest[1..close];
    if options.split(',').any(|option| option.trim() == "css") {
      return None;
    }
    force_less = options.split(',').any(|option| option.trim() == "less");
    rest = rest[close + 1..].trim_start();
  }

  let (target, media) = if let Some(inner) = rest.strip_prefix("url(") {
    let close = inner.find(')')?;
    (inner[..close].trim().trim_matches(['"', '\'']), inner[close + 1..].trim())
  } else {
    let quote = rest.chars().next().filter(|ch| *ch == '"' || *ch == '\'')?;
    let close = rest[1..].find(quote)? + 1;
    (&rest[1..close], rest[close + 1..].trim())
  };

  let external = target.contains("://") || target.starts_with("//");
  let is_css = Path::new(target).extension().is_some_and(|ext| ext == "css");
  if external || (!force_less && (is_css || !media.is_empty())) {
    return None;
  }
  Some(target)
}

fn resolve_import(importer: &Path, target: &str) -> PathBuf {
  let base = importer.parent().unwrap_or_else(|| Path::new(""));
  let mut resolved = base.join(target);
  if resolved.extension().is_none() {
    resolved.set_extension("less");
  }
  resolved.normalize()
}
