mod coalescer;
mod notifier;

use std::{
  future::Future,
  panic::{AssertUnwindSafe, catch_unwind},
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use assetpack_common::StyleSheet;
use assetpack_css::CssCompileOptions;
use assetpack_error::{BuildDiagnostic, BuildError, BuildResult};
use assetpack_fs::{FileSystem, OsFileSystem};
use assetpack_utils::{
  indexmap::FxIndexSet,
  path_ext::PathExt,
  rayon::{IntoParallelRefIterator, ParallelIterator},
};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use rustc_hash::{FxHashMap, FxHashSet};
use tokio::{
  sync::mpsc,
  task::JoinSet,
  time::{Instant, sleep_until},
};
use tracing::{debug, error, info, warn};

pub use self::{
  coalescer::RebuildCoalescer,
  notifier::{BroadcastNotifier, ReloadNotifier, reload_message},
};
use crate::{
  pipeline::Pipeline,
  stages::css::{StylesheetOutput, compile_stylesheet, css_compile_options},
};

/// Which stylesheets a changed file affects.
#[derive(Debug)]
struct WatchGraph {
  sheets: Vec<StyleSheet>,
  static_root: PathBuf,
  /// Every file a stylesheet was compiled from, mapped to those stylesheets.
  dependents: FxHashMap<PathBuf, FxIndexSet<usize>>,
  /// Relative to `static_root`, they affect every stylesheet.
  globs: Vec<String>,
}

impl WatchGraph {
  fn new(sheets: Vec<StyleSheet>, static_root: PathBuf, globs: Vec<String>) -> Self {
    let mut graph = Self { sheets, static_root, dependents: FxHashMap::default(), globs };
    for idx in 0..graph.sheets.len() {
      let source = graph.sheets[idx].source.clone();
      graph.update(idx, &[source]);
    }
    graph
  }

  /// Replaces what is known about the inputs of one stylesheet.
  fn update(&mut self, sheet: usize, dependencies: &[PathBuf]) {
    for dependents in self.dependents.values_mut() {
      dependents.shift_remove(&sheet);
    }
    self.dependents.retain(|_, dependents| !dependents.is_empty());
    for dependency in dependencies {
      self.dependents.entry(dependency.clone()).or_default().insert(sheet);
    }
  }

  fn affected(&self, path: &Path) -> Vec<usize> {
    if self.sheets.iter().any(|sheet| sheet.output.as_path() == path) {
      return Vec::new();
    }
    let relative = path.display_relative_to(&self.static_root);
    if self.globs.iter().any(|glob| fast_glob::glob_match(glob, &relative)) {
      return (0..self.sheets.len()).collect();
    }
    self.dependents.get(path).map(|dependents| dependents.iter().copied().collect()).unwrap_or_default()
  }

  /// Directories of every known input, plus the fixed part of every glob,
  /// which is watched recursively.
  fn watch_roots(&self) -> Vec<(PathBuf, bool)> {
    let mut roots = FxIndexSet::default();
    for dependency in self.dependents.keys() {
      if let Some(parent) = dependency.parent() {
        roots.insert((parent.to_path_buf(), false));
      }
    }
    for glob in &self.globs {
      roots.insert((self.static_root.join(glob_base(glob)), true));
    }
    roots.into_iter().collect()
  }
}

/// The leading segments of `glob` without wildcards.
fn glob_base(glob: &str) -> &str {
  let wildcard = glob.find(['*', '?', '[', '{']).unwrap_or(glob.len());
  glob[..wildcard].rfind('/').map_or("", |slash| &glob[..=slash])
}

fn is_change(kind: &EventKind) -> bool {
  matches!(kind, EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_))
}

fn compile_guarded(
  options: &CssCompileOptions,
  sheet: &StyleSheet,
) -> BuildResult<StylesheetOutput> {
  catch_unwind(AssertUnwindSafe(|| compile_stylesheet(&OsFileSystem, options, sheet)))
    .unwrap_or_else(|_| Err(anyhow::anyhow!("Compiling \"{}\" panicked", sheet.name).into()))
}

fn log_errors(errors: &BuildError) {
  for err in errors.iter() {
    error!("{err:#}");
  }
}

fn watch_new_roots(
  watcher: &mut impl Watcher,
  graph: &WatchGraph,
  watched: &mut FxHashSet<(PathBuf, bool)>,
) {
  for (dir, recursive) in graph.watch_roots() {
    if watched.contains(&(dir.clone(), recursive)) {
      continue;
    }
    if !OsFileSystem.is_dir(&dir) {
      warn!("not watching {}, it is not a directory", dir.display());
      continue;
    }
    let mode = if recursive { RecursiveMode::Recursive } else { RecursiveMode::NonRecursive };
    match watcher.watch(&dir, mode) {
      Ok(()) => {
        debug!("watching {}", dir.display());
        watched.insert((dir, recursive));
      }
      Err(err) => warn!("cannot watch {}: {err}", dir.display()),
    }
  }
}

/// Single cooperative loop: filesystem events feed the coalescer, due
/// stylesheets compile on blocking threads, and every successful compile is
/// announced through `notifier`. Compile errors are logged, never fatal.
pub async fn watch_css(
  pipeline: &Pipeline,
  notifier: &dyn ReloadNotifier,
  shutdown: impl Future<Output = ()>,
) -> BuildResult<()> {
  let options = pipeline.options();
  let manifest = pipeline.manifest();
  let cwd = options.cwd.clone();
  let compile_options = Arc::new(css_compile_options(options));
  let sheets = manifest.style_sheets(&cwd);
  let mut graph =
    WatchGraph::new(sheets.clone(), manifest.static_root(&cwd), options.css.watch.clone());

  let initial_options = Arc::clone(&compile_options);
  let initial = tokio::task::spawn_blocking(move || {
    sheets.par_iter().map(|sheet| compile_guarded(&initial_options, sheet)).collect::<Vec<_>>()
  })
  .await
  .map_err(|err| anyhow::anyhow!("Initial stylesheet compile aborted: {err}"))?;
  for (idx, result) in initial.into_iter().enumerate() {
    match result {
      Ok(output) => graph.update(idx, &output.dependencies),
      Err(errors) => log_errors(&errors),
    }
  }

  let (tx, mut rx) = mpsc::unbounded_channel();
  let mut watcher = notify::recommended_watcher(move |event: notify::Result<Event>| {
    // The receiver only goes away once the loop below is done.
    let _ = tx.send(event);
  })
  .map_err(|err| BuildDiagnostic::io("watch", &cwd, std::io::Error::other(err)))?;
  let mut watched = FxHashSet::default();
  watch_new_roots(&mut watcher, &graph, &mut watched);
  info!("watching {} stylesheet(s) for changes", graph.sheets.len());

  let mut coalescer = RebuildCoalescer::new(Duration::from_millis(options.css.debounce_ms));
  let mut rebuilds = JoinSet::new();
  tokio::pin!(shutdown);

  loop {
    let deadline = coalescer.next_deadline();
    tokio::select! {
      () = &mut shutdown => break,
      Some(event) = rx.recv() => match event {
        Ok(event) if is_change(&event.kind) => {
          let now = Instant::now();
          for path in &event.paths {
            for idx in graph.affected(path) {
              coalescer.record(idx, now);
            }
          }
        }
        Ok(_) => {}
        Err(err) => warn!("watch error: {err}"),
      },
      () = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
        for idx in coalescer.take_due(Instant::now()) {
          let sheet = graph.sheets[idx].clone();
          let compile_options = Arc::clone(&compile_options);
          debug!("recompiling {}", sheet.name);
          rebuilds.spawn_blocking(move || (idx, compile_guarded(&compile_options, &sheet)));
        }
      },
      Some(joined) = rebuilds.join_next() => {
        let Ok((idx, result)) = joined else { continue };
        coalescer.finish(&idx, Instant::now());
        match result {
          Ok(output) => {
            graph.update(idx, &output.dependencies);
            watch_new_roots(&mut watcher, &graph, &mut watched);
            notifier.notify(&output.asset.path.display_relative_to(&options.cwd));
          }
          Err(errors) => log_errors(&errors),
        }
      },
    }
  }

  info!("stopped watching stylesheets");
  rebuilds.shutdown().await;
  Ok(())
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;

  use super::*;

  fn sheet(name: &str) -> StyleSheet {
    StyleSheet {
      name: name.to_string(),
      source: PathBuf::from(format!("/p/static/{name}.less")),
      output: PathBuf::from(format!("/p/static/{name}.css")),
    }
  }

  #[test]
  fn changes_map_to_every_stylesheet_including_the_file() {
    let mut graph = WatchGraph::new(
      vec![sheet("karl"), sheet("theme")],
      PathBuf::from("/p/static"),
      vec!["dist/mockup/patterns/**/*.less".to_string()],
    );
    graph.update(0, &[PathBuf::from("/p/static/karl.less"), PathBuf::from("/p/static/base.less")]);
    graph.update(1, &[PathBuf::from("/p/static/theme.less"), PathBuf::from("/p/static/base.less")]);

    assert_eq!(graph.affected(Path::new("/p/static/karl.less")), [0]);
    assert_eq!(graph.affected(Path::new("/p/static/base.less")), [0, 1]);
    assert_eq!(graph.affected(Path::new("/p/static/dist/mockup/patterns/tree/x.less")), [0, 1]);
    assert!(graph.affected(Path::new("/p/static/karl.css")).is_empty());
    assert!(graph.affected(Path::new("/p/static/other.less")).is_empty());

    graph.update(0, &[PathBuf::from("/p/static/karl.less")]);
    assert_eq!(graph.affected(Path::new("/p/static/base.less")), [1]);
  }

  #[test]
  fn watch_roots_cover_inputs_and_glob_bases() {
    let mut graph = WatchGraph::new(
      vec![sheet("karl")],
      PathBuf::from("/p/static"),
      vec!["dist/mockup/patterns/**/*.less".to_string()],
    );
    graph.update(0, &[PathBuf::from("/p/static/karl.less"), PathBuf::from("/p/static/less/vars.less")]);

    let mut roots = graph.watch_roots();
    roots.sort_by(|a, b| a.0.cmp(&b.0));
    assert_eq!(roots, [
      (PathBuf::from("/p/static"), false),
      (PathBuf::from("/p/static/dist/mockup/patterns/"), true),
      (PathBuf::from("/p/static/less"), false),
    ]);
  }

  #[test]
  fn glob_bases_stop_at_the_first_wildcard() {
    assert_eq!(glob_base("dist/mockup/patterns/**/*.less"), "dist/mockup/patterns/");
    assert_eq!(glob_base("*.less"), "");
    assert_eq!(glob_base("less/theme.less"), "less/");
  }
}
