use std::{collections::VecDeque, path::Path};

use arcstr::ArcStr;
use assetpack_common::{ModuleIdx, ShimExport};
use assetpack_ecmascript::{DefineCall, scan_amd};
use assetpack_error::{BuildDiagnostic, BuildError, BuildResult};
use assetpack_fs::FileSystem;
use assetpack_resolver::{ModuleResolver, ResolveReturn, ResolvedKind};
use oxc_index::IndexVec;
use rustc_hash::FxHashMap;

pub type IndexModules = IndexVec<ModuleIdx, ModuleRecord>;

#[derive(Debug)]
pub struct ModuleRecord {
  pub name: ArcStr,
  pub kind: ModuleKind,
  /// Eager dependencies in declaration order, without duplicates.
  pub deps: Vec<ModuleIdx>,
  /// Targets of `require([...])` calls made inside functions.
  pub lazy_deps: Vec<ModuleIdx>,
}

#[derive(Debug)]
pub enum ModuleKind {
  Stub { global: String },
  Pseudo,
  Text { content: String },
  Script { source: String, shape: ScriptShape },
}

#[derive(Debug)]
pub enum ScriptShape {
  /// Defines its own module. `anonymous` is the define still missing its name.
  Amd { anonymous: Option<DefineCall> },
  /// A non-module script described by a shim.
  Shim { exports: Option<ShimExport> },
  Plain,
}

#[derive(Debug)]
pub struct ModuleGraph {
  pub modules: IndexModules,
  pub entry: ModuleIdx,
}

struct LoadedModule {
  kind: ModuleKind,
  deps: Vec<String>,
  lazy_deps: Vec<String>,
}

impl LoadedModule {
  fn leaf(kind: ModuleKind) -> Self {
    Self { kind, deps: Vec::new(), lazy_deps: Vec::new() }
  }
}

#[derive(Default)]
struct ModuleTable {
  modules: IndexModules,
  visited: FxHashMap<ArcStr, ModuleIdx>,
  queue: VecDeque<(ModuleIdx, ResolvedKind)>,
}

impl ModuleTable {
  fn intern(&mut self, resolved: ResolveReturn) -> ModuleIdx {
    if let Some(idx) = self.visited.get(&resolved.name) {
      return *idx;
    }
    let idx = self.modules.push(ModuleRecord {
      name: resolved.name.clone(),
      kind: ModuleKind::Pseudo,
      deps: Vec::new(),
      lazy_deps: Vec::new(),
    });
    self.visited.insert(resolved.name, idx);
    self.queue.push_back((idx, resolved.kind));
    idx
  }

  fn link(
    &mut self,
    resolver: &ModuleResolver,
    importer: &str,
    names: &[String],
    errors: &mut BuildError,
  ) -> Vec<ModuleIdx> {
    let mut deps = Vec::with_capacity(names.len());
    for name in names {
      match resolver.resolve(name, importer) {
        Ok(resolved) => {
          let idx = self.intern(resolved);
          if !deps.contains(&idx) {
            deps.push(idx);
          }
        }
        Err(err) => errors.push(err.into()),
      }
    }
    deps
  }
}

/// Resolves the entry and everything reachable from it, eager or lazy.
pub struct ScanStage<'a> {
  fs: &'a dyn FileSystem,
  resolver: &'a ModuleResolver<'a>,
}

impl<'a> ScanStage<'a> {
  pub fn new(fs: &'a dyn FileSystem, resolver: &'a ModuleResolver<'a>) -> Self {
    Self { fs, resolver }
  }

  /// Keeps going after a failure so that every unresolved name is reported at once.
  pub fn scan(&self, entry: &str) -> BuildResult<ModuleGraph> {
    let mut table = ModuleTable::default();
    let mut errors = BuildError::default();
    let entry = table.intern(self.resolver.resolve(entry, entry)?);

    while let Some((idx, kind)) = table.queue.pop_front() {
      let name = table.modules[idx].name.clone();
      match self.load_module(&name, kind) {
        Ok(loaded) => {
          let deps = table.link(self.resolver, &name, &loaded.deps, &mut errors);
          let lazy_deps = table.link(self.resolver, &name, &loaded.lazy_deps, &mut errors);
          let module = &mut table.modules[idx];
          module.kind = loaded.kind;
          module.deps = deps;
          module.lazy_deps = lazy_deps;
        }
        Err(err) => errors.push(err.into()),
      }
    }

    if errors.is_empty() { Ok(ModuleGraph { modules: table.modules, entry }) } else { Err(errors) }
  }

  fn load_module(&self, name: &str, kind: ResolvedKind) -> Result<LoadedModule, BuildDiagnostic> {
    match kind {
      ResolvedKind::Stub { global } => Ok(LoadedModule::leaf(ModuleKind::Stub { global })),
      ResolvedKind::Pseudo => Ok(LoadedModule::leaf(ModuleKind::Pseudo)),
      ResolvedKind::Text { path } => {
        let content =
          self.fs.read_to_string(&path).map_err(|err| BuildDiagnostic::io("read", &path, err))?;
        Ok(LoadedModule::leaf(ModuleKind::Text { content }))
      }
      ResolvedKind::Script { path } => self.load_script(name, &path),
    }
  }

  fn load_script(&self, name: &str, path: &Path) -> Result<LoadedModule, BuildDiagnostic> {
    let source =
      self.fs.read_to_string(path).map_err(|err| BuildDiagnostic::io("read", path, err))?;
    let scanned = scan_amd(&source, path)?;

    let anonymous = scanned.anonymous_defines().collect::<Vec<_>>();
    if anonymous.len() > 1 {
      return Err(BuildDiagnostic::MultipleAnonymousDefines {
        module: name.to_string(),
        path: path.to_path_buf(),
        count: anonymous.len(),
      });
    }

    let own_define = match (scanned.named_define(name), anonymous.first()) {
      (Some(_), Some(_)) => {
        return Err(BuildDiagnostic::StrayAnonymousDefine {
          module: name.to_string(),
          path: path.to_path_buf(),
        });
      }
      (named, anonymous) => named.or_else(|| anonymous.copied()),
    };
    let (shape, mut deps) = match own_define {
      Some(define) => (
        ScriptShape::Amd { anonymous: define.name.is_none().then(|| define.clone()) },
        define.deps.clone(),
      ),
      None => match self.resolver.config().shims.get(name) {
        Some(shim) => (ScriptShape::Shim { exports: shim.exports.clone() }, shim.deps.clone()),
        None => (ScriptShape::Plain, Vec::new()),
      },
    };

    // Other modules defined in the same file need their dependencies loaded
    // before this one, as do top-level `require([...])` calls.
    let extra = scanned
      .defines
      .iter()
      .filter(|define| define.name.as_deref().is_some_and(|defined| defined != name))
      .flat_map(|define| define.deps.iter())
      .chain(&scanned.top_level_requires);
    for dep in extra {
      if !deps.contains(dep) {
        deps.push(dep.clone());
      }
    }

    let defined_here = |dep: &String| scanned.named_define(dep).is_some();
    deps.retain(|dep| !defined_here(dep));
    let lazy_deps =
      scanned.nested_requires.iter().filter(|dep| !defined_here(*dep)).cloned().collect();

    Ok(LoadedModule { kind: ModuleKind::Script { source, shape }, deps, lazy_deps })
  }
}
