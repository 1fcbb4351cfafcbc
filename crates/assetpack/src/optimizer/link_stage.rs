use std::iter;

use assetpack_common::ModuleIdx;
use assetpack_error::BuildDiagnostic;
use assetpack_utils::indexmap::FxIndexSet;
use rustc_hash::{FxHashMap, FxHashSet};

use super::scan_stage::ModuleGraph;

#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
enum Status {
  ToBeExecuted(ModuleIdx),
  WaitForExit(ModuleIdx),
}

pub struct LinkStage<'a> {
  graph: &'a ModuleGraph,
}

impl<'a> LinkStage<'a> {
  pub fn new(graph: &'a ModuleGraph) -> Self {
    Self { graph }
  }

  /// Depth-first post-order from the entry, dependencies in declared order.
  /// Lazily required modules become additional roots once the eager graph is
  /// done, which is why they never take part in a cycle.
  pub fn sort_modules(&self) -> Result<Vec<ModuleIdx>, BuildDiagnostic> {
    let modules = &self.graph.modules;
    let mut executed_ids = FxHashSet::default();
    let mut sorted_modules = Vec::with_capacity(modules.len());

    let mut roots = FxIndexSet::default();
    roots.insert(self.graph.entry);
    let mut next_root = 0;

    while let Some(root) = roots.get_index(next_root).copied() {
      next_root += 1;
      if executed_ids.contains(&root) {
        continue;
      }

      let mut execution_stack = vec![Status::ToBeExecuted(root)];
      let mut stack_indexes_of_executing_id = FxHashMap::default();

      while let Some(status) = execution_stack.pop() {
        match status {
          Status::ToBeExecuted(id) => {
            if executed_ids.contains(&id) {
              if let Some(index) = stack_indexes_of_executing_id.get(&id).copied() {
                // Only modules with `Status::WaitForExit` are on the execution chain
                let cycle = execution_stack[index..]
                  .iter()
                  .filter_map(|action| match action {
                    Status::ToBeExecuted(_) => None,
                    Status::WaitForExit(id) => Some(*id),
                  })
                  .chain(iter::once(id))
                  .map(|id| modules[id].name.to_string())
                  .collect();
                return Err(BuildDiagnostic::CircularDependency { cycle });
              }
            } else {
              executed_ids.insert(id);
              execution_stack.push(Status::WaitForExit(id));
              stack_indexes_of_executing_id.insert(id, execution_stack.len() - 1);

              let module = &modules[id];
              execution_stack.extend(module.deps.iter().rev().copied().map(Status::ToBeExecuted));
              roots.extend(module.lazy_deps.iter().copied());
            }
          }
          Status::WaitForExit(id) => {
            sorted_modules.push(id);
            stack_indexes_of_executing_id.remove(&id);
          }
        }
      }
    }

    Ok(sorted_modules)
  }
}
