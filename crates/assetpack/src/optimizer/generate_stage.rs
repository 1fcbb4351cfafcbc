use anyhow::Context;
use assetpack_common::{ModuleIdx, ShimExport};
use assetpack_ecmascript::{inject_define_name, js_string};
use assetpack_utils::concat_string;
use itertools::Itertools;

use super::{
  runtime,
  scan_stage::{ModuleGraph, ModuleKind, ModuleRecord, ScriptShape},
};

/// Renders the sorted modules into one self-contained script.
pub struct GenerateStage<'a> {
  graph: &'a ModuleGraph,
  sorted_modules: &'a [ModuleIdx],
}

impl<'a> GenerateStage<'a> {
  pub fn new(graph: &'a ModuleGraph, sorted_modules: &'a [ModuleIdx]) -> Self {
    Self { graph, sorted_modules }
  }

  pub fn render(&self) -> anyhow::Result<String> {
    let mut code = String::from(runtime::RUNTIME);
    for idx in self.sorted_modules {
      code.push('\n');
      self.render_module(&mut code, &self.graph.modules[*idx])?;
    }
    code.push_str(&runtime::start(&self.graph.modules[self.graph.entry].name));
    Ok(code)
  }

  fn render_module(&self, code: &mut String, module: &ModuleRecord) -> anyhow::Result<()> {
    let name = js_string(&module.name);
    match &module.kind {
      ModuleKind::Pseudo => {}
      ModuleKind::Stub { global } => {
        code.push_str(&format!(
          "define({name}, [], function () {{ return amdLookup({}); }});\n",
          js_string(global)
        ));
      }
      ModuleKind::Text { content } => {
        code.push_str(&format!(
          "define({name}, [], function () {{ return {}; }});\n",
          js_string(content)
        ));
      }
      ModuleKind::Script { source, shape: ScriptShape::Amd { anonymous } } => {
        match anonymous {
          Some(define) => code.push_str(&inject_define_name(source, define, &module.name)),
          None => code.push_str(source),
        }
        code.push('\n');
      }
      ModuleKind::Script { source, shape: ScriptShape::Shim { exports } } => {
        let returns = match exports {
          Some(ShimExport::Path(path)) => concat_string!("return amdLookup(", js_string(path), ");\n"),
          Some(ShimExport::Init(description)) => {
            let description = serde_json::to_string(description)
              .with_context(|| format!("Failed to serialize the init of shim {name}"))?;
            concat_string!("return amdInit(", description, ");\n")
          }
          None => String::new(),
        };
        code.push_str(&format!(
          "(function (root) {{\ndefine({name}, {}, function () {{\nreturn (function () {{\n{source}\n;\n{returns}}}).apply(root, arguments);\n}});\n}})(this);\n",
          self.render_deps(module)
        ));
      }
      ModuleKind::Script { source, shape: ScriptShape::Plain } => {
        code.push_str(source);
        code.push_str(&format!(
          "\ndefine({name}, {}, function () {{}});\n",
          self.render_deps(module)
        ));
      }
    }
    Ok(())
  }

  fn render_deps(&self, module: &ModuleRecord) -> String {
    let deps = module.deps.iter().map(|dep| js_string(&self.graph.modules[*dep].name)).join(", ");
    concat_string!("[", deps, "]")
  }
}
