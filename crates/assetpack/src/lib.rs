mod optimizer;
mod pipeline;
mod stages;
mod task_graph;
mod types;
mod utils;
mod watch;

pub use crate::{
  optimizer::OptimizeStage,
  pipeline::Pipeline,
  task_graph::{Command, Task, TaskGraph, TaskReport},
  utils::normalize_options::{DEFAULT_CONFIG_FILE, normalize_options},
  watch::{BroadcastNotifier, RebuildCoalescer, ReloadNotifier, reload_message},
};
pub use assetpack_common::*;
pub use assetpack_error::{BuildDiagnostic, BuildError, BuildResult, DiagnosticKind};
pub use assetpack_utils::path_ext::PathExt;
