use std::{future::Future, path::Path, sync::Arc};

use assetpack_common::{NormalizedOptions, OutputAsset, ProjectOptions, ResourceManifest};
use assetpack_error::{BuildDiagnostic, BuildResult};
use assetpack_fs::{FileSystem, OsFileSystem};
use sugar_path::SugarPath;
use tracing::info;

use crate::{
  optimizer::OptimizeStage,
  stages::{concat::ConcatStage, copy::CopyStage, css::CssStage, stamp::StampStage},
  task_graph::{Command, Task, TaskGraph, TaskReport},
  types::{SharedManifest, SharedOptions},
  utils::normalize_options::normalize_options,
  watch::{self, ReloadNotifier},
};

/// One configured project: options and manifest, loaded and checked once.
#[derive(Clone)]
pub struct Pipeline {
  fs: OsFileSystem,
  options: SharedOptions,
  manifest: SharedManifest,
}

impl Pipeline {
  /// Fails before anything is written when the configuration or the manifest
  /// is invalid, including when two outputs would share a path.
  pub fn new(raw_options: ProjectOptions) -> BuildResult<Self> {
    let fs = OsFileSystem;
    let options = normalize_options(raw_options)?;
    let manifest = ResourceManifest::load(&fs, &options.cwd, &options.manifest)?;

    let mut extra = vec![("stamp file", StampStage::new(&fs, &options, &manifest).path())];
    if let Some(optimizer) = &options.optimizer {
      extra.push(("optimizer output", optimizer.out.clone()));
    }
    manifest.validate(&fs, &options.cwd, &extra)?;

    Ok(Self { fs, options: Arc::new(options), manifest: Arc::new(manifest) })
  }

  /// Reads `config`, relative to `cwd`, as the project options.
  pub fn from_config_file(cwd: &Path, config: &Path) -> BuildResult<Self> {
    let cwd = cwd.absolutize();
    let config_path = cwd.join(config).normalize();
    let content = OsFileSystem
      .read_to_string(&config_path)
      .map_err(|err| BuildDiagnostic::io("read config", &config_path, err))?;
    let mut raw_options: ProjectOptions = serde_json::from_str(&content)
      .map_err(|err| BuildDiagnostic::config(&config_path, err.to_string()))?;
    raw_options.cwd = Some(cwd);
    raw_options.config_path = Some(config_path);
    Self::new(raw_options)
  }

  pub fn options(&self) -> &NormalizedOptions {
    &self.options
  }

  pub fn manifest(&self) -> &ResourceManifest {
    &self.manifest
  }

  pub async fn run(&self, command: Command) -> TaskReport {
    let pipeline = self.clone();
    TaskGraph::new(command.tasks()).run(move |task| pipeline.run_task(task)).await
  }

  /// Runs one task synchronously, ignoring its dependencies.
  pub fn run_task(&self, task: Task) -> BuildResult<Vec<OutputAsset>> {
    let fs = &self.fs;
    let options = &*self.options;
    let manifest = &*self.manifest;
    match task {
      Task::Copy => CopyStage::new(fs, options, manifest).run(),
      Task::ConcatJs => ConcatStage::new(fs, options, manifest).run(),
      Task::OptimizeJs => match &options.optimizer {
        Some(optimizer) => OptimizeStage::new(fs, optimizer).run(),
        None => {
          info!("no optimizer configured, skipping {task}");
          Ok(Vec::new())
        }
      },
      Task::Css => CssStage::new(fs, options, manifest).run(),
      Task::Stamp => StampStage::new(fs, options, manifest).run(),
    }
  }

  /// Compiles every stylesheet, then recompiles on change until `shutdown` resolves.
  pub async fn watch_css(
    &self,
    notifier: &dyn ReloadNotifier,
    shutdown: impl Future<Output = ()>,
  ) -> BuildResult<()> {
    watch::watch_css(self, notifier, shutdown).await
  }
}
