use clap::ValueEnum;

#[derive(PartialEq, Eq, Clone, Copy, ValueEnum)]
#[clap(rename_all = "kebab-case")]
pub enum TaskName {
  /// Mirror vendor packages into the distribution tree
  Copy,
  /// Concatenate and optimize all scripts
  ProcessJs,
  /// Concatenate and minify the manifest's script bundles
  ConcatJs,
  /// Bundle the AMD module graph into one file
  OptimizeJs,
  /// Compile every stylesheet
  ProcessCss,
  /// Write the stamp file
  Stamp,
  /// Everything above, then the stamp
  Install,
  /// Recompile stylesheets on change until interrupted
  WatchCss,
}

impl From<TaskName> for assetpack::Command {
  fn from(value: TaskName) -> Self {
    match value {
      TaskName::Copy => assetpack::Command::Copy,
      TaskName::ProcessJs => assetpack::Command::ProcessJs,
      TaskName::ConcatJs => assetpack::Command::ConcatJs,
      TaskName::OptimizeJs => assetpack::Command::OptimizeJs,
      TaskName::ProcessCss => assetpack::Command::ProcessCss,
      TaskName::Stamp => assetpack::Command::Stamp,
      TaskName::Install => assetpack::Command::Install,
      TaskName::WatchCss => assetpack::Command::WatchCss,
    }
  }
}
