use std::path::PathBuf;

use clap::Args;

use crate::types::task_name::TaskName;

#[derive(Args)]
pub struct InputArgs {
  #[clap(value_enum)]
  pub task: TaskName,

  /// Project directory, every configured path is relative to it
  #[clap(long)]
  pub cwd: Option<PathBuf>,

  #[clap(long, short = 'c', default_value = assetpack::DEFAULT_CONFIG_FILE)]
  pub config: PathBuf,
}

#[derive(Args)]
pub struct OutputArgs {
  /// Only print errors
  #[clap(long, short = 's')]
  pub silent: bool,
}
