mod args;
mod types;

use std::{
  path::{Path, PathBuf},
  process::ExitCode,
  time::Instant,
};

use ansi_term::Colour;
use args::{InputArgs, OutputArgs};
use clap::Parser;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

use assetpack::{BroadcastNotifier, BuildError, Command, OutputAsset, PathExt, Pipeline};

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Commands {
  #[clap(flatten)]
  input: InputArgs,

  #[clap(flatten)]
  output: OutputArgs,
}

fn init_tracing(silent: bool) {
  let filter = EnvFilter::try_from_env("ASSETPACK_LOG")
    .unwrap_or_else(|_| EnvFilter::new(if silent { "error" } else { "info" }));
  tracing_subscriber::fmt().with_env_filter(filter).with_target(false).with_writer(std::io::stderr).init();
}

fn print_output_assets(cwd: &Path, outputs: Vec<OutputAsset>) {
  let mut left = 0;
  let mut right = 0;

  let mut assets = Vec::with_capacity(outputs.len());

  for output in outputs {
    let size = format!("{:.2}", output.size as f64 / 1024.0);
    let path = output.path.display_relative_to(cwd);

    if size.len() > right {
      right = size.len();
    }

    if path.len() > left {
      left = path.len();
    }

    assets.push((path, size, output.kind.as_str()));
  }

  let dim = Colour::White.dimmed();
  let color = Colour::Cyan;

  for (path, size, kind) in assets {
    let path_len = path.len();

    println!(
      "{}{:left$} {}{}{:right$}{} kB",
      color.paint(path),
      "",
      dim.paint(kind),
      dim.paint(" │ size: "),
      "",
      size,
      left = left - path_len,
      right = right - size.len()
    );
  }
}

fn print_errors(errors: &BuildError) {
  for error in &**errors {
    println!("{} {:#}", Colour::Red.paint("Error:"), error);
  }
}

async fn watch_css(pipeline: &Pipeline) -> ExitCode {
  let notifier = BroadcastNotifier::new(64);
  let mut reloads = notifier.subscribe();
  let viewer = tokio::spawn(async move {
    loop {
      match reloads.recv().await {
        Ok(message) => tracing::info!("reload {message}"),
        Err(RecvError::Lagged(missed)) => tracing::warn!("missed {missed} reload(s)"),
        Err(RecvError::Closed) => break,
      }
    }
  });

  let shutdown = async {
    if let Err(err) = tokio::signal::ctrl_c().await {
      tracing::error!("cannot listen for Ctrl-C: {err}");
    }
  };
  let result = pipeline.watch_css(&notifier, shutdown).await;

  drop(notifier);
  let _ = viewer.await;

  match result {
    Ok(()) => ExitCode::SUCCESS,
    Err(errors) => {
      print_errors(&errors);
      ExitCode::FAILURE
    }
  }
}

#[tokio::main]
async fn main() -> ExitCode {
  let args = Commands::parse();
  let silent = args.output.silent;
  init_tracing(silent);

  let cwd = args.input.cwd.unwrap_or_else(|| PathBuf::from("."));
  let pipeline = match Pipeline::from_config_file(&cwd, &args.input.config) {
    Ok(pipeline) => pipeline,
    Err(errors) => {
      print_errors(&errors);
      return ExitCode::FAILURE;
    }
  };

  let command = Command::from(args.input.task);
  if command == Command::WatchCss {
    return watch_css(&pipeline).await;
  }

  let start = Instant::now();
  let report = pipeline.run(command).await;

  if !silent {
    for task in &report.skipped {
      println!("{} skipped {task} because another task failed", Colour::Yellow.paint("Warning:"));
    }
  }

  match report.into_result() {
    Ok(outputs) => {
      if !silent {
        // Print output assets
        if !outputs.is_empty() {
          print_output_assets(&pipeline.options().cwd, outputs);
        }

        let elapsed = format!("{:.2} ms", start.elapsed().as_secs_f64() * 1000.0);
        println!("\n{} Finished in {}", Colour::Green.paint("✔"), Colour::White.bold().paint(elapsed));
      }
      ExitCode::SUCCESS
    }
    Err(errors) => {
      print_errors(&errors);
      ExitCode::FAILURE
    }
  }
}
