use std::{
  fmt,
  panic::{AssertUnwindSafe, catch_unwind},
  sync::Arc,
};

use assetpack_common::OutputAsset;
use assetpack_error::{BuildError, BuildResult};
use rustc_hash::FxHashSet;
use tokio::task::JoinSet;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Task {
  Copy,
  ConcatJs,
  OptimizeJs,
  Css,
  Stamp,
}

impl Task {
  pub fn name(self) -> &'static str {
    match self {
      Self::Copy => "copy",
      Self::ConcatJs => "concat-js",
      Self::OptimizeJs => "optimize-js",
      Self::Css => "css",
      Self::Stamp => "stamp",
    }
  }

  /// Tasks that must finish first when they are part of the same run.
  pub fn dependencies(self) -> &'static [Task] {
    match self {
      Self::Copy => &[],
      Self::ConcatJs | Self::OptimizeJs | Self::Css => &[Self::Copy],
      Self::Stamp => &[Self::Copy, Self::ConcatJs, Self::OptimizeJs, Self::Css],
    }
  }

  /// Only runs when every other task of the run succeeded.
  fn requires_success(self) -> bool {
    matches!(self, Self::Stamp)
  }
}

impl fmt::Display for Task {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

/// What the command line asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
  Copy,
  ProcessJs,
  ConcatJs,
  OptimizeJs,
  ProcessCss,
  Stamp,
  Install,
  WatchCss,
}

impl Command {
  /// The one-shot tasks of the command. `watch-css` has none, it runs until stopped.
  pub fn tasks(self) -> &'static [Task] {
    match self {
      Self::Copy => &[Task::Copy],
      Self::ProcessJs => &[Task::ConcatJs, Task::OptimizeJs],
      Self::ConcatJs => &[Task::ConcatJs],
      Self::OptimizeJs => &[Task::OptimizeJs],
      Self::ProcessCss => &[Task::Css],
      Self::Stamp => &[Task::Stamp],
      Self::Install => &[Task::Copy, Task::ConcatJs, Task::OptimizeJs, Task::Css, Task::Stamp],
      Self::WatchCss => &[],
    }
  }
}

#[derive(Debug, Default)]
pub struct TaskReport {
  /// In completion order.
  pub completed: Vec<(Task, Vec<OutputAsset>)>,
  pub failed: Vec<Task>,
  pub skipped: Vec<Task>,
  pub errors: BuildError,
}

impl TaskReport {
  pub fn into_result(self) -> BuildResult<Vec<OutputAsset>> {
    if self.errors.is_empty() {
      Ok(self.completed.into_iter().flat_map(|(_, outputs)| outputs).collect())
    } else {
      Err(self.errors)
    }
  }
}

/// Runs a set of tasks, each as soon as the selected tasks it depends on are
/// done. Dependencies that were not selected are ignored.
#[derive(Debug)]
pub struct TaskGraph {
  tasks: Vec<Task>,
}

impl TaskGraph {
  pub fn new(tasks: &[Task]) -> Self {
    let mut selected = Vec::with_capacity(tasks.len());
    for task in tasks {
      if !selected.contains(task) {
        selected.push(*task);
      }
    }
    Self { tasks: selected }
  }

  pub fn tasks(&self) -> &[Task] {
    &self.tasks
  }

  fn is_ready(&self, task: Task, finished: &FxHashSet<Task>) -> bool {
    task.dependencies().iter().all(|dep| !self.tasks.contains(dep) || finished.contains(dep))
  }

  /// A failed task does not stop the others, its errors are collected in the report.
  pub async fn run<R>(&self, runner: R) -> TaskReport
  where
    R: Fn(Task) -> BuildResult<Vec<OutputAsset>> + Send + Sync + 'static,
  {
    let runner = Arc::new(runner);
    let mut pending = self.tasks.clone();
    let mut finished = FxHashSet::default();
    let mut running = JoinSet::new();
    let mut report = TaskReport::default();

    loop {
      while let Some(index) = pending.iter().position(|task| self.is_ready(*task, &finished)) {
        let task = pending.remove(index);
        if task.requires_success() && !report.failed.is_empty() {
          debug!("skipping {task}, {} task(s) failed", report.failed.len());
          report.skipped.push(task);
          finished.insert(task);
          continue;
        }

        debug!("starting {task}");
        let runner = Arc::clone(&runner);
        running.spawn_blocking(move || {
          let result = catch_unwind(AssertUnwindSafe(|| runner(task)))
            .unwrap_or_else(|_| Err(anyhow::anyhow!("Task \"{task}\" panicked").into()));
          (task, result)
        });
      }

      let Some(joined) = running.join_next().await else { break };
      let (task, result) = match joined {
        Ok(joined) => joined,
        Err(err) => {
          // Only reachable when the runtime shuts down under us.
          report.errors.push(anyhow::anyhow!("Task aborted: {err}"));
          continue;
        }
      };

      debug!("finished {task}");
      finished.insert(task);
      match result {
        Ok(outputs) => report.completed.push((task, outputs)),
        Err(errors) => {
          report.failed.push(task);
          report.errors.extend(errors.into_vec());
        }
      }
    }

    report
  }
}

#[cfg(test)]
mod tests {
  use std::{
    sync::{Mutex, mpsc},
    time::Duration,
  };

  use assetpack_common::AssetKind;
  use pretty_assertions::assert_eq;

  use super::*;

  fn asset(task: Task) -> Vec<OutputAsset> {
    vec![OutputAsset::new(AssetKind::Vendor, task.name(), 0)]
  }

  #[tokio::test]
  async fn install_runs_copy_first_and_stamp_last() {
    let order = Arc::new(Mutex::new(Vec::new()));
    let graph = TaskGraph::new(Command::Install.tasks());

    let recorded = Arc::clone(&order);
    let report = graph
      .run(move |task| {
        recorded.lock().unwrap().push(task);
        Ok(asset(task))
      })
      .await;

    let order = order.lock().unwrap().clone();
    assert_eq!(order.len(), 5);
    assert_eq!(order[0], Task::Copy);
    assert_eq!(order[4], Task::Stamp);
    assert!(report.skipped.is_empty());
    assert_eq!(report.into_result().unwrap().len(), 5);
  }

  #[tokio::test]
  async fn a_failure_skips_the_stamp_but_not_independent_tasks() {
    let ran = Arc::new(Mutex::new(Vec::new()));
    let graph = TaskGraph::new(Command::Install.tasks());

    let recorded = Arc::clone(&ran);
    let report = graph
      .run(move |task| {
        recorded.lock().unwrap().push(task);
        match task {
          Task::ConcatJs => Err(anyhow::anyhow!("broken bundle").into()),
          _ => Ok(asset(task)),
        }
      })
      .await;

    let ran = ran.lock().unwrap().clone();
    assert!(ran.contains(&Task::OptimizeJs));
    assert!(ran.contains(&Task::Css));
    assert!(!ran.contains(&Task::Stamp));
    assert_eq!(report.failed, vec![Task::ConcatJs]);
    assert_eq!(report.skipped, vec![Task::Stamp]);
    assert_eq!(report.into_result().unwrap_err().to_string(), "broken bundle");
  }

  #[tokio::test]
  async fn unselected_dependencies_are_not_waited_for() {
    let graph = TaskGraph::new(&[Task::Stamp, Task::Stamp]);
    assert_eq!(graph.tasks(), [Task::Stamp]);

    let report = graph.run(|task| Ok(asset(task))).await;

    assert_eq!(report.completed.len(), 1);
    assert_eq!(report.completed[0].0, Task::Stamp);
  }

  #[tokio::test]
  async fn panics_are_reported_as_errors() {
    let report = TaskGraph::new(&[Task::Css]).run(|_| panic!("boom")).await;

    assert_eq!(report.failed, vec![Task::Css]);
    assert_eq!(report.errors.to_string(), "Task \"css\" panicked");
  }

  #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
  async fn independent_tasks_run_concurrently() {
    // Each side waits for the other, which only works when both run at once.
    let (concat_tx, concat_rx) = mpsc::channel::<()>();
    let (css_tx, css_rx) = mpsc::channel::<()>();
    let channels = Mutex::new((Some((concat_tx, css_rx)), Some((css_tx, concat_rx))));

    let report = TaskGraph::new(Command::Install.tasks())
      .run(move |task| {
        let timeout = Duration::from_secs(10);
        match task {
          Task::ConcatJs => {
            let (tx, rx) = channels.lock().unwrap().0.take().unwrap();
            tx.send(()).unwrap();
            rx.recv_timeout(timeout).map_err(|err| anyhow::anyhow!("{err}"))?;
          }
          Task::Css => {
            let (tx, rx) = channels.lock().unwrap().1.take().unwrap();
            tx.send(()).unwrap();
            rx.recv_timeout(timeout).map_err(|err| anyhow::anyhow!("{err}"))?;
          }
          _ => {}
        }
        Ok(asset(task))
      })
      .await;

    assert!(report.errors.is_empty());
    assert_eq!(report.completed.len(), 5);
  }
}
