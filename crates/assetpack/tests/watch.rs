use std::{fs, path::Path, sync::Mutex, time::Duration};

use assetpack::{Pipeline, ReloadNotifier};
use tokio::{sync::oneshot, time::sleep};

const MANIFEST: &str = r#"{
  "staticPrefix": "static/",
  "minPrefix": "dist/min/",
  "js": {},
  "css": ["karl"]
}"#;

const CONFIG: &str = r#"{
  "manifest": "resources.json",
  "css": { "debounceMs": 300 }
}"#;

#[derive(Default)]
struct RecordingNotifier {
  paths: Mutex<Vec<String>>,
}

impl RecordingNotifier {
  fn paths(&self) -> Vec<String> {
    self.paths.lock().unwrap().clone()
  }
}

impl ReloadNotifier for RecordingNotifier {
  fn notify(&self, path: &str) {
    self.paths.lock().unwrap().push(path.to_string());
  }
}

fn write(root: &Path, path: &str, content: &str) {
  let path = root.join(path);
  fs::create_dir_all(path.parent().unwrap()).unwrap();
  fs::write(path, content).unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn rapid_edits_recompile_once_and_outputs_never_retrigger() {
  let dir = tempfile::tempdir().unwrap();
  let root = dir.path();
  write(root, "assetpack.json", CONFIG);
  write(root, "resources.json", MANIFEST);
  write(root, "static/karl.less", "@import \"less/vars\";\n.header { color: @brand; }\n");
  write(root, "static/less/vars.less", "@brand: red;\n");

  let pipeline = Pipeline::from_config_file(root, Path::new("assetpack.json")).unwrap();
  let notifier = RecordingNotifier::default();
  let (stop, stopped) = oneshot::channel::<()>();
  let shutdown = async {
    let _ = stopped.await;
  };

  let edits = async {
    // Initial compile and watcher setup.
    sleep(Duration::from_millis(700)).await;
    assert_eq!(fs::read_to_string(root.join("static/karl.css")).unwrap(), ".header{color:red}");

    for step in 0..5 {
      write(root, "static/less/vars.less", &format!("@brand: #00{step};\n"));
      sleep(Duration::from_millis(20)).await;
    }
    sleep(Duration::from_millis(1200)).await;
    assert_eq!(notifier.paths(), ["static/karl.css"]);
    let rebuilt = fs::read_to_string(root.join("static/karl.css")).unwrap();
    assert!(rebuilt.starts_with(".header{color:"));
    assert_ne!(rebuilt, ".header{color:red}");

    write(root, "static/karl.css", ".stale{}");
    write(root, "static/karl.css", ".stale{}");
    sleep(Duration::from_millis(1200)).await;
    assert_eq!(notifier.paths().len(), 1);

    let _ = stop.send(());
  };

  let (watched, ()) = tokio::join!(pipeline.watch_css(&notifier, shutdown), edits);
  watched.unwrap();
}
