use tokio::sync::broadcast;
use tracing::debug;

/// Tells connected viewers that a stylesheet changed.
pub trait ReloadNotifier: Send + Sync {
  /// `path` is the recompiled stylesheet relative to the project directory.
  fn notify(&self, path: &str);
}

/// The live-reload protocol message for a style-only reload.
pub fn reload_message(path: &str) -> String {
  format!(r#"{{"command":"reload","path":{},"liveCSS":true}}"#, serde_json::Value::from(path))
}

/// Fans reload messages out to every subscriber, e.g. one per connected browser.
#[derive(Debug)]
pub struct BroadcastNotifier {
  sender: broadcast::Sender<String>,
}

impl BroadcastNotifier {
  pub fn new(capacity: usize) -> Self {
    let (sender, _) = broadcast::channel(capacity.max(1));
    Self { sender }
  }

  pub fn subscribe(&self) -> broadcast::Receiver<String> {
    self.sender.subscribe()
  }
}

impl ReloadNotifier for BroadcastNotifier {
  fn notify(&self, path: &str) {
    if self.sender.send(reload_message(path)).is_err() {
      debug!("no viewer connected, dropped reload of {path}");
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn subscribers_receive_style_only_reloads() {
    let notifier = BroadcastNotifier::new(16);
    let mut first = notifier.subscribe();
    let mut second = notifier.subscribe();

    notifier.notify("static/karl.css");

    let expected = r#"{"command":"reload","path":"static/karl.css","liveCSS":true}"#;
    assert_eq!(first.try_recv().unwrap(), expected);
    assert_eq!(second.try_recv().unwrap(), expected);
    assert!(first.try_recv().is_err());
  }

  #[test]
  fn notifying_without_viewers_is_harmless() {
    BroadcastNotifier::new(0).notify("static/karl.css");
  }
}
