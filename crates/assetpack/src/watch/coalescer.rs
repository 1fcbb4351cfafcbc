use std::{hash::Hash, time::Duration};

use assetpack_utils::indexmap::FxIndexMap;
use rustc_hash::FxHashSet;
use tokio::time::Instant;

/// Trailing debounce per key. A key becomes due once no event arrived for it
/// during `window`. Events for a key whose rebuild is in flight are folded into
/// a single follow-up rebuild, scheduled when the current one finishes.
#[derive(Debug)]
pub struct RebuildCoalescer<K> {
  window: Duration,
  deadlines: FxIndexMap<K, Instant>,
  in_flight: FxHashSet<K>,
  dirty: FxHashSet<K>,
}

impl<K: Hash + Eq + Clone> RebuildCoalescer<K> {
  pub fn new(window: Duration) -> Self {
    Self {
      window,
      deadlines: FxIndexMap::default(),
      in_flight: FxHashSet::default(),
      dirty: FxHashSet::default(),
    }
  }

  pub fn record(&mut self, key: K, now: Instant) {
    if self.in_flight.contains(&key) {
      self.dirty.insert(key);
    } else {
      self.deadlines.insert(key, now + self.window);
    }
  }

  pub fn next_deadline(&self) -> Option<Instant> {
    self.deadlines.values().min().copied()
  }

  /// Keys whose window elapsed, in the order they were first recorded. They
  /// count as in flight until `finish` is called.
  pub fn take_due(&mut self, now: Instant) -> Vec<K> {
    let due = self
      .deadlines
      .iter()
      .filter(|(_, deadline)| **deadline <= now)
      .map(|(key, _)| key.clone())
      .collect::<Vec<_>>();
    for key in &due {
      self.deadlines.shift_remove(key);
      self.in_flight.insert(key.clone());
    }
    due
  }

  pub fn finish(&mut self, key: &K, now: Instant) {
    self.in_flight.remove(key);
    if self.dirty.remove(key) {
      self.deadlines.insert(key.clone(), now + self.window);
    }
  }
}
