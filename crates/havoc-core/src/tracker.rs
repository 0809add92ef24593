//! In-memory recovery tracking for disrupted targets.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::target::Target;

#[derive(Default)]
struct TrackerInner {
    stopped: HashMap<String, Arc<dyn Target>>,
}

/// Thread-safe map from target name to the snapshot taken when the target was
/// successfully stopped.
///
/// Entries have no expiry; they live until a successful start or recovery
/// removes them. The tracker is process-lifetime state, constructed once at
/// startup and handed to every handler. Callers never coordinate locking
/// externally; the internal lock is only ever held for a single map
/// mutation, never across an await point.
pub struct RecoveryTracker {
    inner: Mutex<TrackerInner>,
}

impl RecoveryTracker {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(TrackerInner::default()),
        }
    }

    /// Insert or overwrite the entry for the target's name.
    pub fn put(&self, target: Arc<dyn Target>) {
        let mut inner = self.inner.lock();
        inner.stopped.insert(target.name().to_owned(), target);
    }

    /// Remove and return the entry for `name`. Removing an absent entry is a
    /// no-op, never an error.
    pub fn remove(&self, name: &str) -> Option<Arc<dyn Target>> {
        let mut inner = self.inner.lock();
        inner.stopped.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Target>> {
        let inner = self.inner.lock();
        inner.stopped.get(name).cloned()
    }

    /// Point-in-time copy of the tracked targets, in no particular order.
    pub fn snapshot(&self) -> Vec<Arc<dyn Target>> {
        let inner = self.inner.lock();
        inner.stopped.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().stopped.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().stopped.is_empty()
    }
}

impl Default for RecoveryTracker {
    fn default() -> Self {
        Self::new()
    }
}
