//! Recording of callback invocations.

use std::sync::{Arc, Mutex, PoisonError};

/// Thread-safe log of the values a callback was invoked with.
///
/// Clones share the same log, so one clone can be moved into a handler
/// while the test keeps another for assertions.
#[derive(Debug)]
pub struct CallRecorder<T> {
    calls: Arc<Mutex<Vec<T>>>,
}

impl<T> CallRecorder<T> {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Append one invocation.
    pub fn record(&self, value: T) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(value);
    }

    /// Number of recorded invocations.
    #[must_use]
    pub fn count(&self) -> usize {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Forget every recorded invocation.
    pub fn clear(&self) {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

impl<T: Clone> CallRecorder<T> {
    /// Copy of the recorded invocations, oldest first.
    #[must_use]
    pub fn calls(&self) -> Vec<T> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl<T> Clone for CallRecorder<T> {
    fn clone(&self) -> Self {
        Self {
            calls: Arc::clone(&self.calls),
        }
    }
}

impl<T> Default for CallRecorder<T> {
    fn default() -> Self {
        Self::new()
    }
}
