use serde_json::Value;
use std::sync::Mutex;

/// An append-only log of facet values observed by one handler.
///
/// Each instrumented handler owns one recorder per active facet. Entries at
/// the same index across a handler's recorders belong to the same physical
/// request; that alignment is what makes nth-call assertions meaningful, so
/// every active facet records exactly one entry per matched request.
///
/// Entries are ordered by insertion only; there are no timestamps. Under
/// interleaved async dispatch the recorded order reflects the order in which
/// each request's extraction step ran.
#[derive(Debug)]
pub struct CallRecorder {
    name: String,
    calls: Mutex<Vec<Value>>,
}

impl CallRecorder {
    pub(crate) fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// The handler identifier this recorder was created for (route path or
    /// GraphQL operation name). Used in diagnostic messages.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Appends a recorded value.
    pub fn record(&self, value: Value) {
        self.lock().push(value);
    }

    /// Returns a snapshot of all recorded values, in insertion order.
    pub fn calls(&self) -> Vec<Value> {
        self.lock().clone()
    }

    /// Returns the value recorded for the nth call, 1-based: `nth(1)` is the
    /// first call. Returns `None` when fewer than `n` calls were recorded or
    /// `n` is zero.
    pub fn nth(&self, n: usize) -> Option<Value> {
        if n == 0 {
            return None;
        }
        self.lock().get(n - 1).cloned()
    }

    /// Number of recorded calls.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Discards all recorded calls. Called when the owning handler is reset
    /// between test cases.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Value>> {
        // A poisoned lock only means a panic elsewhere mid-record; the log
        // itself is still usable.
        self.calls
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
