// ============================================================================
// Listener Fan-Out
// Observer registries invoked synchronously on the consumer thread
// ============================================================================

use parking_lot::RwLock;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

type Listener<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// Registry of observers for one event type.
///
/// Registration is additive; there is no unregistration. `notify` takes a
/// snapshot of the registered callbacks and invokes each inside its own panic
/// boundary, so a failing observer cannot affect the others or the loop that
/// called it. Listeners run synchronously on the notifying thread and must be
/// fast and non-blocking.
pub struct ListenerRegistry<E> {
    listeners: RwLock<Vec<Listener<E>>>,
    event_kind: &'static str,
}

impl<E> ListenerRegistry<E> {
    pub fn new(event_kind: &'static str) -> Self {
        Self {
            listeners: RwLock::new(Vec::new()),
            event_kind,
        }
    }

    pub fn register<F>(&self, listener: F)
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        self.listeners.write().push(Arc::new(listener));
    }

    /// Invoke every registered listener with `event`, in registration order.
    pub fn notify(&self, event: &E) {
        let snapshot: Vec<Listener<E>> = self.listeners.read().clone();

        for listener in &snapshot {
            if let Err(panic) = catch_unwind(AssertUnwindSafe(|| listener(event))) {
                tracing::error!(
                    event_kind = self.event_kind,
                    reason = panic_message(panic.as_ref()),
                    "listener panicked, continuing with remaining listeners"
                );
            }
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.read().is_empty()
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
