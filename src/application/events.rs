//! Typed publish/subscribe for recorder events

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::domain::recorder::{EventKind, RecorderEvent};

/// Listener callback. Invoked synchronously on the publishing thread.
pub type EventHandler = Arc<dyn Fn(&RecorderEvent) + Send + Sync>;

/// Token returned by `subscribe`, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct Listener {
    id: ListenerId,
    kind: EventKind,
    handler: EventHandler,
}

/// Synchronous fan-out event bus.
///
/// Handlers run without any bus lock held, so a handler may subscribe,
/// unsubscribe or publish. A panicking handler is logged and skipped; the
/// remaining handlers still receive the event.
#[derive(Default)]
pub struct EventBus {
    listeners: Mutex<Vec<Listener>>,
    next_id: AtomicU64,
}

impl EventBus {
    /// Create an empty bus
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for events of `kind`
    pub fn subscribe<F>(&self, kind: EventKind, handler: F) -> ListenerId
    where
        F: Fn(&RecorderEvent) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().push(Listener {
            id,
            kind,
            handler: Arc::new(handler),
        });
        id
    }

    /// Remove a listener. Returns false if it was not registered.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.lock();
        let before = listeners.len();
        listeners.retain(|l| l.id != id);
        listeners.len() != before
    }

    /// Deliver `event` to every listener registered for its kind, in
    /// registration order. Returns how many handlers ran to completion.
    pub fn publish(&self, event: &RecorderEvent) -> usize {
        let kind = event.kind();
        let handlers: Vec<EventHandler> = self
            .lock()
            .iter()
            .filter(|l| l.kind == kind)
            .map(|l| Arc::clone(&l.handler))
            .collect();

        tracing::trace!(event = %kind, listeners = handlers.len(), "Dispatching event");

        handlers
            .into_iter()
            .filter(|handler| {
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| handler(event)));
                if outcome.is_err() {
                    tracing::error!("Listener for '{}' panicked", kind);
                }
                outcome.is_ok()
            })
            .count()
    }

    #[cfg(test)]
    fn listener_count(&self, kind: EventKind) -> usize {
        self.lock().iter().filter(|l| l.kind == kind).count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Listener>> {
        // A handler never runs under this lock, so poisoning cannot leave
        // the list half-updated.
        self.listeners.lock().unwrap_or_else(|e| e.into_inner())
    }
}
