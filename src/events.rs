use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use dashmap::DashMap;

/// Broadcast after a retry batch delivered at least one pending submission.
pub const PENDING_SUBMISSIONS_PROCESSED: &str = "pendingSubmissionsProcessed";

pub type Handler = Arc<dyn Fn() + Send + Sync>;

/// Named, payload-free notifications between independently mounted parts.
pub trait EventPublisher: Send + Sync {
    fn publish(&self, event: &str);

    /// Register `handler` for `event`. The handler stays registered until the
    /// returned [`Subscription`] is dropped.
    fn subscribe(&self, event: &str, handler: Handler) -> Subscription;

    /// Handlers currently registered for `event`.
    fn listener_count(&self, event: &str) -> usize;
}

/// Scoped registration handle. Dropping it removes the handler.
#[must_use = "dropping a Subscription immediately unsubscribes the handler"]
pub struct Subscription {
    release: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub fn new(release: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    pub fn unsubscribe(mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

/// In-process event bus.
#[derive(Default)]
pub struct EventBus {
    handlers: Arc<DashMap<u64, (String, Handler)>>,
    next_id: AtomicU64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventPublisher for EventBus {
    fn publish(&self, event: &str) {
        // Snapshot first: handlers may (un)subscribe while running.
        let mut targets: Vec<(u64, Handler)> = self
            .handlers
            .iter()
            .filter(|e| e.value().0 == event)
            .map(|e| (*e.key(), e.value().1.clone()))
            .collect();
        targets.sort_by_key(|(id, _)| *id);

        tracing::debug!("Publishing {event} to {} listener(s)", targets.len());

        for (_, handler) in targets {
            handler();
        }
    }

    fn subscribe(&self, event: &str, handler: Handler) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.handlers.insert(id, (event.to_string(), handler));

        let handlers: Weak<DashMap<u64, (String, Handler)>> = Arc::downgrade(&self.handlers);
        Subscription::new(move || {
            if let Some(handlers) = handlers.upgrade() {
                handlers.remove(&id);
            }
        })
    }

    fn listener_count(&self, event: &str) -> usize {
        self.handlers.iter().filter(|e| e.value().0 == event).count()
    }
}
