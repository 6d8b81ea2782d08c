// ── Unauthorized-event registry ──
//
// Observer registry owned by the `ApiClient`. Subscribers register a
// handler and get back a `SubscriptionId` for unregistering; `publish`
// fires every live handler once, synchronously, on the caller's task.
// `close` tears the registry down together with the client.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::error::DataError;

/// Callback invoked when the server rejects the session.
pub type UnauthorizedHandler = Arc<dyn Fn(&DataError) + Send + Sync>;

/// Handle returned by [`UnauthorizedRegistry::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Default)]
pub struct UnauthorizedRegistry {
    next_id: AtomicU64,
    handlers: DashMap<u64, UnauthorizedHandler>,
    closed: AtomicBool,
}

impl std::fmt::Debug for UnauthorizedRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnauthorizedRegistry")
            .field("subscribers", &self.handlers.len())
            .field("closed", &self.closed.load(Ordering::Acquire))
            .finish()
    }
}

impl UnauthorizedRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler. Handlers must return quickly; they run inline
    /// with the failing request.
    ///
    /// Registering on a closed registry yields an id whose handler is
    /// never called.
    pub fn register<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&DataError) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        if self.closed.load(Ordering::Acquire) {
            debug!(id, "registry closed, dropping unauthorized handler");
        } else {
            self.handlers.insert(id, Arc::new(handler));
        }
        SubscriptionId(id)
    }

    /// Register a channel subscriber for async consumers.
    pub fn register_channel(&self) -> (SubscriptionId, mpsc::UnboundedReceiver<DataError>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.register(move |err| {
            let _ = tx.send(err.clone());
        });
        (id, rx)
    }

    /// Remove a handler. Returns `false` if it was not registered.
    pub fn unregister(&self, id: SubscriptionId) -> bool {
        self.handlers.remove(&id.0).is_some()
    }

    /// Deliver `err` to every registered handler. Returns the number of
    /// handlers invoked.
    pub fn publish(&self, err: &DataError) -> usize {
        if self.closed.load(Ordering::Acquire) {
            return 0;
        }

        // Snapshot first: handlers may unregister themselves.
        let handlers: Vec<UnauthorizedHandler> = self
            .handlers
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();

        for handler in &handlers {
            handler(err);
        }
        trace!(delivered = handlers.len(), "unauthorized event published");
        handlers.len()
    }

    /// Drop every handler and refuse new ones.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.handlers.clear();
        debug!("unauthorized registry closed");
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;

    fn sample() -> DataError {
        DataError::response("Unauthorized", 401, "UNAUTHORIZED", "rejected")
    }

    #[test]
    fn publish_reaches_every_handler_once() {
        let registry = UnauthorizedRegistry::new();
        let hits = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let hits = Arc::clone(&hits);
            registry.register(move |_| {
                hits.fetch_add(1, Ordering::SeqCst);
            });
        }

        assert_eq!(registry.publish(&sample()), 3);
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn unregister_stops_delivery() {
        let registry = UnauthorizedRegistry::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let id = registry.register(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert!(registry.unregister(id));
        assert!(!registry.unregister(id));
        assert_eq!(registry.publish(&sample()), 0);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn close_drops_handlers_and_rejects_new_ones() {
        let registry = UnauthorizedRegistry::new();
        registry.register(|_| {});
        registry.close();

        assert!(registry.is_closed());
        assert!(registry.is_empty());
        registry.register(|_| {});
        assert!(registry.is_empty());
        assert_eq!(registry.publish(&sample()), 0);
    }

    #[test]
    fn handler_may_unregister_itself_during_publish() {
        let registry = Arc::new(UnauthorizedRegistry::new());
        let slot: Arc<std::sync::Mutex<Option<SubscriptionId>>> = Arc::default();

        let reg = Arc::clone(&registry);
        let own = Arc::clone(&slot);
        let id = registry.register(move |_| {
            if let Some(id) = own.lock().unwrap().take() {
                reg.unregister(id);
            }
        });
        *slot.lock().unwrap() = Some(id);

        assert_eq!(registry.publish(&sample()), 1);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn channel_subscriber_receives_error() {
        let registry = UnauthorizedRegistry::new();
        let (_id, mut rx) = registry.register_channel();

        registry.publish(&sample());
        let got = rx.recv().await.unwrap();
        assert_eq!(got.status_code(), Some(401));
    }
}
