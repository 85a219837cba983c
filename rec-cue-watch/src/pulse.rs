//! Payload-less activity pulses and their subscriber list.
//!
//! Handlers are cloned out of the list before being invoked, so a handler may
//! subscribe or unsubscribe (itself included) without deadlocking.

use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

type PulseHandler = Arc<dyn Fn() + Send + Sync>;

/// Handle returned by `subscribe`, used to unsubscribe later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Ordered list of pulse handlers.
#[derive(Default)]
pub struct PulseListeners {
    next_id: AtomicU64,
    handlers: Mutex<Vec<(SubscriptionId, PulseHandler)>>,
}

impl std::fmt::Debug for PulseListeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PulseListeners")
            .field("subscribers", &self.len())
            .finish()
    }
}

impl PulseListeners {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler`; it runs on whichever thread emits the pulse.
    pub fn subscribe(&self, handler: impl Fn() + Send + Sync + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.handlers.lock().push((id, Arc::new(handler)));
        id
    }

    /// Remove a handler. Returns false if `id` was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut handlers = self.handlers.lock();
        let before = handlers.len();
        handlers.retain(|(existing, _)| *existing != id);
        handlers.len() != before
    }

    /// Invoke every handler once, in subscription order.
    pub fn emit(&self) {
        let handlers: Vec<PulseHandler> = self
            .handlers
            .lock()
            .iter()
            .map(|(_, handler)| Arc::clone(handler))
            .collect();
        for handler in handlers {
            handler();
        }
    }

    pub fn clear(&self) {
        self.handlers.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.handlers.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_emit_reaches_every_subscriber() {
        let listeners = PulseListeners::new();
        let count = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let count = Arc::clone(&count);
            listeners.subscribe(move || {
                count.fetch_add(1, Ordering::SeqCst);
            });
        }
        listeners.emit();
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let listeners = PulseListeners::new();
        let count = Arc::new(AtomicUsize::new(0));
        let id = {
            let count = Arc::clone(&count);
            listeners.subscribe(move || {
                count.fetch_add(1, Ordering::SeqCst);
            })
        };
        assert!(listeners.unsubscribe(id));
        assert!(!listeners.unsubscribe(id));
        listeners.emit();
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert!(listeners.is_empty());
    }

    #[test]
    fn test_handler_may_unsubscribe_during_emit() {
        let listeners = Arc::new(PulseListeners::new());
        let id_slot: Arc<Mutex<Option<SubscriptionId>>> = Arc::new(Mutex::new(None));
        let id = {
            let inner = Arc::clone(&listeners);
            let id_slot = Arc::clone(&id_slot);
            listeners.subscribe(move || {
                if let Some(id) = *id_slot.lock() {
                    inner.unsubscribe(id);
                }
            })
        };
        *id_slot.lock() = Some(id);
        listeners.emit();
        assert!(listeners.is_empty());
    }
}
