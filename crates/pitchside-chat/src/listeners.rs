//! Listener registry behind `ChatSession::subscribe`.

use std::sync::{Arc, Mutex, PoisonError, Weak};

use pitchside_core::events::ChatEvent;

/// Callback invoked synchronously for every session event.
pub type Listener = Arc<dyn Fn(&ChatEvent) + Send + Sync>;

#[derive(Default)]
pub(crate) struct ListenerRegistry {
    inner: Mutex<RegistryInner>,
}

#[derive(Default)]
struct RegistryInner {
    next_id: u64,
    listeners: Vec<(u64, Listener)>,
}

impl ListenerRegistry {
    pub(crate) fn add(self: &Arc<Self>, listener: Listener) -> Subscription {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let id = inner.next_id;
        inner.next_id += 1;
        inner.listeners.push((id, listener));
        Subscription {
            id,
            registry: Arc::downgrade(self),
        }
    }

    fn remove(&self, id: u64) -> bool {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let before = inner.listeners.len();
        inner.listeners.retain(|(lid, _)| *lid != id);
        inner.listeners.len() != before
    }

    pub(crate) fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .listeners
            .len()
    }

    /// Deliver events in order. The registry lock is not held while
    /// listeners run, so a listener may subscribe or unsubscribe.
    pub(crate) fn emit(&self, events: &[ChatEvent]) {
        if events.is_empty() {
            return;
        }
        let listeners: Vec<Listener> = {
            let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            inner.listeners.iter().map(|(_, l)| Arc::clone(l)).collect()
        };
        for event in events {
            tracing::trace!(event = event.event_name(), "Dispatching chat event");
            for listener in &listeners {
                listener(event);
            }
        }
    }
}

/// Handle returned by `subscribe`.
///
/// Dropping the handle keeps the listener registered; call
/// [`Subscription::unsubscribe`] to remove it.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    registry: Weak<ListenerRegistry>,
}

impl Subscription {
    /// Remove the listener. Returns false if the session is already gone.
    pub fn unsubscribe(self) -> bool {
        match self.registry.upgrade() {
            Some(registry) => registry.remove(self.id),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pitchside_core::types::Timestamp;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use uuid::Uuid;

    fn cancelled() -> ChatEvent {
        ChatEvent::ResponseCancelled {
            session_id: Uuid::new_v4(),
            timestamp: Timestamp::now(),
        }
    }

    fn counting(counter: &Arc<AtomicUsize>) -> Listener {
        let counter = Arc::clone(counter);
        Arc::new(move |_: &ChatEvent| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_emit_reaches_every_listener() {
        let registry = Arc::new(ListenerRegistry::default());
        let a = Arc::new(AtomicUsize::new(0));
        let b = Arc::new(AtomicUsize::new(0));
        let _sa = registry.add(counting(&a));
        let _sb = registry.add(counting(&b));

        registry.emit(&[cancelled(), cancelled()]);

        assert_eq!(a.load(Ordering::SeqCst), 2);
        assert_eq!(b.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let registry = Arc::new(ListenerRegistry::default());
        let count = Arc::new(AtomicUsize::new(0));
        let sub = registry.add(counting(&count));

        assert!(sub.unsubscribe());
        registry.emit(&[cancelled()]);

        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_dropping_handle_keeps_listener() {
        let registry = Arc::new(ListenerRegistry::default());
        let count = Arc::new(AtomicUsize::new(0));
        drop(registry.add(counting(&count)));

        registry.emit(&[cancelled()]);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unsubscribe_after_registry_dropped() {
        let registry = Arc::new(ListenerRegistry::default());
        let sub = registry.add(Arc::new(|_: &ChatEvent| {}));
        drop(registry);
        assert!(!sub.unsubscribe());
    }

    #[test]
    fn test_listener_may_subscribe_during_emit() {
        let registry = Arc::new(ListenerRegistry::default());
        let inner = Arc::clone(&registry);
        let _sub = registry.add(Arc::new(move |_: &ChatEvent| {
            let _ = inner.add(Arc::new(|_: &ChatEvent| {}));
        }));

        registry.emit(&[cancelled()]);
        assert_eq!(registry.len(), 2);
    }
}
