//! Change-notification callbacks for attribute and index buffers.

/// Handle returned when registering a listener, used to remove it again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut() + Send>;

/// Registry of argument-less callbacks fired after a buffer mutation.
///
/// Callbacks run synchronously, in registration order, after the buffer
/// reached its new state and before the mutating call returns.
#[derive(Default)]
pub struct ChangeListeners {
    next_id: u64,
    listeners: Vec<(ListenerId, Listener)>,
}

impl ChangeListeners {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback.
    pub fn add(&mut self, listener: impl FnMut() + Send + 'static) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Unregister a callback. Returns `false` if it was not registered.
    pub fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    /// Invoke every registered callback once.
    pub fn notify(&mut self) {
        for (_, listener) in &mut self.listeners {
            listener();
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl std::fmt::Debug for ChangeListeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeListeners")
            .field("count", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn test_add_notify_remove() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut listeners = ChangeListeners::new();

        let counter = Arc::clone(&calls);
        let id = listeners.add(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(listeners.len(), 1);

        listeners.notify();
        listeners.notify();
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        assert!(listeners.remove(id));
        assert!(!listeners.remove(id));
        listeners.notify();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(listeners.is_empty());
    }

    #[test]
    fn test_listener_ids_are_unique() {
        let mut listeners = ChangeListeners::new();
        let a = listeners.add(|| {});
        let b = listeners.add(|| {});
        assert_ne!(a, b);
        assert!(listeners.remove(a));
        assert_eq!(listeners.len(), 1);
    }
}
