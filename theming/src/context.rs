//! Observable preference values

use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Identifies one listener registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Shared<T> {
    value: RwLock<T>,
    listeners: Mutex<Vec<(SubscriptionId, Listener<T>)>>,
    next_id: AtomicU64,
    closed: AtomicBool,
}

/// A preference value that notifies listeners when it changes.
///
/// Owned explicitly by whoever wires the application together and handed to
/// the components that read it. Clones share the same value.
pub struct PreferenceContext<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for PreferenceContext<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> PreferenceContext<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Create a context holding `initial`
    pub fn new(initial: T) -> Self {
        Self {
            shared: Arc::new(Shared {
                value: RwLock::new(initial),
                listeners: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(1),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Current value
    pub fn get(&self) -> T {
        self.shared.value.read().clone()
    }

    /// Replace the value and notify listeners.
    ///
    /// Returns `false` without notifying when the value is unchanged.
    pub fn set(&self, value: T) -> bool {
        {
            let mut current = self.shared.value.write();
            if *current == value {
                return false;
            }
            *current = value.clone();
        }

        // Listeners may call back into the context
        let listeners: Vec<Listener<T>> = self
            .shared
            .listeners
            .lock()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            listener(&value);
        }
        true
    }

    /// Call `listener` with every new value
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.shared.next_id.fetch_add(1, Ordering::Relaxed));
        if self.shared.closed.load(Ordering::Acquire) {
            warn!("Ignoring subscription to a context that was shut down");
            return id;
        }
        self.shared.listeners.lock().push((id, Arc::new(listener)));
        id
    }

    /// Remove a listener. Returns `true` if it was registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.shared.listeners.lock();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    /// Drop every listener and refuse new ones
    pub fn shutdown(&self) {
        self.shared.closed.store(true, Ordering::Release);
        let dropped = std::mem::take(&mut *self.shared.listeners.lock()).len();
        debug!("Preference context shut down, dropped {} listener(s)", dropped);
    }

    pub fn listener_count(&self) -> usize {
        self.shared.listeners.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_set_notifies_listeners() {
        let context = PreferenceContext::new("zh-CN".to_string());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        context.subscribe(move |value: &String| sink.lock().push(value.clone()));

        assert!(context.set("en".to_string()));
        assert!(!context.set("en".to_string()));

        assert_eq!(context.get(), "en");
        assert_eq!(*seen.lock(), vec!["en".to_string()]);
    }

    #[test]
    fn test_unsubscribe() {
        let context = PreferenceContext::new(0u32);
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let id = context.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        context.set(1);
        assert!(context.unsubscribe(id));
        assert!(!context.unsubscribe(id));
        context.set(2);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_shutdown_drops_listeners() {
        let context = PreferenceContext::new(false);
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        context.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        context.shutdown();
        assert_eq!(context.listener_count(), 0);

        let counter = calls.clone();
        context.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert!(context.set(true));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(context.get());
    }

    #[test]
    fn test_listener_may_read_context() {
        let context = PreferenceContext::new(1i32);
        let reader = context.clone();
        let seen = Arc::new(Mutex::new(None));
        let sink = seen.clone();
        context.subscribe(move |_| *sink.lock() = Some(reader.get()));

        context.set(5);
        assert_eq!(*seen.lock(), Some(5));
    }
}
