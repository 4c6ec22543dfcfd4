//! Subscriber registry for [`AppState`](super::AppState) change notifications.
//!
//! Observers receive the state by shared reference, so they can read every
//! accessor but cannot call a mutator from inside their own notification.
//! Notification order is unspecified; an observer must not assume another one
//! has already refreshed.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use super::state::AppState;

pub trait Observer {
    fn on_state_change(&self, state: &AppState);
}

impl<F> Observer for F
where
    F: Fn(&AppState),
{
    fn on_state_change(&self, state: &AppState) {
        self(state)
    }
}

pub type ObserverHandle = Rc<dyn Observer>;

/// Set of observer handles keyed by pointer identity. Subscribing the same
/// handle twice keeps a single entry.
#[derive(Default)]
pub struct ObserverRegistry {
    observers: IndexMap<usize, ObserverHandle>,
}

impl fmt::Debug for ObserverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverRegistry")
            .field("len", &self.observers.len())
            .finish()
    }
}

fn handle_key(handle: &ObserverHandle) -> usize {
    Rc::as_ptr(handle) as *const () as usize
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when the handle was already registered.
    pub fn subscribe(&mut self, handle: ObserverHandle) -> bool {
        let key = handle_key(&handle);
        if self.observers.contains_key(&key) {
            return false;
        }
        self.observers.insert(key, handle);
        true
    }

    pub fn unsubscribe(&mut self, handle: &ObserverHandle) -> bool {
        self.observers.swap_remove(&handle_key(handle)).is_some()
    }

    pub fn contains(&self, handle: &ObserverHandle) -> bool {
        self.observers.contains_key(&handle_key(handle))
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    pub fn notify(&self, state: &AppState) {
        for observer in self.observers.values() {
            observer.on_state_change(state);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[test]
    fn duplicate_subscription_is_idempotent() {
        let mut registry = ObserverRegistry::new();
        let handle: ObserverHandle = Rc::new(|_: &AppState| {});
        assert!(registry.subscribe(handle.clone()));
        assert!(!registry.subscribe(handle.clone()));
        assert_eq!(registry.len(), 1);
        assert!(registry.unsubscribe(&handle));
        assert!(!registry.unsubscribe(&handle));
        assert!(registry.is_empty());
    }

    #[test]
    fn notify_reaches_each_observer_once() {
        let state = AppState::new(Vec::new());
        let counter = Rc::new(Cell::new(0));
        let mut registry = ObserverRegistry::new();
        for _ in 0..3 {
            let counter = counter.clone();
            registry.subscribe(Rc::new(move |_: &AppState| counter.set(counter.get() + 1)));
        }
        registry.notify(&state);
        assert_eq!(counter.get(), 3);
    }
}
