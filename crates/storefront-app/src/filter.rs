//! Holder for the transient search input.

use std::sync::{Mutex, PoisonError};

use storefront_commerce::search::FilterState;
use storefront_core::{EventBus, Subscription};

/// Process-wide filter state. Not persisted.
#[derive(Debug, Default)]
pub struct FilterStore {
    state: Mutex<FilterState>,
    events: EventBus<FilterState>,
}

impl FilterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> FilterState {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the search term. Returns `false`, and publishes nothing, when
    /// the term is unchanged.
    pub fn set_search_term(&self, term: impl Into<String>) -> bool {
        let term = term.into();
        let next = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if state.search_term == term {
                return false;
            }
            state.search_term = term;
            state.clone()
        };
        tracing::debug!(term = %next.search_term, "search term changed");
        self.events.emit(&next);
        true
    }

    pub fn clear(&self) -> bool {
        self.set_search_term(String::new())
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&FilterState) + Send + Sync + 'static,
    {
        self.events.subscribe(listener)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn test_set_and_clear() {
        let store = FilterStore::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let _sub = {
            let seen = Arc::clone(&seen);
            store.subscribe(move |state| seen.lock().unwrap().push(state.search_term.clone()))
        };

        assert!(store.set_search_term("red"));
        assert!(!store.set_search_term("red"));
        assert_eq!(store.current().search_term, "red");
        assert!(store.clear());
        assert!(store.current().is_empty());

        assert_eq!(*seen.lock().unwrap(), vec!["red".to_string(), String::new()]);
    }
}
