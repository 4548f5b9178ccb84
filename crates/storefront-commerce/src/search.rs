//! Client-side search over cached collections.
//!
//! Views are recomputed from the cached collection and the current
//! [`FilterState`], never stored, and memoized on the pair
//! (collection identity, search term).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};

/// Transient search input shared by every view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    pub search_term: String,
}

impl FilterState {
    pub fn new(search_term: impl Into<String>) -> Self {
        Self {
            search_term: search_term.into(),
        }
    }

    /// The term as matched: trimmed and lowercased.
    pub fn normalized_term(&self) -> String {
        self.search_term.trim().to_lowercase()
    }

    pub fn is_empty(&self) -> bool {
        self.search_term.trim().is_empty()
    }
}

/// Records that can be matched by the search term.
pub trait Searchable {
    /// Name, description and category, in that order.
    fn search_fields(&self) -> [&str; 3];

    /// Case-insensitive substring match on any search field.
    ///
    /// `needle` must already be lowercased.
    fn matches(&self, needle: &str) -> bool {
        self.search_fields()
            .iter()
            .any(|field| field.to_lowercase().contains(needle))
    }
}

/// Filter `items` by `filter`, preserving order.
pub fn filter_items<T: Searchable + Clone>(items: &[T], filter: &FilterState) -> Vec<T> {
    let needle = filter.normalized_term();
    if needle.is_empty() {
        return items.to_vec();
    }
    items.iter().filter(|item| item.matches(&needle)).cloned().collect()
}

struct Memo<T> {
    source: Arc<Vec<T>>,
    term: String,
    view: Arc<Vec<T>>,
}

/// Memoized filtered projection of a shared collection.
///
/// The source is never mutated. An empty term yields the source itself.
pub struct DerivedView<T> {
    memo: Mutex<Option<Memo<T>>>,
    recomputations: AtomicUsize,
}

impl<T: Searchable + Clone> DerivedView<T> {
    pub fn new() -> Self {
        Self {
            memo: Mutex::new(None),
            recomputations: AtomicUsize::new(0),
        }
    }

    /// The view of `source` under `filter`.
    pub fn get(&self, source: &Arc<Vec<T>>, filter: &FilterState) -> Arc<Vec<T>> {
        let term = filter.normalized_term();
        let mut memo = self.memo.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(memo) = memo.as_ref() {
            if Arc::ptr_eq(&memo.source, source) && memo.term == term {
                return Arc::clone(&memo.view);
            }
        }

        let view = if term.is_empty() {
            Arc::clone(source)
        } else {
            Arc::new(filter_items(source, filter))
        };
        let count = self.recomputations.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::debug!(
            term = %term,
            total = source.len(),
            visible = view.len(),
            recomputations = count,
            "derived view recomputed"
        );

        *memo = Some(Memo {
            source: Arc::clone(source),
            term,
            view: Arc::clone(&view),
        });
        view
    }

    /// Number of times the view was actually recomputed.
    pub fn recomputations(&self) -> usize {
        self.recomputations.load(Ordering::Relaxed)
    }

    /// Drop the memo so the next `get` recomputes.
    pub fn reset(&self) {
        *self.memo.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl<T: Searchable + Clone> Default for DerivedView<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for DerivedView<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedView")
            .field("recomputations", &self.recomputations.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        id: u32,
        title: &'static str,
        description: &'static str,
        category: &'static str,
    }

    impl Searchable for Item {
        fn search_fields(&self) -> [&str; 3] {
            [self.title, self.description, self.category]
        }
    }

    fn item(id: u32, title: &'static str) -> Item {
        Item {
            id,
            title,
            description: "",
            category: "",
        }
    }

    fn shirts_and_hats() -> Arc<Vec<Item>> {
        Arc::new(vec![item(1, "Red Shirt"), item(2, "Blue Hat")])
    }

    #[test]
    fn test_empty_term_is_identity() {
        let items = shirts_and_hats();
        assert_eq!(filter_items(&items, &FilterState::default()), *items);

        let view = DerivedView::new();
        assert!(Arc::ptr_eq(&view.get(&items, &FilterState::new("  ")), &items));
    }

    #[test]
    fn test_term_filters_case_insensitively() {
        let items = shirts_and_hats();
        let visible = filter_items(&items, &FilterState::new("red"));
        assert_eq!(visible, vec![item(1, "Red Shirt")]);

        let zeus = vec![item(1, "the zeus backpack")];
        assert_eq!(filter_items(&zeus, &FilterState::new("ZEUS")).len(), 1);
    }

    #[test]
    fn test_no_match_is_empty() {
        let items = shirts_and_hats();
        assert!(filter_items(&items, &FilterState::new("socks")).is_empty());
    }

    #[test]
    fn test_matches_description_and_category() {
        let items = vec![
            Item {
                id: 1,
                title: "Backpack",
                description: "Fits 15 inch laptops",
                category: "bags",
            },
            Item {
                id: 2,
                title: "Ring",
                description: "Silver",
                category: "jewelery",
            },
        ];
        assert_eq!(filter_items(&items, &FilterState::new("LAPTOP"))[0].id, 1);
        assert_eq!(filter_items(&items, &FilterState::new("jewel"))[0].id, 2);
    }

    #[test]
    fn test_memoized_on_source_and_term() {
        let items = shirts_and_hats();
        let view = DerivedView::new();

        let first = view.get(&items, &FilterState::new("hat"));
        let again = view.get(&items, &FilterState::new("hat"));
        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!(view.recomputations(), 1);

        view.get(&items, &FilterState::new("shirt"));
        assert_eq!(view.recomputations(), 2);

        let refetched = shirts_and_hats();
        view.get(&refetched, &FilterState::new("shirt"));
        assert_eq!(view.recomputations(), 3);
    }

    #[test]
    fn test_source_untouched() {
        let items = shirts_and_hats();
        let view = DerivedView::new();
        view.get(&items, &FilterState::new("red"));
        assert_eq!(items.len(), 2);
    }
}
