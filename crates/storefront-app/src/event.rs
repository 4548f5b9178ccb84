//! Aggregated state change stream.

use storefront_auth::SessionEvent;
use storefront_cache::CacheEvent;
use storefront_commerce::cart::CartEvent;
use storefront_commerce::search::FilterState;

/// One state transition from any container, in the order it was applied.
#[derive(Debug, Clone)]
pub enum StateEvent {
    Session(SessionEvent),
    Cache(CacheEvent),
    Cart(CartEvent),
    Filter(FilterState),
}

impl StateEvent {
    /// Short label for logs.
    pub fn source(&self) -> &'static str {
        match self {
            StateEvent::Session(_) => "session",
            StateEvent::Cache(_) => "cache",
            StateEvent::Cart(_) => "cart",
            StateEvent::Filter(_) => "filter",
        }
    }
}
