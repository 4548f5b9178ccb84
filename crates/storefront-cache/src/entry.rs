//! Cache entry snapshots.

use std::any::Any;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::{CacheKey, FetchError, Payload, Tag};

/// Lifecycle of a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// Created or invalidated, no operation running.
    Uninitialized,
    /// An operation is in flight.
    Loading,
    Success,
    Error,
}

impl CacheStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Uninitialized => "uninitialized",
            CacheStatus::Loading => "loading",
            CacheStatus::Success => "success",
            CacheStatus::Error => "error",
        }
    }

    /// Check if the last operation finished.
    pub fn is_settled(&self) -> bool {
        matches!(self, CacheStatus::Success | CacheStatus::Error)
    }
}

impl fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time view of a cache entry.
///
/// A failed refetch keeps the last successful value alongside the error.
#[derive(Clone)]
pub struct CacheEntry {
    pub key: CacheKey,
    pub endpoint: String,
    pub tags: BTreeSet<Tag>,
    pub status: CacheStatus,
    pub value: Option<Payload>,
    pub error: Option<FetchError>,
    pub subscriber_count: usize,
    /// Monotonic per key; bumped by every new operation and invalidation.
    pub generation: u64,
    pub fulfilled_at: Option<DateTime<Utc>>,
}

impl CacheEntry {
    /// The value downcast to its transformed type.
    pub fn value_as<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.value.clone()?.downcast::<T>().ok()
    }

    pub fn is_loading(&self) -> bool {
        self.status == CacheStatus::Loading
    }

    pub fn is_success(&self) -> bool {
        self.status == CacheStatus::Success
    }

    pub fn is_error(&self) -> bool {
        self.status == CacheStatus::Error
    }

    pub fn has_tag(&self, tag: &Tag) -> bool {
        self.tags.contains(tag)
    }
}

impl fmt::Debug for CacheEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheEntry")
            .field("key", &self.key)
            .field("status", &self.status)
            .field("has_value", &self.value.is_some())
            .field("error", &self.error)
            .field("subscriber_count", &self.subscriber_count)
            .field("generation", &self.generation)
            .field("fulfilled_at", &self.fulfilled_at)
            .finish()
    }
}

/// Change notification published on the cache's event bus.
#[derive(Debug, Clone)]
pub enum CacheEvent {
    /// An entry changed status or value.
    Updated(CacheEntry),
    /// An unused entry was destroyed.
    Evicted(CacheKey),
}

impl CacheEvent {
    pub fn key(&self) -> &CacheKey {
        match self {
            CacheEvent::Updated(entry) => &entry.key,
            CacheEvent::Evicted(key) => key,
        }
    }
}
