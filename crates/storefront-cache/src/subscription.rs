//! Per-entry update streams.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::channel::mpsc::UnboundedReceiver;
use futures::{Stream, StreamExt};
use storefront_core::Subscription;

use crate::{CacheEntry, CacheKey};

/// Stream of snapshots for one cache entry.
///
/// Yields the entry as it was at subscription time, then one snapshot per
/// change. Holding the subscription keeps the entry from being evicted;
/// dropping it releases the entry.
#[must_use = "dropping the subscription releases the entry immediately"]
pub struct EntrySubscription {
    key: CacheKey,
    updates: UnboundedReceiver<CacheEntry>,
    _release: Subscription,
}

impl EntrySubscription {
    pub(crate) fn new(
        key: CacheKey,
        updates: UnboundedReceiver<CacheEntry>,
        release: Subscription,
    ) -> Self {
        Self {
            key,
            updates,
            _release: release,
        }
    }

    /// Key of the subscribed entry.
    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    /// Wait for the next snapshot whose operation has finished.
    pub async fn settled(&mut self) -> Option<CacheEntry> {
        while let Some(entry) = self.next().await {
            if entry.status.is_settled() {
                return Some(entry);
            }
        }
        None
    }

    /// Release the entry.
    pub fn unsubscribe(self) {}
}

impl Stream for EntrySubscription {
    type Item = CacheEntry;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.updates.poll_next_unpin(cx)
    }
}

impl std::fmt::Debug for EntrySubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntrySubscription")
            .field("key", &self.key)
            .finish()
    }
}
