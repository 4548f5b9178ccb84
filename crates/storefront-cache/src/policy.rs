//! Eviction policy for unused entries.

use std::time::Duration;

use storefront_core::CacheConfig;

/// How long an entry with no subscribers survives.
///
/// Entries with an operation in flight are never evicted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvictionPolicy {
    keep_unused_for: Option<Duration>,
}

impl EvictionPolicy {
    /// Evict after the entry has been unused for `duration`.
    pub fn after(duration: Duration) -> Self {
        Self {
            keep_unused_for: Some(duration),
        }
    }

    /// Evict as soon as the last subscriber leaves.
    pub fn immediate() -> Self {
        Self::after(Duration::ZERO)
    }

    /// Keep unused entries until [`ResourceCache::sweep`](crate::ResourceCache::sweep).
    pub fn never() -> Self {
        Self {
            keep_unused_for: None,
        }
    }

    pub fn keep_unused_for(&self) -> Option<Duration> {
        self.keep_unused_for
    }
}

impl Default for EvictionPolicy {
    fn default() -> Self {
        Self::after(Duration::from_secs(60))
    }
}

impl From<&CacheConfig> for EvictionPolicy {
    fn from(config: &CacheConfig) -> Self {
        match config.keep_unused_for() {
            Some(duration) => Self::after(duration),
            None => Self::never(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        assert_eq!(
            EvictionPolicy::default().keep_unused_for(),
            Some(Duration::from_secs(60))
        );
    }

    #[test]
    fn test_from_config() {
        let config = CacheConfig {
            evict_unused: false,
            keep_unused_for_secs: 5,
        };
        assert_eq!(EvictionPolicy::from(&config), EvictionPolicy::never());

        let config = CacheConfig {
            evict_unused: true,
            keep_unused_for_secs: 5,
        };
        assert_eq!(
            EvictionPolicy::from(&config),
            EvictionPolicy::after(Duration::from_secs(5))
        );
    }
}
