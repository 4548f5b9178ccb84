//! Resource cache for the storefront state engine.
//!
//! This crate provides:
//! - `ResourceCache` - Async fetch cache keyed by endpoint and parameters
//! - `Endpoint` - Query/mutation definitions with tags and transforms
//! - `ResourceRequest` / `CacheKey` / `Tag` - Request identity
//! - `EntrySubscription` - Stream of updates for one entry
//! - `EvictionPolicy` - When unused entries are destroyed
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use storefront_cache::{Endpoint, JsonTransform, ResourceCache, ResourceRequest};
//!
//! let cache = ResourceCache::builder(remote)
//!     .endpoint(
//!         Endpoint::query("getAllProducts", "/products")
//!             .provides("Products")
//!             .transform(JsonTransform::<Vec<Product>>::new(1)),
//!     )
//!     .build()?;
//!
//! // Concurrent fetches of the same key share one remote call.
//! let entry = cache.fetch(ResourceRequest::new("getAllProducts"))?.await;
//! let products = entry.value_as::<Vec<Product>>();
//!
//! // Subscribed entries carrying the tag are refetched immediately.
//! cache.invalidate(&"Products".into());
//! ```

mod cache;
mod endpoint;
mod entry;
mod error;
mod key;
mod policy;
mod subscription;

pub use cache::{FetchHandle, MutationHandle, ResourceCache, ResourceCacheBuilder, TokenSource};
pub use endpoint::{Endpoint, EndpointKind, FnTransform, JsonTransform, Payload, Transform};
pub use entry::{CacheEntry, CacheEvent, CacheStatus};
pub use error::{CacheError, FetchError, TransformError};
pub use key::{CacheKey, Params, ResourceRequest, Tag};
pub use policy::EvictionPolicy;
pub use subscription::EntrySubscription;
