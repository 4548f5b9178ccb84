//! Resource cache with request deduplication and tag invalidation.
//!
//! Every entry carries a generation counter. Starting an operation or
//! invalidating the entry bumps it, and a completing operation is applied
//! only if its generation is still current. A superseded completion is
//! dropped and its awaiters follow whatever operation replaced it,
//! starting one if an invalidation left the entry idle.

use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};
use std::time::Duration;

use chrono::Utc;
use futures::channel::mpsc::{self, UnboundedSender};
use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use storefront_core::{EventBus, Subscription, ValidationError};
use storefront_data::{Remote, RemoteCall};
use tokio::time::Instant;

use crate::{
    CacheEntry, CacheError, CacheEvent, CacheKey, CacheStatus, Endpoint, EndpointKind,
    EntrySubscription, EvictionPolicy, FetchError, Payload, ResourceRequest, Tag,
};

/// Supplies the bearer token for authorized endpoints.
pub type TokenSource = Arc<dyn Fn() -> Option<String> + Send + Sync>;

type InFlight = Shared<BoxFuture<'static, CacheEntry>>;

struct Slot {
    key: CacheKey,
    request: ResourceRequest,
    endpoint: Arc<Endpoint>,
    tags: BTreeSet<Tag>,
    status: CacheStatus,
    value: Option<Payload>,
    error: Option<FetchError>,
    generation: u64,
    fulfilled_at: Option<chrono::DateTime<Utc>>,
    in_flight: Option<InFlight>,
    subscribers: Vec<(u64, UnboundedSender<CacheEntry>)>,
    unused_since: Option<Instant>,
}

impl Slot {
    fn new(key: CacheKey, request: ResourceRequest, endpoint: Arc<Endpoint>) -> Self {
        let tags = endpoint
            .provided_tags()
            .iter()
            .chain(request.tags())
            .cloned()
            .collect();
        Self {
            key,
            request,
            endpoint,
            tags,
            status: CacheStatus::Uninitialized,
            value: None,
            error: None,
            generation: 0,
            fulfilled_at: None,
            in_flight: None,
            subscribers: Vec::new(),
            unused_since: Some(Instant::now()),
        }
    }

    fn snapshot(&self) -> CacheEntry {
        CacheEntry {
            key: self.key.clone(),
            endpoint: self.endpoint.name().to_string(),
            tags: self.tags.clone(),
            status: self.status,
            value: self.value.clone(),
            error: self.error.clone(),
            subscriber_count: self.subscribers.len(),
            generation: self.generation,
            fulfilled_at: self.fulfilled_at,
        }
    }

    /// Send the current snapshot to every subscriber and return it.
    fn publish(&self) -> CacheEntry {
        let entry = self.snapshot();
        for (_, updates) in &self.subscribers {
            // A closed receiver is released by its subscription's drop.
            let _ = updates.unbounded_send(entry.clone());
        }
        entry
    }

    fn is_evictable(&self, keep_unused_for: Duration) -> bool {
        self.subscribers.is_empty()
            && self.in_flight.is_none()
            && self.status != CacheStatus::Loading
            && self
                .unused_since
                .is_some_and(|since| since.elapsed() >= keep_unused_for)
    }
}

#[derive(Default)]
struct CacheState {
    slots: HashMap<CacheKey, Slot>,
    next_subscriber: u64,
}

enum Next {
    Follow(InFlight),
    Done(CacheEntry),
}

struct Inner {
    remote: Arc<dyn Remote>,
    endpoints: HashMap<String, Arc<Endpoint>>,
    eviction: EvictionPolicy,
    token_source: Option<TokenSource>,
    state: Mutex<CacheState>,
    events: EventBus<CacheEvent>,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn token(&self) -> Option<String> {
        self.token_source.as_ref().and_then(|source| source())
    }

    fn emit(&self, events: Vec<CacheEvent>) {
        for event in &events {
            self.events.emit(event);
        }
    }

    fn resolve(
        &self,
        request: &ResourceRequest,
        kind: EndpointKind,
    ) -> Result<Arc<Endpoint>, ValidationError> {
        request.validate()?;
        let endpoint = self
            .endpoints
            .get(request.endpoint())
            .ok_or_else(|| ValidationError::UnknownEndpoint(request.endpoint().to_string()))?;
        if endpoint.kind() != kind {
            return Err(ValidationError::WrongEndpointKind {
                endpoint: endpoint.name().to_string(),
                expected: kind.as_str(),
                actual: endpoint.kind().as_str(),
            });
        }
        Ok(Arc::clone(endpoint))
    }

    /// Start a new operation for the slot, superseding any in flight.
    ///
    /// Called with the state lock held; the caller emits the returned
    /// snapshot once the lock is released.
    fn start(self: &Arc<Self>, slot: &mut Slot, call: RemoteCall) -> (InFlight, CacheEntry) {
        slot.generation += 1;
        slot.status = CacheStatus::Loading;
        slot.error = None;

        let generation = slot.generation;
        let key = slot.key.clone();
        let endpoint = Arc::clone(&slot.endpoint);
        let inner = Arc::clone(self);
        let operation = async move {
            let outcome = match inner.remote.send(call).await {
                Ok(raw) => endpoint.shape(raw),
                Err(e) => Err(FetchError::from_remote(e, endpoint.name())),
            };
            inner.complete(&key, &endpoint, generation, outcome).await
        }
        .boxed()
        .shared();

        slot.in_flight = Some(operation.clone());
        tracing::debug!(key = %slot.key, generation, "fetch started");

        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(operation.clone());
            }
            Err(_) => tracing::debug!(key = %slot.key, "no async runtime, fetch runs when awaited"),
        }

        (operation, slot.publish())
    }

    async fn complete(
        self: &Arc<Self>,
        key: &CacheKey,
        endpoint: &Endpoint,
        generation: u64,
        outcome: Result<Payload, FetchError>,
    ) -> CacheEntry {
        let token = self.token();
        let (next, events, idle) = {
            let mut state = self.lock();
            match state.slots.get_mut(key) {
                None => (
                    Next::Done(detached(key, endpoint, generation, outcome)),
                    Vec::new(),
                    false,
                ),
                Some(slot) if slot.generation != generation => {
                    tracing::debug!(
                        %key,
                        generation,
                        current = slot.generation,
                        "discarding superseded result"
                    );
                    match slot.in_flight.clone() {
                        Some(newer) => (Next::Follow(newer), Vec::new(), false),
                        // Invalidated with nobody subscribed: refetch for the awaiters.
                        None => match slot.endpoint.build_call(&slot.request, token) {
                            Ok(call) => {
                                let (newer, entry) = self.start(slot, call);
                                (Next::Follow(newer), vec![CacheEvent::Updated(entry)], false)
                            }
                            Err(error) => {
                                tracing::warn!(%key, %error, "cannot refetch invalidated entry");
                                (Next::Done(slot.snapshot()), Vec::new(), false)
                            }
                        },
                    }
                }
                Some(slot) => {
                    slot.in_flight = None;
                    match outcome {
                        Ok(value) => {
                            tracing::debug!(%key, generation, "fetch succeeded");
                            slot.status = CacheStatus::Success;
                            slot.value = Some(value);
                            slot.fulfilled_at = Some(Utc::now());
                        }
                        Err(error) => {
                            tracing::warn!(%key, generation, %error, "fetch failed");
                            slot.status = CacheStatus::Error;
                            slot.error = Some(error);
                        }
                    }
                    let idle = slot.subscribers.is_empty();
                    if idle {
                        slot.unused_since = Some(Instant::now());
                    }
                    let entry = slot.publish();
                    (Next::Done(entry.clone()), vec![CacheEvent::Updated(entry)], idle)
                }
            }
        };

        self.emit(events);
        if idle {
            self.schedule_eviction();
        }

        match next {
            Next::Follow(newer) => newer.await,
            Next::Done(entry) => entry,
        }
    }

    fn release(self: &Arc<Self>, key: &CacheKey, id: u64) {
        let idle = {
            let mut state = self.lock();
            match state.slots.get_mut(key) {
                Some(slot) => {
                    let before = slot.subscribers.len();
                    slot.subscribers.retain(|(subscriber, _)| *subscriber != id);
                    let idle = before > 0 && slot.subscribers.is_empty();
                    if idle {
                        slot.unused_since = Some(Instant::now());
                    }
                    idle
                }
                None => false,
            }
        };

        if idle {
            tracing::debug!(%key, "entry unused");
            self.schedule_eviction();
        }
    }

    fn schedule_eviction(self: &Arc<Self>) {
        match self.eviction.keep_unused_for() {
            None => {}
            Some(delay) if delay.is_zero() => {
                self.sweep();
            }
            Some(delay) => match tokio::runtime::Handle::try_current() {
                Ok(runtime) => {
                    let inner = Arc::downgrade(self);
                    runtime.spawn(async move {
                        tokio::time::sleep(delay).await;
                        if let Some(inner) = inner.upgrade() {
                            inner.sweep();
                        }
                    });
                }
                Err(_) => tracing::debug!("no async runtime, unused entries wait for a sweep"),
            },
        }
    }

    fn sweep(&self) -> usize {
        let keep_unused_for = self.eviction.keep_unused_for().unwrap_or(Duration::ZERO);
        let evicted: Vec<CacheKey> = {
            let mut state = self.lock();
            let keys: Vec<CacheKey> = state
                .slots
                .iter()
                .filter(|(_, slot)| slot.is_evictable(keep_unused_for))
                .map(|(key, _)| key.clone())
                .collect();
            for key in &keys {
                state.slots.remove(key);
            }
            keys
        };

        for key in &evicted {
            tracing::debug!(%key, "evicted unused entry");
            self.events.emit(&CacheEvent::Evicted(key.clone()));
        }
        evicted.len()
    }
}

/// Snapshot for an operation whose entry was evicted while it ran.
fn detached(
    key: &CacheKey,
    endpoint: &Endpoint,
    generation: u64,
    outcome: Result<Payload, FetchError>,
) -> CacheEntry {
    let (status, value, error) = match outcome {
        Ok(value) => (CacheStatus::Success, Some(value), None),
        Err(error) => (CacheStatus::Error, None, Some(error)),
    };
    CacheEntry {
        key: key.clone(),
        endpoint: endpoint.name().to_string(),
        tags: endpoint.provided_tags().iter().cloned().collect(),
        status,
        value,
        error,
        subscriber_count: 0,
        generation,
        fulfilled_at: Some(Utc::now()),
    }
}

/// Keyed cache of remote resources.
///
/// Cloning is cheap; clones share the same entries.
#[derive(Clone)]
pub struct ResourceCache {
    inner: Arc<Inner>,
}

impl ResourceCache {
    /// Start building a cache over a remote.
    pub fn builder(remote: Arc<dyn Remote>) -> ResourceCacheBuilder {
        ResourceCacheBuilder {
            remote,
            endpoints: Vec::new(),
            eviction: EvictionPolicy::default(),
            token_source: None,
        }
    }

    /// Fetch a query.
    ///
    /// Joins the in-flight operation for the same key if there is one,
    /// otherwise starts a new one. Malformed requests are rejected before
    /// anything is scheduled.
    pub fn fetch(&self, request: ResourceRequest) -> Result<FetchHandle, CacheError> {
        let endpoint = self.inner.resolve(&request, EndpointKind::Query)?;
        let call = endpoint.build_call(&request, self.inner.token())?;
        let key = request.key();

        let mut events = Vec::new();
        let operation = {
            let mut state = self.inner.lock();
            let slot = state
                .slots
                .entry(key.clone())
                .or_insert_with(|| Slot::new(key.clone(), request, endpoint));

            if let Some(operation) = slot.in_flight.clone() {
                tracing::debug!(%key, "joining in-flight fetch");
                operation
            } else {
                let (operation, entry) = self.inner.start(slot, call);
                events.push(CacheEvent::Updated(entry));
                operation
            }
        };
        self.inner.emit(events);

        Ok(FetchHandle { key, operation })
    }

    /// Subscribe to a query's entry.
    ///
    /// The stream first yields the entry as it is now. An entry that has
    /// never been fetched, or was invalidated, is fetched.
    pub fn subscribe(&self, request: ResourceRequest) -> Result<EntrySubscription, CacheError> {
        let endpoint = self.inner.resolve(&request, EndpointKind::Query)?;
        let call = endpoint.build_call(&request, self.inner.token())?;
        let key = request.key();
        let (updates_tx, updates) = mpsc::unbounded();

        let mut events = Vec::new();
        let id = {
            let mut state = self.inner.lock();
            let id = state.next_subscriber;
            state.next_subscriber += 1;

            let slot = state
                .slots
                .entry(key.clone())
                .or_insert_with(|| Slot::new(key.clone(), request, endpoint));
            slot.subscribers.push((id, updates_tx));
            slot.unused_since = None;

            if slot.status == CacheStatus::Uninitialized && slot.in_flight.is_none() {
                let (_, entry) = self.inner.start(slot, call);
                events.push(CacheEvent::Updated(entry));
            } else if let Some((_, updates_tx)) = slot.subscribers.last() {
                let _ = updates_tx.unbounded_send(slot.snapshot());
            }
            id
        };
        self.inner.emit(events);
        tracing::debug!(%key, subscriber = id, "subscribed");

        let inner = Arc::downgrade(&self.inner);
        let release_key = key.clone();
        let release = Subscription::new(move || {
            if let Some(inner) = inner.upgrade() {
                inner.release(&release_key, id);
            }
        });
        Ok(EntrySubscription::new(key, updates, release))
    }

    /// Release a subscription.
    pub fn unsubscribe(&self, subscription: EntrySubscription) {
        subscription.unsubscribe();
    }

    /// Run a mutation.
    ///
    /// Mutations are never cached. On success every tag the endpoint
    /// invalidates is invalidated. The returned handle does nothing until
    /// awaited.
    pub fn mutate(&self, request: ResourceRequest) -> Result<MutationHandle, CacheError> {
        let endpoint = self.inner.resolve(&request, EndpointKind::Mutation)?;
        let call = endpoint.build_call(&request, self.inner.token())?;
        let cache = self.clone();

        let operation = async move {
            let outcome = match cache.inner.remote.send(call).await {
                Ok(raw) => endpoint.shape(raw),
                Err(e) => Err(FetchError::from_remote(e, endpoint.name())),
            };
            match &outcome {
                Ok(_) => {
                    tracing::debug!(endpoint = endpoint.name(), "mutation succeeded");
                    if !endpoint.invalidated_tags().is_empty() {
                        cache.invalidate_tags(endpoint.invalidated_tags());
                    }
                }
                Err(error) => tracing::warn!(endpoint = endpoint.name(), %error, "mutation failed"),
            }
            outcome
        }
        .boxed();

        Ok(MutationHandle { operation })
    }

    /// Invalidate every entry carrying `tag`.
    pub fn invalidate(&self, tag: &Tag) -> usize {
        self.invalidate_tags(std::slice::from_ref(tag))
    }

    /// Invalidate every entry carrying any of `tags`.
    ///
    /// Invalidated entries keep their last value. Entries with subscribers
    /// are refetched immediately; the rest wait for their next fetch or
    /// subscriber. Returns the number of entries invalidated.
    pub fn invalidate_tags(&self, tags: &[Tag]) -> usize {
        let token = self.inner.token();
        let mut events = Vec::new();
        let mut matched = 0;
        let mut refetched = 0;

        {
            let mut state = self.inner.lock();
            for slot in state.slots.values_mut() {
                if !tags.iter().any(|tag| slot.tags.contains(tag)) {
                    continue;
                }
                matched += 1;
                slot.generation += 1;
                slot.in_flight = None;
                slot.status = CacheStatus::Uninitialized;

                if slot.subscribers.is_empty() {
                    events.push(CacheEvent::Updated(slot.publish()));
                    continue;
                }

                match slot.endpoint.build_call(&slot.request, token.clone()) {
                    Ok(call) => {
                        let (_, entry) = self.inner.start(slot, call);
                        events.push(CacheEvent::Updated(entry));
                        refetched += 1;
                    }
                    Err(error) => {
                        tracing::warn!(key = %slot.key, %error, "cannot refetch invalidated entry");
                        events.push(CacheEvent::Updated(slot.publish()));
                    }
                }
            }
        }

        tracing::info!(?tags, matched, refetched, "invalidated tags");
        self.inner.emit(events);
        matched
    }

    /// Snapshot of an entry.
    pub fn entry(&self, key: &CacheKey) -> Option<CacheEntry> {
        self.inner.lock().slots.get(key).map(Slot::snapshot)
    }

    /// Evict every entry that is unused, idle and past its keep-alive.
    pub fn sweep(&self) -> usize {
        self.inner.sweep()
    }

    /// Listen to every entry change and eviction.
    pub fn on_change<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&CacheEvent) + Send + Sync + 'static,
    {
        self.inner.events.subscribe(listener)
    }

    /// Look up a registered endpoint.
    pub fn endpoint(&self, name: &str) -> Option<&Endpoint> {
        self.inner.endpoints.get(name).map(Arc::as_ref)
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.inner.lock().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for ResourceCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceCache")
            .field("endpoints", &self.inner.endpoints.len())
            .field("entries", &self.len())
            .field("eviction", &self.inner.eviction)
            .finish()
    }
}

/// Builder for [`ResourceCache`].
pub struct ResourceCacheBuilder {
    remote: Arc<dyn Remote>,
    endpoints: Vec<Endpoint>,
    eviction: EvictionPolicy,
    token_source: Option<TokenSource>,
}

impl ResourceCacheBuilder {
    /// Register an endpoint.
    pub fn endpoint(mut self, endpoint: Endpoint) -> Self {
        self.endpoints.push(endpoint);
        self
    }

    /// Register several endpoints.
    pub fn endpoints(mut self, endpoints: impl IntoIterator<Item = Endpoint>) -> Self {
        self.endpoints.extend(endpoints);
        self
    }

    pub fn eviction(mut self, eviction: EvictionPolicy) -> Self {
        self.eviction = eviction;
        self
    }

    /// Set where authorized endpoints read their bearer token.
    pub fn token_source<F>(mut self, source: F) -> Self
    where
        F: Fn() -> Option<String> + Send + Sync + 'static,
    {
        self.token_source = Some(Arc::new(source));
        self
    }

    pub fn build(self) -> Result<ResourceCache, CacheError> {
        let mut endpoints = HashMap::with_capacity(self.endpoints.len());
        for endpoint in self.endpoints {
            if endpoint.name().trim().is_empty() {
                return Err(ValidationError::Empty("endpoint name").into());
            }
            let name = endpoint.name().to_string();
            if endpoints.insert(name.clone(), Arc::new(endpoint)).is_some() {
                return Err(CacheError::DuplicateEndpoint(name));
            }
        }

        tracing::debug!(endpoints = endpoints.len(), eviction = ?self.eviction, "resource cache ready");
        Ok(ResourceCache {
            inner: Arc::new(Inner {
                remote: self.remote,
                endpoints,
                eviction: self.eviction,
                token_source: self.token_source,
                state: Mutex::new(CacheState::default()),
                events: EventBus::new(),
            }),
        })
    }
}

/// Resolves to the entry once the fetch, or whatever superseded it, settles.
#[must_use = "futures do nothing unless awaited"]
pub struct FetchHandle {
    key: CacheKey,
    operation: InFlight,
}

impl FetchHandle {
    pub fn key(&self) -> &CacheKey {
        &self.key
    }
}

impl Future for FetchHandle {
    type Output = CacheEntry;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.operation.poll_unpin(cx)
    }
}

/// Resolves to a mutation's transformed result.
#[must_use = "mutations do nothing unless awaited"]
pub struct MutationHandle {
    operation: BoxFuture<'static, Result<Payload, FetchError>>,
}

impl MutationHandle {
    /// Await the result downcast to its transformed type.
    pub async fn typed<T: std::any::Any + Send + Sync>(self) -> Result<Arc<T>, FetchError> {
        let payload = self.await?;
        payload.downcast::<T>().map_err(|_| FetchError::Transform {
            endpoint: String::new(),
            version: 0,
            reason: format!("unexpected payload type, wanted {}", std::any::type_name::<T>()),
        })
    }
}

impl Future for MutationHandle {
    type Output = Result<Payload, FetchError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.operation.poll_unpin(cx)
    }
}
