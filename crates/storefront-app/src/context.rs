//! Application root context.
//!
//! The context owns every container and wires them together. Nothing is
//! global: front ends build one context and pass it by reference.

use std::sync::{Arc, Mutex, PoisonError};

use storefront_auth::{
    login_request, DurableStorage, LoginCredentials, LoginResponse, Session, SessionContainer,
    SessionError, User, GET_CURRENT_USER, USERS_TAG,
};
use storefront_cache::{
    CacheEntry, EvictionPolicy, FetchError, ResourceCache, ResourceRequest, Tag,
};
use storefront_commerce::cart::{CartLine, CartStore};
use storefront_commerce::catalog::{self, Product};
use storefront_commerce::search::{DerivedView, FilterState};
use storefront_commerce::ProductId;
use storefront_core::{
    EventBus, LogNotifier, Notifier, StorefrontConfig, Subscription, ValidationError,
};
use storefront_data::{HttpRemote, Remote};

use crate::{AppError, FilterStore, Intent, LoginError, StateEvent};

/// Owner of the session, cache, cart and filter state.
pub struct AppContext {
    config: StorefrontConfig,
    cache: ResourceCache,
    session: Arc<SessionContainer>,
    cart: CartStore,
    filter: FilterStore,
    products: DerivedView<Product>,
    /// Token of a login whose profile is still being fetched.
    pending_token: Arc<Mutex<Option<String>>>,
    events: EventBus<StateEvent>,
    _forwarding: Vec<Subscription>,
}

impl AppContext {
    pub fn builder(remote: Arc<dyn Remote>, storage: Arc<dyn DurableStorage>) -> AppContextBuilder {
        AppContextBuilder {
            remote,
            storage,
            notifier: Arc::new(LogNotifier),
            config: StorefrontConfig::default(),
        }
    }

    /// Build a context talking HTTP to the configured API.
    pub fn from_config(
        config: StorefrontConfig,
        storage: Arc<dyn DurableStorage>,
    ) -> Result<Self, AppError> {
        let remote = HttpRemote::from_config(&config.api)?;
        Self::builder(Arc::new(remote), storage).config(config).build()
    }

    /// Restore the session from durable storage. Only the first call reads it.
    pub fn hydrate(&self) -> Session {
        self.session.hydrate()
    }

    /// Apply an intent.
    ///
    /// `Fetch` starts the operation and returns without waiting for it; the
    /// outcome arrives as cache events. It needs a running Tokio runtime to
    /// make progress.
    pub fn dispatch(&self, intent: Intent) -> Result<(), AppError> {
        tracing::debug!(intent = intent.name(), "dispatch");
        match intent {
            Intent::LoginStart => {
                self.session.login_start()?;
            }
            Intent::LoginSuccess { token, user } => {
                self.complete_login(token, user)?;
            }
            Intent::LoginFailure => {
                self.session.login_failure()?;
            }
            Intent::Logout => {
                self.logout();
            }
            Intent::SetUser(user) => {
                self.session.set_user(user)?;
            }
            Intent::SetSearchTerm(term) => {
                self.filter.set_search_term(term);
            }
            Intent::ClearSearchTerm => {
                self.filter.clear();
            }
            Intent::CartAdd {
                product_id,
                title,
                unit_price,
                image,
            } => {
                self.cart.add(product_id, &title, unit_price, image)?;
            }
            Intent::Fetch(request) => {
                let handle = self.cache.fetch(request)?;
                tracing::debug!(key = %handle.key(), "fetch dispatched");
            }
            Intent::Invalidate(tag) => {
                self.cache.invalidate(&tag);
            }
        }
        Ok(())
    }

    /// Run the whole login flow.
    ///
    /// Blank credentials are rejected before anything is sent. A rejection
    /// by the remote leaves the session anonymous and storage untouched.
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<Session, LoginError> {
        let request = login_request(credentials)?;
        self.session.login_start()?;

        match self.authenticate(request).await {
            Ok((token, user)) => Ok(self.complete_login(token, user)?),
            Err(error) => {
                tracing::info!(username = %credentials.username, %error, "login rejected");
                if let Err(error) = self.session.login_failure() {
                    tracing::warn!(%error, "could not record login failure");
                }
                Err(error)
            }
        }
    }

    async fn authenticate(&self, request: ResourceRequest) -> Result<(String, User), LoginError> {
        let response = self.cache.mutate(request)?.typed::<LoginResponse>().await?;
        if response.token.trim().is_empty() {
            return Err(ValidationError::Empty("token").into());
        }
        let user = match &response.user {
            Some(user) => user.clone(),
            None => self.fetch_current_user(&response.token).await?,
        };
        Ok((response.token.clone(), user))
    }

    /// Fetch the profile for a token the session does not hold yet.
    async fn fetch_current_user(&self, token: &str) -> Result<User, LoginError> {
        let handle = {
            self.set_pending_token(Some(token.to_string()));
            // Restart any subscribed profile fetch so it carries the token.
            self.cache.invalidate(&Tag::from(USERS_TAG));
            let handle = self.cache.fetch(ResourceRequest::new(GET_CURRENT_USER));
            self.set_pending_token(None);
            handle?
        };

        let entry = handle.await;
        if let Some(user) = entry.value_as::<User>().filter(|_| entry.is_success()) {
            return Ok(user.as_ref().clone());
        }
        Err(entry
            .error
            .clone()
            .unwrap_or_else(|| FetchError::Network {
                status: None,
                message: format!("no profile in {}", entry.key),
            })
            .into())
    }

    fn set_pending_token(&self, token: Option<String>) {
        *self
            .pending_token
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = token;
    }

    /// Post-login hook: persist the session, then refresh user queries so
    /// they pick up the new token.
    fn complete_login(&self, token: String, user: User) -> Result<Session, SessionError> {
        let session = self.session.login_success(token, user)?;
        self.cache.invalidate(&Tag::from(USERS_TAG));
        Ok(session)
    }

    /// Sign out and drop user queries.
    pub fn logout(&self) -> Session {
        let session = self.session.logout();
        self.cache.invalidate(&Tag::from(USERS_TAG));
        session
    }

    /// Fetch the product list and wait for it to settle.
    pub async fn load_products(&self) -> Result<CacheEntry, AppError> {
        Ok(self.cache.fetch(catalog::all_products())?.await)
    }

    pub async fn load_product(&self, id: ProductId) -> Result<CacheEntry, AppError> {
        Ok(self.cache.fetch(catalog::product_by_id(id))?.await)
    }

    /// The product list filtered by the current search term.
    ///
    /// `None` until the list has been fetched. Repeated calls with the same
    /// list and term return the same `Arc`.
    pub fn product_view(&self) -> Option<Arc<Vec<Product>>> {
        let entry = self.cache.entry(&catalog::all_products().key())?;
        let products = entry.value_as::<Vec<Product>>()?;
        Some(self.products.get(&products, &self.filter.current()))
    }

    pub fn add_to_cart(&self, product: &Product) -> Result<CartLine, AppError> {
        Ok(self
            .cart
            .add(product.id, &product.title, product.price, product.image.clone())?)
    }

    /// Listen to every state change from every container.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&StateEvent) + Send + Sync + 'static,
    {
        self.events.subscribe(listener)
    }

    pub fn session(&self) -> Session {
        self.session.session()
    }

    pub fn sessions(&self) -> &SessionContainer {
        &self.session
    }

    pub fn cache(&self) -> &ResourceCache {
        &self.cache
    }

    pub fn cart(&self) -> &CartStore {
        &self.cart
    }

    pub fn filter(&self) -> FilterState {
        self.filter.current()
    }

    pub fn config(&self) -> &StorefrontConfig {
        &self.config
    }

    /// Times the product view was recomputed.
    pub fn product_view_recomputations(&self) -> usize {
        self.products.recomputations()
    }
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("session", &self.session)
            .field("cache", &self.cache)
            .field("cart", &self.cart)
            .field("filter", &self.filter.current())
            .finish_non_exhaustive()
    }
}

/// Builder for [`AppContext`].
pub struct AppContextBuilder {
    remote: Arc<dyn Remote>,
    storage: Arc<dyn DurableStorage>,
    notifier: Arc<dyn Notifier>,
    config: StorefrontConfig,
}

impl AppContextBuilder {
    /// Where cart toasts go. Defaults to the log.
    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn config(mut self, config: StorefrontConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<AppContext, AppError> {
        let session = Arc::new(SessionContainer::new(self.storage));
        let pending_token: Arc<Mutex<Option<String>>> = Arc::new(Mutex::new(None));

        let cache = {
            let session = Arc::clone(&session);
            let pending_token = Arc::clone(&pending_token);
            ResourceCache::builder(self.remote)
                .endpoints(storefront_auth::endpoints())
                .endpoints(catalog::endpoints())
                .eviction(EvictionPolicy::from(&self.config.cache))
                .token_source(move || {
                    session.token().or_else(|| {
                        pending_token
                            .lock()
                            .unwrap_or_else(PoisonError::into_inner)
                            .clone()
                    })
                })
                .build()?
        };

        let cart = CartStore::new(self.notifier);
        let filter = FilterStore::new();
        let events = EventBus::new();

        let forwarding = vec![
            {
                let events = events.clone();
                session.subscribe(move |e| {
                    events.emit(&StateEvent::Session(e.clone()));
                })
            },
            {
                let events = events.clone();
                cache.on_change(move |e| {
                    events.emit(&StateEvent::Cache(e.clone()));
                })
            },
            {
                let events = events.clone();
                cart.subscribe(move |e| {
                    events.emit(&StateEvent::Cart(e.clone()));
                })
            },
            {
                let events = events.clone();
                filter.subscribe(move |e| {
                    events.emit(&StateEvent::Filter(e.clone()));
                })
            },
        ];

        tracing::debug!(api = %self.config.api.base_url, "app context ready");
        Ok(AppContext {
            config: self.config,
            cache,
            session,
            cart,
            filter,
            products: DerivedView::new(),
            pending_token,
            events,
            _forwarding: forwarding,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use storefront_auth::{MemoryStorage, SessionPhase};
    use storefront_data::{Method, MockRemote};

    use super::*;

    fn context(remote: Arc<MockRemote>) -> AppContext {
        AppContext::builder(remote, Arc::new(MemoryStorage::new()))
            .build()
            .unwrap()
    }

    #[test]
    fn test_dispatch_filter_and_cart() {
        let ctx = context(Arc::new(MockRemote::new()));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let _sub = {
            let seen = Arc::clone(&seen);
            ctx.subscribe(move |event| seen.lock().unwrap().push(event.source()))
        };

        ctx.dispatch(Intent::SetSearchTerm("hat".to_string())).unwrap();
        ctx.dispatch(Intent::CartAdd {
            product_id: ProductId::new(3),
            title: "Blue Hat".to_string(),
            unit_price: storefront_commerce::Money::new(500, Default::default()),
            image: None,
        })
        .unwrap();
        ctx.dispatch(Intent::ClearSearchTerm).unwrap();

        assert_eq!(ctx.cart().item_count(), 1);
        assert!(ctx.filter().is_empty());
        assert_eq!(*seen.lock().unwrap(), vec!["filter", "cart", "filter"]);
    }

    #[test]
    fn test_dispatch_session_intents() {
        let ctx = context(Arc::new(MockRemote::new()));
        let user = User {
            id: 1,
            username: "johnd".to_string(),
            email: String::new(),
            first_name: "John".to_string(),
            last_name: "Doe".to_string(),
        };

        ctx.dispatch(Intent::LoginStart).unwrap();
        assert_eq!(ctx.session().phase(), SessionPhase::Loading);
        ctx.dispatch(Intent::LoginSuccess {
            token: "t0k3n".to_string(),
            user,
        })
        .unwrap();
        assert!(ctx.session().is_authenticated);

        assert!(matches!(
            ctx.dispatch(Intent::LoginFailure),
            Err(AppError::Session(_))
        ));
        ctx.dispatch(Intent::Logout).unwrap();
        assert_eq!(ctx.session(), Session::anonymous());
    }

    #[tokio::test]
    async fn test_product_view_follows_filter() {
        let remote = Arc::new(MockRemote::new());
        remote.ok(
            Method::Get,
            "/products",
            json!([
                { "id": 1, "title": "Red Shirt", "price": 19.99 },
                { "id": 2, "title": "Blue Hat", "price": 5 }
            ]),
        );
        let ctx = context(remote);
        assert!(ctx.product_view().is_none());

        assert!(ctx.load_products().await.unwrap().is_success());
        assert_eq!(ctx.product_view().unwrap().len(), 2);

        ctx.dispatch(Intent::SetSearchTerm("red".to_string())).unwrap();
        let view = ctx.product_view().unwrap();
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].id, ProductId::new(1));

        let again = ctx.product_view().unwrap();
        assert!(Arc::ptr_eq(&view, &again));
        assert_eq!(ctx.product_view_recomputations(), 2);
    }

    #[test]
    fn test_malformed_fetch_rejected() {
        let ctx = context(Arc::new(MockRemote::new()));
        let result = ctx.dispatch(Intent::Fetch(ResourceRequest::new(
            catalog::GET_PRODUCT_BY_ID,
        )));
        assert!(matches!(result, Err(AppError::Cache(_))));
    }
}
