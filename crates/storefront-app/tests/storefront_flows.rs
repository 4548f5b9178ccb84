/// End-to-end flows through the application context.
///
/// Every test runs against `MockRemote`; nothing touches the network.
use std::sync::{Arc, Mutex};

use futures::StreamExt;
use serde_json::{json, Value};
use storefront_app::{AppContext, Intent, LoginError, StateEvent};
use storefront_auth::{
    DurableStorage, FileStorage, LoginCredentials, MemoryStorage, SessionPhase, AUTH_TOKEN_KEY,
    GET_CURRENT_USER, USERS_TAG, USER_KEY,
};
use storefront_cache::{CacheStatus, ResourceRequest, Tag};
use storefront_commerce::catalog::{self, PRODUCTS_TAG};
use storefront_commerce::ProductId;
use storefront_data::{Method, MockRemote};

fn products() -> Value {
    json!([
        { "id": 1, "title": "Red Shirt", "price": 19.99, "category": "men's clothing" },
        { "id": 2, "title": "Blue Hat", "price": 5.0, "category": "accessories" }
    ])
}

fn login_response() -> Value {
    json!({
        "token": "t0k3n",
        "user": { "id": 1, "username": "johnd", "email": "john@gmail.com", "firstName": "John", "lastName": "Doe" }
    })
}

fn app(remote: &Arc<MockRemote>, storage: Arc<dyn DurableStorage>) -> AppContext {
    AppContext::builder(remote.clone(), storage).build().unwrap()
}

#[tokio::test]
async fn test_login_persists_and_restart_hydrates_without_network() {
    let remote = Arc::new(MockRemote::new());
    remote.ok(Method::Post, "/auth/login", login_response());
    let storage = Arc::new(MemoryStorage::new());

    let ctx = app(&remote, storage.clone());
    ctx.hydrate();
    let session = ctx.login(&LoginCredentials::new("johnd", "m38rmF$")).await.unwrap();
    assert!(session.is_authenticated);
    assert_eq!(session.subject_id.as_deref(), Some("1"));
    assert_eq!(storage.get(AUTH_TOKEN_KEY).unwrap().as_deref(), Some("t0k3n"));
    assert!(storage.get(USER_KEY).unwrap().is_some());
    drop(ctx);

    let calls_before = remote.calls().len();
    let restarted = app(&remote, storage);
    let hydrated = restarted.hydrate();
    assert_eq!(hydrated, session);
    assert_eq!(remote.calls().len(), calls_before);
}

#[tokio::test]
async fn test_invalid_credentials_stay_anonymous() {
    let remote = Arc::new(MockRemote::new());
    remote.status(Method::Post, "/auth/login", 401, "username or password is incorrect");
    let storage = Arc::new(MemoryStorage::new());
    let ctx = app(&remote, storage.clone());

    let error = ctx
        .login(&LoginCredentials::new("johnd", "wrong"))
        .await
        .unwrap_err();

    assert_eq!(error, LoginError::InvalidCredentials);
    assert_eq!(error.field_message(), "Invalid username or password");
    assert_eq!(ctx.session().phase(), SessionPhase::Anonymous);
    assert!(storage.is_empty());
}

#[tokio::test]
async fn test_server_error_is_generic_failure() {
    let remote = Arc::new(MockRemote::new());
    remote.status(Method::Post, "/auth/login", 500, "down");
    let ctx = app(&remote, Arc::new(MemoryStorage::new()));

    let error = ctx
        .login(&LoginCredentials::new("johnd", "m38rmF$"))
        .await
        .unwrap_err();
    assert_eq!(error.field_message(), "Login failed. Please try again.");
    assert_eq!(ctx.session().phase(), SessionPhase::Anonymous);
}

#[tokio::test]
async fn test_blank_credentials_never_reach_remote() {
    let remote = Arc::new(MockRemote::new());
    let ctx = app(&remote, Arc::new(MemoryStorage::new()));

    let error = ctx.login(&LoginCredentials::new("  ", "x")).await.unwrap_err();
    assert!(matches!(error, LoginError::Validation(_)));
    assert!(remote.calls().is_empty());
    assert_eq!(ctx.session().phase(), SessionPhase::Anonymous);
}

#[tokio::test]
async fn test_token_only_login_fetches_profile_with_bearer() {
    let remote = Arc::new(MockRemote::new());
    remote.ok(Method::Post, "/auth/login", json!({ "token": "t0k3n" }));
    remote.ok(
        Method::Get,
        "/users/1",
        json!({ "id": 1, "username": "johnd", "name": { "firstname": "john", "lastname": "doe" } }),
    );
    let ctx = app(&remote, Arc::new(MemoryStorage::new()));

    let session = ctx.login(&LoginCredentials::new("johnd", "m38rmF$")).await.unwrap();
    assert_eq!(session.user.as_ref().unwrap().first_name, "john");

    let profile_call = remote
        .calls()
        .into_iter()
        .find(|call| call.path == "/users/1")
        .unwrap();
    assert_eq!(profile_call.bearer.as_deref(), Some("t0k3n"));
}

#[tokio::test]
async fn test_logout_purges_storage_from_any_phase() {
    let remote = Arc::new(MockRemote::new());
    remote.ok(Method::Post, "/auth/login", login_response());
    let storage = Arc::new(MemoryStorage::new());
    let ctx = app(&remote, storage.clone());

    ctx.logout();
    assert!(storage.is_empty());

    ctx.login(&LoginCredentials::new("johnd", "m38rmF$")).await.unwrap();
    let session = ctx.logout();
    assert!(!session.is_authenticated);
    assert!(session.token.is_none());
    assert!(storage.get(AUTH_TOKEN_KEY).unwrap().is_none());
    assert!(storage.get(USER_KEY).unwrap().is_none());
}

#[tokio::test]
async fn test_search_scenario() {
    let remote = Arc::new(MockRemote::new());
    remote.ok(Method::Get, "/products", products());
    let ctx = app(&remote, Arc::new(MemoryStorage::new()));
    ctx.load_products().await.unwrap();

    ctx.dispatch(Intent::SetSearchTerm("red".to_string())).unwrap();
    let view = ctx.product_view().unwrap();
    assert_eq!(view.len(), 1);
    assert_eq!(view[0].title, "Red Shirt");

    ctx.dispatch(Intent::SetSearchTerm("ACCESS".to_string())).unwrap();
    assert_eq!(ctx.product_view().unwrap()[0].id, ProductId::new(2));

    ctx.dispatch(Intent::ClearSearchTerm).unwrap();
    let ids: Vec<_> = ctx.product_view().unwrap().iter().map(|p| p.id.get()).collect();
    assert_eq!(ids, vec![1, 2]);

    ctx.dispatch(Intent::SetSearchTerm("socks".to_string())).unwrap();
    assert!(ctx.product_view().unwrap().is_empty());
    assert_eq!(remote.call_count("/products"), 1);
}

#[tokio::test]
async fn test_concurrent_loads_share_one_call() {
    let remote = Arc::new(MockRemote::new());
    remote.ok(Method::Get, "/products", products());
    remote.pause();
    let ctx = app(&remote, Arc::new(MemoryStorage::new()));

    let first = ctx.cache().fetch(catalog::all_products()).unwrap();
    let second = ctx.cache().fetch(catalog::all_products()).unwrap();
    remote.resume();
    let (a, b) = futures::join!(first, second);

    assert_eq!(remote.call_count("/products"), 1);
    assert!(a.is_success() && b.is_success());
    assert!(Arc::ptr_eq(
        &a.value_as::<Vec<storefront_commerce::catalog::Product>>().unwrap(),
        &b.value_as::<Vec<storefront_commerce::catalog::Product>>().unwrap()
    ));
}

#[tokio::test]
async fn test_invalidate_refetches_subscribed_list() {
    let remote = Arc::new(MockRemote::new());
    remote.ok(Method::Get, "/products", products());
    let ctx = app(&remote, Arc::new(MemoryStorage::new()));

    let mut sub = ctx.cache().subscribe(catalog::all_products()).unwrap();
    assert_eq!(sub.settled().await.unwrap().status, CacheStatus::Success);

    ctx.dispatch(Intent::Invalidate(Tag::from(PRODUCTS_TAG))).unwrap();
    assert_eq!(sub.next().await.unwrap().status, CacheStatus::Loading);
    assert_eq!(sub.next().await.unwrap().status, CacheStatus::Success);
    assert_eq!(remote.call_count("/products"), 2);
}

#[tokio::test]
async fn test_state_events_fan_in() {
    let remote = Arc::new(MockRemote::new());
    remote.ok(Method::Post, "/auth/login", login_response());
    let ctx = app(&remote, Arc::new(MemoryStorage::new()));
    let sources = Arc::new(Mutex::new(Vec::new()));
    let _sub = {
        let sources = Arc::clone(&sources);
        ctx.subscribe(move |event| {
            if let StateEvent::Session(session) = event {
                sources.lock().unwrap().push(session.intent.as_str());
            }
        })
    };

    ctx.login(&LoginCredentials::new("johnd", "m38rmF$")).await.unwrap();
    ctx.logout();

    assert_eq!(
        *sources.lock().unwrap(),
        vec!["login_start", "login_success", "logout"]
    );
}

#[tokio::test]
async fn test_profile_query_sends_session_token() {
    let remote = Arc::new(MockRemote::new());
    remote.ok(Method::Post, "/auth/login", login_response());
    remote.ok(Method::Get, "/users/1", json!({ "id": 1, "username": "johnd" }));
    let ctx = app(&remote, Arc::new(MemoryStorage::new()));
    ctx.login(&LoginCredentials::new("johnd", "m38rmF$")).await.unwrap();

    let entry = ctx
        .cache()
        .fetch(ResourceRequest::new(GET_CURRENT_USER))
        .unwrap()
        .await;
    assert!(entry.is_success());
    assert!(entry.has_tag(&Tag::from(USERS_TAG)));
    assert_eq!(remote.calls().last().unwrap().bearer.as_deref(), Some("t0k3n"));
}

#[tokio::test]
async fn test_file_storage_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    let remote = Arc::new(MockRemote::new());
    remote.ok(Method::Post, "/auth/login", login_response());

    {
        let ctx = app(&remote, Arc::new(FileStorage::new(&path)));
        ctx.hydrate();
        ctx.login(&LoginCredentials::new("johnd", "m38rmF$")).await.unwrap();
    }

    let ctx = app(&remote, Arc::new(FileStorage::new(&path)));
    let session = ctx.hydrate();
    assert!(session.is_authenticated);
    assert_eq!(session.token.as_deref(), Some("t0k3n"));
    assert_eq!(session.user.unwrap().username, "johnd");
}
