//! Auth endpoints for the resource cache.

use serde::Deserialize;
use serde_json::{json, Value};
use storefront_cache::{Endpoint, FnTransform, JsonTransform, ResourceRequest, TransformError};
use storefront_core::ValidationError;
use storefront_data::Method;

use crate::{LoginCredentials, LoginResponse, User};

/// Mutation exchanging credentials for a token.
pub const LOGIN: &str = "login";

/// Query for the signed-in user's profile.
pub const GET_CURRENT_USER: &str = "getCurrentUser";

/// Tag provided by user queries and invalidated by login.
pub const USERS_TAG: &str = "Users";

/// Endpoints to register on the cache.
pub fn endpoints() -> Vec<Endpoint> {
    vec![
        Endpoint::mutation(LOGIN, Method::Post, "/auth/login")
            .invalidates(USERS_TAG)
            .transform(JsonTransform::<LoginResponse>::new(1)),
        Endpoint::query(GET_CURRENT_USER, "/users/1")
            .provides(USERS_TAG)
            .authorized()
            .transform(FnTransform::new(1, current_user)),
    ]
}

/// Build the `login` request, rejecting blank credentials.
pub fn login_request(credentials: &LoginCredentials) -> Result<ResourceRequest, ValidationError> {
    credentials.validate()?;
    Ok(ResourceRequest::new(LOGIN).body(json!({
        "username": credentials.username,
        "password": credentials.password,
    })))
}

#[derive(Deserialize)]
struct RemoteUser {
    id: u64,
    username: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    name: Option<RemoteName>,
}

#[derive(Deserialize, Default)]
struct RemoteName {
    #[serde(default)]
    firstname: Option<String>,
    #[serde(default)]
    lastname: Option<String>,
}

fn current_user(raw: Value) -> Result<User, TransformError> {
    let remote: RemoteUser = serde_json::from_value(raw)?;
    let name = remote.name.unwrap_or_default();
    Ok(User {
        id: remote.id,
        username: remote.username,
        email: remote.email,
        first_name: non_empty_or(name.firstname, "John"),
        last_name: non_empty_or(name.lastname, "Doe"),
    })
}

fn non_empty_or(value: Option<String>, fallback: &str) -> String {
    value
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| fallback.to_string())
}
