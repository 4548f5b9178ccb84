//! Endpoint definitions and response transforms.

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use storefront_core::ValidationError;
use storefront_data::{Method, RemoteCall};

use crate::{ResourceRequest, Tag, TransformError};

/// A transformed, type-erased cache value.
///
/// Read it back with [`CacheEntry::value_as`](crate::CacheEntry::value_as).
pub type Payload = Arc<dyn Any + Send + Sync>;

/// Shapes a raw remote payload into the value stored in the cache.
///
/// Transforms are versioned so a change in shape is visible in errors
/// and logs.
pub trait Transform: Send + Sync {
    /// Version of the shape this transform produces.
    fn version(&self) -> u32;

    /// Convert the raw payload.
    fn apply(&self, raw: Value) -> Result<Payload, TransformError>;
}

/// Deserialize the payload into `T`.
pub struct JsonTransform<T> {
    version: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonTransform<T> {
    pub fn new(version: u32) -> Self {
        Self {
            version,
            _marker: PhantomData,
        }
    }
}

impl<T> Transform for JsonTransform<T>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    fn version(&self) -> u32 {
        self.version
    }

    fn apply(&self, raw: Value) -> Result<Payload, TransformError> {
        let value: T = serde_json::from_value(raw)?;
        Ok(Arc::new(value))
    }
}

/// Transform backed by a closure.
pub struct FnTransform<F> {
    version: u32,
    f: F,
}

impl<F> FnTransform<F> {
    pub fn new(version: u32, f: F) -> Self {
        Self { version, f }
    }
}

impl<F, T> Transform for FnTransform<F>
where
    F: Fn(Value) -> Result<T, TransformError> + Send + Sync,
    T: Send + Sync + 'static,
{
    fn version(&self) -> u32 {
        self.version
    }

    fn apply(&self, raw: Value) -> Result<Payload, TransformError> {
        let value = (self.f)(raw)?;
        Ok(Arc::new(value))
    }
}

/// Stores the raw JSON unchanged.
struct Identity;

impl Transform for Identity {
    fn version(&self) -> u32 {
        0
    }

    fn apply(&self, raw: Value) -> Result<Payload, TransformError> {
        Ok(Arc::new(raw))
    }
}

/// Whether an endpoint reads (cached) or writes (never cached).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointKind {
    Query,
    Mutation,
}

impl EndpointKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EndpointKind::Query => "query",
            EndpointKind::Mutation => "mutation",
        }
    }
}

/// A named remote operation.
///
/// The path is a template where `{name}` segments are filled from request
/// parameters; parameters the path doesn't use become query pairs.
#[derive(Clone)]
pub struct Endpoint {
    name: String,
    kind: EndpointKind,
    method: Method,
    path: String,
    provides: Vec<Tag>,
    invalidates: Vec<Tag>,
    authorized: bool,
    transform: Arc<dyn Transform>,
}

impl Endpoint {
    /// Define a GET query.
    pub fn query(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(name, EndpointKind::Query, Method::Get, path)
    }

    /// Define a mutation.
    pub fn mutation(name: impl Into<String>, method: Method, path: impl Into<String>) -> Self {
        Self::new(name, EndpointKind::Mutation, method, path)
    }

    fn new(
        name: impl Into<String>,
        kind: EndpointKind,
        method: Method,
        path: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            method,
            path: path.into(),
            provides: Vec::new(),
            invalidates: Vec::new(),
            authorized: false,
            transform: Arc::new(Identity),
        }
    }

    /// Tag every entry fetched through this endpoint.
    pub fn provides(mut self, tag: impl Into<Tag>) -> Self {
        self.provides.push(tag.into());
        self
    }

    /// Invalidate a tag after this mutation succeeds.
    pub fn invalidates(mut self, tag: impl Into<Tag>) -> Self {
        self.invalidates.push(tag.into());
        self
    }

    /// Send the session's bearer token with each call.
    pub fn authorized(mut self) -> Self {
        self.authorized = true;
        self
    }

    pub fn transform(mut self, transform: impl Transform + 'static) -> Self {
        self.transform = Arc::new(transform);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> EndpointKind {
        self.kind
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn provided_tags(&self) -> &[Tag] {
        &self.provides
    }

    pub fn invalidated_tags(&self) -> &[Tag] {
        &self.invalidates
    }

    pub fn is_authorized(&self) -> bool {
        self.authorized
    }

    pub fn transform_version(&self) -> u32 {
        self.transform.version()
    }

    /// Names of the `{param}` segments in the path template.
    pub fn path_params(&self) -> impl Iterator<Item = &str> {
        self.path.split('/').filter_map(|segment| {
            segment
                .strip_prefix('{')
                .and_then(|rest| rest.strip_suffix('}'))
        })
    }

    /// Apply the transform, tagging failures with this endpoint.
    pub(crate) fn shape(&self, raw: Value) -> Result<Payload, crate::FetchError> {
        self.transform
            .apply(raw)
            .map_err(|e| crate::FetchError::Transform {
                endpoint: self.name.clone(),
                version: self.transform.version(),
                reason: e.reason,
            })
    }

    /// Build the remote call for a request.
    pub(crate) fn build_call(
        &self,
        request: &ResourceRequest,
        token: Option<String>,
    ) -> Result<RemoteCall, ValidationError> {
        let params = request.params();
        let mut segments = Vec::new();
        for segment in self.path.split('/') {
            match segment.strip_prefix('{').and_then(|rest| rest.strip_suffix('}')) {
                Some(name) => {
                    let value = params.get(name).ok_or_else(|| ValidationError::MissingParam {
                        endpoint: self.name.clone(),
                        param: name.to_string(),
                    })?;
                    check_segment(name, value)?;
                    segments.push(value.to_string());
                }
                None => segments.push(segment.to_string()),
            }
        }

        let mut call = RemoteCall::new(self.method, segments.join("/"));
        let used: Vec<&str> = self.path_params().collect();
        for (name, value) in params.iter().filter(|(name, _)| !used.contains(name)) {
            call = call.query(name, value);
        }
        if let Some(body) = request.body_value() {
            call = call.json_value(body.clone());
        }
        if self.authorized {
            if let Some(token) = token {
                call = call.bearer_auth(token);
            }
        }
        Ok(call)
    }
}

/// A path parameter must stay inside its own segment.
fn check_segment(name: &str, value: &str) -> Result<(), ValidationError> {
    let reason = if value.contains(['/', '?', '#']) {
        "contains a path or query delimiter"
    } else if value == "." || value == ".." {
        "is a relative path segment"
    } else {
        return Ok(());
    };
    Err(ValidationError::InvalidParam {
        name: name.to_string(),
        reason: reason.to_string(),
    })
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("method", &self.method)
            .field("path", &self.path)
            .field("provides", &self.provides)
            .field("invalidates", &self.invalidates)
            .field("authorized", &self.authorized)
            .field("transform_version", &self.transform.version())
            .finish()
    }
}
