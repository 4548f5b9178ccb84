//! Request identity: cache keys, tags and parameters.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use storefront_core::ValidationError;

/// Label attached to cache entries, used for bulk invalidation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tag(String);

impl Tag {
    /// Create a tag.
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// Get the tag string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Tag {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Request parameters, kept sorted so equal parameter sets produce equal keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Params(BTreeMap<String, String>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a parameter.
    pub fn insert(&mut self, name: impl Into<String>, value: impl ToString) {
        self.0.insert(name.into(), value.to_string());
    }

    /// Get a parameter value.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn validate(&self) -> Result<(), ValidationError> {
        for (name, value) in &self.0 {
            if name.trim().is_empty() {
                return Err(ValidationError::InvalidParam {
                    name: name.clone(),
                    reason: "name is empty".to_string(),
                });
            }
            if value.trim().is_empty() {
                return Err(ValidationError::InvalidParam {
                    name: name.clone(),
                    reason: "value is empty".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Canonical JSON form, keys in sorted order.
    fn canonical(&self) -> String {
        // A string-to-string map always serializes.
        serde_json::to_string(&self.0).unwrap_or_default()
    }
}

/// Identity of a cache entry: endpoint name plus canonical parameters.
///
/// Formatted as `getProductById({"id":"1"})`, or `getAllProducts()` when
/// there are no parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive the key for an endpoint and parameter set.
    pub fn derive(endpoint: &str, params: &Params) -> Self {
        if params.is_empty() {
            Self(format!("{endpoint}()"))
        } else {
            Self(format!("{endpoint}({})", params.canonical()))
        }
    }

    /// Get the key string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A request against a named endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceRequest {
    endpoint: String,
    params: Params,
    tags: BTreeSet<Tag>,
    body: Option<Value>,
}

impl ResourceRequest {
    /// Create a request for an endpoint with no parameters.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            params: Params::new(),
            tags: BTreeSet::new(),
            body: None,
        }
    }

    /// Add a parameter.
    pub fn param(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.params.insert(name, value);
        self
    }

    /// Attach an extra tag beyond those the endpoint provides.
    pub fn tag(mut self, tag: impl Into<Tag>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    /// Set a JSON body (mutations).
    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn tags(&self) -> &BTreeSet<Tag> {
        &self.tags
    }

    pub fn body_value(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// The cache key this request resolves to.
    pub fn key(&self) -> CacheKey {
        CacheKey::derive(&self.endpoint, &self.params)
    }

    /// Reject malformed requests before anything is scheduled.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.endpoint.trim().is_empty() {
            return Err(ValidationError::Empty("endpoint name"));
        }
        if self.tags.iter().any(|tag| tag.as_str().trim().is_empty()) {
            return Err(ValidationError::Empty("tag"));
        }
        self.params.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_without_params() {
        let request = ResourceRequest::new("getAllProducts");
        assert_eq!(request.key().as_str(), "getAllProducts()");
    }

    #[test]
    fn test_key_is_order_independent() {
        let a = ResourceRequest::new("search").param("q", "shirt").param("limit", 5);
        let b = ResourceRequest::new("search").param("limit", 5).param("q", "shirt");
        assert_eq!(a.key(), b.key());
        assert_eq!(a.key().as_str(), r#"search({"limit":"5","q":"shirt"})"#);
    }

    #[test]
    fn test_key_differs_by_param() {
        let a = ResourceRequest::new("getProductById").param("id", 1);
        let b = ResourceRequest::new("getProductById").param("id", 2);
        assert_ne!(a.key(), b.key());
    }

    #[test]
    fn test_validate() {
        assert_eq!(
            ResourceRequest::new("").validate(),
            Err(ValidationError::Empty("endpoint name"))
        );
        assert_eq!(
            ResourceRequest::new("x").tag("").validate(),
            Err(ValidationError::Empty("tag"))
        );
        assert!(matches!(
            ResourceRequest::new("x").param("id", "").validate(),
            Err(ValidationError::InvalidParam { .. })
        ));
        assert!(ResourceRequest::new("x").param("id", 1).validate().is_ok());
    }
}
