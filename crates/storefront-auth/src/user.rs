//! User and login payloads.

use std::fmt;

use serde::{Deserialize, Serialize};
use storefront_core::ValidationError;

/// Credentials summary of the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: u64,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

impl User {
    /// Subject identifier used by the session.
    pub fn subject_id(&self) -> String {
        self.id.to_string()
    }

    /// Name for display, falling back to the username.
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }

    pub(crate) fn validate(&self) -> Result<(), ValidationError> {
        if self.username.trim().is_empty() {
            return Err(ValidationError::Empty("username"));
        }
        Ok(())
    }
}

/// Username/password pair for the `login` mutation.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginCredentials {
    pub username: String,
    pub password: String,
}

impl LoginCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Reject blank credentials before anything is sent.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.username.trim().is_empty() {
            return Err(ValidationError::Empty("username"));
        }
        if self.password.is_empty() {
            return Err(ValidationError::Empty("password"));
        }
        Ok(())
    }
}

impl fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("username", &self.username)
            .field("password", &"[redacted]")
            .finish()
    }
}

/// Result of the `login` mutation.
///
/// Some backends return only the token; the user is then fetched
/// separately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

/// Stored form of the `user` key: the full login response or a bare user.
#[derive(Deserialize)]
#[serde(untagged)]
pub(crate) enum StoredUser {
    Wrapped { user: User },
    Bare(User),
}

impl StoredUser {
    pub(crate) fn into_user(self) -> User {
        match self {
            StoredUser::Wrapped { user } | StoredUser::Bare(user) => user,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name() {
        let mut user = User {
            id: 1,
            username: "johnd".to_string(),
            email: "john@gmail.com".to_string(),
            first_name: "john".to_string(),
            last_name: "doe".to_string(),
        };
        assert_eq!(user.display_name(), "john doe");

        user.first_name.clear();
        user.last_name.clear();
        assert_eq!(user.display_name(), "johnd");
    }

    #[test]
    fn test_stored_user_shapes() {
        let wrapped = r#"{"token":"t","user":{"id":3,"username":"kevinryan","firstName":"kevin","lastName":"ryan"}}"#;
        let bare = r#"{"id":3,"username":"kevinryan","firstName":"kevin","lastName":"ryan"}"#;

        let a = serde_json::from_str::<StoredUser>(wrapped).unwrap().into_user();
        let b = serde_json::from_str::<StoredUser>(bare).unwrap().into_user();
        assert_eq!(a, b);
        assert_eq!(a.first_name, "kevin");
    }

    #[test]
    fn test_credentials_validate() {
        assert_eq!(
            LoginCredentials::new(" ", "x").validate(),
            Err(ValidationError::Empty("username"))
        );
        assert_eq!(
            LoginCredentials::new("mor_2314", "").validate(),
            Err(ValidationError::Empty("password"))
        );
        assert!(LoginCredentials::new("mor_2314", "83r5^_").validate().is_ok());
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let debug = format!("{:?}", LoginCredentials::new("mor_2314", "83r5^_"));
        assert!(!debug.contains("83r5^_"));
    }

    #[test]
    fn test_login_response_without_user() {
        let response: LoginResponse = serde_json::from_str(r#"{"token":"abc"}"#).unwrap();
        assert_eq!(response.token, "abc");
        assert!(response.user.is_none());
    }
}
