//! Session value and access decisions.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::User;

/// Route anonymous visitors are sent to.
pub const LOGIN_ROUTE: &str = "/login";

/// Where the session state machine is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    Anonymous,
    Loading,
    Authenticated,
}

impl SessionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionPhase::Anonymous => "anonymous",
            SessionPhase::Loading => "loading",
            SessionPhase::Authenticated => "authenticated",
        }
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of guarding a protected view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    /// A login is in progress; show a spinner.
    Pending,
    /// Not signed in; go to the given route.
    Redirect(&'static str),
    Allow,
}

/// Authentication state.
///
/// `is_authenticated` holds exactly when both `token` and `subject_id` are
/// present. Only [`SessionContainer`](crate::SessionContainer) builds
/// non-anonymous sessions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub subject_id: Option<String>,
    pub user: Option<User>,
    pub token: Option<String>,
    pub is_authenticated: bool,
    pub is_loading: bool,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub(crate) fn loading() -> Self {
        Self {
            is_loading: true,
            ..Self::default()
        }
    }

    pub(crate) fn authenticated(token: String, user: User) -> Self {
        Self {
            subject_id: Some(user.subject_id()),
            user: Some(user),
            token: Some(token),
            is_authenticated: true,
            is_loading: false,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        if self.is_loading {
            SessionPhase::Loading
        } else if self.is_authenticated {
            SessionPhase::Authenticated
        } else {
            SessionPhase::Anonymous
        }
    }

    pub fn access_decision(&self) -> AccessDecision {
        match self.phase() {
            SessionPhase::Loading => AccessDecision::Pending,
            SessionPhase::Anonymous => AccessDecision::Redirect(LOGIN_ROUTE),
            SessionPhase::Authenticated => AccessDecision::Allow,
        }
    }

    pub fn display_name(&self) -> Option<String> {
        self.user.as_ref().map(User::display_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: 2,
            username: "mor_2314".to_string(),
            email: "morrison@gmail.com".to_string(),
            first_name: "david".to_string(),
            last_name: "morrison".to_string(),
        }
    }

    #[test]
    fn test_phases() {
        assert_eq!(Session::anonymous().phase(), SessionPhase::Anonymous);
        assert_eq!(Session::loading().phase(), SessionPhase::Loading);

        let session = Session::authenticated("t".to_string(), user());
        assert_eq!(session.phase(), SessionPhase::Authenticated);
        assert_eq!(session.subject_id.as_deref(), Some("2"));
    }

    #[test]
    fn test_access_decision() {
        assert_eq!(Session::loading().access_decision(), AccessDecision::Pending);
        assert_eq!(
            Session::anonymous().access_decision(),
            AccessDecision::Redirect("/login")
        );
        assert_eq!(
            Session::authenticated("t".to_string(), user()).access_decision(),
            AccessDecision::Allow
        );
    }
}
