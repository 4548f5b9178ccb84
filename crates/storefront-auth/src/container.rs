//! Session state container.
//!
//! ```text
//! anonymous --login_start--> loading
//! loading --login_success--> authenticated   (writes storage)
//! loading --login_failure--> anonymous
//! any --logout--> anonymous                  (purges storage)
//! authenticated --set_user--> authenticated  (writes storage)
//! ```
//!
//! Storage is read once, by [`SessionContainer::hydrate`]. Storage failures
//! never escape: a bad read means "no session", a bad write is logged.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use storefront_core::{EventBus, Subscription, ValidationError};

use crate::user::StoredUser;
use crate::{
    DurableStorage, LoginResponse, Session, SessionError, SessionPhase, StorageError, User,
    AUTH_TOKEN_KEY, USER_KEY,
};

/// Intent that produced a session transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionIntent {
    Hydrate,
    LoginStart,
    LoginSuccess,
    LoginFailure,
    Logout,
    SetUser,
}

impl SessionIntent {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionIntent::Hydrate => "hydrate",
            SessionIntent::LoginStart => "login_start",
            SessionIntent::LoginSuccess => "login_success",
            SessionIntent::LoginFailure => "login_failure",
            SessionIntent::Logout => "logout",
            SessionIntent::SetUser => "set_user",
        }
    }
}

/// Published once per applied transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionEvent {
    pub intent: SessionIntent,
    pub session: Session,
}

struct State {
    session: Session,
    hydrated: bool,
}

/// Owner of the process-wide session.
pub struct SessionContainer {
    state: Mutex<State>,
    storage: Arc<dyn DurableStorage>,
    events: EventBus<SessionEvent>,
}

impl SessionContainer {
    /// Create an anonymous, not yet hydrated container.
    pub fn new(storage: Arc<dyn DurableStorage>) -> Self {
        Self {
            state: Mutex::new(State {
                session: Session::anonymous(),
                hydrated: false,
            }),
            storage,
            events: EventBus::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Restore the session from storage.
    ///
    /// Only the first call reads storage; later calls return the current
    /// session. Malformed stored data is purged and the session stays
    /// anonymous.
    pub fn hydrate(&self) -> Session {
        let (session, restored) = {
            let mut state = self.lock();
            if state.hydrated {
                tracing::debug!("session already hydrated");
                return state.session.clone();
            }
            state.hydrated = true;

            if state.session.phase() != SessionPhase::Anonymous {
                return state.session.clone();
            }
            match restore(self.storage.as_ref()) {
                Some(session) => {
                    state.session = session.clone();
                    (session, true)
                }
                None => (state.session.clone(), false),
            }
        };

        if restored {
            tracing::info!(subject = ?session.subject_id, "session restored from storage");
            self.events.emit(&SessionEvent {
                intent: SessionIntent::Hydrate,
                session: session.clone(),
            });
        } else {
            tracing::debug!("no stored session");
        }
        session
    }

    pub fn is_hydrated(&self) -> bool {
        self.lock().hydrated
    }

    /// Current session snapshot.
    pub fn session(&self) -> Session {
        self.lock().session.clone()
    }

    pub fn phase(&self) -> SessionPhase {
        self.lock().session.phase()
    }

    /// Bearer token of the authenticated session.
    pub fn token(&self) -> Option<String> {
        self.lock().session.token.clone()
    }

    pub fn login_start(&self) -> Result<Session, SessionError> {
        self.transition(SessionIntent::LoginStart, |session, _| {
            require(session, SessionPhase::Anonymous, SessionIntent::LoginStart)?;
            *session = Session::loading();
            Ok(())
        })
    }

    /// Complete a login and write it to storage.
    pub fn login_success(&self, token: impl Into<String>, user: User) -> Result<Session, SessionError> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(ValidationError::Empty("token").into());
        }
        user.validate()?;

        self.transition(SessionIntent::LoginSuccess, |session, storage| {
            require(session, SessionPhase::Loading, SessionIntent::LoginSuccess)?;
            if let Err(error) = persist(storage, &token, &user) {
                tracing::warn!(%error, "failed to persist session");
            }
            *session = Session::authenticated(token, user);
            Ok(())
        })
    }

    pub fn login_failure(&self) -> Result<Session, SessionError> {
        self.transition(SessionIntent::LoginFailure, |session, _| {
            require(session, SessionPhase::Loading, SessionIntent::LoginFailure)?;
            *session = Session::anonymous();
            Ok(())
        })
    }

    /// Sign out from any phase and purge storage.
    pub fn logout(&self) -> Session {
        let result = self.transition(SessionIntent::Logout, |session, storage| {
            purge(storage);
            *session = Session::anonymous();
            Ok(())
        });
        result.unwrap_or_else(|_| Session::anonymous())
    }

    /// Replace the signed-in user's details.
    pub fn set_user(&self, user: User) -> Result<Session, SessionError> {
        user.validate()?;
        self.transition(SessionIntent::SetUser, |session, storage| {
            require(session, SessionPhase::Authenticated, SessionIntent::SetUser)?;
            let token = session.token.clone().unwrap_or_default();
            if let Err(error) = persist(storage, &token, &user) {
                tracing::warn!(%error, "failed to persist user");
            }
            *session = Session::authenticated(token, user);
            Ok(())
        })
    }

    /// Listen to every applied transition.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&SessionEvent) + Send + Sync + 'static,
    {
        self.events.subscribe(listener)
    }

    fn transition<F>(&self, intent: SessionIntent, apply: F) -> Result<Session, SessionError>
    where
        F: FnOnce(&mut Session, &dyn DurableStorage) -> Result<(), SessionError>,
    {
        let session = {
            let mut state = self.lock();
            if let Err(error) = apply(&mut state.session, self.storage.as_ref()) {
                tracing::debug!(intent = intent.as_str(), %error, "session intent rejected");
                return Err(error);
            }
            state.session.clone()
        };

        tracing::info!(intent = intent.as_str(), phase = %session.phase(), "session transition");
        self.events.emit(&SessionEvent {
            intent,
            session: session.clone(),
        });
        Ok(session)
    }
}

impl std::fmt::Debug for SessionContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("SessionContainer")
            .field("phase", &state.session.phase())
            .field("hydrated", &state.hydrated)
            .finish()
    }
}

fn require(session: &Session, phase: SessionPhase, intent: SessionIntent) -> Result<(), SessionError> {
    if session.phase() == phase {
        Ok(())
    } else {
        Err(SessionError::InvalidTransition {
            from: session.phase(),
            intent: intent.as_str(),
        })
    }
}

fn restore(storage: &dyn DurableStorage) -> Option<Session> {
    match load(storage) {
        Ok(session) => session,
        Err(error) => {
            tracing::warn!(%error, "discarding stored session");
            purge(storage);
            None
        }
    }
}

fn load(storage: &dyn DurableStorage) -> Result<Option<Session>, StorageError> {
    let token = storage.get(AUTH_TOKEN_KEY)?.filter(|v| !v.trim().is_empty());
    let user = storage.get(USER_KEY)?.filter(|v| !v.trim().is_empty());

    match (token, user) {
        (Some(token), Some(user)) => {
            let user = serde_json::from_str::<StoredUser>(&user)?.into_user();
            user.validate()
                .map_err(|e| StorageError::Malformed(e.to_string()))?;
            Ok(Some(Session::authenticated(token, user)))
        }
        (None, None) => Ok(None),
        _ => Err(StorageError::Malformed("incomplete session".to_string())),
    }
}

fn persist(storage: &dyn DurableStorage, token: &str, user: &User) -> Result<(), StorageError> {
    let stored = serde_json::to_string(&LoginResponse {
        token: token.to_string(),
        user: Some(user.clone()),
    })?;
    storage.set(AUTH_TOKEN_KEY, token)?;
    storage.set(USER_KEY, &stored)
}

fn purge(storage: &dyn DurableStorage) {
    for key in [AUTH_TOKEN_KEY, USER_KEY] {
        if let Err(error) = storage.delete(key) {
            tracing::warn!(key, %error, "failed to clear stored session");
        }
    }
}
