//! Session state manager for the demo authentication flow.
//!
//! # Responsibility
//! - Own the current `AuthState` and its durable snapshot.
//! - Provide async login behind an artificial delay and synchronous logout.
//!
//! # Invariants
//! - A rejected login leaves state and storage untouched.
//! - Logout removes the storage key rather than writing an empty snapshot.
//! - Credentials never reach the log output.

use crate::model::user::{AuthState, User};
use crate::storage::{KeyValueStorage, AUTH_KEY};
use crate::store::subscription::{SubscriptionId, Subscribers};
use crate::store::StoreResult;
use log::{info, warn};
use std::time::Duration;

/// Minimum password length accepted by the demo policy.
pub const MIN_PASSWORD_CHARS: usize = 6;
/// Artificial delay standing in for an authentication round-trip.
pub const DEFAULT_LOGIN_DELAY: Duration = Duration::from_millis(1000);

/// Result of a login attempt. Rejection is an outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    Authenticated(User),
    Rejected,
}

impl LoginOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    LoggedIn(User),
    LoggedOut,
}

pub type AuthListener = dyn FnMut(&AuthEvent, &AuthState);

pub struct SessionStore<S: KeyValueStorage> {
    storage: S,
    state: AuthState,
    login_delay: Duration,
    subscribers: Subscribers<AuthListener>,
}

impl<S: KeyValueStorage> SessionStore<S> {
    /// Restores the persisted auth snapshot, if any.
    ///
    /// A malformed snapshot is removed from storage and the store starts
    /// unauthenticated.
    pub fn load(storage: S) -> StoreResult<Self> {
        let state = match storage.get(AUTH_KEY)? {
            None => AuthState::anonymous(),
            Some(raw) => match serde_json::from_str::<AuthState>(&raw) {
                Ok(state) => {
                    info!(
                        "event=auth_load module=session_store status=ok authenticated={}",
                        state.is_authenticated()
                    );
                    state
                }
                Err(err) => {
                    warn!(
                        "event=auth_load module=session_store status=discarded reason=malformed error={}",
                        err
                    );
                    storage.remove(AUTH_KEY)?;
                    AuthState::anonymous()
                }
            },
        };

        Ok(Self {
            storage,
            state,
            login_delay: DEFAULT_LOGIN_DELAY,
            subscribers: Subscribers::default(),
        })
    }

    pub fn with_login_delay(mut self, delay: Duration) -> Self {
        self.login_delay = delay;
        self
    }

    pub fn auth_state(&self) -> &AuthState {
        &self.state
    }

    pub fn current_user(&self) -> Option<&User> {
        self.state.user()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.is_authenticated()
    }

    /// Attempts a demo login after the configured delay.
    ///
    /// # Contract
    /// - Accepts any non-empty email with a password of at least
    ///   `MIN_PASSWORD_CHARS` characters.
    /// - On success the user name is the email local part and the snapshot
    ///   is persisted before state changes.
    ///
    /// # Errors
    /// - Returns storage errors from persisting a successful login.
    pub async fn login(&mut self, email: &str, password: &str) -> StoreResult<LoginOutcome> {
        tokio::time::sleep(self.login_delay).await;

        if email.is_empty() || password.chars().count() < MIN_PASSWORD_CHARS {
            info!("event=login module=session_store status=rejected reason=invalid_credentials");
            return Ok(LoginOutcome::Rejected);
        }

        let user = User::from_email(email);
        let next = AuthState::authenticated(user.clone());
        let payload = serde_json::to_string(&next)?;
        self.storage.set(AUTH_KEY, &payload)?;
        self.state = next;

        info!("event=login module=session_store status=ok");
        self.notify(&AuthEvent::LoggedIn(user.clone()));
        Ok(LoginOutcome::Authenticated(user))
    }

    /// Clears the session and erases the persisted snapshot.
    pub fn logout(&mut self) -> StoreResult<()> {
        self.storage.remove(AUTH_KEY)?;
        let was_authenticated = self.state.is_authenticated();
        self.state = AuthState::anonymous();

        info!(
            "event=logout module=session_store status=ok was_authenticated={}",
            was_authenticated
        );
        if was_authenticated {
            self.notify(&AuthEvent::LoggedOut);
        }
        Ok(())
    }

    pub fn subscribe(
        &mut self,
        listener: impl FnMut(&AuthEvent, &AuthState) + 'static,
    ) -> SubscriptionId {
        self.subscribers.insert(Box::new(listener))
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.remove(id)
    }

    fn notify(&mut self, event: &AuthEvent) {
        for listener in self.subscribers.listeners_mut() {
            listener(event, &self.state);
        }
    }
}
