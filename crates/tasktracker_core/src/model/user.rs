//! Session identity model.
//!
//! # Invariants
//! - `AuthState` carries a user iff it is authenticated; the inconsistent
//!   combinations cannot be constructed or deserialized.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Placeholder identity assigned by the demo login flow.
pub const DEMO_USER_ID: &str = "1";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
}

impl User {
    /// Builds the demo identity for `email`.
    ///
    /// `name` is the part of the email before its first `@`, or the whole
    /// email when it has none.
    pub fn from_email(email: impl Into<String>) -> Self {
        let email = email.into();
        let name = email
            .split_once('@')
            .map_or(email.as_str(), |(local, _)| local)
            .to_string();
        Self {
            id: DEMO_USER_ID.to_string(),
            email,
            name,
        }
    }
}

/// Persisted authentication snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "AuthStateWire", into = "AuthStateWire")]
pub struct AuthState {
    user: Option<User>,
}

impl AuthState {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(user: User) -> Self {
        Self { user: Some(user) }
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthStateWire {
    user: Option<User>,
    is_authenticated: bool,
}

impl From<AuthState> for AuthStateWire {
    fn from(value: AuthState) -> Self {
        Self {
            is_authenticated: value.is_authenticated(),
            user: value.user,
        }
    }
}

impl TryFrom<AuthStateWire> for AuthState {
    type Error = AuthStateError;

    fn try_from(value: AuthStateWire) -> Result<Self, Self::Error> {
        match (value.user, value.is_authenticated) {
            (Some(user), true) => Ok(Self::authenticated(user)),
            (None, false) => Ok(Self::anonymous()),
            (Some(_), false) => Err(AuthStateError::UserWithoutAuthentication),
            (None, true) => Err(AuthStateError::AuthenticationWithoutUser),
        }
    }
}

/// Inconsistent persisted auth snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStateError {
    UserWithoutAuthentication,
    AuthenticationWithoutUser,
}

impl Display for AuthStateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UserWithoutAuthentication => {
                write!(f, "auth state has a user but isAuthenticated is false")
            }
            Self::AuthenticationWithoutUser => {
                write!(f, "auth state isAuthenticated is true but user is null")
            }
        }
    }
}

impl Error for AuthStateError {}
