use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::user::{FavoriteSet, Profile};

/// The authenticated identity: bearer token and profile, always together.
///
/// This is the single record persisted on the client. Construct it through
/// [`Session::new`] so an empty token or username never gets stored.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub profile: Profile,
}

impl Session {
    pub fn new(token: impl Into<String>, profile: Profile) -> Result<Self, ModelError> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(ModelError::validation("token is empty"));
        }
        if profile.username.trim().is_empty() {
            return Err(ModelError::validation("profile has no username"));
        }
        Ok(Self { token, profile })
    }

    pub fn username(&self) -> &str { &self.profile.username }

    pub fn favorites(&self) -> FavoriteSet { self.profile.favorite_set() }

    pub fn is_favorite(&self, movie_id: &str) -> bool { self.profile.is_favorite(movie_id) }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("profile", &self.profile)
            .finish()
    }
}

/// `POST /login` response body.
#[derive(Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: Profile,
}

impl LoginResponse {
    pub fn into_session(self) -> Result<Session, ModelError> {
        Session::new(self.token, self.user)
    }
}

impl fmt::Debug for LoginResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginResponse")
            .field("token", &"<redacted>")
            .field("user", &self.user)
            .finish()
    }
}
