//! Session Store: the single owner of the authenticated identity.
//!
//! Holds at most one [`Session`] and persists it through a
//! [`SessionStorage`]. Every mutation persists first and swaps the in-memory
//! value second, both under the write lock, so readers observe either the
//! old complete record or the new one.
//!
//! Responses are committed only if the session that issued the request is
//! still current (same token). A reply that lands after logout or re-login is
//! handed back to the caller but never resurrects or overwrites newer state.

use std::sync::Arc;

use gateway::{ApiError, ErrorKind, MovieApi};
use models::{Credentials, FavoriteSet, Profile, ProfilePatch, Registration, Session};
use tokio::sync::{broadcast::Receiver, RwLock};
use tracing::{debug, info, instrument, warn};

use crate::errors::SessionError;
use crate::events::{EventBroadcaster, SessionEvent};
use crate::storage::SessionStorage;

pub struct SessionStore<G: MovieApi, S: SessionStorage> {
    gateway: Arc<G>,
    storage: S,
    current: RwLock<Option<Session>>,
    events: EventBroadcaster,
}

impl<G: MovieApi, S: SessionStorage> SessionStore<G, S> {
    /// Start with whatever session the storage holds.
    pub async fn open(gateway: Arc<G>, storage: S) -> Result<Self, SessionError> {
        let restored = storage.load().await?;
        if let Some(session) = &restored {
            info!(username = %session.username(), "session restored");
        }
        Ok(Self { gateway, storage, current: RwLock::new(restored), events: EventBroadcaster::new() })
    }

    pub fn gateway(&self) -> &Arc<G> { &self.gateway }

    pub fn storage(&self) -> &S { &self.storage }

    pub fn subscribe(&self) -> Receiver<SessionEvent> { self.events.subscribe() }

    pub async fn current_session(&self) -> Option<Session> {
        self.current.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.current.read().await.is_some()
    }

    pub(crate) async fn require(&self) -> Result<Session, SessionError> {
        self.current_session().await.ok_or(SessionError::Unauthenticated)
    }

    /// Authenticate and replace any existing session.
    ///
    /// On failure the existing session, if any, is left as it was.
    #[instrument(skip(self, credentials), fields(username = %credentials.username))]
    pub async fn login(&self, credentials: &Credentials) -> Result<Session, SessionError> {
        credentials.validate()?;
        let response = self.gateway.login(credentials).await?;
        let session = response
            .into_session()
            .map_err(|e| ApiError::new(ErrorKind::Server, None, format!("malformed login response: {e}")))?;

        let mut current = self.current.write().await;
        self.storage.save(&session).await?;
        *current = Some(session.clone());
        drop(current);

        info!(username = %session.username(), "logged in");
        self.events.broadcast(SessionEvent::LoggedIn { username: session.username().to_string() });
        Ok(session)
    }

    /// Create the account, then log in with the same credentials.
    #[instrument(skip(self, registration), fields(username = %registration.username))]
    pub async fn register(&self, registration: &Registration) -> Result<Session, SessionError> {
        registration.validate()?;
        let created = self.gateway.register(registration).await?;
        debug!(username = %created.username, "account created");
        self.login(&registration.credentials()).await
    }

    /// Drop the session and its persisted record. Safe to call when anonymous.
    ///
    /// The in-memory session is cleared even if the storage write fails; the
    /// storage error is still returned.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), SessionError> {
        let mut current = self.current.write().await;
        let previous = current.take();
        let cleared = self.storage.clear().await;
        drop(current);

        if let Some(session) = previous {
            info!(username = %session.username(), "logged out");
            self.events.broadcast(SessionEvent::LoggedOut);
        }
        if let Err(e) = &cleared {
            warn!(error = %e, "failed to clear persisted session");
        }
        cleared.map_err(SessionError::from)
    }

    /// Replace the cached profile with the server's copy.
    #[instrument(skip(self))]
    pub async fn refresh_profile(&self) -> Result<Session, SessionError> {
        let session = self.require().await?;
        let profile = self.gateway.get_user(&session.token, session.username()).await?;
        let (updated, applied) = self.commit_profile(&session.token, profile).await?;
        if applied {
            self.events.broadcast(SessionEvent::ProfileUpdated { username: updated.username().to_string() });
        }
        Ok(updated)
    }

    /// Send a partial update; the cached profile becomes whatever the server returns.
    #[instrument(skip(self, patch))]
    pub async fn update_profile(&self, patch: &ProfilePatch) -> Result<Session, SessionError> {
        patch.validate()?;
        let session = self.require().await?;
        let profile = self.gateway.update_user(&session.token, session.username(), patch).await?;
        let (updated, applied) = self.commit_profile(&session.token, profile).await?;
        if applied {
            info!(username = %updated.username(), "profile updated");
            self.events.broadcast(SessionEvent::ProfileUpdated { username: updated.username().to_string() });
        }
        Ok(updated)
    }

    /// Delete the account, then clear the session exactly like [`logout`](Self::logout).
    #[instrument(skip(self))]
    pub async fn deregister(&self) -> Result<(), SessionError> {
        let session = self.require().await?;
        self.gateway.delete_user(&session.token, session.username()).await?;
        info!(username = %session.username(), "account deleted");

        let mut current = self.current.write().await;
        if current.as_ref().map(|s| s.token.as_str()) != Some(session.token.as_str()) {
            // already logged out or someone else logged in meanwhile
            return Ok(());
        }
        *current = None;
        let cleared = self.storage.clear().await;
        drop(current);

        self.events.broadcast(SessionEvent::LoggedOut);
        if let Err(e) = &cleared {
            warn!(error = %e, "account deleted but persisted session could not be cleared");
        }
        cleared.map_err(SessionError::from)
    }

    /// Apply a profile returned by a favorite add/remove.
    pub(crate) async fn apply_favorites(&self, token: &str, profile: Profile) -> Result<FavoriteSet, SessionError> {
        let (updated, applied) = self.commit_profile(token, profile).await?;
        let favorites = updated.favorites();
        if applied {
            self.events.broadcast(SessionEvent::FavoritesChanged {
                username: updated.username().to_string(),
                favorites: favorites.clone(),
            });
        }
        Ok(favorites)
    }

    /// Returns the session built from `profile` and whether it became current.
    async fn commit_profile(&self, token: &str, profile: Profile) -> Result<(Session, bool), SessionError> {
        let updated = Session::new(token, profile)
            .map_err(|e| ApiError::new(ErrorKind::Server, None, format!("malformed profile: {e}")))?;

        let mut current = self.current.write().await;
        if current.as_ref().map(|s| s.token.as_str()) != Some(token) {
            debug!(username = %updated.username(), "session changed while request was in flight; response not applied");
            return Ok((updated, false));
        }
        self.storage.save(&updated).await?;
        *current = Some(updated.clone());
        Ok((updated, true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemorySessionStorage;
    use gateway::mock::{sample_movie, MockMovieApi};

    async fn store() -> (Arc<MockMovieApi>, SessionStore<MockMovieApi, MemorySessionStorage>) {
        let api = Arc::new(MockMovieApi::with_movies([sample_movie("m1", "Heat")]));
        api.add_user("alice", "pw", "alice@old.com");
        let store = SessionStore::open(Arc::clone(&api), MemorySessionStorage::new()).await.unwrap();
        (api, store)
    }

    #[tokio::test]
    async fn login_persists_token_and_profile_together() {
        let (_api, store) = store().await;
        let session = store.login(&Credentials::new("alice", "pw")).await.unwrap();
        assert!(!session.token.is_empty());
        assert_eq!(session.username(), "alice");
        assert_eq!(store.storage().snapshot(), Some(session.clone()));
        assert_eq!(store.current_session().await, Some(session));
    }

    #[tokio::test]
    async fn failed_login_keeps_existing_session() {
        let (_api, store) = store().await;
        let before = store.login(&Credentials::new("alice", "pw")).await.unwrap();

        let err = store.login(&Credentials::new("alice", "wrong")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Auth);
        assert_eq!(store.current_session().await, Some(before.clone()));
        assert_eq!(store.storage().snapshot(), Some(before));
    }

    #[tokio::test]
    async fn invalid_input_never_reaches_the_backend() {
        let (api, store) = store().await;
        let err = store.login(&Credentials::new("", "pw")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(api.calls("login"), 0);

        store.login(&Credentials::new("alice", "pw")).await.unwrap();
        let err = store.update_profile(&ProfilePatch::default()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(api.calls("update_user"), 0);
    }

    #[tokio::test]
    async fn logout_is_idempotent() {
        let (_api, store) = store().await;
        store.login(&Credentials::new("alice", "pw")).await.unwrap();
        store.logout().await.unwrap();
        assert!(!store.is_authenticated().await);
        store.logout().await.unwrap();
        assert!(!store.is_authenticated().await);
        assert!(store.storage().snapshot().is_none());
    }

    #[tokio::test]
    async fn register_creates_account_and_session() {
        let (api, store) = store().await;
        let registration = Registration {
            username: "bob".into(),
            password: "secret".into(),
            email: "bob@b.com".into(),
            birthday: Some("1990-01-02".into()),
        };
        let session = store.register(&registration).await.unwrap();
        assert_eq!(session.username(), "bob");
        assert!(api.profile("bob").is_some());

        let err = store.register(&registration).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(store.current_session().await, Some(session));
    }

    #[tokio::test]
    async fn update_profile_takes_server_representation() {
        let (api, store) = store().await;
        store.login(&Credentials::new("alice", "pw")).await.unwrap();
        let patch = ProfilePatch { email: Some("a@b.com".into()), ..ProfilePatch::default() };
        let session = store.update_profile(&patch).await.unwrap();
        assert_eq!(session.profile.email, "a@b.com");
        assert_eq!(api.profile("alice").unwrap().email, "a@b.com");
        assert_eq!(store.storage().snapshot().unwrap().profile.email, "a@b.com");
    }

    #[tokio::test]
    async fn failed_update_leaves_profile_untouched() {
        let (api, store) = store().await;
        let before = store.login(&Credentials::new("alice", "pw")).await.unwrap();
        api.fail_next(ApiError::from_status(500, "boom"));
        let patch = ProfilePatch { email: Some("a@b.com".into()), ..ProfilePatch::default() };
        let err = store.update_profile(&patch).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Server);
        assert_eq!(store.current_session().await, Some(before));
    }

    #[tokio::test]
    async fn storage_failure_keeps_previous_state() {
        let (_api, store) = store().await;
        let before = store.login(&Credentials::new("alice", "pw")).await.unwrap();
        store.storage().set_failing(true);
        let patch = ProfilePatch { email: Some("a@b.com".into()), ..ProfilePatch::default() };
        let err = store.update_profile(&patch).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Storage);
        assert_eq!(store.current_session().await, Some(before));
    }

    #[tokio::test]
    async fn failed_deregister_keeps_session() {
        let (api, store) = store().await;
        let before = store.login(&Credentials::new("alice", "pw")).await.unwrap();
        api.fail_next(ApiError::network("connection reset"));
        let err = store.deregister().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Network);
        assert_eq!(store.current_session().await, Some(before));

        store.deregister().await.unwrap();
        assert!(!store.is_authenticated().await);
        assert!(api.profile("alice").is_none());
    }

    #[tokio::test]
    async fn deregister_clears_session_even_if_storage_fails() {
        let (api, store) = store().await;
        store.login(&Credentials::new("alice", "pw")).await.unwrap();
        let mut rx = store.subscribe();
        store.storage().set_failing(true);

        let err = store.deregister().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Storage);
        assert!(api.profile("alice").is_none());
        assert!(!store.is_authenticated().await);
        assert_eq!(rx.recv().await.unwrap(), SessionEvent::LoggedOut);

        let err = store.deregister().await.unwrap_err();
        assert!(matches!(err, SessionError::Unauthenticated));
    }

    #[tokio::test]
    async fn anonymous_calls_are_rejected() {
        let (api, store) = store().await;
        assert!(matches!(store.refresh_profile().await, Err(SessionError::Unauthenticated)));
        assert!(matches!(store.deregister().await, Err(SessionError::Unauthenticated)));
        assert_eq!(api.calls("user") + api.calls("delete_user"), 0);
    }

    #[tokio::test]
    async fn open_restores_persisted_session() {
        let (api, store) = store().await;
        let session = store.login(&Credentials::new("alice", "pw")).await.unwrap();
        let storage = MemorySessionStorage::with_session(session.clone());
        let reopened = SessionStore::open(api, storage).await.unwrap();
        assert_eq!(reopened.current_session().await, Some(session));
    }

    #[tokio::test]
    async fn events_follow_transitions() {
        let (_api, store) = store().await;
        let mut rx = store.subscribe();
        store.login(&Credentials::new("alice", "pw")).await.unwrap();
        store.refresh_profile().await.unwrap();
        store.logout().await.unwrap();
        store.logout().await.unwrap();

        assert_eq!(rx.recv().await.unwrap(), SessionEvent::LoggedIn { username: "alice".into() });
        assert_eq!(rx.recv().await.unwrap(), SessionEvent::ProfileUpdated { username: "alice".into() });
        assert_eq!(rx.recv().await.unwrap(), SessionEvent::LoggedOut);
        assert!(rx.try_recv().is_err());
    }
}
