use std::sync::Arc;

use dashmap::{mapref::entry::Entry, DashMap};
use futures_util::stream::{self, BoxStream, StreamExt};
use gateway::{ApiError, MovieApi};
use models::{FavoriteSet, Movie, MovieId};
use tracing::{debug, info, instrument, warn};

use crate::errors::FavoriteError;
use crate::session_store::SessionStore;
use crate::storage::SessionStorage;

/// One entry of [`FavoritesReconciler::load_favorite_movies`].
pub type FavoriteMovie = (MovieId, Result<Movie, ApiError>);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingChange {
    Add,
    Remove,
}

/// Keeps the session's favorite list in step with the server.
///
/// A toggle shows up immediately through an optimistic overlay keyed by
/// movie id; the session itself only ever stores the list the server sent
/// back. The overlay entry is also the per-id in-flight guard.
pub struct FavoritesReconciler<G: MovieApi, S: SessionStorage> {
    sessions: Arc<SessionStore<G, S>>,
    pending: DashMap<MovieId, PendingChange>,
}

/// Removes the overlay entry when the request finishes, however it finishes.
struct InFlight<'a> {
    pending: &'a DashMap<MovieId, PendingChange>,
    movie_id: MovieId,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.pending.remove(&self.movie_id);
    }
}

impl<G: MovieApi + 'static, S: SessionStorage> FavoritesReconciler<G, S> {
    pub fn new(sessions: Arc<SessionStore<G, S>>) -> Self {
        Self { sessions, pending: DashMap::new() }
    }

    /// Membership including any change still in flight. `false` when anonymous.
    pub async fn is_favorite(&self, movie_id: &str) -> bool {
        let Some(session) = self.sessions.current_session().await else { return false };
        if let Some(change) = self.pending.get(movie_id).map(|c| *c) {
            return change == PendingChange::Add;
        }
        session.is_favorite(movie_id)
    }

    /// Server-confirmed favorites. Empty when anonymous.
    pub async fn favorites(&self) -> FavoriteSet {
        self.sessions.current_session().await.map(|s| s.favorites()).unwrap_or_default()
    }

    pub fn pending(&self, movie_id: &str) -> Option<PendingChange> {
        self.pending.get(movie_id).map(|c| *c)
    }

    #[instrument(skip(self))]
    pub async fn add_favorite(&self, movie_id: &str) -> Result<FavoriteSet, FavoriteError> {
        self.apply(movie_id, PendingChange::Add).await
    }

    #[instrument(skip(self))]
    pub async fn remove_favorite(&self, movie_id: &str) -> Result<FavoriteSet, FavoriteError> {
        self.apply(movie_id, PendingChange::Remove).await
    }

    /// Add when not a confirmed favorite, remove otherwise.
    #[instrument(skip(self))]
    pub async fn toggle_favorite(&self, movie_id: &str) -> Result<FavoriteSet, FavoriteError> {
        let session = self.sessions.require().await?;
        let change = if session.is_favorite(movie_id) { PendingChange::Remove } else { PendingChange::Add };
        self.apply(movie_id, change).await
    }

    async fn apply(&self, movie_id: &str, change: PendingChange) -> Result<FavoriteSet, FavoriteError> {
        if movie_id.trim().is_empty() {
            return Err(FavoriteError::Validation("movie id required".into()));
        }
        let session = self.sessions.require().await?;
        let _guard = self.begin(movie_id, change)?;

        let gateway = self.sessions.gateway();
        let result = match change {
            PendingChange::Add => gateway.add_favorite(&session.token, session.username(), movie_id).await,
            PendingChange::Remove => gateway.remove_favorite(&session.token, session.username(), movie_id).await,
        };
        let profile = result.map_err(|e| {
            warn!(movie_id, ?change, kind = %e.kind, error = %e.message, "favorite change rejected");
            e
        })?;

        let favorites = self.sessions.apply_favorites(&session.token, profile).await?;
        info!(movie_id, ?change, count = favorites.len(), "favorites confirmed");
        Ok(favorites)
    }

    fn begin(&self, movie_id: &str, change: PendingChange) -> Result<InFlight<'_>, FavoriteError> {
        match self.pending.entry(movie_id.to_string()) {
            Entry::Occupied(_) => {
                debug!(movie_id, "favorite change already in flight");
                Err(FavoriteError::InFlight(movie_id.to_string()))
            }
            Entry::Vacant(slot) => {
                slot.insert(change);
                Ok(InFlight { pending: &self.pending, movie_id: movie_id.to_string() })
            }
        }
    }

    /// Fetch each favorite movie in list order, one request per id.
    ///
    /// The stream is lazy and finite. A failed fetch yields an error for that
    /// id and the stream moves on to the next one.
    pub async fn load_favorite_movies(&self) -> Result<BoxStream<'static, FavoriteMovie>, FavoriteError> {
        let session = self.sessions.require().await?;
        let ids = session.profile.favorite_ids();
        let token = session.token;
        let gateway = Arc::clone(self.sessions.gateway());
        debug!(count = ids.len(), "loading favorite movies");

        Ok(stream::iter(ids)
            .then(move |id| {
                let gateway = Arc::clone(&gateway);
                let token = token.clone();
                async move {
                    let movie = gateway.get_movie(&token, &id).await;
                    if let Err(e) = &movie {
                        warn!(movie_id = %id, kind = %e.kind, "favorite movie unavailable");
                    }
                    (id, movie)
                }
            })
            .boxed())
    }
}
