use std::sync::Arc;

use gateway::MovieApi;
use models::{Director, Genre, Movie};
use tracing::instrument;

use crate::errors::SessionError;
use crate::session_store::SessionStore;
use crate::storage::SessionStorage;

/// Read-only catalog lookups made with the current session's token.
pub struct Catalog<G: MovieApi, S: SessionStorage> {
    sessions: Arc<SessionStore<G, S>>,
}

impl<G: MovieApi, S: SessionStorage> Catalog<G, S> {
    pub fn new(sessions: Arc<SessionStore<G, S>>) -> Self { Self { sessions } }

    #[instrument(skip(self))]
    pub async fn list_movies(&self) -> Result<Vec<Movie>, SessionError> {
        let session = self.sessions.require().await?;
        Ok(self.sessions.gateway().list_movies(&session.token).await?)
    }

    #[instrument(skip(self))]
    pub async fn get_movie(&self, movie_id: &str) -> Result<Movie, SessionError> {
        let session = self.sessions.require().await?;
        required("movie id", movie_id)?;
        Ok(self.sessions.gateway().get_movie(&session.token, movie_id).await?)
    }

    #[instrument(skip(self))]
    pub async fn get_director(&self, name: &str) -> Result<Director, SessionError> {
        let session = self.sessions.require().await?;
        required("director name", name)?;
        Ok(self.sessions.gateway().get_director(&session.token, name).await?)
    }

    #[instrument(skip(self))]
    pub async fn get_genre(&self, name: &str) -> Result<Genre, SessionError> {
        let session = self.sessions.require().await?;
        required("genre name", name)?;
        Ok(self.sessions.gateway().get_genre(&session.token, name).await?)
    }
}

fn required(what: &str, value: &str) -> Result<(), SessionError> {
    if value.trim().is_empty() {
        return Err(SessionError::Validation(format!("{what} required")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemorySessionStorage;
    use gateway::mock::{sample_movie, MockMovieApi};
    use gateway::ErrorKind;
    use models::Credentials;

    async fn catalog(login: bool) -> (Arc<MockMovieApi>, Catalog<MockMovieApi, MemorySessionStorage>) {
        let api = Arc::new(MockMovieApi::with_movies([sample_movie("m1", "Heat"), sample_movie("m2", "Alien")]));
        api.add_user("alice", "pw", "a@b.com");
        let sessions = Arc::new(SessionStore::open(Arc::clone(&api), MemorySessionStorage::new()).await.unwrap());
        if login {
            sessions.login(&Credentials::new("alice", "pw")).await.unwrap();
        }
        (api, Catalog::new(sessions))
    }

    #[tokio::test]
    async fn lookups_use_session_token() {
        let (_api, catalog) = catalog(true).await;
        assert_eq!(catalog.list_movies().await.unwrap().len(), 2);
        assert_eq!(catalog.get_movie("m2").await.unwrap().title, "Alien");
        assert_eq!(catalog.get_director("Director of Heat").await.unwrap().birth_year, Some(1950));
        assert_eq!(catalog.get_genre("Drama").await.unwrap().name, "Drama");
        assert_eq!(catalog.get_movie("nope").await.unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn anonymous_catalog_is_rejected() {
        let (api, catalog) = catalog(false).await;
        assert!(matches!(catalog.list_movies().await, Err(SessionError::Unauthenticated)));
        assert!(matches!(catalog.get_genre("Drama").await, Err(SessionError::Unauthenticated)));
        assert_eq!(api.calls("movies"), 0);
    }

    #[tokio::test]
    async fn expired_token_surfaces_as_auth_error() {
        let (api, catalog) = catalog(true).await;
        api.expire_tokens();
        assert_eq!(catalog.list_movies().await.unwrap_err().kind(), ErrorKind::Auth);
    }
}
