use async_trait::async_trait;
use models::{Credentials, Director, Genre, LoginResponse, Movie, Profile, ProfilePatch, Registration};

use crate::error::ApiError;

/// One call per backend resource; the only way the client reaches the network.
///
/// Every call is a single request/response pair with no retry. Authenticated
/// calls take the bearer token explicitly: the session store owns it, the
/// gateway only attaches it.
#[async_trait]
pub trait MovieApi: Send + Sync {
    async fn register(&self, registration: &Registration) -> Result<Profile, ApiError>;
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError>;

    async fn list_movies(&self, token: &str) -> Result<Vec<Movie>, ApiError>;
    async fn get_movie(&self, token: &str, movie_id: &str) -> Result<Movie, ApiError>;
    async fn get_director(&self, token: &str, name: &str) -> Result<Director, ApiError>;
    async fn get_genre(&self, token: &str, name: &str) -> Result<Genre, ApiError>;

    async fn get_user(&self, token: &str, username: &str) -> Result<Profile, ApiError>;
    async fn update_user(&self, token: &str, username: &str, patch: &ProfilePatch) -> Result<Profile, ApiError>;
    async fn delete_user(&self, token: &str, username: &str) -> Result<(), ApiError>;

    /// Returns the full updated profile.
    async fn add_favorite(&self, token: &str, username: &str, movie_id: &str) -> Result<Profile, ApiError>;
    /// Returns the full updated profile.
    async fn remove_favorite(&self, token: &str, username: &str, movie_id: &str) -> Result<Profile, ApiError>;
}
