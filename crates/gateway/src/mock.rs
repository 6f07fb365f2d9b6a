//! In-memory [`MovieApi`] for tests and offline demos.
//!
//! Behaves like the real backend for the calls the client makes: issues
//! tokens on login, checks them on every authenticated call, dedups
//! favorites, and answers with the same status codes. Failures and latency
//! can be injected per call.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use models::{Credentials, Director, Genre, LoginResponse, Movie, Profile, ProfilePatch, Registration};
use uuid::Uuid;

use crate::api::MovieApi;
use crate::error::ApiError;

#[derive(Default)]
struct State {
    users: HashMap<String, (String, Profile)>, // username -> (password, profile)
    tokens: HashMap<String, String>,           // token -> username
    movies: Vec<Movie>,
    injected: VecDeque<ApiError>,
    calls: HashMap<&'static str, usize>,
}

#[derive(Default)]
pub struct MockMovieApi {
    state: Mutex<State>,
    latency: Mutex<Option<Duration>>,
}

impl MockMovieApi {
    pub fn new() -> Self { Self::default() }

    pub fn with_movies(movies: impl IntoIterator<Item = Movie>) -> Self {
        let api = Self::default();
        api.lock().movies.extend(movies);
        api
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Seed an account directly, bypassing registration.
    pub fn add_user(&self, username: &str, password: &str, email: &str) {
        let profile = Profile { username: username.into(), email: email.into(), birthday: None, favorite_movies: Vec::new() };
        self.lock().users.insert(username.into(), (password.into(), profile));
    }

    pub fn add_movie(&self, movie: Movie) {
        self.lock().movies.push(movie);
    }

    pub fn remove_movie(&self, movie_id: &str) {
        self.lock().movies.retain(|m| m.id != movie_id);
    }

    /// Server-side view of a user, for asserting on what the backend holds.
    pub fn profile(&self, username: &str) -> Option<Profile> {
        self.lock().users.get(username).map(|(_, p)| p.clone())
    }

    /// Make the next call (whichever it is) fail with `err`.
    pub fn fail_next(&self, err: ApiError) {
        self.lock().injected.push_back(err);
    }

    /// Delay every subsequent call.
    pub fn set_latency(&self, latency: Option<Duration>) {
        *self.latency.lock().unwrap_or_else(|e| e.into_inner()) = latency;
    }

    /// Forget all issued tokens, as if they had expired.
    pub fn expire_tokens(&self) {
        self.lock().tokens.clear();
    }

    pub fn calls(&self, endpoint: &str) -> usize {
        self.lock().calls.get(endpoint).copied().unwrap_or(0)
    }

    async fn enter(&self, endpoint: &'static str) -> Result<(), ApiError> {
        let latency = *self.latency.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        let mut state = self.lock();
        *state.calls.entry(endpoint).or_default() += 1;
        match state.injected.pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn authorize(state: &State, token: &str, username: Option<&str>) -> Result<String, ApiError> {
        let owner = state
            .tokens
            .get(token)
            .ok_or_else(|| ApiError::from_status(401, "Unauthorized"))?;
        if let Some(username) = username {
            if owner != username {
                return Err(ApiError::from_status(403, "Permission denied"));
            }
        }
        Ok(owner.clone())
    }

    fn user_mut<'s>(state: &'s mut State, username: &str) -> Result<&'s mut Profile, ApiError> {
        state
            .users
            .get_mut(username)
            .map(|(_, p)| p)
            .ok_or_else(|| ApiError::from_status(404, format!("{username} was not found")))
    }
}

#[async_trait]
impl MovieApi for MockMovieApi {
    async fn register(&self, registration: &Registration) -> Result<Profile, ApiError> {
        self.enter("register").await?;
        let mut state = self.lock();
        if state.users.contains_key(&registration.username) {
            return Err(ApiError::from_status(400, format!("{} already exists", registration.username)));
        }
        let profile = Profile {
            username: registration.username.clone(),
            email: registration.email.clone(),
            birthday: registration.birthday.clone(),
            favorite_movies: Vec::new(),
        };
        state.users.insert(registration.username.clone(), (registration.password.clone(), profile.clone()));
        Ok(profile)
    }

    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError> {
        self.enter("login").await?;
        let mut state = self.lock();
        let profile = match state.users.get(&credentials.username) {
            Some((password, profile)) if *password == credentials.password => profile.clone(),
            _ => return Err(ApiError::from_status(401, "Incorrect username or password.")),
        };
        let token = Uuid::new_v4().to_string();
        state.tokens.insert(token.clone(), profile.username.clone());
        Ok(LoginResponse { token, user: profile })
    }

    async fn list_movies(&self, token: &str) -> Result<Vec<Movie>, ApiError> {
        self.enter("movies").await?;
        let state = self.lock();
        Self::authorize(&state, token, None)?;
        Ok(state.movies.clone())
    }

    async fn get_movie(&self, token: &str, movie_id: &str) -> Result<Movie, ApiError> {
        self.enter("movie").await?;
        let state = self.lock();
        Self::authorize(&state, token, None)?;
        state
            .movies
            .iter()
            .find(|m| m.id == movie_id)
            .cloned()
            .ok_or_else(|| ApiError::from_status(404, "Movie not found"))
    }

    async fn get_director(&self, token: &str, name: &str) -> Result<Director, ApiError> {
        self.enter("director").await?;
        let state = self.lock();
        Self::authorize(&state, token, None)?;
        state
            .movies
            .iter()
            .map(|m| &m.director)
            .find(|d| d.name == name)
            .cloned()
            .ok_or_else(|| ApiError::from_status(404, "Director not found"))
    }

    async fn get_genre(&self, token: &str, name: &str) -> Result<Genre, ApiError> {
        self.enter("genre").await?;
        let state = self.lock();
        Self::authorize(&state, token, None)?;
        state
            .movies
            .iter()
            .map(|m| &m.genre)
            .find(|g| g.name == name)
            .cloned()
            .ok_or_else(|| ApiError::from_status(404, "Genre not found"))
    }

    async fn get_user(&self, token: &str, username: &str) -> Result<Profile, ApiError> {
        self.enter("user").await?;
        let mut state = self.lock();
        Self::authorize(&state, token, Some(username))?;
        Self::user_mut(&mut state, username).map(|p| p.clone())
    }

    async fn update_user(&self, token: &str, username: &str, patch: &ProfilePatch) -> Result<Profile, ApiError> {
        self.enter("update_user").await?;
        let mut state = self.lock();
        Self::authorize(&state, token, Some(username))?;
        if let Some(new_name) = &patch.username {
            if new_name != username && state.users.contains_key(new_name) {
                return Err(ApiError::from_status(400, format!("{new_name} already exists")));
            }
        }
        let (mut password, mut profile) = state
            .users
            .remove(username)
            .ok_or_else(|| ApiError::from_status(404, format!("{username} was not found")))?;
        if let Some(v) = &patch.username { profile.username = v.clone(); }
        if let Some(v) = &patch.email { profile.email = v.clone(); }
        if let Some(v) = &patch.birthday { profile.birthday = Some(v.clone()); }
        if let Some(v) = &patch.password { password = v.clone(); }
        for owner in state.tokens.values_mut() {
            if owner == username {
                *owner = profile.username.clone();
            }
        }
        state.users.insert(profile.username.clone(), (password, profile.clone()));
        Ok(profile)
    }

    async fn delete_user(&self, token: &str, username: &str) -> Result<(), ApiError> {
        self.enter("delete_user").await?;
        let mut state = self.lock();
        Self::authorize(&state, token, Some(username))?;
        state
            .users
            .remove(username)
            .ok_or_else(|| ApiError::from_status(404, format!("{username} was not found")))?;
        state.tokens.retain(|_, owner| owner != username);
        Ok(())
    }

    async fn add_favorite(&self, token: &str, username: &str, movie_id: &str) -> Result<Profile, ApiError> {
        self.enter("add_favorite").await?;
        let mut state = self.lock();
        Self::authorize(&state, token, Some(username))?;
        if !state.movies.iter().any(|m| m.id == movie_id) {
            return Err(ApiError::from_status(404, "Movie not found"));
        }
        let profile = Self::user_mut(&mut state, username)?;
        if !profile.favorite_movies.iter().any(|id| id == movie_id) {
            profile.favorite_movies.push(movie_id.to_string());
        }
        Ok(profile.clone())
    }

    async fn remove_favorite(&self, token: &str, username: &str, movie_id: &str) -> Result<Profile, ApiError> {
        self.enter("remove_favorite").await?;
        let mut state = self.lock();
        Self::authorize(&state, token, Some(username))?;
        let profile = Self::user_mut(&mut state, username)?;
        profile.favorite_movies.retain(|id| id != movie_id);
        Ok(profile.clone())
    }
}

/// A catalog entry with placeholder details, for seeding the mock.
pub fn sample_movie(id: &str, title: &str) -> Movie {
    Movie {
        id: id.to_string(),
        title: title.to_string(),
        description: format!("{title} description"),
        genre: Genre { name: "Drama".into(), description: None },
        director: Director { name: format!("Director of {title}"), bio: String::new(), birth_year: Some(1950), death_year: None },
        release_date: None,
        image_path: None,
    }
}
