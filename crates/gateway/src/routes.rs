//! Backend route table.
//!
//! Paths are appended to the configured base URL one segment at a time, so
//! usernames and ids are percent-encoded and a base path like
//! `https://host/api` is preserved.

use reqwest::Url;

use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route<'a> {
    Register,
    Login,
    Movies,
    Movie(&'a str),
    Director(&'a str),
    Genre(&'a str),
    User(&'a str),
    AddFavorite { username: &'a str, movie_id: &'a str },
    RemoveFavorite { username: &'a str, movie_id: &'a str },
}

impl<'a> Route<'a> {
    /// Stable label for logs and metrics.
    pub fn name(&self) -> &'static str {
        match self {
            Route::Register => "register",
            Route::Login => "login",
            Route::Movies => "movies",
            Route::Movie(_) => "movie",
            Route::Director(_) => "director",
            Route::Genre(_) => "genre",
            Route::User(_) => "user",
            Route::AddFavorite { .. } => "add_favorite",
            Route::RemoveFavorite { .. } => "remove_favorite",
        }
    }

    pub fn segments(&self) -> Vec<&'a str> {
        match *self {
            Route::Register => vec!["users"],
            Route::Login => vec!["login"],
            Route::Movies => vec!["movies"],
            Route::Movie(id) => vec!["movies", "id", id],
            Route::Director(name) => vec!["directors", name],
            Route::Genre(name) => vec!["genres", name],
            Route::User(username) => vec!["User", username],
            Route::AddFavorite { username, movie_id } => vec!["User", username, "movies", movie_id],
            // the backend serves removal under the lowercase collection
            Route::RemoveFavorite { username, movie_id } => vec!["users", username, "movies", movie_id],
        }
    }

    pub fn url(&self, base: &Url) -> Result<Url, ApiError> {
        let segments = self.segments();
        if segments.iter().any(|s| s.trim().is_empty()) {
            return Err(ApiError::validation(format!("{} requires a non-empty path parameter", self.name())));
        }
        let mut url = base.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::validation(format!("base url {base} cannot carry a path")))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}
