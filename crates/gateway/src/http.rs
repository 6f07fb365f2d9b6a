use async_trait::async_trait;
use configs::BackendConfig;
use models::{Credentials, Director, Genre, LoginResponse, Movie, Profile, ProfilePatch, Registration};
use reqwest::{Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::api::MovieApi;
use crate::error::{extract_message, ApiError, ErrorKind};
use crate::observability::{FAILURES_TOTAL, REQUESTS_TOTAL, REQUEST_DURATION};
use crate::routes::Route;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// reqwest-backed [`MovieApi`].
///
/// Connect and total request timeouts come from [`BackendConfig`]; an
/// expired timeout surfaces as an [`ErrorKind::Network`] error.
#[derive(Clone, Debug)]
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpGateway {
    pub fn new(cfg: &BackendConfig) -> Result<Self, ApiError> {
        let base_url = Url::parse(&cfg.base_url)
            .map_err(|e| ApiError::validation(format!("invalid base url {}: {e}", cfg.base_url)))?;
        let client = reqwest::Client::builder()
            .connect_timeout(cfg.connect_timeout())
            .timeout(cfg.request_timeout())
            .user_agent(concat!("movieflix/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::network(format!("cannot build http client: {e}")))?;
        Ok(Self { client, base_url })
    }

    fn request(&self, method: Method, route: &Route<'_>, token: Option<&str>) -> Result<RequestBuilder, ApiError> {
        let url = route.url(&self.base_url)?;
        let mut builder = self
            .client
            .request(method, url)
            .header(REQUEST_ID_HEADER, Uuid::new_v4().to_string());
        if let Some(token) = token {
            if token.trim().is_empty() {
                return Err(ApiError::unauthenticated("missing bearer token"));
            }
            builder = builder.bearer_auth(token);
        }
        Ok(builder)
    }

    async fn execute(&self, route: &Route<'_>, builder: RequestBuilder) -> Result<Response, ApiError> {
        let endpoint = route.name();
        REQUESTS_TOTAL.inc();
        let timer = REQUEST_DURATION.with_label_values(&[endpoint]).start_timer();
        let sent = builder.send().await;
        timer.observe_duration();

        let response = match sent {
            Ok(response) => response,
            Err(e) => {
                let err = ApiError::from(e);
                FAILURES_TOTAL.with_label_values(&[err.kind.as_str()]).inc();
                warn!(endpoint, kind = %err.kind, error = %err.message, "request failed");
                return Err(err);
            }
        };

        let status = response.status();
        if status.is_success() {
            debug!(endpoint, status = status.as_u16(), "request ok");
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let err = ApiError::from_status(status.as_u16(), extract_message(status.as_u16(), &body));
        FAILURES_TOTAL.with_label_values(&[err.kind.as_str()]).inc();
        warn!(endpoint, status = status.as_u16(), kind = %err.kind, error = %err.message, "backend rejected request");
        Err(err)
    }

    async fn decode<T: DeserializeOwned>(route: &Route<'_>, response: Response) -> Result<T, ApiError> {
        let status = response.status().as_u16();
        let bytes = response.bytes().await.map_err(ApiError::from)?;
        serde_json::from_slice(&bytes).map_err(|e| {
            FAILURES_TOTAL.with_label_values(&[ErrorKind::Server.as_str()]).inc();
            warn!(endpoint = route.name(), status, error = %e, "undecodable response body");
            ApiError::new(ErrorKind::Server, Some(status), format!("unexpected response body: {e}"))
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, route: Route<'_>, token: &str) -> Result<T, ApiError> {
        let builder = self.request(Method::GET, &route, Some(token))?;
        let response = self.execute(&route, builder).await?;
        Self::decode(&route, response).await
    }
}

/// Any 4xx from `POST /login` means the credentials were refused, whatever
/// status the backend picked for it.
fn login_rejection(err: ApiError) -> ApiError {
    match err.status_code {
        Some(status @ 400..=499) => ApiError::new(ErrorKind::Auth, Some(status), err.message),
        _ => err,
    }
}

#[async_trait]
impl MovieApi for HttpGateway {
    #[instrument(skip(self, registration), fields(username = %registration.username))]
    async fn register(&self, registration: &Registration) -> Result<Profile, ApiError> {
        let route = Route::Register;
        let builder = self.request(Method::POST, &route, None)?.json(registration);
        let response = self.execute(&route, builder).await?;
        Self::decode(&route, response).await
    }

    #[instrument(skip(self, credentials), fields(username = %credentials.username))]
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError> {
        let route = Route::Login;
        let builder = self.request(Method::POST, &route, None)?.json(credentials);
        let response = self.execute(&route, builder).await.map_err(login_rejection)?;
        Self::decode(&route, response).await
    }

    #[instrument(skip(self, token))]
    async fn list_movies(&self, token: &str) -> Result<Vec<Movie>, ApiError> {
        self.get_json(Route::Movies, token).await
    }

    #[instrument(skip(self, token))]
    async fn get_movie(&self, token: &str, movie_id: &str) -> Result<Movie, ApiError> {
        self.get_json(Route::Movie(movie_id), token).await
    }

    #[instrument(skip(self, token))]
    async fn get_director(&self, token: &str, name: &str) -> Result<Director, ApiError> {
        self.get_json(Route::Director(name), token).await
    }

    #[instrument(skip(self, token))]
    async fn get_genre(&self, token: &str, name: &str) -> Result<Genre, ApiError> {
        self.get_json(Route::Genre(name), token).await
    }

    #[instrument(skip(self, token))]
    async fn get_user(&self, token: &str, username: &str) -> Result<Profile, ApiError> {
        self.get_json(Route::User(username), token).await
    }

    #[instrument(skip(self, token, patch))]
    async fn update_user(&self, token: &str, username: &str, patch: &ProfilePatch) -> Result<Profile, ApiError> {
        let route = Route::User(username);
        let builder = self.request(Method::PUT, &route, Some(token))?.json(patch);
        let response = self.execute(&route, builder).await?;
        Self::decode(&route, response).await
    }

    #[instrument(skip(self, token))]
    async fn delete_user(&self, token: &str, username: &str) -> Result<(), ApiError> {
        let route = Route::User(username);
        let builder = self.request(Method::DELETE, &route, Some(token))?;
        // body is a free-form confirmation message
        self.execute(&route, builder).await?;
        Ok(())
    }

    #[instrument(skip(self, token))]
    async fn add_favorite(&self, token: &str, username: &str, movie_id: &str) -> Result<Profile, ApiError> {
        let route = Route::AddFavorite { username, movie_id };
        let builder = self.request(Method::PUT, &route, Some(token))?;
        let response = self.execute(&route, builder).await?;
        Self::decode(&route, response).await
    }

    #[instrument(skip(self, token))]
    async fn remove_favorite(&self, token: &str, username: &str, movie_id: &str) -> Result<Profile, ApiError> {
        let route = Route::RemoveFavorite { username, movie_id };
        let builder = self.request(Method::DELETE, &route, Some(token))?;
        let response = self.execute(&route, builder).await?;
        Self::decode(&route, response).await
    }
}
