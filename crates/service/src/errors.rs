use gateway::{ApiError, ErrorKind};
use models::ModelError;
use thiserror::Error;

/// Local persistence failures (the session file).
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Errors from Session Store and Catalog operations
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("not logged in")]
    Unauthenticated,
    #[error(transparent)]
    Gateway(#[from] ApiError),
    #[error("session storage error: {0}")]
    Storage(#[from] StorageError),
}

impl From<ModelError> for SessionError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::Validation(msg) => SessionError::Validation(msg),
        }
    }
}

impl SessionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SessionError::Validation(_) => ErrorKind::Validation,
            SessionError::Unauthenticated => ErrorKind::Auth,
            SessionError::Gateway(e) => e.kind,
            SessionError::Storage(_) => ErrorKind::Storage,
        }
    }

    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            SessionError::Validation(_) => 2001,
            SessionError::Unauthenticated => 2002,
            SessionError::Gateway(e) => gateway_code(e),
            SessionError::Storage(_) => 2200,
        }
    }
}

/// Errors from Favorites Reconciler operations
#[derive(Debug, Error)]
pub enum FavoriteError {
    #[error("not logged in")]
    Unauthenticated,
    #[error("a favorite change for {0} is already in flight")]
    InFlight(String),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error(transparent)]
    Gateway(#[from] ApiError),
    #[error("session storage error: {0}")]
    Storage(#[from] StorageError),
}

impl From<SessionError> for FavoriteError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Validation(msg) => FavoriteError::Validation(msg),
            SessionError::Unauthenticated => FavoriteError::Unauthenticated,
            SessionError::Gateway(e) => FavoriteError::Gateway(e),
            SessionError::Storage(e) => FavoriteError::Storage(e),
        }
    }
}

impl FavoriteError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FavoriteError::Unauthenticated => ErrorKind::Auth,
            FavoriteError::InFlight(_) => ErrorKind::Conflict,
            FavoriteError::Validation(_) => ErrorKind::Validation,
            FavoriteError::Gateway(e) => e.kind,
            FavoriteError::Storage(_) => ErrorKind::Storage,
        }
    }

    pub fn code(&self) -> u16 {
        match self {
            FavoriteError::Unauthenticated => 3002,
            FavoriteError::InFlight(_) => 3003,
            FavoriteError::Validation(_) => 3001,
            FavoriteError::Gateway(e) => gateway_code(e),
            FavoriteError::Storage(_) => 3200,
        }
    }
}

fn gateway_code(err: &ApiError) -> u16 {
    match err.kind {
        ErrorKind::Auth => 1001,
        ErrorKind::Validation => 1002,
        ErrorKind::NotFound => 1003,
        ErrorKind::Network => 1004,
        ErrorKind::Server => 1005,
        ErrorKind::Conflict => 1006,
        ErrorKind::Storage => 1007,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_kind_is_propagated_unchanged() {
        let err = SessionError::from(ApiError::from_status(404, "gone"));
        assert_eq!(err.kind(), ErrorKind::NotFound);
        let err = FavoriteError::from(err);
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.to_string(), SessionError::from(ApiError::from_status(404, "gone")).to_string());
    }

    #[test]
    fn client_side_kinds() {
        assert_eq!(SessionError::Unauthenticated.kind(), ErrorKind::Auth);
        assert_eq!(FavoriteError::InFlight("m1".into()).kind(), ErrorKind::Conflict);
        let err: SessionError = ModelError::validation("bad").into();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.code(), 2001);
    }
}
