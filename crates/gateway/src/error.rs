use std::fmt;

use serde_json::Value;
use thiserror::Error;

/// Failure categories shared by every layer of the client.
///
/// The gateway only produces the first five. `Conflict` and `Storage` are
/// raised client-side (a toggle already in flight, the local session file).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Auth,
    Validation,
    NotFound,
    Network,
    Server,
    Conflict,
    Storage,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Auth => "auth",
            ErrorKind::Validation => "validation",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Network => "network",
            ErrorKind::Server => "server",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Storage => "storage",
        }
    }

    /// Classify an HTTP status the backend answered with.
    pub fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => ErrorKind::Auth,
            404 => ErrorKind::NotFound,
            400..=499 => ErrorKind::Validation,
            _ => ErrorKind::Server,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized gateway failure: `{statusCode, message}` plus its kind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} error{}: {message}", status_suffix(.status_code))]
pub struct ApiError {
    pub kind: ErrorKind,
    /// HTTP status when the backend answered; `None` for transport and client-side failures.
    pub status_code: Option<u16>,
    pub message: String,
}

impl ApiError {
    pub fn new(kind: ErrorKind, status_code: Option<u16>, message: impl Into<String>) -> Self {
        Self { kind, status_code, message: message.into() }
    }

    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::from_status(status), Some(status), message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, None, message)
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Auth, None, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Network, None, message)
    }

    pub fn is_not_found(&self) -> bool { self.kind == ErrorKind::NotFound }
}

fn status_suffix(status_code: &Option<u16>) -> String {
    status_code.map(|code| format!(" ({code})")).unwrap_or_default()
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return ApiError::network(format!("request timed out: {err}"));
        }
        if err.is_connect() {
            return ApiError::network(format!("connection failed: {err}"));
        }
        if let Some(status) = err.status() {
            return ApiError::from_status(status.as_u16(), err.to_string());
        }
        if err.is_decode() {
            return ApiError::new(ErrorKind::Server, None, format!("unexpected response body: {err}"));
        }
        if err.is_builder() {
            return ApiError::validation(format!("invalid request: {err}"));
        }
        ApiError::network(err.to_string())
    }
}

/// Pull a human-readable message out of an error body.
///
/// Understands `{"message": ..}`, `{"error": ..}`, a bare JSON string, and
/// plain text; falls back to the status reason phrase when the body is empty.
pub fn extract_message(status: u16, body: &str) -> String {
    let trimmed = body.trim();
    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        match &value {
            Value::String(s) if !s.is_empty() => return s.clone(),
            Value::Object(map) => {
                for key in ["message", "error", "errors"] {
                    match map.get(key) {
                        Some(Value::String(s)) if !s.is_empty() => return s.clone(),
                        Some(other @ (Value::Array(_) | Value::Object(_))) => return other.to_string(),
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }
    if !trimmed.is_empty() {
        return trimmed.to_string();
    }
    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("request failed")
        .to_string()
}
