use thiserror::Error;

use crate::types::Response;

/// Middleware error types
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON decode error: {0}")]
    Json(#[from] serde_json::Error),

    /// A 401 response that was not, or could not be, recovered by a refresh.
    /// Carries the original response unchanged.
    #[error("authorization failed with status {}", .0.status())]
    Authorization(Response),

    #[error("credential refresh failed: {0}")]
    Refresh(String),

    #[error("invalid credential: {0}")]
    InvalidCredential(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl AuthError {
    /// Returns the response behind an [`AuthError::Authorization`], if any.
    pub fn response(&self) -> Option<&Response> {
        match self {
            AuthError::Authorization(response) => Some(response),
            _ => None,
        }
    }
}
