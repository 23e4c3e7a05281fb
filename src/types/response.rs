use http::header::HeaderMap;
use http::StatusCode;
use serde::de::DeserializeOwned;

use crate::error::AuthError;

/// Response returned by a [`Transport`](crate::transport::Transport).
///
/// The body is buffered in full; the middleware needs to hand the same
/// response to a caller after a failed recovery, which a streaming body would
/// not allow.
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl Response {
    pub fn new(status: StatusCode, headers: HeaderMap, body: Vec<u8>) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Deserialize the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, AuthError> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}
