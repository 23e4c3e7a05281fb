use http::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use http::Method;

use super::AccessToken;

/// Immutable description of an outgoing request.
///
/// Decoration never mutates a descriptor in place; [`with_bearer`](Self::with_bearer)
/// returns a new value, so a descriptor queued behind an in-flight refresh can
/// never be aliased by a concurrently decorated copy.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    method: Method,
    path: String,
    headers: HeaderMap,
    body: Option<serde_json::Value>,
    exempt: bool,
    retried: bool,
}

impl RequestDescriptor {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            body: None,
            exempt: false,
            retried: false,
        }
    }

    /// Shorthand for a GET descriptor.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// Shorthand for a POST descriptor with a JSON body.
    pub fn post(path: impl Into<String>, body: serde_json::Value) -> Self {
        let mut descriptor = Self::new(Method::POST, path);
        descriptor.body = Some(body);
        descriptor
    }

    /// Add a header to the descriptor.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Mark the request exempt: no bearer header is attached and a 401
    /// response never triggers refresh recovery.
    pub fn exempt(mut self) -> Self {
        self.exempt = true;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> Option<&serde_json::Value> {
        self.body.as_ref()
    }

    pub fn is_exempt(&self) -> bool {
        self.exempt
    }

    /// True once this descriptor has been replayed after a refresh. A retried
    /// descriptor that fails again with 401 is surfaced immediately.
    pub fn is_retried(&self) -> bool {
        self.retried
    }

    pub(crate) fn into_retried(mut self) -> Self {
        self.retried = true;
        self
    }

    /// Returns a new descriptor carrying `Authorization: Bearer <token>`.
    ///
    /// A token that is not a valid header value leaves the headers unchanged
    /// and the request proceeds unauthenticated.
    pub fn with_bearer(&self, token: &AccessToken) -> Self {
        let mut decorated = self.clone();
        if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", token.as_str())) {
            decorated.headers.insert(AUTHORIZATION, value);
        }
        decorated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_defaults() {
        let descriptor = RequestDescriptor::get("/api/songs/");
        assert_eq!(descriptor.method(), &Method::GET);
        assert_eq!(descriptor.path(), "/api/songs/");
        assert!(!descriptor.is_exempt());
        assert!(!descriptor.is_retried());
        assert!(descriptor.headers().is_empty());
        assert!(descriptor.body().is_none());
    }

    #[test]
    fn test_post_carries_body() {
        let descriptor =
            RequestDescriptor::post("/api/user/login/", serde_json::json!({"username": "u"}));
        assert_eq!(descriptor.method(), &Method::POST);
        assert_eq!(
            descriptor.body().unwrap(),
            &serde_json::json!({"username": "u"})
        );
    }

    #[test]
    fn test_with_bearer_produces_new_value() {
        let original = RequestDescriptor::get("/api/songs/");
        let token = AccessToken::new("A1").unwrap();
        let decorated = original.with_bearer(&token);

        assert_eq!(
            decorated.headers().get(AUTHORIZATION).unwrap(),
            "Bearer A1"
        );
        // The original is untouched.
        assert!(original.headers().get(AUTHORIZATION).is_none());
    }

    #[test]
    fn test_with_bearer_overwrites_previous_header() {
        let old = AccessToken::new("A1").unwrap();
        let new = AccessToken::new("A2").unwrap();
        let descriptor = RequestDescriptor::get("/api/songs/")
            .with_bearer(&old)
            .with_bearer(&new);

        assert_eq!(
            descriptor.headers().get(AUTHORIZATION).unwrap(),
            "Bearer A2"
        );
        assert_eq!(descriptor.headers().len(), 1);
    }

    #[test]
    fn test_with_bearer_invalid_header_value_leaves_headers_unchanged() {
        let token = AccessToken::new("bad\ntoken").unwrap();
        let descriptor = RequestDescriptor::get("/api/songs/").with_bearer(&token);
        assert!(descriptor.headers().get(AUTHORIZATION).is_none());
    }

    #[test]
    fn test_into_retried() {
        let descriptor = RequestDescriptor::get("/api/songs/").into_retried();
        assert!(descriptor.is_retried());
    }

    #[test]
    fn test_exempt_marker() {
        let descriptor = RequestDescriptor::post("/api/user/refresh/", serde_json::json!({}))
            .exempt();
        assert!(descriptor.is_exempt());
    }
}
