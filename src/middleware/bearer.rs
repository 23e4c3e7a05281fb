//! Bearer header injection for raw `reqwest` stacks.
//!
//! [`AuthClient`](crate::client::AuthClient) decorates descriptors itself;
//! this layer is for hosts composing their own Tower service over
//! [`reqwest::Request`] who still want the shared credential store attached
//! to every call.
//!
//! # Example
//!
//! ```ignore
//! use tower::ServiceBuilder;
//! use refresh_gate::middleware::BearerAuth;
//!
//! let service = ServiceBuilder::new()
//!     .layer(BearerAuth::new(store))
//!     .service(http_client);
//! ```

use std::sync::Arc;
use std::task::{Context, Poll};

use http::header::AUTHORIZATION;
use http::HeaderValue;
use tower::{Layer, Service};

use crate::store::CredentialStore;

/// Layer that injects `Authorization: Bearer <token>` into requests.
///
/// Requests that already carry an `Authorization` header are passed through
/// untouched, which is how exempt calls opt out at this level.
pub struct BearerAuth {
    store: Arc<CredentialStore>,
}

impl BearerAuth {
    pub fn new(store: Arc<CredentialStore>) -> Self {
        Self { store }
    }
}

impl Clone for BearerAuth {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S> Layer<S> for BearerAuth {
    type Service = BearerAuthService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        BearerAuthService {
            inner,
            store: Arc::clone(&self.store),
        }
    }
}

/// Service created by [`BearerAuth`].
pub struct BearerAuthService<S> {
    inner: S,
    store: Arc<CredentialStore>,
}

impl<S> Clone for BearerAuthService<S>
where
    S: Clone,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            store: Arc::clone(&self.store),
        }
    }
}

impl<S> Service<reqwest::Request> for BearerAuthService<S>
where
    S: Service<reqwest::Request>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: reqwest::Request) -> Self::Future {
        if !req.headers().contains_key(AUTHORIZATION) {
            if let Some(token) = self.store.access() {
                if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", token.as_str())) {
                    req.headers_mut().insert(AUTHORIZATION, value);
                }
            }
        }
        self.inner.call(req)
    }
}
