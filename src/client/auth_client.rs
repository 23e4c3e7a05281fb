//! Authenticated request pipeline.
//!
//! [`AuthClient`] ties the pieces together: descriptors are decorated with the
//! current access token, sent through the transport, and a 401 on a
//! non-exempt, not-yet-retried request is routed through the
//! [`RefreshCoordinator`] and replayed once with the fresh token.

use std::sync::Arc;

use http::StatusCode;
use serde::Serialize;

use crate::error::AuthError;
use crate::middleware::BearerAuth;
use crate::refresh::RefreshCoordinator;
use crate::store::CredentialStore;
use crate::transport::Transport;
use crate::types::{AccessToken, RequestDescriptor, Response};

use super::AuthClientBuilder;

/// HTTP client with bearer attachment and single-flight refresh recovery.
///
/// Cheap to clone; clones share the transport, credential store, and refresh
/// state.
pub struct AuthClient {
    transport: Arc<dyn Transport>,
    store: Arc<CredentialStore>,
    coordinator: Arc<RefreshCoordinator>,
}

impl Clone for AuthClient {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            store: Arc::clone(&self.store),
            coordinator: Arc::clone(&self.coordinator),
        }
    }
}

impl std::fmt::Debug for AuthClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthClient")
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl AuthClient {
    /// Create a new client builder.
    pub fn builder() -> AuthClientBuilder {
        AuthClientBuilder::default()
    }

    pub(crate) fn from_parts(
        transport: Arc<dyn Transport>,
        store: Arc<CredentialStore>,
        coordinator: Arc<RefreshCoordinator>,
    ) -> Self {
        Self {
            transport,
            store,
            coordinator,
        }
    }

    /// The credential store, for the host's login and logout flows.
    pub fn store(&self) -> &Arc<CredentialStore> {
        &self.store
    }

    /// A [`BearerAuth`] layer sharing this client's credential store.
    pub fn bearer_layer(&self) -> BearerAuth {
        BearerAuth::new(Arc::clone(&self.store))
    }

    /// Send a request through the full middleware pipeline.
    ///
    /// Any response other than 401 is returned as-is for the caller to
    /// inspect. A 401 on a non-exempt, not-yet-retried request triggers one
    /// refresh cycle and at most one replay; a 401 that is not recovered
    /// surfaces as [`AuthError::Authorization`] carrying the original
    /// response.
    ///
    /// # Errors
    /// - [`AuthError::Http`] for transport-level failures
    /// - [`AuthError::Authorization`] for unrecovered 401 responses
    pub async fn send(&self, request: RequestDescriptor) -> Result<Response, AuthError> {
        let decorated = self.decorate(&request);
        let response = self.transport.send(&decorated).await?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }
        if request.is_exempt() || request.is_retried() {
            return Err(AuthError::Authorization(response));
        }

        log::debug!("401 on {} {}, entering refresh", request.method(), request.path());
        let request = request.into_retried();
        match self.coordinator.recover().await {
            Some(token) => self.replay(&request, &token).await,
            None => Err(AuthError::Authorization(response)),
        }
    }

    /// Send a GET request to `path`.
    pub async fn get(&self, path: impl Into<String>) -> Result<Response, AuthError> {
        self.send(RequestDescriptor::get(path)).await
    }

    /// Send a POST request with a JSON body to `path`.
    pub async fn post<B: Serialize>(
        &self,
        path: impl Into<String>,
        body: &B,
    ) -> Result<Response, AuthError> {
        let body = serde_json::to_value(body)?;
        self.send(RequestDescriptor::post(path, body)).await
    }

    /// Send a GET request to a public endpoint, bypassing credential
    /// attachment and refresh recovery.
    pub async fn get_exempt(&self, path: impl Into<String>) -> Result<Response, AuthError> {
        self.send(RequestDescriptor::get(path).exempt()).await
    }

    /// Send a POST request to a public endpoint, bypassing credential
    /// attachment and refresh recovery (login, register).
    pub async fn post_exempt<B: Serialize>(
        &self,
        path: impl Into<String>,
        body: &B,
    ) -> Result<Response, AuthError> {
        let body = serde_json::to_value(body)?;
        self.send(RequestDescriptor::post(path, body).exempt()).await
    }

    /// Attach the current access token, leaving exempt descriptors and
    /// logged-out requests untouched. Pure and synchronous.
    fn decorate(&self, request: &RequestDescriptor) -> RequestDescriptor {
        if request.is_exempt() {
            return request.clone();
        }
        match self.store.access() {
            Some(token) => request.with_bearer(&token),
            None => request.clone(),
        }
    }

    /// Re-issue a retried descriptor with the fresh token. A second 401 is
    /// an ordinary failure; `retried` keeps it out of the coordinator.
    async fn replay(
        &self,
        request: &RequestDescriptor,
        token: &AccessToken,
    ) -> Result<Response, AuthError> {
        let decorated = request.with_bearer(token);
        let response = self.transport.send(&decorated).await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(AuthError::Authorization(response));
        }
        Ok(response)
    }
}
