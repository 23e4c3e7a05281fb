use std::sync::Arc;
use std::time::Duration;

use crate::error::AuthError;
use crate::refresh::{FailureSink, RefreshCoordinator};
use crate::storage::{MemoryStorage, Storage};
use crate::store::CredentialStore;
use crate::transport::{
    ReqwestTransport, Transport, DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_TIMEOUT_SECS,
};

use super::AuthClient;

pub(crate) const DEFAULT_REFRESH_PATH: &str = "/api/user/refresh/";

/// Builder for [`AuthClient`]
///
/// # Example
///
/// ```rust,no_run
/// use refresh_gate::AuthClient;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let client = AuthClient::builder()
///     .base_url("http://127.0.0.1:8000")
///     .on_refresh_failure(|| {
///         // redirect the user to the login flow
///     })
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct AuthClientBuilder {
    base_url: Option<String>,
    refresh_path: Option<String>,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    storage: Option<Arc<dyn Storage>>,
    transport: Option<Arc<dyn Transport>>,
    on_refresh_failure: Option<FailureSink>,
}

impl std::fmt::Debug for AuthClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthClientBuilder")
            .field("base_url", &self.base_url)
            .field("refresh_path", &self.refresh_path)
            .field("timeout", &self.timeout)
            .field("connect_timeout", &self.connect_timeout)
            .finish_non_exhaustive()
    }
}

impl AuthClientBuilder {
    /// Set the base URL all request paths are joined onto. Required.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the refresh endpoint path.
    ///
    /// Default: `/api/user/refresh/`
    pub fn refresh_path(mut self, path: impl Into<String>) -> Self {
        self.refresh_path = Some(path.into());
        self
    }

    /// Set the total timeout for requests.
    ///
    /// Default: 30 seconds
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the connection timeout.
    ///
    /// Default: 10 seconds
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Set the persistence backend for the credential pair.
    ///
    /// Default: process-local [`MemoryStorage`]
    pub fn storage(mut self, storage: Arc<dyn Storage>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Replace the [`ReqwestTransport`] with a custom [`Transport`].
    ///
    /// When set, `base_url` and the timeouts are unused; the transport owns
    /// request execution entirely.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Register a sink invoked once per terminal refresh failure, after all
    /// queued requests have been released.
    pub fn on_refresh_failure<F>(mut self, sink: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_refresh_failure = Some(Arc::new(sink));
        self
    }

    /// Build the [`AuthClient`]
    ///
    /// # Errors
    /// Returns [`AuthError::Config`] if neither a base URL nor a custom
    /// transport is set.
    pub fn build(self) -> Result<AuthClient, AuthError> {
        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => {
                let base_url = self
                    .base_url
                    .ok_or_else(|| AuthError::Config("base_url is required".to_string()))?;
                let timeout = self
                    .timeout
                    .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS));
                let connect_timeout = self
                    .connect_timeout
                    .unwrap_or(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS));
                Arc::new(ReqwestTransport::new(base_url, timeout, connect_timeout)?)
            }
        };

        let storage = self
            .storage
            .unwrap_or_else(|| Arc::new(MemoryStorage::new()));
        let store = Arc::new(CredentialStore::new(storage));

        let refresh_path = self
            .refresh_path
            .unwrap_or_else(|| DEFAULT_REFRESH_PATH.to_string());
        let coordinator = Arc::new(RefreshCoordinator::new(
            Arc::clone(&transport),
            Arc::clone(&store),
            refresh_path,
            self.on_refresh_failure,
        ));

        Ok(AuthClient::from_parts(transport, store, coordinator))
    }
}
