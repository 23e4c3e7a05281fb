//! Single-flight refresh coordination.
//!
//! When a non-exempt request comes back 401, its caller lands here. The first
//! caller of a cycle becomes the leader and issues the one refresh call; every
//! caller arriving while that call is in flight is parked as a waiter and
//! released, in enqueue order, with the cycle's outcome. A failed cycle clears
//! the credential store and fires the configured failure sink exactly once,
//! after all waiters have been released.

use std::sync::Arc;

use serde::Deserialize;
use tokio::sync::{oneshot, Mutex};

use crate::error::AuthError;
use crate::store::CredentialStore;
use crate::transport::Transport;
use crate::types::{AccessToken, RequestDescriptor};

/// Invoked once per terminal refresh failure, so the host can redirect the
/// user to re-authentication.
pub type FailureSink = Arc<dyn Fn() + Send + Sync>;

type Waiter = oneshot::Sender<Option<AccessToken>>;

enum RefreshState {
    Idle,
    InProgress { waiters: Vec<Waiter> },
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access: String,
    #[serde(default)]
    refresh: Option<String>,
}

/// The refresh state machine. One instance per client; all 401 recovery goes
/// through [`recover`](Self::recover).
pub struct RefreshCoordinator {
    transport: Arc<dyn Transport>,
    store: Arc<CredentialStore>,
    refresh_path: String,
    on_failure: Option<FailureSink>,
    state: Mutex<RefreshState>,
}

impl RefreshCoordinator {
    pub(crate) fn new(
        transport: Arc<dyn Transport>,
        store: Arc<CredentialStore>,
        refresh_path: impl Into<String>,
        on_failure: Option<FailureSink>,
    ) -> Self {
        Self {
            transport,
            store,
            refresh_path: refresh_path.into(),
            on_failure,
            state: Mutex::new(RefreshState::Idle),
        }
    }

    /// Recover from an authorization failure.
    ///
    /// Returns the fresh access token to replay with, or `None` when the
    /// cycle failed and the caller must propagate its original 401. However
    /// many callers hit this during one cycle, exactly one refresh request
    /// goes out.
    pub(crate) async fn recover(&self) -> Option<AccessToken> {
        let parked = {
            let mut state = self.state.lock().await;
            match &mut *state {
                RefreshState::InProgress { waiters } => {
                    let (tx, rx) = oneshot::channel();
                    waiters.push(tx);
                    Some(rx)
                }
                RefreshState::Idle => {
                    *state = RefreshState::InProgress {
                        waiters: Vec::new(),
                    };
                    None
                }
            }
        };

        if let Some(rx) = parked {
            // A dropped sender means the leader went away; treat as failure.
            return rx.await.ok().flatten();
        }

        let outcome = match self.refresh_once().await {
            Ok(token) => Some(token),
            Err(err) => {
                log::warn!("credential refresh failed: {err}");
                self.store.clear();
                None
            }
        };

        let waiters = {
            let mut state = self.state.lock().await;
            match std::mem::replace(&mut *state, RefreshState::Idle) {
                RefreshState::InProgress { waiters } => waiters,
                RefreshState::Idle => Vec::new(),
            }
        };
        for waiter in waiters {
            let _ = waiter.send(outcome.clone());
        }

        if outcome.is_none() {
            if let Some(sink) = &self.on_failure {
                sink();
            }
        }

        outcome
    }

    /// The one network call of a refresh cycle.
    ///
    /// A success response may omit the rotated refresh token; the previous
    /// one is retained in that case rather than invalidating the pair, so a
    /// rotation-optional endpoint does not force a re-login.
    async fn refresh_once(&self) -> Result<AccessToken, AuthError> {
        let refresh = self
            .store
            .refresh_token()
            .ok_or_else(|| AuthError::Refresh("no refresh token available".to_string()))?;

        let request = RequestDescriptor::post(
            self.refresh_path.clone(),
            serde_json::json!({ "refresh": refresh.as_str() }),
        )
        .exempt();

        let response = self.transport.send(&request).await?;
        if !response.status().is_success() {
            return Err(AuthError::Refresh(format!(
                "refresh endpoint returned status {}",
                response.status()
            )));
        }

        let body: RefreshResponse = response.json()?;
        let access = AccessToken::new(body.access).map_err(AuthError::InvalidCredential)?;
        let next_refresh = body
            .refresh
            .unwrap_or_else(|| refresh.as_str().to_string());

        self.store.set(access.as_str(), next_refresh)?;
        log::debug!("credential pair refreshed");
        Ok(access)
    }
}
