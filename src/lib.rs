//! Bearer credential middleware with single-flight token refresh
//!
//! `refresh-gate` sits between an application and its HTTP API: it attaches
//! the current access token to outgoing requests, and when the token expires
//! it refreshes the access/refresh pair **once** per expiry, no matter how
//! many requests fail in the meantime, then replays each failed request with
//! the new token.
//!
//! ## Guarantees
//!
//! - **Single-flight**: concurrent 401s share one refresh call; everyone gets
//!   its outcome, released in arrival order.
//! - **One replay per request**: a request is replayed at most once; a 401 on
//!   the replay is surfaced, never recursed into another refresh.
//! - **Whole-pair writes**: the access/refresh pair is stored and cleared as
//!   a unit, persistence before memory, so readers never see a token without
//!   a backing persisted copy.
//! - **Exempt requests** (login, register, the refresh call itself) bypass
//!   both credential attachment and refresh recovery.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use refresh_gate::AuthClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = AuthClient::builder()
//!         .base_url("http://127.0.0.1:8000")
//!         .on_refresh_failure(|| {
//!             // session is gone: send the user back to login
//!         })
//!         .build()?;
//!
//!     // After the host's login flow:
//!     client.store().set(access, refresh)?;
//!
//!     // 401s on this call are recovered transparently.
//!     let response = client.get("/api/playlists/").await?;
//!     let playlists: Vec<Playlist> = response.json()?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`client`] - [`AuthClient`] facade and builder
//! - [`store`] - credential pair ownership over pluggable [`storage`]
//! - [`refresh`] - the single-flight refresh coordinator
//! - [`transport`] - the request transport seam ([`reqwest`] binding included)
//! - [`middleware`] - Tower layer for hosts with their own service stack
//! - [`types`] - request descriptors, responses, token newtypes
//! - [`error`] - error types
//!
//! ## Error Handling
//!
//! The crate uses the [`AuthError`] enum:
//!
//! ```rust,ignore
//! use refresh_gate::AuthError;
//!
//! match client.get("/api/profile/").await {
//!     Ok(response) => { /* inspect status and body */ }
//!     Err(AuthError::Authorization(response)) => {
//!         // a 401 that refresh could not recover
//!     }
//!     Err(AuthError::Http(e)) => {
//!         eprintln!("network error: {}", e);
//!     }
//!     Err(e) => {
//!         eprintln!("other error: {}", e);
//!     }
//! }
//! ```

pub mod client;
pub mod error;
pub mod middleware;
pub mod refresh;
pub mod storage;
pub mod store;
pub mod transport;
pub mod types;

pub use client::{AuthClient, AuthClientBuilder};
pub use error::AuthError;
pub use refresh::FailureSink;
pub use storage::{MemoryStorage, Storage};
pub use store::CredentialStore;
pub use transport::{ReqwestTransport, Transport};
pub use types::{AccessToken, RefreshToken, RequestDescriptor, Response};
