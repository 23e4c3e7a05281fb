//! Owned access/refresh token pair over a [`Storage`] backend.
//!
//! The pair is either fully empty (logged out) or fully populated (logged in);
//! [`CredentialStore::set`] and [`CredentialStore::clear`] write both halves
//! together, and a half-populated persisted state left behind by another
//! writer is treated as logged out. Writes hit persistence before the
//! in-memory mirror, so a reader never sees a token with no backing copy.

use std::sync::{Arc, PoisonError, RwLock};

use crate::error::AuthError;
use crate::storage::Storage;
use crate::types::{AccessToken, RefreshToken};

pub(crate) const ACCESS_KEY: &str = "access_token";
pub(crate) const REFRESH_KEY: &str = "refresh_token";

#[derive(Debug, Clone)]
struct CredentialPair {
    access: AccessToken,
    refresh: RefreshToken,
}

/// Typed accessor over the persisted token pair.
///
/// Reads are synchronous and lock-cheap; the request decorator calls
/// [`access`](Self::access) on every non-exempt request.
pub struct CredentialStore {
    storage: Arc<dyn Storage>,
    cached: RwLock<Option<CredentialPair>>,
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("logged_in", &self.access().is_some())
            .finish_non_exhaustive()
    }
}

impl CredentialStore {
    /// Create a store, seeding the in-memory mirror from `storage`.
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        let cached = Self::load_pair(storage.as_ref());
        Self {
            storage,
            cached: RwLock::new(cached),
        }
    }

    fn load_pair(storage: &dyn Storage) -> Option<CredentialPair> {
        let access = AccessToken::new(storage.load(ACCESS_KEY)?).ok()?;
        let refresh = RefreshToken::new(storage.load(REFRESH_KEY)?).ok()?;
        Some(CredentialPair { access, refresh })
    }

    /// Current access token, if logged in.
    pub fn access(&self) -> Option<AccessToken> {
        self.cached
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|pair| pair.access.clone())
    }

    /// Current refresh token, if logged in.
    pub fn refresh_token(&self) -> Option<RefreshToken> {
        self.cached
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|pair| pair.refresh.clone())
    }

    /// Replace the pair. Both tokens must be non-empty; persistence is
    /// written before memory.
    pub fn set(
        &self,
        access: impl Into<String>,
        refresh: impl Into<String>,
    ) -> Result<(), AuthError> {
        let access = AccessToken::new(access).map_err(AuthError::InvalidCredential)?;
        let refresh = RefreshToken::new(refresh).map_err(AuthError::InvalidCredential)?;

        self.storage.store(ACCESS_KEY, access.as_str());
        self.storage.store(REFRESH_KEY, refresh.as_str());

        let mut cached = self.cached.write().unwrap_or_else(PoisonError::into_inner);
        *cached = Some(CredentialPair { access, refresh });
        Ok(())
    }

    /// Drop the pair. Persisted entries are deleted before memory is cleared;
    /// clearing an empty store is a no-op.
    pub fn clear(&self) {
        self.storage.delete(ACCESS_KEY);
        self.storage.delete(REFRESH_KEY);

        let mut cached = self.cached.write().unwrap_or_else(PoisonError::into_inner);
        *cached = None;
    }
}
