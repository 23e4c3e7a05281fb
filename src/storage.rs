//! Durable key-value persistence behind the credential store.
//!
//! The middleware does not care where tokens live; hosts bind [`Storage`] to
//! whatever they have (a file, a keychain, browser-like local storage). The
//! operations are synchronous and infallible by contract: a backend that can
//! fail should log and degrade to "absent", never block the request path.

use std::collections::HashMap;
use std::sync::Mutex;

/// Opaque persistence capability for credential strings.
pub trait Storage: Send + Sync {
    /// Read a value, `None` if the key is absent.
    fn load(&self, key: &str) -> Option<String>;

    /// Write a value, overwriting any prior one.
    fn store(&self, key: &str, value: &str);

    /// Remove a key. Removing an absent key is a no-op.
    fn delete(&self, key: &str);
}

/// Process-local [`Storage`] used by default and in tests.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn load(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .ok()
            .and_then(|entries| entries.get(key).cloned())
    }

    fn store(&self, key: &str, value: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), value.to_string());
        }
    }

    fn delete(&self, key: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(key);
        }
    }
}
