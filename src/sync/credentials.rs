//! Stored login credentials.
//!
//! Every outbound request is built from whatever the store holds at the
//! time. An empty store means requests are skipped, not sent anonymously.

use std::path::PathBuf;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::util::lock;

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self { username: username.into(), password: password.into() }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("credential file error: {0}")]
    Io(#[from] std::io::Error),
    #[error("credential file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub trait CredentialStore: Send + Sync {
    /// Current credentials, if any.
    fn load(&self) -> Option<Credentials>;

    /// Replace the stored credentials.
    ///
    /// # Errors
    ///
    /// Returns a [`CredentialError`] if the backing medium cannot be written.
    fn save(&self, credentials: &Credentials) -> Result<(), CredentialError>;

    /// Forget the stored credentials.
    ///
    /// # Errors
    ///
    /// Returns a [`CredentialError`] if the backing medium cannot be written.
    fn clear(&self) -> Result<(), CredentialError>;
}

// =============================================================================
// MEMORY
// =============================================================================

#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    slot: Mutex<Option<Credentials>>,
}

impl MemoryCredentialStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(credentials: Credentials) -> Self {
        Self { slot: Mutex::new(Some(credentials)) }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Option<Credentials> {
        lock(&self.slot).clone()
    }

    fn save(&self, credentials: &Credentials) -> Result<(), CredentialError> {
        *lock(&self.slot) = Some(credentials.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), CredentialError> {
        *lock(&self.slot) = None;
        Ok(())
    }
}

// =============================================================================
// FILE
// =============================================================================

/// Credentials persisted as a small JSON document. A missing or unreadable
/// file reads as "no credentials".
#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Option<Credentials> {
        let text = std::fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&text) {
            Ok(credentials) => Some(credentials),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "ignoring malformed credential file");
                None
            }
        }
    }

    fn save(&self, credentials: &Credentials) -> Result<(), CredentialError> {
        let text = serde_json::to_string(credentials)?;
        std::fs::write(&self.path, text)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), CredentialError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
#[path = "credentials_test.rs"]
mod tests;
