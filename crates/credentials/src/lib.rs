//! Registry credential lookup for oraslib.
//!
//! Retrieval resolves a configured credential ID to a username/secret pair
//! through a [`CredentialStore`]. The host decides where credentials live;
//! this crate ships stores for environment variables, a TOML file, and an
//! in-memory map.
//!
//! ```ignore
//! use oraslib_credentials::{CredentialStore, EnvCredentialStore};
//!
//! let store = EnvCredentialStore::new();
//! // Reads ORASLIB_CREDENTIALS_REGISTRY_CREDS_USERNAME / _PASSWORD
//! let credential = store.lookup("my-job", "registry-creds").await?;
//! ```

pub mod stores;

pub use stores::{EnvCredentialStore, FileCredentialStore, StaticCredentialStore};

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

/// Error types for credential lookup
#[derive(Debug, Error)]
pub enum CredentialError {
    /// The backing store could not be read
    #[error("Failed to read credential store {}: {source}", path.display())]
    Read {
        /// Store location
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// The backing store is not valid
    #[error("Invalid credential store {}: {message}", path.display())]
    Parse {
        /// Store location
        path: PathBuf,
        /// Parser message
        message: String,
    },
}

/// A username/secret pair for registry basic authentication.
///
/// The secret is zeroed on drop and never shows up in `Debug` output.
#[derive(Clone)]
pub struct UsernamePassword {
    username: String,
    password: SecretString,
}

impl UsernamePassword {
    /// Create a credential from its parts.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }

    /// The username.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// The secret, still wrapped.
    #[must_use]
    pub fn password(&self) -> &SecretString {
        &self.password
    }

    /// Expose the secret value.
    ///
    /// The returned value must not be logged or persisted.
    #[must_use]
    pub fn expose_password(&self) -> &str {
        self.password.expose_secret()
    }
}

impl fmt::Debug for UsernamePassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UsernamePassword")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Trait for looking up registry credentials.
///
/// `scope` identifies the job performing the lookup, so stores can restrict
/// which jobs may use which credentials. A missing credential is `Ok(None)`;
/// errors are reserved for stores that cannot be read at all.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Look up a credential by ID on behalf of `scope`.
    async fn lookup(&self, scope: &str, id: &str)
    -> Result<Option<UsernamePassword>, CredentialError>;

    /// Get the provider name for this store.
    fn provider_name(&self) -> &'static str;

    /// Record that `scope` used credential `id`.
    ///
    /// The default implementation only emits a trace event.
    fn track(&self, scope: &str, id: &str) {
        debug!(scope, id, provider = self.provider_name(), "Credential used");
    }
}
