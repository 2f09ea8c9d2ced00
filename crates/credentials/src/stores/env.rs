//! Environment variable credential store

use crate::{CredentialError, CredentialStore, UsernamePassword};
use async_trait::async_trait;

/// Default variable prefix
pub const DEFAULT_PREFIX: &str = "ORASLIB_CREDENTIALS";

/// Resolves credentials from environment variables
///
/// Credential `registry-creds` is read from
/// `ORASLIB_CREDENTIALS_REGISTRY_CREDS_USERNAME` and
/// `ORASLIB_CREDENTIALS_REGISTRY_CREDS_PASSWORD`. Both variables must be set.
/// The scope is ignored: every job sees the same environment.
#[derive(Debug, Clone)]
pub struct EnvCredentialStore {
    prefix: String,
}

impl Default for EnvCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvCredentialStore {
    /// Create a store using the default prefix
    #[must_use]
    pub fn new() -> Self {
        Self::with_prefix(DEFAULT_PREFIX)
    }

    /// Create a store using a custom prefix
    #[must_use]
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Variable names holding the username and password for `id`
    #[must_use]
    pub fn variable_names(&self, id: &str) -> (String, String) {
        let key: String = id
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_uppercase()
                } else {
                    '_'
                }
            })
            .collect();
        (
            format!("{}_{key}_USERNAME", self.prefix),
            format!("{}_{key}_PASSWORD", self.prefix),
        )
    }
}

#[async_trait]
impl CredentialStore for EnvCredentialStore {
    fn provider_name(&self) -> &'static str {
        "env"
    }

    async fn lookup(
        &self,
        _scope: &str,
        id: &str,
    ) -> Result<Option<UsernamePassword>, CredentialError> {
        let (username_var, password_var) = self.variable_names(id);
        match (std::env::var(&username_var), std::env::var(&password_var)) {
            (Ok(username), Ok(password)) => Ok(Some(UsernamePassword::new(username, password))),
            _ => Ok(None),
        }
    }
}
