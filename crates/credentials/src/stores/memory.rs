//! In-memory credential store

use crate::{CredentialError, CredentialStore, UsernamePassword};
use async_trait::async_trait;
use std::collections::HashMap;

/// Credentials held in memory, visible to every scope
///
/// Useful when the embedding host has already resolved its secrets.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentialStore {
    entries: HashMap<String, UsernamePassword>,
}

impl StaticCredentialStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a credential
    #[must_use]
    pub fn with(
        mut self,
        id: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.insert(id, UsernamePassword::new(username, password));
        self
    }

    /// Add or replace a credential
    pub fn insert(&mut self, id: impl Into<String>, credential: UsernamePassword) {
        self.entries.insert(id.into(), credential);
    }
}

#[async_trait]
impl CredentialStore for StaticCredentialStore {
    fn provider_name(&self) -> &'static str {
        "static"
    }

    async fn lookup(
        &self,
        _scope: &str,
        id: &str,
    ) -> Result<Option<UsernamePassword>, CredentialError> {
        Ok(self.entries.get(id).cloned())
    }
}
