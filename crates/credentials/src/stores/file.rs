//! TOML file credential store

use crate::{CredentialError, CredentialStore, UsernamePassword};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::trace;

/// One entry of the credentials file
#[derive(Deserialize)]
struct FileEntry {
    username: String,
    password: String,
    /// Jobs (or job folders) allowed to use the credential; empty means all
    #[serde(default)]
    scopes: Vec<String>,
}

impl FileEntry {
    fn visible_to(&self, scope: &str) -> bool {
        self.scopes.is_empty()
            || self.scopes.iter().any(|allowed| {
                scope == allowed
                    || scope
                        .strip_prefix(allowed.as_str())
                        .is_some_and(|rest| rest.starts_with('/'))
            })
    }
}

/// Resolves credentials from a TOML file keyed by credential ID
///
/// ```toml
/// [registry-creds]
/// username = "builder"
/// password = "s3cret"
/// scopes = ["team-a"]   # optional: jobs `team-a` and `team-a/...` only
/// ```
///
/// The file is re-read on every lookup so rotated secrets take effect
/// without a restart.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    /// Create a store reading `path`
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the credentials file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<HashMap<String, FileEntry>, CredentialError> {
        let contents =
            tokio::fs::read_to_string(&self.path)
                .await
                .map_err(|source| CredentialError::Read {
                    path: self.path.clone(),
                    source,
                })?;
        toml::from_str(&contents).map_err(|e| CredentialError::Parse {
            path: self.path.clone(),
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    fn provider_name(&self) -> &'static str {
        "file"
    }

    async fn lookup(
        &self,
        scope: &str,
        id: &str,
    ) -> Result<Option<UsernamePassword>, CredentialError> {
        let mut entries = self.load().await?;
        let credential = entries
            .remove(id)
            .filter(|entry| entry.visible_to(scope))
            .map(|entry| UsernamePassword::new(entry.username, entry.password));
        trace!(scope, id, found = credential.is_some(), "File credential lookup");
        Ok(credential)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const CREDENTIALS: &str = r#"
[zot]
username = "myuser"
password = "mypass"

[team-only]
username = "team"
password = "teampass"
scopes = ["team-a"]
"#;

    fn write_store(dir: &TempDir, contents: &str) -> FileCredentialStore {
        let path = dir.path().join("credentials.toml");
        std::fs::write(&path, contents).unwrap();
        FileCredentialStore::new(path)
    }

    #[tokio::test]
    async fn test_lookup() {
        let dir = TempDir::new().unwrap();
        let store = write_store(&dir, CREDENTIALS);

        let credential = store.lookup("any-job", "zot").await.unwrap().unwrap();
        assert_eq!(credential.username(), "myuser");
        assert_eq!(credential.expose_password(), "mypass");
    }

    #[tokio::test]
    async fn test_unknown_id() {
        let dir = TempDir::new().unwrap();
        let store = write_store(&dir, CREDENTIALS);
        assert!(store.lookup("any-job", "nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_scoped_credential() {
        let dir = TempDir::new().unwrap();
        let store = write_store(&dir, CREDENTIALS);

        assert!(store.lookup("team-a", "team-only").await.unwrap().is_some());
        assert!(store.lookup("team-a/build", "team-only").await.unwrap().is_some());
        assert!(store.lookup("team-ab", "team-only").await.unwrap().is_none());
        assert!(store.lookup("team-b/build", "team-only").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_missing_file() {
        let store = FileCredentialStore::new("/nonexistent/credentials.toml");
        let err = store.lookup("job", "zot").await.unwrap_err();
        assert!(matches!(err, CredentialError::Read { .. }));
    }

    #[tokio::test]
    async fn test_invalid_file() {
        let dir = TempDir::new().unwrap();
        let store = write_store(&dir, "[zot]\nusername = 42\n");
        let err = store.lookup("job", "zot").await.unwrap_err();
        assert!(matches!(err, CredentialError::Parse { .. }));
    }

    #[tokio::test]
    async fn test_rotation_is_picked_up() {
        let dir = TempDir::new().unwrap();
        let store = write_store(&dir, CREDENTIALS);
        assert_eq!(
            store.lookup("job", "zot").await.unwrap().unwrap().expose_password(),
            "mypass"
        );

        std::fs::write(store.path(), "[zot]\nusername = \"myuser\"\npassword = \"rotated\"\n")
            .unwrap();
        assert_eq!(
            store.lookup("job", "zot").await.unwrap().unwrap().expose_password(),
            "rotated"
        );
    }
}
