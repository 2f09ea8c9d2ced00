//! `oraslib.toml` configuration.
//!
//! ```toml
//! [workspace]
//! root = "/var/lib/oraslib/workspace"
//! suffix = "@"
//!
//! [credentials]
//! store = "file"
//! file = "credentials.toml"
//!
//! [[library]]
//! name = "mylib"
//! container_ref = "registry.example.com/team/mylib"
//! credentials_id = "registry-creds"
//! default_version = "1.0"
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use oraslib_credentials::{CredentialStore, EnvCredentialStore, FileCredentialStore};
use oraslib_retriever::{DEFAULT_WORKSPACE_SUFFIX, LibrarySource};
use serde::Deserialize;
use tracing::debug;

use crate::cli::CliError;

/// File name looked up in the current directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "oraslib.toml";

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Job workspace settings.
    #[serde(default)]
    pub workspace: WorkspaceConfig,
    /// Credential store selection.
    #[serde(default)]
    pub credentials: CredentialsConfig,
    /// Configured libraries.
    #[serde(default, rename = "library")]
    pub libraries: Vec<LibraryConfig>,
    /// Directory of the file the configuration was read from.
    #[serde(skip)]
    base_dir: PathBuf,
}

/// `[workspace]` table.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkspaceConfig {
    /// Directory holding one workspace per job.
    pub root: Option<PathBuf>,
    /// Suffix between a job workspace and its `libs` directory.
    pub suffix: Option<String>,
}

/// Which credential store backs lookups.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// Environment variables.
    #[default]
    Env,
    /// A TOML credentials file.
    File,
}

/// `[credentials]` table.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CredentialsConfig {
    /// Store kind.
    #[serde(default)]
    pub store: StoreKind,
    /// Credentials file for `store = "file"`, relative to the config file.
    pub file: Option<PathBuf>,
    /// Variable prefix for `store = "env"`.
    pub prefix: Option<String>,
}

/// One `[[library]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LibraryConfig {
    /// Library name, also the staging directory name.
    pub name: String,
    /// Base reference without tag or digest.
    pub container_ref: String,
    /// Credential ID; absent or empty pulls anonymously.
    #[serde(default)]
    pub credentials_id: Option<String>,
    /// Version used when the caller gives none.
    #[serde(default)]
    pub default_version: Option<String>,
}

impl LibraryConfig {
    /// Where the library is published.
    #[must_use]
    pub fn source(&self) -> LibrarySource {
        match &self.credentials_id {
            Some(id) => LibrarySource::with_credentials(&self.container_ref, id),
            None => LibrarySource::anonymous(&self.container_ref),
        }
    }

    /// `requested`, else the configured default version.
    pub fn version<'a>(&'a self, requested: Option<&'a str>) -> Result<&'a str, CliError> {
        requested
            .or(self.default_version.as_deref())
            .ok_or_else(|| {
                CliError::config_with_help(
                    format!("No version given for library '{}'", self.name),
                    "pass --version or set default_version for the library",
                )
            })
    }
}

impl Config {
    /// Parse configuration text. Relative paths resolve against `base_dir`.
    pub fn parse(contents: &str, base_dir: &Path) -> Result<Self, CliError> {
        let mut config: Self = toml::from_str(contents)
            .map_err(|e| CliError::config(format!("Invalid configuration: {e}")))?;
        config.base_dir = base_dir.to_path_buf();
        config.validate()?;
        Ok(config)
    }

    /// Read configuration from `path`.
    pub fn load(path: &Path) -> Result<Self, CliError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            CliError::config_with_help(
                format!("Cannot read configuration {}: {e}", path.display()),
                "pass --config or set ORASLIB_CONFIG",
            )
        })?;
        let base_dir = path.parent().map_or_else(PathBuf::new, Path::to_path_buf);
        debug!(path = %path.display(), "Loaded configuration");
        Self::parse(&contents, &base_dir)
    }

    /// Configuration file to read: `explicit`, else `./oraslib.toml`, else
    /// `<config dir>/oraslib/oraslib.toml`.
    pub fn locate(explicit: Option<&Path>) -> Result<PathBuf, CliError> {
        if let Some(path) = explicit {
            return Ok(path.to_path_buf());
        }
        let local = PathBuf::from(DEFAULT_CONFIG_FILE);
        if local.is_file() {
            return Ok(local);
        }
        dirs::config_dir()
            .map(|dir| dir.join("oraslib").join(DEFAULT_CONFIG_FILE))
            .filter(|path| path.is_file())
            .ok_or_else(|| {
                CliError::config_with_help(
                    format!("Configuration file {DEFAULT_CONFIG_FILE} not found"),
                    "pass --config or set ORASLIB_CONFIG",
                )
            })
    }

    fn validate(&self) -> Result<(), CliError> {
        let mut seen = HashSet::new();
        for library in &self.libraries {
            if library.name.trim().is_empty() {
                return Err(CliError::config("Library name must not be empty"));
            }
            if library.container_ref.trim().is_empty() {
                return Err(CliError::config(format!(
                    "Library '{}' has no container_ref",
                    library.name
                )));
            }
            if !seen.insert(library.name.as_str()) {
                return Err(CliError::config(format!(
                    "Library '{}' is configured more than once",
                    library.name
                )));
            }
        }
        if self.credentials.store == StoreKind::File && self.credentials.file.is_none() {
            return Err(CliError::config(
                "credentials.store = \"file\" requires credentials.file",
            ));
        }
        Ok(())
    }

    /// Look up a configured library by name.
    pub fn library(&self, name: &str) -> Result<&LibraryConfig, CliError> {
        self.libraries
            .iter()
            .find(|library| library.name == name)
            .ok_or_else(|| {
                let known: Vec<&str> = self.libraries.iter().map(|l| l.name.as_str()).collect();
                CliError::config_with_help(
                    format!("Unknown library '{name}'"),
                    if known.is_empty() {
                        "no libraries are configured".to_string()
                    } else {
                        format!("configured libraries: {}", known.join(", "))
                    },
                )
            })
    }

    /// Workspace root: `override_root`, else `[workspace] root`, else the
    /// platform data directory.
    pub fn workspace_root(&self, override_root: Option<&Path>) -> Result<PathBuf, CliError> {
        if let Some(root) = override_root {
            return Ok(root.to_path_buf());
        }
        if let Some(root) = &self.workspace.root {
            return Ok(self.base_dir.join(root));
        }
        dirs::data_local_dir()
            .map(|dir| dir.join("oraslib").join("workspace"))
            .ok_or_else(|| {
                CliError::config_with_help(
                    "No workspace root configured",
                    "set [workspace] root or pass --workspace-root",
                )
            })
    }

    /// Workspace suffix: `override_suffix`, else `[workspace] suffix`, else `@`.
    #[must_use]
    pub fn workspace_suffix<'a>(&'a self, override_suffix: Option<&'a str>) -> &'a str {
        override_suffix
            .or(self.workspace.suffix.as_deref())
            .unwrap_or(DEFAULT_WORKSPACE_SUFFIX)
    }

    /// Credential store selected by `[credentials]`.
    #[must_use]
    pub fn credential_store(&self) -> Arc<dyn CredentialStore> {
        match self.credentials.store {
            StoreKind::Env => match &self.credentials.prefix {
                Some(prefix) => Arc::new(EnvCredentialStore::with_prefix(prefix)),
                None => Arc::new(EnvCredentialStore::new()),
            },
            StoreKind::File => {
                let file = self.credentials.file.clone().unwrap_or_default();
                Arc::new(FileCredentialStore::new(self.base_dir.join(file)))
            }
        }
    }
}
