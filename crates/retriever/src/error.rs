//! Error types for library retrieval.

// Rust 1.92 compiler bug: false positives for thiserror/miette derive macro fields
// https://github.com/rust-lang/rust/issues/147648
#![allow(unused_assignments)]

use miette::Diagnostic;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for retrieval operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort a retrieval.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// Reference, registry, manifest or blob failure.
    #[error(transparent)]
    #[diagnostic(code(oraslib::registry))]
    Oci(#[from] oraslib_oci::Error),

    /// The configured credential ID did not resolve to a username/secret pair.
    #[error("No credentials found with ID: {id}{}", reason.as_ref().map(|r| format!(" ({r})")).unwrap_or_default())]
    #[diagnostic(
        code(oraslib::credentials),
        help("check that the credential store defines this ID and that the job may use it")
    )]
    CredentialResolution {
        /// The credential ID.
        id: String,
        /// Why the store could not answer, when it failed outright.
        reason: Option<String>,
    },

    /// The job's workspace cannot be reached.
    #[error("Workspace for job '{job}' is unavailable; the agent may be offline")]
    #[diagnostic(code(oraslib::staging::unavailable))]
    StagingUnavailable {
        /// The job name.
        job: String,
    },

    /// Retrieval was invoked outside a context with an addressable workspace.
    #[error("Cannot check out library '{library}' in non-top-level job '{job}'")]
    #[diagnostic(code(oraslib::staging::context))]
    NonTopLevelContext {
        /// The job name.
        job: String,
        /// The library name.
        library: String,
    },

    /// The library name cannot be used as a staging directory name.
    #[error("Invalid library name '{name}'")]
    #[diagnostic(
        code(oraslib::library::name),
        help("library names must be a single path component without separators")
    )]
    InvalidLibraryName {
        /// The rejected name.
        name: String,
    },

    /// A staging, move or copy step failed.
    #[error("Filesystem error during {operation} on {}: {source}", path.display())]
    #[diagnostic(code(oraslib::filesystem))]
    Filesystem {
        /// Path being operated on.
        path: PathBuf,
        /// Operation that failed.
        operation: &'static str,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A blocking filesystem task panicked or was cancelled.
    #[error("Background task failed: {0}")]
    #[diagnostic(code(oraslib::task))]
    Task(String),
}

impl Error {
    /// Create a credential resolution error for an ID the store does not know.
    #[must_use]
    pub fn credential_not_found(id: impl Into<String>) -> Self {
        Self::CredentialResolution {
            id: id.into(),
            reason: None,
        }
    }

    /// Create a filesystem error.
    #[must_use]
    pub fn filesystem(path: &Path, operation: &'static str, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.to_path_buf(),
            operation,
            source,
        }
    }

    /// Closure adapter for `map_err` on IO results.
    pub fn io<'a>(path: &'a Path, operation: &'static str) -> impl FnOnce(std::io::Error) -> Self + 'a {
        move |source| Self::filesystem(path, operation, source)
    }
}
