//! Error types for registry operations.

use thiserror::Error;

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while resolving or pulling an artifact.
#[derive(Error, Debug)]
pub enum Error {
    /// The reference text does not follow the `host[:port]/path:tag` grammar.
    #[error("Invalid container reference '{reference}': {message}")]
    MalformedReference {
        /// The offending reference text.
        reference: String,
        /// What was wrong with it.
        message: String,
    },

    /// The registry rejected the credentials (or demanded some).
    #[error("Authentication failed for registry '{registry}': {message}")]
    Authentication {
        /// Registry host.
        registry: String,
        /// Error message.
        message: String,
    },

    /// The registry has no manifest for the reference.
    #[error("Manifest not found: {0}")]
    ManifestNotFound(String),

    /// The manifest does not declare the pipeline library artifact type.
    #[error(
        "The container reference does not point to a valid pipeline library manifest \
         (artifact type '{actual}'). Make sure to set the {expected} artifact type when pushing the artifact"
    )]
    InvalidArtifactType {
        /// The required artifact type.
        expected: String,
        /// The artifact type the manifest declared.
        actual: String,
    },

    /// Blob content does not hash to its declared digest.
    #[error("Digest mismatch for blob: expected {expected}, got {actual}")]
    Integrity {
        /// The expected digest.
        expected: String,
        /// The computed digest.
        actual: String,
    },

    /// Network or protocol failure while talking to the registry.
    #[error("Registry transport error: {0}")]
    Transport(String),

    /// A layer could not be written into the destination directory.
    #[error("Failed to unpack layer {digest}: {message}")]
    Unpack {
        /// The layer digest.
        digest: String,
        /// Error message.
        message: String,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a malformed reference error.
    #[must_use]
    pub fn malformed_reference(reference: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedReference {
            reference: reference.into(),
            message: message.into(),
        }
    }

    /// Create an authentication error.
    #[must_use]
    pub fn authentication(registry: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Authentication {
            registry: registry.into(),
            message: message.into(),
        }
    }

    /// Create an invalid artifact type error.
    #[must_use]
    pub fn invalid_artifact_type(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::InvalidArtifactType {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create a digest mismatch error.
    #[must_use]
    pub fn integrity(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::Integrity {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create a layer unpack error.
    #[must_use]
    pub fn unpack(digest: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Unpack {
            digest: digest.into(),
            message: message.into(),
        }
    }
}
