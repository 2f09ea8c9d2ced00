//! Record of which artifact a retrieval used.

use std::fmt;

use oraslib_oci::Manifest;

/// Where a materialized library came from.
///
/// `Display` renders the audit line written to the build log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provenance {
    /// Configured base reference, without tag.
    pub reference: String,
    /// Manifest digest.
    pub digest: String,
    /// VCS revision annotation, or `unknown`.
    pub revision: String,
    /// Source annotation, or `unknown`.
    pub source: String,
}

impl Provenance {
    /// Build from the configured base reference and the pulled manifest.
    #[must_use]
    pub fn from_manifest(reference: impl Into<String>, manifest: &Manifest) -> Self {
        Self {
            reference: reference.into(),
            digest: manifest.digest.clone(),
            revision: manifest.revision().to_string(),
            source: manifest.source().to_string(),
        }
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Using library from {}@{} at revision {} and source {}",
            self.reference, self.digest, self.revision, self.source
        )
    }
}
