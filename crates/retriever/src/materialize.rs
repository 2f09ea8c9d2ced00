//! Pull an artifact into staging and copy the normalized tree to its target.

use std::path::Path;

use oraslib_oci::{ContainerReference, Manifest, Registry};
use tracing::debug;

use crate::error::{Error, Result};
use crate::layout::{Normalization, clear_dir, copy_tree, normalize_layout};
use crate::provenance::Provenance;

/// Turns a validated manifest into a library tree on disk.
#[derive(Debug, Clone, Copy)]
pub struct Materializer {
    verify_digest: bool,
}

impl Default for Materializer {
    fn default() -> Self {
        Self {
            verify_digest: true,
        }
    }
}

impl Materializer {
    /// Materializer with blob digest verification enabled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pull `reference` into `staging`, normalize it, and copy it to `target`.
    ///
    /// The pull is pinned to `manifest`'s digest so that the content always
    /// matches the manifest that was validated. `staging` is emptied first. Content already copied into `target` is
    /// left in place when a later step fails.
    pub async fn materialize(
        &self,
        registry: &dyn Registry,
        reference: &ContainerReference,
        manifest: &Manifest,
        staging: &Path,
        target: &Path,
    ) -> Result<Provenance> {
        let staging_dir = staging.to_path_buf();
        blocking(move || clear_dir(&staging_dir)).await?;

        let pinned = reference.pinned(&manifest.digest);
        registry
            .pull_artifact(&pinned, staging, self.verify_digest)
            .await?;

        let staging_dir = staging.to_path_buf();
        let target_dir = target.to_path_buf();
        let (normalization, copied) = blocking(move || {
            let normalization = normalize_layout(&staging_dir)?;
            let copied = copy_tree(&staging_dir, &target_dir)?;
            Ok((normalization, copied))
        })
        .await?;

        if let Normalization::Promoted(wrapper) = &normalization {
            debug!(reference = %reference, wrapper = %wrapper, "Unwrapped library root");
        }
        debug!(
            reference = %reference,
            staging = %staging.display(),
            target = %target.display(),
            files = copied,
            "Materialized library"
        );

        Ok(Provenance::from_manifest(reference.base(), manifest))
    }
}

async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| Error::Task(e.to_string()))?
}
