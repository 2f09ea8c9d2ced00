//! Retrieval orchestration.
//!
//! A retrieval resolves credentials, opens a fresh registry session, checks
//! the manifest, and materializes the library under an exclusive staging
//! lease. Nothing is cached between calls.

use std::path::Path;
use std::sync::Arc;

use oraslib_credentials::CredentialStore;
use oraslib_oci::{
    ContainerReference, Manifest, OciRegistry, Registry, RegistrySession, ensure_artifact_type,
};
use tracing::{debug, info, instrument};

use crate::context::{DEFAULT_WORKSPACE_SUFFIX, JobContext};
use crate::error::{Error, Result};
use crate::lease::StagingLease;
use crate::log::{BuildLog, TracingLog};
use crate::materialize::Materializer;
use crate::provenance::Provenance;

/// Opens a [`Registry`] for a session.
pub trait RegistryConnector: Send + Sync {
    /// Connect using `session`.
    fn connect(&self, session: RegistrySession) -> Box<dyn Registry>;
}

/// Connects through [`OciRegistry`].
#[derive(Debug, Clone, Copy, Default)]
pub struct OciConnector;

impl RegistryConnector for OciConnector {
    fn connect(&self, session: RegistrySession) -> Box<dyn Registry> {
        Box::new(OciRegistry::connect(session))
    }
}

/// Where a library is published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibrarySource {
    /// Base reference, `host[:port]/repo`, without tag or digest.
    pub container_ref: String,
    /// Credential ID; `None` pulls anonymously.
    pub credentials_id: Option<String>,
}

impl LibrarySource {
    /// Source pulled anonymously.
    #[must_use]
    pub fn anonymous(container_ref: impl Into<String>) -> Self {
        Self {
            container_ref: container_ref.into(),
            credentials_id: None,
        }
    }

    /// Source pulled with the credential `id`. An empty ID means none.
    #[must_use]
    pub fn with_credentials(container_ref: impl Into<String>, id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            container_ref: container_ref.into(),
            credentials_id: (!id.is_empty()).then_some(id),
        }
    }
}

/// Retrieves versions of one library source.
pub struct Retriever {
    source: LibrarySource,
    credentials: Arc<dyn CredentialStore>,
    connector: Arc<dyn RegistryConnector>,
    log: Arc<dyn BuildLog>,
    workspace_suffix: String,
    materializer: Materializer,
}

impl std::fmt::Debug for Retriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Retriever")
            .field("source", &self.source)
            .field("credentials", &self.credentials.provider_name())
            .field("workspace_suffix", &self.workspace_suffix)
            .finish_non_exhaustive()
    }
}

impl Retriever {
    /// Create a retriever pulling over `oci-distribution` and logging via `tracing`.
    #[must_use]
    pub fn new(source: LibrarySource, credentials: Arc<dyn CredentialStore>) -> Self {
        Self {
            source,
            credentials,
            connector: Arc::new(OciConnector),
            log: Arc::new(TracingLog),
            workspace_suffix: DEFAULT_WORKSPACE_SUFFIX.to_string(),
            materializer: Materializer::new(),
        }
    }

    /// Use a different registry connector.
    #[must_use]
    pub fn with_connector(mut self, connector: Arc<dyn RegistryConnector>) -> Self {
        self.connector = connector;
        self
    }

    /// Write the provenance line to `log`.
    #[must_use]
    pub fn with_log(mut self, log: Arc<dyn BuildLog>) -> Self {
        self.log = log;
        self
    }

    /// Use `suffix` between the workspace path and `libs`.
    #[must_use]
    pub fn with_workspace_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.workspace_suffix = suffix.into();
        self
    }

    /// The configured source.
    #[must_use]
    pub fn source(&self) -> &LibrarySource {
        &self.source
    }

    /// Retrieve `version` of library `name` into `target`.
    ///
    /// # Errors
    ///
    /// Fails when credentials do not resolve, the reference is malformed, the
    /// registry rejects or cannot serve the manifest, the artifact type does
    /// not match, the job has no usable workspace, or any pull or filesystem
    /// step fails. `target` may hold partial content after a failure.
    #[instrument(skip(self, ctx, target), fields(job = %ctx.job(), reference = %self.source.container_ref))]
    pub async fn retrieve(
        &self,
        ctx: &JobContext,
        name: &str,
        version: &str,
        target: &Path,
    ) -> Result<Provenance> {
        let session_credentials = self.resolve_credentials(ctx.job()).await?;
        let reference = ContainerReference::parse(&self.source.container_ref, version)?;
        let registry = self.connect(&reference, session_credentials);

        let manifest = registry.get_manifest(&reference).await?;
        ensure_artifact_type(&manifest)?;
        debug!(digest = %manifest.digest, layers = manifest.layers.len(), "Manifest accepted");

        let staging = ctx.staging_dir(name, &self.workspace_suffix)?;
        let provenance = {
            let lease = StagingLease::acquire(&staging).await?;
            self.materializer
                .materialize(registry.as_ref(), &reference, &manifest, lease.path(), target)
                .await?
        };

        self.log.line(&provenance.to_string());
        info!(
            library = name,
            digest = %provenance.digest,
            target = %target.display(),
            "Library retrieved"
        );
        Ok(provenance)
    }

    /// Fetch and validate the manifest for `reference` without pulling content.
    ///
    /// Credentials are resolved on behalf of `ctx`'s job.
    pub async fn inspect(&self, ctx: &JobContext, reference: &ContainerReference) -> Result<Manifest> {
        let session_credentials = self.resolve_credentials(ctx.job()).await?;
        let registry = self.connect(reference, session_credentials);
        let manifest = registry.get_manifest(reference).await?;
        ensure_artifact_type(&manifest)?;
        Ok(manifest)
    }

    async fn resolve_credentials(
        &self,
        scope: &str,
    ) -> Result<Option<oraslib_credentials::UsernamePassword>> {
        let Some(id) = self.source.credentials_id.as_deref() else {
            debug!("No credentials configured, using anonymous access");
            return Ok(None);
        };

        let credential = self
            .credentials
            .lookup(scope, id)
            .await
            .map_err(|e| Error::CredentialResolution {
                id: id.to_string(),
                reason: Some(e.to_string()),
            })?
            .ok_or_else(|| Error::credential_not_found(id))?;

        self.credentials.track(scope, id);
        Ok(Some(credential))
    }

    fn connect(
        &self,
        reference: &ContainerReference,
        credential: Option<oraslib_credentials::UsernamePassword>,
    ) -> Box<dyn Registry> {
        let session = match credential {
            Some(credential) => RegistrySession::basic(
                reference.registry(),
                credential.username(),
                credential.password().clone(),
            ),
            None => RegistrySession::anonymous(reference.registry()),
        };
        self.connector.connect(session)
    }
}
