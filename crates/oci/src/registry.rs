//! Registry sessions and the artifact pull path.
//!
//! Uses `oci-distribution` for the distribution HTTP API.

use std::fmt;
use std::path::Path;

use async_trait::async_trait;
use oci_distribution::client::{ClientConfig, ClientProtocol};
use oci_distribution::errors::{OciDistributionError, OciErrorCode};
use oci_distribution::secrets::RegistryAuth as OciRegistryAuth;
use oci_distribution::{Client, Reference};
use secrecy::{ExposeSecret, SecretString};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, trace};

use crate::digest::verify_file_digest;
use crate::extract::unpack_layer;
use crate::manifest::{LayerDescriptor, Manifest};
use crate::reference::ContainerReference;
use crate::{Error, Result};

/// How a session authenticates against the registry.
#[derive(Clone)]
pub enum RegistryAuth {
    /// No authentication header is sent.
    Anonymous,
    /// HTTP basic credentials.
    Basic {
        /// Registry username.
        username: String,
        /// Password or token.
        secret: SecretString,
    },
}

impl fmt::Debug for RegistryAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anonymous => f.write_str("Anonymous"),
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("secret", &"[REDACTED]")
                .finish(),
        }
    }
}

/// Transport security of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsMode {
    /// HTTPS only.
    Secure,
    /// Plain HTTP permitted.
    Insecure,
}

/// Connection parameters for one retrieval.
///
/// Sessions are built per call from freshly resolved credentials and are
/// never cached, since credentials may rotate between calls.
#[derive(Debug, Clone)]
pub struct RegistrySession {
    endpoint: String,
    auth: RegistryAuth,
    tls: TlsMode,
}

impl RegistrySession {
    /// Anonymous session; plain HTTP is permitted.
    #[must_use]
    pub fn anonymous(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            auth: RegistryAuth::Anonymous,
            tls: TlsMode::Insecure,
        }
    }

    /// Session authenticating with basic credentials over HTTPS.
    #[must_use]
    pub fn basic(
        endpoint: impl Into<String>,
        username: impl Into<String>,
        secret: SecretString,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            auth: RegistryAuth::Basic {
                username: username.into(),
                secret,
            },
            tls: TlsMode::Secure,
        }
    }

    /// Registry host the session is bound to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Authentication mode.
    #[must_use]
    pub fn auth(&self) -> &RegistryAuth {
        &self.auth
    }

    /// Transport security mode.
    #[must_use]
    pub fn tls(&self) -> TlsMode {
        self.tls
    }
}

/// Client-side pull operations against an artifact registry.
#[async_trait]
pub trait Registry: Send + Sync {
    /// Resolve the manifest for a reference.
    async fn get_manifest(&self, reference: &ContainerReference) -> Result<Manifest>;

    /// Download every layer of the referenced artifact into `dest`.
    ///
    /// With `verify_digest`, each blob must hash to its declared digest. On
    /// failure `dest` may hold partially written content.
    async fn pull_artifact(
        &self,
        reference: &ContainerReference,
        dest: &Path,
        verify_digest: bool,
    ) -> Result<()>;
}

/// [`Registry`] implementation backed by `oci-distribution`.
pub struct OciRegistry {
    client: Client,
    session: RegistrySession,
}

impl OciRegistry {
    /// Create a client for the session's registry.
    #[must_use]
    pub fn connect(session: RegistrySession) -> Self {
        let protocol = match session.tls {
            TlsMode::Secure => ClientProtocol::Https,
            TlsMode::Insecure => ClientProtocol::Http,
        };
        let config = ClientConfig {
            protocol,
            ..Default::default()
        };
        debug!(endpoint = %session.endpoint, tls = ?session.tls, "Connecting to registry");
        Self {
            client: Client::new(config),
            session,
        }
    }

    /// The session this client was built from.
    #[must_use]
    pub fn session(&self) -> &RegistrySession {
        &self.session
    }

    fn oci_auth(&self) -> OciRegistryAuth {
        match &self.session.auth {
            RegistryAuth::Anonymous => OciRegistryAuth::Anonymous,
            RegistryAuth::Basic { username, secret } => {
                OciRegistryAuth::Basic(username.clone(), secret.expose_secret().to_string())
            }
        }
    }

    async fn pull_blob(&self, reference: &Reference, layer: &LayerDescriptor, dest: &Path) -> Result<()> {
        trace!(digest = %layer.digest, ?dest, "Pulling blob");
        let mut file = tokio::fs::File::create(dest).await?;
        let descriptor = layer.to_oci_descriptor();

        self.client
            .pull_blob(reference, &descriptor, &mut file)
            .await
            .map_err(|e| classify(&self.session.endpoint, e))?;

        file.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl Registry for OciRegistry {
    async fn get_manifest(&self, reference: &ContainerReference) -> Result<Manifest> {
        debug!(%reference, "Fetching manifest");
        let (manifest, digest) = self
            .client
            .pull_image_manifest(&reference.to_oci_reference(), &self.oci_auth())
            .await
            .map_err(|e| classify(&self.session.endpoint, e))?;

        trace!(?manifest, "Got manifest");
        Ok(Manifest::from_oci(&manifest, digest))
    }

    async fn pull_artifact(
        &self,
        reference: &ContainerReference,
        dest: &Path,
        verify_digest: bool,
    ) -> Result<()> {
        let manifest = self.get_manifest(reference).await?;
        let oci_reference = reference.to_oci_reference();

        // Blobs land outside `dest` so that only unpacked content ends up there
        let scratch = tempfile::Builder::new().prefix("oraslib-blobs").tempdir()?;

        for (index, layer) in manifest.layers.iter().enumerate() {
            let blob = scratch.path().join(format!("layer-{index}"));
            self.pull_blob(&oci_reference, layer, &blob).await?;

            if verify_digest {
                verify_file_digest(&blob, &layer.digest).await?;
                trace!(digest = %layer.digest, "Verified blob digest");
            }

            let layer = layer.clone();
            let dest = dest.to_path_buf();
            tokio::task::spawn_blocking(move || unpack_layer(&blob, &layer, &dest))
                .await
                .map_err(|e| Error::Io(std::io::Error::other(e.to_string())))??;
        }

        info!(
            %reference,
            digest = %manifest.digest,
            layers = manifest.layers.len(),
            "Pulled artifact"
        );
        Ok(())
    }
}

/// Map a distribution client error onto the retrieval error kinds.
fn classify(registry: &str, error: OciDistributionError) -> Error {
    match error {
        OciDistributionError::AuthenticationFailure(message) => {
            Error::authentication(registry, message)
        }
        OciDistributionError::UnauthorizedError { url } => {
            Error::authentication(registry, format!("unauthorized: {url}"))
        }
        OciDistributionError::ImageManifestNotFoundError(message) => {
            Error::ManifestNotFound(message)
        }
        // Blob downloads surface HTTP failures as plain request errors
        OciDistributionError::RequestError(error)
            if matches!(error.status().map(|s| s.as_u16()), Some(401 | 403)) =>
        {
            Error::authentication(registry, error.to_string())
        }
        OciDistributionError::RegistryError { envelope, url } => {
            let codes: Vec<&OciErrorCode> = envelope.errors.iter().map(|e| &e.code).collect();
            let message = format!("{url}: {envelope:?}");
            if codes
                .iter()
                .any(|c| matches!(c, OciErrorCode::ManifestUnknown | OciErrorCode::NameUnknown))
            {
                Error::ManifestNotFound(message)
            } else if codes
                .iter()
                .any(|c| matches!(c, OciErrorCode::Unauthorized | OciErrorCode::Denied))
            {
                Error::authentication(registry, message)
            } else {
                Error::Transport(message)
            }
        }
        other => Error::Transport(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymous_session_is_insecure() {
        let session = RegistrySession::anonymous("localhost:5000");
        assert_eq!(session.endpoint(), "localhost:5000");
        assert_eq!(session.tls(), TlsMode::Insecure);
        assert!(matches!(session.auth(), RegistryAuth::Anonymous));
    }

    #[test]
    fn test_basic_session_is_secure() {
        let session = RegistrySession::basic(
            "registry.example.com",
            "builder",
            SecretString::from("s3cret".to_string()),
        );
        assert_eq!(session.tls(), TlsMode::Secure);
        assert!(matches!(session.auth(), RegistryAuth::Basic { username, .. } if username == "builder"));
    }

    #[test]
    fn test_session_debug_redacts_secret() {
        let session = RegistrySession::basic(
            "registry.example.com",
            "builder",
            SecretString::from("s3cret".to_string()),
        );
        let debug = format!("{session:?}");
        assert!(debug.contains("builder"));
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("s3cret"));
    }

    #[test]
    fn test_oci_auth_mapping() {
        let anonymous = OciRegistry::connect(RegistrySession::anonymous("localhost:5000"));
        assert!(matches!(anonymous.oci_auth(), OciRegistryAuth::Anonymous));

        let basic = OciRegistry::connect(RegistrySession::basic(
            "registry.example.com",
            "builder",
            SecretString::from("s3cret".to_string()),
        ));
        match basic.oci_auth() {
            OciRegistryAuth::Basic(user, pass) => {
                assert_eq!(user, "builder");
                assert_eq!(pass, "s3cret");
            }
            _ => panic!("expected basic auth"),
        }
    }

    #[test]
    fn test_classify_not_found() {
        let err = classify(
            "localhost:5000",
            OciDistributionError::ImageManifestNotFoundError("lib:missing".to_string()),
        );
        assert!(matches!(err, Error::ManifestNotFound(_)));
    }

    #[test]
    fn test_classify_authentication() {
        let err = classify(
            "localhost:5000",
            OciDistributionError::AuthenticationFailure("bad token".to_string()),
        );
        assert!(matches!(err, Error::Authentication { .. }));

        let err = classify(
            "localhost:5000",
            OciDistributionError::UnauthorizedError {
                url: "http://localhost:5000/v2/lib/manifests/latest".to_string(),
            },
        );
        assert!(matches!(err, Error::Authentication { .. }));
    }
}
