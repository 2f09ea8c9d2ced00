//! `oraslib inspect`: fetch and validate a manifest without pulling content.

use std::fmt;

use oraslib_oci::{ContainerReference, Manifest};
use oraslib_retriever::{JobContext, LibrarySource, Retriever};
use serde::Serialize;

use crate::cli::CliError;
use crate::config::Config;

/// Summary of a validated manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InspectReport {
    /// Reference that was inspected.
    pub reference: String,
    /// Manifest digest.
    pub digest: String,
    /// Artifact type.
    pub artifact_type: String,
    /// Revision annotation, or `unknown`.
    pub revision: String,
    /// Source annotation, or `unknown`.
    pub source: String,
    /// Number of layers.
    pub layers: usize,
}

impl InspectReport {
    fn new(reference: &ContainerReference, manifest: &Manifest) -> Self {
        Self {
            reference: reference.to_string(),
            digest: manifest.digest.clone(),
            artifact_type: manifest.artifact_type().to_string(),
            revision: manifest.revision().to_string(),
            source: manifest.source().to_string(),
            layers: manifest.layers.len(),
        }
    }
}

impl fmt::Display for InspectReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "reference:     {}", self.reference)?;
        writeln!(f, "digest:        {}", self.digest)?;
        writeln!(f, "artifact type: {}", self.artifact_type)?;
        writeln!(f, "revision:      {}", self.revision)?;
        writeln!(f, "source:        {}", self.source)?;
        write!(f, "layers:        {}", self.layers)
    }
}

/// Fetch and validate the manifest behind `reference`.
pub async fn inspect(
    config: &Config,
    reference: &str,
    credentials_id: Option<&str>,
    job: &str,
) -> Result<InspectReport, CliError> {
    let reference: ContainerReference = reference.parse()?;
    let source = match credentials_id {
        Some(id) => LibrarySource::with_credentials(reference.base(), id),
        None => LibrarySource::anonymous(reference.base()),
    };

    let retriever = Retriever::new(source, config.credential_store());
    let manifest = retriever
        .inspect(&JobContext::without_workspace(job), &reference)
        .await?;
    Ok(InspectReport::new(&reference, &manifest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use oraslib_oci::{ANNOTATION_REVISION, ARTIFACT_TYPE};
    use std::collections::BTreeMap;

    #[test]
    fn test_report_fields() {
        let reference: ContainerReference = "localhost:5000/team/mylib:1.0".parse().unwrap();
        let manifest = Manifest {
            artifact_type: Some(ARTIFACT_TYPE.to_string()),
            digest: "sha256:abc".to_string(),
            annotations: BTreeMap::from([(ANNOTATION_REVISION.to_string(), "4f2a9c1".to_string())]),
            layers: Vec::new(),
        };

        let report = InspectReport::new(&reference, &manifest);

        assert_eq!(report.reference, "localhost:5000/team/mylib:1.0");
        assert_eq!(report.revision, "4f2a9c1");
        assert_eq!(report.source, "unknown");
        assert_eq!(report.layers, 0);
        assert!(report.to_string().contains("artifact type: application/vnd.jenkins.lib.manifest.v1+json"));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["digest"], "sha256:abc");
    }

    #[tokio::test]
    async fn test_malformed_reference_is_config_error() {
        let err = inspect(&Config::default(), "not a reference", None, "job")
            .await
            .unwrap_err();
        assert!(matches!(err, CliError::Config { .. }));
    }

    #[tokio::test]
    async fn test_missing_credentials_fail_before_network() {
        let config = Config::default();
        let err = temp_env::async_with_vars(
            [
                ("ORASLIB_CREDENTIALS_NOPE_USERNAME", None::<&str>),
                ("ORASLIB_CREDENTIALS_NOPE_PASSWORD", None),
            ],
            inspect(&config, "localhost:5000/team/mylib:1.0", Some("nope"), "job"),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, CliError::Retrieval { .. }));
        assert!(err.to_string().contains("No credentials found with ID: nope"));
    }
}
