//! Artifact manifests and artifact type enforcement.

use std::collections::BTreeMap;

use oci_distribution::manifest::{OciDescriptor, OciImageManifest};

use crate::{Error, Result};

/// Media type every pipeline library manifest must declare as its artifact type.
pub const ARTIFACT_TYPE: &str = "application/vnd.jenkins.lib.manifest.v1+json";

/// Manifest annotation carrying the source revision (e.g. a commit SHA).
pub const ANNOTATION_REVISION: &str = "org.opencontainers.image.revision";

/// Manifest annotation carrying the source location (e.g. a repository URL).
pub const ANNOTATION_SOURCE: &str = "org.opencontainers.image.source";

/// Layer annotation naming the file or directory the layer holds.
pub const ANNOTATION_TITLE: &str = "org.opencontainers.image.title";

/// Layer annotation marking a layer as a packed directory.
pub const ANNOTATION_UNPACK: &str = "io.deis.oras.content.unpack";

/// Value used when an annotation is absent.
pub const UNKNOWN: &str = "unknown";

/// A layer entry of a [`Manifest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerDescriptor {
    /// Layer media type.
    pub media_type: String,
    /// Content digest (`algorithm:hex`).
    pub digest: String,
    /// Size in bytes as declared by the manifest.
    pub size: i64,
    /// Layer annotations.
    pub annotations: BTreeMap<String, String>,
}

impl LayerDescriptor {
    /// The `org.opencontainers.image.title` annotation, if present.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.annotations.get(ANNOTATION_TITLE).map(String::as_str)
    }

    /// Whether the layer is a packed directory to be unpacked on pull.
    ///
    /// ORAS marks packed directories with the unpack annotation. Titled
    /// layers without it are single files even under a tar media type, which
    /// is what `oras push` assigns to plain files by default. Only untitled
    /// layers are judged by their media type.
    #[must_use]
    pub fn is_archive(&self) -> bool {
        if let Some(unpack) = self.annotations.get(ANNOTATION_UNPACK) {
            return unpack == "true";
        }
        self.title().is_none()
            && (self.media_type.contains(".tar")
                || self.media_type.ends_with("/x-tar")
                || self.media_type.ends_with("+tar"))
    }

    pub(crate) fn to_oci_descriptor(&self) -> OciDescriptor {
        OciDescriptor {
            media_type: self.media_type.clone(),
            digest: self.digest.clone(),
            size: self.size,
            urls: None,
            annotations: if self.annotations.is_empty() {
                None
            } else {
                Some(self.annotations.clone().into_iter().collect())
            },
        }
    }
}

impl From<&OciDescriptor> for LayerDescriptor {
    fn from(descriptor: &OciDescriptor) -> Self {
        Self {
            media_type: descriptor.media_type.clone(),
            digest: descriptor.digest.clone(),
            size: descriptor.size,
            annotations: descriptor
                .annotations
                .clone()
                .map(|a| a.into_iter().collect())
                .unwrap_or_default(),
        }
    }
}

/// Registry-served metadata describing an artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    /// Declared artifact media type.
    pub artifact_type: Option<String>,
    /// Manifest digest.
    pub digest: String,
    /// Manifest annotations.
    pub annotations: BTreeMap<String, String>,
    /// Layers holding the artifact content.
    pub layers: Vec<LayerDescriptor>,
}

impl Manifest {
    /// Build a manifest from the registry's image manifest and its digest.
    ///
    /// Manifests without an `artifactType` field fall back to the config
    /// media type, which is where older artifact tooling records the type.
    #[must_use]
    pub fn from_oci(manifest: &OciImageManifest, digest: impl Into<String>) -> Self {
        let artifact_type = manifest
            .artifact_type
            .clone()
            .or_else(|| Some(manifest.config.media_type.clone()))
            .filter(|t| !t.is_empty());
        Self {
            artifact_type,
            digest: digest.into(),
            annotations: manifest
                .annotations
                .clone()
                .map(|a| a.into_iter().collect())
                .unwrap_or_default(),
            layers: manifest.layers.iter().map(LayerDescriptor::from).collect(),
        }
    }

    /// The declared artifact type, or an empty string when absent.
    #[must_use]
    pub fn artifact_type(&self) -> &str {
        self.artifact_type.as_deref().unwrap_or_default()
    }

    /// The revision annotation, or `unknown`.
    #[must_use]
    pub fn revision(&self) -> &str {
        self.annotation_or_unknown(ANNOTATION_REVISION)
    }

    /// The source annotation, or `unknown`.
    #[must_use]
    pub fn source(&self) -> &str {
        self.annotation_or_unknown(ANNOTATION_SOURCE)
    }

    fn annotation_or_unknown(&self, key: &str) -> &str {
        self.annotations.get(key).map_or(UNKNOWN, String::as_str)
    }
}

/// Reject manifests whose artifact type is not exactly [`ARTIFACT_TYPE`].
pub fn ensure_artifact_type(manifest: &Manifest) -> Result<()> {
    if manifest.artifact_type.as_deref() == Some(ARTIFACT_TYPE) {
        Ok(())
    } else {
        Err(Error::invalid_artifact_type(
            ARTIFACT_TYPE,
            manifest.artifact_type(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest(artifact_type: Option<&str>) -> Manifest {
        Manifest {
            artifact_type: artifact_type.map(str::to_string),
            digest: "sha256:abc".to_string(),
            annotations: BTreeMap::new(),
            layers: vec![],
        }
    }

    #[test]
    fn test_exact_artifact_type_accepted() {
        assert!(ensure_artifact_type(&manifest(Some(ARTIFACT_TYPE))).is_ok());
    }

    #[test]
    fn test_one_character_difference_rejected() {
        let mut near = ARTIFACT_TYPE.to_string();
        near.pop();
        near.push('N');
        for candidate in [
            near.as_str(),
            "application/vnd.jenkins.lib.manifest.v1+jso",
            "application/vnd.jenkins.lib.manifest.v1+json ",
            "Application/vnd.jenkins.lib.manifest.v1+json",
            "application/vnd.jenkins.lib.manifest.v1",
            "application/octet-stream",
            "",
        ] {
            let err = ensure_artifact_type(&manifest(Some(candidate))).unwrap_err();
            assert!(
                matches!(err, Error::InvalidArtifactType { .. }),
                "{candidate:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_missing_artifact_type_rejected() {
        let err = ensure_artifact_type(&manifest(None)).unwrap_err();
        match err {
            Error::InvalidArtifactType { expected, actual } => {
                assert_eq!(expected, ARTIFACT_TYPE);
                assert_eq!(actual, "");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_annotations_are_unknown() {
        let m = manifest(Some(ARTIFACT_TYPE));
        assert_eq!(m.revision(), "unknown");
        assert_eq!(m.source(), "unknown");
    }

    #[test]
    fn test_annotations_are_read() {
        let mut m = manifest(Some(ARTIFACT_TYPE));
        m.annotations
            .insert(ANNOTATION_REVISION.to_string(), "4f2a9c1".to_string());
        m.annotations.insert(
            ANNOTATION_SOURCE.to_string(),
            "https://git.example.com/lib".to_string(),
        );
        assert_eq!(m.revision(), "4f2a9c1");
        assert_eq!(m.source(), "https://git.example.com/lib");
    }

    #[test]
    fn test_from_oci_prefers_artifact_type_field() {
        let oci = OciImageManifest {
            artifact_type: Some(ARTIFACT_TYPE.to_string()),
            config: OciDescriptor {
                media_type: "application/vnd.oci.empty.v1+json".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        let m = Manifest::from_oci(&oci, "sha256:abc");
        assert_eq!(m.artifact_type(), ARTIFACT_TYPE);
        assert_eq!(m.digest, "sha256:abc");
    }

    #[test]
    fn test_from_oci_falls_back_to_config_media_type() {
        let oci = OciImageManifest {
            artifact_type: None,
            config: OciDescriptor {
                media_type: ARTIFACT_TYPE.to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        let m = Manifest::from_oci(&oci, "sha256:abc");
        assert!(ensure_artifact_type(&m).is_ok());
    }

    #[test]
    fn test_layer_archive_detection() {
        let mut layer = LayerDescriptor {
            media_type: "application/vnd.oci.image.layer.v1.tar+gzip".to_string(),
            digest: "sha256:abc".to_string(),
            size: 1,
            annotations: BTreeMap::new(),
        };
        assert!(layer.is_archive());

        layer.media_type = "application/vnd.oci.image.layer.v1.tar".to_string();
        assert!(layer.is_archive());

        layer.media_type = "text/plain".to_string();
        assert!(!layer.is_archive());

        layer
            .annotations
            .insert(ANNOTATION_UNPACK.to_string(), "true".to_string());
        assert!(layer.is_archive());
    }

    #[test]
    fn test_titled_tar_layer_is_a_file() {
        let mut layer = LayerDescriptor {
            media_type: "application/vnd.oci.image.layer.v1.tar".to_string(),
            digest: "sha256:abc".to_string(),
            size: 1,
            annotations: BTreeMap::from([(
                ANNOTATION_TITLE.to_string(),
                "vars/myFunc.groovy".to_string(),
            )]),
        };
        assert!(!layer.is_archive());

        layer
            .annotations
            .insert(ANNOTATION_UNPACK.to_string(), "true".to_string());
        assert!(layer.is_archive());

        // An explicit opt-out wins over the media type
        layer.annotations.clear();
        layer
            .annotations
            .insert(ANNOTATION_UNPACK.to_string(), "false".to_string());
        assert!(!layer.is_archive());
    }

    #[test]
    fn test_layer_title() {
        let layer = LayerDescriptor {
            media_type: "text/plain".to_string(),
            digest: "sha256:abc".to_string(),
            size: 5,
            annotations: BTreeMap::from([(ANNOTATION_TITLE.to_string(), "notes.txt".to_string())]),
        };
        assert_eq!(layer.title(), Some("notes.txt"));
    }
}
