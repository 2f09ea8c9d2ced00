//! OCI artifact access for oraslib.
//!
//! This crate provides functionality to:
//! - Parse `host/repo:tag` container references
//! - Fetch artifact manifests and enforce the pipeline library artifact type
//! - Pull artifact layers into a directory, verifying blob digests
//!
//! # Example
//!
//! ```ignore
//! use oraslib_oci::{ContainerReference, OciRegistry, Registry, RegistrySession, ensure_artifact_type};
//!
//! let reference = ContainerReference::parse("registry.example.com/team/lib", "1.0")?;
//! let registry = OciRegistry::connect(RegistrySession::anonymous(reference.registry()));
//!
//! let manifest = registry.get_manifest(&reference).await?;
//! ensure_artifact_type(&manifest)?;
//! registry.pull_artifact(&reference, &staging, true).await?;
//! ```

#![warn(missing_docs)]

mod digest;
mod error;
mod extract;
mod manifest;
mod reference;
mod registry;

pub use digest::{compute_file_digest, verify_file_digest};
pub use error::{Error, Result};
pub use extract::unpack_layer;
pub use manifest::{
    ANNOTATION_REVISION, ANNOTATION_SOURCE, ANNOTATION_TITLE, ANNOTATION_UNPACK, ARTIFACT_TYPE,
    LayerDescriptor, Manifest, UNKNOWN, ensure_artifact_type,
};
pub use reference::{ContainerReference, Selector};
pub use registry::{OciRegistry, Registry, RegistryAuth, RegistrySession, TlsMode};
