//! Pipeline library retrieval from OCI registries.
//!
//! [`Retriever`] composes the pieces of one retrieval:
//!
//! 1. resolve the configured credential ID through a
//!    [`CredentialStore`](oraslib_credentials::CredentialStore)
//! 2. open a fresh registry session and fetch the manifest
//! 3. reject anything that is not a pipeline library artifact
//! 4. pull into `<workspace>@libs/<name>` under an exclusive [`StagingLease`]
//! 5. promote a lone wrapper directory and copy the tree to the target
//! 6. write the provenance line to the [`BuildLog`]
//!
//! ```ignore
//! use std::sync::Arc;
//! use oraslib_credentials::EnvCredentialStore;
//! use oraslib_retriever::{JobContext, LibrarySource, Retriever};
//!
//! let retriever = Retriever::new(
//!     LibrarySource::with_credentials("registry.example.com/team/mylib", "registry-creds"),
//!     Arc::new(EnvCredentialStore::new()),
//! );
//! let ctx = JobContext::new("build", "/var/lib/oraslib/workspace/build");
//! let provenance = retriever.retrieve(&ctx, "mylib", "1.0", &target).await?;
//! ```

#![warn(missing_docs)]

mod context;
mod error;
mod lease;
mod layout;
mod log;
mod materialize;
mod provenance;
mod retriever;

pub use context::{DEFAULT_WORKSPACE_SUFFIX, JobContext};
pub use error::{Error, Result};
pub use layout::{Normalization, WELL_KNOWN_DIRS, copy_tree, normalize_layout};
pub use lease::StagingLease;
pub use log::{BuildLog, MemoryLog, TracingLog};
pub use materialize::Materializer;
pub use provenance::Provenance;
pub use retriever::{LibrarySource, OciConnector, RegistryConnector, Retriever};
