//! Container reference parsing.
//!
//! A reference names a repository inside a registry plus exactly one version
//! selector:
//!
//! ```text
//! registry.example.com[:port]/team/lib:1.0
//! registry.example.com[:port]/team/lib@sha256:<hex>
//! ```
//!
//! Unlike Docker-style references there is no implicit registry and no
//! implicit `latest` tag: both the host and the selector must be spelled out.

use std::fmt;
use std::str::FromStr;

use oci_distribution::{ParseError, Reference};

use crate::{Error, Result};

/// Version selector of a [`ContainerReference`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Selector {
    /// A mutable tag such as `1.0` or `latest`.
    Tag(String),
    /// A content digest such as `sha256:e3b0...`.
    Digest(String),
}

/// A parsed `host/repo:tag` or `host/repo@digest` reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContainerReference {
    registry: String,
    repository: String,
    selector: Selector,
}

impl ContainerReference {
    /// Parse a base reference (`host[:port]/path`) combined with a version.
    ///
    /// The version is always treated as a tag: the combined text
    /// `base:version` has to satisfy the tag grammar.
    pub fn parse(base: &str, version: &str) -> Result<Self> {
        let combined = format!("{base}:{version}");
        let reference: Self = combined.parse()?;
        if reference.base() != base || reference.tag() != Some(version) {
            return Err(Error::malformed_reference(combined, "version is not a valid tag"));
        }
        Ok(reference)
    }

    /// The same repository pinned to `digest`.
    #[must_use]
    pub fn pinned(&self, digest: impl Into<String>) -> Self {
        Self {
            registry: self.registry.clone(),
            repository: self.repository.clone(),
            selector: Selector::Digest(digest.into()),
        }
    }

    /// Registry host, including the port if one was given.
    #[must_use]
    pub fn registry(&self) -> &str {
        &self.registry
    }

    /// Repository path inside the registry.
    #[must_use]
    pub fn repository(&self) -> &str {
        &self.repository
    }

    /// The version selector.
    #[must_use]
    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    /// The tag, if the selector is a tag.
    #[must_use]
    pub fn tag(&self) -> Option<&str> {
        match &self.selector {
            Selector::Tag(tag) => Some(tag),
            Selector::Digest(_) => None,
        }
    }

    /// The digest, if the selector is a digest.
    #[must_use]
    pub fn digest(&self) -> Option<&str> {
        match &self.selector {
            Selector::Digest(digest) => Some(digest),
            Selector::Tag(_) => None,
        }
    }

    /// The reference without its selector (`host/repo`).
    #[must_use]
    pub fn base(&self) -> String {
        format!("{}/{}", self.registry, self.repository)
    }

    pub(crate) fn to_oci_reference(&self) -> Reference {
        match &self.selector {
            Selector::Tag(tag) => {
                Reference::with_tag(self.registry.clone(), self.repository.clone(), tag.clone())
            }
            Selector::Digest(digest) => Reference::with_digest(
                self.registry.clone(),
                self.repository.clone(),
                digest.clone(),
            ),
        }
    }
}

impl FromStr for ContainerReference {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let reference: Reference = s
            .parse()
            .map_err(|e: ParseError| Error::malformed_reference(s, e.to_string()))?;

        // oci-distribution falls back to Docker Hub and `latest`; neither
        // may be implied here, so the name must appear verbatim in the text.
        let name = format!("{}/{}", reference.registry(), reference.repository());
        let Some(rest) = s.strip_prefix(&name) else {
            return Err(Error::malformed_reference(s, "missing registry host"));
        };

        let selector = match (reference.tag(), reference.digest()) {
            (Some(tag), None) if rest == format!(":{tag}") => Selector::Tag(tag.to_string()),
            (None, Some(digest)) if rest == format!("@{digest}") => {
                Selector::Digest(digest.to_string())
            }
            (Some(_), Some(_)) => {
                return Err(Error::malformed_reference(s, "both tag and digest given"));
            }
            _ => return Err(Error::malformed_reference(s, "missing tag or digest")),
        };

        Ok(Self {
            registry: reference.registry().to_string(),
            repository: reference.repository().to_string(),
            selector,
        })
    }
}

impl fmt::Display for ContainerReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.selector {
            Selector::Tag(tag) => write!(f, "{}/{}:{}", self.registry, self.repository, tag),
            Selector::Digest(digest) => {
                write!(f, "{}/{}@{}", self.registry, self.repository, digest)
            }
        }
    }
}
