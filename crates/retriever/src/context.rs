//! The job a retrieval runs on behalf of.

use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Suffix appended to a job workspace to form its library staging area.
pub const DEFAULT_WORKSPACE_SUFFIX: &str = "@";

/// Identity and workspace of the invoking job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobContext {
    job: String,
    workspace: Option<PathBuf>,
    top_level: bool,
}

impl JobContext {
    /// A top-level job with a reachable workspace.
    #[must_use]
    pub fn new(job: impl Into<String>, workspace: impl Into<PathBuf>) -> Self {
        Self {
            job: job.into(),
            workspace: Some(workspace.into()),
            top_level: true,
        }
    }

    /// A job nested inside another one; it has no workspace of its own.
    #[must_use]
    pub fn nested(job: impl Into<String>) -> Self {
        Self {
            job: job.into(),
            workspace: None,
            top_level: false,
        }
    }

    /// A top-level job whose workspace cannot currently be reached.
    #[must_use]
    pub fn without_workspace(job: impl Into<String>) -> Self {
        Self {
            job: job.into(),
            workspace: None,
            top_level: true,
        }
    }

    /// Job name, also used as the credential lookup scope.
    #[must_use]
    pub fn job(&self) -> &str {
        &self.job
    }

    /// Job workspace, when reachable.
    #[must_use]
    pub fn workspace(&self) -> Option<&Path> {
        self.workspace.as_deref()
    }

    /// Whether the job is top-level.
    #[must_use]
    pub fn is_top_level(&self) -> bool {
        self.top_level
    }

    /// Staging directory for `library`: `<workspace><suffix>libs/<library>`.
    ///
    /// # Errors
    ///
    /// `NonTopLevelContext` for nested jobs, `StagingUnavailable` when the
    /// workspace is unreachable, `InvalidLibraryName` when `library` is not
    /// a single normal path component.
    pub fn staging_dir(&self, library: &str, suffix: &str) -> Result<PathBuf> {
        if !self.top_level {
            return Err(Error::NonTopLevelContext {
                job: self.job.clone(),
                library: library.to_string(),
            });
        }
        let Some(workspace) = &self.workspace else {
            return Err(Error::StagingUnavailable {
                job: self.job.clone(),
            });
        };

        let mut components = Path::new(library).components();
        if !matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        ) {
            return Err(Error::InvalidLibraryName {
                name: library.to_string(),
            });
        }

        let mut libs: OsString = workspace.clone().into_os_string();
        libs.push(suffix);
        libs.push("libs");
        Ok(PathBuf::from(libs).join(library))
    }
}
