//! `oraslib retrieve`: pull a configured library into a target directory.

use std::path::Path;
use std::sync::Arc;

use oraslib_retriever::{BuildLog, JobContext, Provenance, Retriever};
use tracing::{Instrument, info_span};

use crate::cli::CliError;
use crate::config::Config;

/// Writes build log lines to stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutLog;

impl BuildLog for StdoutLog {
    #[allow(clippy::print_stdout)]
    fn line(&self, message: &str) {
        println!("{message}");
    }
}

/// Arguments of the `retrieve` subcommand.
#[derive(Debug, Clone, Copy)]
pub struct RetrieveRequest<'a> {
    /// Configured library name.
    pub name: &'a str,
    /// Requested version, if any.
    pub version: Option<&'a str>,
    /// Job name.
    pub job: &'a str,
    /// Destination directory.
    pub target: &'a Path,
    /// Workspace root override.
    pub workspace_root: Option<&'a Path>,
    /// Workspace suffix override.
    pub workspace_suffix: Option<&'a str>,
}

/// Retrieve a configured library for a job.
pub async fn retrieve(
    config: &Config,
    request: RetrieveRequest<'_>,
    log: Arc<dyn BuildLog>,
) -> Result<Provenance, CliError> {
    let library = config.library(request.name)?;
    let version = library.version(request.version)?;
    let root = config.workspace_root(request.workspace_root)?;
    let ctx = JobContext::new(request.job, root.join(request.job));

    let retriever = Retriever::new(library.source(), config.credential_store())
        .with_log(log)
        .with_workspace_suffix(config.workspace_suffix(request.workspace_suffix));

    let span = info_span!("retrieve", library = request.name, version, job = request.job);
    Ok(retriever
        .retrieve(&ctx, request.name, version, request.target)
        .instrument(span)
        .await?)
}
