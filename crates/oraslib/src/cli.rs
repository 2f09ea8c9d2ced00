//! Command-line arguments and the mapping of failures to exit codes.

use crate::tracing::{LogLevel, TracingFormat};
use clap::{Parser, Subcommand};
use miette::{Diagnostic, Report};
use std::io::{self, Write};
use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the CLI application
pub const EXIT_OK: i32 = 0;
/// CLI or configuration error exit code
pub const EXIT_CLI: i32 = 2;
/// Retrieval error exit code
pub const EXIT_RETRIEVAL: i32 = 3;

/// CLI-specific error types with proper exit code mapping
#[derive(Error, Debug, Clone, Diagnostic)]
pub enum CliError {
    /// CLI or configuration error (exit code 2)
    #[error("Configuration error: {message}")]
    #[diagnostic(code(oraslib::cli::config))]
    Config {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },
    /// Credential, registry, staging or filesystem failure (exit code 3)
    #[error("Retrieval failed: {message}")]
    #[diagnostic(code(oraslib::cli::retrieval))]
    Retrieval {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },
}

impl CliError {
    /// Create a new configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: None,
        }
    }

    /// Create a new configuration error with help text
    #[must_use]
    pub fn config_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    /// Create a new retrieval error
    #[must_use]
    pub fn retrieval(message: impl Into<String>) -> Self {
        Self::Retrieval {
            message: message.into(),
            help: None,
        }
    }
}

/// Convert `oraslib_retriever::Error` to the matching `CliError` variant.
///
/// Malformed references and unusable library names are configuration
/// problems; everything else happened while retrieving.
impl From<oraslib_retriever::Error> for CliError {
    fn from(err: oraslib_retriever::Error) -> Self {
        let help = err.help().map(|h| h.to_string());
        let message = err.to_string();
        match err {
            oraslib_retriever::Error::Oci(oraslib_oci::Error::MalformedReference { .. })
            | oraslib_retriever::Error::InvalidLibraryName { .. } => Self::Config { message, help },
            _ => Self::Retrieval { message, help },
        }
    }
}

impl From<oraslib_oci::Error> for CliError {
    fn from(err: oraslib_oci::Error) -> Self {
        oraslib_retriever::Error::from(err).into()
    }
}

/// Map CLI error to appropriate exit code
#[must_use]
pub const fn exit_code_for(err: &CliError) -> i32 {
    match err {
        CliError::Config { .. } => EXIT_CLI,
        CliError::Retrieval { .. } => EXIT_RETRIEVAL,
    }
}

/// Render an error on stderr with miette
#[allow(clippy::print_stderr)]
pub fn render_error(err: &CliError) {
    let report = Report::new(err.clone());
    eprintln!("{report:?}");
    let _ = io::stderr().flush();
}

/// Retrieve pipeline libraries published to OCI registries.
#[derive(Parser, Debug)]
#[command(name = "oraslib", version, about)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file.
    #[arg(long, short = 'c', global = true, env = "ORASLIB_CONFIG")]
    pub config: Option<PathBuf>,

    /// Logging verbosity level.
    #[arg(
        short = 'L',
        long,
        global = true,
        default_value = "warn",
        value_enum,
        env = "ORASLIB_LOG_LEVEL"
    )]
    pub log_level: LogLevel,

    /// Diagnostic output format.
    #[arg(long, global = true, default_value = "compact", value_enum)]
    pub log_format: TracingFormat,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Pull a configured library into a job's target directory.
    Retrieve {
        /// Library name from the configuration.
        name: String,

        /// Version (tag) to retrieve; defaults to the library's default_version.
        #[arg(long = "version")]
        version: Option<String>,

        /// Job performing the retrieval; selects its workspace and credential scope.
        #[arg(long, env = "ORASLIB_JOB")]
        job: String,

        /// Directory the library is copied into.
        #[arg(long)]
        target: PathBuf,

        /// Directory holding job workspaces.
        #[arg(long, env = "ORASLIB_WORKSPACE_ROOT")]
        workspace_root: Option<PathBuf>,

        /// Suffix between a job workspace and its libs directory.
        #[arg(long, env = "ORASLIB_WORKSPACE_SUFFIX")]
        workspace_suffix: Option<String>,
    },

    /// Fetch and validate a library manifest without pulling content.
    Inspect {
        /// Complete reference, `host/repo:tag` or `host/repo@digest`.
        reference: String,

        /// Credential ID to authenticate with.
        #[arg(long)]
        credentials_id: Option<String>,

        /// Job on whose behalf credentials are resolved.
        #[arg(long, env = "ORASLIB_JOB", default_value = "oraslib")]
        job: String,

        /// Print the result as JSON.
        #[arg(long)]
        json: bool,
    },
}

/// Parse command line arguments.
#[must_use]
pub fn parse() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(EXIT_OK, 0);
        assert_eq!(exit_code_for(&CliError::config("bad")), EXIT_CLI);
        assert_eq!(exit_code_for(&CliError::retrieval("bad")), EXIT_RETRIEVAL);
    }

    #[test]
    fn test_parse_retrieve() {
        let cli = Cli::try_parse_from([
            "oraslib",
            "retrieve",
            "mylib",
            "--version",
            "1.0",
            "--job",
            "build",
            "--target",
            "/tmp/target",
        ])
        .unwrap();
        match cli.command {
            Commands::Retrieve {
                name, version, job, ..
            } => {
                assert_eq!(name, "mylib");
                assert_eq!(version.as_deref(), Some("1.0"));
                assert_eq!(job, "build");
            }
            Commands::Inspect { .. } => panic!("expected retrieve"),
        }
        assert_eq!(cli.log_level, LogLevel::Warn);
    }

    #[test]
    fn test_credential_error_maps_to_retrieval() {
        let err: CliError = oraslib_retriever::Error::credential_not_found("registry-creds").into();
        assert_eq!(exit_code_for(&err), EXIT_RETRIEVAL);
        assert!(err.to_string().contains("No credentials found with ID: registry-creds"));
        match err {
            CliError::Retrieval { help, .. } => assert!(help.is_some()),
            CliError::Config { .. } => panic!("expected retrieval error"),
        }
    }

    #[test]
    fn test_malformed_reference_maps_to_config() {
        let err: CliError = oraslib_oci::Error::MalformedReference {
            reference: "nope".to_string(),
            message: "missing repository".to_string(),
        }
        .into();
        assert_eq!(exit_code_for(&err), EXIT_CLI);
    }
}
