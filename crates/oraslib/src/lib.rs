//! oraslib command-line interface.
//!
//! The binary is a thin shell over [`oraslib_retriever`]: it reads
//! `oraslib.toml`, selects a credential store, sets up tracing and maps
//! failures to exit codes.

/// Argument parsing, CLI errors and exit codes.
pub mod cli;
/// `retrieve` and `inspect` subcommands.
pub mod commands;
/// `oraslib.toml` loading and validation.
pub mod config;
/// Tracing subscriber setup.
pub mod tracing;

pub use cli::{CliError, EXIT_CLI, EXIT_OK, EXIT_RETRIEVAL};
pub use config::Config;
