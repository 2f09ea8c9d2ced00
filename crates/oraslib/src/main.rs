//! oraslib CLI application

// CLI binary needs to output to stdout/stderr - this is intentional
#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::sync::Arc;

use oraslib::cli::{self, Cli, CliError, Commands, EXIT_OK, exit_code_for, render_error};
use oraslib::commands::{self, RetrieveRequest, StdoutLog};
use oraslib::config::Config;
use oraslib::tracing::{TracingConfig, init_tracing};

fn main() {
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panicked: {panic_info}");
        eprintln!("Internal error occurred. Run with RUST_LOG=debug for more information.");
    }));

    let cli = cli::parse();

    if let Err(e) = init_tracing(TracingConfig {
        format: cli.log_format,
        level: cli.log_level.into(),
        filter: None,
    }) {
        eprintln!("{e:?}");
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Fatal error: Failed to create tokio runtime: {e}");
            std::process::exit(1);
        }
    };

    let exit_code = match runtime.block_on(run(cli)) {
        Ok(()) => EXIT_OK,
        Err(err) => {
            render_error(&err);
            exit_code_for(&err)
        }
    };
    std::process::exit(exit_code);
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = match (&cli.command, Config::locate(cli.config.as_deref())) {
        (_, Ok(path)) => Config::load(&path)?,
        // inspect works without configuration: env credentials, no libraries
        (Commands::Inspect { .. }, Err(_)) => Config::default(),
        (_, Err(e)) => return Err(e),
    };

    match cli.command {
        Commands::Retrieve {
            name,
            version,
            job,
            target,
            workspace_root,
            workspace_suffix,
        } => {
            let request = RetrieveRequest {
                name: &name,
                version: version.as_deref(),
                job: &job,
                target: &target,
                workspace_root: workspace_root.as_deref(),
                workspace_suffix: workspace_suffix.as_deref(),
            };
            commands::retrieve(&config, request, Arc::new(StdoutLog)).await?;
        }
        Commands::Inspect {
            reference,
            credentials_id,
            job,
            json,
        } => {
            let report =
                commands::inspect(&config, &reference, credentials_id.as_deref(), &job).await?;
            if json {
                let text = serde_json::to_string_pretty(&report)
                    .map_err(|e| CliError::retrieval(format!("Cannot encode report: {e}")))?;
                println!("{text}");
            } else {
                println!("{report}");
            }
        }
    }
    Ok(())
}
