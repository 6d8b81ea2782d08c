mod cli;
mod commands;
mod config;
mod error;
mod output;

use std::sync::Arc;

use clap::Parser;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use kegmon_core::{LogNavigator, Session};

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup tracing based on verbosity
    init_tracing(cli.global.verbose);

    // Dispatch and handle errors with proper exit codes
    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Shell completions generation
        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "kegmon", &mut std::io::stdout());
            Ok(())
        }

        // All other commands require a logged-in session
        cmd => {
            let mut resolved = config::resolve(&cli.global)?;
            if matches!(cmd, Command::Login(_)) {
                commands::login::prompt_missing(&mut resolved, &cli.global)?;
            } else if resolved.session.credentials.is_none() {
                return Err(CliError::NoCredentials {
                    profile: resolved.profile,
                });
            }

            let session = Session::new(resolved.session.clone(), Arc::new(LogNavigator))?;
            session.on_unauthorized(|err| {
                warn!(status = ?err.status_code(), "session rejected by server");
            });

            debug!(command = ?cmd, profile = %resolved.profile, "dispatching command");
            let result = match session.login().await {
                Ok(()) => commands::dispatch(cmd, &session, &resolved, &cli.global).await,
                Err(e) => Err(e.into()),
            };
            session.close().await;
            result
        }
    }
}
