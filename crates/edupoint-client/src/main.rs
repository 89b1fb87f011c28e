//! edupoint CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use tracing::Level;

use edupoint_client::cli::{Cli, Command, ConfigAction};
use edupoint_client::config::ClientConfig;
use edupoint_client::error::{ClientError, ClientResult};
use edupoint_core::tracing::{TracingConfig, TracingOutputFormat, init_tracing};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing
    let tracing_config = if cli.debug {
        TracingConfig::cli_debug()
    } else {
        TracingConfig::default()
            .with_level(Level::WARN)
            .with_format(TracingOutputFormat::Compact)
    };
    if let Err(e) = init_tracing(tracing_config) {
        eprintln!("error: {}", e);
        return ExitCode::FAILURE;
    }

    // Run the command
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> ClientResult<()> {
    // Load configuration
    let config = if let Some(ref path) = cli.config {
        ClientConfig::load_from(path).map_err(ClientError::Config)?
    } else {
        ClientConfig::load().unwrap_or_default()
    };

    // Handle subcommands
    match cli.command {
        Some(Command::Signin {
            client_id,
            client_secret,
            credentials_file,
            force,
        }) => {
            edupoint_client::commands::auth::signin(
                client_id,
                client_secret,
                credentials_file,
                force,
                &config,
            )
            .await
        }
        Some(Command::Signout) => edupoint_client::commands::auth::signout(&config).await,
        Some(Command::Status { json }) => {
            edupoint_client::commands::status::status(json, &config).await
        }
        Some(Command::Config { action }) => match action {
            ConfigAction::Dump => edupoint_client::commands::config::dump(&config),
            ConfigAction::Validate => edupoint_client::commands::config::validate(&config),
            ConfigAction::Path => edupoint_client::commands::config::path(),
        },
        None => {
            println!("edupoint - Google sign-in for your EduPoint calendar");
            println!();
            println!("Run 'edupoint --help' for usage information.");
            println!();
            println!("Quick start:");
            println!("  1. Sign in: edupoint signin --credentials-file <path-to-google-json>");
            println!("  2. Check your session: edupoint status");
            Ok(())
        }
    }
}
