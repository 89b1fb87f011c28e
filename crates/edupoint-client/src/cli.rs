//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// edupoint - Google sign-in for your EduPoint calendar
#[derive(Debug, Parser)]
#[command(name = "edupoint")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "EDUPOINT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v')]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in with Google and establish a backend session
    Signin {
        /// OAuth client ID (overrides config.toml)
        #[arg(long, env = "GOOGLE_CLIENT_ID")]
        client_id: Option<String>,

        /// OAuth client secret (overrides config.toml)
        #[arg(long, env = "GOOGLE_CLIENT_SECRET")]
        client_secret: Option<String>,

        /// Path to a Google Cloud Console credentials JSON file
        #[arg(long)]
        credentials_file: Option<PathBuf>,

        /// Sign in again even when a session already exists
        #[arg(long)]
        force: bool,
    },

    /// Sign out of the provider, the backend, and this machine
    Signout,

    /// Show the current session
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Dump the effective configuration
    Dump,
    /// Validate the configuration
    Validate,
    /// Show the configuration file path
    Path,
}
