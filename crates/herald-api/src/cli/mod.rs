//! CLI command definitions for the `herald` binary.
//!
//! Uses clap derive macros for argument parsing.

pub mod commands;
pub mod notify;
pub mod status;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Category-driven notification workflows for Discord.
#[derive(Parser)]
#[command(name = "herald", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to herald.toml (defaults to ~/.herald/herald.toml).
    #[arg(long, global = true, env = "HERALD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Export spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the interaction endpoint.
    Serve {
        /// Port to listen on.
        #[arg(long, default_value = "3000")]
        port: u16,

        /// Host address to bind to.
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },

    /// Walk through sending a notification from the terminal.
    Notify {
        /// Display name to send as (defaults to $USER).
        #[arg(long = "as")]
        as_name: Option<String>,
    },

    /// Show configuration and check that configured channels resolve.
    Status,

    /// Manage the `/notify` slash command.
    Commands {
        #[command(subcommand)]
        action: CommandsAction,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum CommandsAction {
    /// Register (overwrite) the application's global commands.
    Register,

    /// List the application's registered global commands.
    #[command(alias = "ls")]
    List,
}
