//! CLI module for Agentic
//!
//! - `serve`: start the HTTP server (default)
//! - `doctor`: configuration and dependency diagnostics

use clap::{Parser, Subcommand};

pub mod doctor;

/// Agentic query-routing service
#[derive(Parser, Debug)]
#[command(name = "agentic")]
#[command(about = "Multilingual query-routing assistant backend")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the server (default)
    Serve,
    /// Run configuration diagnostics
    Doctor,
}

/// Run the CLI command
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Some(Commands::Doctor) => doctor::run().await,
        Some(Commands::Serve) | None => agentic::server::run().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        let cli = Cli::parse_from(["agentic"]);
        assert!(cli.command.is_none());
        let cli = Cli::parse_from(["agentic", "doctor"]);
        assert!(matches!(cli.command, Some(Commands::Doctor)));
    }
}
