//! CLI module for vidchat.

pub mod commands;
mod output;
pub mod preflight;
pub mod services;

pub use output::Output;
pub use services::ChatServices;

use clap::{Parser, Subcommand};

/// vidchat - chat with a collection of YouTube videos
///
/// Indexes the transcripts of the videos listed in the source file and answers
/// questions about them, in the terminal or in the browser.
#[derive(Parser, Debug)]
#[command(name = "vidchat")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start an interactive chat in the terminal
    Chat,

    /// Serve the web chat
    Serve {
        /// Host to bind to (overrides server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (overrides server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Build the index once and report what was indexed
    Index,

    /// Check system requirements and configuration
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serve_overrides() {
        let cli = Cli::try_parse_from(["vidchat", "-vv", "serve", "--port", "9000"]).unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Serve { host, port } => {
                assert_eq!(host, None);
                assert_eq!(port, Some(9000));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_global_config() {
        let cli = Cli::try_parse_from(["vidchat", "chat", "--config", "/tmp/v.toml"]).unwrap();
        assert_eq!(cli.config.as_deref(), Some("/tmp/v.toml"));
        assert!(matches!(cli.command, Commands::Chat));
    }
}
