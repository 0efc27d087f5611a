//! Command-line interface definition for inoreader-mcp
//!
//! This module defines the CLI structure using clap's derive API,
//! providing the stdio server and the OAuth setup commands.

use clap::{Parser, Subcommand};

/// inoreader-mcp - Inoreader tools over the Model Context Protocol
///
/// Runs a line-delimited JSON-RPC server on stdin/stdout and manages the
/// OAuth2 tokens it uses to talk to Inoreader.
#[derive(Parser, Debug, Clone)]
#[command(name = "inoreader-mcp")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to an optional YAML configuration file
    #[arg(short, long, env = "INOREADER_MCP_CONFIG")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Override the token file location
    #[arg(long)]
    pub token_path: Option<String>,

    /// Command to execute (defaults to `serve`)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands for inoreader-mcp
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run the MCP server on stdin/stdout
    Serve,

    /// Manage Inoreader OAuth2 authorization
    Auth {
        /// Authorization subcommand
        #[command(subcommand)]
        command: AuthCommand,
    },
}

/// OAuth2 setup subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum AuthCommand {
    /// Print the authorization URL and remember the CSRF state
    Login {
        /// Redirect URI registered for the Inoreader application
        #[arg(long)]
        redirect_uri: Option<String>,
    },

    /// Finish authorization using the URL the browser was redirected to
    Complete {
        /// Full redirect URL copied from the browser address bar
        redirect_url: String,

        /// Redirect URI used when the authorization URL was generated
        #[arg(long)]
        redirect_uri: Option<String>,
    },

    /// Show whether tokens are stored and when they expire
    Status,

    /// Delete stored tokens
    Logout,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// The command to run, `serve` when none was given
    pub fn command_or_default(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Serve)
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: None,
            verbose: false,
            token_path: None,
            command: None,
        }
    }
}
