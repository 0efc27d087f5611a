//! inoreader-mcp - Inoreader tools over the Model Context Protocol
//!
#![doc = "Main entry point for the inoreader-mcp stdio server and OAuth setup commands."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use inoreader_mcp::cli::{Cli, Commands};
use inoreader_mcp::commands;
use inoreader_mcp::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // stdout carries the protocol, so logs must go to stderr
    init_tracing(cli.verbose);

    let config = Config::load(cli.config.as_deref(), &cli)?;

    match cli.command_or_default() {
        Commands::Serve => {
            config.validate()?;
            tracing::info!("Starting MCP server");
            commands::serve::run_server(config).await
        }
        Commands::Auth { command } => {
            tracing::debug!(?command, "Running auth command");
            commands::auth::handle_auth(command, config).await
        }
    }
}

/// Initialize tracing subscriber with environment filter
///
/// `RUST_LOG` wins over `--verbose`. Set `INOREADER_MCP_LOG_FORMAT=json` for
/// structured output.
fn init_tracing(verbose: bool) {
    let default_level = if verbose {
        "inoreader_mcp=debug"
    } else {
        "inoreader_mcp=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let json = std::env::var("INOREADER_MCP_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json.then(|| {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
        }))
        .with((!json).then(|| {
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(std::io::stderr)
        }))
        .init();
}
