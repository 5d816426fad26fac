//! Serve command - run the HTTP API.

use std::path::Path;
use std::time::Duration;

use clap::Args;
use tilestitch::config::ConfigFile;
use tilestitch::logging::LoggingOptions;
use tilestitch::server::{serve, ServerConfig};
use tokio_util::sync::CancellationToken;

use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the serve command.
#[derive(Debug, Clone, Args)]
pub struct ServeArgs {
    /// Address to bind [default: from config, localhost]
    #[arg(short, long)]
    pub bind: Option<String>,

    /// Port to listen on [default: from config, 8080]
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Per-request stitch timeout in seconds [default: from config, 30]
    #[arg(long)]
    pub timeout: Option<u64>,
}

/// Run the serve command.
pub fn run(
    args: ServeArgs,
    logging: &LoggingOptions,
    config_path: Option<&Path>,
) -> Result<(), CliError> {
    let runner = CliRunner::new(logging, config_path)?;
    runner.log_startup("serve");
    let config = runner.config();

    let server_config = build_server_config(&args, config);
    let fetch = config.fetch_config();

    eprintln!("Tile Stitch API Server v{}", tilestitch::VERSION);
    eprintln!("==========================");
    eprintln!();
    eprintln!("Listening: http://{}", server_config.address());
    eprintln!("Timeout:   {}s per request", server_config.request_timeout.as_secs());
    eprintln!();
    eprintln!("Endpoints:");
    eprintln!("  POST /api/v1/stitch");
    eprintln!("  GET  /api/v1/health");
    eprintln!();
    eprintln!("Press Ctrl+C to stop");
    eprintln!();

    runner.block_on(serve(server_config, &fetch, CancellationToken::new()))?;

    eprintln!("Server stopped.");
    Ok(())
}

/// Combines flags with the `[server]` config section.
pub fn build_server_config(args: &ServeArgs, config: &ConfigFile) -> ServerConfig {
    ServerConfig {
        bind: args.bind.clone().unwrap_or_else(|| config.server.bind.clone()),
        port: args.port.unwrap_or(config.server.port),
        request_timeout: Duration::from_secs(
            args.timeout.unwrap_or(config.server.request_timeout).max(1),
        ),
        tile_size: config.output.tile_size,
        limits: config.stitch_limits(),
    }
}
