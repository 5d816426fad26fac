//! Stitch command - fetch and composite the tiles covering a region.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use tilestitch::config::ConfigFile;
use tilestitch::logging::LoggingOptions;
use tilestitch::output::{world_file_path, OutputFormat};
use tilestitch::provider::FetchConfig;
use tilestitch::stitch::{StitchOptions, StitchResult, Stitcher};
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::common::{parse_header, FormatArg, RegionArgs};
use crate::error::CliError;
use crate::progress::StitchProgress;
use crate::runner::CliRunner;

/// Arguments for the stitch command.
#[derive(Debug, Clone, Args)]
pub struct StitchArgs {
    #[command(flatten)]
    pub region: RegionArgs,

    /// Zoom level (0-20)
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(0..=20))]
    pub zoom: u8,

    /// Tile URL template with {z}, {x}, {y} and optional {s}; repeat for fallbacks
    #[arg(short, long = "url", required = true)]
    pub urls: Vec<String>,

    /// Extra request header as NAME:VALUE; may be repeated
    #[arg(long = "header")]
    pub headers: Vec<String>,

    /// Tile size in pixels [default: from config, 256]
    #[arg(short, long)]
    pub tile_size: Option<u32>,

    /// Output format [default: from config, png]
    #[arg(short, long, value_enum)]
    pub format: Option<FormatArg>,

    /// Write a .pnw world file next to the image
    #[arg(short, long)]
    pub worldfile: bool,

    /// Output file (default: standard output)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// User-Agent for tile requests [default: from config]
    #[arg(long)]
    pub user_agent: Option<String>,

    /// Per-tile request timeout in seconds [default: from config, 30]
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Abort the whole stitch after this many seconds (0 = no limit)
    #[arg(long)]
    pub deadline: Option<u64>,
}

/// Run the stitch command.
pub fn run(
    args: StitchArgs,
    logging: &LoggingOptions,
    config_path: Option<&Path>,
) -> Result<(), CliError> {
    let runner = CliRunner::new(logging, config_path)?;
    runner.log_startup("stitch");
    let config = runner.config();

    let region = args.region.resolve()?;
    let options = build_options(&args, config)?;
    let fetch = build_fetch_config(&args, config);

    if args.output.is_none() {
        if options.generate_world_file {
            return Err(CliError::InvalidArgs(
                "--worldfile needs --output: a world file cannot be written to standard output"
                    .to_string(),
            ));
        }
        if atty::is(atty::Stream::Stdout) {
            return Err(CliError::InvalidArgs(
                "refusing to write image data to a terminal; use --output or redirect stdout"
                    .to_string(),
            ));
        }
    }

    let cancel = CancellationToken::new();
    let token = cancel.clone();
    ctrlc::set_handler(move || {
        eprintln!();
        eprintln!("Received interrupt, cancelling stitch...");
        token.cancel();
    })
    .map_err(|e| CliError::Config(format!("Failed to set signal handler: {}", e)))?;

    let progress = Arc::new(StitchProgress::new(atty::is(atty::Stream::Stderr)));
    let stitcher = Stitcher::with_fetch_config(&fetch)?.with_observer(progress.clone());

    let result = runner.block_on(stitcher.stitch(&region, &options, &cancel));
    progress.finish();
    let result = result?;

    report_result(&result);
    write_output(&runner, &args.output, &result)
}

/// Combines flags with config values; flags win.
pub fn build_options(args: &StitchArgs, config: &ConfigFile) -> Result<StitchOptions, CliError> {
    let extra_headers = args
        .headers
        .iter()
        .map(|h| parse_header(h))
        .collect::<Result<Vec<_>, _>>()?;

    let deadline = match args.deadline {
        Some(secs) => (secs > 0).then(|| Duration::from_secs(secs)),
        None => config.deadline(),
    };

    Ok(StitchOptions {
        zoom: args.zoom,
        tile_size: args.tile_size.unwrap_or(config.output.tile_size),
        url_templates: args.urls.clone(),
        extra_headers,
        output_format: args
            .format
            .map(OutputFormat::from)
            .unwrap_or(config.output.format),
        generate_world_file: args.worldfile || config.output.worldfile,
        deadline,
        limits: config.stitch_limits(),
    })
}

/// HTTP client settings from flags and config.
pub fn build_fetch_config(args: &StitchArgs, config: &ConfigFile) -> FetchConfig {
    let mut fetch = config.fetch_config();
    if let Some(secs) = args.timeout {
        fetch.timeout = Duration::from_secs(secs.max(1));
    }
    if let Some(agent) = &args.user_agent {
        fetch.user_agent = agent.clone();
    }
    fetch
}

fn report_result(result: &StitchResult) {
    for notice in &result.notices {
        eprintln!("Warning: {}", notice);
    }

    let ledger = &result.ledger;
    if result.is_partial() {
        eprintln!(
            "Warning: {} of {} tiles failed; their area is left transparent",
            ledger.failed_count(),
            ledger.total_tiles()
        );
        for tile in ledger.failed_tiles() {
            eprintln!("  {}/{}: {}", tile.x, tile.y, tile.failure);
        }
    }

    info!(
        width = result.width,
        height = result.height,
        tiles = ledger.total_tiles(),
        failed = ledger.failed_count(),
        "Stitched image ready"
    );
}

fn write_output(
    runner: &CliRunner,
    output: &Option<PathBuf>,
    result: &StitchResult,
) -> Result<(), CliError> {
    let Some(path) = output else {
        let mut stdout = std::io::stdout().lock();
        return stdout
            .write_all(&result.image_bytes)
            .and_then(|_| stdout.flush())
            .map_err(|e| CliError::FileWrite {
                path: "<stdout>".to_string(),
                error: e,
            });
    };

    runner.write_file(path, &result.image_bytes)?;
    eprintln!(
        "Wrote {} ({}x{} px)",
        path.display(),
        result.width,
        result.height
    );

    if let Some(bytes) = &result.world_file_bytes {
        let world_path = world_file_path(path);
        runner.write_file(&world_path, bytes)?;
        eprintln!("Wrote {}", world_path.display());
    }

    Ok(())
}
