//! Raster Tiler - cut a large image into a zoomable tile pyramid.
//!
//! This binary parses the command line, installs logging and drives
//! [`Tiler`](raster_tiler::Tiler).

use clap::Parser;
use serde::Serialize;
use std::process::ExitCode;
use std::time::Instant;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use raster_tiler::{
    config::{Cli, Command, PlanArgs, TileArgs},
    Tiler,
};

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.into_command() {
        Command::Tile(args) => run_tile(args),
        Command::Plan(args) => run_plan(args),
    }
}

// =============================================================================
// Tile Command
// =============================================================================

fn run_tile(args: TileArgs) -> ExitCode {
    init_logging(args.verbose);

    let config = match args.to_tiling_config() {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    info!("Configuration:");
    info!(
        "  Zoom: {}..={} (normalize {})",
        config.zoom_min(),
        config.zoom_max(),
        config.zoom_normalize()
    );
    info!(
        "  Tiles: {}px {} .{}",
        config.tile_size(),
        config.tile_format(),
        config.tile_extension()
    );
    info!("  Template: {}", config.store_path_template());

    let tiler = Tiler::new(config).with_optimizer(args.optimizer());

    let started = Instant::now();
    let report = match tiler.process(&args.source, &args.out) {
        Ok(report) => report,
        Err(e) => {
            error!("Tiling failed while {}: {}", e.phase(), e);
            return ExitCode::FAILURE;
        }
    };

    info!(
        "Finished in {:.1}s: {} level(s) built, {} tile(s) written, {} skipped",
        started.elapsed().as_secs_f64(),
        report.levels_built,
        report.tiles_written,
        report.tiles_skipped
    );

    if args.json && !print_json(&report) {
        return ExitCode::FAILURE;
    }

    if report.cancelled {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

// =============================================================================
// Plan Command
// =============================================================================

fn run_plan(args: PlanArgs) -> ExitCode {
    init_logging(args.verbose);

    let config = match args.to_tiling_config() {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let plan = match Tiler::new(config).plan(&args.source) {
        Ok(plan) => plan,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    if args.json {
        return if print_json(&plan) {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        };
    }

    println!(
        "Source: {}x{} (normalized at zoom {})",
        plan.source_width, plan.source_height, plan.zoom_normalize
    );
    println!();
    println!(
        "{:>5} {:>12} {:>12} {:>8} {:>8} {:>12}",
        "zoom", "width", "height", "columns", "rows", "tiles"
    );
    for level in &plan.levels {
        println!(
            "{:>5} {:>12} {:>12} {:>8} {:>8} {:>12}",
            level.zoom,
            level.width,
            level.height,
            level.columns,
            level.rows,
            level.tile_count()
        );
    }
    println!();
    println!("Total: {} tile(s)", plan.total_tiles());

    ExitCode::SUCCESS
}

// =============================================================================
// Helpers
// =============================================================================

/// Pretty-print `value` as JSON on stdout.
fn print_json<T: Serialize>(value: &T) -> bool {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{}", json);
            true
        }
        Err(e) => {
            error!("Failed to serialize output: {}", e);
            false
        }
    }
}

/// Initialize the tracing/logging subsystem.
///
/// Logs go to stderr so `--json` output on stdout stays machine readable.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "raster_tiler=debug"
    } else {
        "raster_tiler=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
