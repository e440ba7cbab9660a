//! blkreplay CLI entry point

use anyhow::{Context, Result};
use blkreplay::config::cli::Cli;
use blkreplay::config::toml::load_config;
use blkreplay::config::validator::validate_config;
use blkreplay::output::text::{print_configuration, print_schedule, print_summary};
use blkreplay::replay::{prepare_schedule, run_from_config};
use blkreplay::ReplayError;

fn main() -> Result<()> {
    let cli = Cli::parse_args();
    init_logging(cli.debug);

    let result = run(&cli);
    if let Err(ref e) = result {
        if let Some(replay_error) = e.downcast_ref::<ReplayError>() {
            log::error!("Replay failed ({} error)", replay_error.category());
        }
    }
    result
}

fn run(cli: &Cli) -> Result<()> {
    println!("blkreplay v{}", env!("CARGO_PKG_VERSION"));
    println!("Block IO trace replayer");
    println!();

    let config = load_config(cli)?;
    validate_config(&config).context("Configuration validation failed")?;

    print_configuration(&config);
    println!();

    // Parse errors and oversized traces abort here, before the device is opened
    let schedule = prepare_schedule(&config)?;
    print_schedule(&schedule);

    if cli.dry_run {
        println!();
        println!("Dry run mode - configuration and trace validated successfully");
        return Ok(());
    }

    println!();
    println!("Starting replay...");
    println!();

    let summary = run_from_config(&config, schedule)?;

    print_summary(&summary);
    if config.record_latency {
        println!();
        println!("Latency metrics written to {}", config.metrics_path.display());
    }

    Ok(())
}

fn init_logging(debug: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if debug {
        builder.filter_level(log::LevelFilter::Debug);
    }
    let _ = builder.format_timestamp_millis().try_init();
}
