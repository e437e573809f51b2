use airpi::config::ConfigPaths;
use airpi::core::{console, delay_to_next_minute, HttpProbe, Interrupt, Station};
use airpi_core::{PluginCatalog, PluginRole};
use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::path::PathBuf;
use std::process::ExitCode;

/// AirPi - Raspberry Pi environmental sensor station
#[derive(Parser, Debug, Clone)]
#[command(name = "airpi")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory holding sensors.json, outputs.json, notifications.json and settings.json
    #[arg(short = 'c', long = "config-dir", value_name = "DIR")]
    config_dir: Option<PathBuf>,

    /// Debug verbosity level (0=quiet, 1=info, 2=debug, 3=trace)
    #[arg(short = 'd', long = "debug", value_name = "LEVEL", default_value = "0")]
    debug: u8,

    /// Start sampling immediately instead of on the next full minute
    #[arg(long = "start-now")]
    start_now: bool,

    /// List the built-in plugins and their parameters
    #[arg(short = 'l', long = "list-plugins")]
    list_plugins: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Level 0 (default): warn only
    // Level 1: info
    // Level 2: debug
    // Level 3+: trace
    let log_level = match cli.debug {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    // Allow RUST_LOG to override CLI setting
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    info!("Starting AirPi v{}", env!("CARGO_PKG_VERSION"));

    let catalog = airpi::build_catalog();

    if cli.list_plugins {
        list_plugins(&catalog);
        return ExitCode::SUCCESS;
    }

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            console::error(&format!("Failed to start the runtime: {}", e));
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(&cli, &catalog)) {
        // sampling only ends early on request, which still counts as abnormal
        Ok(()) => ExitCode::from(1),
        Err(e) => {
            console::error(&format!("{:#}", e));
            ExitCode::from(1)
        }
    }
}

async fn run(cli: &Cli, catalog: &PluginCatalog) -> Result<()> {
    let paths = match &cli.config_dir {
        Some(dir) => ConfigPaths::new(dir),
        None => ConfigPaths::default_dir()?,
    };
    info!("Reading configuration from {}", paths.dir().display());

    let gate = HttpProbe::default();
    let station = Station::assemble(&paths, catalog, &gate)?;
    station.announce();

    let align = station.settings.align_start && !cli.start_now;
    let mut scheduler = station.into_scheduler()?;
    let interrupt = Interrupt::ctrl_c().await;

    if align {
        let delay = delay_to_next_minute(chrono::Local::now());
        console::info(&format!("Sampling will start in {} seconds...", delay.as_secs()));
        console::info("Press Ctrl + C to stop sampling.");
        tokio::select! {
            _ = interrupt.wait() => {
                scheduler.shutdown();
                console::info("Stopping sampling as requested...");
                return Ok(());
            }
            _ = tokio::time::sleep(delay) => {}
        }
    } else {
        console::info("Press Ctrl + C to stop sampling.");
    }

    scheduler.run(interrupt.wait()).await.context("Sampling stopped")
}

fn list_plugins(catalog: &PluginCatalog) {
    for role in PluginRole::ALL {
        println!("{} plugins:", role);
        for descriptor in catalog.list(role) {
            println!("  {:<12} {}", descriptor.id, descriptor.description);
            if !descriptor.required.is_empty() {
                println!("  {:<12}   required: {}", "", descriptor.required.join(", "));
            }
            if !descriptor.optional.is_empty() {
                println!("  {:<12}   optional: {}", "", descriptor.optional.join(", "));
            }
            if descriptor.needs_internet {
                println!("  {:<12}   needs internet", "");
            }
        }
        println!();
    }
}
