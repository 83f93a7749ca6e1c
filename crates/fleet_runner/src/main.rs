//! Command-line fleet runner.
//!
//! Builds a world from a TOML config plus CLI overrides, runs the tick loop
//! at the configured cadence and prints every broadcast event as one JSON
//! line on stdout.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use anyhow::Context;
use bevy_ecs::world::World;
use clap::Parser;
use log::info;

use fleet_core::broadcast::ChannelBroadcaster;
use fleet_core::runner::{run_tick, tick_schedule};
use fleet_core::scenario::{build_fleet, FleetParams};

#[derive(Debug, Parser)]
#[command(name = "fleet_runner", about = "Run the simulated vehicle fleet")]
struct Cli {
    /// TOML file with fleet parameters.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the base random seed.
    #[arg(long)]
    seed: Option<u64>,

    /// Stop after this many ticks; run forever when omitted.
    #[arg(long)]
    ticks: Option<u64>,

    /// Override the fleet size.
    #[arg(long)]
    fleet_size: Option<usize>,

    /// Override the tick period in milliseconds.
    #[arg(long)]
    tick_period_ms: Option<u64>,

    /// Run ticks back to back instead of pacing them to wall-clock time.
    #[arg(long)]
    fast: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut params = match &cli.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            toml::from_str::<FleetParams>(&raw)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => FleetParams::default(),
    };
    if let Some(seed) = cli.seed {
        params.seed = seed;
    }
    if let Some(fleet_size) = cli.fleet_size {
        params.fleet_size = fleet_size;
    }
    if let Some(tick_period_ms) = cli.tick_period_ms {
        params.tick_period_ms = tick_period_ms;
    }
    if params.epoch_ms == 0 {
        params.epoch_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .context("system clock before unix epoch")?
            .as_millis() as u64;
    }

    info!(
        "starting fleet: {} vehicles, seed {}, tick {}ms",
        params.fleet_size, params.seed, params.tick_period_ms
    );

    let broadcaster = Arc::new(ChannelBroadcaster::default());
    let events = broadcaster.subscribe();

    let mut world = World::new();
    build_fleet(&mut world, &params, broadcaster);
    let mut schedule = tick_schedule();

    let period = Duration::from_millis(params.tick_period_ms);
    let mut tick = 0u64;
    loop {
        let started = Instant::now();
        run_tick(&mut world, &mut schedule);
        for event in events.try_iter() {
            println!("{}", serde_json::to_string(&event)?);
        }

        tick += 1;
        if let Some(limit) = cli.ticks {
            if tick >= limit {
                info!("completed {tick} ticks");
                return Ok(());
            }
        }
        if !cli.fast {
            if let Some(remaining) = period.checked_sub(started.elapsed()) {
                std::thread::sleep(remaining);
            }
        }
    }
}
