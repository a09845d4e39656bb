use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use sightline_bus::MovementBus;
use sightline_common::{Position, SightlineConfig};
use sightline_protocol::{Packet, PacketEmitter, PacketEncoder};
use sightline_registry::{Mob, MobAction, MobRegistry, MobSpawn};
use sightline_spatial::{ChunkStreamer, StreamConfig, chunk_of};
use sightline_view::{ClientView, SharedViewpoint, ViewState};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sightline-cli", about = "CLI for the sightline AOI layer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and the default configuration
    Info,
    /// Run a scenario and print every packet sent to the client as JSON
    Simulate {
        /// Scenario config file (YAML, or JSON with a .json extension)
        #[arg(short, long)]
        config: PathBuf,
        /// Override the scenario tick count
        #[arg(short, long)]
        ticks: Option<u64>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Info => {
            println!("sightline-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("chunk size: {}", sightline_spatial::CHUNK_SIZE);
            println!("default config:");
            print!("{}", serde_yaml::to_string(&SightlineConfig::default())?);
        }
        Commands::Simulate { config, ticks } => simulate(&config, ticks).await?,
    }

    Ok(())
}

async fn simulate(path: &Path, ticks: Option<u64>) -> anyhow::Result<()> {
    let config = SightlineConfig::load(path)
        .with_context(|| format!("loading {}", path.display()))?;
    let scenario = &config.scenario;
    let ticks = ticks.unwrap_or(scenario.ticks);

    let registry = Arc::new(MobRegistry::new(config.view.state_capacity));
    let mut patrols: Vec<(Arc<Mob>, &[Position])> = Vec::new();
    for spawn in &scenario.spawns {
        let Some(start) = spawn.patrol.first() else {
            continue;
        };
        let mob = registry.spawn(MobSpawn {
            mob: spawn.mob.clone(),
            level: spawn.level,
            position: *start,
            health: spawn.health,
        });
        patrols.push((mob, spawn.patrol.as_slice()));
    }

    let bus = Arc::new(MovementBus::new());
    let tracking = bus.track(&registry);

    let viewer_at = |tick: u64| {
        let path = &scenario.viewer.path;
        usize::try_from(tick)
            .ok()
            .and_then(|i| path.get(i))
            .or(path.last())
            .copied()
            .unwrap_or(Position::ZERO)
    };
    let viewpoint = SharedViewpoint::new(ViewState::new(viewer_at(0), config.view.view_distance));

    let (packets_tx, mut packets_rx) = mpsc::unbounded_channel::<Packet>();
    let printer = tokio::spawn(async move {
        let mut printed = 0u64;
        while let Some(packet) = packets_rx.recv().await {
            println!("{}", serde_json::to_string(&packet)?);
            printed += 1;
        }
        anyhow::Ok(printed)
    });

    let mut streamer = ChunkStreamer::new(StreamConfig {
        view_distance: config.view.view_distance,
        load_budget: config.streaming.load_budget,
        unload_budget: config.streaming.unload_budget,
    });
    let mut view = ClientView::new(
        Arc::clone(&registry),
        Arc::clone(&bus),
        viewpoint.clone(),
        PacketEmitter::new(PacketEncoder::new(config.mobs.clone()), packets_tx),
    );

    tracing::info!(mobs = registry.len(), ticks, "simulation started");
    for tick in 0..ticks {
        {
            let _span = tracing::info_span!("tick", tick).entered();
            if tick > 0 {
                for (mob, patrol) in &patrols {
                    let step = (tick % patrol.len() as u64) as usize;
                    mob.dispatch(MobAction::Move {
                        position: patrol[step],
                    });
                }
            }

            let viewer = viewer_at(tick);
            viewpoint.set_position(viewer);
            let (loaded, unloaded) = streamer.update(chunk_of(viewer));
            for chunk in unloaded {
                view.chunk_unloaded(chunk);
            }
            for chunk in loaded {
                view.chunk_loaded(chunk);
            }
        }

        // Lets the fold tasks publish this tick's moves.
        tokio::time::sleep(Duration::from_millis(scenario.tick_ms)).await;
        let handled = view.pump();
        tracing::debug!(
            tick,
            handled,
            streamed = streamer.stats().total_loaded,
            sessions = ?view.loaded_chunks(),
            "tick done"
        );
    }

    for chunk in streamer.clear() {
        view.chunk_unloaded(chunk);
    }
    view.shutdown();
    let stats = view.sink().stats();
    drop(view);
    drop(tracking);

    let printed = printer.await??;
    tracing::info!(
        printed,
        written = stats.written,
        dropped = stats.dropped,
        "simulation finished"
    );
    Ok(())
}
