mod util;

use anyhow::Result;
use clap::Parser;
use life3d::{GenerationSource, PointCloud, SimulationConfig, SimulationEngine, VERSION};
use std::{sync::Arc, time::Duration};
use tracing::info;
use tracing_subscriber::EnvFilter;
use util::{format_count, local_time};

/// Runs the 3D Game of Life headless and samples the published generations
/// the way a renderer would.
#[derive(Parser, Debug)]
#[command(version, about)]
struct CLIParser {
    /// Edge length of the cubic grid
    #[arg(short, long, default_value_t = life3d::DEFAULT_EDGE)]
    size: usize,

    /// Pause between two generations, in milliseconds
    #[arg(short, long, default_value_t = 500)]
    tick_ms: u64,

    /// The number of threads computing each generation
    #[arg(short, long, default_value_t = 1)]
    workers: usize,

    /// Seed for the initial random grid, taken from the OS if omitted
    #[arg(long)]
    seed: Option<u64>,

    /// How often the reader samples the current generation, in milliseconds
    #[arg(long, default_value_t = 16)]
    sample_ms: u64,

    /// Stop after this many generations, run until Ctrl-C if omitted
    #[arg(short, long)]
    generations: Option<u64>,
}

const DEFAULT_LOG_FILTER: &str = "life3d=info";

/// Uses the `RUST_LOG` directives as given, falling back to `life3d=info`
/// when they are missing or do not parse.
fn log_filter(directives: Option<String>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Takes one snapshot per frame and reports every generation it has not seen yet.
async fn sample_frames(source: &impl GenerationSource, frame: Duration, limit: Option<u64>) {
    let mut interval = tokio::time::interval(frame);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let mut last_seen = None;
    loop {
        interval.tick().await;
        let snapshot = source.current_generation();
        if last_seen == Some(snapshot.index()) {
            continue;
        }
        last_seen = Some(snapshot.index());

        let cloud = PointCloud::from_grid(snapshot.grid());
        info!(
            "[{}] generation {}: population {}, {} points to draw",
            local_time(),
            snapshot.index(),
            format_count(snapshot.population()),
            format_count(cloud.len() as u64)
        );
        if limit.is_some_and(|n| snapshot.index() >= n) {
            break;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok()))
        .init();

    let args = CLIParser::parse();
    let config = SimulationConfig {
        edge: args.size,
        tick_interval: Duration::from_millis(args.tick_ms),
        workers: args.workers,
        seed: args.seed,
    };

    let timer = std::time::Instant::now();
    let engine = Arc::new(SimulationEngine::new(&config)?);
    info!(
        "life3d {}: seeded {}^3 grid ({} bytes) in {:.1} secs",
        VERSION,
        engine.edge_length(),
        format_count(engine.current_generation().bytes_total() as u64),
        timer.elapsed().as_secs_f64()
    );

    let stop = engine.stop_handle();
    let mut simulation = tokio::spawn(Arc::clone(&engine).run());

    let frame = Duration::from_millis(args.sample_ms.max(1));
    tokio::select! {
        _ = sample_frames(engine.as_ref(), frame, args.generations) => {}
        _ = tokio::signal::ctrl_c() => info!("Interrupted"),
        // the loop only ends on its own when a tick fails
        result = &mut simulation => return result?,
    }

    stop.stop();
    simulation.await??;
    Ok(())
}
