//! cell-bench: tick throughput harness for profiling
//!
//! Runs the engine without any audio device so native profilers (samply,
//! Instruments, perf) or Tracy see only the DSP path.
//!
//! Usage:
//!   cell-bench --frames 1000000
//!   cell-bench --config patch.json --patch chs_a_out_x:vco_a_in_fm
//!   samply record ./target/profiling/cell-bench

use std::hint::black_box;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use cell_core::{Cable, Engine, EngineConfig};
use clap::Parser;

#[cfg(feature = "profile")]
use tracing_subscriber::layer::SubscriberExt;

const DEFAULT_FRAMES: u64 = 48000 * 10; // 10 seconds at 48kHz

/// Benchmark harness for the cell synthesizer engine
#[derive(Parser)]
#[command(name = "cell-bench")]
#[command(about = "Measure per-tick cost of the cell synthesizer engine")]
#[command(version)]
struct Cli {
    /// Engine config JSON
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of ticks to measure
    #[arg(short, long, default_value_t = DEFAULT_FRAMES)]
    frames: u64,

    /// Warmup ticks before measurement
    #[arg(short, long, default_value_t = 48000)]
    warmup: u64,

    /// Patch a cable, as `source:sink` (repeatable)
    #[arg(long = "patch", value_name = "SOURCE:SINK")]
    patches: Vec<String>,
}

fn main() -> Result<()> {
    // Initialize Tracy if profile feature is enabled
    #[cfg(feature = "profile")]
    {
        use tracing_subscriber::prelude::*;
        let tracy_layer = tracing_tracy::TracyLayer::default();
        tracing_subscriber::registry().with(tracy_layer).init();
    }
    #[cfg(not(feature = "profile"))]
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => EngineConfig::from_path(path)?,
        None => EngineConfig::default(),
    };
    let (mut engine, _surface) = Engine::new(config).context("failed to build engine")?;
    for arg in &cli.patches {
        let cable = Cable::parse(arg)?;
        engine.connect(cable.source, cable.sink)?;
    }
    let sample_rate = engine.sample_rate();

    println!(
        "Running benchmark: {} ticks ({:.2}s at {}Hz), {} cables",
        cli.frames,
        cli.frames as f64 / sample_rate as f64,
        sample_rate,
        engine.cables().len()
    );
    println!("  Warmup: {} ticks", cli.warmup);

    print!("Warming up...");
    for _ in 0..cli.warmup {
        black_box(engine.tick());
    }
    println!(" done");

    print!("Benchmarking...");
    let start = Instant::now();
    for _ in 0..cli.frames {
        black_box(engine.tick());
    }
    let elapsed = start.elapsed();
    println!(" done\n");

    let ns_per_tick = elapsed.as_nanos() as f64 / cli.frames.max(1) as f64;
    let budget_ns = 1_000_000_000.0 / sample_rate as f64;
    let realtime_factor = budget_ns / ns_per_tick;

    println!("Results:");
    println!("  Total time:       {:?}", elapsed);
    println!("  Ticks:            {}", cli.frames);
    println!("  ns/tick:          {:.2}", ns_per_tick);
    println!("  Real-time budget: {:.2} ns/tick @ {}Hz", budget_ns, sample_rate);
    println!("  Real-time factor: {:.1}x", realtime_factor);

    if realtime_factor < 1.0 {
        println!("\n  WARNING: slower than real time");
    }
    Ok(())
}
