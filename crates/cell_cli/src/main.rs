//! cell-render: offline renderer for the cell synthesizer engine
//!
//! Builds an engine from an optional JSON config, applies control overrides,
//! cables and chaos variant switches from the command line, then writes the
//! stereo output to a 32-bit float WAV file.
//!
//! Usage:
//!   cell-render out.wav --seconds 10 --patch chs_a_out_x:mix_in_l
//!   cell-render out.wav --config patch.json --set chs_a_tune=0.3 --chaos-variant a=tsucs

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use cell_core::{Cable, ChaosUnit, Engine, EngineConfig, Indexed, Variant};
use clap::Parser;
use tracing_subscriber::EnvFilter;

const BLOCK_FRAMES: usize = 512;

/// Render the synthesizer engine to a WAV file
#[derive(Parser)]
#[command(name = "cell-render")]
#[command(about = "Render the cell synthesizer engine offline to a WAV file")]
#[command(version)]
struct Cli {
    /// Output WAV path
    output: PathBuf,

    /// Engine config JSON (sample rate, initial controls, cables)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seconds of audio to render
    #[arg(short, long, default_value_t = 5.0)]
    seconds: f32,

    /// Set a pot or param, as `name=value` (repeatable)
    #[arg(long = "set", value_name = "NAME=VALUE")]
    sets: Vec<String>,

    /// Patch a cable, as `source:sink` (repeatable)
    #[arg(long = "patch", value_name = "SOURCE:SINK")]
    patches: Vec<String>,

    /// Switch a chaos map's equations, as `unit=variant`, e.g. `a=halvorsen`
    #[arg(long = "chaos-variant", value_name = "UNIT=VARIANT")]
    chaos_variants: Vec<String>,
}

fn parse_assignment(arg: &str) -> Result<(&str, &str)> {
    arg.split_once('=')
        .map(|(k, v)| (k.trim(), v.trim()))
        .ok_or_else(|| anyhow!("expected `name=value`, got `{arg}`"))
}

fn parse_chaos_variant(arg: &str) -> Result<(ChaosUnit, Variant)> {
    let (unit, variant) = parse_assignment(arg)?;
    let unit = ChaosUnit::from_name(&unit.to_lowercase())
        .ok_or_else(|| anyhow!("unknown chaos unit `{unit}` (expected `a` or `b`)"))?;
    let variant = Variant::from_name(variant).ok_or_else(|| {
        let names: Vec<&str> = Variant::ALL.iter().map(|v| v.name()).collect();
        anyhow!("unknown chaos variant `{variant}` (one of {})", names.join(", "))
    })?;
    Ok((unit, variant))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => EngineConfig::from_path(path)?,
        None => EngineConfig::default(),
    };
    if !(cli.seconds.is_finite() && cli.seconds > 0.0) {
        return Err(anyhow!("--seconds must be positive, got {}", cli.seconds));
    }

    let (mut engine, surface) = Engine::new(config).context("failed to build engine")?;
    let sample_rate = engine.sample_rate();

    for arg in &cli.sets {
        let (name, value) = parse_assignment(arg)?;
        let value: f32 = value
            .parse()
            .with_context(|| format!("invalid value in `--set {arg}`"))?;
        surface.set_by_name(name, value)?;
    }
    for arg in &cli.patches {
        let cable = Cable::parse(arg)?;
        engine.connect(cable.source, cable.sink)?;
    }
    for arg in &cli.chaos_variants {
        let (unit, variant) = parse_chaos_variant(arg)?;
        surface.switch_chaos_variant(unit, variant);
        tracing::info!(unit = unit.name(), variant = variant.name(), "chaos variant");
    }

    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: sample_rate.round() as u32,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(&cli.output, spec)
        .with_context(|| format!("failed to create {}", cli.output.display()))?;

    let total = (cli.seconds * sample_rate).round() as usize;
    let cables = serde_json::to_string(&engine.cables())?;
    tracing::info!(frames = total, sample_rate, %cables, "rendering");

    let mut block = vec![0.0f32; BLOCK_FRAMES * 2];
    let mut peak = 0.0f32;
    let mut remaining = total;
    while remaining > 0 {
        let frames = remaining.min(BLOCK_FRAMES);
        let buf = &mut block[..frames * 2];
        engine.render(buf);
        for &sample in buf.iter() {
            peak = peak.max(sample.abs());
            writer.write_sample(sample)?;
        }
        remaining -= frames;
    }
    writer.finalize()?;

    tracing::info!(path = %cli.output.display(), peak, "done");
    Ok(())
}
