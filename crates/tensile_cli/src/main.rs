//! tensile: headless driver for the plucked-string engine
//!
//! Commands:
//!
//! - `simulate`: pluck one string and print its peak, gain and pan per tick
//! - `render`: run scripted plucks offline and write a stereo WAV file
//! - `play`: run the scene live on the default audio device
//! - `schema`: print the scene JSON schema
//! - `scene`: print the effective scene configuration
//! - `notes`: list the note table

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::Serialize;
use tensile_audio::script::{self, Pluck};
use tensile_audio::{AudioEngine, OfflineRenderer, RenderSettings, Runtime, ToneEmitter};
use tensile_core::emitter::SilentEmitter;
use tensile_core::notes::NOTE_TABLE;
use tensile_core::{Scene, SceneConfig, Viewport};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

/// Drive tensile strings without a window
#[derive(Parser)]
#[command(name = "tensile")]
#[command(about = "Simulate, render and play plucked strings")]
#[command(version)]
struct Cli {
    /// Scene configuration JSON (default: built-in telephone-pole scene)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Comma-separated replacement notes, one per string (`S` may stand for `#`)
    #[arg(long, global = true, value_delimiter = ',')]
    notes: Vec<String>,

    /// Enable debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format
    #[arg(long, global = true, default_value = "table")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Pluck one string and print the result of every tick
    Simulate {
        /// Index of the string to pluck
        #[arg(short, long, default_value_t = 0)]
        string: usize,

        /// Where along the string to grab it, 0.0 to 1.0
        #[arg(long, default_value_t = 0.5)]
        fraction: f64,

        /// Pull distance in pixels, positive is down the screen
        #[arg(long, default_value_t = 30.0, allow_hyphen_values = true)]
        offset: f64,

        /// Number of ticks after release
        #[arg(short, long, default_value_t = 120)]
        ticks: usize,

        #[command(flatten)]
        window: WindowArgs,
    },

    /// Render scripted plucks to a WAV file
    Render {
        /// Output WAV path
        #[arg(short, long, default_value = "tensile.wav")]
        output: PathBuf,

        /// Plucks as STRING:FRACTION:OFFSET[@MS]; default strums every string
        #[arg(short, long = "pluck", allow_hyphen_values = true)]
        plucks: Vec<Pluck>,

        /// Length of the render
        #[arg(short, long, default_value_t = 4_000)]
        duration_ms: u64,

        /// Sample rate in Hz
        #[arg(long, default_value_t = 48_000)]
        sample_rate: u32,

        #[command(flatten)]
        window: WindowArgs,
    },

    /// Play scripted plucks on the default audio device
    Play {
        /// Plucks as STRING:FRACTION:OFFSET[@MS]; default strums every string
        #[arg(short, long = "pluck", allow_hyphen_values = true)]
        plucks: Vec<Pluck>,

        /// How long to keep the scene running
        #[arg(short, long, default_value_t = 6_000)]
        duration_ms: u64,

        #[command(flatten)]
        window: WindowArgs,
    },

    /// Print the JSON schema of scene configuration files
    Schema,

    /// Print the effective scene configuration as JSON
    Scene,

    /// List the note names strings may be tuned to
    Notes,
}

#[derive(clap::Args, Clone, Copy)]
struct WindowArgs {
    /// Window width the scene is laid out in
    #[arg(long, default_value_t = 1280.0)]
    width: f64,

    /// Window height the scene is laid out in
    #[arg(long, default_value_t = 960.0)]
    height: f64,
}

/// One tick of a simulated pluck
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct TickRow {
    tick: usize,
    segment: usize,
    magnitude: f64,
    gain: f32,
    pan: f32,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    // Initialize Tracy if profile feature is enabled
    #[cfg(feature = "profile")]
    let registry = registry.with(tracing_tracy::TracyLayer::default());

    registry.init();
}

fn load_config(path: Option<&Path>, notes: &[String]) -> anyhow::Result<SceneConfig> {
    let mut config = match path {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            SceneConfig::from_json(&json)
                .with_context(|| format!("invalid scene file {}", path.display()))?
        }
        None => SceneConfig::default(),
    };

    if !notes.is_empty() && config.apply_notes(notes) {
        tracing::info!(?notes, "loaded alternative notes");
    }
    config.validate()?;
    Ok(config)
}

/// Strum every string once, a quarter second apart.
fn strum(strings: usize) -> Vec<Pluck> {
    (0..strings)
        .map(|i| Pluck::new(i, 0.5, 30.0).at(250 * i as u64))
        .collect()
}

fn print_row(row: &TickRow, format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            let gain = format!("{:.3}", row.gain);
            let gain = if row.gain >= 0.5 {
                gain.red()
            } else if row.gain >= 0.1 {
                gain.yellow()
            } else {
                gain.green()
            };
            println!(
                "{:>6} {:>8} {:>10.3} {:>8} {:>8.3}",
                row.tick,
                row.segment.to_string().cyan(),
                row.magnitude,
                gain,
                row.pan
            );
        }
        OutputFormat::Json => {
            if let Ok(json) = serde_json::to_string(row) {
                println!("{}", json);
            }
        }
    }
}

fn cmd_simulate(
    config: &SceneConfig,
    index: usize,
    fraction: f64,
    offset: f64,
    ticks: usize,
    window: WindowArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let viewport = Viewport::for_scene(config, window.width, window.height);
    let scene = Scene::new(config, viewport, |_, _| Box::new(SilentEmitter::default()))?;
    let string = scene
        .strings()
        .get(index)
        .ok_or_else(|| anyhow!("no string {} (scene has {})", index, scene.strings().len()))?;
    let mut string = string.lock();

    let pointer = Pluck::new(index, fraction, offset).pointer(&string);
    let hold = string.hold(pointer);
    string.let_go();

    if format == OutputFormat::Table {
        println!(
            "String {} ({} segments): grabbed segment {} at {:.2}px{}",
            index.to_string().cyan(),
            string.num_segments(),
            hold.nearest_id,
            hold.distance,
            if hold.is_overstretched {
                " (overstretched)".yellow().to_string()
            } else {
                String::new()
            }
        );
        println!(
            "{:>6} {:>8} {:>10} {:>8} {:>8}",
            "TICK", "SEGMENT", "PEAK", "GAIN", "PAN"
        );
        println!("{}", "-".repeat(44));
    }

    for tick in 0..ticks {
        let Some(targets) = string.tick() else {
            break;
        };
        let peak = string.peak();
        let row = TickRow {
            tick,
            segment: peak.index,
            magnitude: peak.magnitude,
            gain: targets.gain,
            pan: targets.pan,
        };
        print_row(&row, format);
    }

    Ok(())
}

fn cmd_render(
    config: &SceneConfig,
    output: &Path,
    plucks: Vec<Pluck>,
    duration_ms: u64,
    sample_rate: u32,
    window: WindowArgs,
) -> anyhow::Result<()> {
    let plucks = if plucks.is_empty() {
        strum(config.strings.len())
    } else {
        plucks
    };

    let settings = RenderSettings {
        sample_rate,
        duration_ms,
        window: (window.width, window.height),
    };
    let started = Instant::now();
    let mut renderer = OfflineRenderer::new(config, settings)?;
    let rendered = renderer.render(&plucks);
    rendered.write_wav(output)?;

    println!(
        "Wrote {} ({} frames, peak {:.3}) in {:.2?}",
        output.display().to_string().green(),
        rendered.frames(),
        rendered.peak(0, rendered.frames()),
        started.elapsed()
    );
    Ok(())
}

fn cmd_play(
    config: &SceneConfig,
    plucks: Vec<Pluck>,
    duration_ms: u64,
    window: WindowArgs,
) -> anyhow::Result<()> {
    let plucks = if plucks.is_empty() {
        strum(config.strings.len())
    } else {
        plucks
    };

    let engine = AudioEngine::start(config.audio_contexts).context("failed to start audio")?;
    let pool = engine.pool();
    let viewport = Viewport::for_scene(config, window.width, window.height);
    let scene = Scene::new(config, viewport, |_, resolved| {
        Box::new(ToneEmitter::new(pool.clone(), resolved.frequency))
    })?;

    let tick_ms = config.tick_interval_ms().max(1);
    let runtime = Runtime::new(scene, Duration::from_millis(tick_ms));

    println!(
        "Playing {} plucks for {}ms at {}Hz",
        plucks.len(),
        duration_ms,
        engine.sample_rate()
    );

    let started = Instant::now();
    let mut now_ms = 0;
    while now_ms < duration_ms {
        let next_ms = now_ms + tick_ms;
        let actions = script::actions_between(&plucks, now_ms, next_ms);
        script::apply(runtime.scene(), &actions);

        let deadline = started + Duration::from_millis(next_ms);
        if let Some(wait) = deadline.checked_duration_since(Instant::now()) {
            std::thread::sleep(wait);
        }
        now_ms = next_ms;
    }

    let dropped = engine.pool().dropped_commands();
    if dropped > 0 {
        tracing::warn!(dropped, "audio commands were dropped");
    }
    Ok(())
}

fn cmd_notes(format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            println!("{:>6} {:>10}", "NOTE", "HZ");
            println!("{}", "-".repeat(17));
            for (note, hz) in NOTE_TABLE {
                println!("{:>6} {:>10.2}", note.cyan(), hz);
            }
        }
        OutputFormat::Json => {
            let table: Vec<_> = NOTE_TABLE
                .iter()
                .map(|(note, hz)| serde_json::json!({ "note": note, "hz": hz }))
                .collect();
            println!("{}", serde_json::Value::Array(table));
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Schema => {
            println!("{}", serde_json::to_string_pretty(&SceneConfig::json_schema())?);
        }
        Commands::Notes => cmd_notes(cli.format),
        Commands::Scene => {
            let config = load_config(cli.config.as_deref(), &cli.notes)?;
            println!("{}", config.to_json_pretty());
        }
        Commands::Simulate {
            string,
            fraction,
            offset,
            ticks,
            window,
        } => {
            let config = load_config(cli.config.as_deref(), &cli.notes)?;
            cmd_simulate(&config, string, fraction, offset, ticks, window, cli.format)?;
        }
        Commands::Render {
            output,
            plucks,
            duration_ms,
            sample_rate,
            window,
        } => {
            let config = load_config(cli.config.as_deref(), &cli.notes)?;
            cmd_render(&config, &output, plucks, duration_ms, sample_rate, window)?;
        }
        Commands::Play {
            plucks,
            duration_ms,
            window,
        } => {
            let config = load_config(cli.config.as_deref(), &cli.notes)?;
            cmd_play(&config, plucks, duration_ms, window)?;
        }
    }

    Ok(())
}
