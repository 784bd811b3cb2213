use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use clap::{Parser, Subcommand};
use log::LevelFilter;
use palm_schema::{Difficulty, DifficultyProfile, SessionConfig, TrackMetadata};
use palmbeat_core::config::{load_config_json, load_track_json};
use palmbeat_core::{ConfigError, SessionSettings};

mod simulate;

use simulate::SimulationOptions;

#[derive(Debug, Parser)]
#[command(name = "palmbeat")]
#[command(about = "Headless runner for the gesture rhythm engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the built-in difficulty profiles as JSON.
    Profiles,
    /// Play one session against a simulated gesture detector.
    Simulate {
        /// Session config JSON; the flags below override its fields.
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(short, long)]
        difficulty: Option<String>,
        #[arg(long)]
        speed: Option<f64>,
        /// Seconds; 0 derives from the track or runs unbounded.
        #[arg(long)]
        time_limit: Option<u32>,
        /// Track metadata JSON.
        #[arg(long)]
        track: Option<PathBuf>,
        #[arg(long)]
        seed: Option<u64>,
        /// Chance (0 to 1) that the detector catches a note.
        #[arg(long, default_value_t = 0.8)]
        skill: f64,
        #[arg(long, default_value_t = 16, value_parser = clap::value_parser!(u64).range(1..))]
        frame_ms: u64,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(short, long)]
        verbose: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Profiles => {
            init_logging(false);
            let json = serde_json::to_string_pretty(&DifficultyProfile::all())
                .context("failed to serialize profiles")?;
            println!("{json}");
        }
        Command::Simulate {
            config,
            difficulty,
            speed,
            time_limit,
            track,
            seed,
            skill,
            frame_ms,
            output,
            verbose,
        } => {
            init_logging(verbose);
            anyhow::ensure!(
                (0.0..=1.0).contains(&skill),
                "skill must be between 0 and 1 (got {skill})"
            );

            let mut session_config = match &config {
                Some(path) => read_config(path)?,
                None => SessionConfig::default(),
            };
            if let Some(label) = difficulty {
                session_config.difficulty = Difficulty::parse(&label)
                    .ok_or(ConfigError::UnknownDifficulty(label))
                    .context("invalid session settings")?;
            }
            if let Some(speed) = speed {
                session_config.speed_multiplier = speed;
            }
            if let Some(limit) = time_limit {
                session_config.time_limit_seconds = limit;
            }

            let seed = seed.unwrap_or_else(rand::random);
            log::info!("simulating with seed {seed}");
            let settings = SessionSettings::from_config(&session_config)
                .context("invalid session settings")?
                .with_seed(seed);
            let track = track.as_deref().map(read_track).transpose()?;

            let results = simulate::run_simulation(SimulationOptions {
                settings,
                track,
                skill,
                frame_seconds: frame_ms as f64 / 1000.0,
                seed,
            })?;

            let json =
                serde_json::to_string_pretty(&results).context("failed to serialize results")?;
            match output {
                Some(path) => fs::write(&path, json)
                    .with_context(|| format!("failed to write: {}", path.display()))?,
                None => println!("{json}"),
            }
        }
    }

    Ok(())
}

/// Logs go to stderr so stdout stays machine-readable. `RUST_LOG` wins over
/// the default level.
fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn read_config(path: &Path) -> anyhow::Result<SessionConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    load_config_json(&text).with_context(|| format!("invalid config: {}", path.display()))
}

fn read_track(path: &Path) -> anyhow::Result<TrackMetadata> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read track: {}", path.display()))?;
    load_track_json(&text).with_context(|| format!("invalid track: {}", path.display()))
}
