#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that generates, surveys and replays Veiled Hollow levels.

mod ascii;
mod chase;
mod survey;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use log::LevelFilter;
use veiled_hollow_system_bootstrap::{DungeonGenerator, GenerationConfig};

/// Procedural dungeon generator with an enemy pursuit sandbox.
#[derive(Debug, Parser)]
#[command(name = "veiled-hollow", version)]
struct Cli {
    /// Raise log verbosity; repeat for debug and trace output.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    /// TOML file overriding generation defaults.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print one level as ASCII art.
    Generate {
        /// Level seed.
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// Overlay items and enemies from the spawn manifest.
        #[arg(long)]
        spawns: bool,
    },
    /// Generate many levels and summarise room counts and failures.
    Survey {
        /// Number of levels to generate.
        #[arg(long, default_value_t = 100)]
        runs: u64,
        /// Seed of the first level.
        #[arg(long, default_value_t = 0)]
        start_seed: u64,
    },
    /// Let the level's enemies chase a target walking through every room.
    Chase {
        /// Level seed.
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// Number of 60 Hz frames to simulate.
        #[arg(long, default_value_t = 3_600)]
        frames: u32,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    install_logging(cli.verbose)?;

    let config = match cli.config.as_deref() {
        Some(path) => load_config(path)?,
        None => GenerationConfig::default(),
    };
    let generator = DungeonGenerator::new(config).context("invalid generation config")?;

    match cli.command {
        Command::Generate { seed, spawns } => {
            let level = generator
                .generate(seed)
                .with_context(|| format!("seed {seed} did not produce a level"))?;
            print!("{}", ascii::render(&level, spawns));
            println!("{}", ascii::summary(&level));
        }
        Command::Survey { runs, start_seed } => {
            println!("{}", survey::run(&generator, start_seed, runs));
        }
        Command::Chase { seed, frames } => {
            let level = generator
                .generate(seed)
                .with_context(|| format!("seed {seed} did not produce a level"))?;
            let mut chase =
                chase::Chase::new(&level, veiled_hollow_system_pursuit::Config::default());
            chase.advance(frames);
            println!("{}", chase.report());
        }
    }
    Ok(())
}

fn install_logging(verbosity: u8) -> Result<()> {
    let level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    simplelog::TermLogger::init(
        level,
        simplelog::ConfigBuilder::new()
            .set_target_level(LevelFilter::Off)
            .set_location_level(LevelFilter::Off)
            .build(),
        simplelog::TerminalMode::Stderr,
        simplelog::ColorChoice::Auto,
    )
    .context("failed to initialize logging")
}

fn load_config(path: &Path) -> Result<GenerationConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    parse_config(&contents).with_context(|| format!("failed to parse {}", path.display()))
}

fn parse_config(contents: &str) -> Result<GenerationConfig> {
    toml::from_str(contents).context("config is not valid TOML for a generation config")
}
