//! MICROCOSM - CLI entry point.

use clap::{Parser, Subcommand};
use log::{info, warn};
use microcosm::{benchmark, Config, Simulation};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "microcosm")]
#[command(version)]
#[command(about = "Agent-based evolutionary simulation kernel")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a simulation
    Run {
        /// Configuration file (YAML)
        #[arg(short, long, default_value = "config.yaml")]
        config: PathBuf,

        /// Number of ticks to simulate
        #[arg(short, long, default_value = "10000")]
        ticks: u64,

        /// Random seed for reproducible runs
        #[arg(long)]
        seed: Option<u64>,

        /// Write a final stats snapshot (JSON) to this path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Quiet mode (no periodic stats lines)
        #[arg(short, long)]
        quiet: bool,
    },

    /// Generate a default configuration file
    Init {
        /// Output path
        #[arg(short, long, default_value = "config.yaml")]
        output: PathBuf,
    },

    /// Run a performance benchmark
    Benchmark {
        /// Number of ticks
        #[arg(short, long, default_value = "1000")]
        ticks: u64,

        /// Population size
        #[arg(short, long, default_value = "200")]
        population: usize,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            ticks,
            seed,
            output,
            quiet,
        } => run_simulation(config, ticks, seed, output, quiet),

        Commands::Init { output } => generate_config(output),

        Commands::Benchmark { ticks, population } => {
            let result = benchmark(ticks, population);
            println!("{result}");
            Ok(())
        }
    }
}

fn run_simulation(
    config_path: PathBuf,
    ticks: u64,
    seed: Option<u64>,
    output: Option<PathBuf>,
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = if config_path.exists() {
        Config::from_file(&config_path)?
    } else {
        warn!("{} not found, using defaults", config_path.display());
        Config::default()
    };
    let stats_interval = config.logging.stats_interval.max(1);

    let mut sim = match seed {
        Some(seed) => Simulation::new_with_seed(config, seed),
        None => Simulation::new(config),
    };
    info!("seed: {}", sim.seed());

    let start = Instant::now();
    for _ in 0..ticks {
        sim.step();

        if !quiet && sim.tick() % stats_interval == 0 {
            println!("{}", sim.stats().summary());
        }
    }
    let elapsed = start.elapsed().as_secs_f64();

    let stats = sim.stats();
    println!("{}", stats.summary());
    info!(
        "{} ticks in {:.2}s ({:.0} ticks/s), {} generations",
        ticks,
        elapsed,
        ticks as f64 / elapsed,
        sim.generation()
    );

    if let Some(path) = output {
        let json = serde_json::to_string_pretty(&stats)?;
        std::fs::write(&path, json)?;
        info!("stats written to {}", path.display());
    }

    Ok(())
}

fn generate_config(output: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();
    config.save(&output)?;
    println!("Configuration written to {}", output.display());
    Ok(())
}
