//! # MICROCOSM
//!
//! Agent-based evolutionary simulation kernel.
//!
//! A population of autonomous organisms is governed by a four-layer
//! decision architecture (reflexes, utility-based arbitration with
//! commitment hysteresis, generation-level evolutionary adaptation, and
//! population-level ecosystem classification), stepped in discrete ticks
//! and periodically subjected to genetic selection and reproduction.
//!
//! ## Quick Start
//!
//! ```rust
//! use microcosm::{Config, Simulation};
//!
//! let config = Config::default();
//! let mut sim = Simulation::new_with_seed(config, 42);
//!
//! // Drive one generation.
//! sim.run(1200);
//!
//! println!("generation: {}", sim.generation());
//! println!("alive: {}", sim.alive_count());
//! println!("{}", sim.stats().summary());
//! ```
//!
//! ## Interventions
//!
//! ```rust
//! use microcosm::{Config, Simulation, WorldEvent};
//!
//! let mut sim = Simulation::new_with_seed(Config::default(), 42);
//! sim.run(100);
//!
//! let id = sim.organisms()[0].id;
//! sim.clone_organism(id);
//! sim.trigger_event(WorldEvent::Abundance);
//! ```

pub mod ai;
pub mod config;
pub mod ecosystem;
pub mod environment;
pub mod events;
pub mod evolution;
pub mod genome;
pub mod memory;
pub mod organism;
pub mod simulation;
pub mod stats;

// Re-export main types
pub use config::Config;
pub use ecosystem::{EcosystemIntelligence, EcosystemPhase, EcosystemState};
pub use environment::Environment;
pub use events::WorldEvent;
pub use evolution::EvolutionIntelligence;
pub use genome::{Genome, TraitId};
pub use organism::Organism;
pub use simulation::{RunState, Simulation};
pub use stats::SimulationStats;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Run a quick benchmark
pub fn benchmark(ticks: u64, population: usize) -> BenchmarkResult {
    use std::time::Instant;

    let mut config = Config::default();
    config.organisms.initial_population = population;
    config.safety.max_population = config.safety.max_population.max(population);

    let mut sim = Simulation::new(config);

    let start = Instant::now();
    sim.run(ticks);
    let elapsed = start.elapsed();

    BenchmarkResult {
        ticks,
        initial_population: population,
        final_alive: sim.alive_count(),
        generations: sim.generation(),
        elapsed_secs: elapsed.as_secs_f64(),
        ticks_per_second: ticks as f64 / elapsed.as_secs_f64(),
    }
}

/// Benchmark result
#[derive(Debug, Clone)]
pub struct BenchmarkResult {
    pub ticks: u64,
    pub initial_population: usize,
    pub final_alive: usize,
    pub generations: u32,
    pub elapsed_secs: f64,
    pub ticks_per_second: f64,
}

impl std::fmt::Display for BenchmarkResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Benchmark Results ===")?;
        writeln!(f, "Ticks: {}", self.ticks)?;
        writeln!(
            f,
            "Population: {} -> {} alive",
            self.initial_population, self.final_alive
        )?;
        writeln!(f, "Generations: {}", self.generations)?;
        writeln!(f, "Time: {:.3}s", self.elapsed_secs)?;
        writeln!(f, "Speed: {:.1} ticks/s", self.ticks_per_second)?;
        Ok(())
    }
}
