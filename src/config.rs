//! Configuration system for the simulation kernel.
//!
//! Supports YAML configuration files with sensible defaults.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub world: WorldConfig,
    pub organisms: OrganismConfig,
    pub evolution: EvolutionConfig,
    pub safety: SafetyConfig,
    pub logging: LoggingConfig,
}

/// Arena and food configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldConfig {
    /// Arena width in units
    pub width: f32,
    /// Arena height in units
    pub height: f32,
    /// Margin organisms bounce back from at the edges
    pub boundary_margin: f32,
    /// Food items spawned at generation start
    pub initial_food: usize,
    /// Food population the per-tick replenisher steers toward
    pub food_target: usize,
    /// Mean energy per food item
    pub food_energy: f32,
    /// Food collision radius
    pub food_radius: f32,
    /// Maximum food items spawned per tick
    pub food_replenish_per_tick: usize,
    /// Ambient temperature
    pub temperature: f32,
    /// Simulated time per tick
    pub tick_dt: f32,
}

/// Organism physiology and per-organism AI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganismConfig {
    /// Number of organisms at start
    pub initial_population: usize,
    /// Starting energy for new organisms
    pub initial_energy: f32,
    /// Energy cap
    pub max_energy: f32,
    /// Base metabolic cost per tick
    pub base_metabolism: f32,
    /// Metabolic cost per unit of body size
    pub size_metabolism: f32,
    /// Metabolic cost per unit of speed
    pub move_metabolism: f32,
    /// Metabolic cost per degree away from comfort temperature
    pub temperature_stress: f32,
    /// Extra metabolic cost per aggression point for carnivores
    pub carnivore_surcharge: f32,
    /// Ticks a chosen behavior stays locked in
    pub commitment_ticks: u64,
    /// Ticks ahead the threat predictor extrapolates
    pub threat_horizon: f32,
    /// Recent positions kept in memory
    pub memory_positions: usize,
    /// Side length of a food-density memory bucket
    pub food_bucket_size: f32,
    /// Densest food buckets kept in memory
    pub food_buckets: usize,
    /// Ticks a remembered danger zone stays valid
    pub danger_zone_ttl: u64,
    /// Energy fraction below which the feeding forecast takes over
    pub low_energy_fraction: f32,
}

/// Evolution configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionConfig {
    /// Base per-trait mutation probability
    pub mutation_rate: f32,
    /// Fraction of the population admitted to the breeding pool
    pub selection_pressure: f32,
    /// Tick budget per generation
    pub generation_ticks: u64,
}

/// Safety limits to prevent runaway simulations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyConfig {
    /// Maximum allowed population
    pub max_population: usize,
    /// Maximum food items in the arena
    pub max_food: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Ticks between stats log lines
    pub stats_interval: u64,
    /// Log level (error, warn, info, debug, trace)
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            world: WorldConfig::default(),
            organisms: OrganismConfig::default(),
            evolution: EvolutionConfig::default(),
            safety: SafetyConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            boundary_margin: 5.0,
            initial_food: 90,
            food_target: 80,
            food_energy: 25.0,
            food_radius: 4.0,
            food_replenish_per_tick: 2,
            temperature: 20.0,
            tick_dt: 1.0,
        }
    }
}

impl Default for OrganismConfig {
    fn default() -> Self {
        Self {
            initial_population: 60,
            initial_energy: 100.0,
            max_energy: 200.0,
            base_metabolism: 0.15,
            size_metabolism: 0.02,
            move_metabolism: 0.05,
            temperature_stress: 0.01,
            carnivore_surcharge: 0.04,
            commitment_ticks: 25,
            threat_horizon: 30.0,
            memory_positions: 20,
            food_bucket_size: 50.0,
            food_buckets: 12,
            danger_zone_ttl: 300,
            low_energy_fraction: 0.35,
        }
    }
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            mutation_rate: 0.15,
            selection_pressure: 0.3,
            generation_ticks: 1200,
        }
    }
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            max_population: 600,
            max_food: 500,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            stats_interval: 100,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.world.width <= 0.0 || self.world.height <= 0.0 {
            return Err("arena dimensions must be positive".to_string());
        }
        if self.organisms.initial_population < 2 {
            return Err("initial_population must be at least 2".to_string());
        }
        if self.organisms.initial_population > self.safety.max_population {
            return Err("initial_population cannot exceed max_population".to_string());
        }
        if self.evolution.generation_ticks == 0 {
            return Err("generation_ticks must be > 0".to_string());
        }
        if !(0.0..=1.0).contains(&self.evolution.mutation_rate) {
            return Err("mutation_rate must be within [0, 1]".to_string());
        }
        if !(0.0..=1.0).contains(&self.evolution.selection_pressure) {
            return Err("selection_pressure must be within [0, 1]".to_string());
        }
        if self.organisms.commitment_ticks == 0 {
            return Err("commitment_ticks must be > 0".to_string());
        }
        if self.world.tick_dt <= 0.0 {
            return Err("tick_dt must be positive".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_roundtrip() {
        let config = Config::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let loaded: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(config.world.width, loaded.world.width);
        assert_eq!(config.organisms.initial_population, loaded.organisms.initial_population);
    }

    #[test]
    fn test_invalid_population_rejected() {
        let mut config = Config::default();
        config.organisms.initial_population = 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_rates_rejected() {
        let mut config = Config::default();
        config.evolution.mutation_rate = 1.5;
        assert!(config.validate().is_err());
    }
}
