//! Statistics snapshot exposed to external consumers.

use crate::ecosystem::EcosystemState;
use crate::evolution::EnvironmentalPressures;
use crate::genome::{TraitId, TraitWeights};
use crate::organism::Organism;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-trait averages over the live population. All zeros when empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TraitAverages {
    pub speed: f32,
    pub vision: f32,
    pub size: f32,
    pub efficiency: f32,
    pub aggression: f32,
    pub diet: f32,
    pub stability: f32,
}

impl TraitAverages {
    pub fn of(organisms: &[Organism]) -> Self {
        let alive: Vec<&Organism> = organisms.iter().filter(|o| o.alive).collect();
        if alive.is_empty() {
            return Self::default();
        }
        let n = alive.len() as f32;
        let mean = |t: TraitId| alive.iter().map(|o| o.genome.get(t)).sum::<f32>() / n;

        Self {
            speed: mean(TraitId::Speed),
            vision: mean(TraitId::Vision),
            size: mean(TraitId::Size),
            efficiency: mean(TraitId::Efficiency),
            aggression: mean(TraitId::Aggression),
            diet: mean(TraitId::Diet),
            stability: mean(TraitId::Stability),
        }
    }
}

/// Point-in-time view of the whole simulation, cheap to build and safe to
/// hand to rendering, mission, or lineage layers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationStats {
    pub tick: u64,
    pub generation: u32,
    /// Total organisms in the list, dead included
    pub population: usize,
    pub alive: usize,
    pub avg_fitness: f32,
    pub best_fitness: f32,
    pub food_count: usize,
    pub trait_averages: TraitAverages,
    pub ecosystem: EcosystemState,
    pub pressures: EnvironmentalPressures,
    pub adaptive_weights: TraitWeights,
    /// Committed behavior counts over the live population
    pub behaviors: HashMap<String, usize>,
}

impl SimulationStats {
    /// Count committed behaviors over the live population
    pub fn behavior_histogram(organisms: &[Organism]) -> HashMap<String, usize> {
        let mut histogram: HashMap<String, usize> = HashMap::new();
        for org in organisms.iter().filter(|o| o.alive) {
            *histogram
                .entry(org.brain.current().name().to_string())
                .or_insert(0) += 1;
        }
        histogram
    }

    /// Mean live fitness over the live population, 0 when empty
    pub fn mean_fitness(organisms: &[Organism]) -> f32 {
        let alive: Vec<f32> = organisms
            .iter()
            .filter(|o| o.alive)
            .map(|o| o.current_fitness())
            .collect();
        if alive.is_empty() {
            0.0
        } else {
            alive.iter().sum::<f32>() / alive.len() as f32
        }
    }

    /// Best live fitness over the whole list (dead included), 0 when empty
    pub fn best_fitness(organisms: &[Organism]) -> f32 {
        organisms
            .iter()
            .map(|o| o.current_fitness())
            .fold(0.0, f32::max)
    }

    /// One-line summary for periodic logging
    pub fn summary(&self) -> String {
        format!(
            "T:{:6} | Gen:{:3} | Alive:{:4} | Fit:{:.1}/{:.1} | Food:{:4} | {:?}/{:?}/{:?}",
            self.tick,
            self.generation,
            self.alive,
            self.avg_fitness,
            self.best_fitness,
            self.food_count,
            self.ecosystem.phase,
            self.ecosystem.pressure,
            self.ecosystem.diversity,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::genome::Genome;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn population(n: usize) -> Vec<Organism> {
        let config = Config::default();
        let mut rng = ChaCha8Rng::seed_from_u64(51);
        (0..n)
            .map(|i| {
                Organism::new(
                    i as u64,
                    50.0,
                    50.0,
                    Genome::random(&mut rng),
                    &config.organisms,
                )
            })
            .collect()
    }

    #[test]
    fn test_trait_averages_empty_population() {
        assert_eq!(TraitAverages::of(&[]), TraitAverages::default());
    }

    #[test]
    fn test_trait_averages_exclude_dead() {
        let mut pop = population(2);
        pop[0].genome.set(TraitId::Speed, 2.0);
        pop[1].genome.set(TraitId::Speed, 4.0);
        pop[1].alive = false;

        let averages = TraitAverages::of(&pop);
        assert_eq!(averages.speed, 2.0);
    }

    #[test]
    fn test_fitness_aggregates_default_to_zero() {
        assert_eq!(SimulationStats::mean_fitness(&[]), 0.0);
        assert_eq!(SimulationStats::best_fitness(&[]), 0.0);
    }

    #[test]
    fn test_behavior_histogram_counts_alive() {
        let mut pop = population(3);
        pop[2].alive = false;

        let histogram = SimulationStats::behavior_histogram(&pop);
        let total: usize = histogram.values().sum();
        assert_eq!(total, 2);
    }
}
