//! Population-level descriptive classifier.
//!
//! Unlike the adaptive evolution controller, this layer only describes:
//! diversity and stability metrics, a discrete ecosystem state re-derived
//! from scratch every generation (no hysteresis), emergent-behavior flags,
//! and advisory intervention recommendations that are never auto-applied.

use crate::environment::Environment;
use crate::genome::TraitId;
use crate::organism::Organism;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Rolling window length for population/diversity/stability samples
const WINDOW: usize = 50;

/// Alive count below which the ecosystem is in crisis regardless of trend
const CRISIS_POPULATION: usize = 5;

/// Coarse population trend classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EcosystemPhase {
    Growth,
    Stable,
    Decline,
    Crisis,
}

/// Resource pressure tier from the food/alive ratio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PressureLevel {
    Low,
    Medium,
    High,
}

/// Genetic diversity tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiversityLevel {
    Low,
    Medium,
    High,
}

/// Discrete ecosystem state, fully re-derived each generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EcosystemState {
    pub phase: EcosystemPhase,
    pub pressure: PressureLevel,
    pub diversity: DiversityLevel,
}

impl Default for EcosystemState {
    fn default() -> Self {
        Self {
            phase: EcosystemPhase::Stable,
            pressure: PressureLevel::Low,
            diversity: DiversityLevel::Medium,
        }
    }
}

/// Trait averages crossing fixed dominance thresholds
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DominantTraits {
    pub fast: bool,
    pub efficient: bool,
    pub aggressive: bool,
    pub large: bool,
}

/// Detected emergent population patterns
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EmergentBehaviors {
    /// Population huddled around its centroid
    pub clustering: bool,
    /// Large recent swings in population size
    pub migration: bool,
    /// Unusually wide spread in movement speed
    pub specialization: bool,
}

/// Full descriptive snapshot of one generation's ecosystem
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EcosystemReport {
    /// Alive organisms per 10,000 square units
    pub density: f32,
    /// Food items per alive organism
    pub resource_ratio: f32,
    /// Mean normalized variance of the tracked traits
    pub diversity: f32,
    /// 1 - var/mean^2 over recent population samples, floored at 0
    pub stability: f32,
    pub dominant: DominantTraits,
    pub emergent: EmergentBehaviors,
    pub alive: usize,
}

/// Advisory tags mapped from the discrete state. Advisory only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recommendation {
    /// Crisis: flood the arena with food
    SpawnAbundance,
    /// Diversity collapsed: raise the mutation rate
    RaiseMutationRate,
    /// Resource pressure high: relax selection pressure
    RelaxSelection,
}

/// Descriptive ecosystem classifier, scoped to one simulation run
#[derive(Debug, Clone, Default)]
pub struct EcosystemIntelligence {
    population_window: VecDeque<usize>,
    diversity_window: VecDeque<f32>,
    stability_window: VecDeque<f32>,
    pub state: EcosystemState,
}

impl EcosystemIntelligence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute the generation's descriptive metrics and push them onto the
    /// rolling windows.
    pub fn analyze_ecosystem(
        &mut self,
        organisms: &[Organism],
        env: &Environment,
    ) -> EcosystemReport {
        let alive: Vec<&Organism> = organisms.iter().filter(|o| o.alive).collect();
        let n = alive.len();

        let density = n as f32 / (env.width * env.height) * 10_000.0;
        let resource_ratio = env.food.len() as f32 / (n.max(1) as f32);
        let diversity = trait_diversity(&alive);

        push_capped(&mut self.population_window, n);
        let stability = self.population_stability();

        push_capped(&mut self.diversity_window, diversity);
        push_capped(&mut self.stability_window, stability);

        let dominant = dominant_traits(&alive);
        let emergent = EmergentBehaviors {
            clustering: n >= 5 && mean_centroid_distance(&alive) < 200.0,
            migration: self.recent_population_churn() > 10,
            specialization: n >= 10 && trait_variance(&alive, TraitId::Speed) > 2.0,
        };

        EcosystemReport {
            density,
            resource_ratio,
            diversity,
            stability,
            dominant,
            emergent,
            alive: n,
        }
    }

    /// Re-derive the discrete state from the latest report. No hysteresis:
    /// previous state never feeds back.
    pub fn update_ecosystem_state(&mut self, report: &EcosystemReport) {
        let phase = if report.alive < CRISIS_POPULATION {
            EcosystemPhase::Crisis
        } else {
            match self.population_trend() {
                delta if delta > 5 => EcosystemPhase::Growth,
                delta if delta < -5 => EcosystemPhase::Decline,
                _ => EcosystemPhase::Stable,
            }
        };

        let pressure = if report.resource_ratio < 1.0 {
            PressureLevel::High
        } else if report.resource_ratio < 2.0 {
            PressureLevel::Medium
        } else {
            PressureLevel::Low
        };

        let diversity = if report.diversity < 0.02 {
            DiversityLevel::Low
        } else if report.diversity > 0.08 {
            DiversityLevel::High
        } else {
            DiversityLevel::Medium
        };

        self.state = EcosystemState {
            phase,
            pressure,
            diversity,
        };
    }

    /// Stateless rule table from discrete state to advisory tags
    pub fn recommend_interventions(&self) -> Vec<Recommendation> {
        let mut recommendations = Vec::new();
        if self.state.phase == EcosystemPhase::Crisis {
            recommendations.push(Recommendation::SpawnAbundance);
        }
        if self.state.diversity == DiversityLevel::Low {
            recommendations.push(Recommendation::RaiseMutationRate);
        }
        if self.state.pressure == PressureLevel::High {
            recommendations.push(Recommendation::RelaxSelection);
        }
        recommendations
    }

    /// Stability from the last 10 population samples:
    /// `max(0, 1 - variance/mean^2)`, 0 with fewer than 5 samples.
    fn population_stability(&self) -> f32 {
        let samples: Vec<f32> = self
            .population_window
            .iter()
            .rev()
            .take(10)
            .map(|&n| n as f32)
            .collect();
        if samples.len() < 5 {
            return 0.0;
        }

        let mean = samples.iter().sum::<f32>() / samples.len() as f32;
        let variance =
            samples.iter().map(|s| (s - mean).powi(2)).sum::<f32>() / samples.len() as f32;
        let denom = if mean.abs() < f32::EPSILON {
            1.0
        } else {
            mean * mean
        };
        (1.0 - variance / denom).max(0.0)
    }

    /// Population delta across the last 3 window samples
    fn population_trend(&self) -> i64 {
        let recent: Vec<i64> = self
            .population_window
            .iter()
            .rev()
            .take(3)
            .map(|&n| n as i64)
            .collect();
        match recent.as_slice() {
            [] | [_] => 0,
            window => window[0] - window[window.len() - 1],
        }
    }

    /// Sum of absolute population deltas over the last 3 samples
    fn recent_population_churn(&self) -> i64 {
        let recent: Vec<i64> = self
            .population_window
            .iter()
            .rev()
            .take(3)
            .map(|&n| n as i64)
            .collect();
        recent.windows(2).map(|w| (w[0] - w[1]).abs()).sum()
    }
}

fn push_capped<T>(window: &mut VecDeque<T>, value: T) {
    if window.len() == WINDOW {
        window.pop_front();
    }
    window.push_back(value);
}

/// Mean variance of the tracked traits, each normalized to its domain so
/// wide domains do not drown narrow ones
fn trait_diversity(alive: &[&Organism]) -> f32 {
    if alive.is_empty() {
        return 0.0;
    }
    let sum: f32 = TraitId::TRACKED
        .iter()
        .map(|&t| normalized_variance(alive, t))
        .sum();
    sum / TraitId::TRACKED.len() as f32
}

fn normalized_variance(alive: &[&Organism], trait_id: TraitId) -> f32 {
    let values: Vec<f32> = alive
        .iter()
        .map(|o| (o.genome.get(trait_id) - trait_id.domain().0) / trait_id.range())
        .collect();
    variance(&values)
}

/// Raw (unnormalized) variance of one trait
fn trait_variance(alive: &[&Organism], trait_id: TraitId) -> f32 {
    let values: Vec<f32> = alive.iter().map(|o| o.genome.get(trait_id)).collect();
    variance(&values)
}

fn variance(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = values.iter().sum::<f32>() / values.len() as f32;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / values.len() as f32
}

fn mean_centroid_distance(alive: &[&Organism]) -> f32 {
    if alive.is_empty() {
        return 0.0;
    }
    let n = alive.len() as f32;
    let cx = alive.iter().map(|o| o.x).sum::<f32>() / n;
    let cy = alive.iter().map(|o| o.y).sum::<f32>() / n;
    alive
        .iter()
        .map(|o| (o.x - cx).hypot(o.y - cy))
        .sum::<f32>()
        / n
}

fn dominant_traits(alive: &[&Organism]) -> DominantTraits {
    if alive.is_empty() {
        return DominantTraits::default();
    }
    let n = alive.len() as f32;
    let mean = |t: TraitId| alive.iter().map(|o| o.genome.get(t)).sum::<f32>() / n;

    DominantTraits {
        fast: mean(TraitId::Speed) > 3.5,
        efficient: mean(TraitId::Efficiency) > 1.1,
        aggressive: mean(TraitId::Aggression) > 6.0,
        large: mean(TraitId::Size) > 10.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::genome::Genome;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn population(n: usize, seed: u64) -> Vec<Organism> {
        let config = Config::default();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        (0..n)
            .map(|i| {
                Organism::new(
                    i as u64,
                    (i as f32 * 37.0) % 700.0,
                    (i as f32 * 53.0) % 500.0,
                    Genome::random(&mut rng),
                    &config.organisms,
                )
            })
            .collect()
    }

    fn env() -> Environment {
        Environment::new(&Config::default().world)
    }

    #[test]
    fn test_crisis_overrides_trend() {
        let mut eco = EcosystemIntelligence::new();
        let env = env();

        // Feed a strong growth trend first.
        for n in [10usize, 20, 40] {
            let pop = population(n, 1);
            let report = eco.analyze_ecosystem(&pop, &env);
            eco.update_ecosystem_state(&report);
        }
        assert_eq!(eco.state.phase, EcosystemPhase::Growth);

        // A population under 5 forces crisis regardless of history.
        let tiny = population(3, 2);
        let report = eco.analyze_ecosystem(&tiny, &env);
        eco.update_ecosystem_state(&report);
        assert_eq!(eco.state.phase, EcosystemPhase::Crisis);
    }

    #[test]
    fn test_decline_phase_from_trend() {
        let mut eco = EcosystemIntelligence::new();
        let env = env();
        for n in [60usize, 40, 20] {
            let pop = population(n, 3);
            let report = eco.analyze_ecosystem(&pop, &env);
            eco.update_ecosystem_state(&report);
        }
        assert_eq!(eco.state.phase, EcosystemPhase::Decline);
    }

    #[test]
    fn test_pressure_tiers_from_resource_ratio() {
        let mut eco = EcosystemIntelligence::new();
        let mut report = EcosystemReport {
            alive: 20,
            resource_ratio: 0.5,
            ..Default::default()
        };

        eco.update_ecosystem_state(&report);
        assert_eq!(eco.state.pressure, PressureLevel::High);

        report.resource_ratio = 1.5;
        eco.update_ecosystem_state(&report);
        assert_eq!(eco.state.pressure, PressureLevel::Medium);

        report.resource_ratio = 3.0;
        eco.update_ecosystem_state(&report);
        assert_eq!(eco.state.pressure, PressureLevel::Low);
    }

    #[test]
    fn test_stability_needs_five_samples() {
        let mut eco = EcosystemIntelligence::new();
        let env = env();

        let pop = population(30, 4);
        for i in 0..6 {
            let report = eco.analyze_ecosystem(&pop, &env);
            if i < 4 {
                assert_eq!(report.stability, 0.0, "fewer than 5 samples");
            } else {
                // Perfectly flat population: variance 0, stability 1.
                assert!((report.stability - 1.0).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn test_clustering_detection() {
        let config = Config::default();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let env = env();
        let mut eco = EcosystemIntelligence::new();

        // Six organisms inside a tight huddle.
        let huddle: Vec<Organism> = (0..6)
            .map(|i| {
                Organism::new(
                    i,
                    400.0 + i as f32 * 3.0,
                    300.0,
                    Genome::random(&mut rng),
                    &config.organisms,
                )
            })
            .collect();
        let report = eco.analyze_ecosystem(&huddle, &env);
        assert!(report.emergent.clustering);
    }

    #[test]
    fn test_migration_detection() {
        let mut eco = EcosystemIntelligence::new();
        let env = env();
        for n in [10usize, 30, 12] {
            let pop = population(n, 6);
            let report = eco.analyze_ecosystem(&pop, &env);
            if n == 12 {
                // |10-30| + |30-12| = 38 > 10
                assert!(report.emergent.migration);
            }
        }
    }

    #[test]
    fn test_recommendations_rule_table() {
        let mut eco = EcosystemIntelligence::new();
        eco.state = EcosystemState {
            phase: EcosystemPhase::Crisis,
            pressure: PressureLevel::High,
            diversity: DiversityLevel::Low,
        };

        let recs = eco.recommend_interventions();
        assert!(recs.contains(&Recommendation::SpawnAbundance));
        assert!(recs.contains(&Recommendation::RaiseMutationRate));
        assert!(recs.contains(&Recommendation::RelaxSelection));

        eco.state = EcosystemState::default();
        assert!(eco.recommend_interventions().is_empty());
    }

    #[test]
    fn test_dead_organisms_excluded() {
        let env = env();
        let mut eco = EcosystemIntelligence::new();
        let mut pop = population(10, 7);
        for org in pop.iter_mut().take(7) {
            org.alive = false;
        }

        let report = eco.analyze_ecosystem(&pop, &env);
        assert_eq!(report.alive, 3);
    }
}
