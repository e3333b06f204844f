//! Generation-scoped adaptive controller.
//!
//! Reads the outcome of one generation (who survived, with which traits,
//! who died of what) and reshapes selection and mutation policy for the
//! next: environmental-pressure estimates, per-trait adaptive weights, a
//! weighted parent pool, and an instability-scaled mutation rate.

use crate::genome::{Genome, TraitId, TraitWeights};
use crate::organism::Organism;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

/// Rolling correlation samples kept per trait
const CORRELATION_WINDOW: usize = 20;

/// Adaptive weight adjustment per generation
const WEIGHT_STEP: f32 = 0.05;

/// Correlations inside this band leave the weight unchanged
const CORRELATION_DEADBAND: f32 = 0.1;

/// Scale of the normalized-trait term in weighted parent fitness
const PARENT_TRAIT_COEFFICIENT: f32 = 10.0;

/// Post-mortem classification from an organism's final state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeathCause {
    Starvation,
    Exhaustion,
    Inefficiency,
    Unknown,
}

impl DeathCause {
    /// Classify a casualty: starvation when the reserve emptied with
    /// almost nothing foraged, exhaustion when it emptied otherwise,
    /// inefficiency for low-efficiency deaths with energy left, else
    /// unknown (predation, global events).
    pub fn classify(org: &Organism) -> DeathCause {
        if org.energy <= 0.0 {
            if org.food_collected < 3 {
                DeathCause::Starvation
            } else {
                DeathCause::Exhaustion
            }
        } else if org.genome.efficiency < 0.5 {
            DeathCause::Inefficiency
        } else {
            DeathCause::Unknown
        }
    }
}

/// Death counts for one generation
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DeathTally {
    pub starvation: usize,
    pub exhaustion: usize,
    pub inefficiency: usize,
    pub unknown: usize,
}

impl DeathTally {
    pub fn total(&self) -> usize {
        self.starvation + self.exhaustion + self.inefficiency + self.unknown
    }
}

/// Outcome summary of one finished generation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationAnalysis {
    pub survival_rate: f32,
    /// Signed survivor-vs-casualty correlation per tracked trait, in [-1, 1]
    pub correlations: HashMap<TraitId, f32>,
    pub deaths: DeathTally,
}

/// Ratcheted estimates of what the environment punishes
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentalPressures {
    pub starvation: f32,
    pub competition: f32,
    pub instability: f32,
}

/// One line of the generation history log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRecord {
    pub generation: u32,
    pub population: usize,
    pub survival_rate: f32,
    pub avg_fitness: f32,
    pub best_fitness: f32,
    pub deaths: DeathTally,
}

/// Adaptive evolution controller, scoped to one simulation run
#[derive(Debug, Clone, Default)]
pub struct EvolutionIntelligence {
    pub history: Vec<GenerationRecord>,
    pub pressures: EnvironmentalPressures,
    pub weights: TraitWeights,
    correlation_log: HashMap<TraitId, VecDeque<f32>>,
}

impl EvolutionIntelligence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Analyze a finished generation: survival rate, per-trait survivor
    /// correlations, and death-cause classification.
    pub fn analyze_generation(&self, organisms: &[Organism]) -> GenerationAnalysis {
        let total = organisms.len();
        let survivors: Vec<&Organism> = organisms.iter().filter(|o| o.alive).collect();
        let casualties: Vec<&Organism> = organisms.iter().filter(|o| !o.alive).collect();

        let survival_rate = if total > 0 {
            survivors.len() as f32 / total as f32
        } else {
            0.0
        };

        let mut correlations = HashMap::new();
        for trait_id in TraitId::TRACKED {
            correlations.insert(trait_id, trait_correlation(trait_id, &survivors, &casualties));
        }

        let mut deaths = DeathTally::default();
        for org in &casualties {
            match DeathCause::classify(org) {
                DeathCause::Starvation => deaths.starvation += 1,
                DeathCause::Exhaustion => deaths.exhaustion += 1,
                DeathCause::Inefficiency => deaths.inefficiency += 1,
                DeathCause::Unknown => deaths.unknown += 1,
            }
        }

        GenerationAnalysis {
            survival_rate,
            correlations,
            deaths,
        }
    }

    /// Ratchet the pressure estimates from one generation's outcome
    pub fn update_environmental_pressures(&mut self, analysis: &GenerationAnalysis) {
        if analysis.deaths.starvation > analysis.deaths.exhaustion {
            self.pressures.starvation += 0.1;
        } else {
            self.pressures.starvation -= 0.05;
        }
        self.pressures.starvation = self.pressures.starvation.clamp(0.0, 1.0);

        if analysis.survival_rate < 0.3 {
            self.pressures.competition = (self.pressures.competition + 0.1).min(1.0);
        }

        let tracked = TraitId::TRACKED.len() as f32;
        self.pressures.instability = analysis
            .correlations
            .values()
            .map(|c| c.abs())
            .sum::<f32>()
            / tracked.max(1.0);
    }

    /// Nudge adaptive weights toward traits that correlated with survival
    /// and log the correlation samples.
    pub fn update_trait_weights(&mut self, analysis: &GenerationAnalysis) {
        for trait_id in TraitId::TRACKED {
            let correlation = analysis.correlations.get(&trait_id).copied().unwrap_or(0.0);
            if correlation > CORRELATION_DEADBAND {
                self.weights.nudge(trait_id, WEIGHT_STEP);
            } else if correlation < -CORRELATION_DEADBAND {
                self.weights.nudge(trait_id, -WEIGHT_STEP);
            }

            let log = self.correlation_log.entry(trait_id).or_default();
            if log.len() == CORRELATION_WINDOW {
                log.pop_front();
            }
            log.push_back(correlation);
        }
    }

    /// Append a line to the generation history log
    pub fn record_generation(&mut self, record: GenerationRecord) {
        self.history.push(record);
    }

    /// Weighted parent selection.
    ///
    /// Weighted fitness adds normalized-trait terms scaled by the adaptive
    /// weights, plus conditional bonuses: under starvation pressure the
    /// efficient and far-sighted breed, under competition pressure the
    /// fast and large. Returns the top `max(floor(N * pressure), 2)`; a
    /// population below 2 is returned whole (the documented degenerate
    /// case).
    pub fn select_parents<'a>(
        &self,
        organisms: &'a [Organism],
        pressure: f32,
    ) -> Vec<&'a Organism> {
        if organisms.len() <= 2 {
            return organisms.iter().collect();
        }

        let mut ranked: Vec<(&Organism, f32)> = organisms
            .iter()
            .map(|o| (o, self.weighted_fitness(o)))
            .collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        let count = ((organisms.len() as f32 * pressure).floor() as usize)
            .max(2)
            .min(organisms.len());
        ranked.into_iter().take(count).map(|(o, _)| o).collect()
    }

    fn weighted_fitness(&self, org: &Organism) -> f32 {
        let norm = |t: TraitId| (org.genome.get(t) - t.domain().0) / t.range();

        let mut score = org.fitness;
        for trait_id in TraitId::ALL {
            score += norm(trait_id) * self.weights.get(trait_id) * PARENT_TRAIT_COEFFICIENT;
        }

        if self.pressures.starvation > 0.5 {
            score += norm(TraitId::Efficiency) * 20.0 + norm(TraitId::Vision) * 10.0;
        }
        if self.pressures.competition > 0.5 {
            score += norm(TraitId::Speed) * 20.0 + norm(TraitId::Size) * 10.0;
        }
        score
    }

    /// Mutation rate scaled by instability and discounted when the trailing
    /// five generations survived comfortably. Monotonically non-decreasing
    /// in instability for a fixed history.
    pub fn adaptive_mutation_rate(&self, base: f32) -> f32 {
        let mut rate = base * (1.0 + 0.5 * self.pressures.instability);

        let trailing: Vec<f32> = self
            .history
            .iter()
            .rev()
            .take(5)
            .map(|r| r.survival_rate)
            .collect();
        if !trailing.is_empty() {
            let mean = trailing.iter().sum::<f32>() / trailing.len() as f32;
            if mean > 0.7 {
                rate *= 0.7;
            }
        }
        rate
    }

    /// Trait-targeted mutation using the adaptive weight table
    pub fn intelligent_mutation<R: Rng>(&self, genome: &mut Genome, rate: f32, rng: &mut R) {
        genome.mutate_weighted(rate, &self.weights, rng);
    }

    /// Rolling correlation samples for one trait, oldest first
    pub fn correlation_samples(&self, trait_id: TraitId) -> Vec<f32> {
        self.correlation_log
            .get(&trait_id)
            .map(|d| d.iter().copied().collect())
            .unwrap_or_default()
    }
}

/// Survivor-vs-casualty mean difference normalized by their sum. Empty
/// groups contribute a mean of 0; a zero-sum denominator falls back to 1.
fn trait_correlation(trait_id: TraitId, survivors: &[&Organism], casualties: &[&Organism]) -> f32 {
    let mean = |group: &[&Organism]| {
        if group.is_empty() {
            0.0
        } else {
            group.iter().map(|o| o.genome.get(trait_id)).sum::<f32>() / group.len() as f32
        }
    };

    let mean_s = mean(survivors);
    let mean_c = mean(casualties);
    let sum = mean_s + mean_c;
    let denominator = if sum.abs() < f32::EPSILON { 1.0 } else { sum };

    ((mean_s - mean_c) / denominator).clamp(-1.0, 1.0)
}
