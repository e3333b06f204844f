//! Simulation orchestrator: tick loop, generation turnover, interventions
//! and constraint setters.

use crate::config::Config;
use crate::ecosystem::EcosystemIntelligence;
use crate::environment::{snapshot_population, Environment};
use crate::events::{self, WorldEvent};
use crate::evolution::{EvolutionIntelligence, GenerationRecord};
use crate::genome::{Genome, TraitId};
use crate::organism::{Organism, OrganismId, TickIntent};
use crate::stats::{SimulationStats, TraitAverages};
use log::{debug, info};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

/// Whether driven ticks advance the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Running,
    Paused,
}

/// The simulation: owns the environment, the population, and one instance
/// each of the generation-scoped controllers. Single-threaded stepping;
/// one `step()` call advances exactly one tick.
pub struct Simulation {
    pub config: Config,
    pub environment: Environment,
    pub organisms: Vec<Organism>,
    pub evolution: EvolutionIntelligence,
    pub ecosystem: EcosystemIntelligence,
    state: RunState,
    tick: u64,
    generation: u32,
    generation_tick: u64,
    next_id: OrganismId,
    rng: ChaCha8Rng,
    seed: u64,
}

impl Simulation {
    /// Create a simulation with a random seed
    pub fn new(config: Config) -> Self {
        let seed = rand::thread_rng().gen();
        Self::new_with_seed(config, seed)
    }

    /// Create a simulation with a specific seed for reproducible spawning,
    /// selection, and events
    pub fn new_with_seed(config: Config, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut environment = Environment::new(&config.world);
        environment.reset_food(&mut rng);

        let mut organisms = Vec::with_capacity(config.safety.max_population);
        let mut next_id = 0u64;
        for _ in 0..config.organisms.initial_population {
            let genome = Genome::random(&mut rng);
            let x = rng.gen_range(0.0..config.world.width);
            let y = rng.gen_range(0.0..config.world.height);
            organisms.push(Organism::new(next_id, x, y, genome, &config.organisms));
            next_id += 1;
        }

        Self {
            config,
            environment,
            organisms,
            evolution: EvolutionIntelligence::new(),
            ecosystem: EcosystemIntelligence::new(),
            state: RunState::Running,
            tick: 0,
            generation: 0,
            generation_tick: 0,
            next_id,
            rng,
            seed,
        }
    }

    /// Advance exactly one tick. A no-op while paused.
    ///
    /// Per-organism self-updates run in parallel against a frozen snapshot
    /// of the live population; mutations of the shared food and organism
    /// lists (collection, predation) are applied in a sequential pass.
    pub fn step(&mut self) {
        if self.state == RunState::Paused {
            return;
        }

        self.environment.advance(&mut self.rng);

        let snapshots = snapshot_population(&self.organisms);
        let tick = self.tick;
        let dt = self.config.world.tick_dt;
        let env = &self.environment;
        let config = &self.config;

        let intents: Vec<TickIntent> = self
            .organisms
            .par_iter_mut()
            .map(|org| org.update(env, &snapshots, tick, dt, config))
            .collect();

        self.resolve_shared_state(&intents);

        self.tick += 1;
        self.generation_tick += 1;

        if self.generation_tick >= self.config.evolution.generation_ticks
            || self.alive_count() == 0
        {
            self.next_generation();
        }
    }

    /// Drive multiple consecutive ticks (a "speed multiplier")
    pub fn run(&mut self, ticks: u64) {
        for _ in 0..ticks {
            self.step();
        }
    }

    /// Sequential pass over shared mutable structures: unconditional food
    /// collection, then predation strikes against the live list.
    fn resolve_shared_state(&mut self, intents: &[TickIntent]) {
        for i in 0..self.organisms.len() {
            if !self.organisms[i].alive {
                continue;
            }

            let (x, y, reach) = {
                let org = &self.organisms[i];
                (org.x, org.y, org.genome.size)
            };
            if let Some((energy, fx, fy)) = self.environment.collect_food_at(x, y, reach) {
                let org = &mut self.organisms[i];
                org.gain_energy(energy);
                org.food_collected += 1;
                org.memory.record_food(fx, fy);
            }

            if let Some(prey_id) = intents[i].strike {
                self.resolve_strike(i, prey_id);
            }
        }
    }

    /// Resolve one predation strike: the attacker wins iff its size
    /// leverage beats the defender's, taking 50% of the defender's energy
    /// and a kill.
    fn resolve_strike(&mut self, attacker: usize, prey_id: OrganismId) {
        let Some(defender) = self
            .organisms
            .iter()
            .position(|o| o.id == prey_id && o.alive)
        else {
            return;
        };
        if defender == attacker || !self.organisms[attacker].alive {
            return;
        }

        let (dx, dy, d_size, d_speed, d_energy) = {
            let d = &self.organisms[defender];
            (d.x, d.y, d.genome.size, d.genome.speed, d.energy)
        };

        // Re-check contact against live positions; both parties moved
        // since the intent was formed.
        let a = &self.organisms[attacker];
        let dist = (dx - a.x).hypot(dy - a.y);
        if dist >= a.genome.size + d_size {
            return;
        }

        if a.overpowers(d_size, d_speed) {
            self.organisms[defender].alive = false;
            let attacker_org = &mut self.organisms[attacker];
            attacker_org.gain_energy(d_energy.max(0.0) * 0.5);
            attacker_org.kills += 1;
        }
    }

    /// Generation turnover: analyze outcomes, adapt policy, breed the next
    /// population from the weighted parent pool, reset food.
    pub fn next_generation(&mut self) {
        for org in &mut self.organisms {
            org.compute_fitness();
        }

        let analysis = self.evolution.analyze_generation(&self.organisms);
        self.evolution.update_environmental_pressures(&analysis);
        self.evolution.update_trait_weights(&analysis);

        let report = self
            .ecosystem
            .analyze_ecosystem(&self.organisms, &self.environment);
        self.ecosystem.update_ecosystem_state(&report);

        self.organisms.sort_by(|a, b| {
            b.fitness
                .partial_cmp(&a.fitness)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let best_fitness = self.organisms.first().map(|o| o.fitness).unwrap_or(0.0);
        let avg_fitness = if self.organisms.is_empty() {
            0.0
        } else {
            self.organisms.iter().map(|o| o.fitness).sum::<f32>() / self.organisms.len() as f32
        };
        self.evolution.record_generation(GenerationRecord {
            generation: self.generation,
            population: self.organisms.len(),
            survival_rate: analysis.survival_rate,
            avg_fitness,
            best_fitness,
            deaths: analysis.deaths,
        });

        info!(
            "generation {} over: survival {:.0}%, deaths {:?}, phase {:?}",
            self.generation,
            analysis.survival_rate * 100.0,
            analysis.deaths,
            self.ecosystem.state.phase,
        );

        let prior_size = self.organisms.len();
        let rate = self
            .evolution
            .adaptive_mutation_rate(self.config.evolution.mutation_rate);

        let next = {
            let parents = self
                .evolution
                .select_parents(&self.organisms, self.config.evolution.selection_pressure);
            debug!(
                "breeding pool {} of {}, mutation rate {:.3}",
                parents.len(),
                prior_size,
                rate
            );

            let mut next = Vec::with_capacity(prior_size);
            while !parents.is_empty() && next.len() < prior_size {
                let a = parents[self.rng.gen_range(0..parents.len())];
                let b = parents[self.rng.gen_range(0..parents.len())];
                let mut genome = Genome::crossover(&a.genome, &b.genome, &mut self.rng);
                self.evolution
                    .intelligent_mutation(&mut genome, rate, &mut self.rng);

                let x = self.rng.gen_range(0.0..self.config.world.width);
                let y = self.rng.gen_range(0.0..self.config.world.height);
                next.push(Organism::new(self.next_id, x, y, genome, &self.config.organisms));
                self.next_id += 1;
            }
            next
        };

        self.organisms = next;
        self.generation += 1;
        self.generation_tick = 0;
        self.environment.reset_food(&mut self.rng);
    }

    // ------------------------------------------------------------------
    // Interventions (synchronous, immediate)
    // ------------------------------------------------------------------

    /// Duplicate an organism's genome into a fresh organism at the same
    /// position: energy reset to the initial value, empty memory and AI
    /// state. Returns the new id.
    pub fn clone_organism(&mut self, id: OrganismId) -> Option<OrganismId> {
        let source = self.organisms.iter().find(|o| o.id == id)?;
        let (genome, x, y) = (source.genome.clone(), source.x, source.y);

        let new_id = self.next_id;
        self.next_id += 1;
        self.organisms
            .push(Organism::new(new_id, x, y, genome, &self.config.organisms));
        info!("cloned organism {id} as {new_id}");
        Some(new_id)
    }

    /// Run one extra mutation pass at the caller's chosen intensity
    pub fn mutate_organism(&mut self, id: OrganismId, intensity: f32) -> bool {
        let Some(org) = self.organisms.iter_mut().find(|o| o.id == id) else {
            return false;
        };
        org.genome.mutate(intensity, &mut self.rng);
        true
    }

    /// Remove an organism from the population entirely
    pub fn eliminate(&mut self, id: OrganismId) -> bool {
        let before = self.organisms.len();
        self.organisms.retain(|o| o.id != id);
        self.organisms.len() < before
    }

    /// Force-set a trait. Gene editing costs mutation stability: the
    /// stability trait is scaled down as the editing toll.
    pub fn edit_gene(&mut self, id: OrganismId, trait_id: TraitId, value: f32) -> bool {
        let Some(org) = self.organisms.iter_mut().find(|o| o.id == id) else {
            return false;
        };
        org.genome.set(trait_id, value);
        let penalized = org.genome.stability * 0.8;
        org.genome.set(TraitId::Stability, penalized);
        true
    }

    /// Apply a global shock event
    pub fn trigger_event(&mut self, event: WorldEvent) {
        info!("event: {}", event.name());
        events::apply(
            event,
            &mut self.organisms,
            &mut self.environment,
            &mut self.evolution,
            &mut self.rng,
        );
    }

    // ------------------------------------------------------------------
    // Constraint setters (mission-style direct assignment)
    // ------------------------------------------------------------------

    pub fn set_mutation_rate(&mut self, rate: f32) {
        self.config.evolution.mutation_rate = rate.clamp(0.0, 1.0);
    }

    pub fn set_selection_pressure(&mut self, pressure: f32) {
        self.config.evolution.selection_pressure = pressure.clamp(0.0, 1.0);
    }

    pub fn set_food_abundance(&mut self, target: usize) {
        let capped = target.min(self.config.safety.max_food);
        self.environment.food_target = capped;
        self.config.world.food_target = capped;
    }

    pub fn set_temperature(&mut self, temperature: f32) {
        self.environment.temperature = temperature;
        self.config.world.temperature = temperature;
    }

    /// Keep only the `n` fittest organisms
    pub fn truncate_population(&mut self, n: usize) {
        for org in &mut self.organisms {
            org.compute_fitness();
        }
        self.organisms.sort_by(|a, b| {
            b.fitness
                .partial_cmp(&a.fitness)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        self.organisms.truncate(n);
    }

    // ------------------------------------------------------------------
    // Read access
    // ------------------------------------------------------------------

    pub fn pause(&mut self) {
        self.state = RunState::Paused;
    }

    pub fn resume(&mut self) {
        self.state = RunState::Running;
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn alive_count(&self) -> usize {
        self.organisms.iter().filter(|o| o.alive).count()
    }

    pub fn is_extinct(&self) -> bool {
        self.alive_count() == 0
    }

    pub fn organisms(&self) -> &[Organism] {
        &self.organisms
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Build a stats snapshot for external consumers
    pub fn stats(&self) -> SimulationStats {
        SimulationStats {
            tick: self.tick,
            generation: self.generation,
            population: self.organisms.len(),
            alive: self.alive_count(),
            avg_fitness: SimulationStats::mean_fitness(&self.organisms),
            best_fitness: SimulationStats::best_fitness(&self.organisms),
            food_count: self.environment.food.len(),
            trait_averages: TraitAverages::of(&self.organisms),
            ecosystem: self.ecosystem.state,
            pressures: self.evolution.pressures,
            adaptive_weights: self.evolution.weights.clone(),
            behaviors: SimulationStats::behavior_histogram(&self.organisms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        let mut config = Config::default();
        config.organisms.initial_population = 30;
        config.evolution.generation_ticks = 200;
        config
    }

    #[test]
    fn test_simulation_creation() {
        let config = test_config();
        let sim = Simulation::new_with_seed(config.clone(), 7);

        assert_eq!(sim.alive_count(), config.organisms.initial_population);
        assert_eq!(sim.generation(), 0);
        assert_eq!(sim.tick(), 0);
        assert_eq!(sim.environment.food.len(), config.world.initial_food);
    }

    #[test]
    fn test_step_advances_one_tick() {
        let mut sim = Simulation::new_with_seed(test_config(), 8);
        sim.step();
        assert_eq!(sim.tick(), 1);
    }

    #[test]
    fn test_pause_stops_ticks() {
        let mut sim = Simulation::new_with_seed(test_config(), 9);
        sim.pause();
        sim.run(10);
        assert_eq!(sim.tick(), 0);

        sim.resume();
        sim.run(10);
        assert_eq!(sim.tick(), 10);
    }

    #[test]
    fn test_generation_turnover_restores_population() {
        let config = test_config();
        let prior = config.organisms.initial_population;
        let mut sim = Simulation::new_with_seed(config.clone(), 10);

        sim.run(config.evolution.generation_ticks);
        assert_eq!(sim.generation(), 1);
        assert_eq!(sim.organisms().len(), prior);
        assert!(sim.organisms().iter().all(|o| o.alive));
        assert_eq!(sim.environment.food.len(), config.world.initial_food);
    }

    #[test]
    fn test_clone_intervention() {
        let mut sim = Simulation::new_with_seed(test_config(), 11);
        let source_id = sim.organisms()[0].id;
        sim.organisms[0].energy = 42.0;

        let clone_id = sim.clone_organism(source_id).unwrap();
        let source = sim.organisms().iter().find(|o| o.id == source_id).unwrap();
        let clone = sim.organisms().iter().find(|o| o.id == clone_id).unwrap();

        assert_eq!(clone.genome, source.genome);
        assert_eq!(clone.energy, sim.config.organisms.initial_energy);
        assert_eq!(clone.age, 0.0);
        assert_eq!(clone.food_collected, 0);
    }

    #[test]
    fn test_eliminate_intervention() {
        let mut sim = Simulation::new_with_seed(test_config(), 12);
        let victim = sim.organisms()[5].id;
        let before = sim.organisms().len();

        assert!(sim.eliminate(victim));
        assert_eq!(sim.organisms().len(), before - 1);
        assert!(sim.organisms().iter().all(|o| o.id != victim));
        assert!(!sim.eliminate(victim));
    }

    #[test]
    fn test_edit_gene_costs_stability() {
        let mut sim = Simulation::new_with_seed(test_config(), 13);
        let id = sim.organisms()[0].id;
        let stability_before = sim.organisms()[0].genome.stability;

        assert!(sim.edit_gene(id, TraitId::Speed, 99.0));
        let org = sim.organisms().iter().find(|o| o.id == id).unwrap();

        // Forced values clamp to the trait domain.
        assert_eq!(org.genome.speed, 5.0);
        assert!((org.genome.stability - stability_before * 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_constraint_setters() {
        let mut sim = Simulation::new_with_seed(test_config(), 14);

        sim.set_mutation_rate(3.0);
        assert_eq!(sim.config.evolution.mutation_rate, 1.0);

        sim.set_food_abundance(10_000);
        assert_eq!(sim.environment.food_target, sim.config.safety.max_food);

        sim.set_temperature(-5.0);
        assert_eq!(sim.environment.temperature, -5.0);

        sim.truncate_population(10);
        assert_eq!(sim.organisms().len(), 10);
    }

    #[test]
    fn test_extinction_triggers_turnover() {
        let mut config = test_config();
        // No food at all: everyone starves well inside one generation.
        config.world.initial_food = 0;
        config.world.food_target = 0;
        config.evolution.generation_ticks = 100_000;

        let mut sim = Simulation::new_with_seed(config, 15);
        sim.run(2000);

        // Turnover fired on the extinction tick and rebuilt a population
        // from the casualties' genomes.
        assert!(sim.generation() >= 1);
        assert!(sim.alive_count() > 0);
    }

    #[test]
    fn test_stats_snapshot() {
        let mut sim = Simulation::new_with_seed(test_config(), 16);
        sim.run(50);

        let stats = sim.stats();
        assert_eq!(stats.tick, 50);
        assert_eq!(stats.population, sim.organisms().len());
        assert!(stats.alive <= stats.population);
        assert!(stats.trait_averages.speed > 0.0);
    }
}
