//! Global shock events: population-wide interventions with immediate,
//! synchronous effect.

use crate::ai::Behavior;
use crate::environment::Environment;
use crate::evolution::EvolutionIntelligence;
use crate::genome::TraitId;
use crate::organism::Organism;
use rand::Rng;

/// Minimum energy a plague leaves an organism with
const PLAGUE_FLOOR: f32 = 10.0;

/// Fraction of the population a meteor fires kill attempts at
const METEOR_FRACTION: f32 = 0.3;

/// Efficiency multiplier applied by an ice age
const ICE_AGE_EFFICIENCY: f32 = 0.7;

/// A global shock applied to the whole simulation at once
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorldEvent {
    /// Kills a random 30% of the population
    Meteor,
    /// Scales every organism's metabolic efficiency down and cools the arena
    IceAge,
    /// Floods the arena with extra food
    Abundance,
    /// Halves every live organism's energy, floored
    Plague,
}

impl WorldEvent {
    pub fn name(self) -> &'static str {
        match self {
            WorldEvent::Meteor => "meteor",
            WorldEvent::IceAge => "ice_age",
            WorldEvent::Abundance => "abundance",
            WorldEvent::Plague => "plague",
        }
    }
}

/// Apply a shock. Each event also nudges the adaptive weight table toward
/// the traits the shock rewards, and live-patches the survivors' behavior
/// override tables.
pub fn apply<R: Rng>(
    event: WorldEvent,
    organisms: &mut [Organism],
    env: &mut Environment,
    evolution: &mut EvolutionIntelligence,
    rng: &mut R,
) {
    match event {
        WorldEvent::Meteor => {
            // floor(N * 0.3) kill attempts at random indices. Duplicate
            // indices may hit an already-dead organism, so net new deaths
            // can be fewer than attempts; that is the contract, not a bug.
            let attempts = (organisms.len() as f32 * METEOR_FRACTION).floor() as usize;
            for _ in 0..attempts {
                if organisms.is_empty() {
                    break;
                }
                let idx = rng.gen_range(0..organisms.len());
                organisms[idx].alive = false;
            }
            evolution.weights.nudge(TraitId::Speed, 0.05);
            for org in organisms.iter_mut().filter(|o| o.alive) {
                org.brain.boost(Behavior::Explore, 1.3);
            }
        }
        WorldEvent::IceAge => {
            env.temperature -= 12.0;
            for org in organisms.iter_mut().filter(|o| o.alive) {
                let scaled = org.genome.efficiency * ICE_AGE_EFFICIENCY;
                org.genome.set(TraitId::Efficiency, scaled);
                org.brain.boost(Behavior::Conserve, 1.5);
            }
            evolution.weights.nudge(TraitId::Efficiency, 0.1);
        }
        WorldEvent::Abundance => {
            env.spawn_food(env.food_target, rng);
            evolution.weights.nudge(TraitId::Vision, 0.05);
            for org in organisms.iter_mut().filter(|o| o.alive) {
                org.brain.boost(Behavior::SeekFood, 1.2);
            }
        }
        WorldEvent::Plague => {
            for org in organisms.iter_mut().filter(|o| o.alive) {
                org.energy = (org.energy * 0.5).max(PLAGUE_FLOOR);
                org.brain.boost(Behavior::Conserve, 1.3);
            }
            evolution.weights.nudge(TraitId::Efficiency, 0.05);
        }
    }
}
