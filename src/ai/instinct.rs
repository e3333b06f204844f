//! Reflex layer - immediate situational signals, evaluated before any
//! deliberate behavior.

use crate::environment::{AgentSnapshot, Environment};
use crate::organism::Organism;

/// Energy fraction below which the critical-energy reflex fires
const CRITICAL_ENERGY_FRACTION: f32 = 0.15;

/// Reflex signals, each with an urgency in [0, 1]. Zero means absent.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InstinctSignals {
    /// Energy critically low; overrides normal foraging priorities
    pub critical_energy: f32,
    /// Food item within body contact distance right now
    pub food_contact: f32,
    /// Sustained effort on a depleted reserve; demands rest
    pub exhaustion: f32,
    /// A capable predator is close
    pub immediate_threat: f32,
    /// Energy surplus with a potential mate in sight
    pub breeding: f32,
}

/// Stateless reflex evaluator
pub struct InstinctLayer;

impl InstinctLayer {
    /// Evaluate all reflex signals for one organism
    pub fn evaluate(
        org: &Organism,
        env: &Environment,
        others: &[AgentSnapshot],
    ) -> InstinctSignals {
        let energy_frac = (org.energy / org.max_energy).clamp(0.0, 1.0);

        let critical_energy = if energy_frac < CRITICAL_ENERGY_FRACTION {
            1.0 - energy_frac / CRITICAL_ENERGY_FRACTION
        } else {
            0.0
        };

        let food_contact = match env.nearest_food(org.x, org.y, org.genome.size) {
            Some(_) => 1.0,
            None => 0.0,
        };

        // Effort-weighted depletion: flat-out movement on an empty reserve
        // approaches 1.0, idling never does.
        let effort = (org.vx.hypot(org.vy) / org.genome.speed.max(0.1)).min(1.0);
        let exhaustion = (effort * (1.0 - energy_frac) * 1.2).clamp(0.0, 1.0);

        let immediate_threat = Self::threat_urgency(org, others);

        let breeding = if energy_frac > 0.6 {
            let mate_in_sight = others.iter().any(|o| {
                o.id != org.id && {
                    let d = (o.x - org.x).hypot(o.y - org.y);
                    d < org.genome.vision && !Self::is_predator_of(o, org.genome.size)
                }
            });
            if mate_in_sight {
                ((energy_frac - 0.6) / 0.4).clamp(0.0, 1.0)
            } else {
                0.0
            }
        } else {
            0.0
        };

        InstinctSignals {
            critical_energy,
            food_contact,
            exhaustion,
            immediate_threat,
            breeding,
        }
    }

    fn threat_urgency(org: &Organism, others: &[AgentSnapshot]) -> f32 {
        others
            .iter()
            .filter(|o| o.id != org.id && Self::is_predator_of(o, org.genome.size))
            .map(|o| {
                let dist = (o.x - org.x).hypot(o.y - org.y);
                (1.0 - dist / org.genome.vision).clamp(0.0, 1.0)
            })
            .fold(0.0, f32::max)
    }

    /// A neighbor is a predator threat when it is carnivorous or highly
    /// aggressive and large enough that we would be prey for it.
    fn is_predator_of(other: &AgentSnapshot, own_size: f32) -> bool {
        (other.diet > 0.6 || other.aggression > 5.0) && own_size <= other.size * 1.2
    }
}
