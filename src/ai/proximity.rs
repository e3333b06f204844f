//! Nearest-neighbor awareness - pure spatial queries, no prediction.

use crate::environment::{AgentSnapshot, Environment};
use crate::organism::Organism;

/// Nearest points of interest within an organism's vision radius.
///
/// Agent entries are `(index into the snapshot slice, distance)`; food
/// entries index the environment food list.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProximityReport {
    pub nearest_food: Option<(usize, f32)>,
    pub nearest_ally: Option<(usize, f32)>,
    pub nearest_threat: Option<(usize, f32)>,
    /// Live neighbors of any kind within vision
    pub neighbor_count: usize,
}

/// Stateless nearest-neighbor query module
pub struct ProximitySystem;

impl ProximitySystem {
    /// Survey everything within the organism's vision radius
    pub fn survey(org: &Organism, env: &Environment, others: &[AgentSnapshot]) -> ProximityReport {
        let vision = org.genome.vision;
        let nearest_food = env.nearest_food(org.x, org.y, vision);

        let mut nearest_ally: Option<(usize, f32)> = None;
        let mut nearest_threat: Option<(usize, f32)> = None;
        let mut neighbor_count = 0;

        for (idx, other) in others.iter().enumerate() {
            if other.id == org.id {
                continue;
            }
            let dist = (other.x - org.x).hypot(other.y - org.y);
            if dist > vision {
                continue;
            }
            neighbor_count += 1;

            let menacing = (other.diet > 0.6 || other.aggression > 5.0)
                && org.genome.size <= other.size * 1.2;
            let slot = if menacing {
                &mut nearest_threat
            } else {
                &mut nearest_ally
            };
            if slot.map_or(true, |(_, best)| dist < best) {
                *slot = Some((idx, dist));
            }
        }

        ProximityReport {
            nearest_food,
            nearest_ally,
            nearest_threat,
            neighbor_count,
        }
    }
}
