//! Utility-based behavior arbitration with commitment hysteresis.
//!
//! Every deliberate tick scores six candidate behaviors independently and
//! picks the arg-max. Once picked, a behavior is locked for a fixed
//! commitment window so near-tied scores cannot oscillate tick-to-tick.

use crate::ai::instinct::InstinctSignals;
use crate::ai::proximity::ProximityReport;
use crate::environment::{AgentSnapshot, Environment};
use crate::genome::Genome;
use crate::organism::Organism;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The candidate behaviors, in arbitration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Behavior {
    SeekFood,
    Explore,
    Conserve,
    SeekMate,
    Territory,
    Flock,
}

impl Behavior {
    pub const ALL: [Behavior; 6] = [
        Behavior::SeekFood,
        Behavior::Explore,
        Behavior::Conserve,
        Behavior::SeekMate,
        Behavior::Territory,
        Behavior::Flock,
    ];

    /// Stable name for histograms and logs
    pub fn name(self) -> &'static str {
        match self {
            Behavior::SeekFood => "seek_food",
            Behavior::Explore => "explore",
            Behavior::Conserve => "conserve",
            Behavior::SeekMate => "seek_mate",
            Behavior::Territory => "territory",
            Behavior::Flock => "flock",
        }
    }

    /// Movement effect: the velocity this behavior asks for.
    ///
    /// Each behavior maps to one concrete effect: approach a target,
    /// speed-clamped random walk, velocity damping, or moving relative to
    /// the local crowd centroid.
    pub fn steering<R: Rng>(
        self,
        org: &Organism,
        env: &Environment,
        others: &[AgentSnapshot],
        proximity: &ProximityReport,
        rng: &mut R,
    ) -> (f32, f32) {
        let speed = org.genome.speed;
        match self {
            Behavior::SeekFood => {
                if let Some((idx, _)) = proximity.nearest_food {
                    let food = &env.food[idx];
                    approach(org.x, org.y, food.x, food.y, speed)
                } else if let Some((fx, fy)) = org.memory.densest_food_area() {
                    approach(org.x, org.y, fx, fy, speed * 0.8)
                } else {
                    wander(org.vx, org.vy, speed * 0.7, rng)
                }
            }
            Behavior::Explore => wander(org.vx, org.vy, speed * 0.8, rng),
            Behavior::Conserve => (org.vx * 0.3, org.vy * 0.3),
            Behavior::SeekMate => {
                if let Some((idx, _)) = proximity.nearest_ally {
                    let mate = &others[idx];
                    approach(org.x, org.y, mate.x, mate.y, speed * 0.8)
                } else {
                    wander(org.vx, org.vy, speed * 0.5, rng)
                }
            }
            Behavior::Territory => {
                // Hold ground: push away from the local crowd to keep the
                // claimed patch, settle when alone.
                match crowd_centroid(org, others) {
                    Some((cx, cy)) if proximity.neighbor_count >= 2 => {
                        let (tx, ty) = approach(org.x, org.y, cx, cy, speed * 0.8);
                        (-tx, -ty)
                    }
                    _ => (org.vx * 0.5, org.vy * 0.5),
                }
            }
            Behavior::Flock => match crowd_centroid(org, others) {
                Some((cx, cy)) => approach(org.x, org.y, cx, cy, speed * 0.7),
                None => wander(org.vx, org.vy, speed * 0.6, rng),
            },
        }
    }
}

/// Unit-vector approach at the given speed
fn approach(x: f32, y: f32, tx: f32, ty: f32, speed: f32) -> (f32, f32) {
    let dx = tx - x;
    let dy = ty - y;
    let dist = dx.hypot(dy);
    if dist < 1e-3 {
        return (0.0, 0.0);
    }
    (dx / dist * speed, dy / dist * speed)
}

/// Random-walk heading change, clamped to `max_speed`
fn wander<R: Rng>(vx: f32, vy: f32, max_speed: f32, rng: &mut R) -> (f32, f32) {
    let heading = vy.atan2(vx) + rng.gen_range(-0.6..0.6);
    let speed = max_speed * rng.gen_range(0.6..1.0);
    (heading.cos() * speed, heading.sin() * speed)
}

/// Centroid of live neighbors within vision
fn crowd_centroid(org: &Organism, others: &[AgentSnapshot]) -> Option<(f32, f32)> {
    let mut sx = 0.0;
    let mut sy = 0.0;
    let mut n = 0;
    for other in others {
        if other.id == org.id {
            continue;
        }
        if (other.x - org.x).hypot(other.y - org.y) <= org.genome.vision {
            sx += other.x;
            sy += other.y;
            n += 1;
        }
    }
    (n > 0).then(|| (sx / n as f32, sy / n as f32))
}

/// Utility arbitration with a commitment window.
///
/// The override table is the data-driven replacement for ad hoc runtime
/// rewrites of scoring logic: global events patch per-behavior priority
/// boosts here, and scoring consults the table every arbitration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BehavioralBrain {
    current: Behavior,
    committed_until: u64,
    commitment_ticks: u64,
    overrides: HashMap<Behavior, f32>,
}

impl BehavioralBrain {
    pub fn new(commitment_ticks: u64) -> Self {
        Self {
            current: Behavior::Explore,
            committed_until: 0,
            commitment_ticks,
            overrides: HashMap::new(),
        }
    }

    /// The currently committed behavior
    pub fn current(&self) -> Behavior {
        self.current
    }

    /// Multiply the priority boost for a behavior. Boosts compose and are
    /// clamped to [0.25, 4.0].
    pub fn boost(&mut self, behavior: Behavior, factor: f32) {
        let entry = self.overrides.entry(behavior).or_insert(1.0);
        *entry = (*entry * factor).clamp(0.25, 4.0);
    }

    /// Pick or continue a behavior. Inside the commitment window the
    /// committed behavior is returned without re-scoring.
    pub fn arbitrate(
        &mut self,
        tick: u64,
        genome: &Genome,
        energy_frac: f32,
        instincts: &InstinctSignals,
        proximity: &ProximityReport,
    ) -> Behavior {
        if tick < self.committed_until {
            return self.current;
        }

        let mut best = self.current;
        let mut best_score = f32::MIN;
        for behavior in Behavior::ALL {
            let score = self.score(behavior, genome, energy_frac, instincts, proximity);
            if score > best_score {
                best_score = score;
                best = behavior;
            }
        }

        self.current = best;
        self.committed_until = tick + self.commitment_ticks;
        best
    }

    /// Independent priority score for one behavior
    fn score(
        &self,
        behavior: Behavior,
        genome: &Genome,
        energy_frac: f32,
        instincts: &InstinctSignals,
        proximity: &ProximityReport,
    ) -> f32 {
        let deficit = (1.0 - energy_frac).clamp(0.0, 1.0);
        let efficiency_n = (genome.efficiency - 0.3) / 1.2;
        let curiosity = 1.0 - efficiency_n;
        let aggression_n = genome.aggression / 10.0;
        let size_n = (genome.size - 3.0) / 11.0;
        let density = (proximity.neighbor_count as f32 / 8.0).min(1.0);

        let avail = |slot: Option<(usize, f32)>| {
            slot.map_or(0.0, |(_, d)| (1.0 - d / genome.vision).clamp(0.0, 1.0))
        };
        let food_avail = avail(proximity.nearest_food);
        let ally_avail = avail(proximity.nearest_ally);

        let mut score = match behavior {
            Behavior::SeekFood => {
                (0.2 + deficit) * (0.4 + 0.6 * food_avail) * (0.8 + 0.4 * efficiency_n)
            }
            Behavior::Explore => {
                (0.25 + 0.75 * curiosity) * (1.0 - 0.6 * food_avail) * (1.0 - 0.4 * density)
            }
            Behavior::Conserve => 0.1 + 0.8 * deficit * deficit,
            Behavior::SeekMate => {
                let surplus = ((energy_frac - 0.6) / 0.4).clamp(0.0, 1.0);
                surplus * (0.3 + 0.7 * ally_avail)
            }
            Behavior::Territory => aggression_n * (0.4 + 0.3 * size_n) * (0.5 + 0.5 * density),
            Behavior::Flock => (1.0 - aggression_n) * ally_avail * (0.3 + 0.7 * density),
        };

        // Instinct signals boost their matching behavior multiplicatively.
        score *= match behavior {
            Behavior::SeekFood if instincts.critical_energy > 0.0 => 3.0,
            Behavior::Conserve if instincts.exhaustion > 0.0 => 5.0,
            Behavior::SeekMate if instincts.breeding > 0.0 => 2.0,
            Behavior::Flock if instincts.immediate_threat > 0.0 => 1.5,
            _ => 1.0,
        };

        score * self.overrides.get(&behavior).copied().unwrap_or(1.0)
    }
}
