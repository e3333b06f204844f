//! Bounded arena, food population, and per-tick agent snapshots.

use crate::config::WorldConfig;
use crate::organism::{Organism, OrganismId};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A food item in the arena. Removed atomically on first contact.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Food {
    pub x: f32,
    pub y: f32,
    pub energy: f32,
    pub radius: f32,
}

/// Frozen per-tick view of one live organism, used for social and
/// predation queries while the population is being mutated.
#[derive(Debug, Clone, Copy)]
pub struct AgentSnapshot {
    pub id: OrganismId,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub size: f32,
    pub speed: f32,
    pub energy: f32,
    pub aggression: f32,
    pub diet: f32,
}

impl AgentSnapshot {
    pub fn of(org: &Organism) -> Self {
        Self {
            id: org.id,
            x: org.x,
            y: org.y,
            vx: org.vx,
            vy: org.vy,
            size: org.genome.size,
            speed: org.genome.speed,
            energy: org.energy,
            aggression: org.genome.aggression,
            diet: org.genome.diet,
        }
    }

    /// True when this agent would treat `size` as prey (no more than 20%
    /// larger than itself)
    pub fn is_prey_for(&self, hunter_size: f32) -> bool {
        self.size <= hunter_size * 1.2
    }
}

/// Freeze the live population into snapshots. Dead organisms are excluded:
/// alive is a hard gate on every social and predation query.
pub fn snapshot_population(organisms: &[Organism]) -> Vec<AgentSnapshot> {
    organisms
        .iter()
        .filter(|o| o.alive)
        .map(AgentSnapshot::of)
        .collect()
}

/// The bounded arena: food population with target-based replenishment and
/// an optional temperature field.
#[derive(Debug, Clone)]
pub struct Environment {
    pub width: f32,
    pub height: f32,
    pub food: Vec<Food>,
    pub temperature: f32,
    /// Food population the replenisher steers toward
    pub food_target: usize,
    initial_food: usize,
    food_energy: f32,
    food_radius: f32,
    replenish_per_tick: usize,
}

impl Environment {
    pub fn new(config: &WorldConfig) -> Self {
        Self {
            width: config.width,
            height: config.height,
            food: Vec::with_capacity(config.food_target * 2),
            temperature: config.temperature,
            food_target: config.food_target,
            initial_food: config.initial_food,
            food_energy: config.food_energy,
            food_radius: config.food_radius,
            replenish_per_tick: config.food_replenish_per_tick,
        }
    }

    /// Advance the environment one tick: spawn food toward the target
    /// count, bounded by the per-tick replenishment rate.
    pub fn advance<R: Rng>(&mut self, rng: &mut R) {
        let deficit = self.food_target.saturating_sub(self.food.len());
        let spawn = deficit.min(self.replenish_per_tick);
        self.spawn_food(spawn, rng);
    }

    /// Spawn `count` food items at random positions
    pub fn spawn_food<R: Rng>(&mut self, count: usize, rng: &mut R) {
        for _ in 0..count {
            self.food.push(Food {
                x: rng.gen_range(0.0..self.width),
                y: rng.gen_range(0.0..self.height),
                energy: self.food_energy * rng.gen_range(0.7..1.3),
                radius: self.food_radius,
            });
        }
    }

    /// Reset the food population to the initial spawn count
    pub fn reset_food<R: Rng>(&mut self, rng: &mut R) {
        self.food.clear();
        self.spawn_food(self.initial_food, rng);
    }

    /// Remove and return the energy of the first food item within `reach`
    /// of the query point. The removal is atomic: a single contact consumes
    /// the whole item.
    pub fn collect_food_at(&mut self, x: f32, y: f32, reach: f32) -> Option<(f32, f32, f32)> {
        let hit = self.food.iter().position(|f| {
            let dx = f.x - x;
            let dy = f.y - y;
            (dx * dx + dy * dy).sqrt() < reach + f.radius
        })?;
        let food = self.food.swap_remove(hit);
        Some((food.energy, food.x, food.y))
    }

    /// Index and distance of the nearest food item within `within` units
    pub fn nearest_food(&self, x: f32, y: f32, within: f32) -> Option<(usize, f32)> {
        self.food
            .iter()
            .enumerate()
            .map(|(i, f)| {
                let dx = f.x - x;
                let dy = f.y - y;
                (i, (dx * dx + dy * dy).sqrt())
            })
            .filter(|&(_, d)| d <= within)
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
    }

    /// Total energy stored in uneaten food
    pub fn total_food_energy(&self) -> f32 {
        self.food.iter().map(|f| f.energy).sum()
    }

    /// Clamp a point into the arena
    pub fn clamp_point(&self, x: f32, y: f32) -> (f32, f32) {
        (x.clamp(0.0, self.width), y.clamp(0.0, self.height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorldConfig;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn env() -> Environment {
        Environment::new(&WorldConfig::default())
    }

    #[test]
    fn test_replenishment_toward_target() {
        let mut env = env();
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        assert!(env.food.is_empty());
        for _ in 0..1000 {
            env.advance(&mut rng);
        }
        assert_eq!(env.food.len(), env.food_target);

        // At the target, no further spawning.
        env.advance(&mut rng);
        assert_eq!(env.food.len(), env.food_target);
    }

    #[test]
    fn test_food_collection_is_atomic() {
        let mut env = env();
        env.food.push(Food {
            x: 100.0,
            y: 100.0,
            energy: 25.0,
            radius: 5.0,
        });

        let collected = env.collect_food_at(102.0, 100.0, 6.0);
        assert!(collected.is_some());
        assert_eq!(collected.unwrap().0, 25.0);
        assert!(env.food.is_empty());

        // Second contact finds nothing.
        assert!(env.collect_food_at(102.0, 100.0, 6.0).is_none());
    }

    #[test]
    fn test_nearest_food_respects_range() {
        let mut env = env();
        env.food.push(Food { x: 50.0, y: 50.0, energy: 20.0, radius: 5.0 });
        env.food.push(Food { x: 400.0, y: 400.0, energy: 20.0, radius: 5.0 });

        let (idx, dist) = env.nearest_food(60.0, 50.0, 100.0).unwrap();
        assert_eq!(idx, 0);
        assert!((dist - 10.0).abs() < 1e-4);

        assert!(env.nearest_food(60.0, 50.0, 5.0).is_none());
    }

    #[test]
    fn test_reset_food_restores_initial_count() {
        let mut env = env();
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        env.reset_food(&mut rng);
        let initial = env.food.len();

        env.collect_food_at(env.food[0].x, env.food[0].y, 10.0);
        env.reset_food(&mut rng);
        assert_eq!(env.food.len(), initial);
    }
}
