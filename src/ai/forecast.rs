//! Resource forecasting - cost/benefit scoring of visible food.

use crate::environment::Environment;
use crate::organism::Organism;

/// The top-scoring feeding target, independent of whatever the behavioral
/// layer is currently chasing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeedingPlan {
    pub food_index: usize,
    pub x: f32,
    pub y: f32,
    /// Net energy per unit of travel
    pub score: f32,
}

/// Stateless feeding-route scorer
pub struct ResourceForecaster;

impl ResourceForecaster {
    /// Score every food item within vision by
    /// `(energy - distance * cost_per_unit) / distance` and return the
    /// best. Distances below 1 use a denominator of 1.
    pub fn plan(org: &Organism, env: &Environment, cost_per_unit: f32) -> Option<FeedingPlan> {
        let mut best: Option<FeedingPlan> = None;

        for (idx, food) in env.food.iter().enumerate() {
            let dist = (food.x - org.x).hypot(food.y - org.y);
            if dist > org.genome.vision {
                continue;
            }
            let denom = dist.max(1.0);
            let score = (food.energy - dist * cost_per_unit) / denom;

            if best.map_or(true, |b| score > b.score) {
                best = Some(FeedingPlan {
                    food_index: idx,
                    x: food.x,
                    y: food.y,
                    score,
                });
            }
        }

        best
    }
}
