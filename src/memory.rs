//! Bounded per-organism spatial and temporal recall.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

/// A remembered hazardous location with an expiry tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DangerZone {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub expires_at: u64,
}

/// Bounded memory owned by a single organism.
///
/// Holds a capped FIFO of recent positions, danger zones with explicit
/// expiry, and a coarse food-density grid capped to the densest buckets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganismMemory {
    positions: VecDeque<(f32, f32)>,
    danger_zones: Vec<DangerZone>,
    food_density: HashMap<(i32, i32), u32>,
    position_cap: usize,
    bucket_size: f32,
    bucket_cap: usize,
}

impl OrganismMemory {
    pub fn new(position_cap: usize, bucket_size: f32, bucket_cap: usize) -> Self {
        Self {
            positions: VecDeque::with_capacity(position_cap),
            danger_zones: Vec::new(),
            food_density: HashMap::new(),
            position_cap,
            bucket_size,
            bucket_cap,
        }
    }

    /// Record the organism's current position, evicting the oldest entry
    /// once the cap is reached
    pub fn record_position(&mut self, x: f32, y: f32) {
        if self.positions.len() == self.position_cap {
            self.positions.pop_front();
        }
        self.positions.push_back((x, y));
    }

    /// Most recently recorded positions, oldest first
    pub fn recent_positions(&self) -> impl Iterator<Item = &(f32, f32)> {
        self.positions.iter()
    }

    /// Record a hazardous location that expires at `expires_at`
    pub fn record_danger(&mut self, x: f32, y: f32, radius: f32, expires_at: u64) {
        self.danger_zones.push(DangerZone {
            x,
            y,
            radius,
            expires_at,
        });
    }

    /// Distance to the nearest unexpired danger zone whose radius covers
    /// the query point. Expired zones are pruned on every access.
    pub fn danger_near(&mut self, x: f32, y: f32, now: u64) -> Option<f32> {
        self.danger_zones.retain(|z| z.expires_at > now);
        self.danger_zones
            .iter()
            .filter_map(|z| {
                let dist = ((z.x - x).powi(2) + (z.y - y).powi(2)).sqrt();
                (dist < z.radius).then_some(dist)
            })
            .min_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
    }

    /// The nearest unexpired danger zone covering the query point.
    /// Expired zones are pruned on every access.
    pub fn nearest_danger(&mut self, x: f32, y: f32, now: u64) -> Option<DangerZone> {
        self.danger_zones.retain(|z| z.expires_at > now);
        self.danger_zones
            .iter()
            .filter(|z| (z.x - x).hypot(z.y - y) < z.radius)
            .min_by(|a, b| {
                let da = (a.x - x).hypot(a.y - y);
                let db = (b.x - x).hypot(b.y - y);
                da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
            })
            .copied()
    }

    /// Number of unexpired danger zones
    pub fn danger_zone_count(&mut self, now: u64) -> usize {
        self.danger_zones.retain(|z| z.expires_at > now);
        self.danger_zones.len()
    }

    /// Record a food sighting, bumping the density count of its coordinate
    /// bucket. When the table exceeds its cap the lowest-density bucket is
    /// evicted.
    pub fn record_food(&mut self, x: f32, y: f32) {
        let key = self.bucket_of(x, y);
        *self.food_density.entry(key).or_insert(0) += 1;

        if self.food_density.len() > self.bucket_cap {
            let sparsest = self
                .food_density
                .iter()
                .min_by_key(|(_, &count)| count)
                .map(|(&bucket, _)| bucket);
            if let Some(bucket) = sparsest {
                self.food_density.remove(&bucket);
            }
        }
    }

    /// Center of the densest remembered food bucket
    pub fn densest_food_area(&self) -> Option<(f32, f32)> {
        self.food_density
            .iter()
            .max_by_key(|(_, &count)| count)
            .map(|(&(bx, by), _)| {
                (
                    (bx as f32 + 0.5) * self.bucket_size,
                    (by as f32 + 0.5) * self.bucket_size,
                )
            })
    }

    /// Number of tracked food buckets
    pub fn food_bucket_count(&self) -> usize {
        self.food_density.len()
    }

    fn bucket_of(&self, x: f32, y: f32) -> (i32, i32) {
        (
            (x / self.bucket_size).floor() as i32,
            (y / self.bucket_size).floor() as i32,
        )
    }
}
