//! Organism physiology and the per-tick update contract.

use crate::ai::{
    BehavioralBrain, InstinctLayer, ProximitySystem, ResourceForecaster, ThreatPredictor,
};
use crate::config::{Config, OrganismConfig};
use crate::environment::{AgentSnapshot, Environment};
use crate::genome::Genome;
use crate::memory::OrganismMemory;
use serde::{Deserialize, Serialize};

/// Unique organism identifier
pub type OrganismId = u64;

/// Temperature at which no thermal stress applies
const COMFORT_TEMPERATURE: f32 = 20.0;

/// Exhaustion urgency above which the organism rests instead of acting
const REST_THRESHOLD: f32 = 0.8;

/// Danger zone radius recorded at a death site
const DEATH_ZONE_RADIUS: f32 = 40.0;

/// Shared-state effects an organism asks the orchestrator to apply.
///
/// Predation removes a different organism than the one being updated, so
/// strikes are returned as intents and resolved sequentially against the
/// live population.
#[derive(Debug, Clone, Copy, Default)]
pub struct TickIntent {
    /// Prey this organism reached striking distance of
    pub strike: Option<OrganismId>,
}

/// One simulated agent: physiology plus an owned genome, bounded memory,
/// and a behavioral brain. The stateless awareness modules are called as
/// free functions each tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organism {
    pub id: OrganismId,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub energy: f32,
    pub max_energy: f32,
    pub age: f32,
    pub alive: bool,
    /// Recomputed from counters, never accumulated
    pub fitness: f32,
    pub food_collected: u32,
    pub kills: u32,
    pub genome: Genome,
    pub memory: OrganismMemory,
    pub brain: BehavioralBrain,
}

impl Organism {
    pub fn new(id: OrganismId, x: f32, y: f32, genome: Genome, config: &OrganismConfig) -> Self {
        let memory = OrganismMemory::new(
            config.memory_positions,
            config.food_bucket_size,
            config.food_buckets,
        );
        let brain = BehavioralBrain::new(config.commitment_ticks);
        Self {
            id,
            x,
            y,
            vx: 0.0,
            vy: 0.0,
            energy: config.initial_energy,
            max_energy: config.max_energy,
            age: 0.0,
            alive: true,
            fitness: 0.0,
            food_collected: 0,
            kills: 0,
            genome,
            memory,
            brain,
        }
    }

    /// Advance one tick. Ordered contract:
    ///
    /// 1. no-op when dead
    /// 2. age
    /// 3. reflex evaluation
    /// 4. exhaustion rest gate (skips deliberation)
    /// 5. food-contact fast path (skips deliberation, stays on the item)
    /// 6. behavior arbitration + situational avoidance impulses
    /// 7. position integration with boundary bounce
    /// 8. memory write
    /// 9. metabolic cost
    /// 10. starvation death + danger zone at the site
    /// 11. food collection (applied by the orchestrator, unconditionally)
    /// 12. predation seek; contact becomes a strike intent
    pub fn update(
        &mut self,
        env: &Environment,
        others: &[AgentSnapshot],
        tick: u64,
        dt: f32,
        config: &Config,
    ) -> TickIntent {
        let mut intent = TickIntent::default();
        if !self.alive {
            return intent;
        }

        self.age += dt;

        let instincts = InstinctLayer::evaluate(self, env, others);
        let energy_frac = (self.energy / self.max_energy).clamp(0.0, 1.0);

        if instincts.exhaustion > REST_THRESHOLD {
            // Rest: bleed off velocity, no deliberate behavior this tick.
            self.vx *= 0.3;
            self.vy *= 0.3;
        } else if instincts.food_contact > 0.0 {
            // Already touching food; hold position for the collection pass.
            self.vx *= 0.5;
            self.vy *= 0.5;
        } else {
            let proximity = ProximitySystem::survey(self, env, others);
            let behavior =
                self.brain
                    .arbitrate(tick, &self.genome, energy_frac, &instincts, &proximity);

            let mut rng = rand::thread_rng();
            let (mut tvx, mut tvy) = behavior.steering(self, env, others, &proximity, &mut rng);

            // Avoidance impulses from the predictive layer.
            let metabolic = self.metabolic_rate(env.temperature, &config.organisms);
            let forecast = ThreatPredictor::forecast(
                self,
                env,
                others,
                config.organisms.threat_horizon,
                metabolic,
            );
            if forecast.boundary_severity > 0.4 {
                let (ax, ay) = steer_toward(
                    self.x,
                    self.y,
                    env.width * 0.5,
                    env.height * 0.5,
                    self.genome.speed * forecast.boundary_severity,
                );
                tvx += ax;
                tvy += ay;
            }
            if let Some((other_id, severity)) = forecast.collision {
                if severity > 0.3 {
                    if let Some(other) = others.iter().find(|o| o.id == other_id) {
                        let (ax, ay) = steer_toward(
                            other.x,
                            other.y,
                            self.x,
                            self.y,
                            self.genome.speed * severity,
                        );
                        tvx += ax;
                        tvy += ay;
                    }
                }
            }
            if let Some(zone) = self.memory.nearest_danger(self.x, self.y, tick) {
                let (ax, ay) =
                    steer_toward(zone.x, zone.y, self.x, self.y, self.genome.speed * 0.8);
                tvx += ax;
                tvy += ay;
            }

            // On a depleted reserve the forecaster's optimal path wins over
            // whatever the brain picked.
            if energy_frac < config.organisms.low_energy_fraction {
                let cost = config.organisms.move_metabolism / self.genome.efficiency;
                if let Some(plan) = ResourceForecaster::plan(self, env, cost) {
                    let (px, py) =
                        steer_toward(self.x, self.y, plan.x, plan.y, self.genome.speed);
                    tvx = px;
                    tvy = py;
                }
            }

            // Clamp the request to trait speed, then blend for inertia.
            let mag = tvx.hypot(tvy);
            if mag > self.genome.speed {
                let scale = self.genome.speed / mag;
                tvx *= scale;
                tvy *= scale;
            }
            self.vx = self.vx * 0.5 + tvx * 0.5;
            self.vy = self.vy * 0.5 + tvy * 0.5;
        }

        self.integrate(env, dt, config.world.boundary_margin);
        self.memory.record_position(self.x, self.y);

        let cost = self.metabolic_rate(env.temperature, &config.organisms) * dt;
        self.energy -= cost;
        if self.energy <= 0.0 {
            self.alive = false;
            self.memory.record_danger(
                self.x,
                self.y,
                DEATH_ZONE_RADIUS,
                tick + config.organisms.danger_zone_ttl,
            );
            return intent;
        }

        // Predation drive: carnivores and the highly aggressive hunt the
        // nearest organism no more than 20% larger than themselves.
        if self.genome.diet > 0.6 || self.genome.aggression > 5.0 {
            if let Some(prey) = self.nearest_prey(others) {
                let (hvx, hvy) = steer_toward(self.x, self.y, prey.x, prey.y, self.genome.speed);
                self.vx = hvx;
                self.vy = hvy;

                let dist = (prey.x - self.x).hypot(prey.y - self.y);
                if dist < (self.genome.size + prey.size) * 0.5 {
                    intent.strike = Some(prey.id);
                }
            }
        }

        intent
    }

    /// Per-tick energy burn at the given ambient temperature
    pub fn metabolic_rate(&self, temperature: f32, config: &OrganismConfig) -> f32 {
        let speed = self.vx.hypot(self.vy);
        let base = config.base_metabolism
            + self.genome.size * config.size_metabolism
            + speed * config.move_metabolism;
        let thermal = (temperature - COMFORT_TEMPERATURE).abs() * config.temperature_stress;
        let surcharge = if self.genome.diet > 0.6 {
            self.genome.aggression * config.carnivore_surcharge
        } else {
            0.0
        };
        base / self.genome.efficiency + thermal + surcharge
    }

    /// Add energy, capped above
    pub fn gain_energy(&mut self, amount: f32) {
        self.energy = (self.energy + amount).min(self.max_energy);
    }

    /// Predation win test: attacker leverage beats defender leverage
    pub fn overpowers(&self, defender_size: f32, defender_speed: f32) -> bool {
        let attack = self.genome.size * (1.0 + self.genome.aggression / 10.0);
        let defense = defender_size * (1.0 + defender_speed / 10.0);
        attack > defense
    }

    /// Fitness from lifetime counters: food collected, survival time,
    /// remaining energy, and a kill bonus. Pure; nothing is accumulated.
    pub fn current_fitness(&self) -> f32 {
        self.food_collected as f32 * 10.0
            + self.age * 0.1
            + self.energy.max(0.0) * 0.5
            + self.kills as f32 * 25.0
    }

    /// Recompute and store fitness
    pub fn compute_fitness(&mut self) -> f32 {
        self.fitness = self.current_fitness();
        self.fitness
    }

    /// Euclidean distance to another organism
    pub fn distance_to(&self, other: &Organism) -> f32 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    fn integrate(&mut self, env: &Environment, dt: f32, margin: f32) {
        self.x += self.vx * dt;
        self.y += self.vy * dt;

        // Bounce, not wrap: reflect the violating component and clamp to
        // the margin.
        if self.x < margin {
            self.x = margin;
            self.vx = -self.vx;
        } else if self.x > env.width - margin {
            self.x = env.width - margin;
            self.vx = -self.vx;
        }
        if self.y < margin {
            self.y = margin;
            self.vy = -self.vy;
        } else if self.y > env.height - margin {
            self.y = env.height - margin;
            self.vy = -self.vy;
        }
    }

    fn nearest_prey<'a>(&self, others: &'a [AgentSnapshot]) -> Option<&'a AgentSnapshot> {
        others
            .iter()
            .filter(|o| o.id != self.id && o.is_prey_for(self.genome.size))
            .map(|o| (o, (o.x - self.x).hypot(o.y - self.y)))
            .filter(|&(_, d)| d <= self.genome.vision)
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(o, _)| o)
    }
}

/// Unit-vector steering from one point toward another at the given speed
fn steer_toward(from_x: f32, from_y: f32, to_x: f32, to_y: f32, speed: f32) -> (f32, f32) {
    let dx = to_x - from_x;
    let dy = to_y - from_y;
    let dist = dx.hypot(dy);
    if dist < 1e-3 {
        return (0.0, 0.0);
    }
    (dx / dist * speed, dy / dist * speed)
}
