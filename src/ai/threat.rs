//! Predictive hazard detection - linear extrapolation of self and
//! neighbors a fixed number of ticks ahead.

use crate::environment::{AgentSnapshot, Environment};
use crate::organism::{Organism, OrganismId};

/// Forecast of upcoming hazards for one organism
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreatForecast {
    /// Severity of a predicted arena-boundary hit, 0 when none
    pub boundary_severity: f32,
    /// Severest predicted inter-agent collision: (other id, severity)
    pub collision: Option<(OrganismId, f32)>,
    /// Ticks until the energy reserve empties at the current burn rate
    pub ticks_to_empty: f32,
}

/// Stateless linear-extrapolation forecaster
pub struct ThreatPredictor;

impl ThreatPredictor {
    /// Forecast hazards `horizon` ticks ahead assuming constant velocities.
    /// `metabolic_rate` is the organism's current per-tick energy cost.
    pub fn forecast(
        org: &Organism,
        env: &Environment,
        others: &[AgentSnapshot],
        horizon: f32,
        metabolic_rate: f32,
    ) -> ThreatForecast {
        let boundary_severity = Self::boundary_severity(org, env, horizon);
        let collision = Self::worst_collision(org, others, horizon);

        // Fallback denominator of 1 keeps a zero burn rate from faulting.
        let rate = if metabolic_rate > 0.0 { metabolic_rate } else { 1.0 };
        let ticks_to_empty = org.energy.max(0.0) / rate;

        ThreatForecast {
            boundary_severity,
            collision,
            ticks_to_empty,
        }
    }

    /// Severity rises the sooner the extrapolated path leaves the arena
    fn boundary_severity(org: &Organism, env: &Environment, horizon: f32) -> f32 {
        let exit_time = |pos: f32, vel: f32, limit: f32| -> f32 {
            if vel > 0.0 {
                (limit - pos) / vel
            } else if vel < 0.0 {
                -pos / vel
            } else {
                f32::INFINITY
            }
        };

        let tx = exit_time(org.x, org.vx, env.width);
        let ty = exit_time(org.y, org.vy, env.height);
        let t = tx.min(ty);

        if t.is_finite() && t >= 0.0 && t <= horizon {
            1.0 - t / horizon
        } else {
            0.0
        }
    }

    /// Closest-approach test against every visible neighbor; returns the
    /// severest predicted contact within the horizon.
    fn worst_collision(
        org: &Organism,
        others: &[AgentSnapshot],
        horizon: f32,
    ) -> Option<(OrganismId, f32)> {
        let mut worst: Option<(OrganismId, f32)> = None;

        for other in others {
            if other.id == org.id {
                continue;
            }
            let dx = other.x - org.x;
            let dy = other.y - org.y;
            if dx.hypot(dy) > org.genome.vision {
                continue;
            }

            let rvx = other.vx - org.vx;
            let rvy = other.vy - org.vy;
            let rel_speed_sq = rvx * rvx + rvy * rvy;

            // Time of closest approach; 0 for parallel motion.
            let t = if rel_speed_sq > 1e-6 {
                (-(dx * rvx + dy * rvy) / rel_speed_sq).clamp(0.0, horizon)
            } else {
                0.0
            };

            let cx = dx + rvx * t;
            let cy = dy + rvy * t;
            let closest = cx.hypot(cy);
            let contact = (org.genome.size + other.size) * 0.5;

            if closest < contact {
                let severity = (1.0 - t / horizon) * (other.size / org.genome.size).min(2.0) / 2.0;
                if worst.map_or(true, |(_, s)| severity > s) {
                    worst = Some((other.id, severity));
                }
            }
        }

        worst
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::environment::snapshot_population;
    use crate::genome::{Genome, TraitId};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn org_at(id: u64, x: f32, y: f32, vx: f32, vy: f32) -> Organism {
        let config = Config::default();
        let mut rng = ChaCha8Rng::seed_from_u64(id);
        let mut genome = Genome::random(&mut rng);
        genome.set(TraitId::Vision, 200.0);
        genome.set(TraitId::Size, 6.0);
        let mut org = Organism::new(id, x, y, genome, &config.organisms);
        org.vx = vx;
        org.vy = vy;
        org
    }

    #[test]
    fn test_boundary_forecast() {
        let config = Config::default();
        let env = Environment::new(&config.world);

        // Heading for the right wall at 10 units/tick from 100 away.
        let org = org_at(1, env.width - 100.0, 300.0, 10.0, 0.0);
        let forecast = ThreatPredictor::forecast(&org, &env, &[], 30.0, 0.5);
        assert!(forecast.boundary_severity > 0.5);

        // Drifting in the middle: nothing predicted.
        let calm = org_at(2, 400.0, 300.0, 0.2, 0.0);
        let forecast = ThreatPredictor::forecast(&calm, &env, &[], 30.0, 0.5);
        assert_eq!(forecast.boundary_severity, 0.0);
    }

    #[test]
    fn test_collision_forecast() {
        let config = Config::default();
        let env = Environment::new(&config.world);

        let org = org_at(1, 300.0, 300.0, 2.0, 0.0);
        // Oncoming neighbor on the same line.
        let oncoming = org_at(2, 360.0, 300.0, -2.0, 0.0);

        let forecast = ThreatPredictor::forecast(
            &org,
            &env,
            &snapshot_population(&[oncoming]),
            30.0,
            0.5,
        );
        let (id, severity) = forecast.collision.expect("collision predicted");
        assert_eq!(id, 2);
        assert!(severity > 0.0);
    }

    #[test]
    fn test_energy_depletion_forecast() {
        let config = Config::default();
        let env = Environment::new(&config.world);
        let mut org = org_at(1, 300.0, 300.0, 0.0, 0.0);
        org.energy = 50.0;

        let forecast = ThreatPredictor::forecast(&org, &env, &[], 30.0, 0.5);
        assert!((forecast.ticks_to_empty - 100.0).abs() < 1e-3);

        // Zero burn rate falls back to denominator 1 instead of faulting.
        let forecast = ThreatPredictor::forecast(&org, &env, &[], 30.0, 0.0);
        assert_eq!(forecast.ticks_to_empty, 50.0);
    }
}
