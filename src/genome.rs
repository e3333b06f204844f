//! Genome - evolvable trait vector and genetic operators.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Identifier for an evolvable trait
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TraitId {
    Speed,
    Vision,
    Size,
    Efficiency,
    Aggression,
    Diet,
    Stability,
}

impl TraitId {
    /// All evolvable traits, in genome order
    pub const ALL: [TraitId; 7] = [
        TraitId::Speed,
        TraitId::Vision,
        TraitId::Size,
        TraitId::Efficiency,
        TraitId::Aggression,
        TraitId::Diet,
        TraitId::Stability,
    ];

    /// Traits tracked for survivor correlation analysis
    pub const TRACKED: [TraitId; 4] = [
        TraitId::Speed,
        TraitId::Vision,
        TraitId::Size,
        TraitId::Efficiency,
    ];

    /// Valid domain (min, max) for this trait
    pub fn domain(self) -> (f32, f32) {
        match self {
            TraitId::Speed => (0.5, 5.0),
            TraitId::Vision => (40.0, 220.0),
            TraitId::Size => (3.0, 14.0),
            TraitId::Efficiency => (0.3, 1.5),
            TraitId::Aggression => (0.0, 10.0),
            TraitId::Diet => (0.0, 1.0),
            TraitId::Stability => (0.0, 1.0),
        }
    }

    /// Width of the trait domain
    pub fn range(self) -> f32 {
        let (min, max) = self.domain();
        max - min
    }

    /// Clamp a value into this trait's domain
    pub fn clamp(self, value: f32) -> f32 {
        let (min, max) = self.domain();
        value.clamp(min, max)
    }

    /// Stable lowercase name for stats keys and logs
    pub fn name(self) -> &'static str {
        match self {
            TraitId::Speed => "speed",
            TraitId::Vision => "vision",
            TraitId::Size => "size",
            TraitId::Efficiency => "efficiency",
            TraitId::Aggression => "aggression",
            TraitId::Diet => "diet",
            TraitId::Stability => "stability",
        }
    }
}

/// Cosmetic color in HSL space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hsl {
    pub hue: f32,
    pub saturation: f32,
    pub lightness: f32,
}

impl Hsl {
    /// Random color with moderate saturation/lightness
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        Self {
            hue: rng.gen_range(0.0..360.0),
            saturation: rng.gen_range(40.0..90.0),
            lightness: rng.gen_range(35.0..65.0),
        }
    }

    /// Channel-wise average of two colors
    pub fn blend(a: Hsl, b: Hsl) -> Self {
        Self {
            hue: (a.hue + b.hue) / 2.0,
            saturation: (a.saturation + b.saturation) / 2.0,
            lightness: (a.lightness + b.lightness) / 2.0,
        }
    }
}

/// Per-trait multiplier table, clamped to [0.5, 2.0]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraitWeights {
    weights: [f32; 7],
}

impl Default for TraitWeights {
    fn default() -> Self {
        Self { weights: [1.0; 7] }
    }
}

impl TraitWeights {
    pub const MIN: f32 = 0.5;
    pub const MAX: f32 = 2.0;

    /// Get the weight for a trait
    #[inline]
    pub fn get(&self, trait_id: TraitId) -> f32 {
        self.weights[Self::index(trait_id)]
    }

    /// Set a weight, clamped to the valid band
    pub fn set(&mut self, trait_id: TraitId, value: f32) {
        self.weights[Self::index(trait_id)] = value.clamp(Self::MIN, Self::MAX);
    }

    /// Adjust a weight by a delta, clamped to the valid band
    pub fn nudge(&mut self, trait_id: TraitId, delta: f32) {
        let current = self.get(trait_id);
        self.set(trait_id, current + delta);
    }

    fn index(trait_id: TraitId) -> usize {
        match trait_id {
            TraitId::Speed => 0,
            TraitId::Vision => 1,
            TraitId::Size => 2,
            TraitId::Efficiency => 3,
            TraitId::Aggression => 4,
            TraitId::Diet => 5,
            TraitId::Stability => 6,
        }
    }
}

/// Genome: seven evolvable traits plus a cosmetic color.
///
/// Every trait stays within its domain after any operation. Genomes are
/// exclusively owned by one organism and copied on clone or crossover.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genome {
    /// Maximum movement speed (units/tick)
    pub speed: f32,
    /// Perception radius (units)
    pub vision: f32,
    /// Body size; collision radius and predation leverage
    pub size: f32,
    /// Metabolic efficiency; higher burns less energy
    pub efficiency: f32,
    /// Willingness to attack other organisms
    pub aggression: f32,
    /// Diet scalar: 0 herbivore, 1 carnivore
    pub diet: f32,
    /// Mutation stability; higher resists mutation
    pub stability: f32,
    /// Cosmetic color, not under selection
    pub color: Hsl,
}

/// Fraction of the trait range a single mutation delta can span
const MUTATION_SPAN: f32 = 0.3;

impl Genome {
    /// Random genome with every trait uniform in its domain
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        let sample = |t: TraitId, rng: &mut R| {
            let (min, max) = t.domain();
            rng.gen_range(min..max)
        };
        Self {
            speed: sample(TraitId::Speed, rng),
            vision: sample(TraitId::Vision, rng),
            size: sample(TraitId::Size, rng),
            efficiency: sample(TraitId::Efficiency, rng),
            aggression: sample(TraitId::Aggression, rng),
            diet: sample(TraitId::Diet, rng),
            stability: sample(TraitId::Stability, rng),
            color: Hsl::random(rng),
        }
    }

    /// Read a trait by id
    pub fn get(&self, trait_id: TraitId) -> f32 {
        match trait_id {
            TraitId::Speed => self.speed,
            TraitId::Vision => self.vision,
            TraitId::Size => self.size,
            TraitId::Efficiency => self.efficiency,
            TraitId::Aggression => self.aggression,
            TraitId::Diet => self.diet,
            TraitId::Stability => self.stability,
        }
    }

    /// Write a trait by id, clamped to its domain
    pub fn set(&mut self, trait_id: TraitId, value: f32) {
        let clamped = trait_id.clamp(value);
        match trait_id {
            TraitId::Speed => self.speed = clamped,
            TraitId::Vision => self.vision = clamped,
            TraitId::Size => self.size = clamped,
            TraitId::Efficiency => self.efficiency = clamped,
            TraitId::Aggression => self.aggression = clamped,
            TraitId::Diet => self.diet = clamped,
            TraitId::Stability => self.stability = clamped,
        }
    }

    /// Mutate each trait independently.
    ///
    /// Effective per-trait probability is `rate * (2 - stability)`, so
    /// low-stability genomes drift faster. Deltas are uniform in
    /// ±(range * 0.15) and the result is clamped to the trait domain.
    pub fn mutate<R: Rng>(&mut self, rate: f32, rng: &mut R) {
        let effective = rate * (2.0 - self.stability);
        for trait_id in TraitId::ALL {
            if rng.gen::<f32>() < effective {
                self.apply_delta(trait_id, rng);
            }
        }
        self.jitter_color(rng);
    }

    /// Mutate with per-trait probability `rate * weights[trait]`.
    ///
    /// Same delta mechanics as [`Genome::mutate`]; the weight table lets a
    /// generation controller steer mutation toward traits it has seen
    /// correlate with survival.
    pub fn mutate_weighted<R: Rng>(&mut self, rate: f32, weights: &TraitWeights, rng: &mut R) {
        for trait_id in TraitId::ALL {
            if rng.gen::<f32>() < rate * weights.get(trait_id) {
                self.apply_delta(trait_id, rng);
            }
        }
        self.jitter_color(rng);
    }

    fn apply_delta<R: Rng>(&mut self, trait_id: TraitId, rng: &mut R) {
        let delta = rng.gen_range(-0.5..0.5) * trait_id.range() * MUTATION_SPAN;
        self.set(trait_id, self.get(trait_id) + delta);
    }

    fn jitter_color<R: Rng>(&mut self, rng: &mut R) {
        self.color.hue = (self.color.hue + rng.gen_range(-8.0..8.0)).rem_euclid(360.0);
    }

    /// Uniform gene-level crossover: each trait comes from one parent
    /// unchanged (no blending). Color channels are averaged.
    pub fn crossover<R: Rng>(a: &Genome, b: &Genome, rng: &mut R) -> Genome {
        let mut child = a.clone();
        for trait_id in TraitId::ALL {
            let source = if rng.gen::<bool>() { a } else { b };
            child.set(trait_id, source.get(trait_id));
        }
        child.color = Hsl::blend(a.color, b.color);
        child
    }

    /// True when every trait lies within its domain
    pub fn is_valid(&self) -> bool {
        TraitId::ALL.iter().all(|&t| {
            let (min, max) = t.domain();
            let v = self.get(t);
            v >= min && v <= max
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(7)
    }

    #[test]
    fn test_random_genome_in_domain() {
        let mut rng = rng();
        for _ in 0..50 {
            assert!(Genome::random(&mut rng).is_valid());
        }
    }

    #[test]
    fn test_mutation_stays_in_domain() {
        let mut rng = rng();
        let mut genome = Genome::random(&mut rng);
        for _ in 0..200 {
            genome.mutate(0.8, &mut rng);
            assert!(genome.is_valid());
        }
    }

    #[test]
    fn test_weighted_mutation_stays_in_domain() {
        let mut rng = rng();
        let mut genome = Genome::random(&mut rng);
        let mut weights = TraitWeights::default();
        weights.set(TraitId::Speed, 2.0);
        for _ in 0..200 {
            genome.mutate_weighted(0.5, &weights, &mut rng);
            assert!(genome.is_valid());
        }
    }

    #[test]
    fn test_crossover_picks_parent_values() {
        let mut rng = rng();
        let a = Genome::random(&mut rng);
        let b = Genome::random(&mut rng);

        for _ in 0..30 {
            let child = Genome::crossover(&a, &b, &mut rng);
            for trait_id in TraitId::ALL {
                let v = child.get(trait_id);
                assert!(
                    v == a.get(trait_id) || v == b.get(trait_id),
                    "{} not inherited from either parent",
                    trait_id.name()
                );
            }
        }
    }

    #[test]
    fn test_crossover_blends_color() {
        let mut rng = rng();
        let mut a = Genome::random(&mut rng);
        let mut b = Genome::random(&mut rng);
        a.color = Hsl { hue: 100.0, saturation: 50.0, lightness: 40.0 };
        b.color = Hsl { hue: 200.0, saturation: 70.0, lightness: 60.0 };

        let child = Genome::crossover(&a, &b, &mut rng);
        assert_eq!(child.color.hue, 150.0);
        assert_eq!(child.color.saturation, 60.0);
        assert_eq!(child.color.lightness, 50.0);
    }

    #[test]
    fn test_low_stability_mutates_more() {
        // Stability 0.5 gives effective rate 1.5x the stability 1.0 genome.
        // Measure mean absolute trait change over many trials.
        let mut rng = rng();
        let base = Genome::random(&mut rng);

        let total_change = |stability: f32, rng: &mut ChaCha8Rng| {
            let mut sum = 0.0f32;
            for _ in 0..2000 {
                let mut g = base.clone();
                g.stability = stability;
                g.mutate(0.2, rng);
                for t in TraitId::ALL {
                    if t != TraitId::Stability {
                        sum += (g.get(t) - base.get(t)).abs() / t.range();
                    }
                }
            }
            sum
        };

        let stable = total_change(1.0, &mut rng);
        let unstable = total_change(0.5, &mut rng);
        let ratio = unstable / stable;
        assert!(
            ratio > 1.2 && ratio < 2.0,
            "expected ~1.5x change for low stability, got {ratio:.2}x"
        );
    }

    #[test]
    fn test_trait_weights_clamped() {
        let mut weights = TraitWeights::default();
        for _ in 0..100 {
            weights.nudge(TraitId::Speed, 0.05);
            weights.nudge(TraitId::Vision, -0.05);
        }
        assert_eq!(weights.get(TraitId::Speed), TraitWeights::MAX);
        assert_eq!(weights.get(TraitId::Vision), TraitWeights::MIN);
    }

    #[test]
    fn test_set_clamps_to_domain() {
        let mut rng = rng();
        let mut genome = Genome::random(&mut rng);
        genome.set(TraitId::Speed, 99.0);
        assert_eq!(genome.speed, 5.0);
        genome.set(TraitId::Diet, -3.0);
        assert_eq!(genome.diet, 0.0);
    }
}
