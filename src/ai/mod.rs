//! Per-organism decision architecture.
//!
//! Four layers, leaf to root:
//! - [`instinct`]: reflex signals with urgencies in [0, 1]
//! - [`proximity`], [`threat`], [`forecast`]: stateless situational
//!   awareness, each a pure function of (organism, environment)
//! - [`brain`]: utility-based arbitration with commitment hysteresis
//!
//! The modules are fixed-shape composition, not inheritance: an organism
//! owns one [`brain::BehavioralBrain`] and calls the stateless layers as
//! free functions each tick.

pub mod brain;
pub mod forecast;
pub mod instinct;
pub mod proximity;
pub mod threat;

pub use brain::{Behavior, BehavioralBrain};
pub use forecast::{FeedingPlan, ResourceForecaster};
pub use instinct::{InstinctLayer, InstinctSignals};
pub use proximity::{ProximityReport, ProximitySystem};
pub use threat::{ThreatForecast, ThreatPredictor};
