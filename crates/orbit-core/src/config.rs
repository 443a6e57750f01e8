//! Tunable simulation parameters.
//!
//! Every field has a default, so a config file only needs the values it
//! changes:
//!
//! ```json
//! {
//!   "dt": 0.01,
//!   "particle_radius": 1.0,
//!   "force_law": { "kind": "capped", "damping": 0.999 },
//!   "seed": { "rng_seed": 42 }
//! }
//! ```

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::collision::{DEFAULT_PARTICLE_RADIUS, DEFAULT_RESTITUTION};
use crate::error::{Result, SimulationError};
use crate::force::ForceLaw;
use crate::integrator::DEFAULT_DT;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Simulated seconds per step, independent of the broadcast period.
    pub dt: f64,
    pub particle_radius: f64,
    pub restitution: f64,
    pub force_law: ForceLaw,
    pub seed: SeedConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            dt: DEFAULT_DT,
            particle_radius: DEFAULT_PARTICLE_RADIUS,
            restitution: DEFAULT_RESTITUTION,
            force_law: ForceLaw::default(),
            seed: SeedConfig::default(),
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(invalid(format!("dt must be > 0, got {}", self.dt)));
        }
        if !(self.particle_radius.is_finite() && self.particle_radius > 0.0) {
            return Err(invalid(format!(
                "particle_radius must be > 0, got {}",
                self.particle_radius
            )));
        }
        if !(0.0..=1.0).contains(&self.restitution) {
            return Err(invalid(format!(
                "restitution must be within [0, 1], got {}",
                self.restitution
            )));
        }
        self.seed.validate()
    }
}

/// Ranges used when the simulation is started with random particles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    pub position: Range<f64>,
    pub velocity: Range<f64>,
    pub mass: Range<f64>,
    /// Fixed RNG seed for reproducible starts; OS entropy when absent.
    pub rng_seed: Option<u64>,
    /// Largest `count` a start request may ask for.
    pub max_particles: usize,
}

pub const DEFAULT_MAX_PARTICLES: usize = 10_000;

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            position: -50.0..50.0,
            velocity: -1.0..1.0,
            mass: 1.0..11.0,
            rng_seed: None,
            max_particles: DEFAULT_MAX_PARTICLES,
        }
    }
}

impl SeedConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, range) in [
            ("position", &self.position),
            ("velocity", &self.velocity),
            ("mass", &self.mass),
        ] {
            if !(range.start.is_finite() && range.end.is_finite() && range.start < range.end) {
                return Err(invalid(format!(
                    "seed.{name} range {}..{} is empty",
                    range.start, range.end
                )));
            }
        }
        if self.mass.start <= 0.0 {
            return Err(invalid(format!(
                "seed.mass must be > 0, got {}",
                self.mass.start
            )));
        }
        if self.max_particles == 0 {
            return Err(invalid("seed.max_particles must be > 0".to_string()));
        }
        Ok(())
    }
}

fn invalid(message: String) -> SimulationError {
    SimulationError::InvalidConfig(message)
}
