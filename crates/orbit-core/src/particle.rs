//! Point particles and the ordered store that holds them.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimulationError};

/// A point particle. It has no identity beyond its position in a [`ParticleStore`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub mass: f64,
}

impl Particle {
    /// Creates a particle after checking that every field is finite and `mass > 0`.
    pub fn new(x: f64, y: f64, vx: f64, vy: f64, mass: f64) -> Result<Self> {
        let particle = Self {
            x,
            y,
            vx,
            vy,
            mass,
        };
        particle.validate()?;
        Ok(particle)
    }

    /// Checks the construction invariants. Particles coming from request bodies
    /// are deserialized without validation, so callers run this before storing them.
    pub fn validate(&self) -> Result<()> {
        if !self.x.is_finite() || !self.y.is_finite() {
            return Err(SimulationError::NonFinite("position"));
        }
        if !self.vx.is_finite() || !self.vy.is_finite() {
            return Err(SimulationError::NonFinite("velocity"));
        }
        if !self.mass.is_finite() || self.mass <= 0.0 {
            return Err(SimulationError::InvalidMass(self.mass));
        }
        Ok(())
    }

    #[inline]
    pub fn distance_to(&self, other: &Particle) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// 1/2 m |v|^2
    #[inline]
    pub fn kinetic_energy(&self) -> f64 {
        0.5 * self.mass * (self.vx * self.vx + self.vy * self.vy)
    }
}

/// Ordered, index-addressable particle collection. Insertion order is preserved
/// and removal shifts every later particle down by one.
#[derive(Debug, Clone, Default)]
pub struct ParticleStore {
    particles: Vec<Particle>,
}

impl ParticleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn push(&mut self, particle: Particle) {
        self.particles.push(particle);
    }

    /// Returns a copy of the particle at `index`.
    pub fn get(&self, index: usize) -> Result<Particle> {
        self.particles
            .get(index)
            .copied()
            .ok_or_else(|| SimulationError::out_of_range(index, self.particles.len()))
    }

    /// Removes the particle at `index`; the store is untouched on error.
    pub fn remove(&mut self, index: usize) -> Result<Particle> {
        if index >= self.particles.len() {
            return Err(SimulationError::out_of_range(index, self.particles.len()));
        }
        Ok(self.particles.remove(index))
    }

    pub fn clear(&mut self) {
        self.particles.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Particle> {
        self.particles.iter()
    }

    pub fn as_slice(&self) -> &[Particle] {
        &self.particles
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    /// Owned copy of every particle, in store order.
    pub fn snapshot(&self) -> Vec<Particle> {
        self.particles.clone()
    }
}

impl From<Vec<Particle>> for ParticleStore {
    fn from(particles: Vec<Particle>) -> Self {
        Self { particles }
    }
}

impl Extend<Particle> for ParticleStore {
    fn extend<I: IntoIterator<Item = Particle>>(&mut self, iter: I) {
        self.particles.extend(iter);
    }
}
