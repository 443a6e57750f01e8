//! Semi-implicit Euler integration under the central force field.

use crate::force::ForceLaw;
use crate::particle::{Particle, ParticleStore};

/// Fixed simulated time advanced per step, in seconds.
pub const DEFAULT_DT: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Integrator {
    pub law: ForceLaw,
    pub dt: f64,
}

impl Default for Integrator {
    fn default() -> Self {
        Self::new(ForceLaw::default(), DEFAULT_DT)
    }
}

impl Integrator {
    pub fn new(law: ForceLaw, dt: f64) -> Self {
        Self { law, dt }
    }

    /// Advances every particle by one `dt`: velocity first, then position
    /// from the updated velocity.
    pub fn step(&self, store: &mut ParticleStore) {
        let damping = self.law.damping();
        for particle in store.as_mut_slice() {
            if let Some((ax, ay)) = self.law.acceleration(particle.x, particle.y, particle.mass) {
                particle.vx += ax * self.dt;
                particle.vy += ay * self.dt;
            }
            particle.vx *= damping;
            particle.vy *= damping;
            Self::advance(particle, self.dt);
        }
    }

    /// Moves `particle` along its current velocity.
    #[inline]
    pub fn advance(particle: &mut Particle, dt: f64) {
        particle.x += particle.vx * dt;
        particle.y += particle.vy * dt;
    }
}
