//! Brute-force pairwise collision detection with impulse response.

use crate::particle::{Particle, ParticleStore};

/// Radius of every particle; two particles touch below twice this distance.
pub const DEFAULT_PARTICLE_RADIUS: f64 = 1.0;

/// Perfectly elastic.
pub const DEFAULT_RESTITUTION: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionResolver {
    pub radius: f64,
    pub restitution: f64,
}

impl Default for CollisionResolver {
    fn default() -> Self {
        Self::new(DEFAULT_PARTICLE_RADIUS, DEFAULT_RESTITUTION)
    }
}

impl CollisionResolver {
    pub fn new(radius: f64, restitution: f64) -> Self {
        Self {
            radius,
            restitution,
        }
    }

    /// One pass over every pair `i < j` in ascending order. Impulses are applied
    /// immediately, so a later pair sees the velocities left by earlier pairs.
    /// Positions are never touched.
    ///
    /// Returns the number of pairs that received an impulse.
    pub fn resolve(&self, store: &mut ParticleStore) -> usize {
        let particles = store.as_mut_slice();
        let contact = 2.0 * self.radius;
        let mut resolved = 0;

        for i in 0..particles.len() {
            let (head, tail) = particles.split_at_mut(i + 1);
            let p1 = &mut head[i];
            for p2 in tail.iter_mut() {
                if p1.distance_to(p2) < contact && self.apply_impulse(p1, p2) {
                    resolved += 1;
                }
            }
        }

        resolved
    }

    /// Returns `false` when the pair is coincident or already separating.
    fn apply_impulse(&self, p1: &mut Particle, p2: &mut Particle) -> bool {
        let dx = p2.x - p1.x;
        let dy = p2.y - p1.y;
        let distance = dx.hypot(dy);
        if distance == 0.0 {
            return false;
        }

        let nx = dx / distance;
        let ny = dy / distance;
        let velocity_along_normal = (p2.vx - p1.vx) * nx + (p2.vy - p1.vy) * ny;
        if velocity_along_normal > 0.0 {
            return false;
        }

        let impulse = -(1.0 + self.restitution) * velocity_along_normal
            / (1.0 / p1.mass + 1.0 / p2.mass);
        let jx = impulse * nx;
        let jy = impulse * ny;

        p1.vx -= jx / p1.mass;
        p1.vy -= jy / p1.mass;
        p2.vx += jx / p2.mass;
        p2.vy += jy / p2.mass;
        true
    }
}
