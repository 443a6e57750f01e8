//! Play/pause gated stepping of the particle store.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::collision::CollisionResolver;
use crate::config::{SeedConfig, SimulationConfig};
use crate::error::{Result, SimulationError};
use crate::integrator::Integrator;
use crate::particle::{Particle, ParticleStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    Running,
    Paused,
}

impl RunState {
    pub fn toggled(self) -> Self {
        match self {
            RunState::Running => RunState::Paused,
            RunState::Paused => RunState::Running,
        }
    }
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunState::Running => f.write_str("Running"),
            RunState::Paused => f.write_str("Paused"),
        }
    }
}

/// The particle store together with the step pipeline and the run flag.
#[derive(Debug, Clone)]
pub struct Simulation {
    store: ParticleStore,
    integrator: Integrator,
    resolver: CollisionResolver,
    seed: SeedConfig,
    state: RunState,
    tick: u64,
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new(&SimulationConfig::default())
    }
}

impl Simulation {
    /// Creates an empty, running simulation.
    pub fn new(config: &SimulationConfig) -> Self {
        Self {
            store: ParticleStore::new(),
            integrator: Integrator::new(config.force_law, config.dt),
            resolver: CollisionResolver::new(config.particle_radius, config.restitution),
            seed: config.seed.clone(),
            state: RunState::Running,
            tick: 0,
        }
    }

    pub fn add(&mut self, particle: Particle) -> Result<()> {
        particle.validate()?;
        self.store.push(particle);
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Result<Particle> {
        self.store.remove(index)
    }

    pub fn get(&self, index: usize) -> Result<Particle> {
        self.store.get(index)
    }

    /// Drops every particle. The run state is left as is.
    pub fn reset(&mut self) {
        self.store.clear();
    }

    /// Flips between running and paused and returns the new state.
    pub fn toggle(&mut self) -> RunState {
        self.state = self.state.toggled();
        self.state
    }

    pub fn run_state(&self) -> RunState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == RunState::Running
    }

    /// Number of steps that actually advanced the particles.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn particles(&self) -> &[Particle] {
        self.store.as_slice()
    }

    pub fn snapshot(&self) -> Vec<Particle> {
        self.store.snapshot()
    }

    /// Integrates and resolves collisions when running; a no-op when paused.
    /// Either way the current particles are returned.
    pub fn step(&mut self) -> &[Particle] {
        if self.state == RunState::Running {
            self.integrator.step(&mut self.store);
            let collisions = self.resolver.resolve(&mut self.store);
            self.tick += 1;
            tracing::trace!(
                tick = self.tick,
                particles = self.store.len(),
                collisions,
                "Simulation stepped"
            );
        }
        self.store.as_slice()
    }

    /// Replaces every particle with `count` random ones drawn from the seed ranges.
    /// `count` must lie in `1..=seed.max_particles`; on error the store is untouched.
    pub fn start<R: Rng>(&mut self, count: i64, rng: &mut R) -> Result<usize> {
        let count = match usize::try_from(count) {
            Ok(count) if count > 0 && count <= self.seed.max_particles => count,
            _ => return Err(SimulationError::InvalidParticleCount(count)),
        };

        let seed = &self.seed;
        let particles: Vec<Particle> = (0..count)
            .map(|_| Particle {
                x: rng.random_range(seed.position.clone()),
                y: rng.random_range(seed.position.clone()),
                vx: rng.random_range(seed.velocity.clone()),
                vy: rng.random_range(seed.velocity.clone()),
                mass: rng.random_range(seed.mass.clone()),
            })
            .collect();
        self.store = ParticleStore::from(particles);
        Ok(count)
    }
}
