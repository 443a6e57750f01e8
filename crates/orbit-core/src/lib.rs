//! Orbit-Live Core Library
//!
//! Point particles orbiting a fixed attractor at the origin, with brute-force
//! pairwise elastic collisions. Everything here is synchronous and free of I/O;
//! the server crate owns locking, timing and delivery.

#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]

pub mod collision;
pub mod config;
pub mod error;
pub mod force;
pub mod integrator;
pub mod particle;
pub mod simulation;

pub use collision::{CollisionResolver, DEFAULT_PARTICLE_RADIUS, DEFAULT_RESTITUTION};
pub use config::{DEFAULT_MAX_PARTICLES, SeedConfig, SimulationConfig};
pub use error::{Result, SimulationError};
pub use force::{Capped, ForceLaw, InverseSquare};
pub use integrator::{DEFAULT_DT, Integrator};
pub use particle::{Particle, ParticleStore};
pub use simulation::{RunState, Simulation};
