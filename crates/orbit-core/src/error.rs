use thiserror::Error;

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, SimulationError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimulationError {
    #[error("Invalid particle index: {index} (particles: {len})")]
    IndexOutOfRange { index: i64, len: usize },

    #[error("Invalid particle mass: {0} (must be finite and > 0)")]
    InvalidMass(f64),

    #[error("Particle {0} must be finite")]
    NonFinite(&'static str),

    #[error("Invalid number of particles: {0}")]
    InvalidParticleCount(i64),

    #[error("Invalid simulation config: {0}")]
    InvalidConfig(String),
}

impl SimulationError {
    pub(crate) fn out_of_range(index: usize, len: usize) -> Self {
        Self::IndexOutOfRange {
            index: i64::try_from(index).unwrap_or(i64::MAX),
            len,
        }
    }
}
