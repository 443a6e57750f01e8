//! Control routes: add/remove particles, play/pause, start/reset, state queries.

use axum::{
    Json,
    extract::{Path, State},
};
use orbit_core::Particle;

use crate::{
    handler::ApiError,
    scheduler::{BroadcastScheduler, SimulationStatus},
};

pub async fn add_particle(
    State(scheduler): State<BroadcastScheduler>,
    Json(particle): Json<Particle>,
) -> Result<&'static str, ApiError> {
    scheduler.add(particle)?;
    tracing::debug!(x = particle.x, y = particle.y, mass = particle.mass, "Particle added");
    Ok("Particle added successfully")
}

pub async fn remove_particle(
    State(scheduler): State<BroadcastScheduler>,
    Path(index): Path<i64>,
) -> Result<&'static str, ApiError> {
    scheduler.remove(index)?;
    tracing::debug!(index, "Particle removed");
    Ok("Particle removed successfully")
}

pub async fn get_particle(
    State(scheduler): State<BroadcastScheduler>,
    Path(index): Path<i64>,
) -> Result<Json<Particle>, ApiError> {
    Ok(Json(scheduler.get(index)?))
}

pub async fn start_simulation(
    State(scheduler): State<BroadcastScheduler>,
    Path(count): Path<i64>,
) -> Result<String, ApiError> {
    let count = scheduler.start(count)?;
    tracing::info!(count, "Simulation started");
    Ok(format!("Simulation started with {count} particles."))
}

pub async fn toggle_play_pause(State(scheduler): State<BroadcastScheduler>) -> String {
    let state = scheduler.toggle();
    tracing::info!(%state, "Simulation toggled");
    format!("Simulation is now: {state}")
}

pub async fn reset_simulation(State(scheduler): State<BroadcastScheduler>) -> &'static str {
    scheduler.reset();
    tracing::info!("Simulation reset");
    "Simulation reset successfully"
}

pub async fn simulation_state(State(scheduler): State<BroadcastScheduler>) -> Json<Vec<Particle>> {
    Json(scheduler.snapshot())
}

pub async fn simulation_status(
    State(scheduler): State<BroadcastScheduler>,
) -> Json<SimulationStatus> {
    Json(scheduler.status())
}
