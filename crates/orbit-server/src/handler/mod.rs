use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::scheduler::BroadcastScheduler;

pub mod control;
pub mod error;
pub mod socket;

pub use error::ApiError;

/// Control routes under `/simulation` plus the push socket at `/ws/particles`.
pub fn router(scheduler: BroadcastScheduler) -> Router {
    Router::new()
        .route("/simulation/add", post(control::add_particle))
        .route("/simulation/remove/{index}", delete(control::remove_particle))
        .route("/simulation/particle/{index}", get(control::get_particle))
        .route("/simulation/start/{count}", post(control::start_simulation))
        .route("/simulation/toggle", post(control::toggle_play_pause))
        .route("/simulation/reset", post(control::reset_simulation))
        .route("/simulation/state", get(control::simulation_state))
        .route("/simulation/status", get(control::simulation_status))
        .route("/ws/particles", get(socket::ws_particles))
        .with_state(scheduler)
}
