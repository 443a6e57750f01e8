use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use orbit_core::SimulationError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Simulation(#[from] SimulationError),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Simulation(SimulationError::IndexOutOfRange { .. }) => StatusCode::NOT_FOUND,
            ApiError::Simulation(
                SimulationError::InvalidMass(_)
                | SimulationError::NonFinite(_)
                | SimulationError::InvalidParticleCount(_),
            ) => StatusCode::BAD_REQUEST,
            ApiError::Simulation(SimulationError::InvalidConfig(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, "Request rejected");
        }
        (status, self.to_string()).into_response()
    }
}
