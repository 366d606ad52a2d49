//! API routes for the deconfliction server.

pub mod error;
pub mod request_id;
mod routes;

use axum::Router;

pub use routes::{
    HealthResponse, MlStatsResponse, TrajectoryPoint, TrajectoryRequest, TrajectoryResponse,
    VerifyRequest,
};

pub fn routes() -> Router<std::sync::Arc<crate::state::AppState>> {
    routes::create_router()
}

#[cfg(test)]
mod tests;
