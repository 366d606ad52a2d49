//! REST API routes.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::api::error::ApiError;
use crate::api::request_id;
use crate::state::AppState;
use deconflict_core::{
    scenarios, DeconflictionReport, DroneMission, Scenario, ScreeningStats,
    TrajectoryInterpolator, Waypoint,
};

const DEFAULT_NUM_SAMPLES: usize = 100;
const MAX_NUM_SAMPLES: usize = 10_000;

/// Create the API router.
pub fn create_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/v1/health", get(health))
        .route("/v1/verify", post(verify_mission))
        .route("/v1/trajectory", post(trajectory))
        .route("/v1/scenarios", get(list_scenarios))
        .route("/v1/ml-stats", get(ml_stats))
        .route("/v1/ml-stats/reset", post(reset_ml_stats))
        .layer(middleware::from_fn(request_id::ensure_request_id))
}

// === Request/Response types ===

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub primary: DroneMission,
    #[serde(default)]
    pub others: Vec<DroneMission>,
    /// Use the classifier pre-screen when one is loaded
    #[serde(default = "default_use_ml", rename = "useML")]
    pub use_ml: bool,
}

fn default_use_ml() -> bool {
    true
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VerifyResponse<'a> {
    #[serde(flatten)]
    report: DeconflictionReport<'a>,
    ml_used: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    ml_stats: Option<MlStatsBrief>,
}

/// Cumulative pre-screen totals attached to each screened verification.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MlStatsBrief {
    filtered: u64,
    checked: u64,
    filter_rate: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrajectoryRequest {
    pub mission: DroneMission,
    #[serde(default = "default_num_samples")]
    pub num_samples: usize,
}

fn default_num_samples() -> usize {
    DEFAULT_NUM_SAMPLES
}

#[derive(Debug, Serialize)]
pub struct TrajectoryPoint {
    pub time: f64,
    pub position: Waypoint,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrajectoryResponse {
    pub mission_id: String,
    pub trajectory: Vec<TrajectoryPoint>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub ml_available: bool,
    pub geometric_available: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MlStatsResponse {
    pub total_checks: u64,
    pub ml_filtered: u64,
    pub geometric_checks: u64,
    pub classifier_failures: u64,
    pub filter_rate: f64,
    pub threshold: f64,
    pub avg_ml_time_ms: f64,
    pub avg_geometric_time_ms: f64,
    pub avg_total_time_ms: f64,
}

impl MlStatsResponse {
    fn new(stats: &ScreeningStats, threshold: f64) -> Self {
        Self {
            total_checks: stats.total_checks,
            ml_filtered: stats.ml_filtered,
            geometric_checks: stats.geometric_checks,
            classifier_failures: stats.classifier_failures,
            filter_rate: stats.filter_rate(),
            threshold,
            avg_ml_time_ms: stats.avg_ml_time().as_secs_f64() * 1000.0,
            avg_geometric_time_ms: stats.avg_geometric_time().as_secs_f64() * 1000.0,
            avg_total_time_ms: stats.avg_total_time().as_secs_f64() * 1000.0,
        }
    }
}

// === Handlers ===

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        ml_available: state.ml_available(),
        geometric_available: true,
    })
}

/// Verify a primary mission against other traffic.
async fn verify_mission(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<VerifyRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload?;
    let use_ml = request.use_ml && state.ml_available();

    let response = if use_ml {
        let mut pipeline = state.pipeline();
        let report = pipeline.verify(&request.primary, &request.others);
        let stats = pipeline.stats();
        Json(VerifyResponse {
            report,
            ml_used: true,
            ml_stats: Some(MlStatsBrief {
                filtered: stats.ml_filtered,
                checked: stats.geometric_checks,
                filter_rate: stats.filter_rate(),
            }),
        })
        .into_response()
    } else {
        let report = state.service().verify(&request.primary, &request.others);
        Json(VerifyResponse {
            report,
            ml_used: false,
            ml_stats: None,
        })
        .into_response()
    };

    Ok(response)
}

/// Sample a mission's trajectory for visualization.
async fn trajectory(
    payload: Result<Json<TrajectoryRequest>, JsonRejection>,
) -> Result<Json<TrajectoryResponse>, ApiError> {
    let Json(request) = payload?;
    if !(1..=MAX_NUM_SAMPLES).contains(&request.num_samples) {
        return Err(ApiError::BadRequest(format!(
            "numSamples must be between 1 and {MAX_NUM_SAMPLES} (got {})",
            request.num_samples
        )));
    }

    let interpolator = TrajectoryInterpolator::new(&request.mission);
    let trajectory = interpolator
        .samples(request.num_samples)
        .map(|(time, position)| TrajectoryPoint { time, position })
        .collect();

    Ok(Json(TrajectoryResponse {
        mission_id: request.mission.id().to_string(),
        trajectory,
    }))
}

/// Built-in demo scenarios keyed by short name.
async fn list_scenarios() -> Result<Json<BTreeMap<&'static str, Scenario>>, ApiError> {
    let scenarios = scenarios::all().map_err(|err| ApiError::Internal(err.to_string()))?;
    Ok(Json(scenarios.into_iter().collect()))
}

async fn ml_stats(State(state): State<Arc<AppState>>) -> Result<Json<MlStatsResponse>, ApiError> {
    if !state.ml_available() {
        return Err(ml_unavailable());
    }
    let pipeline = state.pipeline();
    Ok(Json(MlStatsResponse::new(&pipeline.stats(), pipeline.threshold())))
}

async fn reset_ml_stats(State(state): State<Arc<AppState>>) -> Result<StatusCode, ApiError> {
    if !state.ml_available() {
        return Err(ml_unavailable());
    }
    state.pipeline().reset_stats();
    tracing::info!("Reset ML pre-screen statistics");
    Ok(StatusCode::NO_CONTENT)
}

fn ml_unavailable() -> ApiError {
    ApiError::NotFound("ML pre-screen is not configured".to_string())
}
