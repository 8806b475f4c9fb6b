//! REST API routes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use crate::api::ws;
use crate::state::AppState;
use land_core::models::{
    ActuatorArmed, LandDetectionResult, VehicleAcceleration, VehicleLocalPosition, VehicleStatus,
};
use land_core::params::find_def;
use land_core::{ParamError, ParamValue};

/// Create the API router.
pub fn create_router() -> Router<Arc<AppState>> {
    let telemetry_routes = Router::new()
        .route("/v1/telemetry/armed", post(receive_armed))
        .route("/v1/telemetry/acceleration", post(receive_acceleration))
        .route("/v1/telemetry/local-position", post(receive_local_position))
        .route("/v1/telemetry/vehicle-status", post(receive_vehicle_status));

    let param_routes = Router::new()
        .route("/v1/params", get(list_params))
        .route("/v1/params/:name", get(get_param).put(set_param));

    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/v1/status", get(get_status))
        .route("/v1/land-detected", get(get_land_detected))
        .route("/v1/ws", get(ws::ws_handler))
        .merge(telemetry_routes)
        .merge(param_routes)
}

// === Request/Response types ===

#[derive(Debug, Serialize)]
pub struct ParamEntry {
    pub name: String,
    pub value: ParamValue,
    pub description: &'static str,
}

impl ParamEntry {
    fn new(name: String, value: ParamValue) -> Self {
        let description = find_def(&name).map(|def| def.description).unwrap_or_default();
        Self { name, value, description }
    }
}

#[derive(Debug, Deserialize)]
pub struct SetParamRequest {
    pub value: ParamValue,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub loops: Vec<LoopHeartbeat>,
    pub land_detected: Option<LandDetectionResult>,
    pub total_flight_time_s: f64,
    pub server_time: chrono::DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct LoopHeartbeat {
    pub name: String,
    pub last_beat: chrono::DateTime<Utc>,
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<serde_json::Value>)>;

fn param_error(err: ParamError) -> (StatusCode, Json<serde_json::Value>) {
    let status = match err {
        ParamError::UnknownParam(_) => StatusCode::NOT_FOUND,
        ParamError::TypeMismatch { .. } | ParamError::OutOfRange { .. } => StatusCode::BAD_REQUEST,
    };
    (status, Json(json!({ "error": err.to_string() })))
}

// === Handlers ===

async fn get_status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let loops = state
        .loop_heartbeats()
        .into_iter()
        .map(|(name, last_beat)| LoopHeartbeat { name, last_beat })
        .collect();

    Json(StatusResponse {
        loops,
        land_detected: state.results().latest(),
        total_flight_time_s: state.params().total_flight_time().as_secs_f64(),
        server_time: Utc::now(),
    })
}

async fn get_land_detected(State(state): State<Arc<AppState>>) -> ApiResult<LandDetectionResult> {
    state.results().latest().map(Json).ok_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "No land detection result published yet" })),
        )
    })
}

async fn receive_armed(
    State(state): State<Arc<AppState>>,
    Json(armed): Json<ActuatorArmed>,
) -> StatusCode {
    state.telemetry().publish_armed(armed);
    StatusCode::ACCEPTED
}

async fn receive_acceleration(
    State(state): State<Arc<AppState>>,
    Json(acceleration): Json<VehicleAcceleration>,
) -> (StatusCode, Json<serde_json::Value>) {
    if acceleration.xyz.iter().any(|v| !v.is_finite()) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Acceleration must be finite" })),
        );
    }
    state.telemetry().publish_acceleration(acceleration);
    (StatusCode::ACCEPTED, Json(json!({})))
}

async fn receive_local_position(
    State(state): State<Arc<AppState>>,
    Json(position): Json<VehicleLocalPosition>,
) -> StatusCode {
    state.telemetry().publish_local_position(position);
    StatusCode::ACCEPTED
}

async fn receive_vehicle_status(
    State(state): State<Arc<AppState>>,
    Json(status): Json<VehicleStatus>,
) -> StatusCode {
    state.telemetry().publish_vehicle_status(status);
    StatusCode::ACCEPTED
}

async fn list_params(State(state): State<Arc<AppState>>) -> Json<Vec<ParamEntry>> {
    Json(
        state
            .params()
            .list()
            .into_iter()
            .map(|(name, value)| ParamEntry::new(name, value))
            .collect(),
    )
}

async fn get_param(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> ApiResult<ParamEntry> {
    state
        .params()
        .value(&name)
        .map(|value| Json(ParamEntry::new(name.clone(), value)))
        .ok_or_else(|| param_error(ParamError::UnknownParam(name)))
}

async fn set_param(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(request): Json<SetParamRequest>,
) -> ApiResult<ParamEntry> {
    let value = state.params().set(&name, request.value).map_err(param_error)?;
    tracing::info!("Parameter {} set to {:?}", name, value);
    Ok(Json(ParamEntry::new(name, value)))
}
