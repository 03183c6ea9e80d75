use axum::{Json, extract::State};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    response::{ApiResponse, Meta},
    state::AppState,
};

#[derive(Serialize, ToSchema)]
pub struct HealthData {
    /// `ok`, or `degraded` when the backend does not answer a ping.
    status: String,
    /// Backend actually serving requests.
    storage_mode: String,
    requested_mode: String,
    backend: String,
    fallback_reason: Option<String>,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "OK", body = ApiResponse<HealthData>),
    ),
    security(()),
    tag = "Health"
)]
pub async fn health_check(State(state): State<AppState>) -> Json<ApiResponse<HealthData>> {
    let store = &state.store;
    let status = match store.ping().await {
        Ok(()) => "ok",
        Err(err) => {
            tracing::warn!(error = %err, backend = store.backend_name(), "health ping failed");
            "degraded"
        }
    };

    let data = HealthData {
        status: status.to_string(),
        storage_mode: store.mode().to_string(),
        requested_mode: store.requested_mode().to_string(),
        backend: store.backend_name().to_string(),
        fallback_reason: store.fallback_reason().map(str::to_string),
    };

    Json(ApiResponse::success(
        "Health check",
        data,
        Some(Meta::empty()),
    ))
}
