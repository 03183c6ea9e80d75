use axum::{
    Json, Router,
    extract::State,
    routing::get,
};

use crate::{
    dto::settings::{
        BulkSettingsRequest, PublicSettings, SettingList, SettingsQuery, UpsertSettingRequest,
    },
    error::AppResult,
    middleware::{auth::RequestContext, json::{AppJson, AppQuery}},
    models::Setting,
    response::ApiResponse,
    services::settings_service,
    state::AppState,
};

/// Mounted under `/admin/settings`.
pub fn admin_router() -> Router<AppState> {
    Router::new().route(
        "/",
        get(list_settings).post(upsert_setting).put(bulk_upsert_settings),
    )
}

/// Mounted under `/settings`.
pub fn public_router() -> Router<AppState> {
    Router::new().route("/", get(public_settings))
}

#[utoipa::path(
    get,
    path = "/api/admin/settings",
    params(SettingsQuery),
    responses(
        (status = 200, description = "All settings (admin only)", body = ApiResponse<SettingList>),
        (status = 403, description = "Admin only")
    ),
    tag = "Settings"
)]
pub async fn list_settings(
    State(state): State<AppState>,
    ctx: RequestContext,
    AppQuery(query): AppQuery<SettingsQuery>,
) -> AppResult<Json<ApiResponse<SettingList>>> {
    let resp = settings_service::list_settings(&state, &ctx, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/settings",
    request_body = UpsertSettingRequest,
    responses(
        (status = 200, description = "Created or replaced one setting", body = ApiResponse<Setting>),
        (status = 400, description = "Missing key"),
        (status = 403, description = "Admin only")
    ),
    tag = "Settings"
)]
pub async fn upsert_setting(
    State(state): State<AppState>,
    ctx: RequestContext,
    AppJson(payload): AppJson<UpsertSettingRequest>,
) -> AppResult<Json<ApiResponse<Setting>>> {
    let resp = settings_service::upsert_setting(&state, &ctx, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/admin/settings",
    request_body = BulkSettingsRequest,
    responses(
        (status = 200, description = "Created or replaced many settings", body = ApiResponse<SettingList>),
        (status = 400, description = "Invalid entry"),
        (status = 403, description = "Admin only")
    ),
    tag = "Settings"
)]
pub async fn bulk_upsert_settings(
    State(state): State<AppState>,
    ctx: RequestContext,
    AppJson(payload): AppJson<BulkSettingsRequest>,
) -> AppResult<Json<ApiResponse<SettingList>>> {
    let resp = settings_service::bulk_upsert_settings(&state, &ctx, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/settings",
    responses(
        (status = 200, description = "Public settings as key/value pairs", body = ApiResponse<PublicSettings>)
    ),
    security(()),
    tag = "Settings"
)]
pub async fn public_settings(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<PublicSettings>>> {
    let resp = settings_service::public_settings(&state).await?;
    Ok(Json(resp))
}
