use std::collections::BTreeMap;

use crate::{
    dto::settings::{
        BulkSettingsRequest, PublicSettings, SettingList, SettingsQuery, UpsertSettingRequest,
    },
    error::{AppError, AppResult},
    middleware::auth::{RequestContext, ensure_permission},
    models::{NewSetting, Permission, Setting},
    response::{ApiResponse, Meta},
    services::required,
    state::AppState,
};

pub const DEFAULT_CATEGORY: &str = "general";

pub async fn list_settings(
    state: &AppState,
    ctx: &RequestContext,
    query: SettingsQuery,
) -> AppResult<ApiResponse<SettingList>> {
    ensure_permission(ctx, Permission::ManageSettings)?;
    let category = query.category.as_deref().map(str::trim).filter(|c| !c.is_empty());
    let items: Vec<Setting> = state
        .store
        .settings()
        .list_settings()
        .await?
        .into_iter()
        .filter(|s| category.is_none_or(|c| s.category.eq_ignore_ascii_case(c)))
        .collect();

    let total = items.len() as i64;
    Ok(ApiResponse::success(
        "Settings",
        SettingList { items },
        Some(Meta::new(1, total, total)),
    ))
}

pub async fn upsert_setting(
    state: &AppState,
    ctx: &RequestContext,
    payload: UpsertSettingRequest,
) -> AppResult<ApiResponse<Setting>> {
    ensure_permission(ctx, Permission::ManageSettings)?;
    let setting = to_new_setting(payload)?;
    let saved = state.store.settings().upsert_setting(setting).await?;

    tracing::info!(user_id = %ctx.user_id, key = %saved.key, "setting saved");
    Ok(ApiResponse::success("Saved", saved, Some(Meta::empty())))
}

/// Validates every entry before writing any of them.
pub async fn bulk_upsert_settings(
    state: &AppState,
    ctx: &RequestContext,
    payload: BulkSettingsRequest,
) -> AppResult<ApiResponse<SettingList>> {
    ensure_permission(ctx, Permission::ManageSettings)?;
    if payload.settings.is_empty() {
        return Err(AppError::BadRequest("settings must not be empty".into()));
    }
    let pending = payload
        .settings
        .into_iter()
        .map(to_new_setting)
        .collect::<AppResult<Vec<_>>>()?;

    let store = state.store.settings();
    let mut items = Vec::with_capacity(pending.len());
    for setting in pending {
        items.push(store.upsert_setting(setting).await?);
    }

    tracing::info!(user_id = %ctx.user_id, count = items.len(), "settings saved");
    let total = items.len() as i64;
    Ok(ApiResponse::success(
        "Saved",
        SettingList { items },
        Some(Meta::new(1, total, total)),
    ))
}

pub async fn public_settings(state: &AppState) -> AppResult<ApiResponse<PublicSettings>> {
    let values: BTreeMap<String, String> = state
        .store
        .settings()
        .list_settings()
        .await?
        .into_iter()
        .filter(|s| s.is_public)
        .map(|s| (s.key, s.value))
        .collect();
    Ok(ApiResponse::success("Settings", PublicSettings { values }, None))
}

fn to_new_setting(payload: UpsertSettingRequest) -> AppResult<NewSetting> {
    let key = required(&payload.key, "key")?;
    let category = payload
        .category
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());
    Ok(NewSetting {
        key,
        value: payload.value,
        category,
        is_public: payload.is_public.unwrap_or(false),
    })
}
