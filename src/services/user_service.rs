use uuid::Uuid;

use crate::{
    dto::users::{CreateUserRequest, UpdateUserRequest, UserList},
    error::{AppError, AppResult},
    middleware::auth::{RequestContext, ensure_permission},
    models::{NewUser, Permission, Role, User, UserPatch, UserStatus},
    response::{ApiResponse, Meta, paginate},
    routes::params::Pagination,
    services::{
        auth_service::{default_username, hash_password, normalize_email, validate_password},
        required,
    },
    state::AppState,
};

pub async fn list_users(
    state: &AppState,
    ctx: &RequestContext,
    pagination: Pagination,
) -> AppResult<ApiResponse<UserList>> {
    ensure_permission(ctx, Permission::ManageUsers)?;
    let (page, per_page) = pagination.normalize();
    let users = state.store.users().list_users().await?;
    let (items, meta) = paginate(users, page, per_page);
    Ok(ApiResponse::success("Users", UserList { items }, Some(meta)))
}

pub async fn get_user(
    state: &AppState,
    ctx: &RequestContext,
    id: Uuid,
) -> AppResult<ApiResponse<User>> {
    if !ctx.can_access(id, Permission::ManageUsers) {
        return Err(AppError::Forbidden);
    }
    let user = state
        .store
        .users()
        .get_user(id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("User", user, None))
}

pub async fn create_user(
    state: &AppState,
    ctx: &RequestContext,
    payload: CreateUserRequest,
) -> AppResult<ApiResponse<User>> {
    ensure_permission(ctx, Permission::ManageUsers)?;
    let email = normalize_email(&payload.email)?;
    validate_password(&payload.password)?;
    let username = match payload.username.as_deref() {
        Some(name) => required(name, "username")?,
        None => default_username(&email),
    };

    let user = state
        .store
        .users()
        .create_user(NewUser {
            email,
            username,
            password_hash: hash_password(&payload.password)?,
            role: payload.role.unwrap_or(Role::User),
            status: payload.status.unwrap_or(UserStatus::Active),
        })
        .await?;

    tracing::info!(user_id = %ctx.user_id, created = %user.id, "user created by admin");
    Ok(ApiResponse::success("User created", user, Some(Meta::empty())))
}

pub async fn update_user(
    state: &AppState,
    ctx: &RequestContext,
    id: Uuid,
    payload: UpdateUserRequest,
) -> AppResult<ApiResponse<User>> {
    let is_admin = ctx.can(Permission::ManageUsers);
    if !is_admin {
        // Members may only edit their own username and password.
        if ctx.user_id != id || payload.role.is_some() || payload.status.is_some() {
            return Err(AppError::Forbidden);
        }
    }
    if ctx.user_id == id && payload.role.is_some_and(|role| role != ctx.role) {
        return Err(AppError::BadRequest("You cannot change your own role".into()));
    }
    if ctx.user_id == id && payload.status == Some(UserStatus::Inactive) {
        return Err(AppError::BadRequest("You cannot deactivate yourself".into()));
    }

    let username = payload
        .username
        .as_deref()
        .map(|name| required(name, "username"))
        .transpose()?;
    let password_hash = match payload.password.as_deref() {
        Some(password) => {
            validate_password(password)?;
            Some(hash_password(password)?)
        }
        None => None,
    };

    let user = state
        .store
        .users()
        .update_user(
            id,
            UserPatch {
                username,
                password_hash,
                role: payload.role,
                status: payload.status,
            },
        )
        .await?
        .ok_or(AppError::NotFound)?;

    tracing::info!(user_id = %ctx.user_id, updated = %user.id, "user updated");
    Ok(ApiResponse::success("Updated", user, Some(Meta::empty())))
}

pub async fn delete_user(
    state: &AppState,
    ctx: &RequestContext,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_permission(ctx, Permission::ManageUsers)?;
    if ctx.user_id == id {
        return Err(AppError::BadRequest("You cannot delete your own account".into()));
    }
    if !state.store.users().delete_user(id).await? {
        return Err(AppError::NotFound);
    }

    tracing::info!(user_id = %ctx.user_id, deleted = %id, "user deleted");
    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({ "id": id }),
        Some(Meta::empty()),
    ))
}
