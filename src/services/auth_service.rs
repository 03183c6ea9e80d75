use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{DateTime, Utc};
use password_hash::rand_core::OsRng;

use crate::{
    dto::auth::{LoginRequest, LoginResponse, RegisterRequest},
    error::{AppError, AppResult},
    middleware::auth::{RequestContext, issue_token},
    models::{NewUser, Role, User, UserStatus},
    response::{ApiResponse, Meta},
    services::required,
    state::AppState,
};

pub const REGISTRATION_ENABLED_KEY: &str = "registration_enabled";
pub const REGISTRATION_DAILY_LIMIT_KEY: &str = "registration_daily_limit";

const MIN_PASSWORD_LEN: usize = 8;

pub async fn register_user(
    state: &AppState,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<User>> {
    let email = normalize_email(&payload.email)?;
    validate_password(&payload.password)?;
    let username = match payload.username.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => default_username(&email),
    };

    let users = state.store.users();
    // The very first account bootstraps the shop and skips the registration gate.
    let is_first = users.count_users().await? == 0;
    if !is_first {
        enforce_registration_gate(state, Utc::now()).await?;
    }

    if users.find_user_by_email(&email).await?.is_some() {
        return Err(AppError::BadRequest("Email is already taken".to_string()));
    }

    let role = if is_first { Role::Admin } else { Role::User };
    let user = users
        .create_user(NewUser {
            email,
            username,
            password_hash: hash_password(&payload.password)?,
            role,
            status: UserStatus::Active,
        })
        .await?;

    tracing::info!(user_id = %user.id, role = user.role.as_str(), "user registered");
    Ok(ApiResponse::success("User created", user, None))
}

/// Reads the enable flag and daily quota from settings on every call.
async fn enforce_registration_gate(state: &AppState, now: DateTime<Utc>) -> AppResult<()> {
    let settings = state.store.settings();

    let enabled = settings
        .get_setting(REGISTRATION_ENABLED_KEY)
        .await?
        .map(|s| !matches!(s.value.trim().to_ascii_lowercase().as_str(), "false" | "0" | "no" | "off"))
        .unwrap_or(true);
    if !enabled {
        return Err(AppError::RegistrationDisabled);
    }

    let limit = settings
        .get_setting(REGISTRATION_DAILY_LIMIT_KEY)
        .await?
        .and_then(|s| s.value.trim().parse::<u64>().ok())
        .unwrap_or(0);
    if limit == 0 {
        return Ok(());
    }

    let registered_today = state
        .store
        .users()
        .count_users_created_since(start_of_day(now))
        .await?;
    if registered_today >= limit {
        tracing::warn!(limit, registered_today, "daily registration quota reached");
        return Err(AppError::QuotaExceeded { limit });
    }
    Ok(())
}

fn start_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|midnight| midnight.and_utc())
        .unwrap_or(now)
}

pub async fn login_user(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let email = payload.email.trim().to_lowercase();
    let user = state
        .store
        .users()
        .find_user_by_email(&email)
        .await?
        .ok_or_else(|| AppError::BadRequest("Invalid email or password".into()))?;

    if !verify_password(&payload.password, &user.password_hash)? {
        return Err(AppError::BadRequest("Invalid email or password".into()));
    }
    if user.status == UserStatus::Inactive {
        return Err(AppError::Forbidden);
    }

    let token = issue_token(&state.config.jwt_secret, &user)?;
    tracing::info!(user_id = %user.id, "user logged in");

    Ok(ApiResponse::success(
        "Logged in",
        LoginResponse {
            token: format!("Bearer {}", token),
            user,
        },
        Some(Meta::empty()),
    ))
}

pub async fn current_user(
    state: &AppState,
    ctx: &RequestContext,
) -> AppResult<ApiResponse<User>> {
    let user = state
        .store
        .users()
        .get_user(ctx.user_id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Profile", user, None))
}

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

pub fn normalize_email(email: &str) -> AppResult<String> {
    let email = required(email, "email")?.to_lowercase();
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !valid {
        return Err(AppError::BadRequest("email is invalid".into()));
    }
    Ok(email)
}

pub fn validate_password(password: &str) -> AppResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::BadRequest(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

pub(crate) fn default_username(email: &str) -> String {
    email.split('@').next().unwrap_or(email).to_string()
}
