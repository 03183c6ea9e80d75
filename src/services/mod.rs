use crate::error::{AppError, AppResult};

pub mod auth_service;
pub mod cart_service;
pub mod order_service;
pub mod product_service;
pub mod settings_service;
pub mod upload_service;
pub mod user_service;

/// Trimmed, non-empty value of a required text field.
pub(crate) fn required(value: &str, field: &str) -> AppResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::BadRequest(format!("{field} is required")));
    }
    Ok(value.to_string())
}
