use axum::body::Bytes;
use uuid::Uuid;

use crate::{
    dto::upload::UploadedFile,
    error::{AppError, AppResult},
    middleware::auth::{RequestContext, ensure_permission},
    models::Permission,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub const MAX_UPLOAD_BYTES: usize = 2 * 1024 * 1024;
pub const PUBLIC_PREFIX: &str = "/uploads";

/// One file pulled out of a multipart body.
#[derive(Debug)]
pub struct IncomingFile {
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

pub async fn store_image(
    state: &AppState,
    ctx: &RequestContext,
    file: IncomingFile,
) -> AppResult<ApiResponse<UploadedFile>> {
    ensure_permission(ctx, Permission::UploadMedia)?;

    if file.bytes.is_empty() {
        return Err(AppError::BadRequest("file is empty".into()));
    }
    if file.bytes.len() > MAX_UPLOAD_BYTES {
        return Err(AppError::BadRequest(format!(
            "file exceeds the {} MiB limit",
            MAX_UPLOAD_BYTES / (1024 * 1024)
        )));
    }
    let content_type = file
        .content_type
        .as_deref()
        .map(|ct| ct.trim().to_ascii_lowercase())
        .filter(|ct| ct.starts_with("image/"))
        .ok_or_else(|| AppError::BadRequest("only image uploads are allowed".into()))?;
    let extension = image_extension(&content_type)
        .ok_or_else(|| AppError::BadRequest("unsupported image type".into()))?;

    let filename = format!("{}.{}", Uuid::new_v4(), extension);
    let dir = &state.config.upload_dir;
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("create {}: {e}", dir.display())))?;
    tokio::fs::write(dir.join(&filename), &file.bytes)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("write {filename}: {e}")))?;

    tracing::info!(
        user_id = %ctx.user_id,
        %filename,
        original = file.filename.as_deref().unwrap_or("-"),
        %content_type,
        size = file.bytes.len(),
        "image uploaded"
    );
    Ok(ApiResponse::success(
        "Uploaded",
        UploadedFile {
            url: format!("{PUBLIC_PREFIX}/{filename}"),
            filename,
            content_type,
            size: file.bytes.len(),
        },
        Some(Meta::empty()),
    ))
}

/// Raster formats only. SVG can carry script and is refused.
fn image_extension(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/png" => Some("png"),
        "image/jpeg" | "image/jpg" | "image/pjpeg" => Some("jpg"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        "image/avif" => Some("avif"),
        "image/bmp" => Some("bmp"),
        "image/x-icon" | "image/vnd.microsoft.icon" => Some("ico"),
        _ => None,
    }
}
