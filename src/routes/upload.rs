use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State},
    routing::post,
};

use crate::{
    dto::upload::UploadedFile,
    error::{AppError, AppResult},
    middleware::auth::RequestContext,
    response::ApiResponse,
    services::upload_service::{self, IncomingFile, MAX_UPLOAD_BYTES},
    state::AppState,
};

const FILE_FIELD: &str = "file";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(upload_image))
        // Leave room for multipart framing so the size check reports a 400.
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + 64 * 1024))
}

#[utoipa::path(
    post,
    path = "/api/upload",
    request_body(content_type = "multipart/form-data", description = "Image in the `file` field, at most 2 MiB"),
    responses(
        (status = 200, description = "Stored image and its public URL", body = ApiResponse<UploadedFile>),
        (status = 400, description = "Missing file, not an image, or too large"),
        (status = 403, description = "Admin only")
    ),
    tag = "Upload"
)]
pub async fn upload_image(
    State(state): State<AppState>,
    ctx: RequestContext,
    mut multipart: Multipart,
) -> AppResult<Json<ApiResponse<UploadedFile>>> {
    let mut file = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let filename = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        file = Some(IncomingFile {
            filename,
            content_type,
            bytes,
        });
        break;
    }
    let file = file.ok_or_else(|| {
        AppError::BadRequest(format!("missing '{FILE_FIELD}' field in multipart body"))
    })?;

    let resp = upload_service::store_image(&state, &ctx, file).await?;
    Ok(Json(resp))
}
