//! Reel generation handler

use super::multipart::FormParts;
use super::types::{ErrorResponse, GenerateReelForm, GenerateReelResponse};
use crate::{ApiError, AppState};
use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    response::Json,
};
use tracing::info;

/// Composite an image and an audio track into a 1080x1920 reel
#[utoipa::path(
    post,
    path = "/generate_reel",
    tag = "Reels",
    request_body(content = GenerateReelForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Reel encoded", body = GenerateReelResponse),
        (status = 422, description = "Form incomplete or empty payload", body = ErrorResponse),
        (status = 500, description = "Encoding failed", body = ErrorResponse),
        (status = 504, description = "Encoding timed out", body = ErrorResponse)
    )
)]
pub async fn generate_reel(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<GenerateReelResponse>, ApiError> {
    let mut form = FormParts::read(multipart?).await?;
    let image = form.file("image")?;
    let audio = form.file("audio")?;

    let output = state.application.generate_reel(image, audio).await?;
    info!(
        request_id = %output.request_id,
        duration_secs = output.duration_secs,
        "Reel created"
    );

    Ok(Json(GenerateReelResponse {
        status: "success".to_string(),
        message: "Reel created successfully".to_string(),
        file_path: output.file_path.display().to_string(),
    }))
}
