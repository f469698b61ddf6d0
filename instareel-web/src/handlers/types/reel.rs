//! Reel endpoint types

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Multipart form accepted by `/generate_reel`
#[derive(ToSchema)]
pub struct GenerateReelForm {
    #[schema(value_type = String, format = Binary)]
    pub image: Vec<u8>,
    #[schema(value_type = String, format = Binary)]
    pub audio: Vec<u8>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GenerateReelResponse {
    #[schema(example = "success")]
    pub status: String,
    #[schema(example = "Reel created successfully")]
    pub message: String,
    /// Absolute path of the encoded video
    #[schema(example = "/srv/instareel/completed_reels/reel_0b6c.mp4")]
    pub file_path: String,
}
