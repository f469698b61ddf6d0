//! Account endpoint types

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Body of `/login` and `/logout`
#[derive(Debug, Deserialize, ToSchema)]
pub struct AccountRequest {
    /// Account identifier; selects the credential file
    #[schema(example = "alice")]
    pub username: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    #[schema(example = "success")]
    pub status: String,
    #[schema(example = "1234567890")]
    pub user_id: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadImageResponse {
    #[schema(example = "success")]
    pub status: String,
    #[schema(example = "Image uploaded to instagram")]
    pub message: String,
}

/// Multipart form accepted by `/upload_image`
#[derive(ToSchema)]
pub struct UploadImageForm {
    pub username: String,
    pub caption: String,
    #[schema(value_type = String, format = Binary)]
    pub image: Vec<u8>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LikeTopPostsRequest {
    #[schema(example = "alice")]
    pub username: String,
    /// Number of posts to like
    #[schema(example = 5)]
    pub n: u32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LikeTopPostsResponse {
    #[schema(example = "likes_performed")]
    pub status: String,
    /// Platform user id of the account
    #[schema(example = "1234567890")]
    pub for_user: String,
}

/// `status` is `logout` when a session was dropped, `not_found` otherwise
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LogoutResponse {
    #[schema(example = "logout")]
    pub status: String,
    #[schema(example = "Sessions for alice removed.")]
    pub message: String,
}
