//! OpenAPI document for the instareel web server

use utoipa::OpenApi;

use crate::handlers::{
    AccountRequest, ErrorResponse, GenerateReelForm, GenerateReelResponse, HealthResponse,
    LikeTopPostsRequest, LikeTopPostsResponse, LoginResponse, LogoutResponse, UploadImageForm,
    UploadImageResponse,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Instareel API",
        version = "0.1.0",
        description = "Account sessions, photo publishing and reel generation",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:8000", description = "Local development server")
    ),
    paths(
        crate::handlers::health_check,

        crate::handlers::login,
        crate::handlers::upload_image,
        crate::handlers::like_top_posts,
        crate::handlers::logout,

        crate::handlers::generate_reel,
    ),
    components(
        schemas(
            HealthResponse,
            ErrorResponse,
            AccountRequest,
            LoginResponse,
            UploadImageForm,
            UploadImageResponse,
            LikeTopPostsRequest,
            LikeTopPostsResponse,
            LogoutResponse,
            GenerateReelForm,
            GenerateReelResponse,
        )
    ),
    tags(
        (name = "Health", description = "Service liveness"),
        (name = "Accounts", description = "Login, upload, likes and logout per account"),
        (name = "Reels", description = "Image plus audio to vertical video")
    )
)]
pub struct ApiDoc;
