//! Account handlers: login, photo upload, likes and logout

use super::extract::ApiJson;
use super::multipart::FormParts;
use super::types::{
    AccountRequest, ErrorResponse, LikeTopPostsRequest, LikeTopPostsResponse, LoginResponse,
    LogoutResponse, UploadImageForm, UploadImageResponse,
};
use crate::{ApiError, AppState};
use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    response::Json,
};
use instareel_applications::LogoutOutcome;
use tracing::info;

/// Log an account in and cache its session
#[utoipa::path(
    post,
    path = "/login",
    tag = "Accounts",
    request_body = AccountRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 400, description = "Credential file is malformed", body = ErrorResponse),
        (status = 401, description = "Platform rejected the login", body = ErrorResponse),
        (status = 404, description = "No credential file for the account", body = ErrorResponse),
        (status = 504, description = "Login timed out", body = ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<AccountRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let outcome = state.application.login(&request.username).await?;
    info!(
        account_id = %outcome.account_id,
        user_id = %outcome.user_id,
        method = ?outcome.method,
        "Logged in successfully"
    );

    Ok(Json(LoginResponse {
        status: "success".to_string(),
        user_id: outcome.user_id,
    }))
}

/// Publish a photo through the account's session
#[utoipa::path(
    post,
    path = "/upload_image",
    tag = "Accounts",
    request_body(content = UploadImageForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Photo published", body = UploadImageResponse),
        (status = 401, description = "No active session", body = ErrorResponse),
        (status = 422, description = "Form incomplete", body = ErrorResponse),
        (status = 500, description = "Platform rejected the upload", body = ErrorResponse)
    )
)]
pub async fn upload_image(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadImageResponse>, ApiError> {
    let mut form = FormParts::read(multipart?).await?;
    let username = form.text("username")?;
    let caption = form.text("caption")?;
    let image = form.file("image")?;

    let receipt = state
        .application
        .upload_image(&username, image, &caption)
        .await?;

    Ok(Json(UploadImageResponse {
        status: "success".to_string(),
        message: receipt.message,
    }))
}

/// Acknowledge a like-top-posts request; no likes are performed
#[utoipa::path(
    post,
    path = "/like_top_posts",
    tag = "Accounts",
    request_body = LikeTopPostsRequest,
    responses(
        (status = 200, description = "Request acknowledged", body = LikeTopPostsResponse),
        (status = 401, description = "No active session", body = ErrorResponse)
    )
)]
pub async fn like_top_posts(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LikeTopPostsRequest>,
) -> Result<Json<LikeTopPostsResponse>, ApiError> {
    let report = state
        .application
        .like_top_posts(&request.username, request.n)
        .await?;

    Ok(Json(LikeTopPostsResponse {
        status: "likes_performed".to_string(),
        for_user: report.user_id,
    }))
}

/// Drop the account's cached session
#[utoipa::path(
    post,
    path = "/logout",
    tag = "Accounts",
    request_body = AccountRequest,
    responses(
        (status = 200, description = "`logout` or `not_found`", body = LogoutResponse),
        (status = 422, description = "Malformed body", body = ErrorResponse)
    )
)]
pub async fn logout(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<AccountRequest>,
) -> Result<Json<LogoutResponse>, ApiError> {
    let response = match state.application.logout(&request.username).await {
        LogoutOutcome::Removed => LogoutResponse {
            status: "logout".to_string(),
            message: format!("Sessions for {} removed.", request.username),
        },
        LogoutOutcome::NotFound => LogoutResponse {
            status: "not_found".to_string(),
            message: "No active session found to close".to_string(),
        },
    };
    Ok(Json(response))
}
