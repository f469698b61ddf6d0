//! Extractors whose rejections use the service's JSON error body

use crate::ApiError;
use axum::extract::{
    multipart::MultipartRejection,
    rejection::JsonRejection,
    FromRequest,
};

/// `axum::Json` with failures reported as [`ApiError::BadRequest`]
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}
