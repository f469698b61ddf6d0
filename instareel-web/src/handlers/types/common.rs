//! Types shared by every handler

use serde::Serialize;
use utoipa::ToSchema;

/// Health check response
#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "healthy")]
    pub status: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    #[schema(example = "0.1.0")]
    pub version: String,
}

/// Body of every failed request
#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    #[schema(example = "error")]
    pub status: String,
    /// Machine-readable error code
    #[schema(example = "not_authenticated")]
    pub error: String,
    #[schema(example = "Not authenticated: No active session for alice; log in first")]
    pub message: String,
}
