//! Instareel Web Server
//!
//! Thin HTTP facade over [`instareel_applications::InstareelApplication`].

pub mod handlers;
pub mod openapi;
pub mod routes;
pub mod server;
pub mod state;

// Re-export main types
pub use server::{InstareelServer, InstareelServerBuilder};
pub use state::AppState;

use axum::{
    extract::DefaultBodyLimit,
    http::{header::CONTENT_TYPE, Method, StatusCode},
    response::{IntoResponse, Response},
    Json, Router,
};
use instareel_applications::ApplicationError;
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Create the main application router
pub fn create_app(state: AppState) -> Router {
    let cors = if state.config.dev_mode {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([CONTENT_TYPE])
    };
    let body_limit = state.config.max_upload_mb * 1024 * 1024;

    Router::new()
        .merge(routes::api_routes())
        .merge(
            SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi::ApiDoc::openapi()),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

/// Configuration for the web server
#[derive(Debug, Clone)]
pub struct WebConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Development mode: simulated platform, permissive CORS
    pub dev_mode: bool,
    /// Path to the TOML service configuration
    pub config_path: Option<String>,
    /// Largest accepted request body in MiB
    pub max_upload_mb: usize,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            dev_mode: false,
            config_path: None,
            max_upload_mb: 50,
        }
    }
}

impl WebConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("INSTAREEL_HOST").unwrap_or(defaults.host),
            port: std::env::var("INSTAREEL_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            dev_mode: std::env::var("INSTAREEL_DEV_MODE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.dev_mode),
            config_path: std::env::var("INSTAREEL_CONFIG").ok(),
            max_upload_mb: std::env::var("INSTAREEL_MAX_UPLOAD_MB")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_upload_mb),
        }
    }

    /// Get the server address
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Error types for the web server
#[derive(thiserror::Error, Debug)]
pub enum WebError {
    #[error("Server error: {0}")]
    Server(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Application error: {0}")]
    Application(#[from] ApplicationError),
}

/// Result type for web operations
pub type WebResult<T> = Result<T, WebError>;

/// Error returned by request handlers
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Application(#[from] ApplicationError),

    #[error("Invalid request: {0}")]
    BadRequest(String),
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::BadRequest(_) => (StatusCode::UNPROCESSABLE_ENTITY, "invalid_request"),
            ApiError::Application(err) => match err {
                ApplicationError::CredentialsNotFound { .. } => {
                    (StatusCode::NOT_FOUND, "credentials_not_found")
                }
                ApplicationError::InvalidCredentials { .. } => {
                    (StatusCode::BAD_REQUEST, "invalid_credentials")
                }
                ApplicationError::AuthenticationFailed { .. } => {
                    (StatusCode::UNAUTHORIZED, "authentication_failed")
                }
                ApplicationError::NotAuthenticated { .. } => {
                    (StatusCode::UNAUTHORIZED, "not_authenticated")
                }
                ApplicationError::Validation { .. } => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "invalid_request")
                }
                ApplicationError::Timeout { .. } => (StatusCode::GATEWAY_TIMEOUT, "timeout"),
                ApplicationError::Core(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
                ApplicationError::Platform(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "platform_error")
                }
                ApplicationError::Media(_) => (StatusCode::INTERNAL_SERVER_ERROR, "media_error"),
                ApplicationError::Io(_) | ApplicationError::Serialization(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
                }
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = self.parts();
        if status.is_server_error() {
            tracing::error!(error = %self, code = error_code, "Request failed");
        } else {
            tracing::info!(error = %self, code = error_code, "Request rejected");
        }

        let body = Json(json!({
            "status": "error",
            "error": error_code,
            "message": self.to_string(),
        }));

        (status, body).into_response()
    }
}
