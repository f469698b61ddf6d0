//! Route definitions for the instareel web server

use crate::{handlers, AppState};
use axum::{
    routing::{get, post},
    Router,
};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Account sessions
        .route("/login", post(handlers::login))
        .route("/logout", post(handlers::logout))
        // Account actions
        .route("/upload_image", post(handlers::upload_image))
        .route("/like_top_posts", post(handlers::like_top_posts))
        // Reels
        .route("/generate_reel", post(handlers::generate_reel))
}
