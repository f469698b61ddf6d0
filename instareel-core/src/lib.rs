//! Instareel Core - shared configuration, error and logging primitives
//!
//! Everything the orchestration layer and the web facade have in common lives here.

pub mod config;
pub mod error;
pub mod logging;
pub mod types;

pub use config::*;
pub use error::*;
pub use logging::*;
pub use types::*;

// Re-export commonly used external types
pub use async_trait::async_trait;
pub use tokio;
pub use tracing;
