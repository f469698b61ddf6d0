//! Core data type definitions

use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InstareelConfig {
    pub paths: PathsConfig,
    pub platform: PlatformConfig,
    pub media: MediaConfig,
    pub logging: LoggingConfig,
}

/// On-disk locations consumed and produced by the service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory holding `{account_id}_creds.json` files
    pub credentials_dir: PathBuf,
    /// Directory holding `{account_id}_session.json` files
    pub sessions_dir: PathBuf,
    /// Scratch directory for uploaded media
    pub staging_dir: PathBuf,
    /// Directory receiving generated reels
    pub output_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            credentials_dir: PathBuf::from("creds"),
            sessions_dir: PathBuf::from("sessions"),
            staging_dir: PathBuf::from("temp_uploads"),
            output_dir: PathBuf::from("completed_reels"),
        }
    }
}

impl PathsConfig {
    /// All four directories rooted under `base`
    pub fn rooted_at(base: impl Into<PathBuf>) -> Self {
        let base = base.into();
        Self {
            credentials_dir: base.join("creds"),
            sessions_dir: base.join("sessions"),
            staging_dir: base.join("temp_uploads"),
            output_dir: base.join("completed_reels"),
        }
    }
}

/// Social platform client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    /// Base URL of the platform's private API
    pub base_url: String,
    /// Public IP echo service used to verify proxy egress
    pub ip_echo_url: String,
    /// Per-request timeout
    pub request_timeout_secs: u64,
    /// Upper bound for a whole login attempt (restore, probe and password fallback)
    pub login_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            base_url: "https://i.instagram.com/api/v1".to_string(),
            ip_echo_url: "https://api.ipify.org/".to_string(),
            request_timeout_secs: 30,
            login_timeout_secs: 60,
            user_agent: concat!("instareel/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Reel encoding settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    pub ffmpeg_path: String,
    pub ffprobe_path: String,
    /// Output frame width in pixels
    pub width: u32,
    /// Output frame height in pixels
    pub height: u32,
    pub fps: u32,
    pub preset: String,
    pub video_codec: String,
    pub audio_codec: String,
    pub encode_timeout_secs: u64,
    /// Generated reels older than this are swept; `None` keeps them forever
    pub reel_retention_hours: Option<u64>,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
            ffprobe_path: "ffprobe".to_string(),
            width: 1080,
            height: 1920,
            fps: 24,
            preset: "ultrafast".to_string(),
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
            encode_timeout_secs: 300,
            reel_retention_hours: None,
        }
    }
}
