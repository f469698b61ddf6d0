//! External social platform client
//!
//! The service never speaks the platform protocol itself beyond what
//! [`PlatformClient`] exposes. [`HttpClientFactory`] builds clients that talk to the
//! platform's HTTP API; [`InMemoryPlatform`] simulates the platform for development
//! mode and tests.

pub mod http;
pub mod memory;

pub use http::{HttpClientFactory, HttpPlatformClient};
pub use memory::{InMemoryClient, InMemoryClientFactory, InMemoryPlatform, PublishedPost};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Errors raised by a platform client
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    /// The platform rejected the session; a fresh login is needed
    #[error("login required")]
    LoginRequired,

    #[error("bad credentials: {0}")]
    BadCredentials(String),

    #[error("invalid proxy: {0}")]
    InvalidProxy(String),

    #[error("network error: {0}")]
    Network(String),

    /// The HTTP client could not be constructed from the configuration
    #[error("client setup failed: {0}")]
    Setup(String),

    #[error("platform API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for PlatformError {
    fn from(err: reqwest::Error) -> Self {
        PlatformError::Network(err.to_string())
    }
}

/// Device identifiers the platform ties a login to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceUuids {
    pub phone_id: String,
    pub uuid: String,
    pub client_session_id: String,
    pub advertising_id: String,
    pub android_device_id: String,
}

impl DeviceUuids {
    pub fn generate() -> Self {
        let simple = uuid::Uuid::new_v4().simple().to_string();
        Self {
            phone_id: uuid::Uuid::new_v4().to_string(),
            uuid: uuid::Uuid::new_v4().to_string(),
            client_session_id: uuid::Uuid::new_v4().to_string(),
            advertising_id: uuid::Uuid::new_v4().to_string(),
            android_device_id: format!("android-{}", &simple[..16]),
        }
    }
}

/// Everything a client needs to resume a session; persisted as the session file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientSettings {
    pub uuids: DeviceUuids,
    #[serde(default)]
    pub authorization: Option<String>,
    #[serde(default)]
    pub cookies: HashMap<String, String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub last_login: Option<chrono::DateTime<chrono::Utc>>,
}

impl Default for ClientSettings {
    /// Fresh settings: new device identifiers and no authentication material
    fn default() -> Self {
        Self {
            uuids: DeviceUuids::generate(),
            authorization: None,
            cookies: HashMap::new(),
            user_id: None,
            user_agent: None,
            last_login: None,
        }
    }
}

impl ClientSettings {
    /// Whether the settings carry enough to skip a password login
    pub fn is_authenticated(&self) -> bool {
        self.authorization.is_some() && self.user_id.is_some()
    }
}

/// An authenticated (or authenticating) client for one account.
///
/// Mutating calls happen only while logging in; once stored in the session store a
/// client is used through `&self`.
#[async_trait]
pub trait PlatformClient: Send + Sync {
    /// Sleep a random duration within `[lower, upper]` seconds after each request
    fn set_delay_range(&mut self, lower: f64, upper: f64);

    /// Route all further requests through `proxy_url`; an empty string means direct
    fn set_proxy(&mut self, proxy_url: &str) -> Result<(), PlatformError>;

    /// Public egress address as seen by the IP echo service
    async fn public_ip(&self) -> Result<String, PlatformError>;

    fn settings(&self) -> ClientSettings;

    fn set_settings(&mut self, settings: ClientSettings);

    fn set_uuids(&mut self, uuids: DeviceUuids);

    /// Log in; a client holding authenticated settings reuses them
    async fn login(&mut self, username: &str, password: &str) -> Result<(), PlatformError>;

    /// Lightweight authenticated request, fails with `LoginRequired` on a stale session
    async fn timeline_probe(&self) -> Result<(), PlatformError>;

    fn user_id(&self) -> Option<String>;

    /// Publish a photo, returning the platform's media id
    async fn photo_upload(&self, path: &Path, caption: &str) -> Result<String, PlatformError>;
}

/// Builds fresh, unauthenticated clients
pub trait ClientFactory: Send + Sync {
    fn create(&self) -> Result<Box<dyn PlatformClient>, PlatformError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_settings_have_new_uuids() {
        let a = ClientSettings::default();
        let b = ClientSettings::default();
        assert_ne!(a.uuids, b.uuids);
        assert!(!a.is_authenticated());
        assert!(a.uuids.android_device_id.starts_with("android-"));
    }

    #[test]
    fn test_settings_tolerate_missing_optional_fields() {
        let json = serde_json::json!({
            "uuids": DeviceUuids::generate(),
        });
        let settings: ClientSettings = serde_json::from_value(json).unwrap();
        assert!(settings.cookies.is_empty());
        assert!(settings.user_id.is_none());
    }
}
