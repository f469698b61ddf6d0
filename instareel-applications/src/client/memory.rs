//! In-process platform simulation
//!
//! Used by `--dev` mode and by tests. Accounts are registered up front; a password
//! login mints a token, and expiring tokens makes every restored session stale.

use super::{ClientFactory, ClientSettings, DeviceUuids, PlatformClient, PlatformError};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// A photo the simulated platform accepted
#[derive(Debug, Clone)]
pub struct PublishedPost {
    pub media_id: String,
    pub user_id: String,
    pub caption: String,
    pub size: usize,
    pub staged_path: std::path::PathBuf,
}

#[derive(Default)]
struct PlatformState {
    /// username -> (password, user_id)
    accounts: HashMap<String, (String, String)>,
    valid_tokens: HashSet<String>,
    posts: Vec<PublishedPost>,
    password_logins: usize,
    login_devices: Vec<DeviceUuids>,
    publish_failure: Option<String>,
    probe_failure: Option<String>,
}

/// Shared simulated platform; clones observe the same state
#[derive(Clone, Default)]
pub struct InMemoryPlatform {
    state: Arc<Mutex<PlatformState>>,
}

impl InMemoryPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, PlatformState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn register_account(&self, username: &str, password: &str, user_id: &str) {
        self.state().accounts.insert(
            username.to_string(),
            (password.to_string(), user_id.to_string()),
        );
    }

    /// Invalidate every issued token
    pub fn expire_sessions(&self) {
        self.state().valid_tokens.clear();
    }

    /// Make every publish fail with `message` until cleared
    pub fn fail_publish(&self, message: Option<&str>) {
        self.state().publish_failure = message.map(str::to_string);
    }

    /// Make the timeline probe fail with a non-auth error until cleared
    pub fn fail_probe(&self, message: Option<&str>) {
        self.state().probe_failure = message.map(str::to_string);
    }

    pub fn password_login_count(&self) -> usize {
        self.state().password_logins
    }

    /// Device identifiers presented at each password login, in order
    pub fn login_devices(&self) -> Vec<DeviceUuids> {
        self.state().login_devices.clone()
    }

    pub fn published(&self) -> Vec<PublishedPost> {
        self.state().posts.clone()
    }

    pub fn factory(&self) -> InMemoryClientFactory {
        InMemoryClientFactory {
            platform: self.clone(),
        }
    }
}

#[derive(Clone)]
pub struct InMemoryClientFactory {
    platform: InMemoryPlatform,
}

impl ClientFactory for InMemoryClientFactory {
    fn create(&self) -> Result<Box<dyn PlatformClient>, PlatformError> {
        Ok(Box::new(InMemoryClient {
            platform: self.platform.clone(),
            settings: ClientSettings::default(),
            proxy: None,
        }))
    }
}

pub struct InMemoryClient {
    platform: InMemoryPlatform,
    settings: ClientSettings,
    proxy: Option<String>,
}

impl InMemoryClient {
    fn token_is_valid(&self) -> bool {
        self.settings
            .authorization
            .as_ref()
            .is_some_and(|token| self.platform.state().valid_tokens.contains(token))
    }
}

#[async_trait]
impl PlatformClient for InMemoryClient {
    fn set_delay_range(&mut self, _lower: f64, _upper: f64) {}

    fn set_proxy(&mut self, proxy_url: &str) -> Result<(), PlatformError> {
        self.proxy = (!proxy_url.is_empty()).then(|| proxy_url.to_string());
        Ok(())
    }

    async fn public_ip(&self) -> Result<String, PlatformError> {
        Ok(match self.proxy {
            Some(_) => "203.0.113.10".to_string(),
            None => "198.51.100.10".to_string(),
        })
    }

    fn settings(&self) -> ClientSettings {
        self.settings.clone()
    }

    fn set_settings(&mut self, settings: ClientSettings) {
        self.settings = settings;
    }

    fn set_uuids(&mut self, uuids: DeviceUuids) {
        self.settings.uuids = uuids;
    }

    async fn login(&mut self, username: &str, password: &str) -> Result<(), PlatformError> {
        if self.settings.is_authenticated() {
            return Ok(());
        }

        let mut state = self.platform.state();
        let user_id = match state.accounts.get(username) {
            Some((expected, user_id)) if expected == password => user_id.clone(),
            _ => {
                return Err(PlatformError::BadCredentials(format!(
                    "unknown user or wrong password for {}",
                    username
                )))
            }
        };

        let token = format!("Bearer {}", uuid::Uuid::new_v4());
        state.valid_tokens.insert(token.clone());
        state.password_logins += 1;
        state.login_devices.push(self.settings.uuids.clone());
        drop(state);

        self.settings.authorization = Some(token);
        self.settings.user_id = Some(user_id);
        self.settings.last_login = Some(chrono::Utc::now());
        Ok(())
    }

    async fn timeline_probe(&self) -> Result<(), PlatformError> {
        if let Some(message) = self.platform.state().probe_failure.clone() {
            return Err(PlatformError::Network(message));
        }
        if self.token_is_valid() {
            Ok(())
        } else {
            Err(PlatformError::LoginRequired)
        }
    }

    fn user_id(&self) -> Option<String> {
        self.settings.user_id.clone()
    }

    async fn photo_upload(&self, path: &Path, caption: &str) -> Result<String, PlatformError> {
        if !self.token_is_valid() {
            return Err(PlatformError::LoginRequired);
        }
        let size = tokio::fs::metadata(path).await?.len() as usize;

        let mut state = self.platform.state();
        if let Some(message) = state.publish_failure.clone() {
            return Err(PlatformError::Api {
                status: 400,
                message,
            });
        }

        let media_id = format!("{}", 1_000_000 + state.posts.len());
        state.posts.push(PublishedPost {
            media_id: media_id.clone(),
            user_id: self.settings.user_id.clone().unwrap_or_default(),
            caption: caption.to_string(),
            size,
            staged_path: path.to_path_buf(),
        });
        Ok(media_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_password_login_and_probe() {
        let platform = InMemoryPlatform::new();
        platform.register_account("alice", "pw", "11");
        let mut client = platform.factory().create().unwrap();

        assert!(matches!(
            client.login("alice", "wrong").await,
            Err(PlatformError::BadCredentials(_))
        ));
        client.login("alice", "pw").await.unwrap();
        assert_eq!(client.user_id().as_deref(), Some("11"));
        client.timeline_probe().await.unwrap();

        platform.expire_sessions();
        assert!(matches!(
            client.timeline_probe().await,
            Err(PlatformError::LoginRequired)
        ));
        assert_eq!(platform.password_login_count(), 1);
    }

    #[tokio::test]
    async fn test_proxy_changes_reported_ip() {
        let platform = InMemoryPlatform::new();
        let mut client = platform.factory().create().unwrap();
        let before = client.public_ip().await.unwrap();
        client.set_proxy("http://proxy:3128").unwrap();
        assert_ne!(before, client.public_ip().await.unwrap());
    }
}
