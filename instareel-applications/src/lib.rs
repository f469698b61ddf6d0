//! Instareel Applications - account sessions, photo publishing and reel composition
//!
//! This crate holds the orchestration logic that sits between the web facade and the
//! two external collaborators the service delegates to:
//!
//! - a social platform client ([`client::PlatformClient`]) that authenticates accounts
//!   and publishes photos
//! - a media engine ([`reel::MediaEngine`]) that composites an image and an audio
//!   track into a vertical video
//!
//! ## Architecture
//!
//! - **Credentials** (`credentials`): per-account credential files
//! - **Sessions** (`session`): in-memory session store, per-account locks and the
//!   persisted client settings
//! - **Login / Upload** (`login`, `upload`): the two account-bound workflows
//! - **Reels** (`reel`): staging, encoding and retention of generated reels
//!
//! [`InstareelApplication`] wires all of them together and serializes work per account.

pub mod client;
pub mod credentials;
pub mod login;
pub mod reel;
pub mod session;
pub mod staging;
pub mod upload;

pub use client::{
    ClientFactory, ClientSettings, DeviceUuids, HttpClientFactory, InMemoryClientFactory,
    InMemoryPlatform, PlatformClient, PlatformError,
};
pub use credentials::{CredentialRecord, CredentialStore};
pub use login::{LoginMethod, LoginOrchestrator, LoginOutcome};
pub use reel::{FfmpegEngine, FrameSpec, MediaEngine, MediaError, ReelCompositor, ReelOutput};
pub use session::{AccountGuard, AccountLocks, SessionFiles, SessionHandle, SessionStore};
pub use staging::{MediaPayload, StagedFile};
pub use upload::{UploadOrchestrator, UploadReceipt};

use instareel_core::InstareelConfig;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Application-level error type
#[derive(Debug, thiserror::Error)]
pub enum ApplicationError {
    #[error("Core error: {0}")]
    Core(#[from] instareel_core::InstareelError),

    #[error("Credentials not found: {message}")]
    CredentialsNotFound { message: String },

    #[error("Invalid credentials: {message}")]
    InvalidCredentials { message: String },

    #[error("Unable to authenticate: {message}")]
    AuthenticationFailed { message: String },

    #[error("Not authenticated: {message}")]
    NotAuthenticated { message: String },

    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    #[error("Operation timed out: {operation} after {duration_ms}ms")]
    Timeout { operation: String, duration_ms: u64 },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type ApplicationResult<T> = Result<T, ApplicationError>;

impl ApplicationError {
    /// Create a credentials-not-found error
    pub fn credentials_not_found<S: Into<String>>(message: S) -> Self {
        Self::CredentialsNotFound {
            message: message.into(),
        }
    }

    /// Create an invalid-credentials error
    pub fn invalid_credentials<S: Into<String>>(message: S) -> Self {
        Self::InvalidCredentials {
            message: message.into(),
        }
    }

    /// Create an authentication failure
    pub fn authentication_failed<S: Into<String>>(message: S) -> Self {
        Self::AuthenticationFailed {
            message: message.into(),
        }
    }

    /// Create a missing-session error for `account_id`
    pub fn not_authenticated(account_id: &str) -> Self {
        Self::NotAuthenticated {
            message: format!("No active session for {}; log in first", account_id),
        }
    }

    /// Create a validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a timeout error
    pub fn timeout(operation: &str, limit: Duration) -> Self {
        Self::Timeout {
            operation: operation.to_string(),
            duration_ms: limit.as_millis() as u64,
        }
    }
}

/// Result of a logout request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogoutOutcome {
    Removed,
    NotFound,
}

/// Result of the like-top-posts request
#[derive(Debug, Clone, Serialize)]
pub struct LikeReport {
    pub account_id: String,
    pub user_id: String,
    pub requested: u32,
    /// Always zero: liking is not implemented
    pub liked: u32,
}

/// Main application service
///
/// Owns the session store for its whole lifetime. Every account-bound operation runs
/// under that account's lock, so logins, uploads and logouts for the same account are
/// applied one at a time.
pub struct InstareelApplication {
    config: InstareelConfig,
    store: SessionStore,
    locks: AccountLocks,
    login: LoginOrchestrator,
    upload: UploadOrchestrator,
    reels: ReelCompositor,
}

impl InstareelApplication {
    /// Create the application with the HTTP platform client and ffmpeg
    pub fn new(config: InstareelConfig) -> ApplicationResult<Self> {
        let factory = Arc::new(HttpClientFactory::new(config.platform.clone()));
        let engine = Arc::new(FfmpegEngine::from_config(&config.media));
        Self::with_collaborators(config, factory, engine)
    }

    /// Create the application with explicit external collaborators
    pub fn with_collaborators(
        config: InstareelConfig,
        factory: Arc<dyn ClientFactory>,
        engine: Arc<dyn MediaEngine>,
    ) -> ApplicationResult<Self> {
        config.validate()?;

        let store = SessionStore::new();
        let paths = &config.paths;

        let login = LoginOrchestrator::new(
            CredentialStore::new(&paths.credentials_dir),
            SessionFiles::new(&paths.sessions_dir),
            factory,
            store.clone(),
            Duration::from_secs(config.platform.login_timeout_secs),
        );
        let upload = UploadOrchestrator::new(store.clone(), &paths.staging_dir)?;
        let reels = ReelCompositor::new(
            engine,
            &paths.staging_dir,
            &paths.output_dir,
            FrameSpec::from_config(&config.media),
            Duration::from_secs(config.media.encode_timeout_secs),
        )?;

        info!(
            credentials_dir = %paths.credentials_dir.display(),
            output_dir = %paths.output_dir.display(),
            "Application initialized"
        );

        Ok(Self {
            config,
            store,
            locks: AccountLocks::new(),
            login,
            upload,
            reels,
        })
    }

    pub fn config(&self) -> &InstareelConfig {
        &self.config
    }

    /// The in-memory session store
    pub fn sessions(&self) -> &SessionStore {
        &self.store
    }

    /// Log an account in and cache its session
    pub async fn login(&self, account_id: &str) -> ApplicationResult<LoginOutcome> {
        let _guard = self.locks.acquire(account_id).await;
        self.login.login(account_id).await
    }

    /// Publish a photo through the account's active session
    pub async fn upload_image(
        &self,
        account_id: &str,
        image: MediaPayload,
        caption: &str,
    ) -> ApplicationResult<UploadReceipt> {
        let _guard = self.locks.acquire(account_id).await;
        self.upload.upload(account_id, image, caption).await
    }

    /// Acknowledge a like-top-posts request for an authenticated account.
    ///
    /// No likes are performed; the capability has no defined behaviour yet.
    pub async fn like_top_posts(&self, account_id: &str, n: u32) -> ApplicationResult<LikeReport> {
        let _guard = self.locks.acquire(account_id).await;
        let handle = self
            .store
            .get(account_id)
            .await
            .ok_or_else(|| ApplicationError::not_authenticated(account_id))?;

        warn!(
            account_id,
            requested = n,
            "Liking top posts is not implemented; no likes performed"
        );

        Ok(LikeReport {
            account_id: account_id.to_string(),
            user_id: handle.user_id.clone(),
            requested: n,
            liked: 0,
        })
    }

    /// Drop the account's cached session
    pub async fn logout(&self, account_id: &str) -> LogoutOutcome {
        let _guard = self.locks.acquire(account_id).await;
        if self.store.remove(account_id).await {
            info!(account_id, "Session removed");
            LogoutOutcome::Removed
        } else {
            LogoutOutcome::NotFound
        }
    }

    /// Composite an image and an audio track into a reel
    pub async fn generate_reel(
        &self,
        image: MediaPayload,
        audio: MediaPayload,
    ) -> ApplicationResult<ReelOutput> {
        self.reels.compose(image, audio).await
    }

    /// Delete generated reels past the configured retention window.
    ///
    /// Returns `Ok(0)` without touching the disk when no retention is configured.
    pub async fn sweep_reels(&self) -> ApplicationResult<usize> {
        match self.config.media.reel_retention_hours {
            Some(hours) => {
                reel::sweep_expired_reels(
                    &self.config.paths.output_dir,
                    Duration::from_secs(hours.saturating_mul(3600)),
                )
                .await
            }
            None => Ok(0),
        }
    }

    /// Drop every cached session
    pub async fn shutdown(&self) {
        let dropped = self.store.clear().await;
        info!(sessions = dropped, "Session store cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reel::testing::FakeMediaEngine;
    use instareel_core::PathsConfig;
    use tempfile::TempDir;

    fn app_with(platform: &Fixture) -> InstareelApplication {
        let config = InstareelConfig {
            paths: PathsConfig::rooted_at(platform.dir.path()),
            ..InstareelConfig::default()
        };
        InstareelApplication::with_collaborators(
            config,
            Arc::new(platform.platform.factory()),
            Arc::new(FakeMediaEngine::new(Duration::from_secs(3))),
        )
        .unwrap()
    }

    struct Fixture {
        dir: TempDir,
        platform: InMemoryPlatform,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let platform = InMemoryPlatform::new();
            platform.register_account("alice_ig", "hunter2", "1001");
            credentials::testing::write_credentials(
                &dir.path().join("creds"),
                "alice",
                "alice_ig",
                "hunter2",
            );
            Self { dir, platform }
        }
    }

    #[tokio::test]
    async fn test_logout_unknown_account_is_not_found() {
        let fixture = Fixture::new();
        let app = app_with(&fixture);
        assert_eq!(app.logout("nobody").await, LogoutOutcome::NotFound);
    }

    #[tokio::test]
    async fn test_logout_then_upload_is_not_authenticated() {
        let fixture = Fixture::new();
        let app = app_with(&fixture);

        app.login("alice").await.unwrap();
        assert_eq!(app.logout("alice").await, LogoutOutcome::Removed);

        let err = app
            .upload_image("alice", MediaPayload::new(Some("a.jpg"), vec![1, 2, 3]), "hi")
            .await
            .unwrap_err();
        assert!(matches!(err, ApplicationError::NotAuthenticated { .. }));
        assert_eq!(app.logout("alice").await, LogoutOutcome::NotFound);
    }

    #[tokio::test]
    async fn test_like_top_posts_requires_session() {
        let fixture = Fixture::new();
        let app = app_with(&fixture);

        let err = app.like_top_posts("alice", 5).await.unwrap_err();
        assert!(matches!(err, ApplicationError::NotAuthenticated { .. }));

        app.login("alice").await.unwrap();
        let report = app.like_top_posts("alice", 5).await.unwrap();
        assert_eq!(report.user_id, "1001");
        assert_eq!(report.requested, 5);
        assert_eq!(report.liked, 0);
    }

    #[tokio::test]
    async fn test_concurrent_logins_leave_one_session() {
        let fixture = Fixture::new();
        let app = Arc::new(app_with(&fixture));

        let (a, b) = tokio::join!(app.login("alice"), app.login("alice"));
        a.unwrap();
        b.unwrap();

        assert_eq!(app.sessions().len().await, 1);
        // the second login ran after the first finished and reused its session file
        assert_eq!(fixture.platform.password_login_count(), 1);
    }

    #[tokio::test]
    async fn test_rejected_requests_leave_no_lock_entries() {
        let fixture = Fixture::new();
        let app = app_with(&fixture);

        for i in 0..50 {
            let ghost = format!("ghost{}", i);
            assert!(app.login(&ghost).await.is_err());
            let image = MediaPayload::new(Some("a.jpg"), vec![1]);
            assert!(app.upload_image(&ghost, image, "hi").await.is_err());
            assert!(app.like_top_posts(&ghost, 1).await.is_err());
        }
        app.login("alice").await.unwrap();

        assert!(app.locks.is_empty());
    }

    #[tokio::test]
    async fn test_sweep_without_retention_is_noop() {
        let fixture = Fixture::new();
        let app = app_with(&fixture);
        let output = fixture.dir.path().join("completed_reels");
        std::fs::write(output.join("reel_old.mp4"), b"x").unwrap();

        assert_eq!(app.sweep_reels().await.unwrap(), 0);
        assert!(output.join("reel_old.mp4").exists());
    }

    #[tokio::test]
    async fn test_shutdown_clears_sessions() {
        let fixture = Fixture::new();
        let app = app_with(&fixture);
        app.login("alice").await.unwrap();

        app.shutdown().await;
        assert!(app.sessions().get("alice").await.is_none());
    }
}
