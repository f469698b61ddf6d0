//! Shared harness for integration tests
//!
//! Spawns the full server on an ephemeral port with a simulated platform and a media
//! engine that writes placeholder videos, then drives it over HTTP.

use instareel_applications::reel::RenderJob;
use instareel_applications::{InMemoryPlatform, InstareelApplication, MediaEngine, MediaError};
use instareel_core::{async_trait, InstareelConfig, PathsConfig};
use instareel_web::{AppState, InstareelServer, WebConfig};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

// Ensure tracing is only initialized once
static TRACING: LazyLock<()> = LazyLock::new(|| {
    let level = if std::env::var("TEST_LOG").is_ok() {
        tracing::Level::DEBUG
    } else {
        tracing::Level::ERROR
    };
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_test_writer()
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
});

/// Media engine that reports a fixed duration and writes a small placeholder file
pub struct PlaceholderEngine {
    pub duration: Duration,
    pub fail_with: Option<String>,
}

#[async_trait]
impl MediaEngine for PlaceholderEngine {
    async fn probe_duration(&self, _audio: &Path) -> Result<Duration, MediaError> {
        Ok(self.duration)
    }

    async fn render(&self, job: &RenderJob) -> Result<(), MediaError> {
        tokio::fs::write(&job.output, b"placeholder video")
            .await
            .map_err(|e| MediaError::Spawn {
                program: "placeholder".to_string(),
                source: e,
            })?;
        match &self.fail_with {
            Some(message) => Err(MediaError::Failed {
                program: "placeholder".to_string(),
                status: "exit status: 1".to_string(),
                stderr: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

/// A running server plus handles on its collaborators
pub struct TestApp {
    pub address: String,
    pub api_client: reqwest::Client,
    pub platform: InMemoryPlatform,
    pub root: TempDir,
    shutdown: Option<oneshot::Sender<()>>,
}

impl TestApp {
    pub fn credentials_dir(&self) -> PathBuf {
        self.root.path().join("creds")
    }

    pub fn staging_dir(&self) -> PathBuf {
        self.root.path().join("temp_uploads")
    }

    pub fn output_dir(&self) -> PathBuf {
        self.root.path().join("completed_reels")
    }

    /// Write a credential file and register the same account with the platform
    pub fn add_account(&self, account_id: &str, password: &str, user_id: &str) {
        let username = format!("{}_login", account_id);
        let record = json!({
            "username": username,
            "password": password,
            "proxy_url": "",
            "delay_range_bottom": 0,
            "delay_range_top": 0,
        });
        std::fs::write(
            self.credentials_dir()
                .join(format!("{}_creds.json", account_id)),
            record.to_string(),
        )
        .expect("Failed to write credentials");
        self.platform.register_account(&username, password, user_id);
    }

    pub async fn post_json(&self, path: &str, body: serde_json::Value) -> reqwest::Response {
        self.api_client
            .post(format!("{}{}", &self.address, path))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_form(&self, path: &str, form: reqwest::multipart::Form) -> reqwest::Response {
        self.api_client
            .post(format!("{}{}", &self.address, path))
            .multipart(form)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.api_client
            .get(format!("{}{}", &self.address, path))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn login(&self, account_id: &str) -> reqwest::Response {
        self.post_json("/login", json!({ "username": account_id })).await
    }

    /// Files currently sitting in a directory
    pub fn list(dir: &Path) -> Vec<PathBuf> {
        std::fs::read_dir(dir)
            .map(|entries| entries.filter_map(|e| e.ok().map(|e| e.path())).collect())
            .unwrap_or_default()
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

pub fn file_part(bytes: &[u8], file_name: &str) -> reqwest::multipart::Part {
    reqwest::multipart::Part::bytes(bytes.to_vec()).file_name(file_name.to_string())
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with_engine(PlaceholderEngine {
        duration: Duration::from_secs(3),
        fail_with: None,
    })
    .await
}

pub async fn spawn_app_with_engine(engine: PlaceholderEngine) -> TestApp {
    LazyLock::force(&TRACING);

    let root = TempDir::new().expect("Failed to create temp dir");
    let config = InstareelConfig {
        paths: PathsConfig::rooted_at(root.path()),
        ..InstareelConfig::default()
    };
    std::fs::create_dir_all(&config.paths.credentials_dir).expect("Failed to create creds dir");

    let platform = InMemoryPlatform::new();
    let application = InstareelApplication::with_collaborators(
        config,
        Arc::new(platform.factory()),
        Arc::new(engine),
    )
    .expect("Failed to build application");

    let web_config = WebConfig {
        port: 0,
        dev_mode: true,
        ..WebConfig::default()
    };
    let state = AppState::with_application(web_config, Arc::new(application));

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().expect("No local address").port();

    let (tx, rx) = oneshot::channel();
    tokio::spawn(InstareelServer::with_state(state).serve_on(listener, async {
        rx.await.ok();
    }));

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        api_client: reqwest::Client::new(),
        platform,
        root,
        shutdown: Some(tx),
    }
}
