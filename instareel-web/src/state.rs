//! Application state shared by every handler

use crate::{WebConfig, WebError, WebResult};
use instareel_applications::{
    CredentialStore, FfmpegEngine, InMemoryPlatform, InstareelApplication,
};
use instareel_core::InstareelConfig;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Main application state
#[derive(Clone)]
pub struct AppState {
    /// Web server configuration
    pub config: WebConfig,
    /// Orchestration layer; owns the session store
    pub application: Arc<InstareelApplication>,
}

impl AppState {
    /// Build the state from the web configuration.
    ///
    /// In development mode the platform is simulated in-process and every account with
    /// a credential file is registered with it.
    pub async fn new(config: WebConfig) -> WebResult<Self> {
        let service_config = load_service_config(config.config_path.as_deref())?;

        let application = if config.dev_mode {
            let platform = simulated_platform(&service_config);
            let engine = Arc::new(FfmpegEngine::from_config(&service_config.media));
            InstareelApplication::with_collaborators(
                service_config,
                Arc::new(platform.factory()),
                engine,
            )?
        } else {
            InstareelApplication::new(service_config)?
        };

        info!(dev_mode = config.dev_mode, "Application state initialized");

        Ok(Self::with_application(config, Arc::new(application)))
    }

    /// Wrap an already built application
    pub fn with_application(config: WebConfig, application: Arc<InstareelApplication>) -> Self {
        Self {
            config,
            application,
        }
    }
}

fn load_service_config(path: Option<&str>) -> WebResult<InstareelConfig> {
    match path {
        Some(path) => InstareelConfig::from_file(path).map_err(|e| {
            e.log();
            WebError::Config(format!("{}: {}", path, e))
        }),
        None => Ok(InstareelConfig::default()),
    }
}

/// Register every readable credential file with a fresh simulated platform
fn simulated_platform(config: &InstareelConfig) -> InMemoryPlatform {
    let platform = InMemoryPlatform::new();
    let creds_dir = &config.paths.credentials_dir;
    let store = CredentialStore::new(creds_dir);

    let entries = match std::fs::read_dir(creds_dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(dir = %creds_dir.display(), error = %e, "No credentials to simulate");
            return platform;
        }
    };

    let account_ids = entries
        .filter_map(Result::ok)
        .filter_map(|entry| account_id_of(&entry.path()));
    for (index, account_id) in account_ids.enumerate() {
        match store.load(&account_id) {
            Ok(record) => {
                let user_id = (1_000_000_000u64 + index as u64).to_string();
                platform.register_account(&record.username, &record.password, &user_id);
                info!(%account_id, %user_id, "Simulated account registered");
            }
            Err(e) => warn!(%account_id, error = %e, "Skipping unreadable credentials"),
        }
    }
    platform
}

fn account_id_of(path: &Path) -> Option<String> {
    path.file_name()?
        .to_str()?
        .strip_suffix("_creds.json")
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_id_from_credential_file_name() {
        assert_eq!(
            account_id_of(Path::new("/creds/alice_creds.json")).as_deref(),
            Some("alice")
        );
        assert_eq!(account_id_of(Path::new("/creds/_creds.json")), None);
        assert_eq!(account_id_of(Path::new("/creds/alice.json")), None);
    }

    #[test]
    fn test_missing_config_file_is_a_config_error() {
        let err = load_service_config(Some("/nonexistent/instareel.toml")).unwrap_err();
        assert!(matches!(err, WebError::Config(_)));
    }
}
