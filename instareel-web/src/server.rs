//! Instareel Web Server
//!
//! Binds the listener, runs the retention sweep and drains sessions on shutdown.

use crate::{create_app, AppState, WebConfig, WebError, WebResult};
use axum::serve;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

const SWEEP_INTERVAL: Duration = Duration::from_secs(3600);

/// Main instareel web server
pub struct InstareelServer {
    config: WebConfig,
    state: AppState,
}

impl InstareelServer {
    /// Create a new server
    pub async fn new(config: WebConfig) -> WebResult<Self> {
        let state = AppState::new(config.clone()).await?;

        Ok(Self { config, state })
    }

    /// Create a server around prepared state
    pub fn with_state(state: AppState) -> Self {
        Self {
            config: state.config.clone(),
            state,
        }
    }

    /// Bind the configured address and serve until ctrl-c
    pub async fn start(self) -> WebResult<()> {
        let address = self.config.address();
        let listener = TcpListener::bind(&address)
            .await
            .map_err(WebError::Server)?;

        self.serve_on(listener, shutdown_signal()).await
    }

    /// Serve on an already bound listener until `shutdown` resolves
    pub async fn serve_on<F>(self, listener: TcpListener, shutdown: F) -> WebResult<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let address = listener.local_addr().map_err(WebError::Server)?;
        info!("Server listening on http://{}", address);
        info!("Development mode: {}", self.config.dev_mode);

        let app = create_app(self.state.clone());

        let sweeper = self
            .state
            .application
            .config()
            .media
            .reel_retention_hours
            .map(|hours| {
                info!(retention_hours = hours, "Reel retention sweep enabled");
                let sweep_state = self.state.clone();
                tokio::spawn(async move {
                    let mut interval = tokio::time::interval(SWEEP_INTERVAL);
                    loop {
                        interval.tick().await;
                        match sweep_state.application.sweep_reels().await {
                            Ok(0) => {}
                            Ok(removed) => info!(removed, "Expired reels deleted"),
                            Err(e) => warn!(error = %e, "Reel sweep failed"),
                        }
                    }
                })
            });

        let result = serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await;

        if let Some(sweeper) = sweeper {
            sweeper.abort();
        }
        self.state.application.shutdown().await;

        if let Err(e) = result {
            error!("Server error: {}", e);
            return Err(WebError::Server(e));
        }

        info!("Server stopped");
        Ok(())
    }

    /// Get server configuration
    pub fn config(&self) -> &WebConfig {
        &self.config
    }

    /// Get application state
    pub fn state(&self) -> &AppState {
        &self.state
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Builder for InstareelServer
pub struct InstareelServerBuilder {
    config: WebConfig,
}

impl InstareelServerBuilder {
    pub fn new() -> Self {
        Self {
            config: WebConfig::default(),
        }
    }

    /// Start from an existing configuration
    pub fn from_config(config: WebConfig) -> Self {
        Self { config }
    }

    pub fn host<S: Into<String>>(mut self, host: S) -> Self {
        self.config.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Enable development mode
    pub fn dev_mode(mut self, dev_mode: bool) -> Self {
        self.config.dev_mode = dev_mode;
        self
    }

    /// Set the TOML service configuration file
    pub fn config_path<S: Into<String>>(mut self, path: S) -> Self {
        self.config.config_path = Some(path.into());
        self
    }

    pub fn max_upload_mb(mut self, max_upload_mb: usize) -> Self {
        self.config.max_upload_mb = max_upload_mb;
        self
    }

    /// Build the server
    pub async fn build(self) -> WebResult<InstareelServer> {
        InstareelServer::new(self.config).await
    }
}

impl Default for InstareelServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
