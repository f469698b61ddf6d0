//! Login Orchestrator
//!
//! Drives a fresh platform client through session reuse with a password fallback,
//! persists the resulting settings and caches the authenticated client.

use crate::client::{ClientFactory, ClientSettings, PlatformClient, PlatformError};
use crate::credentials::{CredentialRecord, CredentialStore};
use crate::session::{SessionFiles, SessionHandle, SessionStore};
use crate::{ApplicationError, ApplicationResult};
use instareel_core::{
    log_operation_error, log_operation_start, log_operation_success, performance,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// How a login was satisfied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoginMethod {
    /// The persisted session was still valid
    RestoredSession,
    /// The persisted session was stale; a password login reused its device ids
    RefreshedSession,
    /// No usable session; plain password login
    Password,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginOutcome {
    pub account_id: String,
    pub user_id: String,
    pub method: LoginMethod,
}

pub struct LoginOrchestrator {
    credentials: CredentialStore,
    session_files: SessionFiles,
    factory: Arc<dyn ClientFactory>,
    store: SessionStore,
    timeout: Duration,
}

impl LoginOrchestrator {
    pub fn new(
        credentials: CredentialStore,
        session_files: SessionFiles,
        factory: Arc<dyn ClientFactory>,
        store: SessionStore,
        timeout: Duration,
    ) -> Self {
        Self {
            credentials,
            session_files,
            factory,
            store,
            timeout,
        }
    }

    /// Authenticate `account_id` and cache the session.
    ///
    /// Credential problems fail before any network call. The authentication itself
    /// is bounded by the configured login timeout.
    pub async fn login(&self, account_id: &str) -> ApplicationResult<LoginOutcome> {
        log_operation_start!("login", account_id = account_id);

        let creds = self.credentials.load(account_id)?;

        let mut client = self.factory.create()?;
        client.set_delay_range(creds.delay_lower_bound, creds.delay_upper_bound);
        self.apply_proxy(client.as_mut(), &creds).await?;

        let persisted = match self.session_files.load(account_id) {
            Ok(settings) => settings,
            Err(e) => {
                warn!(account_id, error = %e, "Ignoring unreadable session file");
                None
            }
        };

        let method = performance::measure_async(
            "login",
            tokio::time::timeout(
                self.timeout,
                self.authenticate(client.as_mut(), &creds, persisted),
            ),
        )
        .await
        .map_err(|_| ApplicationError::timeout("login", self.timeout))
        .and_then(|result| result)
        .inspect_err(|e| {
            log_operation_error!("login", e, account_id = account_id);
        })?;

        let user_id = client.user_id().ok_or_else(|| {
            ApplicationError::authentication_failed("platform returned no user id")
        })?;

        self.session_files.save(account_id, &client.settings())?;

        let handle = SessionHandle::new(account_id, &user_id, Arc::from(client));
        self.store.put(account_id, handle).await;

        log_operation_success!(
            "login",
            account_id = account_id,
            user_id = %user_id,
            method = ?method
        );

        Ok(LoginOutcome {
            account_id: account_id.to_string(),
            user_id,
            method,
        })
    }

    /// Apply the proxy and log the egress address before and after
    async fn apply_proxy(
        &self,
        client: &mut dyn PlatformClient,
        creds: &CredentialRecord,
    ) -> ApplicationResult<()> {
        let before = client.public_ip().await;

        client.set_proxy(&creds.proxy_url).map_err(|e| {
            ApplicationError::invalid_credentials(format!(
                "proxy_url for {} is unusable: {}",
                creds.account_id, e
            ))
        })?;

        let after = client.public_ip().await;
        match (before, after) {
            (Ok(before), Ok(after)) => {
                debug!(account_id = %creds.account_id, %before, %after, "Egress address checked")
            }
            (before, after) => warn!(
                account_id = %creds.account_id,
                before = ?before.err(),
                after = ?after.err(),
                "Egress address check failed"
            ),
        }
        Ok(())
    }

    async fn authenticate(
        &self,
        client: &mut dyn PlatformClient,
        creds: &CredentialRecord,
        persisted: Option<ClientSettings>,
    ) -> ApplicationResult<LoginMethod> {
        if let Some(settings) = persisted {
            let uuids = settings.uuids.clone();
            match self.login_with_session(client, creds, settings).await {
                Ok(method) => return Ok(method),
                Err(e) => {
                    info!(
                        account_id = %creds.account_id,
                        error = %e,
                        "Couldn't login using session information"
                    );
                    // drop whatever the failed attempt left behind, keep the device
                    client.set_settings(ClientSettings {
                        uuids,
                        ..ClientSettings::default()
                    });
                }
            }
        }

        info!(
            account_id = %creds.account_id,
            username = %creds.username,
            "Attempting login via username and password"
        );
        client
            .login(&creds.username, &creds.password)
            .await
            .map(|()| LoginMethod::Password)
            .map_err(|e| {
                info!(account_id = %creds.account_id, error = %e, "Password login failed");
                ApplicationError::authentication_failed(format!(
                    "couldn't login {} with either password or session: {}",
                    creds.account_id, e
                ))
            })
    }

    async fn login_with_session(
        &self,
        client: &mut dyn PlatformClient,
        creds: &CredentialRecord,
        settings: ClientSettings,
    ) -> Result<LoginMethod, PlatformError> {
        client.set_settings(settings);
        client.login(&creds.username, &creds.password).await?;

        match client.timeline_probe().await {
            Ok(()) => Ok(LoginMethod::RestoredSession),
            Err(PlatformError::LoginRequired) => {
                info!(
                    account_id = %creds.account_id,
                    "Session is invalid, logging in via username and password"
                );
                let old = client.settings();
                client.set_settings(ClientSettings::default());
                client.set_uuids(old.uuids);
                client.login(&creds.username, &creds.password).await?;
                Ok(LoginMethod::RefreshedSession)
            }
            Err(e) => Err(e),
        }
    }
}
