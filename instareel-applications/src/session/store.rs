//! Session Store - live authenticated clients keyed by account id

use crate::client::PlatformClient;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// An authenticated platform client and what the service knows about it.
///
/// Only `user_id` is ever handed to the network layer.
#[derive(Clone)]
pub struct SessionHandle {
    pub account_id: String,
    pub user_id: String,
    pub logged_in_at: chrono::DateTime<chrono::Utc>,
    client: Arc<dyn PlatformClient>,
}

impl SessionHandle {
    pub fn new(account_id: &str, user_id: &str, client: Arc<dyn PlatformClient>) -> Self {
        Self {
            account_id: account_id.to_string(),
            user_id: user_id.to_string(),
            logged_in_at: chrono::Utc::now(),
            client,
        }
    }

    pub fn client(&self) -> &dyn PlatformClient {
        self.client.as_ref()
    }
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("account_id", &self.account_id)
            .field("user_id", &self.user_id)
            .field("logged_in_at", &self.logged_in_at)
            .finish_non_exhaustive()
    }
}

/// Process-lifetime mapping from account id to session handle.
///
/// No expiry and no capacity bound: entries live until logout or shutdown.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, SessionHandle>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the handle for `account_id`, returning the previous one
    pub async fn put(&self, account_id: &str, handle: SessionHandle) -> Option<SessionHandle> {
        let previous = self
            .sessions
            .write()
            .await
            .insert(account_id.to_string(), handle);
        if previous.is_some() {
            debug!(account_id, "Replaced existing session");
        }
        previous
    }

    pub async fn get(&self, account_id: &str) -> Option<SessionHandle> {
        self.sessions.read().await.get(account_id).cloned()
    }

    /// Remove the entry; reports whether one existed
    pub async fn remove(&self, account_id: &str) -> bool {
        self.sessions.write().await.remove(account_id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    pub async fn account_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.sessions.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Drop every entry, returning how many there were
    pub async fn clear(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let count = sessions.len();
        sessions.clear();
        count
    }
}
