//! Persisted client settings, one `{account_id}_session.json` per account

use crate::client::ClientSettings;
use crate::ApplicationResult;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct SessionFiles {
    dir: PathBuf,
}

impl SessionFiles {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn path_for(&self, account_id: &str) -> PathBuf {
        self.dir.join(format!("{}_session.json", account_id))
    }

    pub fn exists(&self, account_id: &str) -> bool {
        self.path_for(account_id).is_file()
    }

    /// Load the persisted settings, `None` when no file exists
    pub fn load(&self, account_id: &str) -> ApplicationResult<Option<ClientSettings>> {
        let path = self.path_for(account_id);
        let json = match std::fs::read_to_string(&path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let settings: ClientSettings = serde_json::from_str(&json)?;
        debug!(account_id, path = %path.display(), "Loaded persisted session");
        Ok(Some(settings))
    }

    /// Persist `settings`, replacing any previous file atomically
    pub fn save(&self, account_id: &str, settings: &ClientSettings) -> ApplicationResult<()> {
        std::fs::create_dir_all(&self.dir)?;

        let path = self.path_for(account_id);
        let tmp = self.dir.join(format!(".{}_session.json.tmp", account_id));
        std::fs::write(&tmp, serde_json::to_string_pretty(settings)?)?;
        std::fs::rename(&tmp, &path)?;

        debug!(account_id, path = %path.display(), "Saved session");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_is_none() {
        let dir = TempDir::new().unwrap();
        let files = SessionFiles::new(dir.path());
        assert!(files.load("alice").unwrap().is_none());
        assert!(!files.exists("alice"));
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let files = SessionFiles::new(dir.path().join("sessions"));

        let mut settings = ClientSettings::default();
        settings.user_id = Some("42".to_string());
        settings.authorization = Some("Bearer abc".to_string());
        files.save("alice", &settings).unwrap();

        assert!(files.exists("alice"));
        let loaded = files.load("alice").unwrap().unwrap();
        assert_eq!(loaded.user_id.as_deref(), Some("42"));
        assert_eq!(loaded.uuids, settings.uuids);
    }

    #[test]
    fn test_corrupt_file_is_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("alice_session.json"), "garbage").unwrap();
        assert!(SessionFiles::new(dir.path()).load("alice").is_err());
    }
}
