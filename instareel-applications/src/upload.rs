//! Upload Orchestrator - stage a photo, publish it, always clean up

use crate::session::SessionStore;
use crate::staging::{MediaPayload, StagedFile};
use crate::{ApplicationError, ApplicationResult};
use instareel_core::{log_operation_error, log_operation_success, performance};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, Serialize)]
pub struct UploadReceipt {
    pub account_id: String,
    pub media_id: String,
    pub message: String,
}

pub struct UploadOrchestrator {
    store: SessionStore,
    staging_dir: PathBuf,
}

impl UploadOrchestrator {
    pub fn new<P: AsRef<Path>>(store: SessionStore, staging_dir: P) -> ApplicationResult<Self> {
        let staging_dir = staging_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&staging_dir)?;
        Ok(Self { store, staging_dir })
    }

    /// Publish `image` with `caption` through the account's session.
    ///
    /// Without an active session nothing touches the disk. Otherwise exactly one
    /// staged file is created and it is gone again before this returns.
    pub async fn upload(
        &self,
        account_id: &str,
        image: MediaPayload,
        caption: &str,
    ) -> ApplicationResult<UploadReceipt> {
        let handle = self
            .store
            .get(account_id)
            .await
            .ok_or_else(|| ApplicationError::not_authenticated(account_id))?;

        if image.is_empty() {
            return Err(ApplicationError::validation("image payload is empty"));
        }

        let file_name = format!(
            "upload_{}.{}",
            uuid::Uuid::new_v4(),
            image.extension_or("jpg")
        );
        let staged = StagedFile::write(&self.staging_dir, &file_name, &image.bytes).await?;
        debug!(account_id, path = %staged.path().display(), "Publishing staged image");

        let result = performance::measure_async(
            "publish",
            handle.client().photo_upload(staged.path(), caption),
        )
        .await;
        staged.remove().await;

        match result {
            Ok(media_id) => {
                log_operation_success!(
                    "upload_image",
                    account_id = account_id,
                    media_id = %media_id
                );
                Ok(UploadReceipt {
                    account_id: account_id.to_string(),
                    media_id,
                    message: "Image uploaded to instagram".to_string(),
                })
            }
            Err(e) => {
                log_operation_error!("upload_image", e, account_id = account_id);
                Err(e.into())
            }
        }
    }
}
