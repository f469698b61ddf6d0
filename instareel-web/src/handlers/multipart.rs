//! Collecting multipart forms into named text fields and file payloads

use crate::ApiError;
use axum::extract::Multipart;
use instareel_applications::MediaPayload;
use std::collections::HashMap;

/// A fully read multipart form
#[derive(Debug, Default)]
pub struct FormParts {
    texts: HashMap<String, String>,
    files: HashMap<String, MediaPayload>,
}

impl FormParts {
    /// Read every field; parts carrying a file name are kept as files
    pub async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut parts = Self::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| ApiError::BadRequest(e.body_text()))?;
                    parts
                        .files
                        .insert(name, MediaPayload::new(Some(&file_name), bytes.to_vec()));
                }
                None => {
                    let text = field
                        .text()
                        .await
                        .map_err(|e| ApiError::BadRequest(e.body_text()))?;
                    parts.texts.insert(name, text);
                }
            }
        }
        Ok(parts)
    }

    pub fn text(&mut self, name: &str) -> Result<String, ApiError> {
        self.texts
            .remove(name)
            .ok_or_else(|| ApiError::BadRequest(format!("missing form field '{}'", name)))
    }

    pub fn file(&mut self, name: &str) -> Result<MediaPayload, ApiError> {
        self.files
            .remove(name)
            .ok_or_else(|| ApiError::BadRequest(format!("missing file field '{}'", name)))
    }
}
