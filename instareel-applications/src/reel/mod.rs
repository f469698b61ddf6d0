//! Reel Compositor
//!
//! Turns one still image and one audio track into a fixed-size vertical video whose
//! duration equals the audio's. Encoding is delegated to a [`MediaEngine`].

pub mod ffmpeg;
pub mod retention;

pub use ffmpeg::FfmpegEngine;
pub use retention::sweep_expired_reels;

use crate::staging::{MediaPayload, StagedFile};
use crate::{ApplicationError, ApplicationResult};
use async_trait::async_trait;
use instareel_core::{
    log_operation_error, log_operation_start, log_operation_success, performance, MediaConfig,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Errors raised by a media engine
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("could not determine audio duration: {0}")]
    InvalidDuration(String),
}

/// Output frame geometry and rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FrameSpec {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

impl FrameSpec {
    pub fn from_config(config: &MediaConfig) -> Self {
        Self {
            width: config.width,
            height: config.height,
            fps: config.fps,
        }
    }
}

impl Default for FrameSpec {
    fn default() -> Self {
        Self::from_config(&MediaConfig::default())
    }
}

/// One encode: everything the engine needs, already on disk
#[derive(Debug, Clone)]
pub struct RenderJob {
    pub image: PathBuf,
    pub audio: PathBuf,
    pub output: PathBuf,
    pub duration: Duration,
    pub frame: FrameSpec,
}

/// The delegated media-processing library
#[async_trait]
pub trait MediaEngine: Send + Sync {
    /// Duration of the audio track at `audio`
    async fn probe_duration(&self, audio: &Path) -> Result<Duration, MediaError>;

    /// Scale the image to the frame height, center-crop to the frame width, hold it
    /// for `job.duration`, attach the audio and encode to `job.output`
    async fn render(&self, job: &RenderJob) -> Result<(), MediaError>;
}

/// A finished reel; the file now belongs to the caller
#[derive(Debug, Clone, Serialize)]
pub struct ReelOutput {
    pub request_id: String,
    pub file_path: PathBuf,
    pub duration_secs: f64,
}

pub struct ReelCompositor {
    engine: Arc<dyn MediaEngine>,
    staging_dir: PathBuf,
    output_dir: PathBuf,
    frame: FrameSpec,
    timeout: Duration,
}

impl ReelCompositor {
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(
        engine: Arc<dyn MediaEngine>,
        staging_dir: P,
        output_dir: Q,
        frame: FrameSpec,
        timeout: Duration,
    ) -> ApplicationResult<Self> {
        let staging_dir = staging_dir.as_ref().to_path_buf();
        let output_dir = output_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&staging_dir)?;
        std::fs::create_dir_all(&output_dir)?;

        Ok(Self {
            engine,
            staging_dir,
            output_dir,
            frame,
            timeout,
        })
    }

    /// Compose a reel from `image` and `audio`.
    ///
    /// Both staged inputs are deleted on every exit path. On failure a partially
    /// written output is deleted too; on success its absolute path is returned.
    pub async fn compose(
        &self,
        image: MediaPayload,
        audio: MediaPayload,
    ) -> ApplicationResult<ReelOutput> {
        if image.is_empty() || audio.is_empty() {
            return Err(ApplicationError::validation(
                "both image and audio payloads are required",
            ));
        }

        let request_id = uuid::Uuid::new_v4().to_string();
        log_operation_start!("generate_reel", request_id = %request_id);

        let image_name = format!("{}.{}", request_id, image.extension_or("jpg"));
        let audio_name = format!("{}.{}", request_id, audio.extension_or("mp3"));
        let output = self.output_dir.join(format!("reel_{}.mp4", request_id));

        let staged_image = StagedFile::write(&self.staging_dir, &image_name, &image.bytes).await?;
        let staged_audio = StagedFile::write(&self.staging_dir, &audio_name, &audio.bytes).await?;

        let result = self
            .encode(staged_image.path(), staged_audio.path(), &output)
            .await;

        staged_image.remove().await;
        staged_audio.remove().await;

        match result {
            Ok(duration) => {
                let file_path = tokio::fs::canonicalize(&output).await?;
                log_operation_success!(
                    "generate_reel",
                    request_id = %request_id,
                    path = %file_path.display()
                );
                Ok(ReelOutput {
                    request_id,
                    file_path,
                    duration_secs: duration.as_secs_f64(),
                })
            }
            Err(e) => {
                log_operation_error!("generate_reel", e, request_id = %request_id);
                if let Err(remove_err) = tokio::fs::remove_file(&output).await {
                    if remove_err.kind() != std::io::ErrorKind::NotFound {
                        warn!(
                            path = %output.display(),
                            error = %remove_err,
                            "Failed to remove partial reel"
                        );
                    }
                }
                Err(e)
            }
        }
    }

    /// Probe and render under one deadline
    async fn encode(
        &self,
        image: &Path,
        audio: &Path,
        output: &Path,
    ) -> ApplicationResult<Duration> {
        let work = self.probe_and_render(image, audio, output);
        performance::measure_async("encode", tokio::time::timeout(self.timeout, work))
            .await
            .map_err(|_| ApplicationError::timeout("encode", self.timeout))?
    }

    async fn probe_and_render(
        &self,
        image: &Path,
        audio: &Path,
        output: &Path,
    ) -> ApplicationResult<Duration> {
        let duration = self.engine.probe_duration(audio).await?;
        if duration.is_zero() {
            return Err(MediaError::InvalidDuration("audio track is empty".to_string()).into());
        }

        let job = RenderJob {
            image: image.to_path_buf(),
            audio: audio.to_path_buf(),
            output: output.to_path_buf(),
            duration,
            frame: self.frame,
        };

        self.engine.render(&job).await?;
        Ok(duration)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Media engine that reports a fixed duration and writes a placeholder output
    pub struct FakeMediaEngine {
        duration: Duration,
        pub fail_render: Option<String>,
        pub render_delay: Duration,
        pub probe_delay: Duration,
        pub jobs: Mutex<Vec<RenderJob>>,
    }

    impl FakeMediaEngine {
        pub fn new(duration: Duration) -> Self {
            Self {
                duration,
                fail_render: None,
                render_delay: Duration::ZERO,
                probe_delay: Duration::ZERO,
                jobs: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl MediaEngine for FakeMediaEngine {
        async fn probe_duration(&self, audio: &Path) -> Result<Duration, MediaError> {
            assert!(audio.exists());
            tokio::time::sleep(self.probe_delay).await;
            Ok(self.duration)
        }

        async fn render(&self, job: &RenderJob) -> Result<(), MediaError> {
            assert!(job.image.exists() && job.audio.exists());
            self.jobs.lock().unwrap().push(job.clone());
            tokio::fs::write(&job.output, b"partial").await.unwrap();
            tokio::time::sleep(self.render_delay).await;
            match &self.fail_render {
                Some(message) => Err(MediaError::Failed {
                    program: "fake".to_string(),
                    status: "exit status: 1".to_string(),
                    stderr: message.clone(),
                }),
                None => Ok(()),
            }
        }
    }
}
