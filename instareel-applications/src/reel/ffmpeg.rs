//! Media engine backed by the `ffmpeg` and `ffprobe` executables

use super::{MediaEngine, MediaError, RenderJob};
use async_trait::async_trait;
use instareel_core::MediaConfig;
use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct FfmpegEngine {
    ffmpeg: String,
    ffprobe: String,
    video_codec: String,
    audio_codec: String,
    preset: String,
}

impl FfmpegEngine {
    pub fn from_config(config: &MediaConfig) -> Self {
        Self {
            ffmpeg: config.ffmpeg_path.clone(),
            ffprobe: config.ffprobe_path.clone(),
            video_codec: config.video_codec.clone(),
            audio_codec: config.audio_codec.clone(),
            preset: config.preset.clone(),
        }
    }

    /// Filter chain: fit the height, pad narrow images to the frame width, then
    /// crop the horizontal center
    pub fn video_filter(width: u32, height: u32) -> String {
        format!(
            "scale=-2:{h},pad=w='max(iw,{w})':h={h}:x='(ow-iw)/2':y=0:color=black,crop={w}:{h},setsar=1,format=yuv420p",
            w = width,
            h = height
        )
    }

    pub fn render_args(&self, job: &RenderJob) -> Vec<OsString> {
        let fps = job.frame.fps.to_string();
        let mut args: Vec<OsString> = ["-y", "-hide_banner", "-loglevel", "error"]
            .into_iter()
            .map(OsString::from)
            .collect();

        args.extend(["-loop", "1", "-framerate", fps.as_str(), "-i"].map(OsString::from));
        args.push(job.image.clone().into_os_string());
        args.push("-i".into());
        args.push(job.audio.clone().into_os_string());

        args.extend(
            [
                "-vf".to_string(),
                Self::video_filter(job.frame.width, job.frame.height),
                "-r".to_string(),
                fps.clone(),
                "-c:v".to_string(),
                self.video_codec.clone(),
                "-preset".to_string(),
                self.preset.clone(),
                "-tune".to_string(),
                "stillimage".to_string(),
                "-c:a".to_string(),
                self.audio_codec.clone(),
                "-t".to_string(),
                format!("{:.3}", job.duration.as_secs_f64()),
                "-movflags".to_string(),
                "+faststart".to_string(),
            ]
            .map(OsString::from),
        );
        args.push(job.output.clone().into_os_string());
        args
    }

    async fn run(&self, program: &str, args: &[OsString]) -> Result<Vec<u8>, MediaError> {
        debug!(program, ?args, "Running media tool");
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| MediaError::Spawn {
                program: program.to_string(),
                source,
            })?;

        if !output.status.success() {
            return Err(MediaError::Failed {
                program: program.to_string(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output.stdout)
    }
}

/// Parse ffprobe's `format=duration` output
pub fn parse_duration(stdout: &str) -> Result<Duration, MediaError> {
    let text = stdout.trim();
    let secs: f64 = text
        .parse()
        .map_err(|_| MediaError::InvalidDuration(format!("unexpected ffprobe output {:?}", text)))?;
    Duration::try_from_secs_f64(secs)
        .map_err(|_| MediaError::InvalidDuration(format!("{} seconds", secs)))
}

#[async_trait]
impl MediaEngine for FfmpegEngine {
    async fn probe_duration(&self, audio: &Path) -> Result<Duration, MediaError> {
        let args: Vec<OsString> = vec![
            "-v".into(),
            "error".into(),
            "-show_entries".into(),
            "format=duration".into(),
            "-of".into(),
            "default=noprint_wrappers=1:nokey=1".into(),
            audio.as_os_str().to_os_string(),
        ];
        let stdout = self.run(&self.ffprobe, &args).await?;
        parse_duration(&String::from_utf8_lossy(&stdout))
    }

    async fn render(&self, job: &RenderJob) -> Result<(), MediaError> {
        let args = self.render_args(job);
        self.run(&self.ffmpeg, &args).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reel::FrameSpec;
    use std::path::PathBuf;

    fn job() -> RenderJob {
        RenderJob {
            image: PathBuf::from("/tmp/in.png"),
            audio: PathBuf::from("/tmp/in.mp3"),
            output: PathBuf::from("/tmp/reel_x.mp4"),
            duration: Duration::from_millis(3250),
            frame: FrameSpec::default(),
        }
    }

    #[test]
    fn test_render_args() {
        let engine = FfmpegEngine::from_config(&MediaConfig::default());
        let args: Vec<String> = engine
            .render_args(&job())
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();

        let after = |flag: &str| {
            let i = args.iter().position(|a| a == flag).unwrap();
            args[i + 1].clone()
        };
        assert_eq!(after("-r"), "24");
        assert_eq!(after("-preset"), "ultrafast");
        assert_eq!(after("-c:v"), "libx264");
        assert_eq!(after("-c:a"), "aac");
        assert_eq!(after("-t"), "3.250");
        assert!(after("-vf").starts_with("scale=-2:1920,"));
        assert!(after("-vf").contains("crop=1080:1920"));
        assert_eq!(args.last().unwrap(), "/tmp/reel_x.mp4");
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("3.000000\n").unwrap(), Duration::from_secs(3));
        assert!(parse_duration("N/A").is_err());
        assert!(parse_duration("-1").is_err());
        assert!(parse_duration("inf").is_err());
        assert!(parse_duration("1e30").is_err());
    }

    #[tokio::test]
    async fn test_missing_binary_is_spawn_error() {
        let mut config = MediaConfig::default();
        config.ffprobe_path = "/nonexistent/ffprobe".to_string();
        let engine = FfmpegEngine::from_config(&config);
        let err = engine.probe_duration(Path::new("x.mp3")).await.unwrap_err();
        assert!(matches!(err, MediaError::Spawn { .. }));
    }
}
