//! End-to-end reel generation through the real ffmpeg toolchain
//!
//! Needs `ffmpeg` and `ffprobe` on PATH:
//! `cargo test -p instareel-applications --test ffmpeg_reel_test -- --ignored`

use instareel_applications::{FfmpegEngine, FrameSpec, MediaPayload, ReelCompositor};
use instareel_core::MediaConfig;
use std::path::Path;
use std::process::Command;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn generate(dir: &Path, name: &str, args: &[&str]) -> Vec<u8> {
    let path = dir.join(name);
    let status = Command::new("ffmpeg")
        .args(["-y", "-hide_banner", "-loglevel", "error"])
        .args(args)
        .arg(&path)
        .status()
        .expect("ffmpeg must be installed");
    assert!(status.success());
    std::fs::read(path).unwrap()
}

fn probe(path: &Path, entries: &str) -> String {
    let output = Command::new("ffprobe")
        .args(["-v", "error", "-select_streams", "v:0", "-show_entries", entries])
        .args(["-of", "default=noprint_wrappers=1:nokey=1"])
        .arg(path)
        .output()
        .expect("ffprobe must be installed");
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

#[tokio::test]
#[ignore = "requires ffmpeg and ffprobe on PATH"]
async fn test_three_second_audio_makes_three_second_vertical_reel() {
    let fixtures = TempDir::new().unwrap();
    let image = generate(
        fixtures.path(),
        "landscape.png",
        &["-f", "lavfi", "-i", "testsrc=size=1600x900", "-frames:v", "1"],
    );
    let audio = generate(
        fixtures.path(),
        "tone.wav",
        &["-f", "lavfi", "-i", "sine=frequency=440:duration=3"],
    );

    let work = TempDir::new().unwrap();
    let compositor = ReelCompositor::new(
        Arc::new(FfmpegEngine::from_config(&MediaConfig::default())),
        work.path().join("staging"),
        work.path().join("out"),
        FrameSpec::default(),
        Duration::from_secs(120),
    )
    .unwrap();

    let reel = compositor
        .compose(
            MediaPayload::new(Some("landscape.png"), image),
            MediaPayload::new(Some("tone.wav"), audio),
        )
        .await
        .unwrap();

    assert!(reel.file_path.is_absolute());
    assert_eq!(probe(&reel.file_path, "stream=width,height"), "1080\n1920");

    let duration: f64 = probe(&reel.file_path, "format=duration").parse().unwrap();
    assert!((duration - 3.0).abs() < 0.15, "duration was {duration}");

    let leftovers = std::fs::read_dir(work.path().join("staging")).unwrap().count();
    assert_eq!(leftovers, 0);
}

#[tokio::test]
#[ignore = "requires ffmpeg and ffprobe on PATH"]
async fn test_narrow_image_is_padded_to_full_frame() {
    let fixtures = TempDir::new().unwrap();
    let image = generate(
        fixtures.path(),
        "narrow.png",
        &["-f", "lavfi", "-i", "testsrc=size=200x900", "-frames:v", "1"],
    );
    let audio = generate(
        fixtures.path(),
        "tone.wav",
        &["-f", "lavfi", "-i", "sine=frequency=220:duration=1"],
    );

    let work = TempDir::new().unwrap();
    let compositor = ReelCompositor::new(
        Arc::new(FfmpegEngine::from_config(&MediaConfig::default())),
        work.path().join("staging"),
        work.path().join("out"),
        FrameSpec::default(),
        Duration::from_secs(120),
    )
    .unwrap();

    let reel = compositor
        .compose(
            MediaPayload::new(Some("narrow.png"), image),
            MediaPayload::new(Some("tone.wav"), audio),
        )
        .await
        .unwrap();
    assert_eq!(probe(&reel.file_path, "stream=width,height"), "1080\n1920");
}
