use std::collections::VecDeque;
use std::path::PathBuf;

use anyhow::{Context, Result};
use image::RgbImage;
use tokio::process::Command;
use tracing::{debug, info};

#[derive(Debug, Clone, serde::Deserialize)]
pub struct CameraConfig {
    pub mode: String,   // "libcamera-jpeg" | "v4l2-mjpeg" | "replay"
    #[serde(default = "default_device")]
    pub device: String, // /dev/video0 (v4l2)
    pub width: u32,
    pub height: u32,
    pub replay_dir: Option<String>,
}

fn default_device() -> String { "/dev/video0".into() }

/// Where frames come from. Every `next_frame` error is final for the caller.
pub enum FrameSource {
    Live(CameraConfig),
    Replay(VecDeque<PathBuf>),
}

impl FrameSource {
    pub fn open(cfg: &CameraConfig) -> Result<Self> {
        match cfg.mode.as_str() {
            "libcamera-jpeg" | "v4l2-mjpeg" => Ok(Self::Live(cfg.clone())),
            "replay" => {
                let dir = cfg.replay_dir.as_ref().context("camera.replay_dir missing (mode=replay)")?;
                Self::replay_dir(dir)
            }
            other => anyhow::bail!("unknown camera.mode: {}", other),
        }
    }

    /// Image files of a directory in lexical order.
    pub fn replay_dir(dir: &str) -> Result<Self> {
        let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
            .with_context(|| format!("read replay dir {}", dir))?
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| p.is_file())
            .collect();
        files.sort();
        anyhow::ensure!(!files.is_empty(), "replay dir {} has no frames", dir);
        info!("camera: replaying {} frames from {}", files.len(), dir);
        Ok(Self::Replay(files.into()))
    }

    pub async fn next_frame(&mut self) -> Result<RgbImage> {
        let bytes = match self {
            FrameSource::Live(cfg) => capture_jpeg(cfg).await?,
            FrameSource::Replay(queue) => {
                let path = queue.pop_front().context("replay exhausted")?;
                tokio::fs::read(&path)
                    .await
                    .with_context(|| format!("read frame {}", path.display()))?
            }
        };
        let img = image::load_from_memory(&bytes).context("decode frame")?;
        Ok(img.to_rgb8())
    }
}

/// Pragmatic capture:
/// - libcamera-jpeg: call `libcamera-still -n -t 1 --width ... --height ... -o -`
///   returns a JPEG frame on stdout (simple, robust on Pi)
/// - v4l2-mjpeg: call `ffmpeg` to grab a single MJPEG frame (keeps Rust dependencies small)
pub async fn capture_jpeg(cfg: &CameraConfig) -> Result<Vec<u8>> {
    match cfg.mode.as_str() {
        "libcamera-jpeg" => capture_libcamera(cfg).await,
        "v4l2-mjpeg" => capture_v4l2_ffmpeg(cfg).await,
        other => anyhow::bail!("camera.mode {} cannot capture live frames", other),
    }
}

async fn capture_libcamera(cfg: &CameraConfig) -> Result<Vec<u8>> {
    let mut cmd = Command::new("libcamera-still");
    cmd.args([
        "-n",                 // no preview
        "-t", "1",            // 1ms
        "--width", &cfg.width.to_string(),
        "--height", &cfg.height.to_string(),
        "-o", "-",            // stdout
    ]);

    debug!("capture: libcamera-still");
    let out = cmd.output().await.context("run libcamera-still")?;
    anyhow::ensure!(out.status.success(), "libcamera-still failed");
    Ok(out.stdout)
}

async fn capture_v4l2_ffmpeg(cfg: &CameraConfig) -> Result<Vec<u8>> {
    let mut cmd = Command::new("ffmpeg");
    cmd.args([
        "-hide_banner","-loglevel","error",
        "-f","video4linux2",
        "-input_format","mjpeg",
        "-video_size",&format!("{}x{}", cfg.width, cfg.height),
        "-i",&cfg.device,
        "-vframes","1",
        "-f","image2pipe",
        "-vcodec","mjpeg",
        "-",
    ]);

    debug!("capture: ffmpeg v4l2 {}", cfg.device);
    let out = cmd.output().await.context("run ffmpeg capture")?;
    anyhow::ensure!(out.status.success(), "ffmpeg capture failed");
    Ok(out.stdout)
}
