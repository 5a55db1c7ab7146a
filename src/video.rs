use std::path::Path;
use std::process::{Command, Stdio};

use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::VideoConfig;

#[derive(Deserialize, Debug)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Deserialize, Debug)]
struct ProbeStream {
    avg_frame_rate: Option<String>,
    r_frame_rate: Option<String>,
}

/// Parse an ffprobe rate such as `30000/1001` or `25`.
pub fn parse_rate(text: &str) -> Option<f64> {
    let rate = match text.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            if den == 0.0 {
                return None;
            }
            num / den
        }
        None => text.trim().parse().ok()?,
    };
    (rate.is_finite() && rate > 0.0).then_some(rate)
}

fn rate_from_probe_json(json: &str) -> Result<f64> {
    let probe: ProbeOutput = serde_json::from_str(json).context("unexpected ffprobe output")?;
    let stream = probe
        .streams
        .first()
        .ok_or_else(|| anyhow!("no video stream reported"))?;
    stream
        .avg_frame_rate
        .as_deref()
        .and_then(parse_rate)
        .or_else(|| stream.r_frame_rate.as_deref().and_then(parse_rate))
        .ok_or_else(|| anyhow!("video stream has no usable frame rate"))
}

/// Ask ffprobe for the frame rate of the first video stream.
pub fn probe_frame_rate(ffprobe: &str, video: &Path) -> Result<f64> {
    if !video.exists() {
        bail!("video not found at {}", video.display());
    }

    let output = Command::new(ffprobe)
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=avg_frame_rate,r_frame_rate",
            "-of",
            "json",
        ])
        .arg(video)
        .stdin(Stdio::null())
        .output()
        .with_context(|| format!("failed to run '{}'. Is ffmpeg installed?", ffprobe))?;

    if !output.status.success() {
        bail!(
            "{} failed on {}: {}",
            ffprobe,
            video.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    debug!("ffprobe: {}", stdout.trim());
    rate_from_probe_json(&stdout).with_context(|| format!("reading frame rate of {}", video.display()))
}

/// Command line value first, then the configured override, then the video itself.
pub fn resolve_frame_rate(cli_fps: Option<f64>, config: &VideoConfig, video: &Path) -> Result<f64> {
    let fps = match cli_fps.or(config.fps_override) {
        Some(fps) => fps,
        None => probe_frame_rate(&config.ffprobe_path, video)?,
    };
    if !(fps.is_finite() && fps > 0.0) {
        bail!("frame rate must be positive, got {}", fps);
    }
    info!("Frame rate: {:.3} fps", fps);
    Ok(fps)
}
