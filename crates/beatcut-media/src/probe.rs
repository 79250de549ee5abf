// crates/beatcut-media/src/probe.rs
//
// ffprobe metadata probing: duration, dimensions, frame rate.
// The ffprobe CLI handles every container correctly; no in-process
// demuxing here.

use std::path::Path;
use std::process::Command;

use anyhow::{anyhow, Context, Result};
use serde_json::Value;

#[derive(Clone, Debug, PartialEq)]
pub struct ProbeInfo {
    pub duration: f64,
    pub width:    Option<u32>,
    pub height:   Option<u32>,
    pub fps:      Option<f64>,
    pub has_audio: bool,
}

/// Probe `path` with ffprobe (`-print_format json`).
pub fn probe_media(path: &Path) -> Result<ProbeInfo> {
    let output = Command::new("ffprobe")
        .args([
            "-v", "quiet",
            "-print_format", "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .output()
        .context("ffprobe spawn failed")?;

    if !output.status.success() {
        return Err(anyhow!(
            "ffprobe failed for {}: {}",
            path.display(),
            String::from_utf8_lossy(&output.stderr).lines().last().unwrap_or(""),
        ));
    }

    let json: Value = serde_json::from_slice(&output.stdout).context("ffprobe output parse")?;
    parse_probe_json(&json).with_context(|| format!("no usable streams in {}", path.display()))
}

/// Pure parse of ffprobe's JSON document (split out for tests).
pub fn parse_probe_json(json: &Value) -> Result<ProbeInfo> {
    let streams = json["streams"]
        .as_array()
        .ok_or_else(|| anyhow!("no streams array"))?;

    let video = streams
        .iter()
        .find(|s| s["codec_type"].as_str() == Some("video"));
    let audio = streams
        .iter()
        .find(|s| s["codec_type"].as_str() == Some("audio"));

    let duration = json["format"]["duration"]
        .as_str()
        .and_then(|s| s.parse().ok())
        .or_else(|| {
            video
                .or(audio)
                .and_then(|s| s["duration"].as_str())
                .and_then(|s| s.parse().ok())
        })
        .unwrap_or(0.0);

    Ok(ProbeInfo {
        duration,
        width:  video.and_then(|s| s["width"].as_u64()).map(|w| w as u32),
        height: video.and_then(|s| s["height"].as_u64()).map(|h| h as u32),
        fps:    video
            .and_then(|s| s["r_frame_rate"].as_str())
            .and_then(parse_frame_rate),
        has_audio: audio.is_some(),
    })
}

/// ffprobe frame rates come as `30000/1001` or plain `29.97`.
fn parse_frame_rate(s: &str) -> Option<f64> {
    match s.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.parse().ok()?;
            let den: f64 = den.parse().ok()?;
            if den == 0.0 {
                None
            } else {
                Some(num / den)
            }
        }
        None => s.parse().ok(),
    }
}
