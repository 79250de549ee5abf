// crates/beatcut-media/src/bundle.rs
//
// Bundle resolution: turn a Project + AssetIndex into the compiler's
// ExportBundle.
//
// Path selection prefers the proxy (that is what the preview showed, and
// what the cutout masks were generated against); beats sidecars are
// parsed here so the compiler only ever sees typed data. Per-clip WAV
// extraction shells out to the ffmpeg CLI, one file per clip with
// `use_clip_audio` — ffmpeg handles every codec without resampler
// fiddling.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{anyhow, Result};
use uuid::Uuid;

use beatcut_core::state::{ClipBody, Project};
use beatcut_core::ExportBundle;

use crate::index::AssetIndex;
use crate::sidecar::load_beats;

/// Extract a 44.1 kHz stereo WAV for every video clip that mixes its own
/// audio. Returns clip id → wav path; failed extractions are dropped with
/// a warning (the compiler then skips that clip's audio).
pub fn extract_clip_wavs(
    project: &Project,
    index: &AssetIndex,
    wav_dir: &Path,
) -> HashMap<Uuid, PathBuf> {
    let mut wavs = HashMap::new();
    for track in &project.tracks {
        for clip in &track.clips {
            let ClipBody::Video { use_clip_audio: true, .. } = clip.body else {
                continue;
            };
            let Some(asset) = clip.asset_id.and_then(|id| index.get(id)) else {
                continue;
            };
            let source = asset.proxy_path.as_ref().unwrap_or(&asset.original_path);
            match extract_wav(source, clip.id, wav_dir) {
                Ok(path) => {
                    wavs.insert(clip.id, path);
                }
                Err(e) => log::warn!("clip {} audio extraction failed: {e}", clip.id),
            }
        }
    }
    wavs
}

fn extract_wav(source: &Path, clip_id: Uuid, wav_dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(wav_dir)?;
    let wav_path = wav_dir.join(format!("clip_audio_{clip_id}.wav"));
    let output = Command::new("ffmpeg")
        .args(["-y", "-i"])
        .arg(source)
        .args(["-vn", "-acodec", "pcm_s16le", "-ar", "44100", "-ac", "2"])
        .arg(&wav_path)
        .output()?;
    if !output.status.success() {
        return Err(anyhow!(
            "ffmpeg audio extract failed: {}",
            String::from_utf8_lossy(&output.stderr).lines().last().unwrap_or(""),
        ));
    }
    Ok(wav_path)
}

/// Resolve everything the compiler needs. `clip_wavs` comes from
/// `extract_clip_wavs` (or is empty when no clip mixes its own audio).
pub fn resolve_bundle(
    project: &Project,
    index: &AssetIndex,
    project_dir: PathBuf,
    clip_wavs: HashMap<Uuid, PathBuf>,
) -> ExportBundle<'static> {
    let mut asset_paths = HashMap::new();
    let mut mask_paths = HashMap::new();
    let mut beats = HashMap::new();

    let referenced: Vec<Uuid> = project
        .tracks
        .iter()
        .flat_map(|t| t.clips.iter())
        .filter_map(|c| c.asset_id)
        .collect();

    for id in referenced {
        let Some(asset) = index.get(id) else {
            log::warn!("asset {id} referenced by a clip but missing from the index");
            continue;
        };
        let playable = asset.proxy_path.clone().unwrap_or_else(|| asset.original_path.clone());
        asset_paths.insert(id, playable);
        if let Some(mask) = &asset.mask_path {
            mask_paths.insert(id, mask.clone());
        }
        if let Some(beats_path) = &asset.beats_path {
            match load_beats(beats_path) {
                Ok(data) => {
                    beats.insert(id, data);
                }
                Err(e) => log::warn!("beats sidecar for asset {id} unreadable: {e}"),
            }
        }
    }

    ExportBundle {
        asset_paths,
        mask_paths,
        clip_audio_wavs: clip_wavs,
        beats,
        project_dir,
        write_file: Box::new(|path, content| std::fs::write(path, content)),
    }
}
