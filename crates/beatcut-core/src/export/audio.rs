// crates/beatcut-core/src/export/audio.rs
//
// Audio mix chain.
//
// Sources: the master audio clip plus every video clip with
// `use_clip_audio` (through its extracted WAV input). Each source is
// trimmed to its visible window, delayed to its timeline position and
// gain-scaled, then everything lands in one `amix`. The lavfi silence at
// input 0 anchors the mix so an empty timeline still produces a valid
// `[aout]` stream of the right duration.

use crate::error::ExportError;
use crate::export::context::ExportContext;
use crate::export::graph::FilterGraph;
use crate::helpers::fmt::{millis, param, ts};
use crate::state::{Clip, ClipBody, TrackKind};

/// One resolved audio contributor.
struct AudioSource {
    input_idx: usize,
    src_start: f64,
    src_end:   f64,
    delay_ms:  i64,
    gain:      f32,
}

fn source_for(clip: &Clip, input_idx: usize, gain: f32, ctx: &ExportContext) -> Option<AudioSource> {
    let (local_start, _, src_start, src_end) = ctx.visible_window(clip)?;
    Some(AudioSource {
        input_idx,
        src_start,
        src_end,
        delay_ms: millis(local_start),
        gain,
    })
}

/// Build the full audio chain and return the terminal pad (`aout`).
pub fn build_audio_mix(graph: &mut FilterGraph, ctx: &ExportContext) -> Result<String, ExportError> {
    let project = ctx.project;
    let mut sources: Vec<AudioSource> = Vec::new();

    // Master audio clip first, unless its track is muted.
    let master_muted = project.master_audio_track().map(|t| t.muted).unwrap_or(false);
    if let Some(master) = project.master_audio_clip().filter(|_| !master_muted) {
        if let Some(idx) = master
            .asset_id
            .and_then(|id| ctx.asset_input_idx.get(&id).copied())
        {
            let gain = match &master.body {
                ClipBody::Audio { volume } => *volume,
                _ => 1.0,
            };
            if let Some(s) = source_for(master, idx, gain, ctx) {
                sources.push(s);
            }
        }
    }

    // Video clips that mix their own audio, in project track order.
    for track in project
        .tracks
        .iter()
        .filter(|t| t.kind == TrackKind::Video && !t.muted)
    {
        for clip in &track.clips {
            let ClipBody::Video { use_clip_audio: true, clip_audio_volume, .. } = clip.body else {
                continue;
            };
            let Some(&idx) = ctx.clip_wav_idx.get(&clip.id) else {
                continue; // WAV not extracted — documented skip
            };
            if let Some(s) = source_for(clip, idx, clip_audio_volume, ctx) {
                sources.push(s);
            }
        }
    }

    let dur = ts(ctx.duration());
    if sources.is_empty() {
        graph.push(
            &["0:a"],
            format!("atrim=0:{dur},asetpts=PTS-STARTPTS"),
            &["aout"],
            "audio mix",
        )?;
        return Ok("aout".into());
    }

    graph.push(
        &["0:a"],
        format!("atrim=0:{dur},asetpts=PTS-STARTPTS"),
        &["abase"],
        "audio mix",
    )?;

    let mut pads = vec!["abase".to_string()];
    for (j, s) in sources.iter().enumerate() {
        let pad = format!("au{j}");
        graph.push(
            &[&format!("{}:a", s.input_idx)],
            format!(
                "atrim={}:{},asetpts=PTS-STARTPTS,adelay={ms}|{ms},volume={}",
                ts(s.src_start),
                ts(s.src_end),
                param(s.gain as f64),
                ms = s.delay_ms,
            ),
            &[&pad],
            "audio mix",
        )?;
        pads.push(pad);
    }

    let inputs: Vec<&str> = pads.iter().map(|p| p.as_str()).collect();
    graph.push(
        &inputs,
        format!("amix=inputs={}:duration=longest", pads.len()),
        &["aout"],
        "audio mix",
    )?;
    Ok("aout".into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::context::{test_support::empty_bundle, ExportContext};
    use crate::state::{Project, Track, Transform};
    use std::path::PathBuf;
    use uuid::Uuid;

    fn audio_clip(track_id: Uuid, asset: Uuid, start: f64, end: f64, volume: f32) -> Clip {
        Clip {
            id:             Uuid::new_v4(),
            asset_id:       Some(asset),
            track_id,
            timeline_start: start,
            timeline_end:   end,
            source_start:   0.0,
            source_end:     end - start,
            body:           ClipBody::Audio { volume },
        }
    }

    #[test]
    fn empty_project_yields_trimmed_silence() {
        let mut project = Project::new("t");
        project.duration = 0.5;
        let bundle = empty_bundle();
        let ctx = ExportContext::build(&project, &bundle);
        let mut graph = FilterGraph::new();

        let out = build_audio_mix(&mut graph, &ctx).unwrap();
        assert_eq!(out, "aout");
        assert_eq!(
            graph.serialize(),
            "[0:a]atrim=0:0.5000,asetpts=PTS-STARTPTS[aout]"
        );
    }

    #[test]
    fn master_clip_is_delayed_and_mixed() {
        let mut project = Project::new("t");
        let song = Uuid::from_u128(5);
        let mut audio = Track::new(TrackKind::Audio, "A1");
        audio.is_master = true;
        audio.clips.push(audio_clip(audio.id, song, 1.5, 4.5, 0.8));
        project.tracks.push(audio);
        project.duration = 5.0;

        let mut bundle = empty_bundle();
        bundle.asset_paths.insert(song, PathBuf::from("/song.wav"));
        let ctx = ExportContext::build(&project, &bundle);
        let mut graph = FilterGraph::new();

        build_audio_mix(&mut graph, &ctx).unwrap();
        let s = graph.serialize();
        assert!(s.contains("[0:a]atrim=0:5.0000,asetpts=PTS-STARTPTS[abase]"));
        assert!(s.contains(
            "[1:a]atrim=0.0000:3.0000,asetpts=PTS-STARTPTS,adelay=1500|1500,volume=0.800000[au0]"
        ));
        assert!(s.contains("[abase][au0]amix=inputs=2:duration=longest[aout]"));
    }

    #[test]
    fn video_clip_audio_uses_wav_input() {
        let mut project = Project::new("t");
        let asset = Uuid::from_u128(1);
        let mut video = Track::new(TrackKind::Video, "V1");
        let clip = Clip {
            id:             Uuid::from_u128(42),
            asset_id:       Some(asset),
            track_id:       video.id,
            timeline_start: 0.0,
            timeline_end:   2.0,
            source_start:   0.0,
            source_end:     2.0,
            body:           ClipBody::Video {
                transform:         Transform::default(),
                use_clip_audio:    true,
                clip_audio_volume: 0.5,
            },
        };
        video.clips.push(clip);
        project.tracks.push(video);
        project.duration = 2.0;

        let mut bundle = empty_bundle();
        bundle.asset_paths.insert(asset, PathBuf::from("/a.mp4"));
        bundle
            .clip_audio_wavs
            .insert(Uuid::from_u128(42), PathBuf::from("/clip42.wav"));
        let ctx = ExportContext::build(&project, &bundle);
        assert_eq!(ctx.clip_wav_idx[&Uuid::from_u128(42)], 2);

        let mut graph = FilterGraph::new();
        build_audio_mix(&mut graph, &ctx).unwrap();
        let s = graph.serialize();
        assert!(s.contains("[2:a]atrim=0.0000:2.0000"));
        assert!(s.contains("volume=0.500000[au0]"));
    }

    #[test]
    fn missing_wav_skips_clip_audio() {
        let mut project = Project::new("t");
        let asset = Uuid::from_u128(1);
        let mut video = Track::new(TrackKind::Video, "V1");
        video.clips.push(Clip {
            id:             Uuid::new_v4(),
            asset_id:       Some(asset),
            track_id:       video.id,
            timeline_start: 0.0,
            timeline_end:   2.0,
            source_start:   0.0,
            source_end:     2.0,
            body:           ClipBody::Video {
                transform:         Transform::default(),
                use_clip_audio:    true,
                clip_audio_volume: 1.0,
            },
        });
        project.tracks.push(video);
        project.duration = 2.0;

        let mut bundle = empty_bundle();
        bundle.asset_paths.insert(asset, PathBuf::from("/a.mp4"));
        let ctx = ExportContext::build(&project, &bundle);
        let mut graph = FilterGraph::new();

        build_audio_mix(&mut graph, &ctx).unwrap();
        // No WAV registered → silence only.
        assert!(graph.serialize().ends_with("[aout]"));
        assert_eq!(graph.node_count(), 1);
    }
}
