// crates/beatcut-core/src/export/context.rs
//
// Compiler inputs.
//
// `ExportBundle` is the resolved bag the integration layer hands over:
// playable paths, mask paths, per-clip WAVs, beats, the project directory
// and the injected side-file writer. The compiler performs no filesystem
// access of its own — `write_file` is its only IO edge.
//
// `ExportContext::build` enumerates the ffmpeg inputs once, in a stable
// order, before the graph walk starts. After that the context is read-only.
//
// Input order:
//   [0]           anullsrc silence (audio-mix anchor, lavfi)
//   [1..]         referenced assets, ascending asset id
//   then          per-clip audio WAVs, ascending clip id
//   then          cutout mask videos, ascending asset id

use std::collections::{BTreeMap, HashMap};
use std::io;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::error::ExportError;
use crate::state::{BeatsData, Clip, ClipBody, EffectKind, Project, Resolution, TrackKind};

/// Injected side-file writer (ASS subtitles only).
pub type FileWriter<'a> = Box<dyn Fn(&Path, &str) -> io::Result<()> + 'a>;

pub struct ExportBundle<'a> {
    /// Playable input path per asset (proxy preferred over original).
    pub asset_paths:     HashMap<Uuid, PathBuf>,
    /// Grayscale mask video per asset, where the cutout tool has run.
    pub mask_paths:      HashMap<Uuid, PathBuf>,
    /// Extracted WAV per video clip with `use_clip_audio`.
    pub clip_audio_wavs: HashMap<Uuid, PathBuf>,
    /// Beat-detection output per asset.
    pub beats:           HashMap<Uuid, BeatsData>,
    pub project_dir:     PathBuf,
    pub write_file:      FileWriter<'a>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum InputSpec {
    /// `-i <path>`
    File(PathBuf),
    /// `-f lavfi -i <graph>`
    Lavfi(String),
}

pub struct ExportContext<'a> {
    pub project:    &'a Project,
    pub resolution: Resolution,
    /// Export span in project-timeline seconds (work area or full project).
    pub span:       (f64, f64),
    pub inputs:     Vec<InputSpec>,

    // Stable id → input index maps (BTreeMap keeps iteration deterministic).
    pub asset_input_idx: BTreeMap<Uuid, usize>,
    pub clip_wav_idx:    BTreeMap<Uuid, usize>,
    pub mask_input_idx:  BTreeMap<Uuid, usize>,

    pub beats:       &'a HashMap<Uuid, BeatsData>,
    pub project_dir: &'a Path,
    write_file:      &'a FileWriter<'a>,
}

impl<'a> ExportContext<'a> {
    pub fn build(project: &'a Project, bundle: &'a ExportBundle<'a>) -> Self {
        let span = project.export_span();
        let mut inputs = vec![InputSpec::Lavfi("anullsrc=r=44100:cl=stereo".into())];

        // Assets referenced by at least one clip, ascending id.
        let mut asset_ids: Vec<Uuid> = project
            .tracks
            .iter()
            .flat_map(|t| t.clips.iter())
            .filter_map(|c| c.asset_id)
            .filter(|id| bundle.asset_paths.contains_key(id))
            .collect();
        asset_ids.sort();
        asset_ids.dedup();

        let mut asset_input_idx = BTreeMap::new();
        for id in &asset_ids {
            asset_input_idx.insert(*id, inputs.len());
            inputs.push(InputSpec::File(bundle.asset_paths[id].clone()));
        }

        // WAV sidecars for video clips that mix their own audio.
        let mut wav_clips: Vec<(Uuid, &PathBuf)> = project
            .tracks
            .iter()
            .flat_map(|t| t.clips.iter())
            .filter(|c| matches!(c.body, ClipBody::Video { use_clip_audio: true, .. }))
            .filter_map(|c| bundle.clip_audio_wavs.get(&c.id).map(|p| (c.id, p)))
            .collect();
        wav_clips.sort_by_key(|(id, _)| *id);

        let mut clip_wav_idx = BTreeMap::new();
        for (id, path) in wav_clips {
            clip_wav_idx.insert(id, inputs.len());
            inputs.push(InputSpec::File(path.clone()));
        }

        // Mask inputs: only for assets whose clips have a cutout active
        // somewhere over their range.
        let mut mask_assets: Vec<(Uuid, &PathBuf)> = Vec::new();
        for track in project.tracks.iter().filter(|t| t.kind == TrackKind::Video) {
            for clip in &track.clips {
                let Some(asset_id) = clip.asset_id else { continue };
                let Some(mask) = bundle.mask_paths.get(&asset_id) else { continue };
                let active = project
                    .active_effect_config(
                        track.id,
                        EffectKind::Cutout,
                        clip.timeline_start,
                        clip.timeline_end,
                    )
                    .is_some();
                if active && !mask_assets.iter().any(|(id, _)| *id == asset_id) {
                    mask_assets.push((asset_id, mask));
                }
            }
        }
        mask_assets.sort_by_key(|(id, _)| *id);

        let mut mask_input_idx = BTreeMap::new();
        for (id, path) in mask_assets {
            mask_input_idx.insert(id, inputs.len());
            inputs.push(InputSpec::File(path.clone()));
        }

        Self {
            project,
            resolution: project.output_resolution,
            span,
            inputs,
            asset_input_idx,
            clip_wav_idx,
            mask_input_idx,
            beats: &bundle.beats,
            project_dir: &bundle.project_dir,
            write_file: &bundle.write_file,
        }
    }

    pub fn duration(&self) -> f64 {
        (self.span.1 - self.span.0).max(0.0)
    }

    /// Project-timeline time → export-local time.
    pub fn local_time(&self, t: f64) -> f64 {
        t - self.span.0
    }

    /// The clip's visible window inside the export span, as
    /// `(local_start, local_end, source_start, source_end)`.
    /// `None` when the clip lies entirely outside the span.
    pub fn visible_window(&self, clip: &Clip) -> Option<(f64, f64, f64, f64)> {
        let vis_start = clip.timeline_start.max(self.span.0);
        let vis_end = clip.timeline_end.min(self.span.1);
        if vis_start >= vis_end {
            return None;
        }
        let src_start = clip.source_start + (vis_start - clip.timeline_start);
        let src_end = src_start + (vis_end - vis_start);
        Some((
            self.local_time(vis_start),
            self.local_time(vis_end),
            src_start,
            src_end,
        ))
    }

    /// Timeline-domain beats of the master audio clip, i.e. asset beats
    /// shifted by the master clip's placement. Empty when there is no
    /// master clip or no beats sidecar.
    pub fn master_beats(&self) -> Vec<f64> {
        master_beats(self.project, self.beats)
    }

    /// Write an ASS side-file into the project directory via the injected
    /// writer. Returns the full path for the `subtitles=` filter arg.
    pub fn write_side_file(&self, name: &str, content: &str) -> Result<PathBuf, ExportError> {
        let path = self.project_dir.join(name);
        (self.write_file)(&path, content).map_err(|e| ExportError::WriteFile {
            path:   path.display().to_string(),
            reason: e.to_string(),
        })?;
        Ok(path)
    }
}

/// Beats of the master audio clip mapped into project-timeline seconds.
pub fn master_beats(project: &Project, beats: &HashMap<Uuid, BeatsData>) -> Vec<f64> {
    let Some(master) = project.master_audio_clip() else {
        return Vec::new();
    };
    let Some(asset_id) = master.asset_id else {
        return Vec::new();
    };
    let Some(data) = beats.get(&asset_id) else {
        return Vec::new();
    };
    data.beats
        .iter()
        .map(|&b| master.timeline_start + (b - master.source_start))
        .filter(|&b| b >= master.timeline_start && b < master.timeline_end)
        .collect()
}


#[cfg(test)]
mod tests {
    use super::test_support::empty_bundle as bundle;
    use super::*;
    use crate::state::{EffectConfig, Track, Transform};

    fn video_clip(track_id: Uuid, asset: Uuid, start: f64, end: f64) -> Clip {
        Clip {
            id:             Uuid::new_v4(),
            asset_id:       Some(asset),
            track_id,
            timeline_start: start,
            timeline_end:   end,
            source_start:   0.0,
            source_end:     end - start,
            body:           ClipBody::Video {
                transform:         Transform::default(),
                use_clip_audio:    false,
                clip_audio_volume: 1.0,
            },
        }
    }

    #[test]
    fn silence_is_always_input_zero() {
        let p = Project::new("t");
        let b = bundle();
        let ctx = ExportContext::build(&p, &b);
        assert_eq!(ctx.inputs.len(), 1);
        assert!(matches!(&ctx.inputs[0], InputSpec::Lavfi(s) if s.starts_with("anullsrc")));
    }

    #[test]
    fn assets_enumerate_in_id_order_from_one() {
        let mut p = Project::new("t");
        let mut track = Track::new(TrackKind::Video, "V1");
        let a1 = Uuid::from_u128(7);
        let a2 = Uuid::from_u128(3);
        track.clips.push(video_clip(track.id, a1, 0.0, 1.0));
        track.clips.push(video_clip(track.id, a2, 1.0, 2.0));
        // Duplicate reference must not add a second input.
        track.clips.push(video_clip(track.id, a1, 2.0, 3.0));
        p.tracks.push(track);

        let mut b = bundle();
        b.asset_paths.insert(a1, PathBuf::from("/a1.mp4"));
        b.asset_paths.insert(a2, PathBuf::from("/a2.mp4"));
        let ctx = ExportContext::build(&p, &b);

        assert_eq!(ctx.asset_input_idx[&a2], 1); // lower id first
        assert_eq!(ctx.asset_input_idx[&a1], 2);
        assert_eq!(ctx.inputs.len(), 3);
    }

    #[test]
    fn unresolved_assets_are_not_enumerated() {
        let mut p = Project::new("t");
        let mut track = Track::new(TrackKind::Video, "V1");
        let a1 = Uuid::from_u128(1);
        track.clips.push(video_clip(track.id, a1, 0.0, 1.0));
        p.tracks.push(track);

        let ctx_bundle = bundle(); // no path registered
        let ctx = ExportContext::build(&p, &ctx_bundle);
        assert!(ctx.asset_input_idx.is_empty());
    }

    #[test]
    fn mask_enumerated_only_when_cutout_active() {
        let mut p = Project::new("t");
        let mut track = Track::new(TrackKind::Video, "V1");
        let track_id = track.id;
        let asset = Uuid::from_u128(1);
        track.clips.push(video_clip(track_id, asset, 0.0, 2.0));
        p.tracks.push(track);

        let mut b = bundle();
        b.asset_paths.insert(asset, PathBuf::from("/a.mp4"));
        b.mask_paths.insert(asset, PathBuf::from("/a_mask.mp4"));

        // No cutout effect track: mask is not an input.
        let ctx = ExportContext::build(&p, &b);
        assert!(ctx.mask_input_idx.is_empty());

        let mut fx = Track::new(TrackKind::Effect, "FX");
        fx.effect_kind = Some(EffectKind::Cutout);
        fx.parent_track_id = Some(track_id);
        fx.clips.push(Clip {
            id:             Uuid::new_v4(),
            asset_id:       None,
            track_id:       fx.id,
            timeline_start: 0.0,
            timeline_end:   2.0,
            source_start:   0.0,
            source_end:     2.0,
            body:           ClipBody::Effect {
                config: EffectConfig::default_for(EffectKind::Cutout),
            },
        });
        p.tracks.push(fx);

        let ctx = ExportContext::build(&p, &b);
        assert_eq!(ctx.mask_input_idx[&asset], 2);
    }

    #[test]
    fn visible_window_clamps_to_work_area() {
        let mut p = Project::new("t");
        p.duration = 10.0;
        p.work_area = Some(crate::state::WorkArea {
            start:     2.0,
            end:       6.0,
            is_manual: true,
        });
        let track_id = Uuid::new_v4();
        let clip = video_clip(track_id, Uuid::new_v4(), 1.0, 5.0);

        let b = bundle();
        let ctx = ExportContext::build(&p, &b);
        let (ls, le, ss, se) = ctx.visible_window(&clip).unwrap();
        assert_eq!((ls, le), (0.0, 3.0));
        assert_eq!((ss, se), (1.0, 4.0));

        let outside = video_clip(track_id, Uuid::new_v4(), 7.0, 9.0);
        assert!(ctx.visible_window(&outside).is_none());
    }

    #[test]
    fn master_beats_shift_by_clip_placement() {
        let mut p = Project::new("t");
        let mut audio = Track::new(TrackKind::Audio, "A1");
        audio.is_master = true;
        let asset = Uuid::from_u128(9);
        audio.clips.push(Clip {
            id:             Uuid::new_v4(),
            asset_id:       Some(asset),
            track_id:       audio.id,
            timeline_start: 1.0,
            timeline_end:   4.0,
            source_start:   0.5,
            source_end:     3.5,
            body:           ClipBody::Audio { volume: 1.0 },
        });
        p.tracks.push(audio);

        let mut beats = HashMap::new();
        beats.insert(asset, BeatsData { tempo: 120.0, beats: vec![0.5, 1.0, 3.6] });

        // 0.5 → 1.0, 1.0 → 1.5; 3.6 maps to 4.1, past the clip end.
        assert_eq!(master_beats(&p, &beats), vec![1.0, 1.5]);
    }
}
