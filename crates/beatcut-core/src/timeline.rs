// crates/beatcut-core/src/timeline.rs
//
// The timeline state machine: the only write path into a Project.
//
// Every mutation is a synchronous, atomic transition — it either commits a
// fully valid project or leaves the previous state untouched and returns an
// EditError. Undo history is a naive full-project snapshot pushed after each
// commit; no diffing.
//
// Asset durations are registered by the integration layer as probes finish
// (`register_asset_duration`). Source-range validation only applies once a
// duration is known — clips created against a still-probing asset carry a
// placeholder range that is corrected when the probe lands.

use std::collections::HashMap;

use chrono::Utc;
use uuid::Uuid;

use crate::error::EditError;
use crate::state::{
    BeatsData, Clip, ClipBody, EffectConfig, EffectKind, Project, Track, TrackKind, Transform,
    WorkArea,
};

// ── Snap ──────────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SnapMode {
    None,
    Beats,
    Clips,
}

/// The target nearest to `candidate` within `threshold`, with its delta.
fn nearest_target(candidate: f64, targets: &[f64], threshold: f64) -> Option<(f64, f64)> {
    let mut best: Option<(f64, f64)> = None; // (target, delta)
    for &t in targets {
        let d = (candidate - t).abs();
        if d <= threshold && best.map(|(_, bd)| d < bd).unwrap_or(true) {
            best = Some((t, d));
        }
    }
    best
}

/// Snap `candidate` to the nearest target within `threshold` seconds.
/// Idempotent: snapping an already-snapped value returns it unchanged.
pub fn snap_time(candidate: f64, targets: &[f64], threshold: f64) -> f64 {
    nearest_target(candidate, targets, threshold)
        .map(|(t, _)| t)
        .unwrap_or(candidate)
}

/// Convert a pixel-space snap radius into seconds at the caller's zoom
/// (`px_per_second` comes from the timeline viewport).
pub fn snap_threshold_secs(threshold_px: f32, px_per_second: f32) -> f64 {
    if px_per_second <= 0.0 {
        return 0.0;
    }
    (threshold_px / px_per_second) as f64
}

/// Collect snap targets for `mode`: timeline zero plus either every other
/// clip's edges or the master asset's beats.
pub fn snap_targets(
    project: &Project,
    mode: SnapMode,
    exclude_clip: Option<Uuid>,
    beats: Option<&BeatsData>,
) -> Vec<f64> {
    match mode {
        SnapMode::None => Vec::new(),
        SnapMode::Clips => {
            let mut t = vec![0.0];
            for track in &project.tracks {
                for clip in &track.clips {
                    if Some(clip.id) == exclude_clip {
                        continue;
                    }
                    t.push(clip.timeline_start);
                    t.push(clip.timeline_end);
                }
            }
            t
        }
        SnapMode::Beats => {
            let mut t = vec![0.0];
            if let Some(b) = beats {
                t.extend_from_slice(&b.beats);
            }
            t
        }
    }
}

/// Resolve a drag candidate for `clip_id` starting at `candidate_start`.
///
/// Both the moved clip's start and end edges are tested against the target
/// set; whichever edge snaps with the smaller delta decides the final
/// position. Returns the (possibly unchanged) new start.
pub fn resolve_snap(
    project: &Project,
    clip_id: Uuid,
    candidate_start: f64,
    mode: SnapMode,
    threshold: f64,
    beats: Option<&BeatsData>,
) -> f64 {
    if mode == SnapMode::None {
        return candidate_start;
    }
    let Some((_, clip)) = project.clip(clip_id) else {
        return candidate_start;
    };
    let dur = clip.duration();
    let targets = snap_targets(project, mode, Some(clip_id), beats);

    let start_hit = nearest_target(candidate_start, &targets, threshold);
    let end_hit = nearest_target(candidate_start + dur, &targets, threshold);

    let snapped = match (start_hit, end_hit) {
        (Some((t, ds)), Some((e, de))) => {
            if ds <= de {
                t
            } else {
                e - dur
            }
        }
        (Some((t, _)), None) => t,
        (None, Some((e, _))) => e - dur,
        (None, None) => candidate_start,
    };
    snapped.max(0.0)
}

// ── Clip patch ────────────────────────────────────────────────────────────────

/// Partial clip update; `None` fields are untouched. Payload fields only
/// apply to clips whose body carries them.
#[derive(Clone, Debug, Default)]
pub struct ClipPatch {
    pub timeline_start: Option<f64>,
    pub timeline_end:   Option<f64>,
    pub source_start:   Option<f64>,
    pub source_end:     Option<f64>,
    pub transform:      Option<Transform>,
    pub effect_config:  Option<EffectConfig>,
    pub text_content:   Option<String>,
    pub use_clip_audio: Option<bool>,
    pub volume:         Option<f32>,
}

// ── Editor ────────────────────────────────────────────────────────────────────

pub struct Editor {
    pub project: Project,
    asset_durations: HashMap<Uuid, f64>,
    undo: Vec<Project>,
    redo: Vec<Project>,
}

impl Editor {
    pub fn new(project: Project) -> Self {
        Self {
            project,
            asset_durations: HashMap::new(),
            undo: Vec::new(),
            redo: Vec::new(),
        }
    }

    /// Register a probed asset duration so source ranges can be validated.
    pub fn register_asset_duration(&mut self, asset_id: Uuid, duration: f64) {
        self.asset_durations.insert(asset_id, duration);
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    /// Run `f` against the project; on success refresh derived state and
    /// push the pre-mutation snapshot, on error restore it wholesale.
    fn commit<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, EditError>,
    ) -> Result<T, EditError> {
        let before = self.project.clone();
        match f(self) {
            Ok(v) => {
                self.project.duration = self.project.computed_duration();
                self.project.updated_at = Utc::now();
                for track in &mut self.project.tracks {
                    track
                        .clips
                        .sort_by(|a, b| a.timeline_start.total_cmp(&b.timeline_start));
                }
                self.undo.push(before);
                self.redo.clear();
                Ok(v)
            }
            Err(e) => {
                self.project = before;
                Err(e)
            }
        }
    }

    // ── Tracks ───────────────────────────────────────────────────────────────

    pub fn add_track(&mut self, kind: TrackKind, name: &str) -> Result<Uuid, EditError> {
        if kind == TrackKind::Effect {
            return Err(EditError::InvalidEffectTrack);
        }
        self.commit(|ed| {
            let track = Track::new(kind, name);
            let id = track.id;
            ed.project.tracks.push(track);
            Ok(id)
        })
    }

    /// Add an effect track bound to `parent` (a video track).
    pub fn add_effect_track(
        &mut self,
        effect: EffectKind,
        parent: Uuid,
        name: &str,
    ) -> Result<Uuid, EditError> {
        self.commit(|ed| {
            let parent_ok = ed
                .project
                .track(parent)
                .map(|t| t.kind == TrackKind::Video)
                .unwrap_or(false);
            if !parent_ok {
                return Err(EditError::InvalidEffectTrack);
            }
            let mut track = Track::new(TrackKind::Effect, name);
            track.effect_kind = Some(effect);
            track.parent_track_id = Some(parent);
            let id = track.id;
            ed.project.tracks.push(track);
            Ok(id)
        })
    }

    /// Mark an audio track as the master (beats source). At most one master
    /// exists at a time.
    pub fn set_master_audio(&mut self, track_id: Uuid) -> Result<(), EditError> {
        self.commit(|ed| {
            let is_audio = ed
                .project
                .track(track_id)
                .map(|t| t.kind == TrackKind::Audio)
                .unwrap_or(false);
            if !is_audio {
                return Err(EditError::TrackNotFound(track_id));
            }
            if ed
                .project
                .tracks
                .iter()
                .any(|t| t.is_master && t.id != track_id)
            {
                return Err(EditError::DuplicateMaster);
            }
            ed.project.track_mut(track_id).unwrap().is_master = true;
            Ok(())
        })
    }

    pub fn reorder_track(&mut self, from_idx: usize, to_idx: usize) -> Result<(), EditError> {
        self.commit(|ed| {
            let n = ed.project.tracks.len();
            if from_idx >= n {
                return Err(EditError::TrackIndexOutOfBounds(from_idx));
            }
            if to_idx >= n {
                return Err(EditError::TrackIndexOutOfBounds(to_idx));
            }
            let track = ed.project.tracks.remove(from_idx);
            ed.project.tracks.insert(to_idx, track);
            Ok(())
        })
    }

    // ── Clips ────────────────────────────────────────────────────────────────

    /// Place a clip on a track. `asset_id` is required for media payloads;
    /// the source range starts at 0 with length `duration`.
    pub fn add_clip(
        &mut self,
        track_id: Uuid,
        asset_id: Option<Uuid>,
        timeline_start: f64,
        duration: f64,
        body: ClipBody,
    ) -> Result<Uuid, EditError> {
        self.commit(|ed| {
            let end = timeline_start + duration;
            let clip = Clip {
                id: Uuid::new_v4(),
                asset_id,
                track_id,
                timeline_start,
                timeline_end: end,
                source_start: 0.0,
                source_end: duration,
                body,
            };
            let id = clip.id;
            ed.validate_placement(&clip, track_id, None)?;
            ed.project.track_mut(track_id).unwrap().clips.push(clip);
            Ok(id)
        })
    }

    pub fn update_clip(&mut self, clip_id: Uuid, patch: ClipPatch) -> Result<(), EditError> {
        self.commit(|ed| {
            let (ti, ci) = ed
                .project
                .locate_clip(clip_id)
                .ok_or(EditError::ClipNotFound(clip_id))?;
            let track_id = ed.project.tracks[ti].id;

            let mut clip = ed.project.tracks[ti].clips[ci].clone();
            if let Some(v) = patch.timeline_start {
                clip.timeline_start = v;
            }
            if let Some(v) = patch.timeline_end {
                clip.timeline_end = v;
            }
            if let Some(v) = patch.source_start {
                clip.source_start = v;
            }
            if let Some(v) = patch.source_end {
                clip.source_end = v;
            }
            if let Some(t) = patch.transform {
                if let Some(slot) = clip.body.transform_mut() {
                    *slot = t;
                }
            }
            if let Some(cfg) = patch.effect_config {
                if let ClipBody::Effect { config } = &mut clip.body {
                    *config = cfg;
                }
            }
            if let Some(text) = patch.text_content {
                if let ClipBody::Text { content, .. } = &mut clip.body {
                    *content = text;
                }
            }
            if let Some(v) = patch.use_clip_audio {
                if let ClipBody::Video { use_clip_audio, .. } = &mut clip.body {
                    *use_clip_audio = v;
                }
            }
            if let Some(v) = patch.volume {
                match &mut clip.body {
                    ClipBody::Audio { volume } => *volume = v,
                    ClipBody::Video { clip_audio_volume, .. } => *clip_audio_volume = v,
                    _ => {}
                }
            }

            ed.validate_placement(&clip, track_id, Some(clip_id))?;
            ed.project.tracks[ti].clips[ci] = clip;
            Ok(())
        })
    }

    pub fn delete_clip(&mut self, clip_id: Uuid) -> Result<(), EditError> {
        self.commit(|ed| {
            let (ti, ci) = ed
                .project
                .locate_clip(clip_id)
                .ok_or(EditError::ClipNotFound(clip_id))?;
            ed.project.tracks[ti].clips.remove(ci);
            Ok(())
        })
    }

    /// Split a clip at timeline time `at` into two contiguous clips sharing
    /// the asset. Source range divides proportionally. Returns the id of the
    /// right-hand clip.
    pub fn split_clip(&mut self, clip_id: Uuid, at: f64) -> Result<Uuid, EditError> {
        self.commit(|ed| {
            let (ti, ci) = ed
                .project
                .locate_clip(clip_id)
                .ok_or(EditError::ClipNotFound(clip_id))?;
            let clip = &ed.project.tracks[ti].clips[ci];
            if at <= clip.timeline_start || at >= clip.timeline_end {
                return Err(EditError::SplitOutOfRange { at });
            }

            let ratio = (at - clip.timeline_start) / clip.duration();
            let source_split = clip.source_start + ratio * (clip.source_end - clip.source_start);

            let mut right = clip.clone();
            right.id = Uuid::new_v4();
            right.timeline_start = at;
            right.source_start = source_split;
            let right_id = right.id;

            let left = &mut ed.project.tracks[ti].clips[ci];
            left.timeline_end = at;
            left.source_end = source_split;

            ed.project.tracks[ti].clips.insert(ci + 1, right);
            Ok(right_id)
        })
    }

    /// Move a clip onto an existing track at `[new_start, new_end)`.
    /// Rejects when track kinds are incompatible; effect tracks never
    /// accept moves. Remove-and-reinsert happens in one transition.
    pub fn move_clip_to_track(
        &mut self,
        clip_id: Uuid,
        to_track_id: Uuid,
        new_start: f64,
        new_end: f64,
    ) -> Result<(), EditError> {
        self.commit(|ed| {
            let (ti, ci) = ed
                .project
                .locate_clip(clip_id)
                .ok_or(EditError::ClipNotFound(clip_id))?;
            let dest_kind = ed
                .project
                .track(to_track_id)
                .ok_or(EditError::TrackNotFound(to_track_id))?
                .kind;
            if dest_kind == TrackKind::Effect {
                return Err(EditError::MoveRejected(dest_kind));
            }
            if ed.project.tracks[ti].kind != dest_kind {
                return Err(EditError::MoveRejected(dest_kind));
            }

            let mut clip = ed.project.tracks[ti].clips.remove(ci);
            let span = new_end - new_start;
            let src_span = clip.source_end - clip.source_start;
            // Trimming during the move rescales the source window from the
            // same anchor, matching an in-track trim.
            if (span - clip.duration()).abs() > f64::EPSILON && clip.body.is_media() {
                clip.source_end = clip.source_start + src_span.min(span);
            }
            clip.timeline_start = new_start;
            clip.timeline_end = new_end;
            clip.track_id = to_track_id;

            ed.validate_placement(&clip, to_track_id, None)?;
            ed.project.track_mut(to_track_id).unwrap().clips.push(clip);
            Ok(())
        })
    }

    /// Move a clip onto a brand-new track appended at the bottom.
    pub fn move_clip_to_new_track(
        &mut self,
        clip_id: Uuid,
        kind: TrackKind,
        new_start: f64,
        new_end: f64,
    ) -> Result<Uuid, EditError> {
        let idx = self.project.tracks.len();
        self.move_clip_to_new_track_at(clip_id, kind, new_start, new_end, idx)
    }

    /// Move a clip onto a new track inserted at `insert_idx` (0 = top).
    pub fn move_clip_to_new_track_at(
        &mut self,
        clip_id: Uuid,
        kind: TrackKind,
        new_start: f64,
        new_end: f64,
        insert_idx: usize,
    ) -> Result<Uuid, EditError> {
        self.commit(|ed| {
            if kind == TrackKind::Effect {
                return Err(EditError::MoveRejected(kind));
            }
            let (ti, ci) = ed
                .project
                .locate_clip(clip_id)
                .ok_or(EditError::ClipNotFound(clip_id))?;
            if ed.project.tracks[ti].kind != kind {
                return Err(EditError::MoveRejected(kind));
            }
            if insert_idx > ed.project.tracks.len() {
                return Err(EditError::TrackIndexOutOfBounds(insert_idx));
            }

            let mut clip = ed.project.tracks[ti].clips.remove(ci);
            clip.timeline_start = new_start;
            clip.timeline_end = new_end;

            let n = ed
                .project
                .tracks
                .iter()
                .filter(|t| t.kind == kind)
                .count();
            let track = Track::new(kind, format!("{kind:?} {}", n + 1));
            clip.track_id = track.id;
            let track_id = track.id;

            // Insert the empty track first so placement validates against it;
            // commit() rolls the whole transition back on error.
            ed.project.tracks.insert(insert_idx, track);
            ed.validate_placement(&clip, track_id, None)?;
            ed.project.track_mut(track_id).unwrap().clips.push(clip);
            Ok(track_id)
        })
    }

    // ── Work area ────────────────────────────────────────────────────────────

    pub fn set_work_area(
        &mut self,
        start: f64,
        end: f64,
        is_manual: bool,
    ) -> Result<(), EditError> {
        self.commit(|ed| {
            if !(start >= 0.0 && start < end) {
                return Err(EditError::InvalidRange { start, end });
            }
            ed.project.work_area = Some(WorkArea { start, end, is_manual });
            Ok(())
        })
    }

    pub fn clear_work_area(&mut self) -> Result<(), EditError> {
        self.commit(|ed| {
            ed.project.work_area = None;
            Ok(())
        })
    }

    // ── History ──────────────────────────────────────────────────────────────

    pub fn undo(&mut self) -> bool {
        match self.undo.pop() {
            Some(prev) => {
                self.redo.push(std::mem::replace(&mut self.project, prev));
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.redo.pop() {
            Some(next) => {
                self.undo.push(std::mem::replace(&mut self.project, next));
                true
            }
            None => false,
        }
    }

    // ── Validation ───────────────────────────────────────────────────────────

    /// All clip invariants against a destination track. `except` skips the
    /// clip's own previous position during overlap checks.
    fn validate_placement(
        &self,
        clip: &Clip,
        track_id: Uuid,
        except: Option<Uuid>,
    ) -> Result<(), EditError> {
        let track = self
            .project
            .track(track_id)
            .ok_or(EditError::TrackNotFound(track_id))?;

        if !track.accepts(&clip.body) {
            return Err(EditError::IncompatibleTrack { track_kind: track.kind });
        }
        if !(clip.timeline_start >= 0.0 && clip.timeline_start < clip.timeline_end) {
            return Err(EditError::InvalidRange {
                start: clip.timeline_start,
                end:   clip.timeline_end,
            });
        }
        if clip.body.is_media() {
            if !(clip.source_start >= 0.0 && clip.source_start < clip.source_end) {
                return Err(EditError::InvalidRange {
                    start: clip.source_start,
                    end:   clip.source_end,
                });
            }
            // Probed assets get a hard bound; unknown durations are checked
            // once the probe lands and the integration layer re-trims.
            if let Some(&dur) = clip
                .asset_id
                .as_ref()
                .and_then(|id| self.asset_durations.get(id))
            {
                if dur > 0.0 && clip.source_end > dur + 1e-9 {
                    return Err(EditError::SourceOutOfBounds {
                        start:          clip.source_start,
                        end:            clip.source_end,
                        asset_duration: dur,
                    });
                }
            }
        }
        if !track.range_free(clip.timeline_start, clip.timeline_end, except) {
            return Err(EditError::Overlap { clip: clip.id, track: track_id });
        }
        Ok(())
    }
}
