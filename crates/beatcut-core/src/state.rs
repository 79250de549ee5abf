// crates/beatcut-core/src/state.rs
// Pure project data — no process handles, no IO, no raster buffers.
// Serializable via serde; the project file is the serde_json form of
// `Project`. Mutation goes through `timeline::Editor`, which enforces the
// invariants documented on each type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

use crate::helpers::color::{self, Color};

// ── Canvas ────────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum AspectRatio {
    NineSixteen,    // 9:16  — TikTok / Reels / Shorts (the product default)
    SixteenNine,    // 16:9  — YouTube / HD
    OneOne,         // 1:1   — Square
    FourFive,       // 4:5   — Instagram portrait
}

impl AspectRatio {
    pub fn value(self) -> f32 {
        match self {
            AspectRatio::NineSixteen => 9.0 / 16.0,
            AspectRatio::SixteenNine => 16.0 / 9.0,
            AspectRatio::OneOne      => 1.0,
            AspectRatio::FourFive    => 4.0 / 5.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width:  u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Self { width: 1080, height: 1920 }
    }
}

/// Optional export sub-range. `is_manual = false` means the range tracks the
/// project duration and export ignores it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorkArea {
    pub start:     f64,
    pub end:       f64,
    pub is_manual: bool,
}

impl WorkArea {
    pub fn span(&self) -> f64 {
        (self.end - self.start).max(0.0)
    }
}

// ── Transform & styles ────────────────────────────────────────────────────────

/// Placement of a visual clip on the output canvas.
///
/// `x`/`y` are offsets of the clip center from the canvas center, in output
/// pixels. `rotation` is degrees clockwise. `opacity` ∈ [0, 1].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub scale:    f32,
    pub x:        f32,
    pub y:        f32,
    pub rotation: f32,
    pub opacity:  f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self { scale: 1.0, x: 0.0, y: 0.0, rotation: 0.0, opacity: 1.0 }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    /// Size in pixels at the 1920-high reference canvas; the export compiler
    /// rescales by the actual output height.
    pub font_size:  f32,
    pub color:      Color,
    #[serde(default)]
    pub background: Option<Color>,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self { font_size: 72.0, color: color::WHITE, background: None }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RectangleStyle {
    pub color:         Color,
    /// Fill opacity ∈ [0, 1], separate from `Transform::opacity`.
    pub fill_opacity:  f32,
    pub width:         f32,
    pub height:        f32,
    #[serde(default)]
    pub border_color:  Option<Color>,
    #[serde(default)]
    pub border_width:  Option<f32>,
    /// Rounded corners render in preview only; export emits square boxes.
    #[serde(default)]
    pub border_radius: Option<f32>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LyricsPosition {
    Top,
    Center,
    Bottom,
}

impl LyricsPosition {
    /// ASS `\an` alignment value for this position.
    pub fn ass_alignment(self) -> u8 {
        match self {
            LyricsPosition::Top    => 8,
            LyricsPosition::Center => 5,
            LyricsPosition::Bottom => 2,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LyricsStyle {
    pub position:        LyricsPosition,
    pub font_size:       f32,
    pub color:           Color,
    /// Color of the word currently being sung.
    pub highlight_color: Color,
}

impl Default for LyricsStyle {
    fn default() -> Self {
        Self {
            position:        LyricsPosition::Bottom,
            font_size:       64.0,
            color:           color::WHITE,
            highlight_color: Color::rgb(0xFF, 0xD0, 0x00),
        }
    }
}

/// One aligned word from the lyrics-alignment tool. Times are seconds on
/// the timeline of the clip (clip-level) or the project (project-level).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LyricWord {
    pub word:  String,
    pub start: f64,
    pub end:   f64,
}

/// Project-level lyrics overlay, rendered across the whole timeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LyricsData {
    pub words: Vec<LyricWord>,
    #[serde(default)]
    pub style: LyricsStyle,
}

// ── Effects ───────────────────────────────────────────────────────────────────

/// Discriminant-only enum used as the effect-registry key.
///
/// Carries no parameters — it identifies *which* effect, not how it is
/// configured for a particular effect-track clip. Kept separate from
/// `EffectConfig` so registry lookups key on a `Copy` type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectKind {
    BeatZoom,
    Cutout,
    Cartoon,
    ColorGrade,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CutoutMode {
    /// Keep the person, replace the background with a fill color.
    RemoveBg,
    /// Keep the background, fill the person region.
    RemovePerson,
}

/// Parameter set stored on an effect-track clip. One variant per effect;
/// `enabled` lives in every variant so a clip can be toggled without losing
/// its tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum EffectConfig {
    BeatZoom {
        enabled:       bool,
        /// Zoom factor is `1 + intensity`.
        intensity:     f32,
        /// Pulse length per beat, milliseconds.
        duration_ms:   f32,
        /// Use every Nth beat (1 = every beat).
        beat_division: u32,
    },
    Cutout {
        enabled:    bool,
        mode:       CutoutMode,
        background: Color,
    },
    Cartoon {
        enabled:    bool,
        /// hqdn3d luma strength; chroma/temporal derive from it.
        smoothing:  f32,
        edge_low:   f32,
        edge_high:  f32,
        saturation: f32,
    },
    ColorGrade {
        enabled:    bool,
        contrast:   f32,
        brightness: f32,
        saturation: f32,
        /// Hue rotation in degrees.
        hue:        f32,
        shadows:    f32,
        highlights: f32,
    },
}

impl EffectConfig {
    /// Return the discriminant for registry lookup, stripping parameters.
    pub fn kind(&self) -> EffectKind {
        match self {
            EffectConfig::BeatZoom { .. }   => EffectKind::BeatZoom,
            EffectConfig::Cutout { .. }     => EffectKind::Cutout,
            EffectConfig::Cartoon { .. }    => EffectKind::Cartoon,
            EffectConfig::ColorGrade { .. } => EffectKind::ColorGrade,
        }
    }

    pub fn enabled(&self) -> bool {
        match *self {
            EffectConfig::BeatZoom { enabled, .. }
            | EffectConfig::Cutout { enabled, .. }
            | EffectConfig::Cartoon { enabled, .. }
            | EffectConfig::ColorGrade { enabled, .. } => enabled,
        }
    }

    /// Neutral parameter set for a freshly added effect clip.
    pub fn default_for(kind: EffectKind) -> Self {
        match kind {
            EffectKind::BeatZoom => EffectConfig::BeatZoom {
                enabled:       true,
                intensity:     0.1,
                duration_ms:   150.0,
                beat_division: 1,
            },
            EffectKind::Cutout => EffectConfig::Cutout {
                enabled:    true,
                mode:       CutoutMode::RemoveBg,
                background: color::BLACK,
            },
            EffectKind::Cartoon => EffectConfig::Cartoon {
                enabled:    true,
                smoothing:  4.0,
                edge_low:   0.1,
                edge_high:  0.3,
                saturation: 1.4,
            },
            EffectKind::ColorGrade => EffectConfig::ColorGrade {
                enabled:    true,
                contrast:   1.0,
                brightness: 0.0,
                saturation: 1.0,
                hue:        0.0,
                shadows:    0.0,
                highlights: 0.0,
            },
        }
    }
}

// ── Clips ─────────────────────────────────────────────────────────────────────

/// Kind-specific clip payload. Exactly one payload per clip; element
/// dispatch pattern-matches on this plus the owning track's kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ClipBody {
    Video {
        transform:         Transform,
        /// Mix this clip's own audio into the export.
        use_clip_audio:    bool,
        clip_audio_volume: f32,
    },
    Text {
        content:   String,
        style:     TextStyle,
        transform: Transform,
    },
    Rectangle {
        style:     RectangleStyle,
        transform: Transform,
    },
    Lyrics {
        words: Vec<LyricWord>,
        style: LyricsStyle,
    },
    Audio {
        volume: f32,
    },
    Effect {
        config: EffectConfig,
    },
}

impl ClipBody {
    pub fn transform(&self) -> Option<&Transform> {
        match self {
            ClipBody::Video { transform, .. }
            | ClipBody::Text { transform, .. }
            | ClipBody::Rectangle { transform, .. } => Some(transform),
            _ => None,
        }
    }

    pub fn transform_mut(&mut self) -> Option<&mut Transform> {
        match self {
            ClipBody::Video { transform, .. }
            | ClipBody::Text { transform, .. }
            | ClipBody::Rectangle { transform, .. } => Some(transform),
            _ => None,
        }
    }

    /// True for payloads that read samples from a media asset (and therefore
    /// must satisfy the source-range invariant).
    pub fn is_media(&self) -> bool {
        matches!(self, ClipBody::Video { .. } | ClipBody::Audio { .. })
    }
}

/// A time range on a track.
///
/// Invariants (enforced by `timeline::Editor`):
///   - `timeline_start < timeline_end`
///   - media clips: `0 ≤ source_start < source_end ≤ asset.duration`
///   - clips on the same track never overlap
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    pub id:             Uuid,
    /// Media clips reference an asset; text/rectangle/lyrics/effect clips
    /// carry their payload inline.
    #[serde(default)]
    pub asset_id:       Option<Uuid>,
    pub track_id:       Uuid,
    pub timeline_start: f64,
    pub timeline_end:   f64,
    pub source_start:   f64,
    pub source_end:     f64,
    pub body:           ClipBody,
}

impl Clip {
    pub fn duration(&self) -> f64 {
        self.timeline_end - self.timeline_start
    }

    pub fn contains_time(&self, t: f64) -> bool {
        t >= self.timeline_start && t < self.timeline_end
    }

    pub fn overlaps(&self, start: f64, end: f64) -> bool {
        self.timeline_start < end && self.timeline_end > start
    }

    /// Source timestamp corresponding to timeline time `t` (unclamped).
    pub fn source_time_at(&self, t: f64) -> f64 {
        self.source_start + (t - self.timeline_start)
    }
}

// ── Tracks ────────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackKind {
    Video,
    Audio,
    Text,
    Lyrics,
    Effect,
}

/// An ordered lane of non-overlapping clips.
///
/// Tracks are stored top-to-bottom: index 0 renders on top in preview and
/// is composited last at export. Effect tracks carry `effect_kind` and
/// `parent_track_id` (a video track) and describe *when* an effect applies,
/// not a sample stream.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id:              Uuid,
    pub kind:            TrackKind,
    pub name:            String,
    #[serde(default)]
    pub muted:           bool,
    /// At most one audio track is the master; beats snap against its asset.
    #[serde(default)]
    pub is_master:       bool,
    pub clips:           Vec<Clip>,
    #[serde(default)]
    pub effect_kind:     Option<EffectKind>,
    #[serde(default)]
    pub parent_track_id: Option<Uuid>,
}

impl Track {
    pub fn new(kind: TrackKind, name: impl Into<String>) -> Self {
        Self {
            id:              Uuid::new_v4(),
            kind,
            name:            name.into(),
            muted:           false,
            is_master:       false,
            clips:           Vec::new(),
            effect_kind:     None,
            parent_track_id: None,
        }
    }

    /// Whether `body` is a legal payload for a clip on this track.
    pub fn accepts(&self, body: &ClipBody) -> bool {
        matches!(
            (self.kind, body),
            (TrackKind::Video, ClipBody::Video { .. })
                | (TrackKind::Video, ClipBody::Text { .. })
                | (TrackKind::Video, ClipBody::Rectangle { .. })
                | (TrackKind::Audio, ClipBody::Audio { .. })
                | (TrackKind::Text, ClipBody::Text { .. })
                | (TrackKind::Text, ClipBody::Rectangle { .. })
                | (TrackKind::Lyrics, ClipBody::Lyrics { .. })
                | (TrackKind::Effect, ClipBody::Effect { .. })
        )
    }

    /// True if `[start, end)` is free of clips (ignoring `except`).
    pub fn range_free(&self, start: f64, end: f64, except: Option<Uuid>) -> bool {
        !self
            .clips
            .iter()
            .any(|c| except != Some(c.id) && c.overlaps(start, end))
    }
}

// ── Assets ────────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssetKind {
    Video,
    Audio,
    Image,
}

/// An imported media file plus everything derived from it. Paths are opaque
/// tokens owned by the asset; derived paths appear as the external tools
/// finish (proxy/waveform/beats/mask generation run out of process).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub id:            Uuid,
    pub name:          String,
    pub kind:          AssetKind,
    pub original_path: PathBuf,
    #[serde(default)]
    pub proxy_path:    Option<PathBuf>,
    #[serde(default)]
    pub audio_path:    Option<PathBuf>,
    #[serde(default)]
    pub waveform_path: Option<PathBuf>,
    #[serde(default)]
    pub beats_path:    Option<PathBuf>,
    /// Grayscale person-mask video (yuv420p), produced by the cutout tool.
    #[serde(default)]
    pub mask_path:     Option<PathBuf>,
    pub duration:      f64,
    #[serde(default)]
    pub width:         Option<u32>,
    #[serde(default)]
    pub height:        Option<u32>,
    #[serde(default)]
    pub fps:           Option<f64>,
}

/// Beat-detection output for one asset: `{ tempo, beats[] }`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BeatsData {
    pub tempo: f64,
    pub beats: Vec<f64>,
}

// ── Project ───────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id:                Uuid,
    pub name:              String,
    /// Cached max `timeline_end` across all clips; `timeline::Editor`
    /// refreshes it after every mutation.
    pub duration:          f64,
    pub aspect_ratio:      AspectRatio,
    pub output_resolution: Resolution,
    pub tracks:            Vec<Track>,
    #[serde(default)]
    pub lyrics:            Option<LyricsData>,
    #[serde(default)]
    pub work_area:         Option<WorkArea>,
    pub created_at:        DateTime<Utc>,
    pub updated_at:        DateTime<Utc>,
}

impl Project {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id:                Uuid::new_v4(),
            name:              name.into(),
            duration:          0.0,
            aspect_ratio:      AspectRatio::NineSixteen,
            output_resolution: Resolution::default(),
            tracks:            Vec::new(),
            lyrics:            None,
            work_area:         None,
            created_at:        now,
            updated_at:        now,
        }
    }

    pub fn track(&self, id: Uuid) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id == id)
    }

    pub fn track_mut(&mut self, id: Uuid) -> Option<&mut Track> {
        self.tracks.iter_mut().find(|t| t.id == id)
    }

    /// Locate a clip as (track index, clip index).
    pub fn locate_clip(&self, id: Uuid) -> Option<(usize, usize)> {
        self.tracks.iter().enumerate().find_map(|(ti, t)| {
            t.clips
                .iter()
                .position(|c| c.id == id)
                .map(|ci| (ti, ci))
        })
    }

    pub fn clip(&self, id: Uuid) -> Option<(&Track, &Clip)> {
        let (ti, ci) = self.locate_clip(id)?;
        Some((&self.tracks[ti], &self.tracks[ti].clips[ci]))
    }

    /// Max `timeline_end` across all clips (0.0 for an empty project).
    pub fn computed_duration(&self) -> f64 {
        self.tracks
            .iter()
            .flat_map(|t| t.clips.iter())
            .map(|c| c.timeline_end)
            .fold(0.0_f64, f64::max)
    }

    /// The single master audio track, if one exists.
    pub fn master_audio_track(&self) -> Option<&Track> {
        self.tracks
            .iter()
            .find(|t| t.kind == TrackKind::Audio && t.is_master)
    }

    /// The clip on the master audio track (first by timeline order).
    pub fn master_audio_clip(&self) -> Option<&Clip> {
        self.master_audio_track()?.clips.first()
    }

    /// Find the enabled effect config of `kind` applying to `video_track_id`
    /// over any part of `[start, end)`. First match in track order wins.
    pub fn active_effect_config(
        &self,
        video_track_id: Uuid,
        kind: EffectKind,
        start: f64,
        end: f64,
    ) -> Option<&EffectConfig> {
        self.tracks
            .iter()
            .filter(|t| {
                t.kind == TrackKind::Effect
                    && !t.muted
                    && t.parent_track_id == Some(video_track_id)
                    && t.effect_kind == Some(kind)
            })
            .flat_map(|t| t.clips.iter())
            .filter(|c| c.overlaps(start, end))
            .find_map(|c| match &c.body {
                ClipBody::Effect { config } if config.enabled() && config.kind() == kind => {
                    Some(config)
                }
                _ => None,
            })
    }

    /// Export span: the manual work area if set, else `[0, duration)`.
    pub fn export_span(&self) -> (f64, f64) {
        match self.work_area {
            Some(wa) if wa.is_manual => (wa.start, wa.end),
            _ => (0.0, self.duration),
        }
    }
}
