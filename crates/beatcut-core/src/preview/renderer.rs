// crates/beatcut-core/src/preview/renderer.rs
//
// The per-frame CPU compositor.
//
// One call to `render_frame` produces one finished RGBA frame for the
// monitor. Tracks are walked in *reverse* project order (project order is
// top-to-bottom, so the top timeline track is drawn last and lands on top),
// each clip overlapping the current time is dispatched through the clip
// registry, and video clips run the two-phase effect pipeline inside
// `VideoElement::preview_render`.
//
// The renderer is headless. Decoding and font rasterisation stay on the
// host side behind two injected traits:
//
//   FrameSource — decoded RGBA frames for video and mask assets. The host
//                 returns its freshest decoded frame; if the exact frame
//                 isn't ready it hands back the previous one and the
//                 drift policy in `sync.rs` decides when to reseek.
//   TextPainter — glyph rasterisation for text/lyrics clips. The elements
//                 compute layout, size and karaoke colors; the painter
//                 only fills pixels.
//
// The renderer itself never blocks and never errors: a clip whose frame or
// painter is unavailable simply contributes nothing this frame.

use std::collections::HashMap;

use uuid::Uuid;

use crate::helpers::color::{self, Color};
use crate::preview::surface::Surface;
use crate::registry::{clip_registry, first_matching};
use crate::state::{BeatsData, Clip, Project, Resolution, TrackKind, Transform};

use super::lyrics::draw_lyrics;

/// Decoded-frame supplier, owned by the host.
pub trait FrameSource {
    /// RGBA frame of `asset` at `source_time` seconds, native resolution.
    fn video_frame(&mut self, asset: Uuid, source_time: f64) -> Option<Surface>;

    /// Frame of the asset's grayscale cutout mask, kept in lockstep with
    /// the parent video by the host.
    fn mask_frame(&mut self, asset: Uuid, source_time: f64) -> Option<Surface>;
}

/// Glyph rasteriser, owned by the host.
pub trait TextPainter {
    /// Pixel extents of `text` at `font_size`.
    fn measure(&self, text: &str, font_size: f32) -> (f32, f32);

    /// Draw `text` with its top-left corner at (`x`, `y`).
    fn draw(
        &self,
        surface: &mut Surface,
        text: &str,
        x: f32,
        y: f32,
        font_size: f32,
        color: Color,
        opacity: f32,
    );
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PreviewQuality {
    /// Effect parameters match export.
    Full,
    /// Cheap variants for smooth scrubbing (cartoon edges at half res).
    Draft,
}

/// In-progress drag: substitute this transform for the clip being dragged.
#[derive(Clone, Copy, Debug)]
pub struct DragOverride {
    pub clip_id:   Uuid,
    pub transform: Transform,
}

/// Everything one frame render needs. `'p` borrows the project snapshot,
/// `'h` the host collaborators.
pub struct RenderCtx<'p, 'h> {
    pub project:    &'p Project,
    pub time:       f64,
    pub resolution: Resolution,
    pub quality:    PreviewQuality,
    pub beats:      &'p HashMap<Uuid, BeatsData>,
    pub frames:     &'h mut dyn FrameSource,
    pub text:       &'h dyn TextPainter,
    pub drag:       Option<DragOverride>,
}

impl<'p, 'h> RenderCtx<'p, 'h> {
    /// Master-clip beats in project-timeline seconds (see export context).
    pub fn master_beats(&self) -> Vec<f64> {
        crate::export::context::master_beats(self.project, self.beats)
    }

    /// The transform to draw `clip` with: the drag override when this clip
    /// is being dragged, else its stored transform.
    pub fn resolve_transform(&self, clip: &Clip) -> Transform {
        if let Some(drag) = &self.drag {
            if drag.clip_id == clip.id {
                return drag.transform;
            }
        }
        clip.body.transform().copied().unwrap_or_default()
    }
}

/// Render the project at `ctx.time` into a fresh surface.
pub fn render_frame(ctx: &mut RenderCtx) -> Surface {
    let mut surface = Surface::new(ctx.resolution.width, ctx.resolution.height);
    surface.clear(color::BLACK);

    let registry = clip_registry();
    let project = ctx.project;

    for track in project.tracks.iter().rev() {
        if track.muted || matches!(track.kind, TrackKind::Audio | TrackKind::Effect) {
            continue;
        }
        for clip in &track.clips {
            if !clip.contains_time(ctx.time) {
                continue;
            }
            let Some(element) = first_matching(&registry, clip, track) else {
                log::debug!("no element handles clip {} on {:?} track", clip.id, track.kind);
                continue;
            };
            let transform = ctx.resolve_transform(clip);
            element.preview_render(&mut surface, clip, track, &transform, ctx);
        }
    }

    if let Some(lyrics) = &project.lyrics {
        draw_lyrics(
            &mut surface,
            &lyrics.words,
            &lyrics.style,
            ctx.time,
            ctx.text,
        );
    }

    surface
}
