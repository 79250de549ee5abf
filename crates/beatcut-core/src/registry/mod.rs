// crates/beatcut-core/src/registry/mod.rs
//
// The two dispatch tables at the heart of beatcut.
//
//   clip_registry()   — ordered element definitions. Dispatch is linear
//                       first-match-wins over `can_handle`; order is
//                       semantic (more specific predicates first):
//                       [Rectangle, Text, Lyrics, Video].
//   effect_registry() — ordered video effects. Order is render order:
//                       [BeatZoom, Cutout, Cartoon, ColorGrade] — geometry
//                       first, then masking, then stylisation, then color.
//
// Every element and every effect carries BOTH back-ends: the preview
// rasteriser and the export filter builder. Preview and export dispatch
// through the same tables, which is what keeps the monitor honest about
// what ffmpeg will render.
//
// Effects are two-phase, and the phase split is type-level: an effect
// exposes either a `TransformModifier` (phase 1, runs before bounds are
// computed) or a `PixelProcessor` (phase 2, runs on the sampled surface) —
// never both. The export side mirrors this: either a base-modifier
// fragment inlined into the clip's trim chain, or a chained filter node.
//
// Adding a new element:
//   1. Create `elements/my_element.rs`, impl `ClipElement`.
//   2. Add `mod my_element;` below and one line in `clip_registry()` —
//      position in the vec decides dispatch precedence.
// Adding a new effect: same recipe against `VideoEffect` + one of the four
// stage traits, and one line in `effect_registry()`.

pub mod elements;
pub mod effects;

use crate::error::ExportError;
use crate::export::context::ExportContext;
use crate::export::graph::FilterGraph;
use crate::preview::renderer::RenderCtx;
use crate::preview::surface::{Bounds, Surface};
use crate::state::{Clip, EffectConfig, EffectKind, Track, Transform};

// ── Elements ──────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ElementKind {
    Rectangle,
    Text,
    Lyrics,
    Video,
}

/// Result of an element's export builder: the new accumulator pad and the
/// next free filter index.
#[derive(Clone, Debug, PartialEq)]
pub struct ElementOutput {
    pub output_pad:      String,
    pub next_filter_idx: usize,
}

pub trait ClipElement: Send + Sync {
    fn kind(&self) -> ElementKind;

    /// Pure dispatch predicate. Must not depend on process state.
    fn can_handle(&self, clip: &Clip, track: &Track) -> bool;

    /// Rasterise the clip onto `surface` at the resolved `transform`.
    fn preview_render(
        &self,
        surface: &mut Surface,
        clip: &Clip,
        track: &Track,
        transform: &Transform,
        ctx: &mut RenderCtx,
    );

    /// Hit-test box for selection chrome. Elements without meaningful
    /// bounds (lyrics) return None.
    fn preview_bounds(
        &self,
        _clip: &Clip,
        _transform: &Transform,
        _ctx: &RenderCtx,
    ) -> Option<Bounds> {
        None
    }

    /// Append this clip's filter statements to `graph`, starting from
    /// `prev_pad`. `Ok(None)` is the documented skip (missing input,
    /// missing mask, empty payload) — the compiler continues with
    /// `prev_pad` unchanged.
    fn export_build(
        &self,
        graph: &mut FilterGraph,
        prev_pad: &str,
        clip: &Clip,
        track: &Track,
        idx: usize,
        ctx: &ExportContext,
    ) -> Result<Option<ElementOutput>, ExportError>;
}

/// Linear first-match dispatch over the ordered registry.
pub fn first_matching<'r>(
    registry: &'r [Box<dyn ClipElement>],
    clip: &Clip,
    track: &Track,
) -> Option<&'r dyn ClipElement> {
    registry
        .iter()
        .find(|e| e.can_handle(clip, track))
        .map(|e| e.as_ref())
}

pub fn clip_registry() -> Vec<Box<dyn ClipElement>> {
    vec![
        Box::new(elements::rectangle::RectangleElement),
        Box::new(elements::text::TextElement),
        Box::new(elements::lyrics::LyricsElement),
        Box::new(elements::video::VideoElement),
    ]
}

// ── Effects ───────────────────────────────────────────────────────────────────

/// Phase 1: mutate the clip transform before bounds are computed.
pub trait TransformModifier: Send + Sync {
    fn modify_transform(
        &self,
        transform: &mut Transform,
        cfg: &EffectConfig,
        clip: &Clip,
        ctx: &RenderCtx,
    );
}

/// Phase 2: process the sampled source surface. Returning `None` means
/// "use the input unchanged" (the documented pixel-error fallback).
pub trait PixelProcessor: Send + Sync {
    fn apply_render(
        &self,
        source: &Surface,
        bounds: Bounds,
        cfg: &EffectConfig,
        clip: &Clip,
        ctx: &mut RenderCtx,
    ) -> Option<Surface>;
}

/// Export stage A: a filter fragment inlined into the clip's base trim
/// chain, before `scale`. `None` skips (e.g. no beats in range).
pub trait BaseModifierBuilder: Send + Sync {
    fn build_base_modifier(
        &self,
        cfg: &EffectConfig,
        clip: &Clip,
        ctx: &ExportContext,
    ) -> Option<String>;
}

/// Export stage B: a filter node chained after the clip's base pad.
/// Returns the effect's output pad, or `Ok(None)` to skip (missing mask).
pub trait FilterChainBuilder: Send + Sync {
    fn build_filter(
        &self,
        graph: &mut FilterGraph,
        input_pad: &str,
        cfg: &EffectConfig,
        clip: &Clip,
        idx: usize,
        ctx: &ExportContext,
    ) -> Result<Option<String>, ExportError>;
}

pub enum PreviewPhase<'a> {
    Transform(&'a dyn TransformModifier),
    Pixel(&'a dyn PixelProcessor),
}

pub enum ExportStage<'a> {
    Base(&'a dyn BaseModifierBuilder),
    Chain(&'a dyn FilterChainBuilder),
}

pub trait VideoEffect: Send + Sync {
    fn kind(&self) -> EffectKind;

    /// Exactly one preview phase per effect, enforced by the return type.
    fn preview_phase(&self) -> PreviewPhase<'_>;

    /// Exactly one export stage per effect, enforced by the return type.
    fn export_stage(&self) -> ExportStage<'_>;

    /// The enabled config applying to `clip` over its visible range at
    /// export time, from this effect's kind of effect track.
    fn active_config_export<'p>(
        &self,
        clip: &Clip,
        track: &Track,
        ctx: &ExportContext<'p>,
    ) -> Option<&'p EffectConfig> {
        ctx.project.active_effect_config(
            track.id,
            self.kind(),
            clip.timeline_start,
            clip.timeline_end,
        )
    }

    /// The enabled config applying at the preview's current instant.
    fn active_config_preview<'p>(
        &self,
        _clip: &Clip,
        track: &Track,
        ctx: &RenderCtx<'p, '_>,
    ) -> Option<&'p EffectConfig> {
        ctx.project
            .active_effect_config(track.id, self.kind(), ctx.time, ctx.time + 1e-6)
    }
}

pub fn effect_registry() -> Vec<Box<dyn VideoEffect>> {
    vec![
        Box::new(effects::beat_zoom::BeatZoom),
        Box::new(effects::cutout::Cutout),
        Box::new(effects::cartoon::Cartoon),
        Box::new(effects::color_grade::ColorGrade),
    ]
}
