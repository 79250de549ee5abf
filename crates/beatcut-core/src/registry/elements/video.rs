// crates/beatcut-core/src/registry/elements/video.rs
//
// Video element.
//
// Export builds the clip's base chain on its input stream —
//
//   [N:v] trim → setpts(rebase to export-local time) → <base modifiers>
//        → scale(cover × transform.scale) → crop(canvas) → format=yuv420p
//
// — then threads the pad through every active chain-stage effect in
// registry order, and finally overlays onto the accumulator gated by the
// clip's enable window. Base modifiers are collected from phase-A effects
// (beat-zoom) and inlined before `scale`: their per-frame `t` expressions
// must see unscaled input and FFmpeg's overlay+enable is unreliable for
// per-frame time, hence inline rather than chained.
//
// Preview mirrors the same split: phase-1 effects mutate the transform
// before bounds are computed, phase-2 effects process the sampled frame,
// and the result is blitted at the effective bounds.
//
// Transform opacity/rotation of video clips apply in preview only — the
// export base chain is yuv (no alpha), so they are documented cosmetic
// divergences rather than graph nodes.

use crate::error::ExportError;
use crate::export::context::ExportContext;
use crate::export::graph::FilterGraph;
use crate::helpers::fmt::{even_px, ts};
use crate::preview::renderer::RenderCtx;
use crate::preview::surface::{Bounds, Surface};
use crate::registry::{
    effect_registry, ClipElement, ElementKind, ElementOutput, ExportStage, PreviewPhase,
};
use crate::state::{Clip, ClipBody, Track, TrackKind, Transform};

pub struct VideoElement;

/// Cover-fit bounds of a `fw × fh` frame on the canvas under `transform`.
fn cover_bounds(fw: u32, fh: u32, transform: &Transform, canvas_w: u32, canvas_h: u32) -> Bounds {
    let cw = canvas_w as f32;
    let ch = canvas_h as f32;
    let cover = (cw / fw.max(1) as f32).max(ch / fh.max(1) as f32) * transform.scale;
    let w = fw as f32 * cover;
    let h = fh as f32 * cover;
    Bounds {
        x: cw * 0.5 + transform.x - w * 0.5,
        y: ch * 0.5 + transform.y - h * 0.5,
        w,
        h,
    }
}

/// Scaled/cropped output dimensions for the export chain.
pub(crate) fn export_dims(transform: &Transform, canvas_w: u32, canvas_h: u32) -> (u32, u32, u32, u32) {
    let sw = even_px(canvas_w as f64 * transform.scale as f64);
    let sh = even_px(canvas_h as f64 * transform.scale as f64);
    (sw, sh, sw.min(canvas_w), sh.min(canvas_h))
}

impl ClipElement for VideoElement {
    fn kind(&self) -> ElementKind {
        ElementKind::Video
    }

    fn can_handle(&self, clip: &Clip, track: &Track) -> bool {
        track.kind == TrackKind::Video && matches!(clip.body, ClipBody::Video { .. })
    }

    fn preview_render(
        &self,
        surface: &mut Surface,
        clip: &Clip,
        track: &Track,
        transform: &Transform,
        ctx: &mut RenderCtx,
    ) {
        let Some(asset_id) = clip.asset_id else {
            return;
        };

        let registry = effect_registry();

        // Phase 1: transform modifiers run before bounds are computed.
        let mut effective = *transform;
        for effect in &registry {
            if let PreviewPhase::Transform(modifier) = effect.preview_phase() {
                if let Some(cfg) = effect.active_config_preview(clip, track, ctx) {
                    modifier.modify_transform(&mut effective, cfg, clip, ctx);
                }
            }
        }

        let src_time = clip.source_time_at(ctx.time);
        let Some(frame) = ctx.frames.video_frame(asset_id, src_time) else {
            return; // frame not decoded yet — contribute nothing this frame
        };
        let bounds = cover_bounds(
            frame.width(),
            frame.height(),
            &effective,
            ctx.resolution.width,
            ctx.resolution.height,
        );

        // Phase 2: pixel processors may substitute the source surface.
        let mut source = frame;
        for effect in &registry {
            if let PreviewPhase::Pixel(processor) = effect.preview_phase() {
                if let Some(cfg) = effect.active_config_preview(clip, track, ctx) {
                    if let Some(processed) = processor.apply_render(&source, bounds, cfg, clip, ctx)
                    {
                        source = processed;
                    }
                }
            }
        }

        surface.blit_scaled(&source, bounds, effective.opacity);
    }

    fn preview_bounds(
        &self,
        clip: &Clip,
        transform: &Transform,
        ctx: &RenderCtx,
    ) -> Option<Bounds> {
        // Without a decoded frame, assume the asset fills the canvas.
        let _ = clip;
        Some(cover_bounds(
            ctx.resolution.width,
            ctx.resolution.height,
            transform,
            ctx.resolution.width,
            ctx.resolution.height,
        ))
    }

    fn export_build(
        &self,
        graph: &mut FilterGraph,
        prev_pad: &str,
        clip: &Clip,
        track: &Track,
        idx: usize,
        ctx: &ExportContext,
    ) -> Result<Option<ElementOutput>, ExportError> {
        let ClipBody::Video { transform, .. } = &clip.body else {
            return Ok(None);
        };
        let Some(asset_id) = clip.asset_id else {
            return Ok(None);
        };
        let Some(&input_idx) = ctx.asset_input_idx.get(&asset_id) else {
            log::debug!("video clip {} has no registered input, skipped", clip.id);
            return Ok(None);
        };
        let Some((t0, t1, s0, s1)) = ctx.visible_window(clip) else {
            return Ok(None);
        };

        let registry = effect_registry();

        // Base modifiers, registry order, inlined before scale.
        let mut base_mods = Vec::new();
        for effect in &registry {
            if let ExportStage::Base(builder) = effect.export_stage() {
                if let Some(cfg) = effect.active_config_export(clip, track, ctx) {
                    if let Some(fragment) = builder.build_base_modifier(cfg, clip, ctx) {
                        base_mods.push(fragment);
                    }
                }
            }
        }

        let (sw, sh, cw, ch) = export_dims(
            transform,
            ctx.resolution.width,
            ctx.resolution.height,
        );
        let mut body = format!(
            "trim={}:{},setpts=PTS-STARTPTS+{}/TB",
            ts(s0),
            ts(s1),
            ts(t0),
        );
        for fragment in &base_mods {
            body.push(',');
            body.push_str(fragment);
        }
        body.push_str(&format!(
            ",scale={sw}:{sh}:force_original_aspect_ratio=increase,crop={cw}:{ch},format=yuv420p",
        ));

        let clip_pad = format!("clip{idx}");
        graph.push(
            &[&format!("{input_idx}:v")],
            body,
            &[&clip_pad],
            &format!("video clip {}", clip.id),
        )?;

        // Chain-stage effects, registry order.
        let mut pad = clip_pad;
        for effect in &registry {
            if let ExportStage::Chain(builder) = effect.export_stage() {
                if let Some(cfg) = effect.active_config_export(clip, track, ctx) {
                    if let Some(next) = builder.build_filter(graph, &pad, cfg, clip, idx, ctx)? {
                        pad = next;
                    }
                }
            }
        }

        let ox = ((ctx.resolution.width - cw) / 2) as i64 + transform.x.round() as i64;
        let oy = ((ctx.resolution.height - ch) / 2) as i64 + transform.y.round() as i64;
        let ov = format!("ov{idx}");
        graph.push(
            &[prev_pad, pad.as_str()],
            format!(
                "overlay={ox}:{oy}:enable='between(t,{},{})'",
                ts(t0),
                ts(t1),
            ),
            &[&ov],
            &format!("video clip {}", clip.id),
        )?;

        Ok(Some(ElementOutput { output_pad: ov, next_filter_idx: idx + 1 }))
    }
}
