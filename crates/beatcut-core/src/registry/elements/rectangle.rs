// crates/beatcut-core/src/registry/elements/rectangle.rs
//
// Rectangle element: solid fill plus optional border and rotation.
//
// Export emits one chained statement on the accumulator — `drawbox` for
// the fill, a second `drawbox` for the border, and a full-frame `rotate`
// when the transform carries rotation — every part gated by the clip's
// enable window. Rounded corners exist in preview only; export draws
// square boxes.

use crate::error::ExportError;
use crate::export::context::ExportContext;
use crate::export::graph::FilterGraph;
use crate::helpers::fmt::{param, ts};
use crate::preview::renderer::RenderCtx;
use crate::preview::surface::{Bounds, Surface};
use crate::registry::{ClipElement, ElementKind, ElementOutput};
use crate::state::{Clip, ClipBody, RectangleStyle, Track, Transform};

pub struct RectangleElement;

/// Canvas-space box for the rectangle under `transform`.
fn layout(style: &RectangleStyle, transform: &Transform, canvas_w: f32, canvas_h: f32) -> Bounds {
    let w = style.width * transform.scale;
    let h = style.height * transform.scale;
    Bounds {
        x: canvas_w * 0.5 + transform.x - w * 0.5,
        y: canvas_h * 0.5 + transform.y - h * 0.5,
        w,
        h,
    }
}

impl ClipElement for RectangleElement {
    fn kind(&self) -> ElementKind {
        ElementKind::Rectangle
    }

    fn can_handle(&self, clip: &Clip, _track: &Track) -> bool {
        matches!(clip.body, ClipBody::Rectangle { .. })
    }

    fn preview_render(
        &self,
        surface: &mut Surface,
        clip: &Clip,
        _track: &Track,
        transform: &Transform,
        ctx: &mut RenderCtx,
    ) {
        let ClipBody::Rectangle { style, .. } = &clip.body else {
            return;
        };
        let b = layout(
            style,
            transform,
            ctx.resolution.width as f32,
            ctx.resolution.height as f32,
        );
        let radius = style.border_radius.unwrap_or(0.0) * transform.scale;
        surface.fill_round_rect(b, radius, style.color, style.fill_opacity * transform.opacity);
        if let (Some(bc), Some(bw)) = (style.border_color, style.border_width) {
            surface.stroke_rect(b, bw * transform.scale, bc, transform.opacity);
        }
    }

    fn preview_bounds(
        &self,
        clip: &Clip,
        transform: &Transform,
        ctx: &RenderCtx,
    ) -> Option<Bounds> {
        let ClipBody::Rectangle { style, .. } = &clip.body else {
            return None;
        };
        Some(layout(
            style,
            transform,
            ctx.resolution.width as f32,
            ctx.resolution.height as f32,
        ))
    }

    fn export_build(
        &self,
        graph: &mut FilterGraph,
        prev_pad: &str,
        clip: &Clip,
        _track: &Track,
        idx: usize,
        ctx: &ExportContext,
    ) -> Result<Option<ElementOutput>, ExportError> {
        let ClipBody::Rectangle { style, transform } = &clip.body else {
            return Ok(None);
        };
        let Some((t0, t1, _, _)) = ctx.visible_window(clip) else {
            return Ok(None);
        };

        let b = layout(
            style,
            transform,
            ctx.resolution.width as f32,
            ctx.resolution.height as f32,
        );
        let (x, y) = (b.x.round() as i64, b.y.round() as i64);
        let (w, h) = (b.w.round().max(1.0) as i64, b.h.round().max(1.0) as i64);
        let enable = format!("enable='between(t,{},{})'", ts(t0), ts(t1));

        let mut body = format!(
            "drawbox=x={x}:y={y}:w={w}:h={h}:color={}@{}:t=fill:{enable}",
            style.color.to_ffmpeg(),
            param((style.fill_opacity * transform.opacity) as f64),
        );
        if let (Some(bc), Some(bw)) = (style.border_color, style.border_width) {
            let bw = (bw * transform.scale).round().max(1.0) as i64;
            body.push_str(&format!(
                ",drawbox=x={x}:y={y}:w={w}:h={h}:color={}@{}:t={bw}:{enable}",
                bc.to_ffmpeg(),
                param(transform.opacity as f64),
            ));
        }
        if transform.rotation != 0.0 {
            let radians = (transform.rotation as f64).to_radians();
            body.push_str(&format!(
                ",rotate={}:ow=iw:oh=ih:c=black:{enable}",
                param(radians),
            ));
        }

        let out = format!("recto{idx}");
        graph.push(&[prev_pad], body, &[&out], &format!("rectangle clip {}", clip.id))?;
        Ok(Some(ElementOutput { output_pad: out, next_filter_idx: idx + 1 }))
    }
}
