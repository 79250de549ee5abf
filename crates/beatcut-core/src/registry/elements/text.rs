// crates/beatcut-core/src/registry/elements/text.rs
//
// Text element.
//
// Export: `drawtext` with escaped content, center-based position
// expressions, font size scaled to the output height, and the drawtext
// box for the optional background (the box tracks text extents, which a
// blind drawbox cannot). Rotation ≠ 0 appends a full-frame `rotate` —
// per-layer rotation would need an intermediate transparent overlay, so
// the frame rotates and the preview (which rotates only the text run)
// diverges cosmetically there.

use crate::error::ExportError;
use crate::export::context::ExportContext;
use crate::export::graph::FilterGraph;
use crate::helpers::fmt::{escape_drawtext, param, ts};
use crate::preview::renderer::RenderCtx;
use crate::preview::surface::{Bounds, Surface};
use crate::registry::{ClipElement, ElementKind, ElementOutput};
use crate::state::{Clip, ClipBody, Track, Transform};

/// Reference canvas height the stored font sizes are relative to.
const REF_HEIGHT: f32 = 1920.0;

/// Padding around the text when a background box is drawn, px.
const BOX_PAD: i64 = 12;

pub struct TextElement;

impl TextElement {
    fn font_px(style_size: f32, transform: &Transform, canvas_h: u32) -> f32 {
        style_size * canvas_h as f32 / REF_HEIGHT * transform.scale
    }
}

impl ClipElement for TextElement {
    fn kind(&self) -> ElementKind {
        ElementKind::Text
    }

    fn can_handle(&self, clip: &Clip, _track: &Track) -> bool {
        matches!(clip.body, ClipBody::Text { .. })
    }

    fn preview_render(
        &self,
        surface: &mut Surface,
        clip: &Clip,
        _track: &Track,
        transform: &Transform,
        ctx: &mut RenderCtx,
    ) {
        let ClipBody::Text { content, style, .. } = &clip.body else {
            return;
        };
        if content.is_empty() {
            return;
        }
        let font = Self::font_px(style.font_size, transform, ctx.resolution.height);
        let (tw, th) = ctx.text.measure(content, font);
        let x = ctx.resolution.width as f32 * 0.5 + transform.x - tw * 0.5;
        let y = ctx.resolution.height as f32 * 0.5 + transform.y - th * 0.5;

        if let Some(bg) = style.background {
            let pad = BOX_PAD as f32;
            surface.fill_rect(
                Bounds { x: x - pad, y: y - pad, w: tw + 2.0 * pad, h: th + 2.0 * pad },
                bg,
                transform.opacity,
            );
        }
        ctx.text
            .draw(surface, content, x, y, font, style.color, transform.opacity);
    }

    fn preview_bounds(
        &self,
        clip: &Clip,
        transform: &Transform,
        ctx: &RenderCtx,
    ) -> Option<Bounds> {
        let ClipBody::Text { content, style, .. } = &clip.body else {
            return None;
        };
        let font = Self::font_px(style.font_size, transform, ctx.resolution.height);
        let (tw, th) = ctx.text.measure(content, font);
        Some(Bounds {
            x: ctx.resolution.width as f32 * 0.5 + transform.x - tw * 0.5,
            y: ctx.resolution.height as f32 * 0.5 + transform.y - th * 0.5,
            w: tw,
            h: th,
        })
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
        let ClipBody::Text { content, style, transform } = &clip.body else {
            return Ok(None);
        };
        if content.is_empty() {
            return Ok(None);
        }
        let Some((t0, t1, _, _)) = ctx.visible_window(clip) else {
            return Ok(None);
        };

        let font = Self::font_px(style.font_size, transform, ctx.resolution.height)
            .round()
            .max(1.0) as i64;
        let dx = transform.x.round() as i64;
        let dy = transform.y.round() as i64;
        let enable = format!("enable='between(t,{},{})'", ts(t0), ts(t1));

        let mut body = format!(
            "drawtext=text='{}':fontsize={font}:fontcolor={}@{}:x=(w-text_w)/2+{dx}:y=(h-text_h)/2+{dy}",
            escape_drawtext(content),
            style.color.to_ffmpeg(),
            param(transform.opacity as f64),
        );
        if let Some(bg) = style.background {
            body.push_str(&format!(
                ":box=1:boxcolor={}@{}:boxborderw={BOX_PAD}",
                bg.to_ffmpeg(),
                param(transform.opacity as f64),
            ));
        }
        body.push_str(&format!(":{enable}"));
        if transform.rotation != 0.0 {
            let radians = (transform.rotation as f64).to_radians();
            body.push_str(&format!(",rotate={}:ow=iw:oh=ih:c=black:{enable}", param(radians)));
        }

        let out = format!("txt{idx}");
        graph.push(&[prev_pad], body, &[&out], &format!("text clip {}", clip.id))?;
        Ok(Some(ElementOutput { output_pad: out, next_filter_idx: idx + 1 }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::context::test_support::empty_bundle;
    use crate::helpers::color::Color;
    use crate::state::{Project, TextStyle, TrackKind};
    use uuid::Uuid;

    fn text_clip(track_id: Uuid, content: &str) -> Clip {
        Clip {
            id:             Uuid::new_v4(),
            asset_id:       None,
            track_id,
            timeline_start: 0.0,
            timeline_end:   2.0,
            source_start:   0.0,
            source_end:     2.0,
            body:           ClipBody::Text {
                content:   content.into(),
                style:     TextStyle::default(),
                transform: Transform::default(),
            },
        }
    }

    fn build(clip: &Clip, project: &Project) -> String {
        let bundle = empty_bundle();
        let ctx = ExportContext::build(project, &bundle);
        let mut graph = FilterGraph::new();
        graph
            .push_source("color=c=black:s=1080x1920:d=2.0000", &["bg"], "t")
            .unwrap();
        TextElement
            .export_build(&mut graph, "bg", clip, &project.tracks[0], 1, &ctx)
            .unwrap()
            .unwrap();
        graph.serialize()
    }

    fn project_with_video_track() -> Project {
        let mut p = Project::new("t");
        p.duration = 2.0;
        p.tracks.push(crate::state::Track::new(TrackKind::Video, "V1"));
        p
    }

    #[test]
    fn drawtext_escapes_and_centers() {
        let p = project_with_video_track();
        let clip = text_clip(p.tracks[0].id, "it's 5:00");
        let s = build(&clip, &p);
        assert!(s.contains("drawtext=text='it\\'s 5\\:00'"));
        assert!(s.contains("x=(w-text_w)/2+0:y=(h-text_h)/2+0"));
        // 72 * 1920/1920 * 1.0
        assert!(s.contains("fontsize=72"));
        assert!(s.contains("[txt1]"));
    }

    #[test]
    fn background_uses_drawtext_box() {
        let p = project_with_video_track();
        let mut clip = text_clip(p.tracks[0].id, "hey");
        if let ClipBody::Text { style, .. } = &mut clip.body {
            style.background = Some(Color::rgb(0, 0, 0));
        }
        let s = build(&clip, &p);
        assert!(s.contains(":box=1:boxcolor=0x000000@1.000000:boxborderw=12"));
    }

    #[test]
    fn rotation_appends_full_frame_rotate() {
        let p = project_with_video_track();
        let mut clip = text_clip(p.tracks[0].id, "spin");
        if let ClipBody::Text { transform, .. } = &mut clip.body {
            transform.rotation = 90.0;
        }
        let s = build(&clip, &p);
        assert!(s.contains(",rotate=1.570796:ow=iw:oh=ih:c=black:"));
    }

    #[test]
    fn empty_content_skips() {
        let p = project_with_video_track();
        let clip = text_clip(p.tracks[0].id, "");
        let bundle = empty_bundle();
        let ctx = ExportContext::build(&p, &bundle);
        let mut graph = FilterGraph::new();
        graph
            .push_source("color=c=black:s=1080x1920:d=2.0000", &["bg"], "t")
            .unwrap();
        let out = TextElement
            .export_build(&mut graph, "bg", &clip, &p.tracks[0], 0, &ctx)
            .unwrap();
        assert!(out.is_none());
        assert_eq!(graph.node_count(), 1);
    }
}
