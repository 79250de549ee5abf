// crates/beatcut-core/src/registry/effects/color_grade.rs
//
// Color grading: contrast/brightness/saturation, hue rotation, and a
// shadows/highlights lift matching the preview's per-pixel curve.
//
// Export emits up to three chained filters, labels cg<node>_<idx> in
// emission order:
//
//   eq=contrast:brightness:saturation     (when any of the three differ)
//   hue=h=<degrees>                       (when hue ≠ 0)
//   format=rgb24,geq=…,format=yuv420p     (when shadows/highlights ≠ 0)
//
// The geq expression is exactly the preview formula per channel:
// clamp(v + shadows·(1−v)² + highlights·v², 0, 1). When every parameter
// is neutral the builder emits nothing and echoes the input pad through —
// an active-but-identity grade must not cost a filter node.

use rayon::prelude::*;

use crate::error::ExportError;
use crate::export::context::ExportContext;
use crate::export::graph::FilterGraph;
use crate::helpers::fmt::param;
use crate::preview::renderer::RenderCtx;
use crate::preview::surface::{Bounds, Surface};
use crate::registry::{ExportStage, FilterChainBuilder, PixelProcessor, PreviewPhase, VideoEffect};
use crate::state::{Clip, EffectConfig, EffectKind};

pub struct ColorGrade;

struct Params {
    contrast:   f32,
    brightness: f32,
    saturation: f32,
    hue:        f32,
    shadows:    f32,
    highlights: f32,
}

impl Params {
    fn from_cfg(cfg: &EffectConfig) -> Option<Self> {
        let EffectConfig::ColorGrade {
            contrast, brightness, saturation, hue, shadows, highlights, ..
        } = *cfg
        else {
            return None;
        };
        Some(Self { contrast, brightness, saturation, hue, shadows, highlights })
    }

    fn eq_active(&self) -> bool {
        self.contrast != 1.0 || self.brightness != 0.0 || self.saturation != 1.0
    }

    fn curve_active(&self) -> bool {
        self.shadows != 0.0 || self.highlights != 0.0
    }

    fn neutral(&self) -> bool {
        !self.eq_active() && self.hue == 0.0 && !self.curve_active()
    }
}

/// One geq channel expression for the shadows/highlights curve.
fn geq_channel(c: char, shadows: f32, highlights: f32) -> String {
    let v = format!("{c}(X,Y)/255");
    format!(
        "{c}='clip({v}+{sh}*(1-{v})*(1-{v})+{hi}*{v}*{v},0,1)*255'",
        sh = param(shadows as f64),
        hi = param(highlights as f64),
    )
}

impl VideoEffect for ColorGrade {
    fn kind(&self) -> EffectKind {
        EffectKind::ColorGrade
    }

    fn preview_phase(&self) -> PreviewPhase<'_> {
        PreviewPhase::Pixel(self)
    }

    fn export_stage(&self) -> ExportStage<'_> {
        ExportStage::Chain(self)
    }
}

impl FilterChainBuilder for ColorGrade {
    fn build_filter(
        &self,
        graph: &mut FilterGraph,
        input_pad: &str,
        cfg: &EffectConfig,
        clip: &Clip,
        idx: usize,
        _ctx: &ExportContext,
    ) -> Result<Option<String>, ExportError> {
        let Some(p) = Params::from_cfg(cfg) else {
            return Ok(None);
        };
        if p.neutral() {
            // Passthrough: no filters, input pad echoed.
            return Ok(Some(input_pad.to_string()));
        }
        let who = format!("color-grade on clip {}", clip.id);

        let mut pad = input_pad.to_string();
        let mut node = 0usize;
        let mut emit = |graph: &mut FilterGraph, body: String| -> Result<String, ExportError> {
            let out = format!("cg{node}_{idx}");
            graph.push(&[pad.as_str()], body, &[&out], &who)?;
            node += 1;
            pad = out.clone();
            Ok(out)
        };

        if p.eq_active() {
            emit(
                graph,
                format!(
                    "eq=contrast={}:brightness={}:saturation={}",
                    param(p.contrast as f64),
                    param(p.brightness as f64),
                    param(p.saturation as f64),
                ),
            )?;
        }
        if p.hue != 0.0 {
            emit(graph, format!("hue=h={}", param(p.hue as f64)))?;
        }
        if p.curve_active() {
            emit(
                graph,
                format!(
                    "format=rgb24,geq={}:{}:{},format=yuv420p",
                    geq_channel('r', p.shadows, p.highlights),
                    geq_channel('g', p.shadows, p.highlights),
                    geq_channel('b', p.shadows, p.highlights),
                ),
            )?;
        }
        Ok(Some(pad))
    }
}

/// Rotate hue by `deg` degrees with the standard RGB rotation matrix.
#[inline]
fn hue_rotate(r: f32, g: f32, b: f32, deg: f32) -> (f32, f32, f32) {
    let a = deg.to_radians();
    let (s, c) = a.sin_cos();
    let m = [
        [0.213 + c * 0.787 - s * 0.213, 0.715 - c * 0.715 - s * 0.715, 0.072 - c * 0.072 + s * 0.928],
        [0.213 - c * 0.213 + s * 0.143, 0.715 + c * 0.285 + s * 0.140, 0.072 - c * 0.072 - s * 0.283],
        [0.213 - c * 0.213 - s * 0.787, 0.715 - c * 0.715 + s * 0.715, 0.072 + c * 0.928 + s * 0.072],
    ];
    (
        m[0][0] * r + m[0][1] * g + m[0][2] * b,
        m[1][0] * r + m[1][1] * g + m[1][2] * b,
        m[2][0] * r + m[2][1] * g + m[2][2] * b,
    )
}

impl PixelProcessor for ColorGrade {
    fn apply_render(
        &self,
        source: &Surface,
        _bounds: Bounds,
        cfg: &EffectConfig,
        _clip: &Clip,
        _ctx: &mut RenderCtx,
    ) -> Option<Surface> {
        let p = Params::from_cfg(cfg)?;
        if p.neutral() {
            return None; // identity — reuse the source surface
        }

        let mut out = source.clone();
        out.data_mut().par_chunks_mut(4).for_each(|px| {
            let mut r = px[0] as f32 / 255.0;
            let mut g = px[1] as f32 / 255.0;
            let mut b = px[2] as f32 / 255.0;

            if p.eq_active() {
                let eq = |v: f32| (v - 0.5) * p.contrast + 0.5 + p.brightness;
                r = eq(r);
                g = eq(g);
                b = eq(b);
                let gray = 0.299 * r + 0.587 * g + 0.114 * b;
                r = gray + (r - gray) * p.saturation;
                g = gray + (g - gray) * p.saturation;
                b = gray + (b - gray) * p.saturation;
            }
            if p.hue != 0.0 {
                (r, g, b) = hue_rotate(r, g, b, p.hue);
            }
            if p.curve_active() {
                let curve =
                    |v: f32| v + p.shadows * (1.0 - v) * (1.0 - v) + p.highlights * v * v;
                r = curve(r);
                g = curve(g);
                b = curve(b);
            }

            px[0] = (r.clamp(0.0, 1.0) * 255.0).round() as u8;
            px[1] = (g.clamp(0.0, 1.0) * 255.0).round() as u8;
            px[2] = (b.clamp(0.0, 1.0) * 255.0).round() as u8;
        });
        Some(out)
    }
}
