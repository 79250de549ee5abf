// crates/beatcut-core/src/registry/effects/cutout.rs
//
// Cutout: person/background separation driven by an external grayscale
// mask video (yuv420p, white = person).
//
// Export is a chain-stage effect in pure yuv math — no alpha channel, so
// the output composes cleanly with cartoon/color-grade downstream:
//
//   mask input → trim/scale to the clip chain's geometry  [cut_maskt_N]
//   split into two copies                                 [cut_maska_N][cut_maskb_N]
//   negate one copy                                       [cut_minv_N]
//   solid background fill                                 [cut_bg_N]
//   subject  = clip  × mask-copy (multiply blend)         [cut_subj_N]
//   backdrop = fill  × other-copy (multiply blend)        [cut_bgm_N]
//   subject + backdrop (addition blend)                   [cut_out_N]
//
// `removeBg` keeps the person (direct mask on the subject); `removePerson`
// swaps which mask copy multiplies which side. A missing mask input is a
// documented skip, not an error.

use crate::error::ExportError;
use crate::export::context::ExportContext;
use crate::export::graph::FilterGraph;
use crate::helpers::fmt::ts;
use crate::preview::renderer::RenderCtx;
use crate::preview::surface::{Bounds, Surface};
use crate::registry::elements::video::export_dims;
use crate::registry::{ExportStage, FilterChainBuilder, PixelProcessor, PreviewPhase, VideoEffect};
use crate::state::{Clip, ClipBody, CutoutMode, EffectConfig, EffectKind};

pub struct Cutout;

impl VideoEffect for Cutout {
    fn kind(&self) -> EffectKind {
        EffectKind::Cutout
    }

    fn preview_phase(&self) -> PreviewPhase<'_> {
        PreviewPhase::Pixel(self)
    }

    fn export_stage(&self) -> ExportStage<'_> {
        ExportStage::Chain(self)
    }
}

impl FilterChainBuilder for Cutout {
    fn build_filter(
        &self,
        graph: &mut FilterGraph,
        input_pad: &str,
        cfg: &EffectConfig,
        clip: &Clip,
        idx: usize,
        ctx: &ExportContext,
    ) -> Result<Option<String>, ExportError> {
        let EffectConfig::Cutout { mode, background, .. } = cfg else {
            return Ok(None);
        };
        let Some(asset_id) = clip.asset_id else {
            return Ok(None);
        };
        let Some(&mask_idx) = ctx.mask_input_idx.get(&asset_id) else {
            log::debug!("cutout on clip {}: no mask input, skipped", clip.id);
            return Ok(None);
        };
        let Some((t0, t1, s0, s1)) = ctx.visible_window(clip) else {
            return Ok(None);
        };
        let ClipBody::Video { transform, .. } = &clip.body else {
            return Ok(None);
        };

        let who = format!("cutout on clip {}", clip.id);
        let (sw, sh, cw, ch) = export_dims(transform, ctx.resolution.width, ctx.resolution.height);

        let maskt = format!("cut_maskt_{idx}");
        let maska = format!("cut_maska_{idx}");
        let maskb = format!("cut_maskb_{idx}");
        let minv = format!("cut_minv_{idx}");
        let bg = format!("cut_bg_{idx}");
        let subj = format!("cut_subj_{idx}");
        let bgm = format!("cut_bgm_{idx}");
        let out = format!("cut_out_{idx}");

        // Mask follows the clip's exact trim + geometry so blend frames line up.
        graph.push(
            &[&format!("{mask_idx}:v")],
            format!(
                "trim={}:{},setpts=PTS-STARTPTS+{}/TB,\
                 scale={sw}:{sh}:force_original_aspect_ratio=increase,crop={cw}:{ch},format=yuv420p",
                ts(s0),
                ts(s1),
                ts(t0),
            ),
            &[&maskt],
            &who,
        )?;
        graph.push(&[&maskt], "split", &[&maska, &maskb], &who)?;
        graph.push(&[&maska], "negate", &[&minv], &who)?;
        graph.push_source(
            format!(
                "color=c={}:s={cw}x{ch}:d={}",
                background.to_ffmpeg(),
                ts(t1),
            ),
            &[&bg],
            &who,
        )?;

        // removeBg: person survives the direct mask; removePerson flips it.
        let (subject_mask, backdrop_mask) = match mode {
            CutoutMode::RemoveBg => (&maskb, &minv),
            CutoutMode::RemovePerson => (&minv, &maskb),
        };
        graph.push(
            &[input_pad, subject_mask.as_str()],
            "blend=all_mode=multiply",
            &[&subj],
            &who,
        )?;
        graph.push(
            &[bg.as_str(), backdrop_mask.as_str()],
            "blend=all_mode=multiply",
            &[&bgm],
            &who,
        )?;
        graph.push(&[&subj, &bgm], "blend=all_mode=addition", &[&out], &who)?;

        Ok(Some(out))
    }
}

impl PixelProcessor for Cutout {
    fn apply_render(
        &self,
        source: &Surface,
        _bounds: Bounds,
        cfg: &EffectConfig,
        clip: &Clip,
        ctx: &mut RenderCtx,
    ) -> Option<Surface> {
        let EffectConfig::Cutout { mode, background, .. } = cfg else {
            return None;
        };
        let asset_id = clip.asset_id?;
        let src_time = clip.source_time_at(ctx.time);
        // Missing mask frame → documented fallback to the raw source.
        let mask = ctx.frames.mask_frame(asset_id, src_time)?;

        let (w, h) = (source.width(), source.height());
        let mut out = Surface::new(w, h);
        let mx = mask.width() as f32 / w as f32;
        let my = mask.height() as f32 / h as f32;

        for y in 0..h {
            for x in 0..w {
                let [r, g, b, a] = source.pixel(x, y);
                let m = mask.sample_bilinear(x as f32 * mx, y as f32 * my)[0] as f32 / 255.0;
                let keep = match mode {
                    CutoutMode::RemoveBg => m,
                    CutoutMode::RemovePerson => 1.0 - m,
                };
                let px = |src: u8, fill: u8| -> u8 {
                    (src as f32 * keep + fill as f32 * (1.0 - keep)).round() as u8
                };
                let i = ((y * w + x) * 4) as usize;
                out.data_mut()[i] = px(r, background.r);
                out.data_mut()[i + 1] = px(g, background.g);
                out.data_mut()[i + 2] = px(b, background.b);
                out.data_mut()[i + 3] = a;
            }
        }
        Some(out)
    }
}
