// crates/beatcut-core/src/registry/effects/beat_zoom.rs
//
// Beat-zoom: a short punch-in on every beat of the master track.
//
// The only phase-1 / base-modifier effect. Export inlines a per-frame
// `crop` into the clip's base chain whose width/height switch between
// `iw/ZF` and `iw` on a sum of `between(t, beat, beat+pulse)` windows;
// `ZF = 1 + intensity`. The fragment sits before `scale`, where `t` is
// already rebased to export-local time by the preceding `setpts`.
//
// Clips spanning a long song can cover thousands of beats; the expression
// is capped at MAX_BEAT_TERMS windows and the overflow is dropped with a
// warning naming the clip.

use crate::export::context::ExportContext;
use crate::helpers::fmt::{param, ts};
use crate::preview::renderer::RenderCtx;
use crate::registry::{BaseModifierBuilder, ExportStage, PreviewPhase, TransformModifier, VideoEffect};
use crate::state::{Clip, EffectConfig, EffectKind, Transform};

/// Upper bound on `between()` terms in one crop expression (~16 KB of
/// filter text, far under ffmpeg's argument limits).
pub const MAX_BEAT_TERMS: usize = 256;

pub struct BeatZoom;

/// Every `division`-th beat (by index in the full list) inside `[start, end)`.
fn pulse_beats(all: &[f64], division: u32, start: f64, end: f64) -> Vec<f64> {
    let div = division.max(1) as usize;
    all.iter()
        .enumerate()
        .filter(|(i, _)| i % div == 0)
        .map(|(_, &b)| b)
        .filter(|&b| b >= start && b < end)
        .collect()
}

impl VideoEffect for BeatZoom {
    fn kind(&self) -> EffectKind {
        EffectKind::BeatZoom
    }

    fn preview_phase(&self) -> PreviewPhase<'_> {
        PreviewPhase::Transform(self)
    }

    fn export_stage(&self) -> ExportStage<'_> {
        ExportStage::Base(self)
    }
}

impl TransformModifier for BeatZoom {
    fn modify_transform(
        &self,
        transform: &mut Transform,
        cfg: &EffectConfig,
        clip: &Clip,
        ctx: &RenderCtx,
    ) {
        let EffectConfig::BeatZoom { intensity, duration_ms, beat_division, .. } = *cfg else {
            return;
        };
        let pulse = duration_ms as f64 / 1000.0;
        let beats = ctx.master_beats();
        let pulsing = pulse_beats(&beats, beat_division, clip.timeline_start, clip.timeline_end)
            .iter()
            .any(|&b| ctx.time >= b && ctx.time < b + pulse);
        if pulsing {
            transform.scale *= 1.0 + intensity;
        }
    }
}

impl BaseModifierBuilder for BeatZoom {
    fn build_base_modifier(
        &self,
        cfg: &EffectConfig,
        clip: &Clip,
        ctx: &ExportContext,
    ) -> Option<String> {
        let EffectConfig::BeatZoom { intensity, duration_ms, beat_division, .. } = *cfg else {
            return None;
        };
        let (local_start, local_end, _, _) = ctx.visible_window(clip)?;
        let pulse = duration_ms as f64 / 1000.0;

        let beats = ctx.master_beats();
        let mut pulsing: Vec<f64> = pulse_beats(&beats, beat_division, clip.timeline_start, clip.timeline_end)
            .iter()
            .map(|&b| ctx.local_time(b))
            .filter(|&b| b + pulse > local_start && b < local_end)
            .collect();
        if pulsing.is_empty() {
            return None; // no beats in range — documented skip
        }
        if pulsing.len() > MAX_BEAT_TERMS {
            log::warn!(
                "beat-zoom on clip {}: {} beats exceed the {} term cap, truncating",
                clip.id,
                pulsing.len(),
                MAX_BEAT_TERMS,
            );
            pulsing.truncate(MAX_BEAT_TERMS);
        }

        let sum = pulsing
            .iter()
            .map(|&b| format!("between(t,{},{})", ts(b), ts(b + pulse)))
            .collect::<Vec<_>>()
            .join("+");
        let zf = param(1.0 + intensity as f64);
        Some(format!(
            "crop=w='if(gt({sum},0),iw/{zf},iw)':h='if(gt({sum},0),ih/{zf},ih)':x=(iw-ow)/2:y=(ih-oh)/2",
        ))
    }
}
