// crates/beatcut-core/src/registry/elements/lyrics.rs
//
// Clip-level lyrics element.
//
// A lyrics clip carries aligned words with times relative to the clip's
// own start. Export writes `lyrics_<idx>.ass` through the injected writer
// and burns it in with a `subtitles=` filter; preview draws the same
// chunks through the shared karaoke helper.

use crate::error::ExportError;
use crate::export::ass::build_ass;
use crate::export::context::ExportContext;
use crate::export::graph::FilterGraph;
use crate::helpers::fmt::escape_filter_path;
use crate::preview::lyrics::draw_lyrics;
use crate::preview::renderer::RenderCtx;
use crate::preview::surface::Surface;
use crate::registry::{ClipElement, ElementKind, ElementOutput};
use crate::state::{Clip, ClipBody, Track, TrackKind, Transform};

pub struct LyricsElement;

impl ClipElement for LyricsElement {
    fn kind(&self) -> ElementKind {
        ElementKind::Lyrics
    }

    fn can_handle(&self, clip: &Clip, track: &Track) -> bool {
        track.kind == TrackKind::Lyrics
            && matches!(&clip.body, ClipBody::Lyrics { words, .. } if !words.is_empty())
    }

    fn preview_render(
        &self,
        surface: &mut Surface,
        clip: &Clip,
        _track: &Track,
        _transform: &Transform,
        ctx: &mut RenderCtx,
    ) {
        let ClipBody::Lyrics { words, style } = &clip.body else {
            return;
        };
        // Word times are clip-relative; the helper works in absolute time.
        let local = ctx.time - clip.timeline_start;
        draw_lyrics(surface, words, style, local, ctx.text);
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
        let ClipBody::Lyrics { words, style } = &clip.body else {
            return Ok(None);
        };
        if words.is_empty() {
            return Ok(None);
        }
        let Some(_) = ctx.visible_window(clip) else {
            return Ok(None);
        };

        // Shift clip-relative word times onto the export-local timeline.
        let offset = ctx.local_time(clip.timeline_start);
        let content = build_ass(words, style, offset);
        let path = ctx.write_side_file(&format!("lyrics_{idx}.ass"), &content)?;

        let out = format!("lyr{idx}");
        graph.push(
            &[prev_pad],
            format!("subtitles='{}'", escape_filter_path(&path.display().to_string())),
            &[&out],
            &format!("lyrics clip {}", clip.id),
        )?;
        Ok(Some(ElementOutput { output_pad: out, next_filter_idx: idx + 1 }))
    }
}
