// crates/beatcut-core/src/preview/lyrics.rs
//
// Shared karaoke drawing helper.
//
// Used twice: by the project-level lyrics overlay at the end of every
// rendered frame, and by the clip-level lyrics element. Word grouping
// comes from `export::ass::chunk_words` so the preview shows exactly the
// chunks the exported ASS file will carry.

use crate::export::ass::chunk_words;
use crate::preview::renderer::TextPainter;
use crate::preview::surface::Surface;
use crate::state::{LyricWord, LyricsPosition, LyricsStyle};

/// Draw the chunk active at `time` onto `surface`. Words currently being
/// sung render in the highlight color; `time` outside every word's range
/// but inside the chunk span keeps the chunk visible unhighlighted.
pub fn draw_lyrics(
    surface: &mut Surface,
    words: &[LyricWord],
    style: &LyricsStyle,
    time: f64,
    painter: &dyn TextPainter,
) {
    let Some(chunk) = chunk_words(words)
        .into_iter()
        .find(|c| chunk_visible(c, time))
    else {
        return;
    };

    let canvas_h = surface.height() as f32;
    // Style sizes are relative to the 1920-high reference canvas.
    let font_size = style.font_size * canvas_h / 1920.0;

    let line: Vec<(&str, bool)> = chunk
        .iter()
        .map(|w| (w.word.as_str(), time >= w.start && time < w.end))
        .collect();

    let space = painter.measure(" ", font_size).0;
    let total_w: f32 = line
        .iter()
        .map(|(w, _)| painter.measure(w, font_size).0)
        .sum::<f32>()
        + space * (line.len().saturating_sub(1)) as f32;

    let canvas_w = surface.width() as f32;
    let y = match style.position {
        LyricsPosition::Top    => canvas_h * 0.08,
        LyricsPosition::Center => (canvas_h - font_size) * 0.5,
        LyricsPosition::Bottom => canvas_h * 0.88 - font_size,
    };

    let mut x = (canvas_w - total_w) * 0.5;
    for (word, highlighted) in line {
        let color = if highlighted { style.highlight_color } else { style.color };
        painter.draw(surface, word, x, y, font_size, color, 1.0);
        x += painter.measure(word, font_size).0 + space;
    }
}

fn chunk_visible(chunk: &[LyricWord], time: f64) -> bool {
    match (chunk.first(), chunk.last()) {
        (Some(first), Some(last)) => time >= first.start && time < last.end,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preview::renderer::test_support::BlockPainter;
    use crate::state::LyricsStyle;

    fn words() -> Vec<LyricWord> {
        vec![
            LyricWord { word: "Hello".into(), start: 0.0, end: 0.5 },
            LyricWord { word: "World".into(), start: 0.5, end: 1.0 },
        ]
    }

    #[test]
    fn draws_nothing_outside_chunk_span() {
        let mut s = Surface::new(64, 64);
        draw_lyrics(&mut s, &words(), &LyricsStyle::default(), 5.0, &BlockPainter);
        assert!(s.data().iter().all(|&b| b == 0));
    }

    #[test]
    fn draws_blocks_during_chunk() {
        let mut s = Surface::new(64, 64);
        draw_lyrics(&mut s, &words(), &LyricsStyle::default(), 0.25, &BlockPainter);
        assert!(s.data().iter().any(|&b| b != 0));
    }

    #[test]
    fn empty_words_draw_nothing() {
        let mut s = Surface::new(8, 8);
        draw_lyrics(&mut s, &[], &LyricsStyle::default(), 0.0, &BlockPainter);
        assert!(s.data().iter().all(|&b| b == 0));
    }
}
