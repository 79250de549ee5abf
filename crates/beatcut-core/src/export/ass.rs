// crates/beatcut-core/src/export/ass.rs
//
// Advanced SubStation Alpha generation for lyrics.
//
// Pure functions — the compiler writes the result through the injected
// `write_file` callback, never here. The play resolution is fixed at
// 1080×1920 regardless of the output resolution; libass scales.
//
// Event model: words are grouped into chunks (line-sized groups), and
// each word gets one `Dialogue:` event spanning that word's time, showing
// the whole chunk with the current word recolored through an inline
// `{\c&H…&}` override. The preview's karaoke helper consumes the same
// `chunk_words` grouping, so monitor and export show identical lines.

use crate::helpers::fmt::ass_time;
use crate::state::{LyricWord, LyricsStyle};

pub const PLAY_RES_X: u32 = 1080;
pub const PLAY_RES_Y: u32 = 1920;

/// Words per chunk before a forced break.
pub const CHUNK_MAX_WORDS: usize = 4;

/// A silence this long (seconds) starts a new chunk.
pub const CHUNK_GAP: f64 = 1.0;

/// Group consecutive words into display chunks.
pub fn chunk_words(words: &[LyricWord]) -> Vec<&[LyricWord]> {
    let mut chunks = Vec::new();
    let mut start = 0;
    for i in 1..words.len() {
        let gap = words[i].start - words[i - 1].end;
        if i - start >= CHUNK_MAX_WORDS || gap > CHUNK_GAP {
            chunks.push(&words[start..i]);
            start = i;
        }
    }
    if start < words.len() {
        chunks.push(&words[start..]);
    }
    chunks
}

/// ASS dialogue text must not carry raw override braces or newlines.
fn sanitize(word: &str) -> String {
    word.replace(['{', '}'], "").replace('\n', "\\N")
}

/// Render the full ASS document. `offset` shifts every word time into the
/// export-local timeline (clip placement for clip-level lyrics, negated
/// work-area start for project-level). Words ending at or before zero
/// after the shift are dropped.
pub fn build_ass(words: &[LyricWord], style: &LyricsStyle, offset: f64) -> String {
    let mut out = String::new();

    out.push_str("[Script Info]\n");
    out.push_str("ScriptType: v4.00+\n");
    out.push_str(&format!("PlayResX: {PLAY_RES_X}\n"));
    out.push_str(&format!("PlayResY: {PLAY_RES_Y}\n"));
    out.push_str("WrapStyle: 0\n\n");

    out.push_str("[V4+ Styles]\n");
    out.push_str(
        "Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, \
         OutlineColour, BackColour, Bold, Italic, Underline, StrikeOut, \
         ScaleX, ScaleY, Spacing, Angle, BorderStyle, Outline, Shadow, \
         Alignment, MarginL, MarginR, MarginV, Encoding\n",
    );
    out.push_str(&format!(
        "Style: Default,Arial,{size},{primary},{secondary},&H00000000,&H80000000,\
         0,0,0,0,100,100,0,0,1,3,0,{align},40,40,120,1\n\n",
        size = style.font_size.round() as i64,
        primary = style.color.to_ass(0),
        secondary = style.highlight_color.to_ass(0),
        align = style.position.ass_alignment(),
    ));

    out.push_str("[Events]\n");
    out.push_str("Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text\n");

    let base = style.color.to_ass_rgb();
    let highlight = style.highlight_color.to_ass_rgb();

    for chunk in chunk_words(words) {
        for (wi, word) in chunk.iter().enumerate() {
            let start = word.start + offset;
            let end = word.end + offset;
            if end <= 0.0 {
                continue;
            }
            let text: String = chunk
                .iter()
                .enumerate()
                .map(|(i, w)| {
                    let w = sanitize(&w.word);
                    if i == wi {
                        format!("{{\\c{highlight}}}{w}{{\\c{base}}}")
                    } else {
                        w
                    }
                })
                .collect::<Vec<_>>()
                .join(" ");
            out.push_str(&format!(
                "Dialogue: 0,{},{},Default,,0,0,0,,{}\n",
                ass_time(start.max(0.0)),
                ass_time(end),
                text,
            ));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{LyricsPosition, LyricsStyle};

    fn two_words() -> Vec<LyricWord> {
        vec![
            LyricWord { word: "Hello".into(), start: 0.0, end: 0.5 },
            LyricWord { word: "World".into(), start: 0.5, end: 1.0 },
        ]
    }

    #[test]
    fn two_word_document_shape() {
        let ass = build_ass(&two_words(), &LyricsStyle::default(), 0.0);
        assert!(ass.contains("[Script Info]"));
        assert!(ass.contains("PlayResX: 1080"));
        assert!(ass.contains("PlayResY: 1920"));
        assert!(ass.contains("[V4+ Styles]"));
        // Bottom position → alignment 2, first style field after Shadow.
        assert!(ass.contains(",1,3,0,2,40,40,120,1"));
        assert_eq!(ass.matches("Dialogue:").count(), 2);
        assert!(ass.contains("Dialogue: 0,0:00:00.00,0:00:00.50,Default"));
        assert!(ass.contains("Dialogue: 0,0:00:00.50,0:00:01.00,Default"));
    }

    #[test]
    fn highlight_override_wraps_current_word() {
        let ass = build_ass(&two_words(), &LyricsStyle::default(), 0.0);
        // First event highlights "Hello", second highlights "World".
        assert!(ass.contains("{\\c&H00D0FF&}Hello{\\c&HFFFFFF&} World"));
        assert!(ass.contains("Hello {\\c&H00D0FF&}World{\\c&HFFFFFF&}"));
    }

    #[test]
    fn alignment_follows_position() {
        for (pos, align) in [
            (LyricsPosition::Top, 8),
            (LyricsPosition::Center, 5),
            (LyricsPosition::Bottom, 2),
        ] {
            let style = LyricsStyle { position: pos, ..LyricsStyle::default() };
            let ass = build_ass(&two_words(), &style, 0.0);
            assert!(ass.contains(&format!(",1,3,0,{align},40,40,120,1")));
        }
    }

    #[test]
    fn chunks_break_on_count_and_gap() {
        let mut words = Vec::new();
        for i in 0..5 {
            words.push(LyricWord {
                word:  format!("w{i}"),
                start: i as f64 * 0.5,
                end:   i as f64 * 0.5 + 0.4,
            });
        }
        // 5 words, max 4 per chunk → [4, 1]
        let chunks = chunk_words(&words);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].len(), 4);

        // A long gap splits even below the count limit.
        let gapped = vec![
            LyricWord { word: "a".into(), start: 0.0, end: 0.4 },
            LyricWord { word: "b".into(), start: 2.0, end: 2.4 },
        ];
        assert_eq!(chunk_words(&gapped).len(), 2);
    }

    #[test]
    fn offset_shifts_and_drops_negative_events() {
        let ass = build_ass(&two_words(), &LyricsStyle::default(), -0.6);
        // "Hello" (0.0–0.5) ends before zero after the shift; only "World".
        assert_eq!(ass.matches("Dialogue:").count(), 1);
        assert!(ass.contains("0:00:00.40"));
    }

    #[test]
    fn braces_are_stripped_from_words() {
        let words = vec![LyricWord { word: "{x}".into(), start: 0.0, end: 1.0 }];
        let ass = build_ass(&words, &LyricsStyle::default(), 0.0);
        assert!(!ass.contains("{x}"));
    }
}
