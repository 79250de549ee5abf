// crates/beatcut-media/src/sidecar.rs
//
// Loaders for the JSON sidecar files the external analysis tools leave
// next to an asset:
//
//   beats   — `{ "tempo": 120.0, "beats": [0.5, 1.0, …] }`
//   lyrics  — `[ { "word": "Hello", "start": 0.0, "end": 0.5 }, … ]`

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};

use beatcut_core::state::{BeatsData, LyricWord};

pub fn load_beats(path: &Path) -> Result<BeatsData> {
    let file = File::open(path).with_context(|| format!("open beats {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parse beats {}", path.display()))
}

pub fn load_lyrics_words(path: &Path) -> Result<Vec<LyricWord>> {
    let file = File::open(path).with_context(|| format!("open lyrics {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parse lyrics {}", path.display()))
}
