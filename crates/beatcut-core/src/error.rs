// crates/beatcut-core/src/error.rs
//
// Error taxonomy for the core crate.
//
//   EditError   — a timeline mutation would break a model invariant; the
//                 mutation is rejected and the project is unchanged.
//   ExportError — the compiler cannot produce a valid filter graph. Note
//                 that a *missing resource* (absent input, mask, beats) is
//                 not an error: the element/effect skips and the compiler
//                 continues. These variants are the hard failures only.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error, PartialEq)]
pub enum EditError {
    #[error("track {0} not found")]
    TrackNotFound(Uuid),

    #[error("clip {0} not found")]
    ClipNotFound(Uuid),

    #[error("clip {clip} would overlap another clip on track {track}")]
    Overlap { clip: Uuid, track: Uuid },

    #[error("invalid time range {start}..{end}")]
    InvalidRange { start: f64, end: f64 },

    #[error("source range {start}..{end} outside asset duration {asset_duration}")]
    SourceOutOfBounds {
        start:          f64,
        end:            f64,
        asset_duration: f64,
    },

    #[error("clip payload is not legal on a {track_kind:?} track")]
    IncompatibleTrack { track_kind: crate::state::TrackKind },

    #[error("effect track requires an effect kind and a video parent track")]
    InvalidEffectTrack,

    #[error("a master audio track already exists")]
    DuplicateMaster,

    #[error("split point {at} outside clip range")]
    SplitOutOfRange { at: f64 },

    #[error("track index {0} out of bounds")]
    TrackIndexOutOfBounds(usize),

    #[error("clips cannot move onto a {0:?} track")]
    MoveRejected(crate::state::TrackKind),
}

#[derive(Debug, Error, PartialEq)]
pub enum ExportError {
    #[error("duplicate pad [{pad}] emitted by {context}")]
    DuplicatePad { pad: String, context: String },

    #[error("pad [{pad}] referenced by {context} was never produced")]
    UnknownPad { pad: String, context: String },

    #[error("pad [{pad}] consumed more than once (second consumer: {context}); use split")]
    PadReuse { pad: String, context: String },

    #[error("filter graph has no node for terminal pad [{0}]")]
    DanglingOutput(String),

    #[error("side-file write failed for {path}: {reason}")]
    WriteFile { path: String, reason: String },
}
