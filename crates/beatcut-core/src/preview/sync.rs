// crates/beatcut-core/src/preview/sync.rs
//
// Playback drift policy for host-side video elements.
//
// The renderer never blocks on a decoder; it draws whatever frame the host
// last produced and records the drift. The host consults this policy each
// tick to decide when a hard reseek is worth the decode cost:
//
//   paused  — reseek when drifted > 80 ms (a parked frame should be exact)
//   playing — resync only past 500 ms (small drift self-corrects; seeking
//             mid-play stutters)
//
// Mask videos follow their parent: whenever the parent is told to seek,
// the mask seeks to the same source time.

/// Reseek threshold while paused, seconds.
pub const PAUSED_SEEK_THRESHOLD: f64 = 0.080;

/// Resync threshold during playback, seconds.
pub const PLAYING_RESYNC_THRESHOLD: f64 = 0.500;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncAction {
    /// Keep showing the current frame.
    Keep,
    /// Seek the element (and its mask) to the exact target time.
    Seek,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SyncPolicy;

impl SyncPolicy {
    /// Decide for one element given the wanted and actual source times.
    pub fn decide(&self, playing: bool, target: f64, actual: f64) -> SyncAction {
        let drift = (target - actual).abs();
        let threshold = if playing {
            PLAYING_RESYNC_THRESHOLD
        } else {
            PAUSED_SEEK_THRESHOLD
        };
        if drift > threshold {
            SyncAction::Seek
        } else {
            SyncAction::Keep
        }
    }
}
