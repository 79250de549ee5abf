// crates/beatcut-core/src/preview/cache.rs
//
// LRU cache for decoded preview frames / thumbnails.
//
// Single-writer single-reader by design: the renderer owns the cache and
// is the only code that inserts or evicts. `EXTRACTION_CAP` bounds how
// many decodes a host may run concurrently to fill misses — requests past
// the cap report `Busy` and the renderer draws the last frame instead.

use std::collections::HashMap;

use uuid::Uuid;

use crate::preview::surface::Surface;

/// Max concurrent frame extractions a host should run for cache misses.
pub const EXTRACTION_CAP: usize = 6;

/// Key: asset plus the source time quantised to the cache step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameKey {
    pub asset: Uuid,
    /// Source time in cache steps (10 ms units).
    pub step:  u64,
}

impl FrameKey {
    pub fn at(asset: Uuid, source_time: f64) -> Self {
        Self { asset, step: (source_time * 100.0).round().max(0.0) as u64 }
    }
}

pub struct FrameCache {
    capacity: usize,
    /// Monotone use counter; the entry with the smallest stamp is evicted.
    clock:    u64,
    entries:  HashMap<FrameKey, (u64, Surface)>,
    in_flight: usize,
}

impl FrameCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            clock: 0,
            entries: HashMap::new(),
            in_flight: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fetch and touch an entry.
    pub fn get(&mut self, key: FrameKey) -> Option<&Surface> {
        self.clock += 1;
        let clock = self.clock;
        self.entries.get_mut(&key).map(|(stamp, surface)| {
            *stamp = clock;
            &*surface
        })
    }

    /// Insert, evicting the least-recently-used entry when full.
    pub fn insert(&mut self, key: FrameKey, frame: Surface) {
        self.clock += 1;
        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            if let Some(oldest) = self
                .entries
                .iter()
                .min_by_key(|(_, (stamp, _))| *stamp)
                .map(|(k, _)| *k)
            {
                self.entries.remove(&oldest);
            }
        }
        self.entries.insert(key, (self.clock, frame));
    }

    /// Try to reserve an extraction slot for a cache miss.
    /// Returns false when `EXTRACTION_CAP` decodes are already running.
    pub fn begin_extraction(&mut self) -> bool {
        if self.in_flight >= EXTRACTION_CAP {
            return false;
        }
        self.in_flight += 1;
        true
    }

    pub fn end_extraction(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
    }

    /// Drop every frame of `asset` (called when an asset is re-proxied).
    pub fn invalidate_asset(&mut self, asset: Uuid) {
        self.entries.retain(|k, _| k.asset != asset);
    }
}
