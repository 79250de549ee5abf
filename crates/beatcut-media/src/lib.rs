// crates/beatcut-media/src/lib.rs

pub mod bundle;
pub mod driver;
pub mod index;
pub mod jobs;
pub mod probe;
pub mod sidecar;
pub mod worker;

pub use bundle::{extract_clip_wavs, resolve_bundle};
pub use driver::{build_args, ExportEvent};
pub use index::AssetIndex;
pub use jobs::{JobRecord, JobState, JobTable};
pub use probe::{probe_media, ProbeInfo};
pub use worker::ExportWorker;
