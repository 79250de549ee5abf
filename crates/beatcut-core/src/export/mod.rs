// crates/beatcut-core/src/export/mod.rs
//
// The export compiler: Project + resolved bundle → deterministic ffmpeg
// inputs, filter_complex and ASS side-files. Pure except for the injected
// side-file writer; byte-identical projects compile to byte-identical
// graphs.

pub mod ass;
pub mod audio;
pub mod compiler;
pub mod context;
pub mod graph;

pub use compiler::{compile, CompiledExport};
pub use context::{ExportBundle, ExportContext, FileWriter, InputSpec};
pub use graph::{FilterGraph, FilterNode};
