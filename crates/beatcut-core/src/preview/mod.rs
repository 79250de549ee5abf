// crates/beatcut-core/src/preview/mod.rs

pub mod cache;
pub mod lyrics;
pub mod renderer;
pub mod surface;
pub mod sync;

pub use renderer::{render_frame, FrameSource, PreviewQuality, RenderCtx, TextPainter};
pub use surface::{Bounds, Surface};
