//! GPU binding layer for segment buffers.
//!
//! Consumes the output of `batch` and issues wgpu commands. The renderer is
//! responsible for its own GPU resources (pipelines, buffers, bind groups);
//! the batching core stays free of graphics-API types apart from vertex
//! layout metadata.
//!
//! Convention:
//! - CPU geometry is in logical pixels (top-left origin, +Y down).
//! - The stock shader converts to NDC using a viewport uniform.

mod batch_renderer;
mod ctx;

pub use batch_renderer::BatchRenderer;
pub use ctx::RenderCtx;
