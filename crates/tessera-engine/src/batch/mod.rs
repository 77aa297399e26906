//! Draw submission batching.
//!
//! Responsibilities:
//! - collect per-object render submissions (vertices, local indices, state)
//! - sort by the composite ordering key at upload time
//! - renumber local indices into the shared 16-bit index space
//! - cut contiguous state-homogeneous segments for the binding layer
//!
//! The shared buffers are replaced wholesale on every upload. Callers with
//! long-lived static geometry keep it in a separate aggregator instance so
//! per-frame uploads only carry dynamic content.

mod aggregator;
mod segment;
mod submission;

pub use aggregator::{BatchAggregator, BatchError};
pub use segment::{Segment, SegmentBuffer};
pub use submission::{
    PassId, RenderMode, RenderState, RenderSubmission, Renderable, ShaderId, TextureId,
};
