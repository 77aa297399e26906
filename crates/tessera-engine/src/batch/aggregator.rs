use std::collections::BTreeMap;
use std::fmt;

use super::segment::{Segment, SegmentBuffer};
use super::submission::{PassId, RenderSubmission, Renderable};
use crate::tess::TriangulateError;
use crate::vertex::encode_records;

/// Error from batching operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchError {
    /// A submission's local index referenced a vertex it does not have.
    IndexOutOfRange { index: u16, vertex_count: usize },
    /// A submission carried a NaN or infinite depth.
    NonFiniteDepth,
    /// The pending submissions hold more vertices than the shared 16-bit
    /// index buffer can address in one upload.
    IndexRangeExceeded { vertex_count: usize },
    /// Triangulation failed while building a polygon submission.
    Triangulation(TriangulateError),
}

impl fmt::Display for BatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchError::IndexOutOfRange { index, vertex_count } => {
                write!(f, "local index {index} out of range for {vertex_count} vertices")
            }
            BatchError::NonFiniteDepth => write!(f, "submission depth is not finite"),
            BatchError::IndexRangeExceeded { vertex_count } => {
                write!(f, "{vertex_count} vertices exceed 16-bit index range for one upload")
            }
            BatchError::Triangulation(e) => write!(f, "triangulation failed: {e}"),
        }
    }
}

impl std::error::Error for BatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BatchError::Triangulation(e) => Some(e),
            _ => None,
        }
    }
}

impl From<TriangulateError> for BatchError {
    fn from(e: TriangulateError) -> Self {
        BatchError::Triangulation(e)
    }
}

/// Collects render submissions and merges them into a [`SegmentBuffer`].
///
/// `add` only validates and stores; the vertex/index merge happens in
/// `upload`, after sorting by `(pass, depth-if-enabled, shader, texture,
/// mode)`. Depth ordering and state batching are mutually exclusive per
/// pass: enabling depth order gives up merge opportunities because state
/// changes are no longer minimized first.
///
/// Single-writer, not reentrant: `add` must not be called from within
/// `upload`.
#[derive(Debug, Default)]
pub struct BatchAggregator {
    pending: Vec<RenderSubmission>,
    depth_sorted: BTreeMap<PassId, bool>,
}

impl BatchAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of submissions waiting for the next upload.
    #[inline]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Whether `pass` is currently depth-ordered.
    #[inline]
    pub fn depth_sort_enabled(&self, pass: PassId) -> bool {
        self.depth_sorted.get(&pass).copied().unwrap_or(false)
    }

    /// Sets the depth-ordering policy for a pass.
    ///
    /// Applies to future uploads and retags any currently pending
    /// submissions for that pass, so behavior is consistent without
    /// requiring a fresh `add`.
    pub fn set_depth_sort(&mut self, pass: PassId, enabled: bool) {
        self.depth_sorted.insert(pass, enabled);
        for sub in &mut self.pending {
            if sub.state.pass == pass {
                sub.state.depth_sort = enabled;
            }
        }
    }

    /// Queues a submission for the next upload.
    ///
    /// Local indices are validated against the submission's own vertex
    /// count here, at the mutating call. A submission with `depth_sort` set
    /// marks its pass for depth-aware ordering.
    pub fn add(&mut self, submission: RenderSubmission) -> Result<(), BatchError> {
        if !submission.state.depth.is_finite() {
            return Err(BatchError::NonFiniteDepth);
        }
        let vertex_count = submission.vertices.len();
        if let Some(&bad) = submission.indices.iter().find(|&&ix| ix as usize >= vertex_count) {
            return Err(BatchError::IndexOutOfRange { index: bad, vertex_count });
        }
        if submission.state.depth_sort {
            self.depth_sorted.insert(submission.state.pass, true);
        }
        self.pending.push(submission);
        Ok(())
    }

    /// Queues everything a renderable object produces.
    pub fn add_renderable(&mut self, renderable: &impl Renderable) -> Result<(), BatchError> {
        for submission in renderable.submissions() {
            self.add(submission)?;
        }
        Ok(())
    }

    /// Sorts, renumbers and merges pending submissions into flat buffers.
    ///
    /// An empty pending list produces an empty buffer. On success the
    /// pending list is cleared; depth-sort policies persist. On overflow
    /// the pending list is left intact so the caller can split the batch.
    pub fn upload(&mut self) -> Result<SegmentBuffer, BatchError> {
        if self.pending.is_empty() {
            return Ok(SegmentBuffer::default());
        }

        let total_vertices: usize = self.pending.iter().map(|s| s.vertices.len()).sum();
        if total_vertices > u16::MAX as usize + 1 {
            return Err(BatchError::IndexRangeExceeded { vertex_count: total_vertices });
        }

        // Stable sort: equal keys keep insertion order.
        let Self { pending, depth_sorted } = self;
        pending.sort_by(|a, b| {
            let (sa, sb) = (&a.state, &b.state);
            sa.pass
                .cmp(&sb.pass)
                .then_with(|| {
                    let by_depth = depth_sorted.get(&sa.pass).copied().unwrap_or(false);
                    if by_depth {
                        sa.depth.total_cmp(&sb.depth)
                    } else {
                        std::cmp::Ordering::Equal
                    }
                })
                .then_with(|| sa.shader.cmp(&sb.shader))
                .then_with(|| sa.texture.cmp(&sb.texture))
                .then_with(|| sa.mode.cmp(&sb.mode))
        });

        let mut records = Vec::with_capacity(total_vertices);
        let mut indices: Vec<u16> = Vec::new();
        let mut passes: BTreeMap<PassId, Vec<Segment>> = BTreeMap::new();
        let mut open: Option<Segment> = None;
        let mut base: u32 = 0;

        for sub in pending.iter() {
            // Index-less submissions advance the running vertex count but
            // neither cut nor extend a segment.
            if !sub.indices.is_empty() {
                let cut = match &open {
                    Some(seg) => {
                        (seg.pass, seg.shader, seg.texture, seg.mode) != sub.state.batch_key()
                    }
                    None => true,
                };
                if cut {
                    if let Some(seg) = open.take() {
                        passes.entry(seg.pass).or_default().push(seg);
                    }
                    open = Some(Segment {
                        pass: sub.state.pass,
                        shader: sub.state.shader,
                        texture: sub.state.texture,
                        mode: sub.state.mode,
                        index_offset: indices.len() as u32,
                        index_count: 0,
                    });
                }
                for &ix in &sub.indices {
                    indices.push((base + ix as u32) as u16);
                }
                if let Some(seg) = &mut open {
                    seg.index_count += sub.indices.len() as u32;
                }
            }
            records.extend_from_slice(&sub.vertices);
            base += sub.vertices.len() as u32;
        }
        if let Some(seg) = open.take() {
            passes.entry(seg.pass).or_default().push(seg);
        }

        let submission_count = pending.len();
        pending.clear();

        let segment_count: usize = passes.values().map(Vec::len).sum();
        log::debug!(
            "upload: {} submissions, {} vertices, {} indices, {} segments",
            submission_count,
            total_vertices,
            indices.len(),
            segment_count,
        );

        Ok(SegmentBuffer::new(encode_records(&records), indices, passes))
    }
}
