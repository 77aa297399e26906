use std::collections::BTreeMap;

use super::submission::{PassId, RenderMode, ShaderId, TextureId};
use crate::vertex::RECORD_SIZE;

/// A contiguous run of indices sharing identical render state.
///
/// Within one pass, segments are contiguous and non-overlapping; the union
/// of their ranges is exactly the pass's contribution to the index buffer.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Segment {
    pub pass: PassId,
    pub shader: ShaderId,
    pub texture: Option<TextureId>,
    pub mode: RenderMode,
    /// Offset into the shared index buffer, in indices.
    pub index_offset: u32,
    pub index_count: u32,
}

/// The uploaded result of a batch: packed vertex bytes, the shared 16-bit
/// index buffer, and the per-pass segment lists.
///
/// Rebuilt wholesale by every [`BatchAggregator::upload`]; the binding layer
/// uploads the two buffers and then issues one draw per segment.
///
/// [`BatchAggregator::upload`]: super::BatchAggregator::upload
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SegmentBuffer {
    vertex_data: Vec<u8>,
    indices: Vec<u16>,
    passes: BTreeMap<PassId, Vec<Segment>>,
}

impl SegmentBuffer {
    pub(crate) fn new(
        vertex_data: Vec<u8>,
        indices: Vec<u16>,
        passes: BTreeMap<PassId, Vec<Segment>>,
    ) -> Self {
        Self { vertex_data, indices, passes }
    }

    /// Packed vertex records, `RECORD_SIZE` bytes each.
    #[inline]
    pub fn vertex_data(&self) -> &[u8] {
        &self.vertex_data
    }

    #[inline]
    pub fn indices(&self) -> &[u16] {
        &self.indices
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertex_data.len() / RECORD_SIZE
    }

    #[inline]
    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Segments for one pass, in draw order. Unknown passes yield an empty
    /// slice (drawing them is a no-op, not an error).
    pub fn segments(&self, pass: PassId) -> &[Segment] {
        self.passes.get(&pass).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Passes that received segments, ascending.
    pub fn passes(&self) -> impl Iterator<Item = PassId> + '_ {
        self.passes.keys().copied()
    }
}
