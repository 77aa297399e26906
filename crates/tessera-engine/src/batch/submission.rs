use crate::geom::Polygon;
use crate::tess::{triangulate, TriangulateError};
use crate::vertex::VertexRecord;

/// Render pass index. Segment lists are kept per pass.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PassId(pub u32);

/// Opaque shader handle. The binding layer maps it to a pipeline.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ShaderId(pub u32);

/// Opaque texture handle. The binding layer maps it to a bind group.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TextureId(pub u32);

/// Primitive interpretation of a submission's index list.
///
/// `LineLoop` has no wgpu topology; the stock renderer draws it as a line
/// strip, so a submitter that needs the closing edge appends the wrap index
/// itself.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RenderMode {
    Points,
    Lines,
    LineLoop,
    Triangles,
}

/// Render state attached to one submission.
///
/// A plain comparable struct: the upload sort key and the segment-cut
/// equality both read straight from these fields.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RenderState {
    pub pass: PassId,
    pub shader: ShaderId,
    pub texture: Option<TextureId>,
    pub mode: RenderMode,
    pub depth: f32,
    pub depth_sort: bool,
}

impl RenderState {
    pub fn new(pass: PassId, shader: ShaderId, mode: RenderMode) -> Self {
        Self {
            pass,
            shader,
            texture: None,
            mode,
            depth: 0.0,
            depth_sort: false,
        }
    }

    #[inline]
    pub fn with_texture(mut self, texture: TextureId) -> Self {
        self.texture = Some(texture);
        self
    }

    #[inline]
    pub fn with_depth(mut self, depth: f32) -> Self {
        self.depth = depth;
        self
    }

    #[inline]
    pub fn with_depth_sort(mut self, enabled: bool) -> Self {
        self.depth_sort = enabled;
        self
    }

    /// Fields that must match for two submissions to share a segment.
    #[inline]
    pub(crate) fn batch_key(&self) -> (PassId, ShaderId, Option<TextureId>, RenderMode) {
        (self.pass, self.shader, self.texture, self.mode)
    }
}

/// The unit handed from a renderable object to the aggregator.
///
/// Indices are local: 0-based against this submission's own vertex list.
/// Constructed fresh each time an object is added to a batch.
#[derive(Debug, Clone)]
pub struct RenderSubmission {
    pub vertices: Vec<VertexRecord>,
    pub indices: Vec<u16>,
    pub state: RenderState,
}

impl RenderSubmission {
    pub fn new(vertices: Vec<VertexRecord>, indices: Vec<u16>, state: RenderState) -> Self {
        Self { vertices, indices, state }
    }

    /// Builds a filled-polygon submission, triangulating the outline.
    ///
    /// The polygon supplies the index list; `state.mode` is forced to
    /// [`RenderMode::Triangles`]. Vertices sit at `z = 0` with the given
    /// color and no texture coordinates.
    pub fn polygon_fill(
        poly: &Polygon,
        state: RenderState,
        color: [u8; 4],
    ) -> Result<Self, TriangulateError> {
        let indices = triangulate(poly)?;
        let vertices = poly
            .verts()
            .iter()
            .map(|v| VertexRecord::new([v.x, v.y, 0.0]).with_color(color))
            .collect();
        let mut state = state;
        state.mode = RenderMode::Triangles;
        Ok(Self { vertices, indices, state })
    }
}

/// A renderable object's callback boundary.
///
/// Implementors return one or more submissions per frame (or once, for
/// static content); the aggregator pulls them via
/// [`BatchAggregator::add_renderable`](super::BatchAggregator::add_renderable).
pub trait Renderable {
    fn submissions(&self) -> Vec<RenderSubmission>;
}
