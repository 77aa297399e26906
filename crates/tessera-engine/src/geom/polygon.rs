use std::fmt;

use crate::coords::{Bounds, Vec2};

/// Error from a mutating polygon call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryError {
    /// A pushed vertex had a NaN or infinite coordinate.
    NonFinitePoint,
}

impl fmt::Display for GeometryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeometryError::NonFinitePoint => write!(f, "polygon vertex is not finite"),
        }
    }
}

impl std::error::Error for GeometryError {}

/// Orientation of a polygon's vertex loop, on screen (+Y down).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Winding {
    /// Non-negative signed-area accumulation. The triangulator's input
    /// orientation.
    Clockwise,
    CounterClockwise,
}

impl Winding {
    /// -1 for clockwise, +1 for counter-clockwise.
    #[inline]
    pub const fn sign(self) -> i8 {
        match self {
            Winding::Clockwise => -1,
            Winding::CounterClockwise => 1,
        }
    }

    #[inline]
    pub const fn reversed(self) -> Self {
        match self {
            Winding::Clockwise => Winding::CounterClockwise,
            Winding::CounterClockwise => Winding::Clockwise,
        }
    }
}

/// An ordered sequence of 2D vertices with a maintained bounding box.
///
/// Winding is a derived property of the vertex order and is recomputed on
/// demand. The bounding box covers every vertex pushed since the last
/// `reset`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Polygon {
    verts: Vec<Vec2>,
    bounds: Option<Bounds>,
}

impl Polygon {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_verts(verts: impl IntoIterator<Item = Vec2>) -> Result<Self, GeometryError> {
        let mut poly = Polygon::new();
        for v in verts {
            poly.push_vertex(v)?;
        }
        Ok(poly)
    }

    /// Appends a vertex and grows the bounding box. O(1).
    ///
    /// Non-finite coordinates are rejected here rather than poisoning later
    /// winding or containment arithmetic.
    pub fn push_vertex(&mut self, p: Vec2) -> Result<(), GeometryError> {
        if !p.is_finite() {
            return Err(GeometryError::NonFinitePoint);
        }
        match &mut self.bounds {
            Some(b) => b.expand(p),
            None => self.bounds = Some(Bounds::at(p)),
        }
        self.verts.push(p);
        Ok(())
    }

    /// Clears vertices and the bounding box.
    #[inline]
    pub fn reset(&mut self) {
        self.verts.clear();
        self.bounds = None;
    }

    #[inline]
    pub fn verts(&self) -> &[Vec2] {
        &self.verts
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.verts.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.verts.is_empty()
    }

    #[inline]
    pub fn bounds(&self) -> Option<Bounds> {
        self.bounds
    }

    /// Winding of the vertex loop, or `None` for fewer than 3 vertices.
    ///
    /// Computed as the sign of `Σ (x[i+1]-x[i])·(y[i+1]+y[i])` over the
    /// closed loop: non-negative means clockwise. A degenerate collinear
    /// polygon accumulates zero and therefore reports clockwise.
    pub fn winding(&self) -> Option<Winding> {
        if self.verts.len() < 3 {
            return None;
        }
        let mut sum = 0.0f32;
        for (i, a) in self.verts.iter().enumerate() {
            let b = self.verts[(i + 1) % self.verts.len()];
            sum += (b.x - a.x) * (b.y + a.y);
        }
        if sum >= 0.0 {
            Some(Winding::Clockwise)
        } else {
            Some(Winding::CounterClockwise)
        }
    }

    /// Even-odd containment test via a ray cast toward +X.
    ///
    /// Edge policy (half-open): a crossing counts when the edge spans `p.y`
    /// under `(a.y > p.y) != (b.y > p.y)` and the intersection lies strictly
    /// right of `p.x`. A point exactly on an edge therefore classifies by
    /// which side the edge faces: on an axis-aligned square the left edge
    /// is inside and the right edge is outside. Boundary points may
    /// classify differently depending on edge orientation; callers that need
    /// a symmetric boundary rule must test bounds separately.
    #[inline]
    pub fn point_in_polygon(&self, p: Vec2) -> bool {
        point_in_ring(&self.verts, p)
    }

    /// Reverses the vertex order in place; returns the new winding.
    pub fn reverse_winding(&mut self) -> Option<Winding> {
        self.verts.reverse();
        self.winding()
    }
}

/// Even-odd containment against a raw vertex ring.
///
/// Shared by `Polygon::point_in_polygon` and the triangulator's ear validity
/// scan (which tests against a 3-vertex ring without building a `Polygon`).
pub(crate) fn point_in_ring(verts: &[Vec2], p: Vec2) -> bool {
    let n = verts.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let a = verts[i];
        let b = verts[j];
        if (a.y > p.y) != (b.y > p.y) {
            let x_cross = b.x + (p.y - b.y) / (a.y - b.y) * (a.x - b.x);
            if p.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}
