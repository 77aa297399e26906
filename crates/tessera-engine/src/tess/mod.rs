//! Ear-clipping triangulation.
//!
//! Scope: UI/sprite-scale polygons (tens of vertices). The scan is the naive
//! quadratic-to-cubic formulation; dense meshes are expected to arrive
//! pre-triangulated and never pass through here.
//!
//! Input polygons must be simple (non-self-intersecting). Orientation is
//! normalized internally: a counter-clockwise polygon is consumed through
//! reversed links, so emitted indices always refer to the caller's original
//! vertex positions.

use std::fmt;

use crate::coords::Vec2;
use crate::geom::{point_in_ring, GeometryError, Polygon, Winding};

/// Error from a triangulation attempt.
///
/// All of these are hard failures for the attempt: the caller decides whether
/// to skip the shape or abort the frame, and nothing is retried internally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriangulateError {
    /// Fewer than 3 vertices.
    TooFewVertices(usize),
    /// More vertices than a 16-bit index can address.
    TooManyVertices(usize),
    /// A full pass over the active vertices produced no valid ear, which
    /// means the input was malformed or self-intersecting.
    NoEarFound,
}

impl fmt::Display for TriangulateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriangulateError::TooFewVertices(n) => {
                write!(f, "cannot triangulate {n} vertices (need at least 3)")
            }
            TriangulateError::TooManyVertices(n) => {
                write!(f, "{n} vertices exceed 16-bit index range")
            }
            TriangulateError::NoEarFound => {
                write!(f, "no valid ear found (malformed or self-intersecting polygon)")
            }
        }
    }
}

impl std::error::Error for TriangulateError {}

/// Triangulates a simple polygon into an index list.
///
/// Indices reference positions in `poly.verts()` and form triangles in
/// groups of three. On success exactly `3 * (n - 2)` indices are emitted.
pub fn triangulate(poly: &Polygon) -> Result<Vec<u16>, TriangulateError> {
    let verts = poly.verts();
    let n = verts.len();
    if n < 3 {
        return Err(TriangulateError::TooFewVertices(n));
    }
    if n > u16::MAX as usize + 1 {
        return Err(TriangulateError::TooManyVertices(n));
    }

    // Circular doubly-linked arena over the vertex sequence. For a
    // counter-clockwise polygon the links are built swapped, which walks the
    // loop in clockwise order without touching the input.
    let clockwise = matches!(poly.winding(), Some(Winding::Clockwise));
    let mut prev: Vec<u32> = Vec::with_capacity(n);
    let mut next: Vec<u32> = Vec::with_capacity(n);
    for i in 0..n as u32 {
        let before = if i == 0 { n as u32 - 1 } else { i - 1 };
        let after = if i == n as u32 - 1 { 0 } else { i + 1 };
        if clockwise {
            prev.push(before);
            next.push(after);
        } else {
            prev.push(after);
            next.push(before);
        }
    }

    let mut indices: Vec<u16> = Vec::with_capacity((n - 2) * 3);
    let mut remaining = n;
    let mut curr = 0usize;
    let mut misses = 0usize;

    while remaining > 3 {
        let p = prev[curr] as usize;
        let q = next[curr] as usize;
        if is_ear(verts, &next, p, curr, q) {
            indices.extend_from_slice(&[p as u16, curr as u16, q as u16]);
            next[p] = q as u32;
            prev[q] = p as u32;
            remaining -= 1;
            curr = q;
            misses = 0;
        } else {
            curr = q;
            misses += 1;
            if misses == remaining {
                return Err(TriangulateError::NoEarFound);
            }
        }
    }

    let p = prev[curr] as usize;
    let q = next[curr] as usize;
    indices.extend_from_slice(&[p as u16, curr as u16, q as u16]);
    Ok(indices)
}

/// Ear test for the candidate `(p, c, q)`.
fn is_ear(verts: &[Vec2], next: &[u32], p: usize, c: usize, q: usize) -> bool {
    let (vp, vc, vq) = (verts[p], verts[c], verts[q]);

    // Non-positive turn marks a convex corner under the clockwise traversal
    // the links encode; collinear counts as convex.
    let turn = (vq - vc).cross(vp - vc);
    if turn > 0.0 {
        return false;
    }

    // No other currently active vertex may sit inside the candidate
    // triangle. Same containment routine as `Polygon::point_in_polygon`,
    // run against the 3-vertex ring.
    let tri = [vp, vc, vq];
    let mut walk = next[q] as usize;
    while walk != p {
        if point_in_ring(&tri, verts[walk]) {
            return false;
        }
        walk = next[walk] as usize;
    }
    true
}

/// A polygon paired with its lazily built triangle index list.
///
/// The index list is never partially stale: any mutation of the vertex
/// sequence clears it entirely, and the next call to [`PolygonMesh::indices`]
/// rebuilds it from scratch.
#[derive(Debug, Clone, Default)]
pub struct PolygonMesh {
    polygon: Polygon,
    indices: Option<Vec<u16>>,
}

impl PolygonMesh {
    #[inline]
    pub fn new(polygon: Polygon) -> Self {
        Self { polygon, indices: None }
    }

    #[inline]
    pub fn polygon(&self) -> &Polygon {
        &self.polygon
    }

    pub fn push_vertex(&mut self, p: Vec2) -> Result<(), GeometryError> {
        self.indices = None;
        self.polygon.push_vertex(p)
    }

    pub fn reverse_winding(&mut self) -> Option<Winding> {
        self.indices = None;
        self.polygon.reverse_winding()
    }

    pub fn reset(&mut self) {
        self.indices = None;
        self.polygon.reset();
    }

    /// The triangle index list, triangulating on first access.
    pub fn indices(&mut self) -> Result<&[u16], TriangulateError> {
        let built = match self.indices.take() {
            Some(ix) => ix,
            None => triangulate(&self.polygon)?,
        };
        Ok(self.indices.insert(built))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Polygon;

    fn poly(pts: &[(f32, f32)]) -> Polygon {
        Polygon::from_verts(pts.iter().map(|&(x, y)| Vec2::new(x, y))).unwrap()
    }

    fn triangle_area(a: Vec2, b: Vec2, c: Vec2) -> f32 {
        ((b - a).cross(c - a) / 2.0).abs()
    }

    fn total_area(verts: &[Vec2], indices: &[u16]) -> f32 {
        indices
            .chunks_exact(3)
            .map(|t| {
                triangle_area(
                    verts[t[0] as usize],
                    verts[t[1] as usize],
                    verts[t[2] as usize],
                )
            })
            .sum()
    }

    fn polygon_area(verts: &[Vec2]) -> f32 {
        let mut sum = 0.0;
        for (i, a) in verts.iter().enumerate() {
            let b = verts[(i + 1) % verts.len()];
            sum += a.x * b.y - b.x * a.y;
        }
        (sum / 2.0).abs()
    }

    // ── soundness ─────────────────────────────────────────────────────────

    #[test]
    fn square_yields_two_triangles_covering_its_area() {
        let p = poly(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]);
        let ix = triangulate(&p).unwrap();
        assert_eq!(ix.len(), 6);
        assert!(ix.iter().all(|&i| (i as usize) < 4));
        assert!((total_area(p.verts(), &ix) - 100.0).abs() < 1e-3);
    }

    #[test]
    fn winding_does_not_change_the_result_shape() {
        let mut p = poly(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]);
        let ccw = triangulate(&p).unwrap();
        p.reverse_winding();
        let cw = triangulate(&p).unwrap();
        assert_eq!(ccw.len(), cw.len());
        assert!((total_area(p.verts(), &cw) - 100.0).abs() < 1e-3);
    }

    #[test]
    fn convex_polygons_emit_n_minus_two_triangles() {
        use std::f32::consts::TAU;
        for sides in 3usize..=10 {
            let verts: Vec<Vec2> = (0..sides)
                .map(|i| {
                    let angle = (i as f32) * TAU / (sides as f32);
                    Vec2::new(10.0 * angle.cos(), 10.0 * angle.sin())
                })
                .collect();
            let p = Polygon::from_verts(verts).unwrap();
            let ix = triangulate(&p).unwrap();
            assert_eq!(ix.len(), (sides - 2) * 3, "{sides}-gon");
            assert!(ix.iter().all(|&i| (i as usize) < sides));
            let expected = polygon_area(p.verts());
            assert!(
                (total_area(p.verts(), &ix) - expected).abs() < expected * 1e-3,
                "{sides}-gon area mismatch"
            );
        }
    }

    #[test]
    fn concave_polygon_is_covered_exactly() {
        // L-shape, area 12.
        let p = poly(&[
            (0.0, 0.0),
            (4.0, 0.0),
            (4.0, 2.0),
            (2.0, 2.0),
            (2.0, 4.0),
            (0.0, 4.0),
        ]);
        let ix = triangulate(&p).unwrap();
        assert_eq!(ix.len(), 12);
        assert!((total_area(p.verts(), &ix) - 12.0).abs() < 1e-3);
    }

    #[test]
    fn collinear_triangle_is_accepted() {
        // Degenerate but 3 vertices: one zero-area triangle, no error.
        let p = poly(&[(0.0, 0.0), (1.0, 1.0), (2.0, 2.0)]);
        let ix = triangulate(&p).unwrap();
        assert_eq!(ix.len(), 3);
    }

    // ── failures ──────────────────────────────────────────────────────────

    #[test]
    fn too_few_vertices() {
        assert_eq!(
            triangulate(&Polygon::new()),
            Err(TriangulateError::TooFewVertices(0))
        );
        assert_eq!(
            triangulate(&poly(&[(0.0, 0.0), (1.0, 0.0)])),
            Err(TriangulateError::TooFewVertices(2))
        );
    }

    #[test]
    fn figure_eight_fails_instead_of_emitting_garbage() {
        // Two lobes of opposite orientation; the waist edges cross at
        // (4, 1.5). Once the dominant lobe is consumed only wrongly-wound
        // vertices remain and a full pass finds no ear.
        let p = poly(&[
            (4.0, 0.0),
            (4.0, 4.0),
            (0.0, 4.0),
            (0.0, 0.0),
            (16.0, 6.0),
            (16.0, -2.0),
        ]);
        assert_eq!(triangulate(&p), Err(TriangulateError::NoEarFound));
    }

    // ── PolygonMesh ───────────────────────────────────────────────────────

    #[test]
    fn mesh_caches_and_invalidates() {
        let mut mesh = PolygonMesh::new(poly(&[
            (0.0, 0.0),
            (10.0, 0.0),
            (10.0, 10.0),
            (0.0, 10.0),
        ]));
        assert_eq!(mesh.indices().unwrap().len(), 6);

        // Mutation clears the cache entirely; the rebuild sees 5 vertices.
        mesh.push_vertex(Vec2::new(-5.0, 5.0)).unwrap();
        assert_eq!(mesh.indices().unwrap().len(), 9);
    }

    #[test]
    fn mesh_invalidates_on_reverse() {
        let mut mesh = PolygonMesh::new(poly(&[
            (0.0, 0.0),
            (10.0, 0.0),
            (10.0, 10.0),
            (0.0, 10.0),
        ]));
        let first = mesh.indices().unwrap().to_vec();
        mesh.reverse_winding();
        let second = mesh.indices().unwrap();
        assert_eq!(first.len(), second.len());
    }

    #[test]
    fn mesh_reset_clears_everything() {
        let mut mesh = PolygonMesh::new(poly(&[(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)]));
        mesh.indices().unwrap();
        mesh.reset();
        assert!(mesh.polygon().is_empty());
        assert_eq!(mesh.indices(), Err(TriangulateError::TooFewVertices(0)));
    }
}
