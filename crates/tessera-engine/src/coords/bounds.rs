use super::Vec2;

/// Axis-aligned bounding box, stored as its two extreme corners.
///
/// Invariant: `lower.x <= upper.x` and `lower.y <= upper.y`. A box always
/// covers at least one point; emptiness is represented by the absence of a
/// `Bounds` value (e.g. `Polygon::bounds` returns `Option<Bounds>`).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Bounds {
    pub lower: Vec2,
    pub upper: Vec2,
}

impl Bounds {
    /// Degenerate box covering a single point.
    #[inline]
    pub const fn at(p: Vec2) -> Self {
        Self { lower: p, upper: p }
    }

    #[inline]
    pub fn size(self) -> Vec2 {
        self.upper - self.lower
    }

    /// Grows the box to cover `p`. O(1).
    #[inline]
    pub fn expand(&mut self, p: Vec2) {
        self.lower.x = self.lower.x.min(p.x);
        self.lower.y = self.lower.y.min(p.y);
        self.upper.x = self.upper.x.max(p.x);
        self.upper.y = self.upper.y.max(p.y);
    }

    /// Closed containment on all four edges.
    #[inline]
    pub fn contains(self, p: Vec2) -> bool {
        p.x >= self.lower.x && p.x <= self.upper.x && p.y >= self.lower.y && p.y <= self.upper.y
    }

    #[inline]
    pub fn union(self, other: Bounds) -> Bounds {
        let mut out = self;
        out.expand(other.lower);
        out.expand(other.upper);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expand_grows_in_every_direction() {
        let mut b = Bounds::at(Vec2::new(2.0, 3.0));
        b.expand(Vec2::new(-1.0, 5.0));
        b.expand(Vec2::new(4.0, 0.0));
        assert_eq!(b.lower, Vec2::new(-1.0, 0.0));
        assert_eq!(b.upper, Vec2::new(4.0, 5.0));
    }

    #[test]
    fn expand_with_interior_point_is_identity() {
        let mut b = Bounds::at(Vec2::new(0.0, 0.0));
        b.expand(Vec2::new(10.0, 10.0));
        let before = b;
        b.expand(Vec2::new(5.0, 5.0));
        assert_eq!(b, before);
    }

    #[test]
    fn contains_is_closed_on_edges() {
        let mut b = Bounds::at(Vec2::zero());
        b.expand(Vec2::new(10.0, 10.0));
        assert!(b.contains(Vec2::new(0.0, 0.0)));
        assert!(b.contains(Vec2::new(10.0, 10.0)));
        assert!(b.contains(Vec2::new(0.0, 10.0)));
        assert!(!b.contains(Vec2::new(10.1, 5.0)));
    }

    #[test]
    fn union_covers_both() {
        let a = Bounds::at(Vec2::new(0.0, 0.0));
        let b = Bounds::at(Vec2::new(7.0, -2.0));
        let u = a.union(b);
        assert_eq!(u.lower, Vec2::new(0.0, -2.0));
        assert_eq!(u.upper, Vec2::new(7.0, 0.0));
    }
}
