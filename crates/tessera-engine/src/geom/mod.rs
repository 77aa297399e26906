//! Polygon geometry.
//!
//! Responsibilities:
//! - ordered vertex storage with an incrementally maintained bounding box
//! - derived winding classification (never stored)
//! - even-odd point containment, shared by ear validity checks and hit-testing

mod polygon;

pub use polygon::{GeometryError, Polygon, Winding};

pub(crate) use polygon::point_in_ring;
