//! Coordinate and extent types shared across geometry and batching.
//!
//! Canonical CPU space:
//! - Logical pixels
//! - Origin top-left
//! - +X right, +Y down
//!
//! Under this convention a polygon that reads clockwise on screen has a
//! non-negative signed-area accumulation, which is the orientation the
//! triangulator consumes.

mod bounds;
mod vec2;

pub use bounds::Bounds;
pub use vec2::Vec2;
