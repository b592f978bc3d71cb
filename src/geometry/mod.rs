//! Geometry collaborator for the simulation plane.
//!
//! Positions are `glam::DVec2` in µm. Cell footprints are polygons, vesicle
//! footprints are circles; the adjacency computation needs touching segments
//! between polygons and the vesicle association needs circle/polygon slicing.

mod circle;
mod polygon;
mod segment;

pub use circle::{Circle, SLICE_COUNT};
pub use polygon::Polygon;
pub use segment::LineSegment;

pub use glam::DVec2;

/// Absolute tolerance for geometric predicates (µm).
pub const GEOMETRY_EPSILON: f64 = 1e-10;

/// Axis-aligned bounds of the simulated space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: DVec2,
    pub max: DVec2,
}

impl Bounds {
    pub fn new(min: DVec2, max: DVec2) -> Self {
        Self { min, max }
    }

    /// Whether a circle at `center` with `radius` fits entirely inside.
    pub fn contains_circle(&self, center: DVec2, radius: f64) -> bool {
        center.x - radius >= self.min.x
            && center.y - radius >= self.min.y
            && center.x + radius <= self.max.x
            && center.y + radius <= self.max.y
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }
}
