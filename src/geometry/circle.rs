//! Circles: vesicle footprints and their intersections with cell boundaries.

use std::f64::consts::PI;

use glam::DVec2;

use super::{LineSegment, Polygon, GEOMETRY_EPSILON};

/// Number of sector slices used when a circle straddles a polygon vertex.
pub const SLICE_COUNT: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub center: DVec2,
    pub radius: f64,
}

impl Circle {
    pub fn new(center: DVec2, radius: f64) -> Self {
        Self { center, radius }
    }

    pub fn area(&self) -> f64 {
        PI * self.radius * self.radius
    }

    /// Whether the circle's interior reaches the segment.
    pub fn intersects_segment(&self, segment: &LineSegment) -> bool {
        segment.distance_to_point(self.center) < self.radius
    }

    /// Points where the segment crosses the circle boundary.
    pub fn intersections_with_segment(&self, segment: &LineSegment) -> Vec<DVec2> {
        let d = segment.end - segment.start;
        let f = segment.start - self.center;
        let a = d.dot(d);
        if a < GEOMETRY_EPSILON * GEOMETRY_EPSILON {
            return Vec::new();
        }
        let b = 2.0 * f.dot(d);
        let c = f.dot(f) - self.radius * self.radius;
        let discriminant = b * b - 4.0 * a * c;
        if discriminant < 0.0 {
            return Vec::new();
        }
        let root = discriminant.sqrt();
        let mut points = Vec::with_capacity(2);
        for t in [(-b - root) / (2.0 * a), (-b + root) / (2.0 * a)] {
            if (0.0..=1.0).contains(&t) {
                let point = segment.start + d * t;
                if !points.iter().any(|p: &DVec2| p.distance(point) < GEOMETRY_EPSILON) {
                    points.push(point);
                }
            }
        }
        points
    }

    /// Polygon edges whose interior the circle reaches.
    pub fn crossed_edges(&self, polygon: &Polygon) -> Vec<LineSegment> {
        polygon
            .edges()
            .into_iter()
            .filter(|edge| self.intersects_segment(edge))
            .collect()
    }

    /// Whether any polygon vertex lies strictly inside the circle.
    pub fn contains_vertex_of(&self, polygon: &Polygon) -> bool {
        polygon
            .vertices()
            .iter()
            .any(|v| v.distance_squared(self.center) < self.radius * self.radius)
    }

    /// Area of the circular segment cut off by a chord at `distance` from the centre.
    pub fn circular_segment_area(&self, distance: f64) -> f64 {
        let r = self.radius;
        let h = distance.abs();
        if h >= r {
            return 0.0;
        }
        r * r * (h / r).acos() - h * (r * r - h * h).sqrt()
    }

    /// Directions of the eight sector slices, starting east and turning
    /// counter-clockwise in 45° steps.
    pub fn slice_directions() -> [DVec2; SLICE_COUNT] {
        let mut directions = [DVec2::ZERO; SLICE_COUNT];
        for (i, direction) in directions.iter_mut().enumerate() {
            let angle = i as f64 * 2.0 * PI / SLICE_COUNT as f64;
            *direction = DVec2::new(angle.cos(), angle.sin());
        }
        directions
    }

    /// Centroid of the sector slice centred on `direction`.
    ///
    /// For a sector of half-angle α the centroid lies at 2r·sin(α)/(3α).
    pub fn slice_centroid(&self, direction: DVec2) -> DVec2 {
        let half_angle = PI / SLICE_COUNT as f64;
        let distance = 2.0 * self.radius * half_angle.sin() / (3.0 * half_angle);
        self.center + direction * distance
    }
}
