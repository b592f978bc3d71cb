//! Simple polygons used as cell footprints and confinement regions.

use glam::DVec2;

use super::{LineSegment, GEOMETRY_EPSILON};

/// Closed polygon given by its vertices in order (µm).
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    vertices: Vec<DVec2>,
}

impl Polygon {
    pub fn new(vertices: Vec<DVec2>) -> Self {
        Self { vertices }
    }

    /// Axis-aligned rectangle between two corners.
    pub fn rectangle(min: DVec2, max: DVec2) -> Self {
        Self::new(vec![
            DVec2::new(min.x, min.y),
            DVec2::new(max.x, min.y),
            DVec2::new(max.x, max.y),
            DVec2::new(min.x, max.y),
        ])
    }

    /// Square of side `side` centred on `center`.
    pub fn square(center: DVec2, side: f64) -> Self {
        let half = DVec2::splat(side * 0.5);
        Self::rectangle(center - half, center + half)
    }

    pub fn vertices(&self) -> &[DVec2] {
        &self.vertices
    }

    /// Edges in vertex order, closing edge included.
    pub fn edges(&self) -> Vec<LineSegment> {
        let n = self.vertices.len();
        if n < 2 {
            return Vec::new();
        }
        (0..n)
            .map(|i| LineSegment::new(self.vertices[i], self.vertices[(i + 1) % n]))
            .collect()
    }

    /// Signed shoelace area (positive for counter-clockwise vertex order).
    fn signed_area(&self) -> f64 {
        let n = self.vertices.len();
        (0..n)
            .map(|i| self.vertices[i].perp_dot(self.vertices[(i + 1) % n]))
            .sum::<f64>()
            * 0.5
    }

    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }

    /// Area-weighted centroid; falls back to the vertex mean for degenerate polygons.
    pub fn centroid(&self) -> DVec2 {
        let n = self.vertices.len();
        if n == 0 {
            return DVec2::ZERO;
        }
        let area = self.signed_area();
        if area.abs() < GEOMETRY_EPSILON {
            return self.vertices.iter().copied().sum::<DVec2>() / n as f64;
        }
        let mut centroid = DVec2::ZERO;
        for i in 0..n {
            let a = self.vertices[i];
            let b = self.vertices[(i + 1) % n];
            centroid += (a + b) * a.perp_dot(b);
        }
        centroid / (6.0 * area)
    }

    /// Even-odd point containment.
    pub fn contains(&self, point: DVec2) -> bool {
        let n = self.vertices.len();
        let mut inside = false;
        let mut j = n.wrapping_sub(1);
        for i in 0..n {
            let a = self.vertices[i];
            let b = self.vertices[j];
            if (a.y > point.y) != (b.y > point.y) {
                let x_cross = (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x;
                if point.x < x_cross {
                    inside = !inside;
                }
            }
            j = i;
        }
        inside
    }

    /// Points where `segment` crosses the polygon boundary.
    pub fn intersections_with_segment(&self, segment: &LineSegment) -> Vec<DVec2> {
        let mut points: Vec<DVec2> = Vec::new();
        for edge in self.edges() {
            if let Some(point) = edge.intersection(segment) {
                if !points.iter().any(|p| p.distance(point) < GEOMETRY_EPSILON) {
                    points.push(point);
                }
            }
        }
        points
    }

    /// Collinear boundary pieces shared with `other`.
    ///
    /// Zero-length contacts (shared corners) are included; callers decide
    /// which lengths are significant.
    pub fn touching_segments(&self, other: &Polygon) -> Vec<LineSegment> {
        let mut segments: Vec<LineSegment> = Vec::new();
        for edge in self.edges() {
            for other_edge in other.edges() {
                if let Some(overlap) = edge.collinear_overlap(&other_edge) {
                    let duplicate = segments.iter().any(|s| {
                        s.start.distance(overlap.start) < GEOMETRY_EPSILON
                            && s.end.distance(overlap.end) < GEOMETRY_EPSILON
                    });
                    if !duplicate {
                        segments.push(overlap);
                    }
                }
            }
        }
        segments
    }

    /// Minimal distance from `point` to the boundary.
    pub fn distance_to_boundary(&self, point: DVec2) -> f64 {
        self.edges()
            .iter()
            .map(|edge| edge.distance_to_point(point))
            .fold(f64::INFINITY, f64::min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_area_and_centroid() {
        let square = Polygon::square(DVec2::new(1.5, 2.5), 1.0);
        assert!((square.area() - 1.0).abs() < 1e-12);
        assert!((square.centroid() - DVec2::new(1.5, 2.5)).length() < 1e-12);
    }

    #[test]
    fn test_containment() {
        let square = Polygon::rectangle(DVec2::ZERO, DVec2::new(2.0, 1.0));
        assert!(square.contains(DVec2::new(1.0, 0.5)));
        assert!(!square.contains(DVec2::new(2.5, 0.5)));
        assert!(!square.contains(DVec2::new(1.0, -0.1)));
    }

    #[test]
    fn test_adjacent_squares_touch_along_one_edge() {
        let a = Polygon::square(DVec2::new(0.5, 0.5), 1.0);
        let b = Polygon::square(DVec2::new(1.5, 0.5), 1.0);
        let touching: Vec<_> = a
            .touching_segments(&b)
            .into_iter()
            .filter(|s| s.length() > 1e-8)
            .collect();
        assert_eq!(touching.len(), 1);
        assert!((touching[0].length() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_diagonal_squares_touch_in_a_point_only() {
        let a = Polygon::square(DVec2::new(0.5, 0.5), 1.0);
        let b = Polygon::square(DVec2::new(1.5, 1.5), 1.0);
        assert!(a.touching_segments(&b).iter().all(|s| s.length() < 1e-8));
    }

    #[test]
    fn test_segment_crossing_boundary() {
        let square = Polygon::rectangle(DVec2::ZERO, DVec2::ONE);
        let segment = LineSegment::new(DVec2::new(0.5, 0.5), DVec2::new(1.5, 0.5));
        let points = square.intersections_with_segment(&segment);
        assert_eq!(points.len(), 1);
        assert!((points[0] - DVec2::new(1.0, 0.5)).length() < 1e-12);
    }
}
