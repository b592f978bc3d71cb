//! Line segments in the simulation plane.

use glam::DVec2;

use super::GEOMETRY_EPSILON;

/// A straight segment between two points (µm).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSegment {
    pub start: DVec2,
    pub end: DVec2,
}

impl LineSegment {
    pub fn new(start: DVec2, end: DVec2) -> Self {
        Self { start, end }
    }

    pub fn length(&self) -> f64 {
        self.start.distance(self.end)
    }

    pub fn midpoint(&self) -> DVec2 {
        (self.start + self.end) * 0.5
    }

    /// Unit direction from start to end, zero for degenerate segments.
    pub fn direction(&self) -> DVec2 {
        (self.end - self.start).normalize_or_zero()
    }

    /// Closest point on the segment to `point`.
    pub fn closest_point(&self, point: DVec2) -> DVec2 {
        let d = self.end - self.start;
        let length_squared = d.length_squared();
        if length_squared < GEOMETRY_EPSILON * GEOMETRY_EPSILON {
            return self.start;
        }
        let t = ((point - self.start).dot(d) / length_squared).clamp(0.0, 1.0);
        self.start + d * t
    }

    pub fn distance_to_point(&self, point: DVec2) -> f64 {
        self.closest_point(point).distance(point)
    }

    /// Perpendicular distance from `point` to the infinite line through the segment.
    pub fn line_distance_to_point(&self, point: DVec2) -> f64 {
        let u = self.direction();
        u.perp_dot(point - self.start).abs()
    }

    /// Proper intersection point with another segment, `None` if parallel or disjoint.
    pub fn intersection(&self, other: &LineSegment) -> Option<DVec2> {
        let r = self.end - self.start;
        let s = other.end - other.start;
        let denominator = r.perp_dot(s);
        if denominator.abs() < GEOMETRY_EPSILON {
            return None;
        }
        let offset = other.start - self.start;
        let t = offset.perp_dot(s) / denominator;
        let u = offset.perp_dot(r) / denominator;
        let range = -GEOMETRY_EPSILON..=1.0 + GEOMETRY_EPSILON;
        if range.contains(&t) && range.contains(&u) {
            Some(self.start + r * t)
        } else {
            None
        }
    }

    /// Shared collinear piece of two segments, if any.
    ///
    /// Returns the overlap (possibly of zero length when the segments only
    /// meet in a point); `None` when they are not collinear or do not meet.
    pub fn collinear_overlap(&self, other: &LineSegment) -> Option<LineSegment> {
        let length = self.length();
        if length < GEOMETRY_EPSILON {
            return None;
        }
        let u = (self.end - self.start) / length;
        let tolerance = GEOMETRY_EPSILON * length.max(1.0);
        if u.perp_dot(other.start - self.start).abs() > tolerance
            || u.perp_dot(other.end - self.start).abs() > tolerance
        {
            return None;
        }

        let t0 = u.dot(other.start - self.start);
        let t1 = u.dot(other.end - self.start);
        let low = t0.min(t1).max(0.0);
        let high = t0.max(t1).min(length);
        if high < low - tolerance {
            return None;
        }
        Some(LineSegment::new(self.start + u * low, self.start + u * high.max(low)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crossing_segments_intersect() {
        let a = LineSegment::new(DVec2::new(0.0, 0.0), DVec2::new(2.0, 2.0));
        let b = LineSegment::new(DVec2::new(0.0, 2.0), DVec2::new(2.0, 0.0));
        let p = a.intersection(&b).unwrap();
        assert!((p - DVec2::new(1.0, 1.0)).length() < 1e-12);
    }

    #[test]
    fn test_parallel_segments_do_not_intersect() {
        let a = LineSegment::new(DVec2::new(0.0, 0.0), DVec2::new(1.0, 0.0));
        let b = LineSegment::new(DVec2::new(0.0, 1.0), DVec2::new(1.0, 1.0));
        assert!(a.intersection(&b).is_none());
        assert!(a.collinear_overlap(&b).is_none());
    }

    #[test]
    fn test_collinear_overlap_is_clipped() {
        let a = LineSegment::new(DVec2::new(0.0, 0.0), DVec2::new(2.0, 0.0));
        let b = LineSegment::new(DVec2::new(3.0, 0.0), DVec2::new(1.0, 0.0));
        let overlap = a.collinear_overlap(&b).unwrap();
        assert!((overlap.length() - 1.0).abs() < 1e-12);
        assert!((overlap.start - DVec2::new(1.0, 0.0)).length() < 1e-12);
    }

    #[test]
    fn test_distance_to_point() {
        let a = LineSegment::new(DVec2::new(0.0, 0.0), DVec2::new(2.0, 0.0));
        assert!((a.distance_to_point(DVec2::new(1.0, 0.5)) - 0.5).abs() < 1e-12);
        assert!((a.distance_to_point(DVec2::new(3.0, 0.0)) - 1.0).abs() < 1e-12);
    }
}
