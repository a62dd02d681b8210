use crate::Point;

/// Smallest segment count a string is built with. Two pinned ends plus enough
/// interior segments that a pluck has a slope on both sides.
pub const MIN_SEGMENTS: usize = 4;

/// One sample point along a string's baseline.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Segment {
    /// Anchor position on the undeformed baseline
    pub home: Point,
    /// Position of `home` along the baseline, 0.0 at `start` and 1.0 at `end`
    pub home_fraction: f64,
    /// Offset from `home` along the baseline normal
    pub displacement: f64,
    pub velocity: f64,
    pub slope: f64,
    pub curvature: f64,
    pub acceleration: f64,
}

impl Segment {
    fn at_rest(home: Point, home_fraction: f64) -> Self {
        Self {
            home,
            home_fraction,
            ..Default::default()
        }
    }
}

/// The straight line a string is stretched along.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Baseline {
    pub start: Point,
    pub end: Point,
    /// Normalized start → end direction
    pub unit_vector: Point,
    /// Unit vector perpendicular to the baseline, `(dy, -dx)`
    pub normal: Point,
    /// Distance between neighbouring homes
    pub segment_length: f64,
    /// Distance from start to end
    pub length: f64,
}

impl Baseline {
    pub fn new(start: Point, end: Point, num_segments: usize) -> Self {
        let delta = end - start;
        let length = delta.length();

        // A zero-length string still needs a usable frame for projections
        let unit_vector = delta.try_normalize().unwrap_or(Point::X);
        let normal = Point::new(unit_vector.y, -unit_vector.x);

        Self {
            start,
            end,
            unit_vector,
            normal,
            segment_length: length / (num_segments.max(2) - 1) as f64,
            length,
        }
    }

    /// Scene position of a segment given its current displacement.
    pub fn position_of(&self, segment: &Segment) -> Point {
        segment.home + self.normal * segment.displacement
    }
}

/// Number of segments for a baseline of `distance` scene units.
///
/// The count is always even and never below [`MIN_SEGMENTS`].
pub fn segment_count(distance: f64, pixels_per_segment: f64) -> usize {
    let raw = if pixels_per_segment > 0.0 && distance.is_finite() {
        (distance / pixels_per_segment).floor().max(0.0) as usize
    } else {
        0
    };

    let even = if raw % 2 != 0 { raw - 1 } else { raw };
    even.max(MIN_SEGMENTS)
}

/// Build `num_segments` resting segments evenly spaced from `start` to `end`.
pub fn build_segments(start: Point, end: Point, num_segments: usize) -> Vec<Segment> {
    let last = (num_segments.max(2) - 1) as f64;
    (0..num_segments)
        .map(|i| {
            let fraction = i as f64 / last;
            Segment::at_rest(start.lerp(end, fraction), fraction)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_count_is_even() {
        assert_eq!(segment_count(1200.0, 12.0), 100);
        assert_eq!(segment_count(1212.0, 12.0), 100);
        assert_eq!(segment_count(1224.0, 12.0), 102);
    }

    #[test]
    fn test_segment_count_short_baseline() {
        assert_eq!(segment_count(0.0, 12.0), MIN_SEGMENTS);
        assert_eq!(segment_count(30.0, 12.0), MIN_SEGMENTS);
        assert_eq!(segment_count(100.0, 0.0), MIN_SEGMENTS);
    }

    #[test]
    fn test_build_segments_endpoints_and_spacing() {
        let start = Point::new(10.0, 20.0);
        let end = Point::new(110.0, 20.0);
        let segments = build_segments(start, end, 6);

        assert_eq!(segments.len(), 6);
        assert_eq!(segments[0].home, start);
        assert!((segments[5].home - end).length() < 1e-9);
        assert_eq!(segments[5].home_fraction, 1.0);
        for pair in segments.windows(2) {
            let gap = (pair[1].home - pair[0].home).length();
            assert!((gap - 20.0).abs() < 1e-9, "uneven gap {gap}");
        }
        assert!(segments.iter().all(|s| s.displacement == 0.0 && s.velocity == 0.0));
    }

    #[test]
    fn test_baseline_normal_is_perpendicular() {
        let baseline = Baseline::new(Point::ZERO, Point::new(30.0, 40.0), 10);
        assert!((baseline.unit_vector.length() - 1.0).abs() < 1e-12);
        assert!(baseline.unit_vector.dot(baseline.normal).abs() < 1e-12);
        assert!((baseline.length - 50.0).abs() < 1e-12);
        assert!((baseline.segment_length - 50.0 / 9.0).abs() < 1e-12);
    }

    #[test]
    fn test_horizontal_normal_points_up() {
        let baseline = Baseline::new(Point::ZERO, Point::new(1200.0, 0.0), 100);
        assert_eq!(baseline.normal, Point::new(0.0, -1.0));
    }

    #[test]
    fn test_degenerate_baseline_has_a_frame() {
        let baseline = Baseline::new(Point::ONE, Point::ONE, MIN_SEGMENTS);
        assert_eq!(baseline.unit_vector, Point::X);
        assert_eq!(baseline.segment_length, 0.0);
    }
}
