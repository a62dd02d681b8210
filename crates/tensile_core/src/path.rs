use crate::Point;

/// Something that draws a string's shape.
///
/// A renderer receives the full ordered point list once, then per-point
/// updates every frame.
pub trait PathSink {
    fn set_points(&mut self, points: &[Point]);
    fn set_point(&mut self, index: usize, point: Point);
}

/// An ordered list of scene points joined by straight lines.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Polyline {
    points: Vec<Point>,
}

impl Polyline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_points(points: Vec<Point>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn push(&mut self, point: Point) {
        self.points.push(point);
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    /// Keep at most `max` of the most recent points.
    pub fn truncate_front(&mut self, max: usize) {
        if self.points.len() > max {
            let excess = self.points.len() - max;
            self.points.drain(..excess);
        }
    }

    /// Whether any piece of `self` crosses or touches any piece of `other`.
    pub fn intersects(&self, other: &Polyline) -> bool {
        if self.points.len() < 2 || other.points.len() < 2 {
            return false;
        }
        if !bounds_overlap(bounds(&self.points), bounds(&other.points)) {
            return false;
        }

        self.points.windows(2).any(|a| {
            other
                .points
                .windows(2)
                .any(|b| segments_intersect(a[0], a[1], b[0], b[1]))
        })
    }
}

impl PathSink for Polyline {
    fn set_points(&mut self, points: &[Point]) {
        self.points.clear();
        self.points.extend_from_slice(points);
    }

    fn set_point(&mut self, index: usize, point: Point) {
        if let Some(slot) = self.points.get_mut(index) {
            *slot = point;
        }
    }
}

fn bounds(points: &[Point]) -> (Point, Point) {
    points.iter().fold(
        (Point::splat(f64::INFINITY), Point::splat(f64::NEG_INFINITY)),
        |(min, max), p| (min.min(*p), max.max(*p)),
    )
}

fn bounds_overlap(a: (Point, Point), b: (Point, Point)) -> bool {
    a.0.x <= b.1.x && b.0.x <= a.1.x && a.0.y <= b.1.y && b.0.y <= a.1.y
}

/// Orientation of the turn p → q → r: positive for counter-clockwise.
fn orientation(p: Point, q: Point, r: Point) -> f64 {
    (q - p).perp_dot(r - p)
}

fn on_segment(p: Point, q: Point, r: Point) -> bool {
    r.x >= p.x.min(q.x) && r.x <= p.x.max(q.x) && r.y >= p.y.min(q.y) && r.y <= p.y.max(q.y)
}

/// Closed segment intersection between `p1p2` and `q1q2`.
pub fn segments_intersect(p1: Point, p2: Point, q1: Point, q2: Point) -> bool {
    let d1 = orientation(q1, q2, p1);
    let d2 = orientation(q1, q2, p2);
    let d3 = orientation(p1, p2, q1);
    let d4 = orientation(p1, p2, q2);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }

    (d1 == 0.0 && on_segment(q1, q2, p1))
        || (d2 == 0.0 && on_segment(q1, q2, p2))
        || (d3 == 0.0 && on_segment(p1, p2, q1))
        || (d4 == 0.0 && on_segment(p1, p2, q2))
}
