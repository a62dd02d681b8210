//! Explicit finite-difference integrator for transverse string displacement.
//!
//! The wave equation is discretised as
//!
//! ```text
//! d²y/dt² = (T / μ) · d²y/dx²
//! ```
//!
//! where the spatial second derivative is taken as the central difference of
//! the central-difference slope. Each step reads derivatives computed from the
//! previous step's displacements, then integrates velocity before
//! displacement. Only interior segments move; both ends are pinned.

use crate::config::SimulationParameters;
use crate::segment::{Baseline, Segment};

/// Largest interior displacement found by the most recent integration.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Peak {
    pub index: usize,
    pub magnitude: f64,
}

/// Arc length of the string's current shape.
///
/// Segment x coordinates are measured along this length, so a deformed string
/// spreads its segments slightly further apart than a resting one.
pub fn path_length(segments: &[Segment], baseline: &Baseline) -> f64 {
    segments
        .windows(2)
        .map(|pair| (baseline.position_of(&pair[1]) - baseline.position_of(&pair[0])).length())
        .sum()
}

/// Central difference of `field` over the interior, written into `out`.
fn central_difference(
    segments: &mut [Segment],
    path_length: f64,
    field: impl Fn(&Segment) -> f64,
    out: impl Fn(&mut Segment, f64),
) {
    let n = segments.len();
    if n < 3 {
        return;
    }

    for i in 1..n - 1 {
        let prev = &segments[i - 1];
        let next = &segments[i + 1];
        let dx = (next.home_fraction - prev.home_fraction) * path_length;
        let value = if dx.abs() > f64::EPSILON {
            (field(next) - field(prev)) / dx
        } else {
            0.0
        };
        out(&mut segments[i], value);
    }
}

pub fn compute_slopes(segments: &mut [Segment], path_length: f64) {
    central_difference(segments, path_length, |s| s.displacement, |s, v| s.slope = v);
    copy_ends(segments, |s| s.slope, |s, v| s.slope = v);
}

pub fn compute_curvature(segments: &mut [Segment], path_length: f64) {
    central_difference(segments, path_length, |s| s.slope, |s, v| s.curvature = v);
    copy_ends(segments, |s| s.curvature, |s, v| s.curvature = v);
}

/// Extend a derivative field to the pins by copying the interior neighbour.
/// This keeps the field continuous; it is not a physical boundary condition.
fn copy_ends(
    segments: &mut [Segment],
    field: impl Fn(&Segment) -> f64,
    out: impl Fn(&mut Segment, f64),
) {
    let n = segments.len();
    if n < 3 {
        return;
    }
    let first = field(&segments[1]);
    out(&mut segments[0], first);
    let last = field(&segments[n - 2]);
    out(&mut segments[n - 1], last);
}

/// `a = curvature / (m / t)` on the interior, zero at the pins.
pub fn compute_accelerations(segments: &mut [Segment], params: &SimulationParameters) {
    let n = segments.len();
    if n < 2 {
        return;
    }
    let mu = params.mass / params.tension;

    for segment in &mut segments[1..n - 1] {
        segment.acceleration = segment.curvature / mu;
    }
    segments[0].acceleration = 0.0;
    segments[n - 1].acceleration = 0.0;
}

pub fn integrate_velocities(segments: &mut [Segment], dt: f64) {
    let n = segments.len();
    if n < 3 {
        return;
    }
    for segment in &mut segments[1..n - 1] {
        segment.velocity += dt * segment.acceleration;
    }
}

/// Advance and damp interior displacements, returning the new peak.
pub fn integrate_displacements(segments: &mut [Segment], dt: f64, damp: f64) -> Peak {
    let n = segments.len();
    let mut peak = Peak::default();
    if n < 3 {
        return peak;
    }

    let mut best = -1.0;
    for (i, segment) in segments.iter_mut().enumerate().take(n - 1).skip(1) {
        segment.displacement += dt * segment.velocity;
        segment.displacement *= damp;

        let magnitude = segment.displacement.abs();
        if magnitude > best {
            best = magnitude;
            peak = Peak { index: i, magnitude };
        }
    }
    peak
}

/// Recompute slope, curvature and acceleration from the current shape.
pub fn seed_derivatives(segments: &mut [Segment], baseline: &Baseline, params: &SimulationParameters) {
    let length = path_length(segments, baseline);
    compute_slopes(segments, length);
    compute_curvature(segments, length);
    compute_accelerations(segments, params);
}

/// One full explicit integration step.
#[profiling::function]
pub fn step(segments: &mut [Segment], baseline: &Baseline, params: &SimulationParameters) -> Peak {
    seed_derivatives(segments, baseline, params);
    integrate_velocities(segments, params.time_step);
    integrate_displacements(segments, params.time_step, params.damp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Point;
    use crate::segment::build_segments;

    fn flat_string(n: usize) -> (Vec<Segment>, Baseline) {
        let start = Point::ZERO;
        let end = Point::new((n - 1) as f64 * 10.0, 0.0);
        (build_segments(start, end, n), Baseline::new(start, end, n))
    }

    #[test]
    fn test_slopes_of_linear_ramp() {
        let (mut segments, baseline) = flat_string(6);
        for (i, s) in segments.iter_mut().enumerate() {
            s.displacement = 2.0 * i as f64;
        }
        let length = baseline.length;
        compute_slopes(&mut segments, length);
        for s in &segments {
            assert!((s.slope - 0.2).abs() < 1e-12, "slope {}", s.slope);
        }
    }

    #[test]
    fn test_curvature_of_parabola() {
        let (mut segments, baseline) = flat_string(8);
        for s in segments.iter_mut() {
            let x = s.home.x;
            s.displacement = 0.5 * x * x;
        }
        compute_slopes(&mut segments, baseline.length);
        compute_curvature(&mut segments, baseline.length);
        // Interior points two away from each end see exact slopes on both sides
        for s in &segments[2..6] {
            assert!((s.curvature - 1.0).abs() < 1e-9, "curvature {}", s.curvature);
        }
        assert_eq!(segments[0].curvature, segments[1].curvature);
        assert_eq!(segments[7].curvature, segments[6].curvature);
    }

    #[test]
    fn test_boundary_accelerations_are_zero() {
        let (mut segments, baseline) = flat_string(10);
        segments[4].displacement = 5.0;
        let params = SimulationParameters::default();
        seed_derivatives(&mut segments, &baseline, &params);
        assert_eq!(segments[0].acceleration, 0.0);
        assert_eq!(segments[9].acceleration, 0.0);
        assert!(segments[4].acceleration != 0.0);
    }

    #[test]
    fn test_step_leaves_pins_fixed() {
        let (mut segments, baseline) = flat_string(10);
        segments[0].displacement = 1.5;
        segments[5].displacement = -3.0;
        let params = SimulationParameters::default();
        for _ in 0..20 {
            step(&mut segments, &baseline, &params);
        }
        assert_eq!(segments[0].displacement, 1.5);
        assert_eq!(segments[9].displacement, 0.0);
        assert_eq!(segments[0].velocity, 0.0);
    }

    #[test]
    fn test_rest_is_a_fixed_point() {
        let (mut segments, baseline) = flat_string(12);
        let params = SimulationParameters::default();
        let peak = step(&mut segments, &baseline, &params);
        assert_eq!(peak, Peak { index: 1, magnitude: 0.0 });
        assert!(segments.iter().all(|s| s.displacement == 0.0));
    }

    #[test]
    fn test_displacements_apply_damping() {
        let (mut segments, _) = flat_string(4);
        segments[1].displacement = 10.0;
        segments[2].displacement = -4.0;
        let peak = integrate_displacements(&mut segments, 1.0, 0.5);
        assert_eq!(segments[1].displacement, 5.0);
        assert_eq!(segments[2].displacement, -2.0);
        assert_eq!(peak, Peak { index: 1, magnitude: 5.0 });
    }

    #[test]
    fn test_path_length_follows_shape() {
        let (mut segments, baseline) = flat_string(3);
        assert!((path_length(&segments, &baseline) - 20.0).abs() < 1e-12);
        segments[1].displacement = 10.0;
        let expected = 2.0 * (10.0f64 * 10.0 + 10.0 * 10.0).sqrt();
        assert!((path_length(&segments, &baseline) - expected).abs() < 1e-9);
    }
}
