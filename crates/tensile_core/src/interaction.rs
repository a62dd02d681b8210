//! Hold/release state machine for a single string.
//!
//! While `Held`, the pointer owns the string's shape and the solver is idle.
//! Releasing reseeds the derivative fields from the held shape so the free
//! vibration starts from rest in exactly that shape.

use crate::Point;
use crate::config::SimulationParameters;
use crate::emitter::AudioEmitter;
use crate::segment::{Baseline, Segment};
use crate::solver;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StringMode {
    /// Vibrating freely under the solver
    #[default]
    Loose,
    /// Deformed by the pointer, solver inactive
    Held,
}

/// Where a pointer grabs the string and how far it pulls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoldOutcome {
    /// Grabbed segment, never a pinned end
    pub nearest_id: usize,
    /// Signed pull distance; the grabbed segment is displaced by `-distance`
    pub distance: f64,
    /// The raw pull exceeded the cap and was clamped
    pub is_overstretched: bool,
}

#[derive(Debug, Clone, Default)]
pub struct InteractionController {
    mode: StringMode,
    last_hold: Option<HoldOutcome>,
}

impl InteractionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> StringMode {
        self.mode
    }

    pub fn is_held(&self) -> bool {
        self.mode == StringMode::Held
    }

    pub fn is_loose(&self) -> bool {
        self.mode == StringMode::Loose
    }

    /// Result of the most recent `hold`, cleared on release.
    pub fn last_hold(&self) -> Option<HoldOutcome> {
        self.last_hold
    }

    /// Return to `Loose` without touching the field or the emitter.
    pub fn reset(&mut self) {
        self.mode = StringMode::Loose;
        self.last_hold = None;
    }

    /// Project `pointer` onto the baseline and pick the segment it grabs.
    ///
    /// Projection onto the line is `(X - A) · (B - A) / |B - A|`. The result is
    /// clamped to the interior so the pinned ends can never be dragged. A
    /// non-finite pointer grabs segment 1 with no pull.
    pub fn find_nearest_segment(
        pointer: Point,
        segments: &[Segment],
        baseline: &Baseline,
        max_magnitude: f64,
    ) -> HoldOutcome {
        let n = segments.len();
        let length = (pointer - baseline.start).dot(baseline.unit_vector);
        let raw_segment = if baseline.segment_length > 0.0 && length.is_finite() {
            length / baseline.segment_length
        } else {
            1.0
        };

        let last_interior = n.saturating_sub(2).max(1) as f64;
        let nearest_id = raw_segment.round().clamp(1.0, last_interior) as usize;
        let nearest_home = segments[nearest_id].home;

        let mut distance = pointer.distance(nearest_home);
        if distance.is_nan() {
            distance = 0.0;
        }
        let is_overstretched = distance > max_magnitude;
        if is_overstretched {
            distance = max_magnitude;
        }

        // Compares screen y only, so the polarity is only dependable for
        // near-horizontal strings.
        if pointer.y < nearest_home.y {
            distance = -distance;
        }

        HoldOutcome {
            nearest_id,
            distance,
            is_overstretched,
        }
    }

    /// Grab the string at `pointer` and pull it into a triangle.
    pub fn hold(
        &mut self,
        pointer: Point,
        segments: &mut [Segment],
        baseline: &Baseline,
        params: &SimulationParameters,
        emitter: &mut dyn AudioEmitter,
    ) -> HoldOutcome {
        if self.mode != StringMode::Held {
            tracing::trace!(?pointer, "string held");
        }
        self.mode = StringMode::Held;

        let outcome = Self::find_nearest_segment(pointer, segments, baseline, params.max_magnitude);
        apply_pluck_shape(segments, outcome.nearest_id, outcome.distance);
        self.last_hold = Some(outcome);

        emitter.stop();
        outcome
    }

    /// Release a held string. Returns `false` if the string was not held.
    pub fn let_go(
        &mut self,
        segments: &mut [Segment],
        baseline: &Baseline,
        params: &SimulationParameters,
        emitter: &mut dyn AudioEmitter,
    ) -> bool {
        if self.mode != StringMode::Held {
            return false;
        }

        solver::seed_derivatives(segments, baseline, params);
        for segment in segments.iter_mut() {
            segment.velocity = 0.0;
        }

        self.mode = StringMode::Loose;
        self.last_hold = None;
        tracing::trace!("string released");

        emitter.start();
        true
    }
}

/// Piecewise-linear pluck: `-distance` at `held`, falling linearly to zero at
/// both pinned ends.
pub fn apply_pluck_shape(segments: &mut [Segment], held: usize, distance: f64) {
    let n = segments.len();
    if held == 0 || held + 1 >= n {
        return;
    }
    let tail = (n - 1 - held) as f64;

    for (i, segment) in segments.iter_mut().enumerate() {
        segment.displacement = if i < held {
            -distance * (i as f64 / held as f64)
        } else if i == held {
            -distance
        } else {
            -distance * (1.0 - (i - held) as f64 / tail)
        };
    }
}
