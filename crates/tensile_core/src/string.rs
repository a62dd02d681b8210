//! A single pluckable string: geometry, segment field, interaction state and
//! the per-frame update that ties them to rendering and audio.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::Point;
use crate::audio_mapper::{self, AudioTargets};
use crate::config::SimulationParameters;
use crate::emitter::AudioEmitter;
use crate::interaction::{HoldOutcome, InteractionController, StringMode};
use crate::path::{PathSink, Polyline};
use crate::segment::{self, Baseline, Segment};
use crate::solver::{self, Peak};
use crate::viewport::ViewportMapper;

/// A string shared between its tick task and pointer handlers. The mutex is
/// the string's single serialisation point.
pub type SharedString = Arc<Mutex<StringInstance>>;

pub struct StringInstance {
    start_unit: Point,
    end_unit: Point,
    params: SimulationParameters,
    baseline: Baseline,
    segments: Vec<Segment>,
    controller: InteractionController,
    peak: Peak,
    path: Polyline,
    emitter: Box<dyn AudioEmitter>,
    /// Bumped on every regeneration; tick tasks are bound to one generation.
    generation: u64,
}

impl std::fmt::Debug for StringInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StringInstance")
            .field("start", &self.baseline.start)
            .field("end", &self.baseline.end)
            .field("segments", &self.segments.len())
            .field("mode", &self.controller.mode())
            .field("generation", &self.generation)
            .finish()
    }
}

impl StringInstance {
    pub fn new(
        start_unit: Point,
        end_unit: Point,
        params: SimulationParameters,
        emitter: Box<dyn AudioEmitter>,
        viewport: &dyn ViewportMapper,
    ) -> Self {
        let mut string = Self {
            start_unit,
            end_unit,
            params,
            baseline: Baseline::new(Point::ZERO, Point::X, segment::MIN_SEGMENTS),
            segments: Vec::new(),
            controller: InteractionController::new(),
            peak: Peak::default(),
            path: Polyline::new(),
            emitter,
            generation: 0,
        };
        string.rebuild(viewport);
        string
    }

    pub fn into_shared(self) -> SharedString {
        Arc::new(Mutex::new(self))
    }

    /// Rebuild the segment field for the viewport's current scale.
    ///
    /// The old field is replaced whole and the string returns to rest. Any
    /// tick task bound to the previous generation must be cancelled by its
    /// owner before this is called; see [`StringInstance::is_current`].
    pub fn regenerate(&mut self, viewport: &dyn ViewportMapper) -> u64 {
        self.rebuild(viewport);
        self.generation += 1;
        self.generation
    }

    fn rebuild(&mut self, viewport: &dyn ViewportMapper) {
        let start = viewport.scale_unit_point_to_world(self.start_unit);
        let end = viewport.scale_unit_point_to_world(self.end_unit);

        let num_segments = segment::segment_count(start.distance(end), self.params.pixels_per_segment);
        self.baseline = Baseline::new(start, end, num_segments);
        self.segments = segment::build_segments(start, end, num_segments);

        solver::seed_derivatives(&mut self.segments, &self.baseline, &self.params);
        self.controller.reset();
        self.peak = Peak::default();

        let points: Vec<Point> = self
            .segments
            .iter()
            .map(|s| self.baseline.position_of(s))
            .collect();
        self.path.set_points(&points);

        tracing::debug!(
            segments = num_segments,
            start = ?start,
            end = ?end,
            "string regenerated"
        );
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether a task scheduled for `generation` may still drive this string.
    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    /// Advance one frame. Returns the audio targets sent to the emitter, or
    /// `None` while the string is held.
    #[profiling::function]
    pub fn tick(&mut self) -> Option<AudioTargets> {
        if self.controller.is_held() {
            return None;
        }

        self.peak = solver::step(&mut self.segments, &self.baseline, &self.params);
        let targets = audio_mapper::forward(
            self.emitter.as_mut(),
            self.peak,
            self.segments.len(),
            self.params.max_magnitude,
        );
        self.draw();
        Some(targets)
    }

    pub fn hold(&mut self, pointer: Point) -> HoldOutcome {
        let outcome = self.controller.hold(
            pointer,
            &mut self.segments,
            &self.baseline,
            &self.params,
            self.emitter.as_mut(),
        );
        self.draw();
        outcome
    }

    pub fn let_go(&mut self) -> bool {
        self.controller.let_go(
            &mut self.segments,
            &self.baseline,
            &self.params,
            self.emitter.as_mut(),
        )
    }

    /// Write the current shape into the rendered path. The pinned ends never
    /// move, so only interior points are touched.
    pub fn draw(&mut self) {
        let n = self.segments.len();
        for i in 1..n.saturating_sub(1) {
            let position = self.baseline.position_of(&self.segments[i]);
            self.path.set_point(i, position);
        }
    }

    /// Read-only snapshot of the string's rendered positions.
    pub fn positions(&self) -> Vec<Point> {
        self.path.points().to_vec()
    }

    pub fn path(&self) -> &Polyline {
        &self.path
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn num_segments(&self) -> usize {
        self.segments.len()
    }

    pub fn baseline(&self) -> &Baseline {
        &self.baseline
    }

    pub fn params(&self) -> &SimulationParameters {
        &self.params
    }

    pub fn mode(&self) -> StringMode {
        self.controller.mode()
    }

    pub fn is_held(&self) -> bool {
        self.controller.is_held()
    }

    pub fn last_hold(&self) -> Option<HoldOutcome> {
        self.controller.last_hold()
    }

    /// Peak of the most recent integration step.
    pub fn peak(&self) -> Peak {
        self.peak
    }

    pub fn emitter(&self) -> &dyn AudioEmitter {
        self.emitter.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emitter::SilentEmitter;
    use crate::viewport::FixedViewport;

    fn string_across(width: f64) -> StringInstance {
        StringInstance::new(
            Point::new(0.0, 0.5),
            Point::new(1.0, 0.5),
            SimulationParameters::default(),
            Box::new(SilentEmitter::default()),
            &FixedViewport::new(width, 100.0),
        )
    }

    #[test]
    fn test_new_string_is_loose_and_flat() {
        let string = string_across(1200.0);
        assert_eq!(string.mode(), StringMode::Loose);
        assert_eq!(string.num_segments(), 100);
        assert_eq!(string.path().len(), 100);
        assert!(string.segments().iter().all(|s| s.displacement == 0.0));
        assert_eq!(string.generation(), 0);
    }

    #[test]
    fn test_regenerate_bumps_generation() {
        let mut string = string_across(1200.0);
        let generation = string.regenerate(&FixedViewport::new(600.0, 100.0));
        assert_eq!(generation, 1);
        assert!(string.is_current(1));
        assert!(!string.is_current(0));
        assert_eq!(string.num_segments(), 50);
    }

    #[test]
    fn test_draw_follows_displacement() {
        let mut string = string_across(1200.0);
        let home = string.segments()[50].home;
        string.hold(home + Point::new(0.0, 30.0));
        assert!(string.positions()[50].abs_diff_eq(home + Point::new(0.0, 30.0), 1e-9));
        assert_eq!(string.positions()[0], string.baseline().start);
    }
}
