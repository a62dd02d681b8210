use crate::Point;
use crate::path::Polyline;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PointerState {
    Down,
    #[default]
    Up,
}

/// Trail of recent pointer positions, used to tell which strings a drag
/// has crossed.
#[derive(Debug, Clone)]
pub struct PointerTracker {
    state: PointerState,
    trail: Polyline,
    max_segments: usize,
}

impl PointerTracker {
    pub fn new(max_segments: usize) -> Self {
        Self {
            state: PointerState::Up,
            trail: Polyline::new(),
            max_segments: max_segments.max(1),
        }
    }

    pub fn state(&self) -> PointerState {
        self.state
    }

    pub fn is_down(&self) -> bool {
        self.state == PointerState::Down
    }

    pub fn trail(&self) -> &Polyline {
        &self.trail
    }

    pub fn on_down(&mut self, point: Point) {
        self.state = PointerState::Down;
        self.trail.push(point);
    }

    /// Extend the trail. Returns `false` (and records nothing) while the
    /// pointer is up.
    pub fn on_move(&mut self, point: Point) -> bool {
        if self.state == PointerState::Up {
            return false;
        }
        self.trail.push(point);
        self.trail.truncate_front(self.max_segments);
        true
    }

    pub fn on_up(&mut self) {
        self.state = PointerState::Up;
        self.trail.clear();
    }
}
