//! Scene manager: routes pointer and resize events to every string.

use crate::Point;
use crate::audio_mapper::AudioTargets;
use crate::config::{ConfigError, ResolvedString, SceneConfig};
use crate::emitter::AudioEmitter;
use crate::pointer::PointerTracker;
use crate::string::{SharedString, StringInstance};
use crate::viewport::Viewport;

pub struct Scene {
    strings: Vec<SharedString>,
    pointer: PointerTracker,
    viewport: Viewport,
}

impl Scene {
    /// Build every string in `config`. `make_emitter` supplies each string's
    /// tone output given its index and resolved definition.
    pub fn new<F>(config: &SceneConfig, viewport: Viewport, mut make_emitter: F) -> Result<Self, ConfigError>
    where
        F: FnMut(usize, &ResolvedString) -> Box<dyn AudioEmitter>,
    {
        config.validate()?;

        let strings = config
            .resolve_strings()?
            .iter()
            .enumerate()
            .map(|(index, resolved)| {
                StringInstance::new(
                    resolved.start_unit,
                    resolved.end_unit,
                    config.simulation,
                    make_emitter(index, resolved),
                    &viewport,
                )
                .into_shared()
            })
            .collect::<Vec<_>>();

        tracing::info!(strings = strings.len(), "scene constructed");

        Ok(Self {
            strings,
            pointer: PointerTracker::new(config.max_pointer_segments),
            viewport,
        })
    }

    pub fn strings(&self) -> &[SharedString] {
        &self.strings
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn pointer(&self) -> &PointerTracker {
        &self.pointer
    }

    pub fn on_pointer_down(&mut self, point: Point) {
        self.pointer.on_down(point);
    }

    /// Hold every string that is already held or that the pointer's trail
    /// crosses. Returns the indices of the strings now held.
    pub fn on_pointer_move(&mut self, point: Point) -> Vec<usize> {
        if !self.pointer.on_move(point) {
            return Vec::new();
        }

        let trail = self.pointer.trail();
        let mut held = Vec::new();
        for (index, string) in self.strings.iter().enumerate() {
            let mut string = string.lock();
            if string.is_held() || trail.intersects(string.path()) {
                string.hold(point);
                held.push(index);
            }
        }
        held
    }

    /// Release every held string. Returns how many were released.
    pub fn on_pointer_up(&mut self) -> usize {
        self.pointer.on_up();
        self.strings
            .iter()
            .filter(|string| string.lock().let_go())
            .count()
    }

    /// Rescale the viewport without touching the strings.
    pub fn resize_viewport(&mut self, window_width: f64, window_height: f64) {
        self.viewport.resize(window_width, window_height);
    }

    /// Rebuild one string against the current viewport, returning its new
    /// generation.
    pub fn regenerate(&self, index: usize) -> Option<u64> {
        let string = self.strings.get(index)?;
        Some(string.lock().regenerate(&self.viewport))
    }

    /// Resize for a host that ticks every string from one loop.
    pub fn on_resize(&mut self, window_width: f64, window_height: f64) {
        self.resize_viewport(window_width, window_height);
        for index in 0..self.strings.len() {
            self.regenerate(index);
        }
    }

    /// Tick every string once, in order.
    pub fn tick_all(&self) -> Vec<Option<AudioTargets>> {
        self.strings.iter().map(|string| string.lock().tick()).collect()
    }
}
