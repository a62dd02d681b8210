//! Live scheduling: one periodic tick task per string.
//!
//! A string's tick task and the pointer handlers share the string through its
//! mutex. Regeneration cancels and joins the old task before the field is
//! rebuilt, so no stale task ever touches the new geometry.

use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{Sender, select};
use tensile_core::string::SharedString;
use tensile_core::{Point, Scene, ViewportMapper};

/// Periodic tick for one string, bound to one generation of it.
pub struct TickTask {
  cancel_tx: Sender<()>,
  handle: Option<JoinHandle<()>>,
  generation: u64,
}

impl TickTask {
  pub fn spawn(string: SharedString, generation: u64, interval: Duration) -> Self {
    let (cancel_tx, cancel_rx) = crossbeam_channel::bounded::<()>(1);
    let ticker = crossbeam_channel::tick(interval);

    let handle = std::thread::spawn(move || {
      loop {
        select! {
          recv(cancel_rx) -> _ => break,
          recv(ticker) -> _ => {
            let mut string = string.lock();
            if !string.is_current(generation) {
              break;
            }
            string.tick();
          }
        }
      }
    });

    Self {
      cancel_tx,
      handle: Some(handle),
      generation,
    }
  }

  pub fn generation(&self) -> u64 {
    self.generation
  }

  /// Stop the task and wait for its last tick to finish.
  pub fn cancel(mut self) {
    self.shutdown();
  }

  fn shutdown(&mut self) {
    let _ = self.cancel_tx.try_send(());
    if let Some(handle) = self.handle.take()
      && handle.join().is_err()
    {
      tracing::error!(generation = self.generation, "tick task panicked");
    }
  }
}

impl Drop for TickTask {
  fn drop(&mut self) {
    self.shutdown();
  }
}

/// A string plus the task currently ticking it.
pub struct StringRunner {
  string: SharedString,
  task: Option<TickTask>,
  interval: Duration,
}

impl StringRunner {
  pub fn new(string: SharedString, interval: Duration) -> Self {
    let generation = string.lock().generation();
    let task = TickTask::spawn(string.clone(), generation, interval);
    Self {
      string,
      task: Some(task),
      interval,
    }
  }

  pub fn string(&self) -> &SharedString {
    &self.string
  }

  /// Generation the running task is bound to.
  pub fn task_generation(&self) -> Option<u64> {
    self.task.as_ref().map(TickTask::generation)
  }

  /// Cancel the running task, rebuild the string and schedule a fresh task.
  pub fn regenerate(&mut self, viewport: &dyn ViewportMapper) -> u64 {
    if let Some(task) = self.task.take() {
      task.cancel();
    }
    let generation = self.string.lock().regenerate(viewport);
    self.task = Some(TickTask::spawn(self.string.clone(), generation, self.interval));
    generation
  }

  pub fn stop(&mut self) {
    if let Some(task) = self.task.take() {
      task.cancel();
    }
  }
}

/// A scene whose strings tick on their own threads.
pub struct Runtime {
  scene: Scene,
  runners: Vec<StringRunner>,
}

impl Runtime {
  pub fn new(scene: Scene, interval: Duration) -> Self {
    let runners = scene
      .strings()
      .iter()
      .map(|string| StringRunner::new(string.clone(), interval))
      .collect();
    tracing::info!(strings = scene.strings().len(), ?interval, "runtime started");
    Self { scene, runners }
  }

  pub fn scene(&self) -> &Scene {
    &self.scene
  }

  pub fn runners(&self) -> &[StringRunner] {
    &self.runners
  }

  pub fn on_pointer_down(&mut self, point: Point) {
    self.scene.on_pointer_down(point);
  }

  pub fn on_pointer_move(&mut self, point: Point) -> Vec<usize> {
    self.scene.on_pointer_move(point)
  }

  pub fn on_pointer_up(&mut self) -> usize {
    self.scene.on_pointer_up()
  }

  pub fn on_resize(&mut self, window_width: f64, window_height: f64) {
    self.scene.resize_viewport(window_width, window_height);
    let viewport = self.scene.viewport();
    for runner in &mut self.runners {
      runner.regenerate(viewport);
    }
  }

  pub fn shutdown(&mut self) {
    for runner in &mut self.runners {
      runner.stop();
    }
  }
}

impl Drop for Runtime {
  fn drop(&mut self) {
    self.shutdown();
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tensile_core::emitter::SilentEmitter;
  use tensile_core::viewport::FixedViewport;
  use tensile_core::{SimulationParameters, StringInstance};

  const INTERVAL: Duration = Duration::from_millis(2);

  fn shared_string() -> SharedString {
    StringInstance::new(
      Point::new(0.0, 0.5),
      Point::new(1.0, 0.5),
      SimulationParameters::default(),
      Box::new(SilentEmitter::default()),
      &FixedViewport::new(600.0, 100.0),
    )
    .into_shared()
  }

  #[test]
  fn test_task_ticks_released_string() {
    let string = shared_string();
    {
      let mut s = string.lock();
      let home = s.segments()[25].home;
      s.hold(home + Point::new(0.0, 20.0));
      s.let_go();
    }
    let mut runner = StringRunner::new(string.clone(), INTERVAL);
    std::thread::sleep(Duration::from_millis(50));
    runner.stop();

    let s = string.lock();
    assert!(s.peak().magnitude > 0.0);
    assert!(s.segments()[25].displacement != -20.0);
  }

  #[test]
  fn test_regenerate_rebinds_task() {
    let string = shared_string();
    let mut runner = StringRunner::new(string.clone(), INTERVAL);
    assert_eq!(runner.task_generation(), Some(0));

    let generation = runner.regenerate(&FixedViewport::new(1200.0, 100.0));
    assert_eq!(generation, 1);
    assert_eq!(runner.task_generation(), Some(1));
    assert_eq!(string.lock().num_segments(), 100);
    runner.stop();
    assert_eq!(runner.task_generation(), None);
  }

  #[test]
  fn test_stale_task_exits_on_its_own() {
    let string = shared_string();
    let task = TickTask::spawn(string.clone(), 0, INTERVAL);
    string.lock().regenerate(&FixedViewport::new(600.0, 100.0));
    std::thread::sleep(Duration::from_millis(20));
    // Joining must not hang: the task saw the new generation and returned
    task.cancel();
  }
}
