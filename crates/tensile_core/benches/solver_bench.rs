//! Criterion benchmarks for the string solver
//!
//! Run with: cargo bench -p tensile_core
//!
//! Measures one integration step at several string lengths and a full scene
//! tick, to catch regressions in the per-frame budget.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use tensile_core::emitter::SilentEmitter;
use tensile_core::viewport::FixedViewport;
use tensile_core::{Point, Scene, SceneConfig, SimulationParameters, StringInstance, Viewport};

const TICKS_PER_ITER: u64 = 60; // one second of frames

/// A string `width` pixels long, plucked at its midpoint and released.
fn plucked_string(width: f64) -> StringInstance {
    let mut string = StringInstance::new(
        Point::new(0.0, 0.5),
        Point::new(1.0, 0.5),
        SimulationParameters::default(),
        Box::new(SilentEmitter::default()),
        &FixedViewport::new(width, 100.0),
    );
    let middle = string.num_segments() / 2;
    let home = string.segments()[middle].home;
    string.hold(home + Point::new(0.0, 30.0));
    string.let_go();
    string
}

fn bench_string_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("string_tick");

    for width in [240.0, 1200.0, 4800.0] {
        let mut string = plucked_string(width);
        group.throughput(Throughput::Elements(TICKS_PER_ITER));
        group.bench_function(BenchmarkId::from_parameter(string.num_segments()), |b| {
            b.iter(|| {
                for _ in 0..TICKS_PER_ITER {
                    black_box(string.tick());
                }
            })
        });
    }

    group.finish();
}

fn bench_scene_tick(c: &mut Criterion) {
    let config = SceneConfig::default();
    let viewport = Viewport::for_scene(&config, 1920.0, 1080.0);
    let scene = Scene::new(&config, viewport, |_, _| Box::new(SilentEmitter::default()))
        .expect("default scene is valid");

    c.bench_function("scene_tick_all", |b| {
        b.iter(|| black_box(scene.tick_all()))
    });
}

fn bench_hold(c: &mut Criterion) {
    let mut string = plucked_string(1200.0);
    c.bench_function("string_hold", |b| {
        b.iter(|| black_box(string.hold(black_box(Point::new(610.0, 80.0)))))
    });
}

criterion_group!(benches, bench_string_tick, bench_scene_tick, bench_hold);
criterion_main!(benches);
