//! Criterion benchmarks for the per-event hot path.
//!
//! Every touch or pointer sample goes through the classifier or the motion
//! batcher, and every send goes through the JSON codec, so these three paths
//! bound the client's per-event latency.
//!
//! Run with:
//! ```bash
//! cargo bench --package touchpoint-core --bench gesture_bench
//! ```

use std::time::{Duration, Instant};

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use touchpoint_core::{
    encode_control, ControlMessage, Displacement, GestureClassifier, InputOptions, MotionBatcher,
    Point,
};

fn bench_motion_batcher(c: &mut Criterion) {
    let opts = InputOptions::default();
    let t0 = Instant::now();

    c.bench_function("motion_batcher_1000_samples", |b| {
        b.iter(|| {
            let mut batcher = MotionBatcher::new(&opts);
            batcher.begin_burst(Point::new(0.0, 0.0), t0);
            for i in 0..1000u32 {
                let f = f64::from(i);
                let now = t0 + Duration::from_millis(u64::from(i) * 4);
                black_box(batcher.on_sample(Point::new(f, f * 0.5), now));
            }
            black_box(batcher.flush(t0 + Duration::from_secs(5)))
        })
    });
}

fn bench_tap_classification(c: &mut Criterion) {
    let opts = InputOptions::default();
    let t0 = Instant::now();

    c.bench_function("classify_double_tap", |b| {
        b.iter(|| {
            let mut classifier = GestureClassifier::new(&opts);
            for i in 0..2u64 {
                let start = t0 + Duration::from_millis(i * 150);
                classifier.touch_start(Point::new(200.0, 300.0), start);
                classifier.touch_move(Point::new(201.0, 300.0));
                classifier.touch_end(start + Duration::from_millis(60));
            }
            black_box(classifier.classify())
        })
    });
}

fn bench_encode_move(c: &mut Criterion) {
    let msg = ControlMessage::MoveRelative(Displacement::new(12.5, -4.0));
    c.bench_function("encode_move_relative", |b| {
        b.iter(|| encode_control(black_box(&msg)).expect("encode must succeed"))
    });
}

criterion_group!(
    benches,
    bench_motion_batcher,
    bench_tap_classification,
    bench_encode_move
);
criterion_main!(benches);
