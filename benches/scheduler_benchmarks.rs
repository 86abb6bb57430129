use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use std::sync::Arc;

use pulse_metronome::{
    Clock, ManualClock, ManualTimer, Metronome, NoteValue, NullPlayback, ProgressionStep,
    RampPlan, RepeatingTimer, SoundPlayback, TapTempo, TempoRamp,
};

/// Benchmark tick processing through the full session (cursor, dispatch,
/// observables, notification push)
fn bench_tick_processing(c: &mut Criterion) {
    let mut group = c.benchmark_group("tick");

    for beats_per_round in [1usize, 4, 16] {
        let timer = Arc::new(ManualTimer::new());
        let session = Metronome::new(
            Arc::clone(&timer) as Arc<dyn RepeatingTimer>,
            Arc::new(NullPlayback) as Arc<dyn SoundPlayback>,
            Arc::new(ManualClock::new(0)) as Arc<dyn Clock>,
        );
        session.set_note_value(NoteValue::None).unwrap();
        session.start().unwrap();

        group.bench_with_input(
            BenchmarkId::from_parameter(beats_per_round),
            &beats_per_round,
            |b, &rounds| {
                b.iter(|| {
                    timer.fire_rounds(rounds);
                    black_box(session.current_beat());
                });
            },
        );
    }
    group.finish();
}

/// Benchmark the tap estimator's buffer handling
fn bench_tap_estimation(c: &mut Criterion) {
    c.bench_function("tap_register", |b| {
        let mut tap = TapTempo::new();
        let mut now = 0u64;

        b.iter(|| {
            now += 500;
            black_box(tap.register(now));
        });
    });
}

/// Benchmark ramp stepping over a long progressive run
fn bench_ramp_steps(c: &mut Criterion) {
    c.bench_function("ramp_measure_complete", |b| {
        let plan = RampPlan::new(60.0, 240.0, ProgressionStep::Bpm(1.0), 2).unwrap();
        let mut ramp = TempoRamp::new(plan);

        b.iter(|| {
            black_box(ramp.on_measure_complete());
        });
    });
}

criterion_group!(
    benches,
    bench_tick_processing,
    bench_tap_estimation,
    bench_ramp_steps
);
criterion_main!(benches);
