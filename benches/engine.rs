//! Per-frame cost of the PredictK engine.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use hdr_predict::capture::{SourceConfig, StatsSource, SyntheticSource};
use hdr_predict::engine::PredictEngine;
use hdr_predict::extraction::ExposureFrameCount;

fn bench_process(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine_process");

    for count in [
        ExposureFrameCount::Linear,
        ExposureFrameCount::Hdr2,
        ExposureFrameCount::Hdr3,
    ] {
        let mut source = SyntheticSource::new();
        source
            .open(&SourceConfig {
                step_frame: 8,
                ..SourceConfig::with_frame_count(count)
            })
            .expect("valid source config");
        let frames: Vec<_> = (0..64)
            .map(|_| source.capture().expect("source is open"))
            .collect();

        group.bench_with_input(BenchmarkId::from_parameter(count), &frames, |b, frames| {
            let mut engine = PredictEngine::default();
            b.iter(|| {
                for frame in frames {
                    black_box(engine.process(black_box(frame)));
                }
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_process);
criterion_main!(benches);
