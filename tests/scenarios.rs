//! End-to-end scenarios through the extractors, calculator and engine.

use hdr_predict::analysis::{
    DrivingSource, PredictKCalculator, PredictKTuningParams, SceneStabilityDetector,
    StabilityConfig, Suppression,
};
use hdr_predict::capture::{
    ExposureDescriptor, FrameStats, GainTime, RawLumaStats, SessionFile, SourceConfig,
    StatsSource, SyntheticSource,
};
use hdr_predict::engine::PredictEngine;
use hdr_predict::extraction::{
    ExposureFrameCount, ExposureInfoExtractor, LumaStatsExtractor, ZONE_COUNT,
};

fn hdr2_exposure(long: f64, short: f64) -> ExposureDescriptor {
    ExposureDescriptor::hdr([
        GainTime::new(1.0, long),
        GainTime::new(1.0, short),
        GainTime::default(),
    ])
}

#[test]
fn hdr3_index_mapping() {
    let raw = RawLumaStats::uniform([100, 50, 10]);

    let luma = LumaStatsExtractor::new(1, 0.0).extract(&raw, &raw, ExposureFrameCount::Hdr3);

    assert_eq!(luma.current.long, [100.0; ZONE_COUNT]);
    assert_eq!(luma.current.mid, [50.0; ZONE_COUNT]);
    assert_eq!(luma.current.short, [10.0; ZONE_COUNT]);
}

#[test]
fn zero_current_luma_uses_unit_guard() {
    let current = RawLumaStats::uniform([0, 0, 0]);
    let next = RawLumaStats::uniform([5, 0, 0]);
    let luma = LumaStatsExtractor::new(1, 0.0).extract(&next, &current, ExposureFrameCount::Linear);

    let report = PredictKCalculator::default().evaluate(
        &luma,
        &Default::default(),
        ExposureFrameCount::Linear,
    );

    assert_eq!(report.ratios.short, 5.0);
    assert_eq!(report.driving_ratio, 5.0);
}

#[test]
fn restart_resets_stability_markers() {
    let mut detector = SceneStabilityDetector::new(StabilityConfig::default());
    let count = ExposureFrameCount::Hdr3;

    detector.update(10, count, &[0.0, 0.4, 0.0]);
    detector.update(11, count, &[0.0, 0.0, 0.0]);
    assert!(!detector.update(12, count, &[0.0, 0.4, 0.0]).stable);

    detector.update(0, count, &[0.0, 0.0, 0.0]);
    assert_eq!(detector.state().disturbance_start_frame, 0);
    assert_eq!(detector.state().disturbance_end_frame, 0);
    assert!(detector.update(1, count, &[0.0, 0.9, 0.0]).stable);
}

#[test]
fn unit_band_falls_back_to_short_ratio() {
    let current = RawLumaStats::uniform([100, 10, 0]);
    let next = RawLumaStats::uniform([100, 15, 0]);
    let luma = LumaStatsExtractor::new(1, 0.0).extract(&next, &current, ExposureFrameCount::Hdr2);
    let calc = PredictKCalculator::new(PredictKTuningParams {
        use_long_low_threshold: 1.0,
        use_long_high_threshold: 1.0,
        ..Default::default()
    });

    let report = calc.evaluate(&luma, &Default::default(), ExposureFrameCount::Hdr2);

    assert_eq!(report.ratios.long, 1.0);
    assert_eq!(report.driving_source, DrivingSource::Short);
    assert_eq!(report.driving_ratio, 1.5);
}

#[test]
fn unit_ratio_maps_to_zero() {
    let raw = RawLumaStats::uniform([64, 0, 0]);
    let luma = LumaStatsExtractor::new(1, 0.0).extract(&raw, &raw, ExposureFrameCount::Linear);
    let calc = PredictKCalculator::new(PredictKTuningParams {
        correction_factor: 1.0,
        correction_offset: 0.0,
        ..Default::default()
    });

    let report = calc.evaluate(&luma, &Default::default(), ExposureFrameCount::Linear);

    assert_eq!(report.raw_predict_k, 0.0);
    assert_eq!(report.value, 0);
}

#[test]
fn small_environment_change_is_gated() {
    // Luma per exposure moves by 0.3%, below the 0.5% gate.
    let current = RawLumaStats::uniform([1000, 0, 0]);
    let next = RawLumaStats::uniform([2006, 0, 0]);
    let luma = LumaStatsExtractor::new(1, 0.0).extract(&next, &current, ExposureFrameCount::Linear);
    let exposure = ExposureInfoExtractor::new().extract(
        &ExposureDescriptor::linear(GainTime::new(1.0, 100.0)),
        &ExposureDescriptor::linear(GainTime::new(1.0, 200.0)),
        ExposureFrameCount::Linear,
    );

    let report = PredictKCalculator::default().evaluate(&luma, &exposure, ExposureFrameCount::Linear);

    assert!((report.env_lv_change - 0.003).abs() < 1e-9);
    assert!(report.raw_predict_k > 1.0);
    assert_eq!(report.suppression, Some(Suppression::EnvironmentSteady));
    assert_eq!(report.value, 0);
}

#[test]
fn hdr2_long_swing_is_suppressed() {
    let stats = FrameStats {
        frame_id: 5,
        frame_count: ExposureFrameCount::Hdr2,
        current_luma: RawLumaStats::uniform([200, 40, 0]),
        next_luma: RawLumaStats::uniform([220, 40, 0]),
        current_exposure: hdr2_exposure(1000.0, 250.0),
        next_exposure: hdr2_exposure(1000.0, 250.0),
        deviation: [0.0; 3],
        pixels_per_zone: 1,
        black_level: 0.0,
    };
    let mut engine = PredictEngine::new(
        PredictKTuningParams {
            correction_factor: 1.0,
            correction_offset: 0.0,
            use_long_low_threshold: 0.9,
            use_long_high_threshold: 1.1,
            hdr3x_long_percent: 0.5,
        },
        StabilityConfig::default(),
    );

    let outcome = engine.process(&stats);
    let report = outcome.report.unwrap();

    assert!((report.driving_ratio - 1.1).abs() < 1e-12);
    assert!((report.raw_predict_k - 0.1375).abs() < 1e-3);
    assert!((report.env_lv_change - 0.1).abs() < 1e-12);
    assert_eq!(report.reference_delta, 20.0);
    assert_eq!(outcome.predict_k, 0);
    assert!(outcome.stable);
}

#[test]
fn synthetic_step_runs_full_cycle() {
    for count in [
        ExposureFrameCount::Linear,
        ExposureFrameCount::Hdr2,
        ExposureFrameCount::Hdr3,
    ] {
        let session = SessionFile {
            source: SourceConfig {
                step_frame: 5,
                ..SourceConfig::with_frame_count(count)
            },
            ..Default::default()
        };
        let mut source = SyntheticSource::new();
        source.open(&session.source).unwrap();
        let mut engine = PredictEngine::from_session(&session);

        let outcomes: Vec<_> = (0..60)
            .map(|_| engine.process(&source.capture().unwrap()))
            .collect();

        // Stable until the disturbance settles once
        assert!(outcomes[..6].iter().all(|o| o.stable), "count {count}");
        assert!(outcomes.iter().all(|o| o.report.is_some()));
        assert!(engine.detector().state().cycle_complete(), "count {count}");
        assert!(outcomes[59].stable);
        assert_eq!(engine.stats().frames, 60);
        assert_eq!(engine.stats().detector_resets, 1);
    }
}

#[test]
fn mode_switch_restarts_detector() {
    let mut engine = PredictEngine::default();
    let mut source = SyntheticSource::new();
    source
        .open(&SourceConfig::with_frame_count(ExposureFrameCount::Hdr2))
        .unwrap();

    let mut stats = source.capture().unwrap();
    engine.process(&stats);
    stats.frame_id = 1;
    stats.frame_count = ExposureFrameCount::Hdr3;

    let outcome = engine.process(&stats);

    assert!(outcome.stability.reset);
    assert_eq!(engine.stats().detector_resets, 2);
}
