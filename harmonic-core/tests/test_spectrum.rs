use std::f64::consts::TAU;

use harmonic_core::analyzer::SpectrumAnalyzer;
use harmonic_core::bank::HarmonicBank;
use harmonic_core::params::SpectrumParams;
use harmonic_core::spectrum::{band_weight, SpectrumInput, SpectrumMapper};

#[test]
fn test_full_scale_bytes_hit_weighted_ceiling() {
    let mapper = SpectrumMapper::default();
    let bins = [255u8; 64];
    for count in [1usize, 3, 10, 37, 60] {
        for sensitivity in [0.35, 1.0, 2.5] {
            let frame = mapper.map(Some(SpectrumInput::Bytes(&bins)), count, sensitivity);
            assert_eq!(frame.targets.len(), count);
            for (i, t) in frame.targets.iter().enumerate() {
                let expected = 100.0 * sensitivity * band_weight(i, count);
                assert!(t.amplitude.is_finite());
                assert!((t.amplitude - expected).abs() < 1e-9, "i={i} count={count}");
            }
        }
    }
}

#[test]
fn test_full_scale_decibels_hit_weighted_ceiling() {
    let mapper = SpectrumMapper::default();
    let values = [-30.0f32; 64];
    let frame = mapper.map(
        Some(SpectrumInput::Decibels {
            values: &values,
            min_db: -100.0,
            max_db: -30.0,
        }),
        10,
        1.0,
    );
    for (i, t) in frame.targets.iter().enumerate() {
        assert!((t.amplitude - 100.0 * band_weight(i, 10)).abs() < 1e-9);
    }
}

#[test]
fn test_silence_maps_to_zero() {
    let mapper = SpectrumMapper::default();
    let bins = [0u8; 64];
    let frame = mapper.map(Some(SpectrumInput::Bytes(&bins)), 10, 1.0);
    assert!(frame.targets.iter().all(|t| t.amplitude == 0.0 && t.phase_jitter == 0.0));
    assert_eq!(frame.aggregate_energy, 0.0);
    assert!(frame.beat.is_none());

    let floor = [f32::NEG_INFINITY; 64];
    let frame = mapper.map(
        Some(SpectrumInput::Decibels {
            values: &floor,
            min_db: -100.0,
            max_db: -30.0,
        }),
        10,
        1.0,
    );
    assert!(frame.targets.iter().all(|t| t.amplitude == 0.0));
}

#[test]
fn test_beat_threshold() {
    let mapper = SpectrumMapper::default();
    let quiet = [150u8; 64];
    assert!(mapper.map(Some(SpectrumInput::Bytes(&quiet)), 10, 1.0).beat.is_none());

    let loud = [204u8; 64];
    let beat = mapper
        .map(Some(SpectrumInput::Bytes(&loud)), 10, 1.0)
        .beat
        .expect("beat");
    assert!((beat.strength - 0.8).abs() < 1e-12);
}

#[test]
fn test_custom_thresholds() {
    let mapper = SpectrumMapper::new(SpectrumParams {
        beat_threshold: 10.0,
        high_energy_threshold: 200.0,
        ..SpectrumParams::default()
    });
    let bins = [100u8; 64];
    let frame = mapper.map(Some(SpectrumInput::Bytes(&bins)), 4, 1.0);
    assert!(frame.beat.is_some());
    assert!(frame.targets.iter().all(|t| t.phase_jitter == 0.0));
}

#[test]
fn test_jitter_moves_current_phase_only() {
    let mapper = SpectrumMapper::default();
    let mut bank = HarmonicBank::new();
    bank.set_active_count(4);
    bank.set_immediate(2, 5.0, 1.0).expect("slot");
    let bins = [255u8; 64];
    let frame = mapper.map(Some(SpectrumInput::Bytes(&bins)), 4, 1.0);
    frame.apply_to(&mut bank);

    let slot = bank.slot(2).expect("slot");
    assert!((slot.phase - 1.1).abs() < 1e-12);
    assert_eq!(slot.target_phase, 1.0);
    assert!((slot.target_amplitude - 100.0).abs() < 1e-12);
    assert_eq!(slot.amplitude, 5.0);
    // Inactive slots are left alone.
    assert_eq!(bank.slot(4).expect("slot").target_amplitude, 0.0);
}

#[test]
fn test_analyzer_feeds_mapper() {
    let mut analyzer = SpectrumAnalyzer::default();
    let mapper = SpectrumMapper::default();

    let silent = mapper.map(Some(SpectrumInput::Bytes(analyzer.process(&[0.0; 512]))), 10, 1.0);
    assert_eq!(silent.aggregate_energy, 0.0);

    // A loud bass tone lands in the first harmonic's bin group.
    let pcm: Vec<f32> = (0..128)
        .map(|n| (0.9 * (TAU * 2.0 * n as f64 / 128.0).sin()) as f32)
        .collect();
    for _ in 0..20 {
        analyzer.process(&pcm);
    }
    let frame = mapper.map(Some(analyzer.byte_input()), 10, 1.0);
    let first = frame.targets[0].amplitude;
    assert!(first > 0.0);
    assert!(frame.targets[9].amplitude < first);

    let from_db = mapper.map(Some(analyzer.decibel_input()), 10, 1.0);
    assert!(from_db.targets[0].amplitude > 0.0);
}
