use std::f64::consts::PI;

use harmonic_core::bank::{Apply, HarmonicBank};
use harmonic_core::presets::{self, WavePreset};

#[test]
fn test_square_series_closed_form() {
    for scale in [1.0, 45.0, 67.0, -3.5] {
        let (amps, phases) = WavePreset::Square.generate(scale);
        assert_eq!(amps.len(), 60);
        for n in 1..=60usize {
            let a = amps[n - 1];
            if n % 2 == 0 {
                assert_eq!(a, 0.0, "even harmonic {n}");
            } else {
                let expected = scale * 4.0 / (n as f64 * PI);
                assert!((a - expected).abs() < 1e-12, "harmonic {n}");
            }
        }
        assert!(phases.iter().all(|p| *p == 0.0));
    }
}

#[test]
fn test_named_generate_matches_enum() {
    for preset in WavePreset::ALL {
        let by_name = presets::generate(preset.name(), 45.0).expect("known preset");
        assert_eq!(by_name, preset.generate(45.0));
    }
    assert!(presets::generate("noise", 1.0).is_err());
}

#[test]
fn test_instant_and_smoothed_application() {
    let mut bank = HarmonicBank::new();
    WavePreset::Triangle.apply(&mut bank, 45.0, Apply::Instant);
    assert_eq!(bank.amplitudes(), bank.target_amplitudes());

    WavePreset::Sawtooth.apply(&mut bank, 45.0, Apply::Smoothed);
    let (saw, _) = WavePreset::Sawtooth.generate(45.0);
    assert_eq!(bank.target_amplitudes(), saw);
    assert_ne!(bank.amplitudes(), saw);
    // Triangle's even harmonics are zero, sawtooth's are not.
    assert_eq!(bank.amplitudes()[1], 0.0);
}
