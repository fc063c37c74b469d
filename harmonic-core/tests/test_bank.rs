use harmonic_core::bank::{Apply, HarmonicBank, MarketSample};
use harmonic_core::params::{WaveParams, EpicycleParams, MAX_HARMONICS};
use harmonic_core::{epicycle, waveform};
use rand::{Rng, SeedableRng};

fn approx_eq(a: f64, b: f64, eps: f64) -> bool {
    (a - b).abs() <= eps
}

#[test]
fn test_smoothing_converges_geometrically() {
    let mut rng = rand::rngs::StdRng::seed_from_u64(7);
    for _ in 0..200 {
        let v0: f64 = rng.gen_range(-100.0..100.0);
        let target: f64 = rng.gen_range(-100.0..100.0);
        let f: f64 = rng.gen_range(0.01..0.99);
        let i = rng.gen_range(0..MAX_HARMONICS);

        let mut bank = HarmonicBank::new();
        bank.set_immediate(i, v0, v0).expect("slot");
        bank.set_target(i, target, target).expect("slot");

        let initial = (v0 - target).abs();
        let mut prev = initial;
        for k in 1..=40 {
            bank.step(f);
            let slot = *bank.slot(i).expect("slot");
            let err = (slot.amplitude - target).abs();
            let expected = initial * (1.0 - f).powi(k);
            assert!(
                approx_eq(err, expected, 1e-9 * initial.max(1.0)),
                "k={k} f={f}: {err} vs {expected}"
            );
            assert!(err <= prev + 1e-12);
            assert!(approx_eq(slot.phase, slot.amplitude, 1e-9));
            prev = err;
        }
    }
}

#[test]
fn test_reference_lerp_reaches_target() {
    let mut bank = HarmonicBank::new();
    bank.set_target(0, 50.0, 1.0).expect("slot");
    // Three seconds at 60 Hz leaves 0.94^180 (about 1.5e-5) of the gap.
    for _ in 0..180 {
        bank.step(0.06);
    }
    let slot = bank.slot(0).expect("slot");
    assert!((slot.amplitude - 50.0).abs() < 0.01);
    assert!((slot.phase - 1.0).abs() < 0.001);
}

#[test]
fn test_invalid_lerp_uses_default() {
    let mut a = HarmonicBank::new();
    let mut b = HarmonicBank::new();
    a.set_target(2, 10.0, 0.0).expect("slot");
    b.set_target(2, 10.0, 0.0).expect("slot");
    a.step(f64::NAN);
    b.step(0.06);
    assert_eq!(a, b);
    a.step(1.5);
    b.step(0.06);
    assert_eq!(a, b);
}

#[test]
fn test_resize_leaves_prefix_untouched() {
    let mut rng = rand::rngs::StdRng::seed_from_u64(99);
    let mut bank = HarmonicBank::new();
    let amps: Vec<f64> = (0..MAX_HARMONICS).map(|_| rng.gen_range(-100.0..100.0)).collect();
    let phases: Vec<f64> = (0..MAX_HARMONICS).map(|_| rng.gen_range(0.0..6.28)).collect();
    bank.load(&amps, &phases, Apply::Instant);

    for (n, k) in [(1, 5), (10, 20), (30, 30), (59, 1)] {
        bank.set_active_count(n);
        let before: Vec<(u64, u64)> = bank
            .active_slots()
            .iter()
            .map(|s| (s.amplitude.to_bits(), s.phase.to_bits()))
            .collect();

        bank.set_active_count(n + k);
        let wave = waveform::synthesize(&bank, 0.4, &WaveParams::default());
        let chain = epicycle::synthesize_for_wave(&bank, 0.4, &WaveParams::default(), &EpicycleParams::default());
        assert_eq!(wave.harmonics.len(), n + k);
        assert_eq!(chain.len(), n + k);
        bank.set_active_count(n);

        let after: Vec<(u64, u64)> = bank
            .active_slots()
            .iter()
            .map(|s| (s.amplitude.to_bits(), s.phase.to_bits()))
            .collect();
        assert_eq!(before, after);
    }
}

#[test]
fn test_market_sample_round_trips_through_json() {
    let sample = MarketSample {
        harmonics: vec![1.5; MAX_HARMONICS],
        phases: vec![-0.5; MAX_HARMONICS],
        market_time: "13:30:00".to_string(),
    };
    let json = serde_json::to_string(&sample).expect("serialize");
    assert!(json.contains("\"marketTime\":\"13:30:00\""));
    let back: MarketSample = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(back, sample);

    let legacy: MarketSample =
        serde_json::from_str(r#"{"harmonics":[1,2],"phases":[0,0]}"#).expect("deserialize");
    assert_eq!(legacy.market_time, "");

    let mut bank = HarmonicBank::new();
    bank.apply_sample(&legacy, Apply::Smoothed);
    assert_eq!(bank.target_amplitudes()[1], 2.0);
    assert_eq!(bank.amplitudes()[1], 0.0);
}
