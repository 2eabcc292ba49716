//! Timing side-channel validation for tag comparison.
//!
//! Uses Welch's t-test to check that [`constant_time_eq`] takes the same
//! time whether two 32-byte tags are equal or differ in their first byte.
//! A |t| above 4.5 would suggest timing leakage at >99.999% confidence.
//!
//! This is a statistical test; scheduler noise can in rare cases push it
//! over the threshold. Samples are interleaved to cancel out drift.

use std::time::Instant;

use crypt_argon2::constant_time_eq;

/// Number of timing samples per class.
const SAMPLES: usize = 10_000;

/// Welch's t-test threshold.
const T_THRESHOLD: f64 = 4.5;

#[inline(never)]
fn black_box_compare(a: &[u8], b: &[u8]) -> bool {
    std::hint::black_box(constant_time_eq(
        std::hint::black_box(a),
        std::hint::black_box(b),
    ))
}

/// `t = (mean_a - mean_b) / sqrt(var_a/n_a + var_b/n_b)`
#[allow(clippy::cast_precision_loss)]
fn welch_t_statistic(a: &[f64], b: &[f64]) -> f64 {
    if a.len() < 2 || b.len() < 2 {
        return f64::NAN;
    }

    let n_a = a.len() as f64;
    let n_b = b.len() as f64;

    let mean_a: f64 = a.iter().sum::<f64>() / n_a;
    let mean_b: f64 = b.iter().sum::<f64>() / n_b;

    let var_a: f64 = a.iter().map(|x| (x - mean_a).powi(2)).sum::<f64>() / (n_a - 1.0);
    let var_b: f64 = b.iter().map(|x| (x - mean_b).powi(2)).sum::<f64>() / (n_b - 1.0);

    let denominator = (var_a / n_a + var_b / n_b).sqrt();
    if denominator == 0.0 {
        return 0.0;
    }

    (mean_a - mean_b) / denominator
}

#[test]
fn constant_time_eq_no_timing_leak() {
    let stored = [0x5Cu8; 32];
    let matching = stored;
    let mut early_mismatch = stored;
    early_mismatch[0] ^= 0xFF;

    for _ in 0..100 {
        black_box_compare(&stored, &matching);
        black_box_compare(&stored, &early_mismatch);
    }

    let mut times_a = Vec::with_capacity(SAMPLES);
    let mut times_b = Vec::with_capacity(SAMPLES);

    for _ in 0..SAMPLES {
        let start = Instant::now();
        let _ = black_box_compare(&stored, &matching);
        let elapsed_a = start.elapsed().as_nanos();

        let start = Instant::now();
        let _ = black_box_compare(&stored, &early_mismatch);
        let elapsed_b = start.elapsed().as_nanos();

        #[allow(clippy::cast_precision_loss)]
        {
            times_a.push(elapsed_a as f64);
            times_b.push(elapsed_b as f64);
        }
    }

    let abs_t = welch_t_statistic(&times_a, &times_b).abs();

    eprintln!(
        "Timing side-channel test: |t| = {abs_t:.2} (threshold: {T_THRESHOLD}), \
         samples = {SAMPLES} per class"
    );

    assert!(
        abs_t < T_THRESHOLD,
        "Timing side-channel detected: |t| = {abs_t:.2} exceeds threshold {T_THRESHOLD}. \
         constant_time_eq leaks whether tags match."
    );
}

#[test]
fn welch_t_statistic_sanity() {
    let same = vec![1.0; 100];
    assert_eq!(welch_t_statistic(&same, &same), 0.0);

    let a: Vec<f64> = (0..100).map(f64::from).collect();
    let b: Vec<f64> = (0..100).map(|x| f64::from(x) + 1000.0).collect();
    assert!(welch_t_statistic(&a, &b).abs() > T_THRESHOLD);

    assert!(welch_t_statistic(&[1.0], &[2.0]).is_nan());
}
