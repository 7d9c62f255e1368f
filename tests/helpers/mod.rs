use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use pressure_gauge::fit::profiles::{gaussian, voigt, voigt_profile};
use pressure_gauge::Spectrum;

static TEMP_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Unique path in the system temp directory; the file is not created.
#[allow(dead_code)]
pub fn temp_path(name: &str) -> PathBuf {
    let n = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!("pgauge-{}-{n}-{name}", std::process::id()))
}

/// Unique empty directory in the system temp directory.
#[allow(dead_code)]
pub fn temp_dir(name: &str) -> PathBuf {
    let dir = temp_path(name);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[allow(dead_code)]
pub fn linspace(from: f64, to: f64, n: usize) -> Vec<f64> {
    if n <= 1 {
        return vec![from];
    }
    (0..n)
        .map(|i| from + (to - from) * (i as f64) / ((n - 1) as f64))
        .collect()
}

/// Deterministic pseudo-noise in [-1, 1].
#[allow(dead_code)]
pub fn jitter(i: usize) -> f64 {
    let mut x = (i as u32).wrapping_mul(1664525).wrapping_add(1013904223);
    x ^= x << 13;
    x ^= x >> 17;
    x ^= x << 5;
    (x as f64 / u32::MAX as f64) * 2.0 - 1.0
}

/// Baseline plus Voigt lobes given as `(center, height)`, all with the same
/// widths.
#[allow(dead_code)]
pub fn voigt_lines(
    x: &[f64],
    lines: &[(f64, f64)],
    sigma: f64,
    gamma: f64,
    baseline: f64,
    noise: f64,
) -> Spectrum {
    let peak = voigt_profile(0.0, sigma, gamma);
    let y = x
        .iter()
        .enumerate()
        .map(|(i, &xi)| {
            let signal: f64 = lines
                .iter()
                .map(|&(c, h)| voigt(xi, h / peak, c, sigma, gamma))
                .sum();
            baseline + signal + noise * jitter(i)
        })
        .collect();
    Spectrum::new(x.to_vec(), y)
}

/// Baseline plus Gaussian lobes given as `(center, height)`.
#[allow(dead_code)]
pub fn gaussian_lines(x: &[f64], lines: &[(f64, f64)], sigma: f64, baseline: f64) -> Spectrum {
    let y = x
        .iter()
        .map(|&xi| {
            baseline
                + lines
                    .iter()
                    .map(|&(c, h)| gaussian(xi, h, c, sigma))
                    .sum::<f64>()
        })
        .collect();
    Spectrum::new(x.to_vec(), y)
}

#[allow(dead_code)]
pub fn assert_close(a: f64, b: f64, tol: f64) {
    let diff = (a - b).abs();
    assert!(diff <= tol, "got {a}, expected {b}, diff {diff} > tol {tol}");
}
