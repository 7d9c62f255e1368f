//! Line shapes used by the peak models.

use std::f64::consts::{PI, SQRT_2};

use num_complex::Complex64;

/// Unnormalized Gaussian lobe of height `a`.
pub fn gaussian(x: f64, a: f64, center: f64, sigma: f64) -> f64 {
    a * (-(x - center).powf(2.0) / (2.0 * sigma.powf(2.0))).exp()
}

/// Lorentzian lobe with full width `gamma`, area `a`.
pub fn lorentzian(x: f64, a: f64, center: f64, gamma: f64) -> f64 {
    a * (2.0 / (PI * gamma)) / (1.0 + ((x - center) / (gamma / 2.0)).powf(2.0))
}

/// Voigt lobe of area `a`.
pub fn voigt(x: f64, a: f64, center: f64, sigma: f64, gamma: f64) -> f64 {
    a * voigt_profile(x - center, sigma, gamma)
}

/// Area-normalized Voigt profile: a Gaussian of standard deviation `sigma`
/// convolved with a Lorentzian of half width `gamma`. Signs of the widths
/// are ignored.
pub fn voigt_profile(x: f64, sigma: f64, gamma: f64) -> f64 {
    let sigma = sigma.abs();
    let gamma = gamma.abs();
    if sigma == 0.0 && gamma == 0.0 {
        return if x == 0.0 { f64::INFINITY } else { 0.0 };
    }
    if sigma == 0.0 {
        return gamma / (PI * (x * x + gamma * gamma));
    }
    if gamma == 0.0 {
        return (-x * x / (2.0 * sigma * sigma)).exp() / (sigma * (2.0 * PI).sqrt());
    }
    let z = Complex64::new(x, gamma) / (sigma * SQRT_2);
    faddeeva(z).re / (sigma * (2.0 * PI).sqrt())
}

// ---------------------------------------------------------------------------
// Faddeeva function
// ---------------------------------------------------------------------------

/// `sqrt(N / sqrt(2))` for the N = 32 expansion below.
const WEIDEMAN_L: f64 = 4.756828460010884;

/// Coefficients `a_1 ..= a_32` of Weideman's rational expansion,
/// `a_n = (1/2M) * sum_k exp(-t_k²) (L² + t_k²) cos(π n k / M)` with
/// `M = 64` and `t_k = L tan(kπ / 2M)`.
const WEIDEMAN_COEFS: [f64; 32] = [
    2.57225340812457,
    2.263537299900269,
    1.8256696296324813,
    1.345544169234545,
    0.9019254893647999,
    0.5460139720639343,
    0.29544451071508715,
    0.1406071622689377,
    0.05730440352983722,
    0.019006155784845536,
    0.004519541105349328,
    0.0003925913607006394,
    -0.00024532980270016835,
    -0.00013075449254618495,
    -2.1409619201886896e-05,
    6.821031944020333e-06,
    4.401531731625022e-06,
    4.255833137845383e-07,
    -4.184076369525317e-07,
    -1.4813078903939285e-07,
    2.2930439067117877e-08,
    2.3797556760888532e-08,
    8.124887372907027e-10,
    -3.2080153655251966e-09,
    -5.231020960123722e-10,
    4.1537408965987016e-10,
    1.165826359434604e-10,
    -5.5442430194491454e-11,
    -2.1543875399305303e-11,
    8.030083347237299e-12,
    3.740821761309386e-12,
    -1.3034837519469384e-12,
];

/// Faddeeva function `w(z) = exp(-z²) erfc(-iz)` for `Im z >= 0`.
///
/// Weideman, SIAM J. Numer. Anal. 31, 1497 (1994), with 32 terms: relative
/// error below 1e-12 over the upper half plane.
pub fn faddeeva(z: Complex64) -> Complex64 {
    let z = Complex64::new(z.re, z.im.max(0.0));
    let i = Complex64::i();
    let denom = WEIDEMAN_L - i * z;
    let big_z = (WEIDEMAN_L + i * z) / denom;
    let p = WEIDEMAN_COEFS
        .iter()
        .rev()
        .fold(Complex64::new(0.0, 0.0), |acc, &a| acc * big_z + a);
    p * 2.0 / (denom * denom) + (1.0 / PI.sqrt()) / denom
}
