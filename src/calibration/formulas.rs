//! Published pressure scales, `P = f(x, T, x0, T0)` with P in GPa.
//!
//! Operator order follows the published expressions term by term; do not
//! refactor the arithmetic, low-order polynomials in these variables are
//! sensitive to it. The H₂ series is the exception: it is evaluated about
//! its center to avoid cancellation.

/// Ruby R1 line, Shen et al., High Press. Res. (2020),
/// doi:10.1080/08957959.2020.1791107, with the Datchi (2007) temperature
/// shift.
pub fn ruby_2020(l: f64, t: f64, l0: f64, t0: f64) -> f64 {
    let dt = t - t0;
    let dlcorr = 0.00746 * dt - 3.01e-6 * dt.powf(2.0) + 8.76e-9 * dt.powf(3.0);
    let dl = (l - dlcorr) - l0;
    1870.0 * dl / l0 * (1.0 + 5.63 * dl / l0)
}

/// Sm²⁺:SrB₄O₇ 0-0 line, Datchi et al. (1997); temperature shift only above
/// 500 K (Queyroux).
pub fn samarium_datchi_1997(l: f64, t: f64, l0: f64, _t0: f64) -> f64 {
    let dlcorr = if t >= 500.0 {
        1.06e-4 * (t - 500.0) + 1.5e-7 * (t - 500.0).powf(2.0)
    } else {
        0.0
    };
    let dl = (l - dlcorr) - l0;
    4.032 * dl * (1.0 + 9.29e-3 * dl) / (1.0 + 2.32e-2 * dl)
}

/// cBN TO Raman mode, Datchi et al., High Press. Res. 27, 447 (2007).
pub fn cbn_datchi_2007(nu: f64, t: f64, nu0: f64, t0: f64) -> f64 {
    // reference frequency at P = 0, T = 0 K
    let nu00 = nu0 + 0.0091 * t0 + 1.54e-5 * t0.powf(2.0);

    let nu0_t = nu00 - 0.0091 * t - 1.54e-5 * t.powf(2.0);
    let b0_t = 396.5 - 0.0288 * (t - 300.0) - 6.84e-6 * (t - 300.0).powf(2.0);
    let b0p = 3.62;
    (b0_t / b0p) * ((nu / nu0_t).powf(2.876) - 1.0)
}

/// Diamond Raman high-frequency edge, Akahama & Kawamura,
/// J. Appl. Phys. 100, 043516 (2006).
pub fn diamond_akahama_2006(nu: f64, _t: f64, nu0: f64, _t0: f64) -> f64 {
    let k0 = 547.0;
    let k0p = 3.75;
    let dnu = nu - nu0;
    k0 * (dnu / nu0) * (1.0 + 0.5 * (k0p - 1.0) * dnu / nu0)
}

/// Diamond Raman edge, Eremets et al., Nat. Commun. 14, 907 (2023).
pub fn diamond_eremets_2023(nu: f64, _t: f64, nu0: f64, _t0: f64) -> f64 {
    let a = 517.0;
    let b = 764.0;
    let dnu = nu - nu0;
    a * (dnu / nu0) + b * (dnu / nu0).powf(2.0)
}

/// Diamond Raman edge, Hilberer (2025) refit of the Akahama form.
pub fn diamond_hilberer_2025(nu: f64, _t: f64, nu0: f64, _t0: f64) -> f64 {
    let k0 = 576.521119539528;
    let k0p = 3.2571168198326683;
    let dnu = nu - nu0;
    k0 * (dnu / nu0) * (1.0 + 0.5 * (k0p - 1.0) * dnu / nu0)
}

/// Published fit, power-series coefficients in `nu` (cm⁻¹), lowest first.
const H2_VIBRON_COEFS: [f64; 6] = [
    -14536565712.17933,
    17309734.53397923,
    -8244.669967044751,
    1.963452944114722,
    -0.0002337933432834734,
    1.113520628648027e-08,
];

const H2_VIBRON_CENTER: f64 = 4200.0;

/// The same polynomial in `nu - H2_VIBRON_CENTER`, expanded in exact
/// arithmetic. Summing the published series directly cancels terms of order
/// 1e10 and leaves ~1e-5 GPa of jitter, enough to stall the inversion.
const H2_VIBRON_SHIFTED: [f64; 6] = [
    4.796965942807349,
    0.1750182597114815,
    0.0013092054251285987,
    -2.4834112511291397e-05,
    4.598873261228871e-08,
    1.113520628648027e-08,
];

/// H₂ vibron frequency fit, valid below about 30 GPa. Ignores the reference
/// state.
pub fn h2_vibron(nu: f64, _t: f64, _nu0: f64, _t0: f64) -> f64 {
    let t = nu - H2_VIBRON_CENTER;
    H2_VIBRON_SHIFTED
        .iter()
        .rev()
        .fold(0.0, |acc, c| c + acc * t)
}
