// ---------------------------------------------------------------------------
// 1-D signal helpers used by the correction pipeline and the fit engine
// ---------------------------------------------------------------------------

/// Centered moving average of `window` samples with "nearest" edge padding
/// (the boundary sample is repeated instead of zero-padding).
///
/// For even windows the extra sample lies on the left, i.e. sample `i`
/// averages `y[i - window/2 ..= i - window/2 + window - 1]`.
pub fn moving_average(y: &[f64], window: usize) -> Vec<f64> {
    let n = y.len();
    if n == 0 || window <= 1 {
        return y.to_vec();
    }
    let half = (window / 2) as isize;
    let last = (n - 1) as isize;
    let at = |k: isize| y[k.clamp(0, last) as usize];

    (0..n as isize)
        .map(|i| {
            let start = i - half;
            let sum: f64 = (start..start + window as isize).map(at).sum();
            sum / window as f64
        })
        .collect()
}

/// Numerical gradient with unit sample spacing: central differences inside,
/// one-sided differences at both ends.
pub fn gradient(y: &[f64]) -> Vec<f64> {
    let n = y.len();
    if n < 2 {
        return vec![0.0; n];
    }
    let mut g = Vec::with_capacity(n);
    g.push(y[1] - y[0]);
    for i in 1..n - 1 {
        g.push((y[i + 1] - y[i - 1]) / 2.0);
    }
    g.push(y[n - 1] - y[n - 2]);
    g
}

/// Index of the first minimum, `None` for empty input.
pub fn argmin(v: &[f64]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, &vi) in v.iter().enumerate() {
        match best {
            Some(b) if v[b] <= vi => {}
            _ if vi.is_nan() => {}
            _ => best = Some(i),
        }
    }
    best
}

/// Piecewise-linear interpolation of `(xp, fp)` at `x`; `xp` must be
/// increasing. Outside the range the end values are held constant.
pub fn interp(x: f64, xp: &[f64], fp: &[f64]) -> f64 {
    let n = xp.len();
    debug_assert!(n > 0 && n == fp.len());
    if x <= xp[0] {
        return fp[0];
    }
    if x >= xp[n - 1] {
        return fp[n - 1];
    }
    // last j with xp[j] <= x
    let j = xp.partition_point(|&v| v <= x) - 1;
    let slope = (fp[j + 1] - fp[j]) / (xp[j + 1] - xp[j]);
    slope * (x - xp[j]) + fp[j]
}
