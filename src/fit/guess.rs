//! Starting values for the peak models.

use crate::config::FitSettings;
use crate::error::{Error, Result};

use super::models::PeakModel;

// ---------------------------------------------------------------------------
// Lobe layout
// ---------------------------------------------------------------------------

/// How a flat parameter vector splits into lobes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LobeLayout {
    pub params_per_lobe: usize,
    pub lobes: usize,
}

/// Classify a model by its parameter count: one baseline term followed by
/// lobes of 3 (amplitude, center, width) or 4 (amplitude, center, width,
/// shape) parameters. The 3-parameter reading wins when both divide.
pub fn lobe_layout(n_params: usize) -> Option<LobeLayout> {
    if n_params < 2 {
        return None;
    }
    let free = n_params - 1;
    if free % 3 == 0 {
        Some(LobeLayout {
            params_per_lobe: 3,
            lobes: free / 3,
        })
    } else if free % 4 == 0 {
        Some(LobeLayout {
            params_per_lobe: 4,
            lobes: free / 4,
        })
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// Peak detection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectedPeak {
    pub index: usize,
    pub height: f64,
    pub prominence: f64,
    /// Width at half prominence, in samples.
    pub width: f64,
}

/// Local maxima; a flat top reports its middle sample (left one on ties).
fn local_maxima(y: &[f64]) -> Vec<usize> {
    let mut peaks = Vec::new();
    if y.len() < 3 {
        return peaks;
    }
    let i_max = y.len() - 1;
    let mut i = 1;
    while i < i_max {
        if y[i - 1] < y[i] {
            let mut ahead = i + 1;
            while ahead < i_max && y[ahead] == y[i] {
                ahead += 1;
            }
            if y[ahead] < y[i] {
                peaks.push((i + ahead - 1) / 2);
                i = ahead;
            }
        }
        i += 1;
    }
    peaks
}

/// Prominence and the bases on each side.
fn prominence(y: &[f64], peak: usize) -> (f64, usize, usize) {
    let top = y[peak];

    let mut left_min = top;
    let mut left_base = peak;
    let mut i = peak as isize;
    while i >= 0 && y[i as usize] <= top {
        if y[i as usize] < left_min {
            left_min = y[i as usize];
            left_base = i as usize;
        }
        i -= 1;
    }

    let mut right_min = top;
    let mut right_base = peak;
    let mut j = peak;
    while j < y.len() && y[j] <= top {
        if y[j] < right_min {
            right_min = y[j];
            right_base = j;
        }
        j += 1;
    }

    (top - left_min.max(right_min), left_base, right_base)
}

/// Width, in samples, at half the prominence, with linear interpolation
/// between the bracketing samples.
fn half_prominence_width(
    y: &[f64],
    peak: usize,
    prominence: f64,
    left_base: usize,
    right_base: usize,
) -> f64 {
    let level = y[peak] - prominence * 0.5;

    let mut i = peak;
    while left_base < i && level < y[i] {
        i -= 1;
    }
    let mut left = i as f64;
    if y[i] < level {
        left += (level - y[i]) / (y[i + 1] - y[i]);
    }

    let mut j = peak;
    while j < right_base && level < y[j] {
        j += 1;
    }
    let mut right = j as f64;
    if y[j] < level {
        right -= (level - y[j]) / (y[j - 1] - y[j]);
    }

    right - left
}

/// Maxima at least `min_height` high and `min_width` samples wide, in
/// sample order.
pub fn find_peaks(y: &[f64], min_height: f64, min_width: f64) -> Vec<DetectedPeak> {
    local_maxima(y)
        .into_iter()
        .filter(|&p| y[p] >= min_height)
        .filter_map(|p| {
            let (prom, lb, rb) = prominence(y, p);
            let width = half_prominence_width(y, p, prom, lb, rb);
            (width >= min_width).then_some(DetectedPeak {
                index: p,
                height: y[p],
                prominence: prom,
                width,
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Initial guess
// ---------------------------------------------------------------------------

/// Starting parameter vector for `model` on `(x, y)`.
///
/// Without `guess_peak`, lobes are seeded on the detected peaks taken by
/// ascending height. With it, lobe `i` starts at
/// `guess_peak - lobe_offset * i` with fixed width seeds.
pub fn initial_guess(
    model: &PeakModel,
    x: &[f64],
    y: &[f64],
    guess_peak: Option<f64>,
    settings: &FitSettings,
) -> Result<Vec<f64>> {
    let layout = lobe_layout(model.n_params()).ok_or_else(|| {
        Error::Validation(format!(
            "{} parameters do not split into 3- or 4-parameter lobes",
            model.n_params()
        ))
    })?;
    if x.len() < 2 || x.len() != y.len() {
        return Err(Error::Validation(
            "need at least two samples with matching x and y".into(),
        ));
    }

    let mut pinit = Vec::with_capacity(model.n_params());
    pinit.push(y[0]);

    match guess_peak {
        Some(guess) => {
            for i in 0..layout.lobes {
                pinit.push(settings.amplitude_seed);
                pinit.push(guess - settings.lobe_offset * i as f64);
                if layout.params_per_lobe == 3 {
                    pinit.push(settings.width_seed);
                } else {
                    pinit.push(settings.voigt_width_seed);
                    pinit.push(settings.voigt_width_seed);
                }
            }
        }
        None => {
            let dx = x[1] - x[0];
            let min = y.iter().cloned().fold(f64::INFINITY, f64::min);
            let max = y.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            let shifted: Vec<f64> = y.iter().map(|v| v - min).collect();

            let mut peaks = find_peaks(&shifted, (max - min) / 2.0, settings.min_peak_width / dx);
            peaks.sort_by(|a, b| a.height.total_cmp(&b.height));
            log::debug!("Detected {} peak(s) for {} lobe(s)", peaks.len(), layout.lobes);

            if peaks.len() < layout.lobes {
                return Err(Error::FitConvergence(format!(
                    "found {} peak(s) but the model has {} lobe(s)",
                    peaks.len(),
                    layout.lobes
                )));
            }
            for peak in peaks.iter().take(layout.lobes) {
                let width = peak.width * dx;
                pinit.push(settings.amplitude_seed);
                pinit.push(x[peak.index]);
                if layout.params_per_lobe == 3 {
                    pinit.push(width);
                } else {
                    pinit.push(width / 2.0);
                    pinit.push(width / 2.0);
                }
            }
        }
    }
    Ok(pinit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plateau_reports_middle() {
        assert_eq!(local_maxima(&[0.0, 1.0, 1.0, 1.0, 0.0]), vec![2]);
        assert_eq!(local_maxima(&[0.0, 1.0, 1.0, 0.0]), vec![1]);
        // rising edge at the end is not a peak
        assert!(local_maxima(&[0.0, 1.0, 2.0]).is_empty());
    }

    #[test]
    fn triangle_width() {
        let y = [0.0, 1.0, 2.0, 3.0, 4.0, 3.0, 2.0, 1.0, 0.0];
        let (prom, lb, rb) = prominence(&y, 4);
        assert_eq!((prom, lb, rb), (4.0, 0, 8));
        assert_eq!(half_prominence_width(&y, 4, prom, lb, rb), 4.0);
    }

    #[test]
    fn height_filter() {
        let y = [0.0, 1.0, 0.0, 5.0, 0.0];
        let peaks = find_peaks(&y, 2.5, 0.0);
        assert_eq!(peaks.len(), 1);
        assert_eq!(peaks[0].index, 3);
    }

    #[test]
    fn layout_of_registry_sizes() {
        assert_eq!(lobe_layout(4), Some(LobeLayout { params_per_lobe: 3, lobes: 1 }));
        assert_eq!(lobe_layout(5), Some(LobeLayout { params_per_lobe: 4, lobes: 1 }));
        assert_eq!(lobe_layout(6), None);
        assert_eq!(lobe_layout(1), None);
    }
}
