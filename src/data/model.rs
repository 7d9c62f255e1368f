// ---------------------------------------------------------------------------
// Spectrum – one parsed two-column file
// ---------------------------------------------------------------------------

/// Intensity versus spectral unit (wavelength in nm or Raman shift in cm⁻¹).
///
/// `x` is usually monotonic but this is not enforced.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Spectrum {
    /// Spectral axis (x).
    pub x: Vec<f64>,
    /// Intensity axis (y) – same length as `x`.
    pub y: Vec<f64>,
}

impl Spectrum {
    pub fn new(x: Vec<f64>, y: Vec<f64>) -> Self {
        debug_assert_eq!(x.len(), y.len());
        Spectrum { x, y }
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Same grid, new intensities.
    pub fn with_y(&self, y: Vec<f64>) -> Self {
        Spectrum {
            x: self.x.clone(),
            y,
        }
    }

    /// Minimum and maximum of `y` (`(inf, -inf)` when empty).
    pub fn y_range(&self) -> (f64, f64) {
        let min = self.y.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = self.y.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        (min, max)
    }

    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.x.iter().copied().zip(self.y.iter().copied())
    }
}
