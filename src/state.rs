use std::path::{Path, PathBuf};

use crate::calibration::Calibration;
use crate::config::{FitSettings, ParserSettings};
use crate::data::background::{convex_hull_background, InterpolatingSpline};
use crate::data::filter::{gradient, moving_average};
use crate::data::loader::parse_spectrum_file_with;
use crate::data::model::Spectrum;
use crate::error::{Error, Result};
use crate::fit::{self, FitModel, FitResult};
use crate::table::PressurePoint;

/// Highest spline degree used for hand-picked backgrounds.
const MAX_SPLINE_DEGREE: usize = 5;

// ---------------------------------------------------------------------------
// Spectrum buffer
// ---------------------------------------------------------------------------

/// One loaded spectrum and everything derived from it.
///
/// `original` never changes after loading. Every correction reads the
/// *active* data (corrected if present, normalized otherwise) and only
/// writes its results once they are fully computed, so a failed operation
/// leaves the buffer untouched.
#[derive(Debug, Clone)]
pub struct SpectrumBuffer {
    pub name: String,
    pub path: Option<PathBuf>,
    original: Spectrum,
    normalized: Spectrum,
    corrected: Option<Spectrum>,
    background: Option<Vec<f64>>,
    smoothing: usize,
    fit_model: Option<String>,
    fit_result: Option<FitResult>,
    fitted: Option<Spectrum>,
    feature: Option<f64>,
    point: Option<PressurePoint>,
}

impl SpectrumBuffer {
    pub fn load(path: &Path, settings: &ParserSettings) -> Result<Self> {
        let spectrum = parse_spectrum_file_with(path, settings)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let mut buffer = Self::from_spectrum(&name, spectrum)?;
        buffer.path = Some(path.to_path_buf());
        Ok(buffer)
    }

    pub fn from_spectrum(name: &str, spectrum: Spectrum) -> Result<Self> {
        if spectrum.x.len() != spectrum.y.len() {
            return Err(Error::Validation("x and y lengths differ".into()));
        }
        let mut buffer = SpectrumBuffer {
            name: name.to_string(),
            path: None,
            normalized: spectrum.clone(),
            original: spectrum,
            corrected: None,
            background: None,
            smoothing: 1,
            fit_model: None,
            fit_result: None,
            fitted: None,
            feature: None,
            point: None,
        };
        buffer.normalize()?;
        Ok(buffer)
    }

    /// Rebuild `normalized` from `original` as `y / max(y)`.
    ///
    /// The divisor is the maximum of the raw intensities, not of the
    /// min-shifted ones, so the minimum is generally not mapped to 0.
    pub fn normalize(&mut self) -> Result<()> {
        let (_, max) = self.original.y_range();
        if !max.is_finite() || max == 0.0 {
            return Err(Error::Validation(format!(
                "{}: cannot normalize by a maximum of {max}",
                self.name
            )));
        }
        let y = self.original.y.iter().map(|v| v / max).collect();
        self.normalized = self.original.with_y(y);
        Ok(())
    }

    pub fn original(&self) -> &Spectrum {
        &self.original
    }

    pub fn normalized(&self) -> &Spectrum {
        &self.normalized
    }

    pub fn corrected(&self) -> Option<&Spectrum> {
        self.corrected.as_ref()
    }

    pub fn background(&self) -> Option<&[f64]> {
        self.background.as_deref()
    }

    pub fn smoothing(&self) -> usize {
        self.smoothing
    }

    /// Data every correction and fit works on.
    pub fn active(&self) -> &Spectrum {
        self.corrected.as_ref().unwrap_or(&self.normalized)
    }

    // -- corrections --------------------------------------------------------

    /// Moving average of the *normalized* data; replaces any previous
    /// correction. A stored background survives and can still be subtracted.
    pub fn smoothen(&mut self, window: usize) -> Result<()> {
        if window == 0 {
            return Err(Error::Validation("smoothing window must be at least 1".into()));
        }
        let y = moving_average(&self.normalized.y, window);
        self.corrected = Some(self.normalized.with_y(y));
        self.smoothing = window;
        log::debug!("{}: smoothed with window {window}", self.name);
        Ok(())
    }

    /// Subtract a background running under the lower convex hull of the
    /// active data. Returns the anchor indices.
    pub fn convexhull_background(&mut self) -> Result<Vec<usize>> {
        let active = self.active();
        let (bg, anchors) = convex_hull_background(&active.x, &active.y)?;
        let y = active.y.iter().zip(&bg).map(|(v, b)| v - b).collect();
        let corrected = active.with_y(y);

        log::info!("{}: convex-hull background through {} anchors", self.name, anchors.len());
        self.corrected = Some(corrected);
        self.background = Some(bg);
        Ok(anchors)
    }

    /// Background from an interpolating spline of degree `min(n − 1, 5)`
    /// through hand-picked points, evaluated on the active grid. Does not
    /// subtract it; see [`SpectrumBuffer::subtract_background`].
    pub fn manual_background(&mut self, points: &[(f64, f64)]) -> Result<()> {
        if points.len() < 2 {
            return Err(Error::Geometry(format!(
                "manual background needs at least 2 points, got {}",
                points.len()
            )));
        }
        let mut sorted = points.to_vec();
        sorted.sort_by(|a, b| a.0.total_cmp(&b.0));
        let (xs, ys): (Vec<f64>, Vec<f64>) = sorted.into_iter().unzip();

        let degree = (xs.len() - 1).min(MAX_SPLINE_DEGREE);
        let spline = InterpolatingSpline::new(&xs, &ys, degree)?;
        let bg = self.active().x.iter().map(|&x| spline.evaluate(x)).collect();

        log::info!(
            "{}: manual background, degree {degree} spline through {} points",
            self.name,
            xs.len()
        );
        self.background = Some(bg);
        Ok(())
    }

    /// `corrected = active − background`.
    pub fn subtract_background(&mut self) -> Result<()> {
        let bg = self
            .background
            .as_ref()
            .ok_or_else(|| Error::Validation(format!("{}: no background computed", self.name)))?;
        let corrected = subtract(self.active(), bg)?;
        self.corrected = Some(corrected);
        Ok(())
    }

    /// Subtract a background sampled elsewhere, e.g. from another file.
    pub fn subtract_external_background(&mut self, bg: &[f64]) -> Result<()> {
        let corrected = subtract(self.active(), bg)?;
        self.corrected = Some(corrected);
        Ok(())
    }

    pub fn reset_correction(&mut self) {
        self.corrected = None;
        self.background = None;
    }

    /// Numerical derivative of the active intensities, per sample.
    pub fn derivative(&self) -> Vec<f64> {
        gradient(&self.active().y)
    }

    // -- fitting and pressure -----------------------------------------------

    /// Fit the active data and remember the result and its spectral feature.
    pub fn fit(
        &mut self,
        model: &FitModel,
        guess: Option<f64>,
        settings: &FitSettings,
    ) -> Result<f64> {
        let active = self.active();
        let result = fit::fit(model, &active.x, &active.y, guess, settings)?;
        let feature = result.best_feature()?;
        let fitted = result.curve(&active.x).map(|y| active.with_y(y));

        log::info!("{}: {} feature at {feature}", self.name, model.name);
        self.fit_model = Some(model.name.clone());
        self.fit_result = Some(result);
        self.fitted = fitted;
        self.feature = Some(feature);
        Ok(feature)
    }

    pub fn fit_model(&self) -> Option<&str> {
        self.fit_model.as_deref()
    }

    pub fn fit_result(&self) -> Option<&FitResult> {
        self.fit_result.as_ref()
    }

    /// Model evaluated on the active grid, for peak fits only.
    pub fn fitted(&self) -> Option<&Spectrum> {
        self.fitted.as_ref()
    }

    pub fn feature(&self) -> Option<f64> {
        self.feature
    }

    /// Pressure of the last fitted feature, stored as this buffer's point.
    pub fn compute_pressure(
        &mut self,
        calib: &Calibration,
        pm: f64,
        t: f64,
        x0: f64,
        t0: f64,
    ) -> Result<&PressurePoint> {
        let x = self
            .feature
            .ok_or_else(|| Error::Validation(format!("{}: nothing fitted yet", self.name)))?;
        let point = PressurePoint::from_feature(calib, pm, x, t, x0, t0, &self.name);
        log::info!("{}: P = {} GPa ({})", self.name, point.p, calib.name);
        Ok(self.point.insert(point))
    }

    pub fn point(&self) -> Option<&PressurePoint> {
        self.point.as_ref()
    }
}

fn subtract(active: &Spectrum, bg: &[f64]) -> Result<Spectrum> {
    if bg.len() != active.len() {
        return Err(Error::Validation(format!(
            "background has {} samples, data has {}",
            bg.len(),
            active.len()
        )));
    }
    let y = active.y.iter().zip(bg).map(|(v, b)| v - b).collect();
    Ok(active.with_y(y))
}

// ---------------------------------------------------------------------------
// File list
// ---------------------------------------------------------------------------

/// Identifier handed out by [`SpectrumList::add`]; never reused.
pub type BufferId = u64;

/// Ordered list of loaded spectra.
#[derive(Debug, Default)]
pub struct SpectrumList {
    entries: Vec<(BufferId, SpectrumBuffer)>,
    next_id: BufferId,
}

impl SpectrumList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn add(&mut self, buffer: SpectrumBuffer) -> BufferId {
        let id = self.next_id;
        self.next_id += 1;
        log::debug!("File list: added '{}' as #{id}", buffer.name);
        self.entries.push((id, buffer));
        id
    }

    fn position(&self, id: BufferId) -> Option<usize> {
        self.entries.iter().position(|(i, _)| *i == id)
    }

    pub fn get(&self, id: BufferId) -> Option<&SpectrumBuffer> {
        self.position(id).map(|p| &self.entries[p].1)
    }

    pub fn get_mut(&mut self, id: BufferId) -> Option<&mut SpectrumBuffer> {
        let p = self.position(id)?;
        Some(&mut self.entries[p].1)
    }

    /// Remove and return the buffer; `None` for unknown ids.
    pub fn remove(&mut self, id: BufferId) -> Option<SpectrumBuffer> {
        let p = self.position(id)?;
        Some(self.entries.remove(p).1)
    }

    /// Swap with the previous entry. Returns false at the top or for
    /// unknown ids.
    pub fn move_up(&mut self, id: BufferId) -> bool {
        match self.position(id) {
            Some(p) if p > 0 => {
                self.entries.swap(p - 1, p);
                true
            }
            _ => false,
        }
    }

    pub fn move_down(&mut self, id: BufferId) -> bool {
        match self.position(id) {
            Some(p) if p + 1 < self.entries.len() => {
                self.entries.swap(p, p + 1);
                true
            }
            _ => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (BufferId, &SpectrumBuffer)> {
        self.entries.iter().map(|(id, b)| (*id, b))
    }

    pub fn ids(&self) -> Vec<BufferId> {
        self.entries.iter().map(|(id, _)| *id).collect()
    }
}
