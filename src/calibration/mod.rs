/// Pressure calibrations.
///
/// ```text
///                 forward(x, T, x0, T0)
///   spectral x  ───────────────────────►  P (GPa)
///               ◄───────────────────────
///                 invert: min (f(x) − P)²
/// ```
///
/// Every calibration is a plain function pointer plus display metadata, so
/// a single numeric inverse serves all of them.
pub mod formulas;
pub mod minimize;

use crate::config::InversionSettings;
use crate::error::{Error, Result};

/// `P = f(x, T, x0, T0)`.
pub type PressureFn = fn(f64, f64, f64, f64) -> f64;

#[derive(Debug, Clone)]
pub struct Calibration {
    pub name: String,
    pub forward: PressureFn,
    /// Source of the temperature correction, `"NA"` when there is none.
    pub t_correction: String,
    pub x_name: String,
    pub x_unit: String,
    pub x0_default: f64,
    /// Suggested increment for spin boxes editing `x`.
    pub x_step: f64,
    pub color: String,
}

impl Calibration {
    pub fn pressure(&self, x: f64, t: f64, x0: f64, t0: f64) -> f64 {
        (self.forward)(x, t, x0, t0)
    }

    /// Spectral position giving pressure `p`, found by minimizing
    /// `(f(x) − p)²` from `x0_default`.
    pub fn invert(
        &self,
        p: f64,
        t: f64,
        x0: f64,
        t0: f64,
        settings: &InversionSettings,
    ) -> Result<f64> {
        if !p.is_finite() {
            return Err(Error::Validation(format!("cannot invert P = {p}")));
        }
        let objective = |x: f64| (self.pressure(x, t, x0, t0) - p).powi(2);
        let x = minimize::minimize_scalar(
            objective,
            self.x0_default,
            settings.tolerance,
            settings.max_iterations,
        )
        .map_err(|e| match e {
            Error::FitConvergence(msg) => {
                Error::FitConvergence(format!("{}: inverting P = {p}: {msg}", self.name))
            }
            other => other,
        })?;

        let residual = self.pressure(x, t, x0, t0) - p;
        if residual.abs() > 1e-3 {
            log::warn!(
                "{}: P = {p} GPa not reached, closest x = {x} (residual {residual:.3e})",
                self.name
            );
        }
        Ok(x)
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct CalibrationRegistry {
    calibrations: Vec<Calibration>,
}

#[allow(clippy::too_many_arguments)]
fn calibration(
    name: &str,
    forward: PressureFn,
    t_correction: &str,
    x_name: &str,
    x_unit: &str,
    x0_default: f64,
    x_step: f64,
    color: &str,
) -> Calibration {
    Calibration {
        name: name.to_string(),
        forward,
        t_correction: t_correction.to_string(),
        x_name: x_name.to_string(),
        x_unit: x_unit.to_string(),
        x0_default,
        x_step,
        color: color.to_string(),
    }
}

impl CalibrationRegistry {
    pub fn new(calibrations: Vec<Calibration>) -> Self {
        Self { calibrations }
    }

    /// The built-in scales, in display order.
    pub fn standard() -> Self {
        use formulas::*;
        Self::new(vec![
            calibration(
                "Ruby2020",
                ruby_2020,
                "Datchi 2007",
                "lambda",
                "nm",
                694.28,
                0.01,
                "firebrick",
            ),
            calibration(
                "Samarium SrB4O7 Datchi 1997",
                samarium_datchi_1997,
                "Datchi 2007 (?)",
                "lambda",
                "nm",
                685.41,
                0.01,
                "mediumseagreen",
            ),
            calibration(
                "Diamond Raman Edge Hilberer 2025",
                diamond_hilberer_2025,
                "NA",
                "nu",
                "cm-1",
                1334.0,
                0.1,
                "orangered",
            ),
            calibration(
                "Diamond Raman Edge Akahama 2006",
                diamond_akahama_2006,
                "NA",
                "nu",
                "cm-1",
                1334.0,
                0.1,
                "darkgrey",
            ),
            calibration(
                "Diamond Raman Edge Eremets 2023",
                diamond_eremets_2023,
                "NA",
                "nu",
                "cm-1",
                1332.5,
                0.1,
                "steelblue",
            ),
            calibration(
                "H2 Vibron <30GPa",
                h2_vibron,
                "NA",
                "nu",
                "cm-1",
                4200.0,
                0.1,
                "plum",
            ),
            calibration(
                "cBN Raman Datchi 2007",
                cbn_datchi_2007,
                "Datchi 2007",
                "nu",
                "cm-1",
                1054.0,
                0.1,
                "lightblue",
            ),
        ])
    }

    pub fn get(&self, name: &str) -> Option<&Calibration> {
        self.calibrations.iter().find(|c| c.name == name)
    }

    pub fn require(&self, name: &str) -> Result<&Calibration> {
        self.get(name)
            .ok_or_else(|| Error::Validation(format!("unknown calibration '{name}'")))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Calibration> {
        self.calibrations.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.calibrations.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.calibrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calibrations.is_empty()
    }
}

impl Default for CalibrationRegistry {
    fn default() -> Self {
        Self::standard()
    }
}
