use nalgebra::DMatrix;

use crate::config::FitSettings;
use crate::data::filter::{argmin, gradient};
use crate::error::{Error, Result};

use super::guess::{initial_guess, lobe_layout};
use super::lm::{levenberg_marquardt, LevenbergMarquardtOptions};
use super::models::{FitModel, ModelKind, PeakModel};

// ---------------------------------------------------------------------------
// Fit results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum FitResult {
    /// Best-fit parameters of a peak model and their covariance.
    Peak {
        model: PeakModel,
        opti: Vec<f64>,
        cov: DMatrix<f64>,
    },
    /// Edge position; edges carry no covariance.
    Edge { opti: f64 },
}

impl FitResult {
    /// Spectral position used for the pressure: the lobe center for single
    /// lobes, the larger center for multi-lobe models, the edge position for
    /// edges.
    pub fn best_feature(&self) -> Result<f64> {
        match self {
            FitResult::Edge { opti } => Ok(*opti),
            FitResult::Peak { opti, .. } => {
                let layout = lobe_layout(opti.len()).ok_or_else(|| {
                    Error::Validation(format!("cannot split {} parameters into lobes", opti.len()))
                })?;
                (0..layout.lobes)
                    .map(|i| opti[2 + i * layout.params_per_lobe])
                    .reduce(f64::max)
                    .ok_or_else(|| Error::Validation("fit result has no lobe".into()))
            }
        }
    }

    /// Model evaluated on `x`; `None` for edges.
    pub fn curve(&self, x: &[f64]) -> Option<Vec<f64>> {
        match self {
            FitResult::Peak { model, opti, .. } => Some(model.eval_many(x, opti)),
            FitResult::Edge { .. } => None,
        }
    }

    pub fn covariance(&self) -> Option<&DMatrix<f64>> {
        match self {
            FitResult::Peak { cov, .. } => Some(cov),
            FitResult::Edge { .. } => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Fit `model` to `(x, y)`.
///
/// Peak models run Levenberg–Marquardt from [`initial_guess`]; `guess` is a
/// clicked position. The edge model returns the steepest descent of `y`, or
/// `guess` unchanged when one is given.
pub fn fit(
    model: &FitModel,
    x: &[f64],
    y: &[f64],
    guess: Option<f64>,
    settings: &FitSettings,
) -> Result<FitResult> {
    if x.len() != y.len() {
        return Err(Error::Validation("x and y lengths differ".into()));
    }
    match model.kind {
        ModelKind::Edge => {
            let opti = match guess {
                Some(g) => g,
                None => {
                    let idx = argmin(&gradient(y))
                        .ok_or_else(|| Error::Validation("empty spectrum".into()))?;
                    x[idx]
                }
            };
            log::info!("{}: edge at {opti}", model.name);
            Ok(FitResult::Edge { opti })
        }
        ModelKind::Peak(peak) => {
            let p0 = initial_guess(&peak, x, y, guess, settings)?;
            log::debug!("{}: initial guess {p0:?}", model.name);

            let options = LevenbergMarquardtOptions {
                ftol: settings.ftol,
                xtol: settings.xtol,
                max_evaluations: settings.max_evaluations_factor * (p0.len() + 1),
                ..Default::default()
            };
            let report = levenberg_marquardt(x, y, |xi, p| peak.eval(xi, p), &p0, &options)
                .map_err(|e| match e {
                    Error::FitConvergence(msg) => {
                        Error::FitConvergence(format!("{}: {msg}", model.name))
                    }
                    other => other,
                })?;
            if report.parameters.iter().any(|v| !v.is_finite()) {
                return Err(Error::FitConvergence(format!(
                    "{}: non-finite parameters",
                    model.name
                )));
            }
            log::info!(
                "{}: converged after {} evaluations, ssr = {:.4e}",
                model.name,
                report.evaluations,
                report.sum_of_squares
            );
            Ok(FitResult::Peak {
                model: peak,
                opti: report.parameters,
                cov: report.covariance,
            })
        }
    }
}
