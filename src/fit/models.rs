use super::profiles::{gaussian, lorentzian, voigt};

use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Peak shapes
// ---------------------------------------------------------------------------

/// Shape of one additive lobe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LobeShape {
    /// (amplitude, center, sigma)
    Gaussian,
    /// (amplitude, center, gamma)
    Lorentzian,
    /// (amplitude, center, sigma, gamma)
    Voigt,
}

impl LobeShape {
    pub fn n_params(self) -> usize {
        match self {
            LobeShape::Gaussian | LobeShape::Lorentzian => 3,
            LobeShape::Voigt => 4,
        }
    }

    fn eval(self, x: f64, p: &[f64]) -> f64 {
        match self {
            LobeShape::Gaussian => gaussian(x, p[0], p[1], p[2]),
            LobeShape::Lorentzian => lorentzian(x, p[0], p[1], p[2]),
            LobeShape::Voigt => voigt(x, p[0], p[1], p[2], p[3]),
        }
    }
}

/// Constant baseline plus `lobes` identical-shape lobes.
///
/// Parameter vector: `[c, lobe0..., lobe1..., ...]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeakModel {
    pub shape: LobeShape,
    pub lobes: usize,
}

impl PeakModel {
    pub fn n_params(&self) -> usize {
        1 + self.lobes * self.shape.n_params()
    }

    /// Forward function. `params.len()` must equal [`PeakModel::n_params`].
    pub fn eval(&self, x: f64, params: &[f64]) -> f64 {
        let k = self.shape.n_params();
        params[1..]
            .chunks_exact(k)
            .take(self.lobes)
            .fold(params[0], |acc, lobe| acc + self.shape.eval(x, lobe))
    }

    pub fn eval_many(&self, x: &[f64], params: &[f64]) -> Vec<f64> {
        x.iter().map(|&xi| self.eval(xi, params)).collect()
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Either a least-squares peak model or the derivative-based edge locator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    Peak(PeakModel),
    Edge,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FitModel {
    pub name: String,
    pub kind: ModelKind,
    /// Display only.
    pub color: String,
}

impl FitModel {
    fn peak(name: &str, shape: LobeShape, lobes: usize, color: &str) -> Self {
        FitModel {
            name: name.to_string(),
            kind: ModelKind::Peak(PeakModel { shape, lobes }),
            color: color.to_string(),
        }
    }

    pub fn is_edge(&self) -> bool {
        matches!(self.kind, ModelKind::Edge)
    }
}

/// Immutable table of the available fit models, built once at start-up.
#[derive(Debug, Clone)]
pub struct FitModelRegistry {
    models: Vec<FitModel>,
}

impl Default for FitModelRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl FitModelRegistry {
    pub fn new(models: Vec<FitModel>) -> Self {
        FitModelRegistry { models }
    }

    /// Ruby doublets, single samarium/Raman lines and the diamond edge.
    pub fn standard() -> Self {
        use LobeShape::*;
        Self::new(vec![
            FitModel::peak("Double Voigt", Voigt, 2, "firebrick"),
            FitModel::peak("Double Lorentzian", Lorentzian, 2, "firebrick"),
            FitModel::peak("Double Gaussian", Gaussian, 2, "firebrick"),
            FitModel::peak("Single Voigt", Voigt, 1, "mediumseagreen"),
            FitModel::peak("Single Lorentzian", Lorentzian, 1, "mediumseagreen"),
            FitModel::peak("Single Gaussian", Gaussian, 1, "mediumseagreen"),
            FitModel {
                name: "Raman Edge".to_string(),
                kind: ModelKind::Edge,
                color: "darkgrey".to_string(),
            },
        ])
    }

    pub fn get(&self, name: &str) -> Option<&FitModel> {
        self.models.iter().find(|m| m.name == name)
    }

    pub fn require(&self, name: &str) -> Result<&FitModel> {
        self.get(name)
            .ok_or_else(|| Error::Validation(format!("unknown fit model '{name}'")))
    }

    pub fn iter(&self) -> impl Iterator<Item = &FitModel> {
        self.models.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.models.iter().map(|m| m.name.as_str()).collect()
    }
}
