use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Tunables for the numeric pipeline
// ---------------------------------------------------------------------------

/// Peak seeding and least-squares tolerances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitSettings {
    /// Spacing between lobes seeded from a single click, in spectral units.
    /// Tuned for the ruby R1/R2 doublet.
    pub lobe_offset: f64,
    /// Minimum width of an auto-detected peak, in spectral units.
    pub min_peak_width: f64,
    /// Amplitude seed for every lobe.
    pub amplitude_seed: f64,
    /// Width seed for 3-parameter lobes when a click position is given.
    pub width_seed: f64,
    /// Width and shape seeds for 4-parameter lobes when a click position is given.
    pub voigt_width_seed: f64,
    pub ftol: f64,
    pub xtol: f64,
    /// Evaluation budget per free parameter (total is `factor * (n + 1)`).
    pub max_evaluations_factor: usize,
}

impl Default for FitSettings {
    fn default() -> Self {
        Self {
            lobe_offset: 1.5,
            min_peak_width: 0.1,
            amplitude_seed: 0.5,
            width_seed: 0.5,
            voigt_width_seed: 0.2,
            ftol: 1e-8,
            xtol: 1e-8,
            max_evaluations_factor: 200,
        }
    }
}

/// Scalar minimization used to invert calibrations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InversionSettings {
    pub tolerance: f64,
    pub max_iterations: usize,
}

impl Default for InversionSettings {
    fn default() -> Self {
        Self {
            tolerance: 1e-6,
            max_iterations: 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserSettings {
    /// Number of trailing characters inspected to guess the delimiter.
    pub sniff_chars: usize,
    /// Leading lines never used for delimiter guessing.
    pub header_lookahead: usize,
}

impl Default for ParserSettings {
    fn default() -> Self {
        Self {
            sniff_chars: 2000,
            header_lookahead: 100,
        }
    }
}

/// All tunables, loadable from a JSON file. Missing keys keep their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub fit: FitSettings,
    pub inversion: InversionSettings,
    pub parser: ParserSettings,
}

impl Settings {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text =
            std::fs::read_to_string(path).map_err(|e| Error::Io(path.to_path_buf(), e))?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let s = Settings::from_json_str(r#"{ "fit": { "lobe_offset": 2.0 } }"#).unwrap();
        assert_eq!(s.fit.lobe_offset, 2.0);
        assert_eq!(s.fit.width_seed, 0.5);
        assert_eq!(s.inversion, InversionSettings::default());
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        assert!(matches!(
            Settings::from_json_str("{ fit: "),
            Err(Error::Config(_))
        ));
    }
}
