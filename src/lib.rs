//! Spectral pressure gauge for high-pressure experiments.
//!
//! A fluorescence or Raman spectrum is parsed, corrected, fitted, and the
//! fitted line position is converted to a pressure with an empirical
//! calibration.

pub mod calibration;
pub mod config;
pub mod data;
pub mod error;
pub mod fit;
pub mod state;
pub mod table;

pub use calibration::{Calibration, CalibrationRegistry};
pub use config::{FitSettings, InversionSettings, ParserSettings, Settings};
pub use data::model::Spectrum;
pub use error::{Error, Result};
pub use fit::{FitModel, FitModelRegistry, FitResult};
pub use state::{BufferId, SpectrumBuffer, SpectrumList};
pub use table::{CellValue, Field, PressurePoint, PressurePointTable, TableEvent};
