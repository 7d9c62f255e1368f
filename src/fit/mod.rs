/// Peak and edge fitting.
///
/// ```text
///   FitModelRegistry ── FitModel ──┐
///                                  ▼
///   (x, y) ──► guess::initial_guess ──► lm::levenberg_marquardt ──► FitResult
///                                                                     │
///                                                        best_feature ▼
///                                                               spectral x
/// ```

pub mod engine;
pub mod guess;
pub mod lm;
pub mod models;
pub mod profiles;

pub use engine::{fit, FitResult};
pub use guess::{initial_guess, lobe_layout, LobeLayout};
pub use models::{FitModel, FitModelRegistry, LobeShape, ModelKind, PeakModel};
