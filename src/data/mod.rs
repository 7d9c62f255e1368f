/// Data layer: samples, file parsing and the signal helpers behind the
/// correction pipeline.
///
/// Architecture:
/// ```text
///  .txt / .asc / .csv
///        │
///        ▼
///   ┌──────────┐
///   │  loader  │  sniff delimiter, keep numeric rows → Spectrum
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ Spectrum │  x, y columns
///   └──────────┘
///        │
///        ▼
///   ┌────────────┐   ┌────────┐
///   │ background │ ─ │ filter │  hull / spline baselines, smoothing,
///   └────────────┘   └────────┘  gradient, interpolation
/// ```

pub mod background;
pub mod filter;
pub mod loader;
pub mod model;
