use std::fmt;
use std::io;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::calibration::{Calibration, CalibrationRegistry};
use crate::config::InversionSettings;
use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Cells and records
// ---------------------------------------------------------------------------

/// Content of an editable cell: a number, or whatever text the user typed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
}

impl CellValue {
    /// Numeric when the trimmed text parses as `f64`, verbatim text otherwise.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().parse::<f64>() {
            Ok(v) => CellValue::Number(v),
            Err(_) => CellValue::Text(raw.to_string()),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(v) => Some(*v),
            CellValue::Text(_) => None,
        }
    }
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self {
        CellValue::Number(v)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Number(v) => write!(f, "{v}"),
            CellValue::Text(s) => f.write_str(s),
        }
    }
}

/// One committed pressure determination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PressurePoint {
    /// Manometer (reference) pressure.
    #[serde(rename = "Pm")]
    pub pm: CellValue,
    #[serde(rename = "P")]
    pub p: CellValue,
    pub x: CellValue,
    #[serde(rename = "T")]
    pub t: CellValue,
    pub x0: CellValue,
    #[serde(rename = "T0")]
    pub t0: CellValue,
    /// Calibration name, resolved against a [`CalibrationRegistry`].
    pub calib: String,
    pub file: String,
}

impl PressurePoint {
    /// Point with `P` computed from `x` through `calib`.
    pub fn from_feature(
        calib: &Calibration,
        pm: f64,
        x: f64,
        t: f64,
        x0: f64,
        t0: f64,
        file: &str,
    ) -> Self {
        PressurePoint {
            pm: pm.into(),
            p: calib.pressure(x, t, x0, t0).into(),
            x: x.into(),
            t: t.into(),
            x0: x0.into(),
            t0: t0.into(),
            calib: calib.name.clone(),
            file: file.to_string(),
        }
    }

    fn cell(&self, field: Field) -> CellValue {
        match field {
            Field::Pm => self.pm.clone(),
            Field::P => self.p.clone(),
            Field::X => self.x.clone(),
            Field::T => self.t.clone(),
            Field::X0 => self.x0.clone(),
            Field::T0 => self.t0.clone(),
            Field::Calib => CellValue::Text(self.calib.clone()),
            Field::File => CellValue::Text(self.file.clone()),
        }
    }

    fn set_cell(&mut self, field: Field, value: CellValue) {
        match field {
            Field::Pm => self.pm = value,
            Field::P => self.p = value,
            Field::X => self.x = value,
            Field::T => self.t = value,
            Field::X0 => self.x0 = value,
            Field::T0 => self.t0 = value,
            Field::Calib => self.calib = value.to_string(),
            Field::File => self.file = value.to_string(),
        }
    }

    /// `(T, x0, T0)` when all three are numeric.
    fn reference_state(&self) -> Option<(f64, f64, f64)> {
        Some((self.t.as_f64()?, self.x0.as_f64()?, self.t0.as_f64()?))
    }
}

/// Table columns, in export order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Pm,
    P,
    X,
    T,
    X0,
    T0,
    Calib,
    File,
}

impl Field {
    pub const ALL: [Field; 8] = [
        Field::Pm,
        Field::P,
        Field::X,
        Field::T,
        Field::X0,
        Field::T0,
        Field::Calib,
        Field::File,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Field::Pm => "Pm",
            Field::P => "P",
            Field::X => "x",
            Field::T => "T",
            Field::X0 => "x0",
            Field::T0 => "T0",
            Field::Calib => "calib",
            Field::File => "file",
        }
    }
}

impl FromStr for Field {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Field::ALL
            .into_iter()
            .find(|f| f.name() == s)
            .ok_or_else(|| Error::Validation(format!("unknown table field '{s}'")))
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Sent to observers once per successful mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum TableEvent {
    Added { index: usize },
    Removed { index: usize },
    Changed { index: usize, field: Field },
    Reloaded { len: usize },
}

type Observer = Box<dyn FnMut(&TableEvent)>;

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

/// Ordered pressure points. Editing the observable side recomputes `P`;
/// editing `P` recomputes `x` by numeric inversion.
pub struct PressurePointTable {
    points: Vec<PressurePoint>,
    calibrations: CalibrationRegistry,
    inversion: InversionSettings,
    observers: Vec<Observer>,
}

impl fmt::Debug for PressurePointTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PressurePointTable")
            .field("points", &self.points)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl PressurePointTable {
    pub fn new(calibrations: CalibrationRegistry, inversion: InversionSettings) -> Self {
        PressurePointTable {
            points: Vec::new(),
            calibrations,
            inversion,
            observers: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&PressurePoint> {
        self.points.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PressurePoint> {
        self.points.iter()
    }

    pub fn calibrations(&self) -> &CalibrationRegistry {
        &self.calibrations
    }

    pub fn subscribe<F>(&mut self, observer: F)
    where
        F: FnMut(&TableEvent) + 'static,
    {
        self.observers.push(Box::new(observer));
    }

    fn notify(&mut self, event: TableEvent) {
        log::debug!("Table event: {event:?}");
        for observer in self.observers.iter_mut() {
            observer(&event);
        }
    }

    /// Append a copy of `point`.
    pub fn add(&mut self, point: &PressurePoint) {
        self.points.push(point.clone());
        let index = self.points.len() - 1;
        self.notify(TableEvent::Added { index });
    }

    /// Drop the most recent point; no-op on an empty table.
    pub fn remove_last(&mut self) -> Option<PressurePoint> {
        let removed = self.points.pop()?;
        let index = self.points.len();
        self.notify(TableEvent::Removed { index });
        Some(removed)
    }

    pub fn remove_at(&mut self, index: usize) -> Result<PressurePoint> {
        if index >= self.points.len() {
            return Err(Error::Validation(format!(
                "row {index} out of range for {} row(s)",
                self.points.len()
            )));
        }
        let removed = self.points.remove(index);
        self.notify(TableEvent::Removed { index });
        Ok(removed)
    }

    /// Edit one cell from its raw text.
    ///
    /// Returns `Ok(false)` when nothing changed: the value is identical, or
    /// the field is `calib`, which is fixed once a point exists. Text that is
    /// not a number is stored verbatim and triggers no recomputation.
    pub fn set_field(&mut self, index: usize, field: &str, raw: &str) -> Result<bool> {
        let field: Field = field.parse()?;
        let current = self.points.get(index).ok_or_else(|| {
            Error::Validation(format!(
                "row {index} out of range for {} row(s)",
                self.points.len()
            ))
        })?;
        if field == Field::Calib {
            log::debug!("Ignoring edit of the calibration of row {index}");
            return Ok(false);
        }

        let value = match field {
            Field::File => CellValue::Text(raw.to_string()),
            _ => CellValue::parse(raw),
        };
        if current.cell(field) == value {
            return Ok(false);
        }

        let mut updated = current.clone();
        updated.set_cell(field, value);

        match field {
            Field::P => self.recompute_x(&mut updated)?,
            Field::X | Field::T | Field::X0 | Field::T0 => self.recompute_p(&mut updated)?,
            Field::Pm | Field::File | Field::Calib => {}
        }

        self.points[index] = updated;
        self.notify(TableEvent::Changed { index, field });
        Ok(true)
    }

    fn recompute_p(&self, point: &mut PressurePoint) -> Result<()> {
        let calib = self.calibrations.require(&point.calib)?;
        match (point.x.as_f64(), point.reference_state()) {
            (Some(x), Some((t, x0, t0))) => {
                point.p = calib.pressure(x, t, x0, t0).into();
            }
            _ => log::warn!("Non-numeric cell, P left as {}", point.p),
        }
        Ok(())
    }

    fn recompute_x(&self, point: &mut PressurePoint) -> Result<()> {
        let calib = self.calibrations.require(&point.calib)?;
        match (point.p.as_f64(), point.reference_state()) {
            (Some(p), Some((t, x0, t0))) => {
                point.x = calib.invert(p, t, x0, t0, &self.inversion)?.into();
            }
            _ => log::warn!("Non-numeric cell, x left as {}", point.x),
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Tab-separated persistence
    // -----------------------------------------------------------------------

    pub fn write_tsv<W: io::Write>(&self, writer: W) -> Result<()> {
        // header written by hand so that an empty table still has one
        let mut wtr = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .from_writer(writer);
        let wrap = |e| Error::Csv("<table>".to_string(), e);

        wtr.write_record(Field::ALL.iter().map(|f| f.name())).map_err(wrap)?;
        for point in &self.points {
            wtr.serialize(point).map_err(wrap)?;
        }
        wtr.flush()
            .map_err(|e| Error::Csv("<table>".to_string(), e.into()))?;
        Ok(())
    }

    pub fn save_tsv(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path).map_err(|e| Error::Io(path.to_path_buf(), e))?;
        self.write_tsv(io::BufWriter::new(file)).map_err(|e| match e {
            Error::Csv(_, inner) => Error::Csv(path.display().to_string(), inner),
            other => other,
        })?;
        log::info!("Saved {} point(s) to {}", self.points.len(), path.display());
        Ok(())
    }

    /// Replace the content with the rows of a tab-separated table. Columns
    /// are matched by header name. Nothing changes unless every row is valid.
    pub fn read_tsv<R: io::Read>(&mut self, reader: R) -> Result<()> {
        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);
        let wrap = |e| Error::Csv("<table>".to_string(), e);

        let headers = rdr.headers().map_err(wrap)?.clone();
        if let Some(missing) = Field::ALL
            .iter()
            .find(|f| !headers.iter().any(|h| h == f.name()))
        {
            return Err(Error::Validation(format!("missing column '{missing}'")));
        }

        let mut points = Vec::new();
        for record in rdr.deserialize::<PressurePoint>() {
            let mut point = record.map_err(wrap)?;
            point.calib = self.calibrations.require(&point.calib)?.name.clone();
            points.push(point);
        }

        self.points = points;
        let len = self.points.len();
        self.notify(TableEvent::Reloaded { len });
        Ok(())
    }

    pub fn load_tsv(&mut self, path: &Path) -> Result<()> {
        let file = std::fs::File::open(path).map_err(|e| Error::Io(path.to_path_buf(), e))?;
        self.read_tsv(io::BufReader::new(file)).map_err(|e| match e {
            Error::Csv(_, inner) => Error::Csv(path.display().to_string(), inner),
            other => other,
        })?;
        log::info!("Loaded {} point(s) from {}", self.points.len(), path.display());
        Ok(())
    }
}
