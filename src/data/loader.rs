use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::config::ParserSettings;
use crate::error::{Error, Result};

use super::model::Spectrum;

// ---------------------------------------------------------------------------
// Delimiters
// ---------------------------------------------------------------------------

/// Column separator of an ASCII spectrum file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    Tab,
    Comma,
    Semicolon,
    /// Any run of spaces and/or tabs.
    Whitespace,
}

impl Delimiter {
    /// Candidates in tie-break order.
    pub const CANDIDATES: [Delimiter; 4] = [
        Delimiter::Tab,
        Delimiter::Comma,
        Delimiter::Semicolon,
        Delimiter::Whitespace,
    ];

    fn split<'a>(&self, line: &'a str) -> Vec<&'a str> {
        let tokens: Box<dyn Iterator<Item = &'a str>> = match self {
            Delimiter::Tab => Box::new(line.split('\t')),
            Delimiter::Comma => Box::new(line.split(',')),
            Delimiter::Semicolon => Box::new(line.split(';')),
            Delimiter::Whitespace => Box::new(line.split_whitespace()),
        };
        tokens.map(str::trim).filter(|t| !t.is_empty()).collect()
    }

    fn as_byte(&self) -> u8 {
        match self {
            Delimiter::Tab => b'\t',
            Delimiter::Comma => b',',
            Delimiter::Semicolon => b';',
            Delimiter::Whitespace => b' ',
        }
    }
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load a two-column spectrum from an ASCII file with default settings.
///
/// Header and footer lines of any length are tolerated; only lines made of
/// at least two floats survive, and only their first two columns are kept.
pub fn parse_spectrum_file(path: &Path) -> Result<Spectrum> {
    parse_spectrum_file_with(path, &ParserSettings::default())
}

pub fn parse_spectrum_file_with(path: &Path, settings: &ParserSettings) -> Result<Spectrum> {
    let bytes = fs::read(path).map_err(|e| Error::Io(path.to_path_buf(), e))?;
    if bytes.contains(&0) {
        return Err(Error::Parse(format!(
            "{} looks like a binary file",
            path.display()
        )));
    }
    let text = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            log::warn!(
                "{} is not valid UTF-8, decoding lossily",
                path.display()
            );
            String::from_utf8_lossy(e.as_bytes()).into_owned()
        }
    };
    let spectrum = parse_spectrum_str(&text, settings)?;
    log::info!("Loaded {} samples from {}", spectrum.len(), path.display());
    Ok(spectrum)
}

/// Parse in-memory file content. See [`parse_spectrum_file`].
pub fn parse_spectrum_str(text: &str, settings: &ParserSettings) -> Result<Spectrum> {
    let delimiter = sniff_delimiter(text, settings)?;
    log::debug!("Detected delimiter {delimiter:?}");

    let mut x = Vec::new();
    let mut y = Vec::new();
    for line in text.lines() {
        if let Some((xi, yi)) = data_row(line, delimiter) {
            x.push(xi);
            y.push(yi);
        }
    }

    if x.len() < 2 {
        return Err(Error::Parse(format!(
            "only {} numeric row(s) found, need at least 2",
            x.len()
        )));
    }
    Ok(Spectrum::new(x, y))
}

/// Write the two columns of `spectrum`, one sample per line, no header.
///
/// Values are written in shortest round-trip form so that parsing the file
/// again restores identical bits.
pub fn write_spectrum(path: &Path, spectrum: &Spectrum, delimiter: Delimiter) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter.as_byte())
        .has_headers(false)
        .from_path(path)
        .map_err(|e| Error::Csv(path.display().to_string(), e))?;
    for (xi, yi) in spectrum.points() {
        writer
            .write_record([xi.to_string(), yi.to_string()])
            .map_err(|e| Error::Csv(path.display().to_string(), e))?;
    }
    writer.flush().map_err(|e| Error::Io(path.to_path_buf(), e))?;
    Ok(())
}

/// Most recently modified file in `dir` whose extension is one of
/// `extensions` (case-insensitive). An empty list accepts every file.
pub fn latest_spectrum_file(dir: &Path, extensions: &[&str]) -> Result<Option<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| Error::Io(dir.to_path_buf(), e))?;

    let mut latest: Option<(SystemTime, PathBuf)> = None;
    for entry in entries {
        let entry = entry.map_err(|e| Error::Io(dir.to_path_buf(), e))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        if !extensions.is_empty() && !extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext)) {
            continue;
        }
        let modified = entry
            .metadata()
            .and_then(|m| m.modified())
            .map_err(|e| Error::Io(path.clone(), e))?;
        if latest.as_ref().map_or(true, |(t, _)| modified > *t) {
            latest = Some((modified, path));
        }
    }
    Ok(latest.map(|(_, p)| p))
}

// ---------------------------------------------------------------------------
// Line classification & delimiter sniffing
// ---------------------------------------------------------------------------

/// `Some((x, y))` when the line holds at least two floats and nothing else.
fn data_row(line: &str, delimiter: Delimiter) -> Option<(f64, f64)> {
    let tokens = delimiter.split(line);
    if tokens.len() < 2 {
        return None;
    }
    let mut values = Vec::with_capacity(tokens.len());
    for tok in tokens {
        values.push(tok.parse::<f64>().ok()?);
    }
    Some((values[0], values[1]))
}

fn score(lines: &[&str], delimiter: Delimiter) -> usize {
    lines
        .iter()
        .filter(|l| data_row(l, delimiter).is_some())
        .count()
}

fn best_delimiter(lines: &[&str]) -> Option<Delimiter> {
    let mut best: Option<(usize, Delimiter)> = None;
    for d in Delimiter::CANDIDATES {
        let s = score(lines, d);
        // strict comparison keeps the earlier candidate on ties
        if s > 0 && best.map_or(true, |(b, _)| s > b) {
            best = Some((s, d));
        }
    }
    best.map(|(_, d)| d)
}

fn sniff_delimiter(text: &str, settings: &ParserSettings) -> Result<Delimiter> {
    // trailing window, cut on a char boundary; the first (partial) line is dropped
    let n_chars = text.chars().count();
    let tail: &str = if n_chars > settings.sniff_chars {
        let start = text
            .char_indices()
            .nth(n_chars - settings.sniff_chars)
            .map(|(i, _)| i)
            .unwrap_or(0);
        let window = &text[start..];
        match window.find('\n') {
            Some(nl) => &window[nl + 1..],
            None => window,
        }
    } else {
        text
    };
    let tail_lines: Vec<&str> = tail.lines().collect();
    if let Some(d) = best_delimiter(&tail_lines) {
        return Ok(d);
    }

    // the tail may be a long footer; try the body past the fixed header block
    let all_lines: Vec<&str> = text.lines().collect();
    let body = if all_lines.len() > settings.header_lookahead {
        &all_lines[settings.header_lookahead..]
    } else {
        &all_lines[..]
    };
    if let Some(d) = best_delimiter(body) {
        log::debug!("Delimiter found past the header block");
        return Ok(d);
    }
    if let Some(d) = best_delimiter(&all_lines) {
        log::debug!("Delimiter found in the header block");
        return Ok(d);
    }
    Err(Error::Parse("could not determine the column delimiter".into()))
}
