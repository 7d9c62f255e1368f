mod helpers;

use std::fs;
use std::time::{Duration, SystemTime};

use pressure_gauge::data::loader::{
    latest_spectrum_file, parse_spectrum_file, parse_spectrum_str, write_spectrum, Delimiter,
};
use pressure_gauge::{Error, ParserSettings, Spectrum};

use helpers::{linspace, temp_dir, temp_path};

fn sample() -> Spectrum {
    let x = linspace(690.0, 698.0, 200);
    let y = x.iter().map(|v| 100.0 + 1e3 / (1.0 + (v - 694.3f64).powi(2))).collect();
    Spectrum::new(x, y)
}

fn to_text(s: &Spectrum, sep: &str) -> String {
    s.points().map(|(x, y)| format!("{x}{sep}{y}\n")).collect()
}

#[test]
fn write_then_parse_is_bit_identical() {
    let s = sample();
    for delimiter in Delimiter::CANDIDATES {
        let path = temp_path("roundtrip.txt");
        write_spectrum(&path, &s, delimiter).unwrap();
        let parsed = parse_spectrum_file(&path).unwrap();
        assert_eq!(parsed, s, "delimiter {delimiter:?}");

        // and once more through the parser's own output
        let again = temp_path("roundtrip2.txt");
        write_spectrum(&again, &parsed, delimiter).unwrap();
        assert_eq!(parse_spectrum_file(&again).unwrap(), s);
        fs::remove_file(&path).ok();
        fs::remove_file(&again).ok();
    }
}

#[test]
fn noise_lines_do_not_change_the_data() {
    let s = sample();
    let body = to_text(&s, "\t");
    let settings = ParserSettings::default();
    let clean = parse_spectrum_str(&body, &settings).unwrap();

    let header = "Data from spectrometer\nIntegration time (ms):\t100\nUser:\tnobody\n\
                  >>>>>Begin Spectral Data<<<<<\n";
    let footer = ">>>>>End Spectral Data<<<<<\n# 2 columns\n";
    let noisy = format!("{header}{body}{footer}");
    assert_eq!(parse_spectrum_str(&noisy, &settings).unwrap(), clean);

    // a longer header does not matter either
    let long_header: String = (0..250).map(|i| format!("comment line {i}\n")).collect();
    let noisier = format!("{long_header}{header}{body}{footer}");
    assert_eq!(parse_spectrum_str(&noisier, &settings).unwrap(), clean);
}

#[test]
fn comma_semicolon_and_whitespace_files() {
    let s = sample();
    let settings = ParserSettings::default();
    for sep in [",", ";", "   ", " \t "] {
        let text = format!("x{sep}y\n{}", to_text(&s, sep));
        assert_eq!(parse_spectrum_str(&text, &settings).unwrap(), s, "separator {sep:?}");
    }
}

#[test]
fn interspersed_footer_lines_are_dropped() {
    let text = "1.0,10.0\n2.0,20.0\nsaturated!\n3.0,30.0\nEND\n";
    let s = parse_spectrum_str(text, &ParserSettings::default()).unwrap();
    assert_eq!(s.x, vec![1.0, 2.0, 3.0]);
    assert_eq!(s.y, vec![10.0, 20.0, 30.0]);
}

#[test]
fn a_single_row_is_not_a_spectrum() {
    let r = parse_spectrum_str("header\n1.0\t2.0\n", &ParserSettings::default());
    assert!(matches!(r, Err(Error::Parse(_))));
}

#[test]
fn missing_file_is_an_io_error() {
    let r = parse_spectrum_file(&temp_path("does-not-exist.txt"));
    assert!(matches!(r, Err(Error::Io(_, _))));
}

#[test]
fn binary_file_is_rejected() {
    let path = temp_path("binary.dat");
    fs::write(&path, [0u8, 159, 146, 150, 0, 1, 2]).unwrap();
    assert!(matches!(parse_spectrum_file(&path), Err(Error::Parse(_))));
    fs::remove_file(&path).ok();
}

#[test]
fn latest_file_by_modification_time() {
    let dir = temp_dir("latest");
    let old = dir.join("old.txt");
    let new = dir.join("new.asc");
    let ignored = dir.join("notes.md");
    for p in [&old, &new, &ignored] {
        fs::write(p, "1 2\n3 4\n").unwrap();
    }
    let now = SystemTime::now();
    let set = |p: &std::path::Path, t: SystemTime| {
        fs::File::options().write(true).open(p).unwrap().set_modified(t).unwrap();
    };
    set(old.as_path(), now - Duration::from_secs(120));
    set(new.as_path(), now - Duration::from_secs(60));
    set(ignored.as_path(), now);

    let latest = latest_spectrum_file(&dir, &["txt", "asc"]).unwrap();
    assert_eq!(latest.as_deref(), Some(new.as_path()));

    let any = latest_spectrum_file(&dir, &[]).unwrap();
    assert_eq!(any.as_deref(), Some(ignored.as_path()));
    fs::remove_dir_all(&dir).ok();
}
