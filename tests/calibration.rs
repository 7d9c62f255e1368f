mod helpers;

use pressure_gauge::{CalibrationRegistry, Error, InversionSettings};

use helpers::assert_close;

/// Line positions well inside each scale's working range.
fn sample_positions(name: &str) -> &'static [f64] {
    match name {
        "Ruby2020" => &[694.8, 697.9, 702.0],
        "Samarium SrB4O7 Datchi 1997" => &[685.9, 688.0, 692.5],
        "H2 Vibron <30GPa" => &[4160.0, 4175.0, 4190.0, 4210.0],
        "cBN Raman Datchi 2007" => &[1060.0, 1080.0, 1120.0],
        _ => &[1340.0, 1400.0, 1500.0],
    }
}

#[test]
fn every_calibration_inverts_its_own_pressure() {
    let calibrations = CalibrationRegistry::standard();
    let settings = InversionSettings::default();
    for c in calibrations.iter() {
        for &x in sample_positions(&c.name) {
            let p = c.pressure(x, 298.0, c.x0_default, 298.0);
            assert!(p > 0.0, "{} at {x}: P = {p}", c.name);

            let back = c.invert(p, 298.0, c.x0_default, 298.0, &settings).unwrap();
            assert_close(back, x, 1e-4);
        }
    }
}

#[test]
fn inversion_honours_temperature() {
    let calibrations = CalibrationRegistry::standard();
    let settings = InversionSettings::default();
    for (name, x, t) in [("Ruby2020", 696.5, 450.0), ("cBN Raman Datchi 2007", 1070.0, 600.0)] {
        let c = calibrations.require(name).unwrap();
        let p = c.pressure(x, t, c.x0_default, 298.0);
        assert_ne!(p, c.pressure(x, 298.0, c.x0_default, 298.0), "{name}");
        let back = c.invert(p, t, c.x0_default, 298.0, &settings).unwrap();
        assert_close(back, x, 1e-4);
    }
}

#[test]
fn pressure_grows_with_the_line_shift() {
    let calibrations = CalibrationRegistry::standard();
    for c in calibrations.iter() {
        let x = sample_positions(&c.name)[0];
        let lo = c.pressure(x, 298.0, c.x0_default, 298.0);
        let hi = c.pressure(x + 10.0 * c.x_step, 298.0, c.x0_default, 298.0);
        assert!(hi > lo, "{}: {lo} -> {hi}", c.name);
    }
}

#[test]
fn reference_position_shifts_the_scale() {
    let calibrations = CalibrationRegistry::standard();
    let ruby = calibrations.require("Ruby2020").unwrap();
    assert_eq!(ruby.pressure(694.50, 298.0, 694.50, 298.0), 0.0);
    assert!(ruby.pressure(694.50, 298.0, 694.28, 298.0) > 0.0);

    // the vibron fit ignores the reference state
    let h2 = calibrations.require("H2 Vibron <30GPa").unwrap();
    assert_eq!(
        h2.pressure(4190.0, 298.0, 4200.0, 298.0),
        h2.pressure(4190.0, 80.0, 4155.0, 10.0)
    );
}

#[test]
fn non_finite_pressure_is_rejected() {
    let calibrations = CalibrationRegistry::standard();
    let ruby = calibrations.require("Ruby2020").unwrap();
    let settings = InversionSettings::default();
    for p in [f64::NAN, f64::INFINITY] {
        let r = ruby.invert(p, 298.0, 694.28, 298.0, &settings);
        assert!(matches!(r, Err(Error::Validation(_))));
    }
}

#[test]
fn starved_inversion_reports_the_calibration() {
    let calibrations = CalibrationRegistry::standard();
    let ruby = calibrations.require("Ruby2020").unwrap();
    let settings = InversionSettings {
        tolerance: 1e-12,
        max_iterations: 2,
    };
    match ruby.invert(30.0, 298.0, 694.28, 298.0, &settings) {
        Err(Error::FitConvergence(msg)) => assert!(msg.contains("Ruby2020"), "{msg}"),
        other => panic!("expected a convergence error, got {other:?}"),
    }
}

#[test]
fn display_metadata() {
    let calibrations = CalibrationRegistry::standard();
    let units: Vec<(&str, &str)> = calibrations
        .iter()
        .map(|c| (c.x_name.as_str(), c.x_unit.as_str()))
        .collect();
    assert_eq!(units[0], ("lambda", "nm"));
    assert_eq!(units[1], ("lambda", "nm"));
    assert!(units[2..].iter().all(|&u| u == ("nu", "cm-1")));
    assert_eq!(
        calibrations.require("Diamond Raman Edge Eremets 2023").unwrap().x0_default,
        1332.5
    );
}
