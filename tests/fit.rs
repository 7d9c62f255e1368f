mod helpers;

use pressure_gauge::data::loader::{write_spectrum, Delimiter};
use pressure_gauge::fit::profiles::lorentzian;
use pressure_gauge::fit::{fit, initial_guess, lobe_layout, LobeLayout, ModelKind};
use pressure_gauge::{
    CalibrationRegistry, Error, FitModelRegistry, FitResult, FitSettings, ParserSettings,
    Spectrum, SpectrumBuffer,
};

use helpers::{assert_close, gaussian_lines, linspace, temp_path, voigt_lines};

fn ruby_doublet() -> Spectrum {
    let x = linspace(693.5, 695.0, 301);
    voigt_lines(&x, &[(694.20, 0.6), (694.35, 1.0)], 0.03, 0.03, 0.05, 5e-4)
}

fn narrow_peaks() -> FitSettings {
    FitSettings {
        min_peak_width: 0.02,
        ..FitSettings::default()
    }
}

#[test]
fn lobe_layout_from_parameter_count() {
    assert_eq!(
        lobe_layout(7),
        Some(LobeLayout {
            params_per_lobe: 3,
            lobes: 2
        })
    );
    assert_eq!(
        lobe_layout(9),
        Some(LobeLayout {
            params_per_lobe: 4,
            lobes: 2
        })
    );
}

#[test]
fn initial_guess_matches_model_size() {
    let models = FitModelRegistry::standard();
    let s = ruby_doublet();
    for name in ["Double Voigt", "Double Gaussian", "Double Lorentzian"] {
        let ModelKind::Peak(peak) = models.require(name).unwrap().kind else {
            panic!("{name} is not a peak model");
        };
        let p0 = initial_guess(&peak, &s.x, &s.y, None, &narrow_peaks()).unwrap();
        assert_eq!(p0.len(), peak.n_params(), "{name}");
        assert_eq!(p0[0], s.y[0]);
        // lobes by ascending height
        let per = lobe_layout(p0.len()).unwrap().params_per_lobe;
        assert_close(p0[2], 694.20, 0.01);
        assert_close(p0[2 + per], 694.35, 0.01);
    }
}

#[test]
fn click_guess_seeds_lobes_below_the_click() {
    let models = FitModelRegistry::standard();
    let s = ruby_doublet();
    let ModelKind::Peak(voigt) = models.require("Double Voigt").unwrap().kind else {
        unreachable!()
    };
    let p0 = initial_guess(&voigt, &s.x, &s.y, Some(694.3), &FitSettings::default()).unwrap();
    assert_eq!(p0[1..5], [0.5, 694.3, 0.2, 0.2]);
    assert_eq!(p0[5..9], [0.5, 694.3 - 1.5, 0.2, 0.2]);

    let ModelKind::Peak(gauss) = models.require("Single Gaussian").unwrap().kind else {
        unreachable!()
    };
    let p0 = initial_guess(&gauss, &s.x, &s.y, Some(694.3), &FitSettings::default()).unwrap();
    assert_eq!(p0[1..], [0.5, 694.3, 0.5]);
}

#[test]
fn double_voigt_recovers_both_ruby_lines_from_a_file() {
    let path = temp_path("ruby_doublet.txt");
    write_spectrum(&path, &ruby_doublet(), Delimiter::Tab).unwrap();
    let mut buffer = SpectrumBuffer::load(&path, &ParserSettings::default()).unwrap();
    std::fs::remove_file(&path).ok();

    let models = FitModelRegistry::standard();
    let model = models.require("Double Voigt").unwrap();
    let feature = buffer.fit(model, None, &narrow_peaks()).unwrap();

    let Some(FitResult::Peak { opti, cov, .. }) = buffer.fit_result() else {
        panic!("expected a peak result");
    };
    assert_eq!(opti.len(), 9);
    assert_close(opti[2], 694.20, 0.05);
    assert_close(opti[6], 694.35, 0.05);
    assert_close(feature, 694.35, 0.05);
    assert_eq!(feature, opti[2].max(opti[6]));
    assert_eq!(cov.shape(), (9, 9));
    assert!(cov.iter().all(|v| v.is_finite()));

    let fitted = buffer.fitted().unwrap();
    assert_eq!(fitted.x, buffer.active().x);
    let worst = fitted
        .y
        .iter()
        .zip(&buffer.active().y)
        .map(|(a, b)| (a - b).abs())
        .fold(0.0, f64::max);
    assert!(worst < 0.01, "worst residual {worst}");
    assert_eq!(buffer.fit_model(), Some("Double Voigt"));
}

#[test]
fn double_gaussian_from_a_click() {
    let x = linspace(691.0, 696.0, 501);
    let s = gaussian_lines(&x, &[(694.2, 1.0), (692.7, 0.6)], 0.15, 0.05);
    let models = FitModelRegistry::standard();
    let result = fit(
        models.require("Double Gaussian").unwrap(),
        &s.x,
        &s.y,
        Some(694.25),
        &FitSettings::default(),
    )
    .unwrap();

    let FitResult::Peak { opti, .. } = &result else {
        panic!("expected a peak result");
    };
    assert_close(opti[2], 694.2, 1e-3);
    assert_close(opti[5], 692.7, 1e-3);
    assert_close(result.best_feature().unwrap(), 694.2, 1e-3);
}

#[test]
fn single_lorentzian_samarium_line() {
    let x = linspace(684.0, 688.0, 401);
    let y = x.iter().map(|&v| 0.1 + lorentzian(v, 0.3, 685.9, 0.2)).collect();
    let s = Spectrum::new(x, y);
    let models = FitModelRegistry::standard();
    let result = fit(
        models.require("Single Lorentzian").unwrap(),
        &s.x,
        &s.y,
        None,
        &FitSettings::default(),
    )
    .unwrap();
    assert_close(result.best_feature().unwrap(), 685.9, 1e-4);
    let FitResult::Peak { opti, .. } = &result else {
        unreachable!()
    };
    assert_close(opti[3], 0.2, 1e-4);
}

#[test]
fn too_few_peaks_for_the_model() {
    let x = linspace(684.0, 688.0, 401);
    let y: Vec<f64> = x.iter().map(|&v| 0.1 + lorentzian(v, 0.3, 685.9, 0.2)).collect();
    let models = FitModelRegistry::standard();
    let r = fit(
        models.require("Double Voigt").unwrap(),
        &x,
        &y,
        None,
        &FitSettings::default(),
    );
    assert!(matches!(r, Err(Error::FitConvergence(_))));
}

fn diamond_edge() -> Spectrum {
    let x = linspace(1300.0, 1380.0, 161);
    let y = x
        .iter()
        .map(|&v| 0.1 + 1.0 / (1.0 + ((v - 1340.0) / 2.0).exp()))
        .collect();
    Spectrum::new(x, y)
}

#[test]
fn edge_is_the_steepest_descent() {
    let s = diamond_edge();
    let models = FitModelRegistry::standard();
    let edge = models.require("Raman Edge").unwrap();

    let result = fit(edge, &s.x, &s.y, None, &FitSettings::default()).unwrap();
    assert_eq!(result, FitResult::Edge { opti: 1340.0 });
    assert!(result.covariance().is_none());
    assert!(result.curve(&s.x).is_none());

    let clicked = fit(edge, &s.x, &s.y, Some(1338.2), &FitSettings::default()).unwrap();
    assert_eq!(clicked.best_feature().unwrap(), 1338.2);
}

#[test]
fn buffer_pressure_from_the_fitted_edge() {
    let mut buffer = SpectrumBuffer::from_spectrum("diamond", diamond_edge()).unwrap();
    let calibrations = CalibrationRegistry::standard();
    let akahama = calibrations.require("Diamond Raman Edge Akahama 2006").unwrap();
    assert!(matches!(
        buffer.compute_pressure(akahama, 0.0, 298.0, 1334.0, 298.0),
        Err(Error::Validation(_))
    ));

    let models = FitModelRegistry::standard();
    let feature = buffer
        .fit(models.require("Raman Edge").unwrap(), None, &FitSettings::default())
        .unwrap();
    assert_eq!(feature, 1340.0);
    assert!(buffer.fitted().is_none());

    let point = buffer
        .compute_pressure(akahama, 1.5, 298.0, 1334.0, 298.0)
        .unwrap()
        .clone();
    assert_eq!(point.x.as_f64(), Some(1340.0));
    assert_eq!(
        point.p.as_f64(),
        Some(akahama.pressure(1340.0, 298.0, 1334.0, 298.0))
    );
    assert_eq!(point.calib, akahama.name);
    assert_eq!(point.file, "diamond");
    assert_eq!(buffer.point(), Some(&point));
}
