//! pgauge: fit pressure-gauge spectra and convert line positions to pressure.

use std::io;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};

use pressure_gauge::data::loader::latest_spectrum_file;
use pressure_gauge::{
    CalibrationRegistry, FitModelRegistry, PressurePointTable, Settings, SpectrumBuffer,
};

const SPECTRUM_EXTENSIONS: [&str; 4] = ["txt", "asc", "csv", "dat"];

#[derive(Parser)]
#[command(
    name = "pgauge",
    version,
    about = "Spectral pressure gauge for diamond-anvil-cell experiments"
)]
struct Cli {
    /// JSON file overriding the numeric settings
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output (RUST_LOG takes precedence)
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the fit models
    Models,
    /// List the calibrations
    Calibrations,
    /// Fit a spectrum and report its pressure
    Fit(FitArgs),
    /// Pressure for a spectral position
    Pressure {
        /// Spectral position (nm or cm-1)
        x: f64,
        #[command(flatten)]
        reference: Reference,
    },
    /// Spectral position for a pressure
    Invert {
        /// Pressure in GPa
        p: f64,
        #[command(flatten)]
        reference: Reference,
    },
    /// Print a saved pressure table
    TableShow { path: PathBuf },
}

#[derive(Args)]
struct Reference {
    /// Calibration name
    #[arg(long, default_value = "Ruby2020")]
    calib: String,
    /// Sample temperature (K)
    #[arg(short = 't', long, default_value_t = 298.0)]
    temperature: f64,
    /// Reference position; defaults to the calibration's
    #[arg(long)]
    x0: Option<f64>,
    /// Reference temperature (K)
    #[arg(long, default_value_t = 298.0)]
    t0: f64,
}

#[derive(Args)]
struct FitArgs {
    /// Spectrum file
    #[arg(required_unless_present = "latest")]
    file: Option<PathBuf>,
    /// Use the most recent spectrum in this directory instead
    #[arg(long, conflicts_with = "file")]
    latest: Option<PathBuf>,
    /// Fit model name
    #[arg(short, long, default_value = "Double Voigt")]
    model: String,
    /// Approximate line position; skips automatic peak detection
    #[arg(short, long)]
    guess: Option<f64>,
    /// Moving-average window applied before fitting
    #[arg(long)]
    smooth: Option<usize>,
    /// Subtract a convex-hull background before fitting
    #[arg(long, default_value_t = false)]
    hull: bool,
    /// Manometer pressure recorded with the point
    #[arg(long, default_value_t = 0.0)]
    pm: f64,
    /// Append the point to this table (created when missing)
    #[arg(long)]
    append: Option<PathBuf>,
    #[command(flatten)]
    reference: Reference,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let settings = match &cli.config {
        Some(path) => Settings::from_json_file(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => Settings::default(),
    };
    let models = FitModelRegistry::standard();
    let calibrations = CalibrationRegistry::standard();

    match cli.command {
        Command::Models => {
            for model in models.iter() {
                let kind = if model.is_edge() { "edge" } else { "peak" };
                println!("{}\t{kind}", model.name);
            }
        }
        Command::Calibrations => {
            for c in calibrations.iter() {
                println!(
                    "{}\t{} ({})\tx0 = {}\tT correction: {}",
                    c.name, c.x_name, c.x_unit, c.x0_default, c.t_correction
                );
            }
        }
        Command::Pressure { x, reference } => {
            let calib = calibrations.require(&reference.calib)?;
            let x0 = reference.x0.unwrap_or(calib.x0_default);
            let p = calib.pressure(x, reference.temperature, x0, reference.t0);
            println!("P = {p:.3} GPa");
        }
        Command::Invert { p, reference } => {
            let calib = calibrations.require(&reference.calib)?;
            let x0 = reference.x0.unwrap_or(calib.x0_default);
            let x = calib
                .invert(p, reference.temperature, x0, reference.t0, &settings.inversion)
                .with_context(|| format!("Failed to invert {} at {p} GPa", calib.name))?;
            println!("{} = {x:.4} {}", calib.x_name, calib.x_unit);
        }
        Command::TableShow { path } => {
            let mut table = PressurePointTable::new(calibrations, settings.inversion.clone());
            table
                .load_tsv(&path)
                .with_context(|| format!("Failed to read table {}", path.display()))?;
            table.write_tsv(io::stdout().lock())?;
        }
        Command::Fit(args) => run_fit(args, &settings, &models, calibrations)?,
    }
    Ok(())
}

fn run_fit(
    args: FitArgs,
    settings: &Settings,
    models: &FitModelRegistry,
    calibrations: CalibrationRegistry,
) -> Result<()> {
    let path = match (&args.file, &args.latest) {
        (Some(file), _) => file.clone(),
        (None, Some(dir)) => latest_spectrum_file(dir, &SPECTRUM_EXTENSIONS)?
            .with_context(|| format!("No spectrum file in {}", dir.display()))?,
        (None, None) => bail!("Give a spectrum file or --latest <dir>"),
    };

    let model = models.require(&args.model)?;
    let calib = calibrations.require(&args.reference.calib)?;

    let mut buffer = SpectrumBuffer::load(&path, &settings.parser)
        .with_context(|| format!("Failed to load {}", path.display()))?;
    if let Some(window) = args.smooth {
        buffer.smoothen(window)?;
    }
    if args.hull {
        buffer.convexhull_background()?;
    }

    let feature = buffer
        .fit(model, args.guess, &settings.fit)
        .with_context(|| format!("Fit of {} with {} failed", buffer.name, model.name))?;

    let x0 = args.reference.x0.unwrap_or(calib.x0_default);
    let point = buffer
        .compute_pressure(calib, args.pm, args.reference.temperature, x0, args.reference.t0)?
        .clone();
    println!(
        "{}\t{} = {feature:.4} {}\tP = {} GPa",
        buffer.name, calib.x_name, calib.x_unit, point.p
    );

    if let Some(table_path) = &args.append {
        let mut table = PressurePointTable::new(calibrations.clone(), settings.inversion.clone());
        if table_path.exists() {
            table.load_tsv(table_path)?;
        }
        table.add(&point);
        table
            .save_tsv(table_path)
            .with_context(|| format!("Failed to write {}", table_path.display()))?;
        log::info!("{} row(s) in {}", table.len(), table_path.display());
    }
    Ok(())
}
