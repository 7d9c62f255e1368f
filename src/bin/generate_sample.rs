//! generate_sample: write a synthetic ruby fluorescence spectrum at a given
//! pressure, with spectrometer-style header and footer lines.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use pressure_gauge::fit::profiles::voigt;
use pressure_gauge::{CalibrationRegistry, InversionSettings};

/// R1–R2 splitting of ruby, nm.
const R2_OFFSET: f64 = 1.5;

#[derive(Parser)]
#[command(name = "generate_sample", version, about = "Write a synthetic ruby spectrum")]
struct Cli {
    /// Pressure in GPa
    #[arg(short, long, default_value_t = 10.0)]
    pressure: f64,

    /// Gaussian noise level relative to the R1 height
    #[arg(short, long, default_value_t = 0.01)]
    noise: f64,

    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Output file
    #[arg(short, long, default_value = "sample_ruby.txt")]
    out: PathBuf,
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5)).rotate_left(7).wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    let mut rng = SimpleRng::new(cli.seed);

    let calibrations = CalibrationRegistry::standard();
    let ruby = calibrations.require("Ruby2020")?;
    let r1 = ruby
        .invert(cli.pressure, 298.0, ruby.x0_default, 298.0, &InversionSettings::default())
        .with_context(|| format!("No ruby line position for {} GPa", cli.pressure))?;
    let r2 = r1 - R2_OFFSET;

    // 1340 pixels over 20 nm around the doublet
    let x: Vec<f64> = (0..1340).map(|i| r1 - 12.0 + i as f64 * 0.015).collect();
    let peak = voigt(0.0, 1.0, 0.0, 0.12, 0.2);
    let y: Vec<f64> = x
        .iter()
        .map(|&xi| {
            let signal = voigt(xi, 1.0, r1, 0.12, 0.2) + voigt(xi, 0.6, r2, 0.12, 0.2);
            let baseline = 0.05 + 0.002 * (xi - r1);
            1000.0 * (signal / peak + baseline + rng.gauss(0.0, cli.noise))
        })
        .collect();

    let file = File::create(&cli.out)
        .with_context(|| format!("Failed to create {}", cli.out.display()))?;
    let mut w = BufWriter::new(file);
    writeln!(w, "Synthetic ruby spectrum")?;
    writeln!(w, "Pressure (GPa):\t{}", cli.pressure)?;
    writeln!(w, "R1 (nm):\t{r1:.4}")?;
    writeln!(w, "Integration time (ms):\t100")?;
    writeln!(w, ">>>>>Begin Spectral Data<<<<<")?;
    for (xi, yi) in x.iter().zip(&y) {
        writeln!(w, "{xi:.4}\t{yi:.2}")?;
    }
    writeln!(w, ">>>>>End Spectral Data<<<<<")?;
    w.flush()?;

    println!(
        "Wrote {} samples to {} (R1 = {r1:.4} nm at {} GPa)",
        x.len(),
        cli.out.display(),
        cli.pressure
    );
    Ok(())
}
