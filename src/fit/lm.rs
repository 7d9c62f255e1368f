//! Levenberg–Marquardt nonlinear least squares with a forward-difference
//! Jacobian and Marquardt diagonal scaling.
//!
//! # References
//! * J. J. Moré (1978). "The Levenberg–Marquardt algorithm: implementation
//!   and theory." Lecture Notes in Mathematics 630.
//! * Henri P. Gavin (2024). "The Levenberg–Marquardt algorithm for nonlinear
//!   least squares curve-fitting problems."

use nalgebra::{DMatrix, DVector};

use crate::error::{Error, Result};

#[derive(Clone, Debug)]
pub struct LevenbergMarquardtOptions {
    /// Stop when an accepted step reduces the sum of squares by less than
    /// this relative amount.
    pub ftol: f64,
    /// Stop when the step is smaller than `xtol * (|p| + xtol)`.
    pub xtol: f64,
    pub max_evaluations: usize,
    pub initial_damping: f64,
    pub damping_step_up: f64,
    pub damping_step_down: f64,
}

impl Default for LevenbergMarquardtOptions {
    fn default() -> Self {
        Self {
            ftol: 1e-8,
            xtol: 1e-8,
            max_evaluations: 2000,
            initial_damping: 1e-3,
            damping_step_up: 10.0,
            damping_step_down: 10.0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct LevenbergMarquardtReturn {
    pub parameters: Vec<f64>,
    /// `(JᵀJ)⁻¹ · SSR / (m − n)`; every entry is `+inf` when it cannot be
    /// estimated.
    pub covariance: DMatrix<f64>,
    pub sum_of_squares: f64,
    pub evaluations: usize,
}

struct Problem<'a, F> {
    x: &'a [f64],
    y: &'a [f64],
    model: F,
    evaluations: usize,
    max_evaluations: usize,
}

impl<F: Fn(f64, &[f64]) -> f64> Problem<'_, F> {
    fn residuals(&mut self, p: &[f64]) -> Result<DVector<f64>> {
        if self.evaluations >= self.max_evaluations {
            return Err(Error::FitConvergence(format!(
                "no convergence after {} function evaluations",
                self.evaluations
            )));
        }
        self.evaluations += 1;
        Ok(DVector::from_iterator(
            self.x.len(),
            self.x
                .iter()
                .zip(self.y)
                .map(|(&xi, &yi)| (self.model)(xi, p) - yi),
        ))
    }

    fn jacobian(&mut self, p: &[f64], r: &DVector<f64>) -> Result<DMatrix<f64>> {
        let eps = f64::EPSILON.sqrt();
        let mut jac = DMatrix::<f64>::zeros(self.x.len(), p.len());
        let mut shifted = p.to_vec();
        for j in 0..p.len() {
            let h = if p[j] == 0.0 { eps } else { eps * p[j].abs() };
            shifted[j] = p[j] + h;
            let r_h = self.residuals(&shifted)?;
            shifted[j] = p[j];
            if r_h.iter().any(|v| !v.is_finite()) {
                return Err(Error::FitConvergence(format!(
                    "model is not finite next to parameter {j} = {}",
                    p[j]
                )));
            }
            jac.set_column(j, &((r_h - r) / h));
        }
        Ok(jac)
    }
}

fn sum_of_squares(r: &DVector<f64>) -> f64 {
    r.dot(r)
}

/// Fit `model(x, p)` to `y` starting from `initial`.
pub fn levenberg_marquardt<F>(
    x: &[f64],
    y: &[f64],
    model: F,
    initial: &[f64],
    options: &LevenbergMarquardtOptions,
) -> Result<LevenbergMarquardtReturn>
where
    F: Fn(f64, &[f64]) -> f64,
{
    if x.len() != y.len() {
        return Err(Error::Validation("x and y lengths differ".into()));
    }
    if initial.is_empty() {
        return Err(Error::Validation("no parameters to fit".into()));
    }

    let mut problem = Problem {
        x,
        y,
        model,
        evaluations: 0,
        max_evaluations: options.max_evaluations,
    };
    let n = initial.len();

    let mut p = initial.to_vec();
    let mut r = problem.residuals(&p)?;
    let mut ssr = sum_of_squares(&r);
    if !ssr.is_finite() {
        return Err(Error::FitConvergence(
            "model is not finite at the initial guess".into(),
        ));
    }

    let mut damping: Option<f64> = None;
    let mut scale = DVector::<f64>::zeros(n);

    'outer: loop {
        if ssr == 0.0 {
            break;
        }
        let jac = problem.jacobian(&p, &r)?;
        let jtj = jac.transpose() * &jac;
        let gradient = jac.transpose() * &r;
        if gradient.iter().all(|g| *g == 0.0) {
            break;
        }

        // scale never shrinks between iterations
        for j in 0..n {
            scale[j] = scale[j].max(jtj[(j, j)]).max(f64::MIN_POSITIVE);
        }
        let mut lambda =
            damping.unwrap_or_else(|| options.initial_damping * scale.max());

        loop {
            let mut lhs = jtj.clone();
            for j in 0..n {
                lhs[(j, j)] += lambda * scale[j];
            }
            let step = match lhs.cholesky() {
                Some(chol) => -chol.solve(&gradient),
                None => {
                    lambda *= options.damping_step_up;
                    if !lambda.is_finite() {
                        return Err(Error::FitConvergence(
                            "normal equations stay singular at any damping".into(),
                        ));
                    }
                    continue;
                }
            };

            let candidate: Vec<f64> = p.iter().zip(step.iter()).map(|(a, b)| a + b).collect();
            let r_new = problem.residuals(&candidate)?;
            let ssr_new = sum_of_squares(&r_new);

            let p_norm = p.iter().map(|v| v * v).sum::<f64>().sqrt();
            let small_step = step.norm() <= options.xtol * (p_norm + options.xtol);

            if ssr_new.is_finite() && ssr_new < ssr {
                let reduction = (ssr - ssr_new) / ssr;
                p = candidate;
                r = r_new;
                ssr = ssr_new;
                damping = Some(lambda / options.damping_step_down);
                log::debug!(
                    "LM step accepted: ssr={ssr:.6e}, lambda={lambda:.3e}, evals={}",
                    problem.evaluations
                );
                if reduction <= options.ftol || small_step {
                    break 'outer;
                }
                continue 'outer;
            }

            if small_step {
                // no descent left at the resolution of the parameters
                break 'outer;
            }
            lambda *= options.damping_step_up;
            if !lambda.is_finite() {
                return Err(Error::FitConvergence(
                    "damping diverged without reducing the residual".into(),
                ));
            }
        }
    }

    let covariance = covariance(&mut problem, &p, &r, ssr)?;
    Ok(LevenbergMarquardtReturn {
        parameters: p,
        covariance,
        sum_of_squares: ssr,
        evaluations: problem.evaluations,
    })
}

fn covariance<F: Fn(f64, &[f64]) -> f64>(
    problem: &mut Problem<'_, F>,
    p: &[f64],
    r: &DVector<f64>,
    ssr: f64,
) -> Result<DMatrix<f64>> {
    let n = p.len();
    let m = problem.x.len();
    let undetermined = DMatrix::from_element(n, n, f64::INFINITY);
    if m <= n {
        log::warn!("Covariance undetermined: {m} samples for {n} parameters");
        return Ok(undetermined);
    }
    // the final Jacobian is not budgeted against the iteration limit
    problem.max_evaluations = problem.evaluations + n;
    let jac = match problem.jacobian(p, r) {
        Ok(jac) => jac,
        Err(Error::FitConvergence(msg)) => {
            log::warn!("Covariance undetermined: {msg}");
            return Ok(undetermined);
        }
        Err(e) => return Err(e),
    };
    match (jac.transpose() * &jac).try_inverse() {
        Some(inv) => Ok(inv * (ssr / (m - n) as f64)),
        None => {
            log::warn!("Covariance undetermined: singular normal matrix");
            Ok(undetermined)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn straight_line() {
        let x: Vec<f64> = (0..7).map(|i| i as f64).collect();
        let y: Vec<f64> = x.iter().map(|v| 2.0 * v - 2.0).collect();
        let fit = levenberg_marquardt(
            &x,
            &y,
            |x, p| p[0] * x + p[1],
            &[1.0, 0.0],
            &LevenbergMarquardtOptions::default(),
        )
        .unwrap();
        assert!((fit.parameters[0] - 2.0).abs() < 1e-6);
        assert!((fit.parameters[1] + 2.0).abs() < 1e-6);
    }

    #[test]
    fn exhausted_budget_is_an_error() {
        let x: Vec<f64> = (0..50).map(|i| i as f64 * 0.1).collect();
        let y: Vec<f64> = x.iter().map(|v| (1.3 * v).sin()).collect();
        let opts = LevenbergMarquardtOptions {
            max_evaluations: 3,
            ..Default::default()
        };
        let r = levenberg_marquardt(&x, &y, |x, p| (p[0] * x).sin(), &[0.2], &opts);
        assert!(matches!(r, Err(Error::FitConvergence(_))));
    }

    #[test]
    fn model_undefined_past_the_start_fails_cleanly() {
        let x: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let y: Vec<f64> = x.iter().map(|v| 1.5 * v).collect();
        let r = levenberg_marquardt(
            &x,
            &y,
            |x, p| if p[0] > 1.0 { f64::NAN } else { p[0] * x },
            &[1.0],
            &LevenbergMarquardtOptions::default(),
        );
        assert!(matches!(r, Err(Error::FitConvergence(_))));
    }

    #[test]
    fn infinite_jacobian_is_rejected() {
        let x: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let y = vec![1.0; 10];
        let mut problem = Problem {
            x: &x,
            y: &y,
            model: |_: f64, p: &[f64]| if p[0] > 2.0 { f64::INFINITY } else { p[0] },
            evaluations: 0,
            max_evaluations: 100,
        };
        let r0 = problem.residuals(&[2.0]).unwrap();
        assert!(matches!(
            problem.jacobian(&[2.0], &r0),
            Err(Error::FitConvergence(_))
        ));
    }
}
