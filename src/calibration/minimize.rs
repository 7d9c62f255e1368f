//! Derivative-free scalar minimization: downhill bracketing followed by
//! Brent's parabolic/golden-section search.

use crate::error::{Error, Result};

const GOLDEN: f64 = 1.618_033_988_749_895;
const CGOLD: f64 = 0.381_966_011_250_105;
const ZEPS: f64 = 1e-12;
const MAX_BRACKET_STEPS: usize = 200;

/// Three abscissas with `f(b) <= f(a)` and `f(b) <= f(c)`.
#[derive(Debug, Clone, Copy)]
struct Bracket {
    a: f64,
    b: f64,
    c: f64,
    fb: f64,
}

fn bracket<F: Fn(f64) -> f64>(f: &F, start: f64, step: f64) -> Result<Bracket> {
    let (mut a, mut b) = (start, start + step);
    let (mut fa, mut fb) = (f(a), f(b));
    if !fa.is_finite() || !fb.is_finite() {
        return Err(Error::FitConvergence(format!(
            "objective is not finite near {start}"
        )));
    }
    if fb > fa {
        std::mem::swap(&mut a, &mut b);
        std::mem::swap(&mut fa, &mut fb);
    }
    let mut c = b + GOLDEN * (b - a);
    let mut fc = f(c);
    let mut steps = 0;
    while fc < fb {
        steps += 1;
        if steps > MAX_BRACKET_STEPS || !fc.is_finite() {
            return Err(Error::FitConvergence(format!(
                "no minimum bracketed from {start}"
            )));
        }
        a = b;
        b = c;
        fb = fc;
        c = b + GOLDEN * (b - a);
        fc = f(c);
    }
    Ok(Bracket { a, b, c, fb })
}

/// Minimize `f` starting from `start`.
///
/// Convergence is on the abscissa: the search stops once the bracket is
/// narrower than about `2 * tol`.
pub fn minimize_scalar<F: Fn(f64) -> f64>(
    f: F,
    start: f64,
    tol: f64,
    max_iterations: usize,
) -> Result<f64> {
    let br = bracket(&f, start, 1.0)?;
    let (mut a, mut b) = if br.a < br.c {
        (br.a, br.c)
    } else {
        (br.c, br.a)
    };

    let mut x = br.b;
    let mut w = x;
    let mut v = x;
    let mut fx = br.fb;
    let mut fw = fx;
    let mut fv = fx;
    let mut d: f64 = 0.0;
    let mut e: f64 = 0.0;

    for iter in 0..max_iterations {
        let xm = 0.5 * (a + b);
        let tol1 = tol + ZEPS * x.abs();
        let tol2 = 2.0 * tol1;
        if (x - xm).abs() <= tol2 - 0.5 * (b - a) {
            log::debug!("Brent converged after {iter} iterations at x = {x}");
            return Ok(x);
        }

        let mut golden = true;
        if e.abs() > tol1 {
            // trial parabola through x, v, w
            let r = (x - w) * (fx - fv);
            let mut q = (x - v) * (fx - fw);
            let mut p = (x - v) * q - (x - w) * r;
            q = 2.0 * (q - r);
            if q > 0.0 {
                p = -p;
            }
            q = q.abs();
            let e_prev = e;
            if p.abs() < (0.5 * q * e_prev).abs() && p > q * (a - x) && p < q * (b - x) {
                e = d;
                d = p / q;
                let u = x + d;
                if u - a < tol2 || b - u < tol2 {
                    d = tol1.copysign(xm - x);
                }
                golden = false;
            }
        }
        if golden {
            e = if x >= xm { a - x } else { b - x };
            d = CGOLD * e;
        }

        let u = if d.abs() >= tol1 {
            x + d
        } else {
            x + tol1.copysign(d)
        };
        let fu = f(u);
        if !fu.is_finite() {
            return Err(Error::FitConvergence(format!(
                "objective is not finite at {u}"
            )));
        }

        if fu <= fx {
            if u >= x {
                a = x;
            } else {
                b = x;
            }
            v = w;
            fv = fw;
            w = x;
            fw = fx;
            x = u;
            fx = fu;
        } else {
            if u < x {
                a = u;
            } else {
                b = u;
            }
            if fu <= fw || w == x {
                v = w;
                fv = fw;
                w = u;
                fw = fu;
            } else if fu <= fv || v == x || v == w {
                v = u;
                fv = fu;
            }
        }
    }

    Err(Error::FitConvergence(format!(
        "no convergence after {max_iterations} iterations"
    )))
}
