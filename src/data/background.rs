//! Background (baseline) construction: convex-hull anchors and
//! interpolating B-splines through hand-picked points.

use geo::{ConvexHull, MultiPoint, Point};
use nalgebra::{DMatrix, DVector};

use crate::error::{Error, Result};

use super::filter::interp;

// ---------------------------------------------------------------------------
// Convex hull
// ---------------------------------------------------------------------------

fn cross(o: (f64, f64), a: (f64, f64), b: (f64, f64)) -> f64 {
    (a.0 - o.0) * (b.1 - o.1) - (a.1 - o.1) * (b.0 - o.0)
}

/// Sample indices of the lower convex hull, walking from the minimum-x
/// vertex towards the maximum-x vertex. The maximum-x vertex itself is not
/// part of the result.
pub fn lower_hull_anchors(x: &[f64], y: &[f64]) -> Result<Vec<usize>> {
    if x.len() != y.len() {
        return Err(Error::Validation("x and y lengths differ".into()));
    }
    if x.len() < 3 {
        return Err(Error::Geometry(format!(
            "convex hull needs at least 3 points, got {}",
            x.len()
        )));
    }
    if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
        return Err(Error::Geometry("non-finite sample in hull input".into()));
    }

    let p = |i: usize| (x[i], y[i]);
    let by_xy = |a: &usize, b: &usize| x[*a].total_cmp(&x[*b]).then(y[*a].total_cmp(&y[*b]));
    let (Some(first), Some(last)) = ((0..x.len()).min_by(by_xy), (0..x.len()).max_by(by_xy))
    else {
        return Err(Error::Geometry("empty hull input".into()));
    };
    if (0..x.len()).all(|i| cross(p(first), p(last), p(i)) == 0.0) {
        return Err(Error::Geometry("all points are collinear".into()));
    }

    let points: MultiPoint<f64> = x
        .iter()
        .zip(y)
        .map(|(&xi, &yi)| Point::new(xi, yi))
        .collect();
    let hull = points.convex_hull();

    // counter-clockwise ring, closed; map vertices back to samples
    let mut ring: Vec<usize> = Vec::new();
    for c in hull.exterior().coords() {
        let index = (0..x.len())
            .find(|&i| x[i] == c.x && y[i] == c.y)
            .ok_or_else(|| Error::Geometry(format!("hull vertex ({}, {}) not a sample", c.x, c.y)))?;
        if ring.last() != Some(&index) && ring.first() != Some(&index) {
            ring.push(index);
        }
    }

    // counter-clockwise from the lowest left vertex runs along the bottom
    let start = ring
        .iter()
        .position(|&i| by_xy(&i, &first).is_eq())
        .ok_or_else(|| Error::Geometry("leftmost sample missing from hull".into()))?;
    ring.rotate_left(start);
    let max_x = x[last];
    Ok(ring.into_iter().take_while(|&i| x[i] < max_x).collect())
}

/// Background through the lower-hull anchors, evaluated on every `x`.
/// Returns the background and the anchor indices.
pub fn convex_hull_background(x: &[f64], y: &[f64]) -> Result<(Vec<f64>, Vec<usize>)> {
    let anchors = lower_hull_anchors(x, y)?;
    let ax: Vec<f64> = anchors.iter().map(|&i| x[i]).collect();
    let ay: Vec<f64> = anchors.iter().map(|&i| y[i]).collect();
    let bg = x.iter().map(|&xi| interp(xi, &ax, &ay)).collect();
    Ok((bg, anchors))
}

// ---------------------------------------------------------------------------
// Interpolating spline
// ---------------------------------------------------------------------------

/// B-spline of degree `k` passing exactly through its data points.
///
/// Boundary knots are repeated `k + 1` times; interior knots sit on data
/// points (odd `k`) or between them (even `k`), so with `n = k + 1` points the
/// spline is the single interpolating polynomial. Evaluation outside the data
/// range extends the end polynomial pieces.
#[derive(Debug, Clone)]
pub struct InterpolatingSpline {
    knots: Vec<f64>,
    coefs: Vec<f64>,
    degree: usize,
}

impl InterpolatingSpline {
    pub fn new(xs: &[f64], ys: &[f64], degree: usize) -> Result<Self> {
        let n = xs.len();
        if n != ys.len() {
            return Err(Error::Validation("x and y lengths differ".into()));
        }
        if n < 2 {
            return Err(Error::Geometry(format!(
                "spline needs at least 2 points, got {n}"
            )));
        }
        if degree == 0 || degree >= n {
            return Err(Error::Geometry(format!(
                "spline degree {degree} impossible with {n} points"
            )));
        }
        if xs.windows(2).any(|w| !(w[1] > w[0])) {
            return Err(Error::Geometry(
                "spline abscissae must be strictly increasing".into(),
            ));
        }

        let k = degree;
        let mut knots = vec![xs[0]; k + 1];
        for j in 0..n - k - 1 {
            let t = if k % 2 == 1 {
                xs[j + (k + 1) / 2]
            } else {
                0.5 * (xs[j + k / 2] + xs[j + k / 2 + 1])
            };
            knots.push(t);
        }
        knots.extend(std::iter::repeat(xs[n - 1]).take(k + 1));

        let mut spline = InterpolatingSpline {
            knots,
            coefs: vec![0.0; n],
            degree: k,
        };

        // collocation matrix, one unit coefficient vector per column
        let mut a = DMatrix::<f64>::zeros(n, n);
        for j in 0..n {
            spline.coefs.iter_mut().for_each(|c| *c = 0.0);
            spline.coefs[j] = 1.0;
            for (i, &xi) in xs.iter().enumerate() {
                a[(i, j)] = spline.evaluate(xi);
            }
        }
        let rhs = DVector::from_column_slice(ys);
        let solution = a
            .lu()
            .solve(&rhs)
            .ok_or_else(|| Error::Geometry("singular spline collocation system".into()))?;

        spline.coefs = solution.iter().copied().collect();
        Ok(spline)
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn evaluate(&self, x: f64) -> f64 {
        let k = self.degree;
        let n = self.coefs.len();
        let t = &self.knots;

        // knot span, clamped so that outside points use the end pieces
        let mut l = k;
        while l < n - 1 && x >= t[l + 1] {
            l += 1;
        }

        // de Boor
        let mut d: Vec<f64> = (0..=k).map(|j| self.coefs[j + l - k]).collect();
        for r in 1..=k {
            for j in (r..=k).rev() {
                let left = t[j + l - k];
                let right = t[j + 1 + l - r];
                let alpha = (x - left) / (right - left);
                d[j] = (1.0 - alpha) * d[j - 1] + alpha * d[j];
            }
        }
        d[k]
    }
}
