//! Not-a-knot cubic spline used by the wind and solar daily profiles.

use nalgebra::{DMatrix, DVector};

/// Reasons a knot set cannot define a spline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SplineError {
    #[error("cubic spline needs at least 4 knots, got {0}")]
    TooFewKnots(usize),
    #[error("knot vectors differ in length ({xs} x values, {ys} y values)")]
    LengthMismatch { xs: usize, ys: usize },
    #[error("knots must be strictly increasing and finite")]
    NotIncreasing,
    #[error("knot system is singular")]
    Singular,
}

/// Interpolating cubic spline through `(x, y)` knots.
///
/// Uses not-a-knot end conditions (third derivative continuous across the
/// second and second-to-last knots), so a profile sampled at its knots is
/// reproduced exactly and the curve between knots has no artificial
/// flattening at the ends.
#[derive(Debug, Clone)]
pub struct CubicSpline {
    xs: Vec<f64>,
    ys: Vec<f64>,
    /// Second derivative at each knot.
    m: Vec<f64>,
}

impl CubicSpline {
    /// Builds a spline through the given knots.
    ///
    /// # Errors
    ///
    /// Returns a [`SplineError`] if fewer than 4 knots are given, if lengths
    /// differ, if `xs` is not strictly increasing, or if the second-derivative
    /// system has no unique solution.
    pub fn new(xs: Vec<f64>, ys: Vec<f64>) -> Result<Self, SplineError> {
        let n = xs.len();
        if n < 4 {
            return Err(SplineError::TooFewKnots(n));
        }
        if n != ys.len() {
            return Err(SplineError::LengthMismatch { xs: n, ys: ys.len() });
        }
        if !xs.iter().all(|x| x.is_finite()) || !xs.windows(2).all(|w| w[1] > w[0]) {
            return Err(SplineError::NotIncreasing);
        }

        let h: Vec<f64> = xs.windows(2).map(|w| w[1] - w[0]).collect();
        let mut a = DMatrix::<f64>::zeros(n, n);
        let mut rhs = DVector::<f64>::zeros(n);

        // Not-a-knot at the left end.
        a[(0, 0)] = h[1];
        a[(0, 1)] = -(h[0] + h[1]);
        a[(0, 2)] = h[0];

        for i in 1..n - 1 {
            a[(i, i - 1)] = h[i - 1];
            a[(i, i)] = 2.0 * (h[i - 1] + h[i]);
            a[(i, i + 1)] = h[i];
            rhs[i] = 6.0 * ((ys[i + 1] - ys[i]) / h[i] - (ys[i] - ys[i - 1]) / h[i - 1]);
        }

        // Not-a-knot at the right end.
        a[(n - 1, n - 3)] = h[n - 2];
        a[(n - 1, n - 2)] = -(h[n - 3] + h[n - 2]);
        a[(n - 1, n - 1)] = h[n - 3];

        let m = a.lu().solve(&rhs).ok_or(SplineError::Singular)?;
        if !m.iter().all(|v| v.is_finite()) {
            return Err(SplineError::Singular);
        }
        Ok(Self {
            xs,
            ys,
            m: m.iter().copied().collect(),
        })
    }

    /// Builds a spline over knots evenly spaced across `[start, end]`.
    ///
    /// # Errors
    ///
    /// Same as [`CubicSpline::new`].
    pub fn evenly_spaced(start: f64, end: f64, ys: Vec<f64>) -> Result<Self, SplineError> {
        let n = ys.len();
        let step = if n > 1 { (end - start) / (n - 1) as f64 } else { 0.0 };
        let xs = (0..n).map(|i| start + step * i as f64).collect();
        Self::new(xs, ys)
    }

    /// First knot.
    pub fn x_min(&self) -> f64 {
        self.xs[0]
    }

    /// Last knot.
    pub fn x_max(&self) -> f64 {
        self.xs[self.xs.len() - 1]
    }

    /// Evaluates the spline at `x`, or `None` outside the knot range.
    pub fn eval(&self, x: f64) -> Option<f64> {
        if !(self.x_min()..=self.x_max()).contains(&x) {
            return None;
        }
        // Index of the interval containing x; the last knot belongs to the last interval.
        let i = match self.xs.partition_point(|k| *k <= x) {
            0 => 0,
            p => (p - 1).min(self.xs.len() - 2),
        };
        let (x0, x1) = (self.xs[i], self.xs[i + 1]);
        let (y0, y1) = (self.ys[i], self.ys[i + 1]);
        let (m0, m1) = (self.m[i], self.m[i + 1]);
        let h = x1 - x0;
        let left = x1 - x;
        let right = x - x0;

        Some(
            m0 * left.powi(3) / (6.0 * h)
                + m1 * right.powi(3) / (6.0 * h)
                + (y0 / h - m0 * h / 6.0) * left
                + (y1 / h - m1 * h / 6.0) * right,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn reproduces_knots() {
        let ys = vec![1.0, 3.0, 2.0, 5.0, 4.0, 0.5];
        let spline = CubicSpline::new((0..6).map(f64::from).collect(), ys.clone()).expect("valid knots");
        for (i, y) in ys.iter().enumerate() {
            assert_abs_diff_eq!(spline.eval(i as f64).unwrap_or(f64::NAN), *y, epsilon = 1e-9);
        }
    }

    #[test]
    fn exact_for_cubic_polynomial() {
        // Not-a-knot reproduces any cubic exactly.
        let f = |x: f64| 0.5 * x.powi(3) - 2.0 * x.powi(2) + x - 3.0;
        let xs: Vec<f64> = (0..8).map(|i| f64::from(i) * 0.7).collect();
        let ys = xs.iter().map(|x| f(*x)).collect();
        let spline = CubicSpline::new(xs, ys).expect("valid knots");
        for x in [0.1, 1.3, 2.2, 3.9, 4.85] {
            assert_abs_diff_eq!(spline.eval(x).unwrap_or(f64::NAN), f(x), epsilon = 1e-8);
        }
    }

    #[test]
    fn outside_range_is_none() {
        let spline = CubicSpline::evenly_spaced(0.0, 3.0, vec![0.0, 1.0, 0.0, 1.0]).expect("valid knots");
        assert!(spline.eval(-0.01).is_none());
        assert!(spline.eval(3.01).is_none());
        assert!(spline.eval(3.0).is_some());
    }

    #[test]
    fn evenly_spaced_spans_range() {
        let spline = CubicSpline::evenly_spaced(0.0, 24.0, vec![1.0; 24]).expect("valid knots");
        assert_abs_diff_eq!(spline.x_max(), 24.0);
        assert_abs_diff_eq!(spline.eval(17.3).unwrap_or(f64::NAN), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn too_few_knots_is_an_error() {
        let err = CubicSpline::new(vec![0.0, 1.0, 2.0], vec![0.0, 1.0, 2.0]);
        assert_eq!(err.err(), Some(SplineError::TooFewKnots(3)));
    }

    #[test]
    fn mismatched_lengths_are_an_error() {
        let err = CubicSpline::new(vec![0.0, 1.0, 2.0, 3.0], vec![0.0, 1.0, 2.0]);
        assert_eq!(err.err(), Some(SplineError::LengthMismatch { xs: 4, ys: 3 }));
    }

    #[test]
    fn repeated_or_unordered_knots_are_an_error() {
        for xs in [
            vec![0.0, 1.0, 1.0, 2.0],
            vec![0.0, 2.0, 1.0, 3.0],
            vec![0.0, 1.0, f64::NAN, 3.0],
        ] {
            let err = CubicSpline::new(xs, vec![0.0; 4]);
            assert_eq!(err.err(), Some(SplineError::NotIncreasing));
        }
    }

    #[test]
    fn non_finite_values_are_singular() {
        let err = CubicSpline::new(vec![0.0, 1.0, 2.0, 3.0], vec![0.0, f64::INFINITY, 1.0, 0.0]);
        assert_eq!(err.err(), Some(SplineError::Singular));
    }

    #[test]
    fn uneven_spacing_interpolates_a_line_exactly() {
        let xs = vec![0.0, 0.5, 2.0, 2.25, 5.0];
        let ys = xs.iter().map(|x| 3.0 * x - 1.0).collect();
        let spline = CubicSpline::new(xs, ys).expect("valid knots");
        for x in [0.2, 1.1, 2.1, 4.0] {
            assert_abs_diff_eq!(spline.eval(x).unwrap_or(f64::NAN), 3.0 * x - 1.0, epsilon = 1e-9);
        }
    }
}
