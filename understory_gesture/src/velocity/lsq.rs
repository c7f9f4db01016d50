// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Weighted least-squares polynomial fitting.

use alloc::vec;
use alloc::vec::Vec;

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;

/// Values whose magnitude is below this are treated as zero.
pub(crate) const PRECISION_ERROR_TOLERANCE: f64 = 1e-10;

/// A polynomial fitted to a set of samples.
#[derive(Clone, Debug, PartialEq)]
pub struct PolynomialFit {
    /// Coefficients, lowest order first.
    pub coefficients: Vec<f64>,
    /// Coefficient of determination of the fit, at most `1.0`.
    pub confidence: f64,
}

impl PolynomialFit {
    fn new(degree: usize) -> Self {
        Self {
            coefficients: vec![0.0; degree + 1],
            confidence: 0.0,
        }
    }
}

/// Fits `y ≈ c0 + c1·x + … + cn·xⁿ` to weighted samples.
#[derive(Clone, Copy, Debug)]
pub struct LeastSquaresSolver<'a> {
    x: &'a [f64],
    y: &'a [f64],
    w: &'a [f64],
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(a, b)| a * b).sum()
}

impl<'a> LeastSquaresSolver<'a> {
    /// Create a solver over samples `(x[i], y[i])` weighted by `w[i]`.
    ///
    /// # Panics
    ///
    /// Panics if the slices differ in length.
    pub fn new(x: &'a [f64], y: &'a [f64], w: &'a [f64]) -> Self {
        assert!(
            x.len() == y.len() && y.len() == w.len(),
            "sample slices must have equal length"
        );
        Self { x, y, w }
    }

    /// Fit a polynomial of `degree`.
    ///
    /// Returns `None` when there are too few samples or the weighted design
    /// matrix is numerically rank deficient.
    #[allow(
        clippy::needless_range_loop,
        reason = "Matrix code reads clearer with explicit indices."
    )]
    pub fn solve(&self, degree: usize) -> Option<PolynomialFit> {
        if degree > self.x.len() {
            return None;
        }
        let mut result = PolynomialFit::new(degree);
        let m = self.x.len();
        let n = degree + 1;

        // Rows of the weighted Vandermonde matrix: a[i][h] = w[h] * x[h]^i.
        let mut a = vec![vec![0.0; m]; n];
        for h in 0..m {
            a[0][h] = self.w[h];
            for i in 1..n {
                a[i][h] = a[i - 1][h] * self.x[h];
            }
        }

        // Gram-Schmidt: rows of q are orthonormal, r is upper triangular.
        let mut q = vec![vec![0.0; m]; n];
        let mut r = vec![vec![0.0; n]; n];
        for j in 0..n {
            q[j].copy_from_slice(&a[j]);
            for i in 0..j {
                let d = dot(&q[j], &q[i]);
                for h in 0..m {
                    q[j][h] -= d * q[i][h];
                }
            }
            let norm = dot(&q[j], &q[j]).sqrt();
            if norm < PRECISION_ERROR_TOLERANCE {
                return None;
            }
            let inverse_norm = 1.0 / norm;
            for v in &mut q[j] {
                *v *= inverse_norm;
            }
            for i in j..n {
                r[j][i] = dot(&q[j], &a[i]);
            }
        }

        // Back-substitute R·b = Qᵀ·W·y.
        let wy: Vec<f64> = self.y.iter().zip(self.w).map(|(y, w)| y * w).collect();
        for i in (0..n).rev() {
            let mut c = dot(&q[i], &wy);
            for j in (i + 1..n).rev() {
                c -= r[i][j] * result.coefficients[j];
            }
            result.coefficients[i] = c / r[i][i];
        }

        // Confidence: 1 - (weighted residual / weighted total sum of squares).
        let y_mean = self.y.iter().sum::<f64>() / m as f64;
        let mut sum_squared_error = 0.0;
        let mut sum_squared_total = 0.0;
        for h in 0..m {
            let mut term = 1.0;
            let mut err = self.y[h] - result.coefficients[0];
            for i in 1..n {
                term *= self.x[h];
                err -= term * result.coefficients[i];
            }
            let w2 = self.w[h] * self.w[h];
            sum_squared_error += w2 * err * err;
            let v = self.y[h] - y_mean;
            sum_squared_total += w2 * v * v;
        }
        result.confidence = if sum_squared_total <= PRECISION_ERROR_TOLERANCE {
            1.0
        } else {
            1.0 - sum_squared_error / sum_squared_total
        };
        Some(result)
    }
}
