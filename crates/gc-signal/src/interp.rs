//! Monotone piecewise-cubic Hermite interpolation.
//!
//! Slopes follow Fritsch–Carlson: zero at local extrema and at sign changes of
//! the secant, weighted harmonic mean elsewhere. The interpolant never leaves
//! the range of the two samples that bracket it, so a step in the data stays a
//! step without ringing.

use crate::error::{SignalError, SignalResult};

/// Monotone cubic interpolant over strictly increasing abscissae.
#[derive(Debug, Clone)]
pub struct Pchip {
    x: Vec<f64>,
    y: Vec<f64>,
    slopes: Vec<f64>,
}

impl Pchip {
    /// Build the interpolant. `x` must be strictly increasing and as long as `y`.
    pub fn new(x: &[f64], y: &[f64]) -> SignalResult<Self> {
        if x.len() != y.len() {
            return Err(SignalError::InvalidArg {
                what: "interpolation abscissae and ordinates differ in length",
            });
        }
        if x.is_empty() {
            return Err(SignalError::InvalidArg {
                what: "cannot interpolate an empty series",
            });
        }
        if x.windows(2).any(|w| w[1] <= w[0]) {
            return Err(SignalError::InvalidArg {
                what: "interpolation abscissae must be strictly increasing",
            });
        }

        Ok(Self {
            slopes: slopes(x, y),
            x: x.to_vec(),
            y: y.to_vec(),
        })
    }

    /// Evaluate at `xq`; queries outside the data hold the end values.
    pub fn eval(&self, xq: f64) -> f64 {
        let n = self.x.len();
        if n == 1 || xq <= self.x[0] {
            return self.y[0];
        }
        if xq >= self.x[n - 1] {
            return self.y[n - 1];
        }

        // Interval k such that x[k] <= xq < x[k+1]
        let k = self.x.partition_point(|&v| v <= xq) - 1;
        let h = self.x[k + 1] - self.x[k];
        let s = (xq - self.x[k]) / h;
        let s2 = s * s;
        let s3 = s2 * s;

        let h00 = 2.0 * s3 - 3.0 * s2 + 1.0;
        let h10 = s3 - 2.0 * s2 + s;
        let h01 = -2.0 * s3 + 3.0 * s2;
        let h11 = s3 - s2;

        h00 * self.y[k]
            + h10 * h * self.slopes[k]
            + h01 * self.y[k + 1]
            + h11 * h * self.slopes[k + 1]
    }

    pub fn eval_many(&self, xq: &[f64]) -> Vec<f64> {
        xq.iter().map(|&x| self.eval(x)).collect()
    }
}

fn slopes(x: &[f64], y: &[f64]) -> Vec<f64> {
    let n = x.len();
    if n == 1 {
        return vec![0.0];
    }

    let h: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();
    let delta: Vec<f64> = (0..n - 1).map(|k| (y[k + 1] - y[k]) / h[k]).collect();

    if n == 2 {
        return vec![delta[0], delta[0]];
    }

    let mut d = vec![0.0; n];
    for k in 1..n - 1 {
        let (d_prev, d_next) = (delta[k - 1], delta[k]);
        if d_prev == 0.0 || d_next == 0.0 || d_prev.signum() != d_next.signum() {
            d[k] = 0.0;
        } else {
            let w1 = 2.0 * h[k] + h[k - 1];
            let w2 = h[k] + 2.0 * h[k - 1];
            d[k] = (w1 + w2) / (w1 / d_prev + w2 / d_next);
        }
    }

    d[0] = end_slope(h[0], h[1], delta[0], delta[1]);
    d[n - 1] = end_slope(h[n - 2], h[n - 3], delta[n - 2], delta[n - 3]);
    d
}

/// One-sided three-point slope, clipped so the end interval stays monotone.
fn end_slope(h0: f64, h1: f64, delta0: f64, delta1: f64) -> f64 {
    let d = ((2.0 * h0 + h1) * delta0 - h0 * delta1) / (h0 + h1);
    if d.signum() != delta0.signum() || delta0 == 0.0 {
        0.0
    } else if delta0.signum() != delta1.signum() && d.abs() > 3.0 * delta0.abs() {
        3.0 * delta0
    } else {
        d
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn stays_within_bracketing_samples(
            steps in prop::collection::vec(0.001_f64..0.1, 3..30),
            values in prop::collection::vec(-2.0_f64..2.0, 30),
            frac in 0.0_f64..1.0,
        ) {
            let mut x = vec![0.0];
            for dt in &steps {
                let last = *x.last().unwrap();
                x.push(last + dt);
            }
            let y: Vec<f64> = values.iter().take(x.len()).copied().collect();
            prop_assume!(y.len() == x.len());

            let p = Pchip::new(&x, &y).unwrap();
            for k in 0..x.len() - 1 {
                let xq = x[k] + frac * (x[k + 1] - x[k]);
                let v = p.eval(xq);
                let lo = y[k].min(y[k + 1]) - 1e-9;
                let hi = y[k].max(y[k + 1]) + 1e-9;
                prop_assert!(v >= lo && v <= hi);
            }
        }
    }
}
