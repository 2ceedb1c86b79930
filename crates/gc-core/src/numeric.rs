use crate::CoreError;

/// Floating point type used throughout the engine
pub type Real = f64;

/// Absolute/relative tolerance pair for float comparisons.
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, CoreError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(CoreError::NonFinite { what, value: v })
    }
}

/// True when every sample equals the first one within `tol`.
///
/// Empty and single-sample slices are constant.
pub fn is_constant(values: &[Real], tol: Tolerances) -> bool {
    match values.first() {
        Some(&first) => values.iter().all(|&v| nearly_equal(v, first, tol)),
        None => true,
    }
}

/// Smallest strictly positive difference between consecutive samples.
pub fn min_positive_step(time: &[Real]) -> Option<Real> {
    time.windows(2)
        .map(|w| w[1] - w[0])
        .filter(|dt| *dt > 0.0)
        .min_by(|a, b| a.total_cmp(b))
}

/// Evenly spaced grid `start, start + step, ...` that never passes `end`.
///
/// A small slack absorbs accumulated rounding so that `end` itself is kept when
/// it lies on the grid.
pub fn fixed_step_grid(start: Real, end: Real, step: Real) -> Vec<Real> {
    if step.is_nan() || step <= 0.0 || !start.is_finite() || !end.is_finite() || end < start {
        return Vec::new();
    }
    let n = ((end - start) / step + 1e-9).floor() as usize + 1;
    (0..n).map(|i| (start + i as Real * step).min(end)).collect()
}
