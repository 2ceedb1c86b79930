//! Error estimators over one window.

use gc_core::Window;
use serde::{Deserialize, Serialize};

use crate::error::{ComplianceError, ComplianceResult};
use crate::thresholds::MetricKind;

/// Errors of one channel in one window, normalized by the step magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ErrorMetric {
    pub me: f64,
    pub mae: f64,
    pub mxe: f64,
    /// `(time, calculated value)` where the maximum absolute error occurs
    pub position: (f64, f64),
}

impl ErrorMetric {
    pub fn get(&self, metric: MetricKind) -> f64 {
        match metric {
            MetricKind::Me => self.me,
            MetricKind::Mae => self.mae,
            MetricKind::Mxe => self.mxe,
        }
    }
}

pub fn check_step_magnitude(step_magnitude: f64) -> ComplianceResult<()> {
    if step_magnitude.is_finite() && step_magnitude != 0.0 {
        Ok(())
    } else {
        Err(ComplianceError::InvalidStepMagnitude {
            value: step_magnitude,
        })
    }
}

/// Metrics over samples with `window.from <= t <= window.to`.
///
/// Errors are divided by `|step_magnitude|`, so the sign of the mean error is
/// always that of `calculated - reference`, whatever the step direction.
/// Returns `None` for an empty window or one without samples.
pub fn window_metrics(
    time: &[f64],
    calculated: &[f64],
    reference: &[f64],
    window: Window,
    step_magnitude: f64,
) -> ComplianceResult<Option<ErrorMetric>> {
    check_step_magnitude(step_magnitude)?;
    if calculated.len() != time.len() || reference.len() != time.len() {
        return Err(ComplianceError::GridMismatch {
            what: format!(
                "{} time samples, {} calculated, {} reference",
                time.len(),
                calculated.len(),
                reference.len()
            ),
        });
    }
    if window.is_empty() {
        return Ok(None);
    }

    let start = time.partition_point(|&t| t < window.from);
    let end = time.partition_point(|&t| t <= window.to).max(start);
    if start == end {
        return Ok(None);
    }

    let mut sum = 0.0;
    let mut sum_abs = 0.0;
    let mut max_abs = f64::NEG_INFINITY;
    let mut at = start;
    for i in start..end {
        let d = calculated[i] - reference[i];
        sum += d;
        sum_abs += d.abs();
        if d.abs() > max_abs {
            max_abs = d.abs();
            at = i;
        }
    }
    let n = (end - start) as f64;
    let scale = step_magnitude.abs();
    Ok(Some(ErrorMetric {
        me: sum / n / scale,
        mae: sum_abs / n / scale,
        mxe: max_abs / scale,
        position: (time[at], calculated[at]),
    }))
}
