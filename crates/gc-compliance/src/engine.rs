//! Per-channel metrics, threshold checks and the compliance decision.

use std::collections::BTreeMap;

use gc_core::{Curve, WindowName, WindowSet};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ComplianceError, ComplianceResult};
use crate::family::{ChannelFamily, TestContext};
use crate::metrics::{ErrorMetric, window_metrics};
use crate::thresholds::{MetricKind, Thresholds, limit};

/// Validation windows of a curve pair.
///
/// The quantity tracked by a setpoint test keeps no clearance margin, so its
/// channels are checked on their own set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidationWindows {
    pub regular: WindowSet,
    pub tracked: WindowSet,
}

impl ValidationWindows {
    pub fn uniform(set: WindowSet) -> Self {
        Self {
            regular: set,
            tracked: set,
        }
    }
}

/// One threshold comparison.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricCheck {
    pub metric: MetricKind,
    pub value: f64,
    pub threshold: Option<f64>,
    pub passed: bool,
}

impl MetricCheck {
    /// Passes iff `|value| < threshold`; an absent threshold always passes.
    ///
    /// The signed value is kept so the mean error still shows its direction.
    pub fn evaluate(metric: MetricKind, value: f64, threshold: Option<f64>) -> Self {
        Self {
            metric,
            value,
            threshold,
            passed: threshold.is_none_or(|limit| value.abs() < limit),
        }
    }
}

/// Metrics and checks of one channel in one window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowReport {
    pub window: WindowName,
    pub metric: ErrorMetric,
    pub checks: Vec<MetricCheck>,
}

impl WindowReport {
    pub fn passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelReport {
    pub channel: String,
    pub family: Option<ChannelFamily>,
    pub windows: Vec<WindowReport>,
}

impl ChannelReport {
    pub fn passed(&self) -> bool {
        self.windows.iter().all(WindowReport::passed)
    }
}

/// Scalar stored under a result key.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResultValue {
    Bool(bool),
    Number(f64),
    Position([f64; 2]),
}

/// Results keyed `<window>_<metric>_<channel>_{value,check,position}`,
/// `<family>_check` and `compliance`.
pub type KeyedResults = BTreeMap<String, ResultValue>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceReport {
    pub channels: Vec<ChannelReport>,
    pub families: BTreeMap<ChannelFamily, bool>,
    pub compliance: bool,
}

impl ComplianceReport {
    pub fn channel(&self, name: &str) -> Option<&ChannelReport> {
        self.channels.iter().find(|c| c.channel == name)
    }

    pub fn keyed(&self) -> KeyedResults {
        let mut out = KeyedResults::new();
        for channel in &self.channels {
            for window in &channel.windows {
                for check in &window.checks {
                    let key = format!("{}_{}_{}", window.window, check.metric, channel.channel);
                    out.insert(format!("{key}_value"), ResultValue::Number(check.value));
                    out.insert(format!("{key}_check"), ResultValue::Bool(check.passed));
                    if check.metric == MetricKind::Mxe {
                        let (t, v) = window.metric.position;
                        out.insert(format!("{key}_position"), ResultValue::Position([t, v]));
                    }
                }
            }
        }
        for (family, passed) in &self.families {
            out.insert(format!("{family}_check"), ResultValue::Bool(*passed));
        }
        out.insert("compliance".to_string(), ResultValue::Bool(self.compliance));
        out
    }
}

pub struct ErrorEngine<'a> {
    thresholds: &'a Thresholds,
}

impl<'a> ErrorEngine<'a> {
    pub fn new(thresholds: &'a Thresholds) -> Self {
        Self { thresholds }
    }

    /// Metrics and checks for one channel of an aligned pair.
    pub fn channel_report(
        &self,
        ctx: &TestContext,
        calculated: &Curve,
        reference: &Curve,
        windows: &ValidationWindows,
        channel: &str,
    ) -> ComplianceResult<ChannelReport> {
        if calculated.time() != reference.time() {
            return Err(ComplianceError::GridMismatch {
                what: format!(
                    "{} calculated and {} reference samples",
                    calculated.len(),
                    reference.len()
                ),
            });
        }
        let calc = calculated
            .channel(channel)
            .ok_or_else(|| missing(channel, "calculated"))?;
        let refv = reference
            .channel(channel)
            .ok_or_else(|| missing(channel, "reference"))?;

        let family = ChannelFamily::of_channel(channel);
        let set = if ctx.is_tracked(family) {
            windows.tracked
        } else {
            windows.regular
        };
        let step_magnitude = ctx.step_magnitude(family);
        let table = self.thresholds.table_for(ctx, family);

        let mut reports = Vec::new();
        for (name, window) in set.non_empty() {
            let metric =
                window_metrics(calculated.time(), calc, refv, window, step_magnitude)?;
            let Some(metric) = metric else {
                continue;
            };
            let checks = MetricKind::ALL
                .into_iter()
                .map(|kind| {
                    let threshold = family.and_then(|f| limit(table, f, name, kind));
                    MetricCheck::evaluate(kind, metric.get(kind), threshold)
                })
                .collect();
            reports.push(WindowReport {
                window: name,
                metric,
                checks,
            });
        }
        Ok(ChannelReport {
            channel: channel.to_string(),
            family,
            windows: reports,
        })
    }

    /// Evaluate `channels` and aggregate into family checks and overall compliance.
    pub fn evaluate(
        &self,
        ctx: &TestContext,
        calculated: &Curve,
        reference: &Curve,
        windows: &ValidationWindows,
        channels: &[String],
    ) -> ComplianceResult<ComplianceReport> {
        let reports = channels
            .iter()
            .map(|c| self.channel_report(ctx, calculated, reference, windows, c))
            .collect::<ComplianceResult<Vec<_>>>()?;

        let mut families = BTreeMap::new();
        for family in ctx.relevant_families() {
            let members: Vec<&ChannelReport> =
                reports.iter().filter(|r| r.family == Some(family)).collect();
            let passed = if members.is_empty() {
                warn!(%family, "no channel for a relevant family");
                false
            } else {
                members.iter().all(|r| r.passed())
            };
            families.insert(family, passed);
        }
        let compliance = families.values().all(|&passed| passed);
        debug!(channels = reports.len(), compliance, "evaluated compliance");

        Ok(ComplianceReport {
            channels: reports,
            families,
            compliance,
        })
    }
}

fn missing(channel: &str, side: &'static str) -> ComplianceError {
    ComplianceError::MissingChannel {
        channel: channel.to_string(),
        side,
    }
}
