//! gc-compliance: error metrics and compliance decisions.
//!
//! Contains:
//! - family (channel families and the test context)
//! - thresholds (simulation, field-measurement and setpoint limit tables)
//! - metrics (mean, mean absolute and maximum absolute error per window)
//! - engine (checks, family aggregation, keyed results)

pub mod engine;
pub mod error;
pub mod family;
pub mod metrics;
pub mod thresholds;

pub use engine::{
    ChannelReport, ComplianceReport, ErrorEngine, KeyedResults, MetricCheck, ResultValue,
    ValidationWindows, WindowReport,
};
pub use error::{ComplianceError, ComplianceResult};
pub use family::{ChannelFamily, ReferenceKind, SimulationType, TestContext, Zone};
pub use metrics::{ErrorMetric, window_metrics};
pub use thresholds::{MetricKind, MetricLimits, ThresholdTable, Thresholds, WindowLimits};
