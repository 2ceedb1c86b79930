//! Configuration validation logic.

use std::collections::HashSet;

use gc_core::{hz, nyquist_interval, period_of};
use gc_signal::FilterKind;

use crate::schema::{Config, LATEST_VERSION};

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Field-measurement thresholds tighter than simulation ones: {}", .entries.join(", "))]
    ThresholdOrdering { entries: Vec<String> },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

fn invalid(field: &str, value: impl ToString, reason: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn positive(field: &str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, value, "must be finite and positive"))
    }
}

pub fn validate_config(config: &Config) -> Result<(), ValidationError> {
    if config.version > LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: config.version,
        });
    }
    validate_signal(config)?;
    validate_windows(config)?;
    validate_thresholds(config)?;

    if config.batch.workers == Some(0) {
        return Err(invalid("batch.workers", 0, "must be at least 1"));
    }
    Ok(())
}

fn validate_signal(config: &Config) -> Result<(), ValidationError> {
    let signal = &config.signal;
    positive("signal.nominal_frequency_hz", signal.nominal_frequency_hz)?;
    positive("signal.max_sampling_rate_hz", signal.max_sampling_rate_hz)?;
    if let Some(step) = signal.common_step_s {
        positive("signal.common_step_s", step)?;
    }

    let mut seen = HashSet::new();
    for suffix in &signal.three_phase_suffixes {
        if suffix.is_empty() {
            return Err(invalid(
                "signal.three_phase_suffixes",
                "\"\"",
                "suffixes must not be empty",
            ));
        }
        if !seen.insert(suffix) {
            return Err(invalid(
                "signal.three_phase_suffixes",
                suffix,
                "suffixes must be distinct",
            ));
        }
    }

    let filter = &signal.filter;
    positive("signal.filter.cutoff_hz", filter.cutoff_hz)?;
    if let FilterKind::Chebyshev1 { ripple_db } = filter.kind {
        positive("signal.filter.kind.ripple_db", ripple_db)?;
    }
    // The finest fixed step must still resolve the cutoff
    let finest_step = period_of(hz(signal.max_sampling_rate_hz));
    if filter.enabled && finest_step >= nyquist_interval(hz(filter.cutoff_hz)) {
        return Err(invalid(
            "signal.filter.cutoff_hz",
            filter.cutoff_hz,
            "must be below half of signal.max_sampling_rate_hz",
        ));
    }
    Ok(())
}

fn validate_windows(config: &Config) -> Result<(), ValidationError> {
    config
        .windows
        .validate()
        .map_err(|e| invalid("windows", "margin", &e.to_string()))
}

fn validate_thresholds(config: &Config) -> Result<(), ValidationError> {
    for (field, value) in config.thresholds.entries() {
        positive(&format!("thresholds.{field}"), value)?;
    }
    let entries = config.thresholds.ordering_violations();
    if !entries.is_empty() {
        return Err(ValidationError::ThresholdOrdering { entries });
    }
    Ok(())
}
