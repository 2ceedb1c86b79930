//! Error types for signal conditioning.

use gc_core::CoreError;
use thiserror::Error;

/// Result type for signal conditioning operations.
pub type SignalResult<T> = Result<T, SignalError>;

/// Errors raised while conditioning curves.
///
/// Everything except [`SignalError::Curve`] points at a configuration mistake
/// rather than bad input data.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SignalError {
    /// The sampling interval cannot represent the filter cutoff.
    #[error(
        "Sampling interval {step_s} s is too coarse for a {cutoff_hz} Hz cutoff \
         (must be below {limit_s} s)"
    )]
    SamplingTooCoarse {
        step_s: f64,
        cutoff_hz: f64,
        limit_s: f64,
    },

    /// Filter parameters that cannot produce a stable design.
    #[error("Invalid filter: {what}")]
    InvalidFilter { what: String },

    /// Invalid argument provided to a conditioning function.
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    /// The record is too short for the requested operation.
    #[error("Record too short: {what}")]
    ShortRecord { what: String },

    /// Curve table invariant violated.
    #[error("Curve error: {0}")]
    Curve(#[from] CoreError),
}
