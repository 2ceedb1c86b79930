use gc_core::CoreError;
use thiserror::Error;

pub type ComplianceResult<T> = Result<T, ComplianceError>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ComplianceError {
    #[error("Step magnitude must be finite and non-zero, got {value}")]
    InvalidStepMagnitude { value: f64 },

    #[error("Calculated and reference curves are not on one grid: {what}")]
    GridMismatch { what: String },

    #[error("Channel '{channel}' missing from the {side} curve")]
    MissingChannel { channel: String, side: &'static str },

    #[error("Curve error: {0}")]
    Curve(#[from] CoreError),
}
