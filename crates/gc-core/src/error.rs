use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Channel '{channel}' has {found} samples, time axis has {expected}")]
    LengthMismatch {
        channel: String,
        expected: usize,
        found: usize,
    },

    #[error("Time axis decreases at index {index} ({previous} -> {current})")]
    NonMonotonicTime {
        index: usize,
        previous: f64,
        current: f64,
    },

    #[error("Duplicate channel: {channel}")]
    DuplicateChannel { channel: String },

    #[error("Unknown channel: {channel}")]
    UnknownChannel { channel: String },
}
