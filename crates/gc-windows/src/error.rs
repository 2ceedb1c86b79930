use thiserror::Error;

pub type WindowResult<T> = Result<T, WindowError>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum WindowError {
    #[error("Cannot compute windows on an empty time axis")]
    EmptyRecord,

    #[error("Time axis runs from {t_first} to {t_last}")]
    UnorderedTime { t_first: f64, t_last: f64 },

    #[error("Invalid event {what}: {value}")]
    InvalidEvent { what: &'static str, value: f64 },

    #[error("Invalid margin {what}: {value} (must be finite and non-negative)")]
    InvalidMargin { what: &'static str, value: f64 },
}
