//! gc-windows: before/during/after windows around a grid event.
//!
//! Two boundary sets are produced for every curve: the filtering scope bounds
//! the independent low-pass runs, the validation scope bounds the error
//! computation and excludes the regulatory settling intervals after fault
//! inception and clearance.

pub mod calculator;
pub mod error;
pub mod reconcile;

pub use calculator::{
    CurveWindows, EventTiming, FaultType, Margins, WindowCalculator, WindowSettings, window_set,
};
pub use error::{WindowError, WindowResult};
pub use reconcile::reconcile_after;
