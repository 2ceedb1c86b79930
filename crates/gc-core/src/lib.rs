//! gc-core: shared foundation for gridcheck.
//!
//! Contains:
//! - curve (fixed-schema time/channel table)
//! - window (before/during/after windows and boundary sets)
//! - units (uom SI types + constructors)
//! - numeric (Real + tolerances + float helpers)
//! - timing (stage timers)
//! - error (shared error types)

pub mod curve;
pub mod error;
pub mod numeric;
pub mod timing;
pub mod units;
pub mod window;

// Re-exports: nice ergonomics for downstream crates
pub use curve::{Channel, Curve, TIME_COLUMN};
pub use error::{CoreError, CoreResult};
pub use numeric::*;
pub use units::*;
pub use window::{Window, WindowName, WindowScope, WindowSet};
