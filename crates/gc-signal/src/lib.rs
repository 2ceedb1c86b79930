//! gc-signal: curve conditioning for gridcheck.
//!
//! Contains:
//! - rms (positive-sequence magnitude from three-phase channels)
//! - interp (monotone cubic interpolation)
//! - resample (fixed-step and common-grid resampling)
//! - filter (second-order zero-phase low-pass)
//! - conditioner (the ordered pipeline over one curve pair)

pub mod conditioner;
pub mod error;
pub mod filter;
pub mod interp;
pub mod resample;
pub mod rms;

pub use conditioner::{ConditionerSettings, SignalConditioner};
pub use error::{SignalError, SignalResult};
pub use filter::{Biquad, FilterKind, FilterSettings, PaddingMethod, check_sampling_interval};
pub use interp::Pchip;
pub use resample::{CommonGrid, FixedStep};
