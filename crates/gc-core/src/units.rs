// gc-core/src/units.rs

use uom::si::f64::{Frequency as UomFrequency, Ratio as UomRatio, Time as UomTime};
use uom::si::frequency::hertz;
use uom::si::time::second;

// Public canonical unit types (SI, f64)
pub type Frequency = UomFrequency;
pub type Ratio = UomRatio;
pub type Time = UomTime;

#[inline]
pub fn s(v: f64) -> Time {
    Time::new::<second>(v)
}

#[inline]
pub fn hz(v: f64) -> Frequency {
    Frequency::new::<hertz>(v)
}

#[inline]
pub fn unitless(v: f64) -> Ratio {
    use uom::si::ratio::ratio;
    Ratio::new::<ratio>(v)
}

#[inline]
pub fn seconds(t: Time) -> f64 {
    t.get::<second>()
}

#[inline]
pub fn hertz_of(f: Frequency) -> f64 {
    f.get::<hertz>()
}

/// Longest sampling interval that still resolves `cutoff` (half its period).
#[inline]
pub fn nyquist_interval(cutoff: Frequency) -> Time {
    s(0.5 / hertz_of(cutoff))
}

/// Sampling interval corresponding to a sampling rate.
#[inline]
pub fn period_of(rate: Frequency) -> Time {
    s(1.0 / hertz_of(rate))
}

pub mod constants {
    /// Default fundamental of the grid being measured.
    pub const NOMINAL_FREQUENCY_HZ: f64 = 50.0;
}
