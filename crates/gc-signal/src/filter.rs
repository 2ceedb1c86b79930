//! Second-order low-pass filtering.
//!
//! Every filter family is described by the pole pair of its normalized analog
//! prototype (cutoff at 1 rad/s) and its DC gain. The digital section is
//! obtained with the bilinear transform after pre-warping the cutoff, and is
//! run forward and backward so the filtered curve has no phase lag. The
//! forward-backward runs start from steady-state initial conditions on a
//! padded copy of the signal, which keeps edge transients small.
//!
//! ## Families
//!
//! | Kind | Prototype poles | Character |
//! |------|-----------------|-----------|
//! | Critically damped | double real pole | no overshoot on steps |
//! | Bessel | -1.1016 ± 0.6360j | flat group delay |
//! | Butterworth | -0.7071 ± 0.7071j | maximally flat magnitude |
//! | Chebyshev I | from ripple | steepest roll-off, passband ripple |

use std::f64::consts::PI;

use gc_core::{Curve, Tolerances, WindowSet, is_constant};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{SignalError, SignalResult};

/// Low-pass filter family.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FilterKind {
    #[default]
    CriticallyDamped,
    Bessel,
    Butterworth,
    Chebyshev1 {
        /// Passband ripple in dB
        ripple_db: f64,
    },
}

/// How the signal is extended before forward-backward filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaddingMethod {
    /// Point reflection about the end sample
    #[default]
    Odd,
    /// Mirror reflection about the end sample
    Even,
    /// Repeat the end sample
    Constant,
    /// No extension
    None,
}

/// Analog prototype: one pole of the conjugate pair and the DC gain.
#[derive(Debug, Clone, Copy)]
struct Prototype {
    pole: Complex64,
    dc_gain: f64,
}

impl FilterKind {
    fn prototype(&self) -> SignalResult<Prototype> {
        match *self {
            Self::CriticallyDamped => {
                // Two coincident real poles placed so that |H| = -3 dB at 1 rad/s
                let p = 1.0 / (2.0_f64.sqrt() - 1.0).sqrt();
                Ok(Prototype {
                    pole: Complex64::new(-p, 0.0),
                    dc_gain: 1.0,
                })
            }
            Self::Bessel => Ok(Prototype {
                pole: Complex64::new(-1.101_601_330_6, 0.636_009_824_8),
                dc_gain: 1.0,
            }),
            Self::Butterworth => Ok(Prototype {
                pole: Complex64::from_polar(1.0, 0.75 * PI),
                dc_gain: 1.0,
            }),
            Self::Chebyshev1 { ripple_db } => {
                if !(ripple_db > 0.0 && ripple_db.is_finite()) {
                    return Err(SignalError::InvalidFilter {
                        what: format!("Chebyshev ripple must be positive, got {ripple_db} dB"),
                    });
                }
                let eps = (10f64.powf(ripple_db / 10.0) - 1.0).sqrt();
                let mu = (1.0 / eps).asinh() / 2.0;
                let theta = PI / 4.0;
                Ok(Prototype {
                    pole: Complex64::new(-mu.sinh() * theta.sin(), mu.cosh() * theta.cos()),
                    // Even order: DC sits at the bottom of the ripple band
                    dc_gain: 1.0 / (1.0 + eps * eps).sqrt(),
                })
            }
        }
    }
}

/// Filter stage settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilterSettings {
    /// Global switch; when false curves are left untouched
    pub enabled: bool,
    pub kind: FilterKind,
    pub cutoff_hz: f64,
    /// Filter each filtering-scope window independently
    pub per_window: bool,
    pub padding: PaddingMethod,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            kind: FilterKind::CriticallyDamped,
            cutoff_hz: 15.0,
            per_window: true,
            padding: PaddingMethod::Odd,
        }
    }
}

/// Fail unless `step_s` samples the cutoff above the Nyquist rate.
pub fn check_sampling_interval(step_s: f64, cutoff_hz: f64) -> SignalResult<()> {
    if !(cutoff_hz > 0.0 && cutoff_hz.is_finite()) {
        return Err(SignalError::InvalidFilter {
            what: format!("cutoff must be positive, got {cutoff_hz} Hz"),
        });
    }
    let limit_s = gc_core::seconds(gc_core::nyquist_interval(gc_core::hz(cutoff_hz)));
    if step_s.is_nan() || step_s >= limit_s {
        return Err(SignalError::SamplingTooCoarse {
            step_s,
            cutoff_hz,
            limit_s,
        });
    }
    Ok(())
}

/// Digital second-order section, `a0` normalized to 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Biquad {
    pub b: [f64; 3],
    pub a: [f64; 2],
}

impl Biquad {
    /// Design a low-pass section for `kind` at `cutoff_hz`, sampled every `step_s`.
    pub fn lowpass(kind: FilterKind, cutoff_hz: f64, step_s: f64) -> SignalResult<Self> {
        check_sampling_interval(step_s, cutoff_hz)?;
        let proto = kind.prototype()?;

        let fs = 1.0 / step_s;
        let k = 2.0 * fs;
        let wc = k * (PI * cutoff_hz / fs).tan();

        // H(s) = g * w0^2 / (s^2 + alpha * s + w0^2)
        let w0_sq = proto.pole.norm_sqr() * wc * wc;
        let alpha = -2.0 * proto.pole.re * wc;
        let g = proto.dc_gain;

        let a0 = k * k + alpha * k + w0_sq;
        let a1 = 2.0 * w0_sq - 2.0 * k * k;
        let a2 = k * k - alpha * k + w0_sq;
        let b = g * w0_sq / a0;

        Ok(Self {
            b: [b, 2.0 * b, b],
            a: [a1 / a0, a2 / a0],
        })
    }

    /// Gain at zero frequency.
    pub fn dc_gain(&self) -> f64 {
        (self.b[0] + self.b[1] + self.b[2]) / (1.0 + self.a[0] + self.a[1])
    }

    /// Magnitude response at `freq_hz` for sampling interval `step_s`.
    pub fn magnitude_at(&self, freq_hz: f64, step_s: f64) -> f64 {
        let omega = 2.0 * PI * freq_hz * step_s;
        let z1 = Complex64::from_polar(1.0, -omega);
        let z2 = z1 * z1;
        let num = self.b[0] + z1 * self.b[1] + z2 * self.b[2];
        let den = 1.0 + z1 * self.a[0] + z2 * self.a[1];
        (num / den).norm()
    }

    /// Poles strictly inside the unit circle.
    pub fn is_stable(&self) -> bool {
        self.a[1].abs() < 1.0 && self.a[0].abs() < 1.0 + self.a[1]
    }

    /// Direct Form II transposed state for a unit step in steady state.
    fn steady_state(&self) -> [f64; 2] {
        let y = self.dc_gain();
        let s1 = self.b[2] - self.a[1] * y;
        let s0 = self.b[1] - self.a[0] * y + s1;
        [s0, s1]
    }

    /// Run the section once over `x` starting from state `zi`.
    fn run(&self, x: &[f64], zi: [f64; 2]) -> Vec<f64> {
        let [mut s0, mut s1] = zi;
        x.iter()
            .map(|&input| {
                let output = self.b[0] * input + s0;
                s0 = self.b[1] * input - self.a[0] * output + s1;
                s1 = self.b[2] * input - self.a[1] * output;
                output
            })
            .collect()
    }

    /// Zero-phase forward-backward filtering.
    pub fn filtfilt(&self, x: &[f64], padding: PaddingMethod) -> Vec<f64> {
        if x.len() < 2 {
            return x.to_vec();
        }
        let padlen = match padding {
            PaddingMethod::None => 0,
            _ => (3 * 3).min(x.len() - 1),
        };
        let ext = pad(x, padlen, padding);
        let zi = self.steady_state();

        let forward = self.run(&ext, scale(zi, ext[0]));
        let mut reversed: Vec<f64> = forward.into_iter().rev().collect();
        let first = reversed[0];
        reversed = self.run(&reversed, scale(zi, first));
        reversed.reverse();

        reversed[padlen..reversed.len() - padlen].to_vec()
    }
}

fn scale(zi: [f64; 2], by: f64) -> [f64; 2] {
    [zi[0] * by, zi[1] * by]
}

fn pad(x: &[f64], padlen: usize, padding: PaddingMethod) -> Vec<f64> {
    if padlen == 0 {
        return x.to_vec();
    }
    let n = x.len();
    let (first, last) = (x[0], x[n - 1]);
    let mut ext = Vec::with_capacity(n + 2 * padlen);
    match padding {
        PaddingMethod::Odd => {
            ext.extend((1..=padlen).rev().map(|i| 2.0 * first - x[i]));
            ext.extend_from_slice(x);
            ext.extend((1..=padlen).map(|i| 2.0 * last - x[n - 1 - i]));
        }
        PaddingMethod::Even => {
            ext.extend((1..=padlen).rev().map(|i| x[i]));
            ext.extend_from_slice(x);
            ext.extend((1..=padlen).map(|i| x[n - 1 - i]));
        }
        PaddingMethod::Constant => {
            ext.extend(std::iter::repeat_n(first, padlen));
            ext.extend_from_slice(x);
            ext.extend(std::iter::repeat_n(last, padlen));
        }
        PaddingMethod::None => ext.extend_from_slice(x),
    }
    ext
}

/// Low-pass every channel of an evenly spaced curve.
///
/// With `per_window`, the record is cut after `before.to` and after
/// `during.to` and each piece is filtered on its own so a transient in one
/// window cannot leak into the next. Constant pieces are left untouched.
pub fn lowpass_curve(
    curve: &Curve,
    step_s: f64,
    settings: &FilterSettings,
    windows: &WindowSet,
) -> SignalResult<Curve> {
    if !settings.enabled || curve.len() < 2 {
        return Ok(curve.clone());
    }

    let segments = if settings.per_window {
        window_segments(curve.time(), windows)
    } else {
        vec![0..curve.len()]
    };

    // Designed on first use: a curve that is constant in every segment is
    // returned as is whatever its sampling interval.
    let mut designed: Option<Biquad> = None;
    let tol = Tolerances::default();
    let mut out = Curve::with_time(curve.time().to_vec())?;
    for channel in curve.channels() {
        let mut filtered = channel.values.clone();
        for segment in &segments {
            let piece = &channel.values[segment.clone()];
            if piece.len() < 2 || is_constant(piece, tol) {
                continue;
            }
            let section = match designed {
                Some(section) => section,
                None => {
                    let section = stable_section(settings, step_s)?;
                    designed = Some(section);
                    section
                }
            };
            filtered[segment.clone()].copy_from_slice(&section.filtfilt(piece, settings.padding));
        }
        out.insert_channel(channel.name.clone(), filtered)?;
    }
    debug!(
        kind = ?settings.kind,
        cutoff_hz = settings.cutoff_hz,
        segments = segments.len(),
        filtered = designed.is_some(),
        "low-pass filtered curve"
    );
    Ok(out)
}

fn stable_section(settings: &FilterSettings, step_s: f64) -> SignalResult<Biquad> {
    let section = Biquad::lowpass(settings.kind, settings.cutoff_hz, step_s)?;
    if !section.is_stable() {
        return Err(SignalError::InvalidFilter {
            what: format!(
                "{:?} design at {} Hz with step {} s is unstable",
                settings.kind, settings.cutoff_hz, step_s
            ),
        });
    }
    Ok(section)
}

/// Index ranges `t <= before.to`, `before.to < t <= during.to`, `t > during.to`.
fn window_segments(time: &[f64], windows: &WindowSet) -> Vec<std::ops::Range<usize>> {
    let split_before = time.partition_point(|&t| t <= windows.before.to);
    let split_during = time
        .partition_point(|&t| t <= windows.during.to)
        .max(split_before);
    [0..split_before, split_before..split_during, split_during..time.len()]
        .into_iter()
        .filter(|r| !r.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use gc_core::Window;

    const ALL_KINDS: [FilterKind; 4] = [
        FilterKind::CriticallyDamped,
        FilterKind::Bessel,
        FilterKind::Butterworth,
        FilterKind::Chebyshev1 { ripple_db: 1.0 },
    ];

    #[test]
    fn sampling_interval_check() {
        assert!(check_sampling_interval(0.002, 15.0).is_ok());
        let err = check_sampling_interval(0.05, 15.0).unwrap_err();
        assert!(matches!(err, SignalError::SamplingTooCoarse { .. }));
    }

    #[test]
    fn designs_are_stable_with_expected_dc_gain() {
        for kind in ALL_KINDS {
            let bq = Biquad::lowpass(kind, 15.0, 0.001).unwrap();
            assert!(bq.is_stable(), "{kind:?}");
            let expected = match kind {
                FilterKind::Chebyshev1 { ripple_db } => 10f64.powf(-ripple_db / 20.0),
                _ => 1.0,
            };
            assert!((bq.dc_gain() - expected).abs() < 1e-9, "{kind:?}");
        }
    }

    #[test]
    fn cutoff_is_three_db_down() {
        for kind in [
            FilterKind::CriticallyDamped,
            FilterKind::Bessel,
            FilterKind::Butterworth,
        ] {
            let bq = Biquad::lowpass(kind, 15.0, 0.001).unwrap();
            let mag = bq.magnitude_at(15.0, 0.001);
            assert!((mag - 0.5_f64.sqrt()).abs() < 1e-3, "{kind:?}: {mag}");
        }
    }

    #[test]
    fn chebyshev_ripple_edge_at_cutoff() {
        let bq = Biquad::lowpass(FilterKind::Chebyshev1 { ripple_db: 1.0 }, 15.0, 0.001).unwrap();
        let mag = bq.magnitude_at(15.0, 0.001);
        assert!((mag - 10f64.powf(-1.0 / 20.0)).abs() < 1e-3, "{mag}");
    }

    #[test]
    fn invalid_ripple_is_rejected() {
        let err =
            Biquad::lowpass(FilterKind::Chebyshev1 { ripple_db: 0.0 }, 15.0, 0.001).unwrap_err();
        assert!(matches!(err, SignalError::InvalidFilter { .. }));
    }

    #[test]
    fn filtfilt_preserves_constant_and_ramp() {
        let bq = Biquad::lowpass(FilterKind::CriticallyDamped, 15.0, 0.001).unwrap();
        let flat = vec![0.7; 200];
        for v in bq.filtfilt(&flat, PaddingMethod::Odd) {
            assert!((v - 0.7).abs() < 1e-9);
        }
        let ramp: Vec<f64> = (0..500).map(|i| i as f64 * 1e-3).collect();
        let out = bq.filtfilt(&ramp, PaddingMethod::Odd);
        // Away from the edges a zero-phase filter leaves a ramp untouched
        for i in 100..400 {
            assert!((out[i] - ramp[i]).abs() < 1e-6, "{i}: {} vs {}", out[i], ramp[i]);
        }
    }

    #[test]
    fn filtfilt_attenuates_high_frequency() {
        let bq = Biquad::lowpass(FilterKind::Butterworth, 15.0, 0.001).unwrap();
        let x: Vec<f64> = (0..2000)
            .map(|i| (2.0 * PI * 200.0 * i as f64 * 1e-3).sin())
            .collect();
        let y = bq.filtfilt(&x, PaddingMethod::Even);
        let peak = y[500..1500].iter().fold(0.0_f64, |m, v| m.max(v.abs()));
        assert!(peak < 0.02, "{peak}");
    }

    #[test]
    fn short_segments_are_handled() {
        let bq = Biquad::lowpass(FilterKind::Bessel, 15.0, 0.001).unwrap();
        for padding in [
            PaddingMethod::Odd,
            PaddingMethod::Even,
            PaddingMethod::Constant,
            PaddingMethod::None,
        ] {
            assert_eq!(bq.filtfilt(&[1.0, 2.0, 3.0], padding).len(), 3);
            assert_eq!(bq.filtfilt(&[1.0], padding), vec![1.0]);
        }
    }

    fn step_curve() -> (Curve, WindowSet) {
        let time: Vec<f64> = (0..=1000).map(|i| i as f64 * 1e-3).collect();
        let u: Vec<f64> = time.iter().map(|&t| if t <= 0.5 { 1.0 } else { 0.3 }).collect();
        let p = vec![0.8; time.len()];
        let curve = Curve::from_columns(time, [("U", u), ("P", p)]).unwrap();
        let windows = WindowSet {
            before: Window::new(0.0, 0.5),
            during: Window::point(0.5),
            after: Window::new(0.5, 1.0),
        };
        (curve, windows)
    }

    #[test]
    fn per_window_filtering_keeps_step_sharp() {
        let (curve, windows) = step_curve();
        let settings = FilterSettings::default();
        let out = lowpass_curve(&curve, 1e-3, &settings, &windows).unwrap();
        let u = out.channel("U").unwrap();
        // Both sides of the step are constant within their window
        assert!((u[500] - 1.0).abs() < 1e-9);
        assert!((u[501] - 0.3).abs() < 1e-9);
        assert_eq!(out.channel("P").unwrap(), curve.channel("P").unwrap());
    }

    #[test]
    fn whole_record_filtering_smooths_step() {
        let (curve, windows) = step_curve();
        let settings = FilterSettings {
            per_window: false,
            ..FilterSettings::default()
        };
        let out = lowpass_curve(&curve, 1e-3, &settings, &windows).unwrap();
        let u = out.channel("U").unwrap();
        assert!(u[500] < 0.99 && u[500] > 0.31);
    }

    #[test]
    fn disabled_filter_is_identity() {
        let (curve, windows) = step_curve();
        let settings = FilterSettings {
            enabled: false,
            ..FilterSettings::default()
        };
        let out = lowpass_curve(&curve, 0.5, &settings, &windows).unwrap();
        assert_eq!(out, curve);
    }

    #[test]
    fn coarse_step_fails_when_a_segment_needs_filtering() {
        let (curve, windows) = step_curve();
        let settings = FilterSettings {
            per_window: false,
            ..FilterSettings::default()
        };
        let err = lowpass_curve(&curve, 0.05, &settings, &windows).unwrap_err();
        assert!(matches!(err, SignalError::SamplingTooCoarse { .. }));
    }

    #[test]
    fn coarse_step_is_accepted_when_every_segment_is_constant() {
        // Per window, both sides of the step are flat and nothing is filtered.
        let (curve, windows) = step_curve();
        let out = lowpass_curve(&curve, 0.05, &FilterSettings::default(), &windows).unwrap();
        assert_eq!(out, curve);
    }

    #[test]
    fn filter_kind_parses_from_tagged_form() {
        let kind: FilterKind =
            serde_json::from_str(r#"{"type":"chebyshev1","ripple_db":0.5}"#).unwrap();
        assert_eq!(kind, FilterKind::Chebyshev1 { ripple_db: 0.5 });
        assert!(serde_json::from_str::<FilterKind>(r#"{"type":"elliptic"}"#).is_err());
    }
}
