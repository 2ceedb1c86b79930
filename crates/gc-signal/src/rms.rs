//! Positive-sequence magnitude from instantaneous three-phase channels.
//!
//! Each phase is turned into a fundamental-frequency phasor by a one-cycle
//! Fourier integral over a window centred on every sample, then the classical
//! symmetrical-components projection keeps the positive sequence. The integral
//! uses the trapezoid rule on the actual time stamps, so irregular grids from
//! variable-step solvers need no resampling first.

use std::f64::consts::PI;

use gc_core::Curve;
use num_complex::Complex64;
use tracing::debug;

use crate::error::{SignalError, SignalResult};

/// A `<base><suffix_a>`, `<base><suffix_b>`, `<base><suffix_c>` channel triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseGroup {
    pub base: String,
    pub phases: [String; 3],
}

/// Find complete three-phase groups in channel order.
pub fn find_phase_groups(curve: &Curve, suffixes: &[String; 3]) -> Vec<PhaseGroup> {
    curve
        .channel_names()
        .filter_map(|name| name.strip_suffix(suffixes[0].as_str()))
        .filter(|base| !base.is_empty())
        .filter_map(|base| {
            let phases = [
                format!("{base}{}", suffixes[0]),
                format!("{base}{}", suffixes[1]),
                format!("{base}{}", suffixes[2]),
            ];
            phases
                .iter()
                .all(|p| curve.has_channel(p))
                .then(|| PhaseGroup {
                    base: base.to_string(),
                    phases,
                })
        })
        .collect()
}

/// Replace every complete three-phase group by its positive-sequence magnitude.
///
/// The magnitude is scaled so that a balanced set of unit-amplitude sinusoids
/// yields 1.0. Channels outside complete groups pass through unchanged, and a
/// curve without groups is returned as is.
pub fn extract_positive_sequence(
    curve: &Curve,
    fundamental_hz: f64,
    suffixes: &[String; 3],
) -> SignalResult<Curve> {
    let groups = find_phase_groups(curve, suffixes);
    if groups.is_empty() || curve.is_empty() {
        return Ok(curve.clone());
    }
    if !(fundamental_hz > 0.0 && fundamental_hz.is_finite()) {
        return Err(SignalError::InvalidArg {
            what: "fundamental frequency must be positive",
        });
    }

    let time = curve.time();
    let period = 1.0 / fundamental_hz;
    let span = time[time.len() - 1] - time[0];
    if span < period {
        return Err(SignalError::ShortRecord {
            what: format!(
                "three-phase record spans {span} s, one fundamental cycle needs {period} s"
            ),
        });
    }

    let mut magnitudes: Vec<(String, Vec<f64>)> = Vec::with_capacity(groups.len());
    for group in &groups {
        let mut phasors: Vec<Vec<Complex64>> = Vec::with_capacity(3);
        for phase in &group.phases {
            let values = curve.require_channel(phase)?;
            phasors.push(fundamental_phasors(time, values, fundamental_hz));
        }
        let a = Complex64::from_polar(1.0, 2.0 * PI / 3.0);
        let a2 = a * a;
        let positive: Vec<f64> = (0..time.len())
            .map(|i| ((phasors[0][i] + a * phasors[1][i] + a2 * phasors[2][i]) / 3.0).norm())
            .collect();
        debug!(channel = %group.base, "extracted positive-sequence magnitude");
        magnitudes.push((group.base.clone(), positive));
    }

    // Rebuild in original channel order: a group takes the slot of its first phase.
    let mut out = Curve::with_time(time.to_vec())?;
    for channel in curve.channels() {
        match groups
            .iter()
            .position(|g| g.phases.iter().any(|p| *p == channel.name))
        {
            Some(index) => {
                let base = &groups[index].base;
                if !out.has_channel(base) {
                    out.insert_channel(base.clone(), magnitudes[index].1.clone())?;
                }
            }
            None => out.insert_channel(channel.name.clone(), channel.values.clone())?,
        }
    }
    Ok(out)
}

/// Peak-scaled phasor of the fundamental at every sample.
///
/// `X(t) = 2/T * integral over [t - T/2, t + T/2] of x(s) e^{-j w s} ds`, with
/// the window slid inward at the record edges so it always spans one period.
fn fundamental_phasors(time: &[f64], values: &[f64], fundamental_hz: f64) -> Vec<Complex64> {
    let omega = 2.0 * PI * fundamental_hz;
    let period = 1.0 / fundamental_hz;
    let integrand: Vec<Complex64> = time
        .iter()
        .zip(values)
        .map(|(&t, &x)| Complex64::from_polar(x, -omega * t))
        .collect();

    // Cumulative trapezoid integral of the integrand
    let mut cumulative = vec![Complex64::new(0.0, 0.0); time.len()];
    for k in 1..time.len() {
        let dt = time[k] - time[k - 1];
        cumulative[k] = cumulative[k - 1] + (integrand[k] + integrand[k - 1]) * (0.5 * dt);
    }

    let t_first = time[0];
    let t_last = time[time.len() - 1];
    let integral_to = |t: f64| -> Complex64 {
        // Last sample index with time <= t
        let k = time.partition_point(|&s| s <= t).saturating_sub(1);
        if k + 1 >= time.len() {
            return cumulative[time.len() - 1];
        }
        let dt = time[k + 1] - time[k];
        if dt <= 0.0 {
            return cumulative[k];
        }
        let frac = (t - time[k]) / dt;
        let g_t = integrand[k] + (integrand[k + 1] - integrand[k]) * frac;
        cumulative[k] + (integrand[k] + g_t) * (0.5 * (t - time[k]))
    };

    time.iter()
        .map(|&t| {
            let mut from = t - 0.5 * period;
            let mut to = t + 0.5 * period;
            if from < t_first {
                from = t_first;
                to = t_first + period;
            }
            if to > t_last {
                to = t_last;
                from = t_last - period;
            }
            (integral_to(to) - integral_to(from)) * (2.0 / period)
        })
        .collect()
}
