//! Fixed-step and common-grid resampling.

use gc_core::{Curve, fixed_step_grid, min_positive_step};
use tracing::{debug, warn};

use crate::error::{SignalError, SignalResult};
use crate::interp::Pchip;

/// A curve on an evenly spaced grid together with its step.
///
/// `step` is `None` for curves with fewer than two samples.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedStep {
    pub curve: Curve,
    pub step: Option<f64>,
}

/// Drop samples whose time stamp repeats the previous one, keeping the first.
pub fn dedup_time(curve: &Curve) -> SignalResult<Curve> {
    let time = curve.time();
    let keep: Vec<usize> = (0..time.len())
        .filter(|&i| i == 0 || time[i] > time[i - 1])
        .collect();
    if keep.len() == time.len() {
        return Ok(curve.clone());
    }

    let mut out = Curve::with_time(keep.iter().map(|&i| time[i]).collect())?;
    for channel in curve.channels() {
        out.insert_channel(
            channel.name.clone(),
            keep.iter().map(|&i| channel.values[i]).collect(),
        )?;
    }
    Ok(out)
}

/// Step used for fixed-step resampling.
///
/// The smallest observed step, but never finer than the sampling-rate floor
/// (`1 / max_rate_hz`, tightened by the curve's own sampling frequency when
/// known).
pub fn fixed_step_for(
    time: &[f64],
    max_rate_hz: f64,
    sampling_hint_hz: Option<f64>,
) -> SignalResult<Option<f64>> {
    if !(max_rate_hz > 0.0 && max_rate_hz.is_finite()) {
        return Err(SignalError::InvalidArg {
            what: "maximum sampling rate must be positive",
        });
    }
    let rate = match sampling_hint_hz {
        Some(hint) if hint > 0.0 && hint.is_finite() => hint.min(max_rate_hz),
        _ => max_rate_hz,
    };
    Ok(min_positive_step(time).map(|step| step.max(1.0 / rate)))
}

/// Resample every channel onto an evenly spaced grid with monotone interpolation.
pub fn to_fixed_step(
    curve: &Curve,
    max_rate_hz: f64,
    sampling_hint_hz: Option<f64>,
) -> SignalResult<FixedStep> {
    let deduped = dedup_time(curve)?;
    let Some(step) = fixed_step_for(deduped.time(), max_rate_hz, sampling_hint_hz)? else {
        return Ok(FixedStep {
            curve: deduped,
            step: None,
        });
    };

    let time = deduped.time();
    let grid = fixed_step_grid(time[0], time[time.len() - 1], step);
    debug!(
        samples_in = curve.len(),
        samples_out = grid.len(),
        step,
        "resampled to fixed step"
    );
    Ok(FixedStep {
        curve: interpolate_onto(&deduped, &grid, None)?,
        step: Some(step),
    })
}

/// A calculated/reference pair on one shared grid.
#[derive(Debug, Clone, PartialEq)]
pub struct CommonGrid {
    pub calculated: Curve,
    pub reference: Curve,
    pub step: Option<f64>,
}

/// Resample both curves onto one grid spanning only their overlapping range.
///
/// Only channels present in both curves are kept, in the calculated curve's
/// order. An empty input passes both curves through unchanged; disjoint ranges
/// produce an empty pair.
pub fn to_common_grid(
    calculated: &Curve,
    reference: &Curve,
    step: f64,
) -> SignalResult<CommonGrid> {
    if calculated.is_empty() || reference.is_empty() {
        return Ok(CommonGrid {
            calculated: calculated.clone(),
            reference: reference.clone(),
            step: None,
        });
    }
    if !(step > 0.0 && step.is_finite()) {
        return Err(SignalError::InvalidArg {
            what: "common grid step must be positive",
        });
    }

    let calculated = dedup_time(calculated)?;
    let reference = dedup_time(reference)?;

    let start = calculated.time()[0].max(reference.time()[0]);
    let end = calculated.time()[calculated.len() - 1].min(reference.time()[reference.len() - 1]);
    if end < start {
        warn!(start, end, "calculated and reference curves do not overlap in time");
        return Ok(CommonGrid {
            calculated: Curve::empty(),
            reference: Curve::empty(),
            step: None,
        });
    }

    let shared: Vec<&str> = calculated
        .channel_names()
        .filter(|name| reference.has_channel(name))
        .collect();
    for name in calculated.channel_names().chain(reference.channel_names()) {
        if !shared.contains(&name) {
            debug!(channel = name, "channel present in only one curve set, dropped");
        }
    }

    let grid = fixed_step_grid(start, end, step);
    Ok(CommonGrid {
        calculated: interpolate_onto(&calculated, &grid, Some(&shared))?,
        reference: interpolate_onto(&reference, &grid, Some(&shared))?,
        step: Some(step),
    })
}

/// Evaluate the selected channels (all when `only` is `None`) on `grid`.
fn interpolate_onto(curve: &Curve, grid: &[f64], only: Option<&[&str]>) -> SignalResult<Curve> {
    let mut out = Curve::with_time(grid.to_vec())?;
    let names: Vec<&str> = match only {
        Some(names) => names.to_vec(),
        None => curve.channel_names().collect(),
    };
    for name in names {
        let values = curve.require_channel(name)?;
        let pchip = Pchip::new(curve.time(), values)?;
        out.insert_channel(name, pchip.eval_many(grid))?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw() -> Curve {
        Curve::from_columns(
            vec![0.0, 0.02, 0.05, 0.05, 0.06, 0.1],
            [("U", vec![1.0, 1.0, 1.0, 0.5, 0.5, 0.5])],
        )
        .unwrap()
    }

    #[test]
    fn dedup_keeps_first_sample() {
        let out = dedup_time(&raw()).unwrap();
        assert_eq!(out.time(), &[0.0, 0.02, 0.05, 0.06, 0.1]);
        assert_eq!(out.channel("U").unwrap(), &[1.0, 1.0, 1.0, 0.5, 0.5]);
    }

    #[test]
    fn fixed_step_uses_min_step() {
        let out = to_fixed_step(&raw(), 10_000.0, None).unwrap();
        let step = out.step.unwrap();
        assert!((step - 0.01).abs() < 1e-12);
        assert_eq!(out.curve.len(), 11);
        let uniform = out.curve.uniform_step(1e-6).unwrap();
        assert!((uniform - step).abs() < 1e-12);
    }

    #[test]
    fn fixed_step_respects_rate_cap() {
        let out = to_fixed_step(&raw(), 50.0, None).unwrap();
        assert!((out.step.unwrap() - 0.02).abs() < 1e-12);

        let hinted = to_fixed_step(&raw(), 10_000.0, Some(40.0)).unwrap();
        assert!((hinted.step.unwrap() - 0.025).abs() < 1e-12);
    }

    #[test]
    fn fixed_step_output_is_strictly_increasing() {
        let out = to_fixed_step(&raw(), 10_000.0, None).unwrap();
        assert!(out.curve.time().windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn empty_curve_passes_through() {
        let out = to_fixed_step(&Curve::empty(), 10_000.0, None).unwrap();
        assert!(out.curve.is_empty());
        assert!(out.step.is_none());

        let pair = to_common_grid(&Curve::empty(), &raw(), 0.01).unwrap();
        assert!(pair.calculated.is_empty());
        assert_eq!(pair.reference, raw());
    }

    #[test]
    fn resampling_twice_is_idempotent() {
        let once = to_fixed_step(&raw(), 10_000.0, None).unwrap();
        let twice = to_fixed_step(&once.curve, 10_000.0, None).unwrap();
        assert_eq!(once.curve.len(), twice.curve.len());
        for (a, b) in once
            .curve
            .channel("U")
            .unwrap()
            .iter()
            .zip(twice.curve.channel("U").unwrap())
        {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn common_grid_uses_overlap_and_shared_channels() {
        let calc = Curve::from_columns(
            vec![0.0, 0.5, 1.0, 1.5],
            [("U", vec![1.0; 4]), ("P", vec![0.5; 4])],
        )
        .unwrap();
        let reference = Curve::from_columns(
            vec![0.25, 0.75, 1.25],
            [("U", vec![0.9; 3]), ("Q", vec![0.1; 3])],
        )
        .unwrap();

        let pair = to_common_grid(&calc, &reference, 0.25).unwrap();
        assert_eq!(pair.calculated.time(), pair.reference.time());
        assert_eq!(pair.calculated.first_time(), Some(0.25));
        assert_eq!(pair.calculated.last_time(), Some(1.25));
        let names: Vec<_> = pair.calculated.channel_names().collect();
        assert_eq!(names, vec!["U"]);
        assert!(!pair.reference.has_channel("Q"));
    }

    #[test]
    fn disjoint_ranges_give_empty_pair() {
        let calc = Curve::from_columns(vec![0.0, 1.0], [("U", vec![1.0, 1.0])]).unwrap();
        let reference = Curve::from_columns(vec![2.0, 3.0], [("U", vec![1.0, 1.0])]).unwrap();
        let pair = to_common_grid(&calc, &reference, 0.1).unwrap();
        assert!(pair.calculated.is_empty() && pair.reference.is_empty());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn output_grid_is_evenly_spaced(
            steps in prop::collection::vec(0.001_f64..0.05, 2..60),
            level in -1.0_f64..1.0,
        ) {
            let mut time = vec![0.0];
            for dt in &steps {
                let last = *time.last().unwrap();
                time.push(last + dt);
            }
            let values: Vec<f64> = time.iter().map(|t| level + t.sin()).collect();
            let curve = Curve::from_columns(time, [("U", values)]).unwrap();

            let out = to_fixed_step(&curve, 100_000.0, None).unwrap();
            let step = out.step.unwrap();
            let t = out.curve.time();
            for w in t.windows(2) {
                prop_assert!(w[1] > w[0]);
                prop_assert!(((w[1] - w[0]) - step).abs() < 1e-9);
            }
            prop_assert!(*t.last().unwrap() <= *curve.time().last().unwrap());
        }
    }
}
