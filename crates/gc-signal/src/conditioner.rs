//! Conditioning pipeline for one curve pair.
//!
//! The stages run in a fixed order: RMS extraction, fixed-step resampling,
//! (windows are computed by the caller at this point), low-pass filtering and
//! common-grid resampling. [`SignalConditioner`] borrows its settings so one
//! resolved configuration can be shared by every worker.

use gc_core::{Curve, WindowSet, constants::NOMINAL_FREQUENCY_HZ};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{SignalError, SignalResult};
use crate::filter::{FilterSettings, lowpass_curve};
use crate::resample::{CommonGrid, FixedStep, to_common_grid, to_fixed_step};
use crate::rms::extract_positive_sequence;

/// Settings of every conditioning stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConditionerSettings {
    /// Fundamental used by the RMS extraction
    pub nominal_frequency_hz: f64,
    /// Channel suffixes of the three phases
    pub three_phase_suffixes: [String; 3],
    /// Upper bound of the fixed-step sampling rate
    pub max_sampling_rate_hz: f64,
    /// Step of the shared grid; the coarser fixed step when absent
    pub common_step_s: Option<f64>,
    pub filter: FilterSettings,
}

impl Default for ConditionerSettings {
    fn default() -> Self {
        Self {
            nominal_frequency_hz: NOMINAL_FREQUENCY_HZ,
            three_phase_suffixes: ["_a".into(), "_b".into(), "_c".into()],
            max_sampling_rate_hz: 10_000.0,
            common_step_s: None,
            filter: FilterSettings::default(),
        }
    }
}

pub struct SignalConditioner<'a> {
    settings: &'a ConditionerSettings,
}

impl<'a> SignalConditioner<'a> {
    pub fn new(settings: &'a ConditionerSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ConditionerSettings {
        self.settings
    }

    /// Replace complete three-phase groups by their positive-sequence magnitude.
    pub fn extract_rms(&self, curve: &Curve) -> SignalResult<Curve> {
        extract_positive_sequence(
            curve,
            self.settings.nominal_frequency_hz,
            &self.settings.three_phase_suffixes,
        )
    }

    /// Resample onto an evenly spaced grid.
    ///
    /// `sampling_hint_hz` is the sampling frequency declared for the curve, if any.
    pub fn to_fixed_step(
        &self,
        curve: &Curve,
        sampling_hint_hz: Option<f64>,
    ) -> SignalResult<FixedStep> {
        to_fixed_step(curve, self.settings.max_sampling_rate_hz, sampling_hint_hz)
    }

    /// RMS extraction followed by fixed-step resampling.
    pub fn prepare(&self, curve: &Curve, sampling_hint_hz: Option<f64>) -> SignalResult<FixedStep> {
        let rms = self.extract_rms(curve)?;
        self.to_fixed_step(&rms, sampling_hint_hz)
    }

    /// Low-pass filter a fixed-step curve within its filtering windows.
    ///
    /// The step must carry the cutoff (`SamplingTooCoarse` otherwise) only
    /// when some segment is not constant and is actually filtered.
    pub fn filter(&self, fixed: &FixedStep, windows: &WindowSet) -> SignalResult<Curve> {
        match fixed.step {
            Some(step) => lowpass_curve(&fixed.curve, step, &self.settings.filter, windows),
            None => Ok(fixed.curve.clone()),
        }
    }

    /// Step of the shared grid for two fixed-step curves.
    pub fn common_step(&self, calculated: Option<f64>, reference: Option<f64>) -> Option<f64> {
        self.settings.common_step_s.or(match (calculated, reference) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        })
    }

    /// Resample both filtered curves onto their overlapping range.
    pub fn common_grid(
        &self,
        calculated: &Curve,
        calculated_step: Option<f64>,
        reference: &Curve,
        reference_step: Option<f64>,
    ) -> SignalResult<CommonGrid> {
        let Some(step) = self.common_step(calculated_step, reference_step) else {
            if calculated.len() > 1 || reference.len() > 1 {
                return Err(SignalError::InvalidArg {
                    what: "no step available for the common grid",
                });
            }
            return Ok(CommonGrid {
                calculated: calculated.clone(),
                reference: reference.clone(),
                step: None,
            });
        };
        let pair = to_common_grid(calculated, reference, step)?;
        debug!(
            step,
            samples = pair.calculated.len(),
            channels = pair.calculated.channels().len(),
            "curves resampled to common grid"
        );
        Ok(pair)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gc_core::Window;

    fn windows() -> WindowSet {
        WindowSet {
            before: Window::new(0.0, 0.5),
            during: Window::new(0.5, 0.6),
            after: Window::new(0.6, 1.0),
        }
    }

    fn level(step: f64, value: f64) -> Curve {
        let n = (1.0 / step).round() as usize + 1;
        let time: Vec<f64> = (0..n).map(|i| i as f64 * step).collect();
        let values = vec![value; n];
        Curve::from_columns(time, [("BusPDR_BUS_Voltage", values)]).unwrap()
    }

    #[test]
    fn default_settings() {
        let s = ConditionerSettings::default();
        assert_eq!(s.nominal_frequency_hz, 50.0);
        assert_eq!(s.max_sampling_rate_hz, 10_000.0);
        assert_eq!(s.filter.cutoff_hz, 15.0);
        assert!(s.filter.enabled);
    }

    #[test]
    fn common_step_prefers_configured_then_coarser() {
        let mut s = ConditionerSettings::default();
        let c = SignalConditioner::new(&s);
        assert_eq!(c.common_step(Some(0.001), Some(0.002)), Some(0.002));
        assert_eq!(c.common_step(None, Some(0.002)), Some(0.002));
        assert_eq!(c.common_step(None, None), None);

        s.common_step_s = Some(0.005);
        let c = SignalConditioner::new(&s);
        assert_eq!(c.common_step(Some(0.001), Some(0.002)), Some(0.005));
    }

    #[test]
    fn full_pipeline_aligns_pair() {
        let settings = ConditionerSettings::default();
        let c = SignalConditioner::new(&settings);

        let calc = c.prepare(&level(0.001, 1.0), None).unwrap();
        let reference = c.prepare(&level(0.002, 1.02), None).unwrap();

        let calc_f = c.filter(&calc, &windows()).unwrap();
        let ref_f = c.filter(&reference, &windows()).unwrap();
        let pair = c
            .common_grid(&calc_f, calc.step, &ref_f, reference.step)
            .unwrap();

        assert_eq!(pair.calculated.time(), pair.reference.time());
        assert!((pair.step.unwrap() - 0.002).abs() < 1e-12);
        let d: Vec<f64> = pair
            .reference
            .channel("BusPDR_BUS_Voltage")
            .unwrap()
            .iter()
            .zip(pair.calculated.channel("BusPDR_BUS_Voltage").unwrap())
            .map(|(r, c)| r - c)
            .collect();
        assert!(d.iter().all(|v| (v - 0.02).abs() < 1e-9));
    }

    fn ramp(step: f64) -> Curve {
        let n = (1.0 / step).round() as usize + 1;
        let time: Vec<f64> = (0..n).map(|i| i as f64 * step).collect();
        let values: Vec<f64> = time.iter().map(|t| 1.0 - 0.1 * t).collect();
        Curve::from_columns(time, [("BusPDR_BUS_Voltage", values)]).unwrap()
    }

    #[test]
    fn coarse_step_is_rejected_only_when_filtering_happens() {
        let settings = ConditionerSettings::default();
        let c = SignalConditioner::new(&settings);

        let flat = c.to_fixed_step(&level(0.05, 1.0), None).unwrap();
        assert_eq!(c.filter(&flat, &windows()).unwrap(), flat.curve);

        let sloped = c.to_fixed_step(&ramp(0.05), None).unwrap();
        assert!(matches!(
            c.filter(&sloped, &windows()),
            Err(SignalError::SamplingTooCoarse { .. })
        ));
        let fine = c.to_fixed_step(&ramp(0.002), None).unwrap();
        assert!(c.filter(&fine, &windows()).is_ok());

        let mut off = ConditionerSettings::default();
        off.filter.enabled = false;
        let off = SignalConditioner::new(&off);
        assert_eq!(off.filter(&sloped, &windows()).unwrap(), sloped.curve);
    }

    #[test]
    fn empty_curves_pass_through() {
        let settings = ConditionerSettings::default();
        let c = SignalConditioner::new(&settings);
        let fixed = c.prepare(&Curve::empty(), None).unwrap();
        let filtered = c.filter(&fixed, &windows()).unwrap();
        let pair = c
            .common_grid(&filtered, fixed.step, &Curve::empty(), None)
            .unwrap();
        assert!(pair.calculated.is_empty() && pair.reference.is_empty());
    }
}
