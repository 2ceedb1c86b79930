//! Window boundaries for one curve set.

use gc_core::{Window, WindowScope, WindowSet};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{WindowError, WindowResult};

/// Kind of fault applied in the test, selecting the validation margins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FaultType {
    #[default]
    Bolted,
    HighImpedance,
}

/// Exclusion intervals after fault inception and after clearance, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Margins {
    pub inception_s: f64,
    pub clearance_s: f64,
}

impl Margins {
    pub const ZERO: Margins = Margins {
        inception_s: 0.0,
        clearance_s: 0.0,
    };

    pub fn new(inception_s: f64, clearance_s: f64) -> Self {
        Self {
            inception_s,
            clearance_s,
        }
    }

    pub fn validate(&self) -> WindowResult<()> {
        check_margin("inception", self.inception_s)?;
        check_margin("clearance", self.clearance_s)
    }
}

fn check_margin(what: &'static str, value: f64) -> WindowResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(WindowError::InvalidMargin { what, value })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WindowSettings {
    pub filtering: Margins,
    pub bolted: Margins,
    pub high_impedance: Margins,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            filtering: Margins::ZERO,
            bolted: Margins::new(0.140, 0.500),
            high_impedance: Margins::new(0.020, 0.020),
        }
    }
}

impl WindowSettings {
    pub fn validation_margins(&self, fault: FaultType) -> Margins {
        match fault {
            FaultType::Bolted => self.bolted,
            FaultType::HighImpedance => self.high_impedance,
        }
    }

    pub fn validate(&self) -> WindowResult<()> {
        self.filtering.validate()?;
        self.bolted.validate()?;
        self.high_impedance.validate()
    }
}

/// Event start and duration as declared in the curve metadata.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EventTiming {
    pub start_s: f64,
    pub duration_s: f64,
}

impl EventTiming {
    pub fn new(start_s: f64, duration_s: f64) -> Self {
        Self {
            start_s,
            duration_s,
        }
    }

    pub fn end_s(&self) -> f64 {
        self.start_s + self.duration_s
    }
}

/// Both boundary sets of one curve set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveWindows {
    pub filtering: WindowSet,
    pub validation: WindowSet,
}

impl CurveWindows {
    pub fn get(&self, scope: WindowScope) -> &WindowSet {
        match scope {
            WindowScope::Filtering => &self.filtering,
            WindowScope::Validation => &self.validation,
        }
    }

    pub fn get_mut(&mut self, scope: WindowScope) -> &mut WindowSet {
        match scope {
            WindowScope::Filtering => &mut self.filtering,
            WindowScope::Validation => &mut self.validation,
        }
    }
}

/// Build `{before, during, after}` on `[t_first, t_last]`.
///
/// Event times are clamped into the record. With a zero duration the during
/// window collapses onto the event start.
pub fn window_set(t_first: f64, t_last: f64, event: EventTiming, margins: Margins) -> WindowSet {
    let start = event.start_s.clamp(t_first, t_last);
    let end = event.end_s().clamp(start, t_last);

    let during = if event.duration_s == 0.0 {
        Window::point(start)
    } else {
        Window::new((start + margins.inception_s).min(end), end)
    };

    WindowSet {
        before: Window::new(t_first, start),
        during,
        after: Window::new((end + margins.clearance_s).min(t_last), t_last),
    }
}

pub struct WindowCalculator<'a> {
    settings: &'a WindowSettings,
}

impl<'a> WindowCalculator<'a> {
    pub fn new(settings: &'a WindowSettings) -> Self {
        Self { settings }
    }

    /// Compute both boundary sets for a record with time axis `time`.
    ///
    /// `setpoint_tracked` marks the quantity the unit regulates directly in a
    /// setpoint-tracking test; its validation windows keep no clearance margin.
    pub fn compute(
        &self,
        time: &[f64],
        event: EventTiming,
        fault: FaultType,
        setpoint_tracked: bool,
    ) -> WindowResult<CurveWindows> {
        let (Some(&t_first), Some(&t_last)) = (time.first(), time.last()) else {
            return Err(WindowError::EmptyRecord);
        };
        if !(t_first.is_finite() && t_last.is_finite() && t_first <= t_last) {
            return Err(WindowError::UnorderedTime { t_first, t_last });
        }
        if !event.start_s.is_finite() {
            return Err(WindowError::InvalidEvent {
                what: "start time",
                value: event.start_s,
            });
        }
        if !(event.duration_s.is_finite() && event.duration_s >= 0.0) {
            return Err(WindowError::InvalidEvent {
                what: "duration",
                value: event.duration_s,
            });
        }

        let filtering_margins = self.settings.filtering;
        let mut validation_margins = self.settings.validation_margins(fault);
        filtering_margins.validate()?;
        validation_margins.validate()?;
        if setpoint_tracked {
            validation_margins.clearance_s = 0.0;
        }

        let windows = CurveWindows {
            filtering: window_set(t_first, t_last, event, filtering_margins),
            validation: window_set(t_first, t_last, event, validation_margins),
        };
        debug!(?fault, setpoint_tracked, validation = ?windows.validation, "computed windows");
        Ok(windows)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn both_scopes_are_ordered(
            t_first in -1.0_f64..1.0,
            span in 0.0_f64..10.0,
            start_frac in -0.2_f64..1.2,
            duration in 0.0_f64..2.0,
            inception in 0.0_f64..1.0,
            clearance in 0.0_f64..1.0,
            fault in prop_oneof![Just(FaultType::Bolted), Just(FaultType::HighImpedance)],
            tracked in any::<bool>(),
        ) {
            let t_last = t_first + span;
            let time = vec![t_first, t_last];
            let settings = WindowSettings {
                filtering: Margins::new(inception, clearance),
                ..WindowSettings::default()
            };
            let event = EventTiming::new(t_first + start_frac * span, duration);
            let w = WindowCalculator::new(&settings)
                .compute(&time, event, fault, tracked)
                .unwrap();

            for set in [w.filtering, w.validation] {
                prop_assert!(set.is_ordered());
                prop_assert_eq!(set.before.from, t_first);
                prop_assert_eq!(set.after.to, t_last);
            }
        }
    }
}
