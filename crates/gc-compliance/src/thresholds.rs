//! Per-unit error limits.
//!
//! Three tables exist: one for simulated references, a looser one for field
//! measurements and a reference-independent one for the tracked quantity of a
//! setpoint test. Limits are kept exactly as configured, including the
//! asymmetry between the during window and the windows around it.

use std::collections::BTreeMap;
use std::fmt;

use gc_core::WindowName;
use serde::{Deserialize, Serialize};

use crate::family::{ChannelFamily, ReferenceKind, TestContext};

/// The three error estimators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    /// Mean error
    Me,
    /// Mean absolute error
    Mae,
    /// Maximum absolute error
    Mxe,
}

impl MetricKind {
    pub const ALL: [MetricKind; 3] = [MetricKind::Me, MetricKind::Mae, MetricKind::Mxe];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Me => "me",
            Self::Mae => "mae",
            Self::Mxe => "mxe",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Limits of one window; `None` means the metric is not checked.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MetricLimits {
    pub me: Option<f64>,
    pub mae: Option<f64>,
    pub mxe: Option<f64>,
}

impl MetricLimits {
    pub const fn new(me: f64, mae: f64, mxe: f64) -> Self {
        Self {
            me: Some(me),
            mae: Some(mae),
            mxe: Some(mxe),
        }
    }

    pub fn get(&self, metric: MetricKind) -> Option<f64> {
        match metric {
            MetricKind::Me => self.me,
            MetricKind::Mae => self.mae,
            MetricKind::Mxe => self.mxe,
        }
    }

    fn scaled(&self, factor: f64) -> Self {
        Self {
            me: self.me.map(|v| v * factor),
            mae: self.mae.map(|v| v * factor),
            mxe: self.mxe.map(|v| v * factor),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WindowLimits {
    pub before: MetricLimits,
    pub during: MetricLimits,
    pub after: MetricLimits,
}

impl WindowLimits {
    pub fn get(&self, window: WindowName) -> &MetricLimits {
        match window {
            WindowName::Before => &self.before,
            WindowName::During => &self.during,
            WindowName::After => &self.after,
        }
    }

    fn scaled(&self, factor: f64) -> Self {
        Self {
            before: self.before.scaled(factor),
            during: self.during.scaled(factor),
            after: self.after.scaled(factor),
        }
    }
}

/// Limits per channel family.
pub type ThresholdTable = BTreeMap<ChannelFamily, WindowLimits>;

/// Look up one limit; a family missing from the table has no limits.
pub fn limit(
    table: &ThresholdTable,
    family: ChannelFamily,
    window: WindowName,
    metric: MetricKind,
) -> Option<f64> {
    table.get(&family).and_then(|w| w.get(window).get(metric))
}

/// The three threshold tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Thresholds {
    pub simulation: ThresholdTable,
    pub field_measurement: ThresholdTable,
    pub setpoint: ThresholdTable,
}

impl Default for Thresholds {
    fn default() -> Self {
        let outside = MetricLimits::new(0.02, 0.03, 0.05);
        let inside = MetricLimits::new(0.05, 0.07, 0.10);
        let electrical = WindowLimits {
            before: outside,
            during: inside,
            after: outside,
        };
        let outside_field = MetricLimits::new(0.04, 0.05, 0.08);
        let inside_field = MetricLimits::new(0.08, 0.10, 0.15);
        let electrical_field = WindowLimits {
            before: outside_field,
            during: inside_field,
            after: outside_field,
        };
        let frequency_limits = MetricLimits::new(0.0005, 0.001, 0.002);
        let frequency = WindowLimits {
            before: frequency_limits,
            during: frequency_limits,
            after: frequency_limits,
        };
        let tracking = WindowLimits {
            before: outside,
            during: MetricLimits::default(),
            after: outside,
        };

        let mut simulation = ThresholdTable::new();
        let mut field_measurement = ThresholdTable::new();
        let mut setpoint = ThresholdTable::new();
        for family in ChannelFamily::ALL {
            if family == ChannelFamily::Frequency {
                simulation.insert(family, frequency);
                field_measurement.insert(family, frequency.scaled(2.0));
            } else {
                simulation.insert(family, electrical);
                field_measurement.insert(family, electrical_field);
                setpoint.insert(family, tracking);
            }
        }
        Self {
            simulation,
            field_measurement,
            setpoint,
        }
    }
}

impl Thresholds {
    /// Table that applies to channels of `family` in `ctx`.
    pub fn table_for(&self, ctx: &TestContext, family: Option<ChannelFamily>) -> &ThresholdTable {
        if ctx.is_tracked(family) {
            &self.setpoint
        } else {
            match ctx.reference {
                ReferenceKind::FieldMeasurement => &self.field_measurement,
                ReferenceKind::Simulation => &self.simulation,
            }
        }
    }

    /// Entries where a field-measurement limit is tighter than the simulation one.
    pub fn ordering_violations(&self) -> Vec<String> {
        let mut out = Vec::new();
        for (family, sim) in &self.simulation {
            let Some(field) = self.field_measurement.get(family) else {
                continue;
            };
            for window in WindowName::ALL {
                for metric in MetricKind::ALL {
                    let pair = (sim.get(window).get(metric), field.get(window).get(metric));
                    if let (Some(s), Some(f)) = pair {
                        if f < s {
                            out.push(format!(
                                "{family}.{window}.{metric}: field {f} < simulation {s}"
                            ));
                        }
                    }
                }
            }
        }
        out
    }

    /// Every configured limit with its location, for range validation.
    pub fn entries(&self) -> impl Iterator<Item = (String, f64)> + '_ {
        [
            ("simulation", &self.simulation),
            ("field_measurement", &self.field_measurement),
            ("setpoint", &self.setpoint),
        ]
        .into_iter()
        .flat_map(|(name, table)| {
            table.iter().flat_map(move |(family, limits)| {
                WindowName::ALL.into_iter().flat_map(move |window| {
                    MetricKind::ALL.into_iter().filter_map(move |metric| {
                        limits
                            .get(window)
                            .get(metric)
                            .map(|v| (format!("{name}.{family}.{window}.{metric}"), v))
                    })
                })
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::family::{SimulationType, Zone};

    #[test]
    fn default_field_limits_are_never_tighter() {
        assert!(Thresholds::default().ordering_violations().is_empty());
    }

    #[test]
    fn detects_inverted_limits() {
        let mut t = Thresholds::default();
        if let Some(w) = t.field_measurement.get_mut(&ChannelFamily::Voltage) {
            w.before.mxe = Some(0.01);
        }
        let v = t.ordering_violations();
        assert_eq!(v.len(), 1);
        assert!(v[0].starts_with("voltage.before.mxe"));
    }

    #[test]
    fn setpoint_table_has_no_during_limits() {
        let t = Thresholds::default();
        for metric in MetricKind::ALL {
            assert_eq!(
                limit(&t.setpoint, ChannelFamily::Voltage, WindowName::During, metric),
                None
            );
        }
        assert_eq!(
            limit(&t.setpoint, ChannelFamily::Voltage, WindowName::After, MetricKind::Mxe),
            Some(0.05)
        );
    }

    #[test]
    fn table_selection() {
        let t = Thresholds::default();
        let field = TestContext::new(
            SimulationType::Fault,
            Zone::Unit,
            ReferenceKind::FieldMeasurement,
        );
        assert_eq!(
            t.table_for(&field, Some(ChannelFamily::ActivePower)),
            &t.field_measurement
        );

        let setpoint = TestContext::new(
            SimulationType::Setpoint {
                tracked: ChannelFamily::Voltage,
                step_magnitude: 0.05,
            },
            Zone::Unit,
            ReferenceKind::FieldMeasurement,
        );
        assert_eq!(t.table_for(&setpoint, Some(ChannelFamily::Voltage)), &t.setpoint);
        assert_eq!(
            t.table_for(&setpoint, Some(ChannelFamily::ActivePower)),
            &t.field_measurement
        );
    }

    #[test]
    fn partial_limits_parse_from_yaml() {
        let yaml = "voltage:\n  during:\n    mxe: 0.2\n";
        let table: ThresholdTable = serde_yaml::from_str(yaml).unwrap();
        let w = &table[&ChannelFamily::Voltage];
        assert_eq!(w.during.mxe, Some(0.2));
        assert_eq!(w.during.me, None);
        assert_eq!(w.before, MetricLimits::default());
    }

    #[test]
    fn entries_cover_every_limit() {
        let t = Thresholds::default();
        // 6 families x 9 limits, twice, plus 5 families x 6 setpoint limits
        assert_eq!(t.entries().count(), 6 * 9 * 2 + 5 * 6);
    }
}
