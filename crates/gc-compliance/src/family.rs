//! Channel families and the test context that selects which of them matter.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Physical quantity a channel carries, derived from its name suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelFamily {
    ActivePower,
    ReactivePower,
    ActiveCurrent,
    ReactiveCurrent,
    Voltage,
    Frequency,
}

impl ChannelFamily {
    pub const ALL: [ChannelFamily; 6] = [
        ChannelFamily::ActivePower,
        ChannelFamily::ReactivePower,
        ChannelFamily::ActiveCurrent,
        ChannelFamily::ReactiveCurrent,
        ChannelFamily::Voltage,
        ChannelFamily::Frequency,
    ];

    /// Channel-name suffix identifying the family.
    pub fn suffix(self) -> &'static str {
        match self {
            Self::ActivePower => "_ActivePower",
            Self::ReactivePower => "_ReactivePower",
            Self::ActiveCurrent => "_ActiveCurrent",
            Self::ReactiveCurrent => "_ReactiveCurrent",
            Self::Voltage => "_Voltage",
            Self::Frequency => "_Frequency",
        }
    }

    /// Key used in result maps.
    pub fn key(self) -> &'static str {
        match self {
            Self::ActivePower => "active_power",
            Self::ReactivePower => "reactive_power",
            Self::ActiveCurrent => "active_current",
            Self::ReactiveCurrent => "reactive_current",
            Self::Voltage => "voltage",
            Self::Frequency => "frequency",
        }
    }

    /// Family of a channel such as `BusPDR_BUS_ActivePower`.
    pub fn of_channel(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| name.ends_with(f.suffix()))
    }
}

impl fmt::Display for ChannelFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Kind of test the curves come from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SimulationType {
    /// Voltage dip or fault ride-through
    Fault,
    /// Step on a controlled quantity
    Setpoint {
        tracked: ChannelFamily,
        /// Commanded variation of the tracked quantity, in per-unit
        step_magnitude: f64,
    },
    /// Grid frequency excursion
    Frequency,
}

/// Scope of the model being validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Zone {
    /// A single generating unit
    #[default]
    Unit,
    /// The whole plant at the point of connection
    Plant,
}

/// Origin of the reference curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    #[default]
    Simulation,
    FieldMeasurement,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TestContext {
    pub simulation: SimulationType,
    #[serde(default)]
    pub zone: Zone,
    #[serde(default)]
    pub reference: ReferenceKind,
}

impl TestContext {
    pub fn new(simulation: SimulationType, zone: Zone, reference: ReferenceKind) -> Self {
        Self {
            simulation,
            zone,
            reference,
        }
    }

    /// Families whose checks decide overall compliance.
    pub fn relevant_families(&self) -> BTreeSet<ChannelFamily> {
        use ChannelFamily::*;
        let mut families: BTreeSet<ChannelFamily> = match self.simulation {
            SimulationType::Fault => [ActivePower, ReactivePower, ActiveCurrent, ReactiveCurrent]
                .into_iter()
                .collect(),
            SimulationType::Setpoint { tracked, .. } => {
                [ActivePower, ReactivePower, tracked].into_iter().collect()
            }
            SimulationType::Frequency => [ActivePower].into_iter().collect(),
        };
        if self.zone == Zone::Plant {
            families.insert(Frequency);
        }
        families
    }

    /// Family regulated directly by a setpoint-tracking test.
    pub fn tracked_family(&self) -> Option<ChannelFamily> {
        match self.simulation {
            SimulationType::Setpoint { tracked, .. } => Some(tracked),
            _ => None,
        }
    }

    pub fn is_tracked(&self, family: Option<ChannelFamily>) -> bool {
        family.is_some() && family == self.tracked_family()
    }

    /// Normalization applied to the errors of channels in `family`.
    pub fn step_magnitude(&self, family: Option<ChannelFamily>) -> f64 {
        match self.simulation {
            SimulationType::Setpoint {
                tracked,
                step_magnitude,
            } if family == Some(tracked) => step_magnitude,
            _ => 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn family_from_suffix() {
        assert_eq!(
            ChannelFamily::of_channel("BusPDR_BUS_ActivePower"),
            Some(ChannelFamily::ActivePower)
        );
        assert_eq!(
            ChannelFamily::of_channel("WT1_ReactiveCurrent"),
            Some(ChannelFamily::ReactiveCurrent)
        );
        assert_eq!(
            ChannelFamily::of_channel("BusPDR_BUS_Voltage"),
            Some(ChannelFamily::Voltage)
        );
        assert_eq!(ChannelFamily::of_channel("Pitch_Angle"), None);
    }

    #[test]
    fn relevant_families_by_test() {
        use ChannelFamily::*;
        let fault = TestContext::new(SimulationType::Fault, Zone::Unit, ReferenceKind::Simulation);
        assert_eq!(
            fault.relevant_families().into_iter().collect::<Vec<_>>(),
            vec![ActivePower, ReactivePower, ActiveCurrent, ReactiveCurrent]
        );

        let setpoint = TestContext::new(
            SimulationType::Setpoint {
                tracked: Voltage,
                step_magnitude: 0.05,
            },
            Zone::Plant,
            ReferenceKind::Simulation,
        );
        let families = setpoint.relevant_families();
        assert!(families.contains(&Voltage));
        assert!(families.contains(&Frequency));
        assert_eq!(families.len(), 4);

        let freq = TestContext::new(
            SimulationType::Frequency,
            Zone::Unit,
            ReferenceKind::Simulation,
        );
        assert_eq!(freq.relevant_families().len(), 1);
    }

    #[test]
    fn step_magnitude_applies_to_tracked_family_only() {
        let ctx = TestContext::new(
            SimulationType::Setpoint {
                tracked: ChannelFamily::ReactivePower,
                step_magnitude: 0.1,
            },
            Zone::Unit,
            ReferenceKind::Simulation,
        );
        assert_eq!(ctx.step_magnitude(Some(ChannelFamily::ReactivePower)), 0.1);
        assert_eq!(ctx.step_magnitude(Some(ChannelFamily::ActivePower)), 1.0);
        assert_eq!(ctx.step_magnitude(None), 1.0);
        assert!(ctx.is_tracked(Some(ChannelFamily::ReactivePower)));
        assert!(!ctx.is_tracked(None));
    }

    #[test]
    fn simulation_type_parses_from_tagged_form() {
        let t: SimulationType =
            serde_json::from_str(r#"{"type":"setpoint","tracked":"voltage","step_magnitude":0.05}"#)
                .unwrap();
        assert_eq!(
            t,
            SimulationType::Setpoint {
                tracked: ChannelFamily::Voltage,
                step_magnitude: 0.05
            }
        );
    }
}
