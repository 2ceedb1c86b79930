//! Configuration schema.
//!
//! Every section has defaults, so an empty document is a valid configuration.

use gc_compliance::Thresholds;
use gc_signal::ConditionerSettings;
use gc_windows::WindowSettings;
use serde::{Deserialize, Serialize};

pub const LATEST_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub version: u32,
    pub signal: ConditionerSettings,
    pub windows: WindowSettings,
    pub thresholds: Thresholds,
    pub diagnostics: DiagnosticsSettings,
    pub batch: BatchSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: LATEST_VERSION,
            signal: ConditionerSettings::default(),
            windows: WindowSettings::default(),
            thresholds: Thresholds::default(),
            diagnostics: DiagnosticsSettings::default(),
            batch: BatchSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default, deny_unknown_fields)]
pub struct DiagnosticsSettings {
    /// Write the filtered calculated/reference curves next to the results
    pub dump_curves: bool,
    /// Record per-stage wall time
    pub timing: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default, deny_unknown_fields)]
pub struct BatchSettings {
    /// Worker threads; the number of CPUs when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,
}
