//! Companion metadata of a curve set.

use std::collections::BTreeMap;
use std::path::Path;

use gc_windows::EventTiming;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Event timing as written in metadata files.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EventSection {
    pub start_time_s: f64,
    #[serde(default)]
    pub fault_duration_s: f64,
}

impl EventSection {
    pub fn timing(&self) -> EventTiming {
        EventTiming::new(self.start_time_s, self.fault_duration_s)
    }
}

/// A generating unit described by the curve set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Generator {
    pub id: String,
    /// Remaining model parameters, kept as written
    #[serde(flatten)]
    pub attributes: BTreeMap<String, serde_yaml::Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CurveMetadata {
    #[serde(default)]
    pub is_field_measurement: bool,
    pub event: EventSection,
    #[serde(default)]
    pub sampling_frequency_hz: Option<f64>,
    /// Tool channel name -> column name in the curve file
    #[serde(default)]
    pub name_mapping: BTreeMap<String, String>,
    #[serde(default)]
    pub generators: Vec<Generator>,
}

impl CurveMetadata {
    pub fn new(event: EventTiming) -> Self {
        Self {
            event: EventSection {
                start_time_s: event.start_s,
                fault_duration_s: event.duration_s,
            },
            ..Self::default()
        }
    }

    /// Tool name for a file column, if the mapping renames it.
    pub fn tool_name(&self, column: &str) -> Option<&str> {
        self.name_mapping
            .iter()
            .find(|(_, file)| file.as_str() == column)
            .map(|(tool, _)| tool.as_str())
    }

    pub fn generator(&self, id: &str) -> Option<&Generator> {
        self.generators.iter().find(|g| g.id == id)
    }
}

pub fn parse_metadata(text: &str) -> Result<CurveMetadata, serde_yaml::Error> {
    serde_yaml::from_str(text)
}

pub fn load_metadata(path: &Path) -> AppResult<CurveMetadata> {
    let text = std::fs::read_to_string(path).map_err(|e| AppError::Metadata {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    parse_metadata(&text).map_err(|e| AppError::Metadata {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}
