//! Result data types.

use std::fmt;

use gc_compliance::KeyedResults;
use serde::{Deserialize, Serialize};

pub type RunId = String;

/// Identity of one operating condition within a batch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskKey {
    pub producer: String,
    pub test_sheet: String,
    pub benchmark: String,
    pub operating_condition: String,
}

impl TaskKey {
    pub fn new(
        producer: impl Into<String>,
        test_sheet: impl Into<String>,
        benchmark: impl Into<String>,
        operating_condition: impl Into<String>,
    ) -> Self {
        Self {
            producer: producer.into(),
            test_sheet: test_sheet.into(),
            benchmark: benchmark.into(),
            operating_condition: operating_condition.into(),
        }
    }
}

impl fmt::Display for TaskKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.producer, self.test_sheet, self.benchmark, self.operating_condition
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunStatus {
    Completed { compliance: bool },
    /// Curves could not be obtained; `code` is the curve status code
    MissingCurves { code: u8 },
    Failed { message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    pub run_id: RunId,
    pub task: TaskKey,
    pub timestamp: String,
    pub status: RunStatus,
    pub engine_version: String,
    /// Files written next to the manifest besides `results.json`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dumps: Vec<String>,
}

/// Everything stored for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub manifest: RunManifest,
    pub results: KeyedResults,
}

impl RunManifest {
    /// Manifest stamped with the current UTC time.
    pub fn new(run_id: RunId, task: TaskKey, status: RunStatus, engine_version: &str) -> Self {
        Self {
            run_id,
            task,
            timestamp: chrono::Utc::now().to_rfc3339(),
            status,
            engine_version: engine_version.to_string(),
            dumps: Vec::new(),
        }
    }
}
