//! Content-based hashing for run IDs.

use gc_config::Config;
use sha2::{Digest, Sha256};

use crate::types::TaskKey;

pub fn compute_run_id(task: &TaskKey, config: &Config, engine_version: &str) -> String {
    let mut hasher = Sha256::new();

    let task_json = serde_json::to_string(task).unwrap_or_default();
    hasher.update(task_json.as_bytes());

    let config_json = serde_json::to_string(config).unwrap_or_default();
    hasher.update(config_json.as_bytes());

    hasher.update(engine_version.as_bytes());

    let result = hasher.finalize();
    format!("{:x}", result)
}
