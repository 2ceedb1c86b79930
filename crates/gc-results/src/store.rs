//! Result storage API.
//!
//! Layout: `<root>/<run_id>/manifest.json`, `<root>/<run_id>/results.json`
//! and optional `<root>/<run_id>/<name>.csv` curve dumps.

use std::fs;
use std::path::PathBuf;

use gc_compliance::KeyedResults;
use gc_core::Curve;

use crate::dump::write_curve;
use crate::types::{RunManifest, RunRecord};
use crate::{ResultsError, ResultsResult};

const MANIFEST_FILE: &str = "manifest.json";
const RESULTS_FILE: &str = "results.json";
const DUMP_SEPARATOR: char = ';';

#[derive(Clone)]
pub struct ResultStore {
    root_dir: PathBuf,
}

impl ResultStore {
    pub fn new(root_dir: PathBuf) -> ResultsResult<Self> {
        if !root_dir.exists() {
            fs::create_dir_all(&root_dir)?;
        }
        Ok(Self { root_dir })
    }

    pub fn root_dir(&self) -> &std::path::Path {
        &self.root_dir
    }

    fn run_dir(&self, run_id: &str) -> PathBuf {
        self.root_dir.join(run_id)
    }

    pub fn has_run(&self, run_id: &str) -> bool {
        self.run_dir(run_id).join(MANIFEST_FILE).exists()
    }

    pub fn save_run(&self, manifest: &RunManifest, results: &KeyedResults) -> ResultsResult<()> {
        let run_dir = self.run_dir(&manifest.run_id);
        fs::create_dir_all(&run_dir)?;

        fs::write(
            run_dir.join(MANIFEST_FILE),
            serde_json::to_string_pretty(manifest)?,
        )?;
        fs::write(
            run_dir.join(RESULTS_FILE),
            serde_json::to_string_pretty(results)?,
        )?;
        Ok(())
    }

    /// Write a diagnostic curve dump into the run directory; returns the file name.
    pub fn dump_curve(&self, run_id: &str, name: &str, curve: &Curve) -> ResultsResult<String> {
        let run_dir = self.run_dir(run_id);
        fs::create_dir_all(&run_dir)?;
        let file_name = format!("{name}.csv");
        write_curve(&run_dir.join(&file_name), curve, DUMP_SEPARATOR)?;
        Ok(file_name)
    }

    pub fn load_manifest(&self, run_id: &str) -> ResultsResult<RunManifest> {
        let path = self.run_dir(run_id).join(MANIFEST_FILE);
        if !path.exists() {
            return Err(ResultsError::RunNotFound {
                run_id: run_id.to_string(),
            });
        }
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn load_results(&self, run_id: &str) -> ResultsResult<KeyedResults> {
        let path = self.run_dir(run_id).join(RESULTS_FILE);
        if !path.exists() {
            return Err(ResultsError::RunNotFound {
                run_id: run_id.to_string(),
            });
        }
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn load_run(&self, run_id: &str) -> ResultsResult<RunRecord> {
        Ok(RunRecord {
            manifest: self.load_manifest(run_id)?,
            results: self.load_results(run_id)?,
        })
    }

    /// Manifests of every stored run, ordered by task key.
    pub fn list_runs(&self) -> ResultsResult<Vec<RunManifest>> {
        let mut runs = Vec::new();
        if !self.root_dir.exists() {
            return Ok(runs);
        }

        for entry in fs::read_dir(&self.root_dir)? {
            let entry = entry?;
            if entry.path().is_dir() {
                let run_id = entry.file_name().to_string_lossy().to_string();
                if let Ok(manifest) = self.load_manifest(&run_id) {
                    runs.push(manifest);
                }
            }
        }
        runs.sort_by(|a, b| a.task.cmp(&b.task));
        Ok(runs)
    }

    pub fn list_for_test_sheet(&self, test_sheet: &str) -> ResultsResult<Vec<RunManifest>> {
        let mut runs = self.list_runs()?;
        runs.retain(|m| m.task.test_sheet == test_sheet);
        Ok(runs)
    }

    pub fn delete_run(&self, run_id: &str) -> ResultsResult<()> {
        let run_dir = self.run_dir(run_id);
        if run_dir.exists() {
            fs::remove_dir_all(run_dir)?;
        }
        Ok(())
    }
}
