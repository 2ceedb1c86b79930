//! Batch execution of operating conditions on a worker pool.

use std::path::{Path, PathBuf};

use gc_compliance::{ComplianceReport, KeyedResults, TestContext};
use gc_config::Config;
use gc_results::{ResultStore, RunId, RunManifest, RunStatus, TaskKey, compute_run_id};
use gc_windows::FaultType;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::manager::{CurveSide, CurvesManager, CurvesStatus};
use crate::provider::FileCurveProvider;

/// Curve file and metadata file of one side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveSource {
    pub curve: PathBuf,
    pub metadata: PathBuf,
}

impl CurveSource {
    fn provider(&self) -> FileCurveProvider {
        FileCurveProvider::new(&self.curve, &self.metadata)
    }

    fn resolve(&mut self, base: &Path) {
        if self.curve.is_relative() {
            self.curve = base.join(&self.curve);
        }
        if self.metadata.is_relative() {
            self.metadata = base.join(&self.metadata);
        }
    }
}

/// One operating condition to evaluate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchTask {
    pub key: TaskKey,
    pub context: TestContext,
    #[serde(default)]
    pub fault: FaultType,
    #[serde(default)]
    pub required_channels: Vec<String>,
    pub calculated: CurveSource,
    pub reference: CurveSource,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct BatchFile {
    tasks: Vec<BatchTask>,
}

/// Read a YAML task list; relative paths are taken from the file's directory.
pub fn load_batch(path: &Path) -> AppResult<Vec<BatchTask>> {
    let text = std::fs::read_to_string(path)?;
    let file: BatchFile = serde_yaml::from_str(&text)
        .map_err(|e| AppError::Batch(format!("{}: {e}", path.display())))?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    Ok(file
        .tasks
        .into_iter()
        .map(|mut task| {
            task.calculated.resolve(base);
            task.reference.resolve(base);
            task
        })
        .collect())
}

/// Result of one task. Errors never leave a worker; they become `Failed`.
#[derive(Debug, Clone)]
pub enum TaskOutcome {
    Completed {
        key: TaskKey,
        run_id: RunId,
        report: ComplianceReport,
    },
    MissingCurves {
        key: TaskKey,
        status: CurvesStatus,
    },
    Failed {
        key: TaskKey,
        message: String,
    },
}

impl TaskOutcome {
    pub fn key(&self) -> &TaskKey {
        match self {
            Self::Completed { key, .. }
            | Self::MissingCurves { key, .. }
            | Self::Failed { key, .. } => key,
        }
    }
}

/// Outcomes in task order plus counts.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub outcomes: Vec<TaskOutcome>,
    pub compliant: usize,
    pub non_compliant: usize,
    pub missing: usize,
    pub failed: usize,
}

impl BatchReport {
    fn from_outcomes(outcomes: Vec<TaskOutcome>) -> Self {
        let mut report = Self::default();
        for outcome in &outcomes {
            match outcome {
                TaskOutcome::Completed { report: r, .. } if r.compliance => report.compliant += 1,
                TaskOutcome::Completed { .. } => report.non_compliant += 1,
                TaskOutcome::MissingCurves { .. } => report.missing += 1,
                TaskOutcome::Failed { .. } => report.failed += 1,
            }
        }
        report.outcomes = outcomes;
        report
    }
}

/// Runs tasks on a fixed-size pool; every worker borrows the same `Config`.
pub struct BatchRunner<'a> {
    config: &'a Config,
    store: Option<&'a ResultStore>,
    engine_version: String,
}

impl<'a> BatchRunner<'a> {
    pub fn new(config: &'a Config, engine_version: &str) -> Self {
        Self {
            config,
            store: None,
            engine_version: engine_version.to_string(),
        }
    }

    /// Persist every outcome into `store`.
    pub fn with_store(mut self, store: &'a ResultStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn run(&self, tasks: &[BatchTask]) -> AppResult<BatchReport> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.batch.workers.unwrap_or(0))
            .build()
            .map_err(|e| AppError::Batch(e.to_string()))?;
        info!(
            tasks = tasks.len(),
            workers = pool.current_num_threads(),
            "starting batch"
        );

        let outcomes: Vec<TaskOutcome> =
            pool.install(|| tasks.par_iter().map(|task| self.run_task(task)).collect());

        let report = BatchReport::from_outcomes(outcomes);
        info!(
            compliant = report.compliant,
            non_compliant = report.non_compliant,
            missing = report.missing,
            failed = report.failed,
            "batch finished"
        );
        Ok(report)
    }

    /// Run one task on the current thread.
    pub fn run_task(&self, task: &BatchTask) -> TaskOutcome {
        let run_id = compute_run_id(&task.key, self.config, &self.engine_version);
        match self.execute(task, &run_id) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(task = %task.key, error = %e, "task failed");
                let message = e.to_string();
                self.persist_quietly(
                    &run_id,
                    &task.key,
                    RunStatus::Failed {
                        message: message.clone(),
                    },
                );
                TaskOutcome::Failed {
                    key: task.key.clone(),
                    message,
                }
            }
        }
    }

    fn execute(&self, task: &BatchTask, run_id: &str) -> AppResult<TaskOutcome> {
        let mut manager = CurvesManager::new(
            self.config,
            task.context,
            task.fault,
            task.required_channels.clone(),
        );
        let status =
            manager.obtain_curves(&task.calculated.provider(), &task.reference.provider())?;
        if !status.is_complete() {
            warn!(task = %task.key, code = status.code(), "curves missing");
            let missing = RunStatus::MissingCurves {
                code: status.code(),
            };
            self.persist_quietly(run_id, &task.key, missing);
            return Ok(TaskOutcome::MissingCurves {
                key: task.key.clone(),
                status,
            });
        }

        manager.condition()?;
        let report = manager.evaluate()?;

        if let Some(store) = self.store {
            let mut manifest = RunManifest::new(
                run_id.to_string(),
                task.key.clone(),
                RunStatus::Completed {
                    compliance: report.compliance,
                },
                &self.engine_version,
            );
            if self.config.diagnostics.dump_curves {
                for side in [CurveSide::Calculated, CurveSide::Reference] {
                    let file = store.dump_curve(run_id, side.as_str(), manager.curves(side)?)?;
                    manifest.dumps.push(file);
                }
            }
            store.save_run(&manifest, &report.keyed())?;
        }

        Ok(TaskOutcome::Completed {
            key: task.key.clone(),
            run_id: run_id.to_string(),
            report,
        })
    }

    fn persist_quietly(&self, run_id: &str, key: &TaskKey, status: RunStatus) {
        let Some(store) = self.store else {
            return;
        };
        let manifest =
            RunManifest::new(run_id.to_string(), key.clone(), status, &self.engine_version);
        if let Err(e) = store.save_run(&manifest, &KeyedResults::new()) {
            warn!(task = %key, error = %e, "could not persist run");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gc_compliance::{SimulationType, Zone};

    #[test]
    fn counts_outcomes() {
        let key = TaskKey::new("P", "SM2", "Fault", "OC1");
        let report = BatchReport::from_outcomes(vec![
            TaskOutcome::MissingCurves {
                key: key.clone(),
                status: CurvesStatus::ReferenceMissing,
            },
            TaskOutcome::Failed {
                key: key.clone(),
                message: "boom".into(),
            },
            TaskOutcome::Failed {
                key,
                message: "boom".into(),
            },
        ]);
        assert_eq!((report.missing, report.failed, report.compliant), (1, 2, 0));
        assert_eq!(report.outcomes.len(), 3);
    }

    #[test]
    fn unreadable_inputs_are_missing_curves() {
        let config = Config::default();
        let task = BatchTask {
            key: TaskKey::new("P", "SM2", "Fault", "OC1"),
            context: TestContext::new(
                SimulationType::Fault,
                Zone::Unit,
                gc_compliance::ReferenceKind::Simulation,
            ),
            fault: FaultType::Bolted,
            required_channels: Vec::new(),
            calculated: CurveSource {
                curve: "/nonexistent/calc.csv".into(),
                metadata: "/nonexistent/calc.yaml".into(),
            },
            reference: CurveSource {
                curve: "/nonexistent/ref.csv".into(),
                metadata: "/nonexistent/ref.yaml".into(),
            },
        };
        let outcome = BatchRunner::new(&config, "test").run_task(&task);
        assert!(matches!(
            outcome,
            TaskOutcome::MissingCurves {
                status: CurvesStatus::BothMissing,
                ..
            }
        ));
    }

    #[test]
    fn parses_task_list_and_resolves_paths() {
        let dir = std::env::temp_dir().join(format!("gc_app_batch_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("batch.yaml");
        std::fs::write(
            &path,
            r#"
tasks:
  - key:
      producer: Producer
      test_sheet: SM2
      benchmark: Fault_Bolted
      operating_condition: OC1
    context:
      simulation:
        type: fault
      zone: plant
    required_channels: [BusPDR_BUS_ActivePower]
    calculated:
      curve: calc/curve.csv
      metadata: calc/curve.yaml
    reference:
      curve: /data/ref.csv
      metadata: /data/ref.yaml
"#,
        )
        .unwrap();

        let tasks = load_batch(&path).unwrap();
        assert_eq!(tasks.len(), 1);
        let task = &tasks[0];
        assert_eq!(task.fault, FaultType::Bolted);
        assert_eq!(task.context.zone, Zone::Plant);
        assert_eq!(task.calculated.curve, dir.join("calc/curve.csv"));
        assert_eq!(task.reference.curve, PathBuf::from("/data/ref.csv"));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
