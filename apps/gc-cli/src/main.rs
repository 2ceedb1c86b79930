use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use gc_app::{AppResult, BatchRunner, TaskOutcome, load_batch};
use gc_config::{Config, load_layered};
use gc_results::{ResultStore, RunStatus};
use tracing_subscriber::EnvFilter;

const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "gc-cli")]
#[command(
    about = "GridCheck CLI - grid-compliance validation of simulated and measured curves",
    long_about = None
)]
struct Cli {
    /// Test-sheet configuration layer (YAML or JSON)
    #[arg(long, global = true)]
    test_sheet: Option<PathBuf>,
    /// User configuration layer, applied over the test sheet
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve and validate the layered configuration
    ValidateConfig {
        /// Print the resolved configuration as YAML
        #[arg(long)]
        print: bool,
    },
    /// Evaluate every operating condition of a batch file
    Run {
        /// Path to the batch YAML file
        batch_path: PathBuf,
        /// Directory for stored results
        #[arg(short, long, default_value = "results")]
        results: PathBuf,
        /// Worker threads (overrides batch.workers)
        #[arg(long)]
        workers: Option<usize>,
    },
    /// List stored runs
    Runs {
        /// Directory for stored results
        #[arg(short, long, default_value = "results")]
        results: PathBuf,
        /// Only runs of this test sheet
        #[arg(long)]
        sheet: Option<String>,
    },
    /// Show the keyed results of a stored run
    ShowRun {
        /// Run ID to display
        run_id: String,
        /// Directory for stored results
        #[arg(short, long, default_value = "results")]
        results: PathBuf,
        /// Print everything as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> AppResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = load_layered(cli.test_sheet.as_deref(), cli.config.as_deref())?;
    if config.diagnostics.timing {
        gc_core::timing::enable_timing();
    }

    match cli.command {
        Commands::ValidateConfig { print } => cmd_validate_config(&config, print),
        Commands::Run {
            batch_path,
            results,
            workers,
        } => cmd_run(config, &batch_path, &results, workers),
        Commands::Runs { results, sheet } => cmd_runs(&results, sheet.as_deref()),
        Commands::ShowRun {
            run_id,
            results,
            json,
        } => cmd_show_run(&results, &run_id, json),
    }
}

fn cmd_validate_config(config: &Config, print: bool) -> AppResult<()> {
    println!("✓ Configuration is valid (version {})", config.version);
    if print {
        let yaml = serde_yaml::to_string(config)
            .map_err(|e| gc_app::AppError::Config(e.to_string()))?;
        print!("{yaml}");
    }
    Ok(())
}

fn cmd_run(
    mut config: Config,
    batch_path: &Path,
    results: &Path,
    workers: Option<usize>,
) -> AppResult<()> {
    if workers.is_some() {
        config.batch.workers = workers;
        gc_config::validate_config(&config)
            .map_err(|e| gc_app::AppError::Config(e.to_string()))?;
    }
    let tasks = load_batch(batch_path)?;
    println!("Running {} operating conditions from {}", tasks.len(), batch_path.display());

    let store = ResultStore::new(results.to_path_buf())?;
    let report = BatchRunner::new(&config, ENGINE_VERSION)
        .with_store(&store)
        .run(&tasks)?;

    for outcome in &report.outcomes {
        match outcome {
            TaskOutcome::Completed {
                key,
                run_id,
                report,
            } => {
                let mark = if report.compliance { "✓" } else { "✗" };
                println!("  {mark} {key} ({run_id})");
            }
            TaskOutcome::MissingCurves { key, status } => {
                println!("  - {key}: curves missing (status {})", status.code());
            }
            TaskOutcome::Failed { key, message } => {
                println!("  ! {key}: {message}");
            }
        }
    }
    println!(
        "\nCompliant: {}, non-compliant: {}, missing curves: {}, failed: {}",
        report.compliant, report.non_compliant, report.missing, report.failed
    );
    Ok(())
}

fn cmd_runs(results: &Path, sheet: Option<&str>) -> AppResult<()> {
    let store = ResultStore::new(results.to_path_buf())?;
    let runs = match sheet {
        Some(sheet) => store.list_for_test_sheet(sheet)?,
        None => store.list_runs()?,
    };

    if runs.is_empty() {
        println!("No stored runs in {}", results.display());
    } else {
        println!("Stored runs:");
        for manifest in runs {
            println!(
                "  {} {} {} ({})",
                manifest.run_id,
                manifest.task,
                status_label(&manifest.status),
                manifest.timestamp
            );
        }
    }
    Ok(())
}

fn status_label(status: &RunStatus) -> String {
    match status {
        RunStatus::Completed { compliance: true } => "compliant".to_string(),
        RunStatus::Completed { compliance: false } => "non-compliant".to_string(),
        RunStatus::MissingCurves { code } => format!("missing curves ({code})"),
        RunStatus::Failed { message } => format!("failed: {message}"),
    }
}

fn cmd_show_run(results: &Path, run_id: &str, json: bool) -> AppResult<()> {
    let store = ResultStore::new(results.to_path_buf())?;
    let record = store.load_run(run_id)?;

    if json {
        let text = serde_json::to_string_pretty(&record)
            .map_err(|e| gc_app::AppError::Results(e.to_string()))?;
        println!("{text}");
        return Ok(());
    }

    println!("Run {}", record.manifest.run_id);
    println!("  Task: {}", record.manifest.task);
    println!("  Status: {}", status_label(&record.manifest.status));
    println!("  Engine: {}", record.manifest.engine_version);
    println!("  Timestamp: {}", record.manifest.timestamp);
    for dump in &record.manifest.dumps {
        println!("  Dump: {dump}");
    }

    if !record.results.is_empty() {
        println!("\nResults:");
        for (key, value) in &record.results {
            println!("  {key} = {}", serde_json::to_string(value).unwrap_or_default());
        }
    }
    Ok(())
}
