//! Application service layer for gridcheck.
//!
//! Ties the engine crates together for the CLI: curve providers and metadata,
//! the per-operating-condition [`CurvesManager`], and the batch runner that
//! fans operating conditions out to a worker pool.

pub mod batch;
pub mod error;
pub mod manager;
pub mod metadata;
pub mod provider;
pub mod reader;

// Re-export key types for convenience
pub use batch::{BatchReport, BatchRunner, BatchTask, CurveSource, TaskOutcome, load_batch};
pub use error::{AppError, AppResult};
pub use manager::{CurveSide, CurvesManager, CurvesStatus, ManagerState};
pub use metadata::{CurveMetadata, EventSection, Generator, load_metadata};
pub use provider::{CurveProvider, CurveSet, FileCurveProvider, StaticCurveProvider};
pub use reader::{CurveReader, DelimitedReader, parse_delimited};
