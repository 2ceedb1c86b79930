//! Sources of curve sets.

use std::path::PathBuf;

use gc_core::Curve;
use tracing::debug;

use crate::error::AppResult;
use crate::metadata::{CurveMetadata, load_metadata};
use crate::reader::{CurveReader, DelimitedReader};

/// A curve together with its metadata, channels named as the tool names them.
#[derive(Debug, Clone, PartialEq)]
pub struct CurveSet {
    pub curve: Curve,
    pub metadata: CurveMetadata,
}

impl CurveSet {
    pub fn new(curve: Curve, metadata: CurveMetadata) -> Self {
        Self { curve, metadata }
    }
}

/// Something that can produce one curve set.
pub trait CurveProvider {
    fn obtain(&self) -> AppResult<CurveSet>;
}

/// Curve file plus YAML metadata file on disk.
#[derive(Debug, Clone)]
pub struct FileCurveProvider<R = DelimitedReader> {
    pub curve_path: PathBuf,
    pub metadata_path: PathBuf,
    reader: R,
}

impl FileCurveProvider {
    pub fn new(curve_path: impl Into<PathBuf>, metadata_path: impl Into<PathBuf>) -> Self {
        Self::with_reader(curve_path, metadata_path, DelimitedReader)
    }
}

impl<R: CurveReader> FileCurveProvider<R> {
    pub fn with_reader(
        curve_path: impl Into<PathBuf>,
        metadata_path: impl Into<PathBuf>,
        reader: R,
    ) -> Self {
        Self {
            curve_path: curve_path.into(),
            metadata_path: metadata_path.into(),
            reader,
        }
    }
}

impl<R: CurveReader> CurveProvider for FileCurveProvider<R> {
    fn obtain(&self) -> AppResult<CurveSet> {
        let metadata = load_metadata(&self.metadata_path)?;
        let mut curve = self.reader.read(&self.curve_path)?;
        curve.rename_channels(|column| metadata.tool_name(column).map(str::to_string))?;
        debug!(
            path = %self.curve_path.display(),
            samples = curve.len(),
            channels = curve.channels().len(),
            "read curve set"
        );
        Ok(CurveSet::new(curve, metadata))
    }
}

/// Curve set held in memory.
#[derive(Debug, Clone)]
pub struct StaticCurveProvider {
    set: CurveSet,
}

impl StaticCurveProvider {
    pub fn new(curve: Curve, metadata: CurveMetadata) -> Self {
        Self {
            set: CurveSet::new(curve, metadata),
        }
    }
}

impl CurveProvider for StaticCurveProvider {
    fn obtain(&self) -> AppResult<CurveSet> {
        Ok(self.set.clone())
    }
}
