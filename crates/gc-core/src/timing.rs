//! Lightweight stage timing for the conditioning pipeline.
//!
//! Timers are always cheap to create; whether they measure anything is decided
//! once at start from [`is_enabled`].

use core::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

static ENABLED: AtomicBool = AtomicBool::new(false);

/// Enable stage timing globally.
pub fn enable_timing() {
    ENABLED.store(true, Ordering::Relaxed);
}

/// Disable stage timing globally.
pub fn disable_timing() {
    ENABLED.store(false, Ordering::Relaxed);
}

/// Check if timing is enabled (programmatically or through `GC_TIMING`).
pub fn is_enabled() -> bool {
    ENABLED.load(Ordering::Relaxed) || std::env::var("GC_TIMING").is_ok()
}

/// A simple timer that measures elapsed wall time.
pub struct Timer {
    start: Instant,
    enabled: bool,
}

impl Timer {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
            enabled: is_enabled(),
        }
    }

    /// Elapsed seconds, or `None` if timing is disabled.
    pub fn stop(self) -> Option<f64> {
        self.enabled.then(|| self.start.elapsed().as_secs_f64())
    }
}

/// Pipeline stages that get timed separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    RmsExtraction,
    FixedStep,
    Windows,
    Filtering,
    CommonGrid,
    Metrics,
}

/// Wall time spent per stage for one operating condition.
#[derive(Debug, Clone, Default)]
pub struct StageTimings {
    pub rms_extraction_s: f64,
    pub fixed_step_s: f64,
    pub windows_s: f64,
    pub filtering_s: f64,
    pub common_grid_s: f64,
    pub metrics_s: f64,
}

impl StageTimings {
    /// Add a timer's measurement to `stage` (no-op when timing is disabled).
    pub fn record(&mut self, stage: Stage, timer: Timer) {
        let Some(elapsed) = timer.stop() else {
            return;
        };
        let slot = match stage {
            Stage::RmsExtraction => &mut self.rms_extraction_s,
            Stage::FixedStep => &mut self.fixed_step_s,
            Stage::Windows => &mut self.windows_s,
            Stage::Filtering => &mut self.filtering_s,
            Stage::CommonGrid => &mut self.common_grid_s,
            Stage::Metrics => &mut self.metrics_s,
        };
        *slot += elapsed;
    }

    pub fn total_s(&self) -> f64 {
        self.rms_extraction_s
            + self.fixed_step_s
            + self.windows_s
            + self.filtering_s
            + self.common_grid_s
            + self.metrics_s
    }
}

impl fmt::Display for StageTimings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rms {:.3}s, fixed-step {:.3}s, windows {:.3}s, filter {:.3}s, \
             common grid {:.3}s, metrics {:.3}s (total {:.3}s)",
            self.rms_extraction_s,
            self.fixed_step_s,
            self.windows_s,
            self.filtering_s,
            self.common_grid_s,
            self.metrics_s,
            self.total_s()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_accumulates_when_enabled() {
        enable_timing();
        let mut timings = StageTimings::default();
        timings.record(Stage::Filtering, Timer::start());
        timings.record(Stage::Filtering, Timer::start());
        assert!(timings.filtering_s >= 0.0);
        assert!(timings.total_s() >= timings.filtering_s);
        assert!(format!("{timings}").contains("filter"));
    }
}
