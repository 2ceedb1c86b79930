//! Per-operating-condition orchestration.
//!
//! [`CurvesManager`] owns the curves of one operating condition and walks them
//! through `New -> CurvesObtained -> Conditioned`. Conditioning keeps a
//! pre-filter snapshot (fixed-step curves and their windows) so it can be
//! re-run with other filter settings without re-reading or re-resampling.

use gc_compliance::{ComplianceReport, ErrorEngine, ReferenceKind, TestContext, ValidationWindows};
use gc_config::Config;
use gc_core::timing::{Stage, StageTimings, Timer};
use gc_core::{Curve, WindowName, WindowScope, WindowSet};
use gc_signal::{ConditionerSettings, FilterSettings, FixedStep, SignalConditioner};
use gc_windows::{CurveWindows, EventTiming, FaultType, WindowCalculator, reconcile_after};
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult};
use crate::metadata::{CurveMetadata, Generator};
use crate::provider::{CurveProvider, CurveSet};

/// Which of the two curve sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CurveSide {
    Calculated,
    Reference,
}

impl CurveSide {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Calculated => "calculated",
            Self::Reference => "reference",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerState {
    New,
    CurvesObtained,
    Conditioned,
}

impl ManagerState {
    fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::CurvesObtained => "curves obtained",
            Self::Conditioned => "conditioned",
        }
    }
}

/// Outcome of obtaining both curve sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurvesStatus {
    Complete,
    CalculatedMissing,
    ReferenceMissing,
    BothMissing,
}

impl CurvesStatus {
    fn from_missing(calculated: bool, reference: bool) -> Self {
        match (calculated, reference) {
            (false, false) => Self::Complete,
            (true, false) => Self::CalculatedMissing,
            (false, true) => Self::ReferenceMissing,
            (true, true) => Self::BothMissing,
        }
    }

    /// Numeric status: 0 complete, 1 calculated missing, 2 reference missing, 3 both.
    pub fn code(self) -> u8 {
        match self {
            Self::Complete => 0,
            Self::CalculatedMissing => 1,
            Self::ReferenceMissing => 2,
            Self::BothMissing => 3,
        }
    }

    pub fn is_complete(self) -> bool {
        self == Self::Complete
    }
}

/// Windows of one curve set: both scopes, plus the validation set used for
/// the quantity a setpoint test tracks.
#[derive(Debug, Clone, PartialEq)]
struct SideWindows {
    regular: CurveWindows,
    tracked: CurveWindows,
}

/// Fixed-step curves and windows before filtering.
#[derive(Debug, Clone)]
struct Snapshot {
    calculated: FixedStep,
    reference: FixedStep,
    windows: [SideWindows; 2],
}

#[derive(Debug, Clone)]
struct Conditioned {
    curves: [Curve; 2],
    windows: [SideWindows; 2],
}

fn index(side: CurveSide) -> usize {
    match side {
        CurveSide::Calculated => 0,
        CurveSide::Reference => 1,
    }
}

/// Orchestrates obtaining, conditioning and evaluating one operating condition.
pub struct CurvesManager<'a> {
    config: &'a Config,
    signal: ConditionerSettings,
    context: TestContext,
    fault: FaultType,
    required_channels: Vec<String>,
    state: ManagerState,
    sets: Option<[CurveSet; 2]>,
    snapshot: Option<Snapshot>,
    conditioned: Option<Conditioned>,
    timings: StageTimings,
}

impl<'a> CurvesManager<'a> {
    pub fn new(
        config: &'a Config,
        context: TestContext,
        fault: FaultType,
        required_channels: Vec<String>,
    ) -> Self {
        Self {
            config,
            signal: config.signal.clone(),
            context,
            fault,
            required_channels,
            state: ManagerState::New,
            sets: None,
            snapshot: None,
            conditioned: None,
            timings: StageTimings::default(),
        }
    }

    pub fn state(&self) -> ManagerState {
        self.state
    }

    pub fn context(&self) -> &TestContext {
        &self.context
    }

    pub fn timings(&self) -> &StageTimings {
        &self.timings
    }

    fn require(&self, expected: ManagerState) -> AppResult<()> {
        let reached = match expected {
            ManagerState::New => true,
            ManagerState::CurvesObtained => self.state != ManagerState::New,
            ManagerState::Conditioned => self.state == ManagerState::Conditioned,
        };
        if reached {
            Ok(())
        } else {
            Err(AppError::InvalidState {
                expected: expected.as_str(),
                found: self.state.as_str(),
            })
        }
    }

    /// A required channel is present under its own name or as a full
    /// three-phase group.
    fn has_required(&self, curve: &Curve, channel: &str) -> bool {
        curve.has_channel(channel)
            || self
                .signal
                .three_phase_suffixes
                .iter()
                .all(|suffix| curve.has_channel(&format!("{channel}{suffix}")))
    }

    fn obtain_side(&self, provider: &dyn CurveProvider, side: CurveSide) -> Option<CurveSet> {
        let set = match provider.obtain() {
            Ok(set) => set,
            Err(e) => {
                warn!(side = side.as_str(), error = %e, "curve set unavailable");
                return None;
            }
        };
        if set.curve.is_empty() {
            warn!(side = side.as_str(), "curve set has no samples");
            return None;
        }
        let missing: Vec<&str> = self
            .required_channels
            .iter()
            .map(String::as_str)
            .filter(|c| !self.has_required(&set.curve, c))
            .collect();
        if missing.is_empty() {
            Some(set)
        } else {
            warn!(side = side.as_str(), ?missing, "required channels missing");
            None
        }
    }

    /// Invoke both providers once.
    ///
    /// Unreadable sets, sets without samples and sets lacking a required channel
    /// are reported through the returned status. The manager only advances
    /// when both are complete.
    pub fn obtain_curves(
        &mut self,
        producer: &dyn CurveProvider,
        reference: &dyn CurveProvider,
    ) -> AppResult<CurvesStatus> {
        if self.state != ManagerState::New {
            return Err(AppError::InvalidState {
                expected: ManagerState::New.as_str(),
                found: self.state.as_str(),
            });
        }
        let calculated = self.obtain_side(producer, CurveSide::Calculated);
        let reference = self.obtain_side(reference, CurveSide::Reference);
        let status = CurvesStatus::from_missing(calculated.is_none(), reference.is_none());
        if let (Some(c), Some(r)) = (calculated, reference) {
            self.sets = Some([c, r]);
            self.state = ManagerState::CurvesObtained;
        }
        debug!(code = status.code(), "obtained curves");
        Ok(status)
    }

    fn sets(&self) -> AppResult<&[CurveSet; 2]> {
        self.sets.as_ref().ok_or(AppError::InvalidState {
            expected: ManagerState::CurvesObtained.as_str(),
            found: self.state.as_str(),
        })
    }

    fn conditioned(&self) -> AppResult<&Conditioned> {
        self.conditioned.as_ref().ok_or(AppError::InvalidState {
            expected: ManagerState::Conditioned.as_str(),
            found: self.state.as_str(),
        })
    }

    /// Condition both curve sets; a repeated call starts again from the
    /// pre-filter snapshot.
    pub fn condition(&mut self) -> AppResult<()> {
        self.require(ManagerState::CurvesObtained)?;
        if self.snapshot.is_none() {
            self.snapshot = Some(self.build_snapshot()?);
        }
        self.finish_conditioning()
    }

    /// Re-run filtering and common-grid resampling with other filter settings.
    pub fn condition_with_filter(&mut self, filter: FilterSettings) -> AppResult<()> {
        self.signal.filter = filter;
        self.condition()
    }

    fn build_snapshot(&mut self) -> AppResult<Snapshot> {
        let [calc_set, ref_set] = self.sets()?;
        let event = calc_set.metadata.event.timing();
        let ref_event = ref_set.metadata.event.timing();

        let mut reference = ref_set.curve.clone();
        let offset = event.start_s - ref_event.start_s;
        if offset != 0.0 {
            debug!(offset, "shifting reference time to align events");
            reference.shift_time(offset);
        }

        let hints = [
            calc_set.metadata.sampling_frequency_hz,
            ref_set.metadata.sampling_frequency_hz,
        ];
        let calculated = calc_set.curve.clone();

        let conditioner = SignalConditioner::new(&self.signal);
        let mut fixed = Vec::with_capacity(2);
        for (curve, hint) in [calculated, reference].iter().zip(hints) {
            let timer = Timer::start();
            let rms = conditioner.extract_rms(curve)?;
            self.timings.record(Stage::RmsExtraction, timer);

            let timer = Timer::start();
            let step = conditioner.to_fixed_step(&rms, hint)?;
            self.timings.record(Stage::FixedStep, timer);
            fixed.push(step);
        }
        let (Some(reference), Some(calculated)) = (fixed.pop(), fixed.pop()) else {
            return Err(AppError::Conditioning("fixed-step resampling produced no curves".into()));
        };

        let timer = Timer::start();
        let windows = self.side_windows(&calculated.curve, &reference.curve, event)?;
        self.timings.record(Stage::Windows, timer);

        Ok(Snapshot {
            calculated,
            reference,
            windows,
        })
    }

    /// Windows for both sides, all taken from the calculated event.
    fn side_windows(
        &self,
        calculated: &Curve,
        reference: &Curve,
        event: EventTiming,
    ) -> AppResult<[SideWindows; 2]> {
        let calculator = WindowCalculator::new(&self.config.windows);
        let compute = |curve: &Curve| -> AppResult<SideWindows> {
            Ok(SideWindows {
                regular: calculator.compute(curve.time(), event, self.fault, false)?,
                tracked: calculator.compute(curve.time(), event, self.fault, true)?,
            })
        };
        Ok([compute(calculated)?, compute(reference)?])
    }

    fn finish_conditioning(&mut self) -> AppResult<()> {
        let Some(snapshot) = self.snapshot.as_ref() else {
            return Err(AppError::InvalidState {
                expected: ManagerState::CurvesObtained.as_str(),
                found: self.state.as_str(),
            });
        };
        let conditioner = SignalConditioner::new(&self.signal);
        let [mut calc_windows, mut ref_windows] = snapshot.windows.clone();

        let timer = Timer::start();
        let calculated = conditioner.filter(&snapshot.calculated, &calc_windows.regular.filtering)?;
        let reference = conditioner.filter(&snapshot.reference, &ref_windows.regular.filtering)?;
        self.timings.record(Stage::Filtering, timer);

        let timer = Timer::start();
        let grid = conditioner.common_grid(
            &calculated,
            snapshot.calculated.step,
            &reference,
            snapshot.reference.step,
        )?;
        self.timings.record(Stage::CommonGrid, timer);

        let grid_end = if grid.calculated.is_empty() || grid.reference.is_empty() {
            None
        } else {
            grid.calculated.last_time()
        };
        let end = reconcile_after(&mut calc_windows.regular, &mut ref_windows.regular, grid_end);
        reconcile_after(&mut calc_windows.tracked, &mut ref_windows.tracked, Some(end));

        info!(
            samples = grid.calculated.len(),
            step = ?grid.step,
            after_end = end,
            "conditioned curve pair"
        );
        debug!(timings = %self.timings, "stage timings");

        self.conditioned = Some(Conditioned {
            curves: [grid.calculated, grid.reference],
            windows: [calc_windows, ref_windows],
        });
        self.state = ManagerState::Conditioned;
        Ok(())
    }

    /// Channels present in both conditioned curves, in calculated order.
    pub fn shared_channels(&self) -> AppResult<Vec<String>> {
        let [calculated, reference] = &self.conditioned()?.curves;
        Ok(calculated
            .channel_names()
            .filter(|name| reference.has_channel(name))
            .map(str::to_string)
            .collect())
    }

    /// Context with the reference kind declared by the reference metadata.
    pub fn effective_context(&self) -> AppResult<TestContext> {
        let [_, ref_set] = self.sets()?;
        let mut ctx = self.context;
        if ref_set.metadata.is_field_measurement {
            ctx.reference = ReferenceKind::FieldMeasurement;
        }
        Ok(ctx)
    }

    /// Compute errors and checks over the validation windows of the calculated set.
    pub fn evaluate(&mut self) -> AppResult<ComplianceReport> {
        let ctx = self.effective_context()?;
        let channels = self.shared_channels()?;
        let conditioned = self.conditioned()?;
        let [calculated, reference] = &conditioned.curves;
        let calc_windows = &conditioned.windows[0];
        let windows = ValidationWindows {
            regular: calc_windows.regular.validation,
            tracked: calc_windows.tracked.validation,
        };

        let timer = Timer::start();
        let report = ErrorEngine::new(&self.config.thresholds).evaluate(
            &ctx,
            calculated,
            reference,
            &windows,
            &channels,
        )?;
        self.timings.record(Stage::Metrics, timer);
        info!(
            channels = channels.len(),
            compliance = report.compliance,
            "evaluated operating condition"
        );
        Ok(report)
    }

    /// Conditioned curve of one side.
    pub fn curves(&self, side: CurveSide) -> AppResult<&Curve> {
        Ok(&self.conditioned()?.curves[index(side)])
    }

    /// Regular windows of one side in one scope.
    pub fn windows(&self, side: CurveSide, scope: WindowScope) -> AppResult<&WindowSet> {
        Ok(self.conditioned()?.windows[index(side)].regular.get(scope))
    }

    /// Validation windows of one side, regular and tracked.
    pub fn validation_windows(&self, side: CurveSide) -> AppResult<ValidationWindows> {
        let w = &self.conditioned()?.windows[index(side)];
        Ok(ValidationWindows {
            regular: w.regular.validation,
            tracked: w.tracked.validation,
        })
    }

    /// Conditioned samples of one side inside a named window.
    pub fn window_curve(
        &self,
        side: CurveSide,
        scope: WindowScope,
        name: WindowName,
    ) -> AppResult<Curve> {
        let window = self.windows(side, scope)?.get(name);
        Ok(self.curves(side)?.slice_time(window.from, window.to))
    }

    /// Start times of the excluded stretches after inception and after clearance.
    pub fn exclusion_times(&self, side: CurveSide) -> AppResult<(f64, f64)> {
        let set = self.windows(side, WindowScope::Validation)?;
        Ok((set.during.from, set.after.from))
    }

    pub fn metadata(&self, side: CurveSide) -> AppResult<&CurveMetadata> {
        Ok(&self.sets()?[index(side)].metadata)
    }

    pub fn generators(&self, side: CurveSide) -> AppResult<&[Generator]> {
        Ok(&self.metadata(side)?.generators)
    }
}
