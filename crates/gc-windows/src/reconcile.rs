//! Aligning the window ends of a calculated/reference pair.

use gc_core::{Window, WindowScope, WindowSet};
use tracing::debug;

use crate::calculator::CurveWindows;

/// Clamp every window of both curve sets to the earlier of the two "after" ends.
///
/// `grid_end` is the last time of the common grid, when known, and bounds the
/// result too. Bounds are clamped with `min`, so ordered sets stay ordered.
/// Returns the end that was applied.
pub fn reconcile_after(
    calculated: &mut CurveWindows,
    reference: &mut CurveWindows,
    grid_end: Option<f64>,
) -> f64 {
    let mut end = [&*calculated, &*reference]
        .iter()
        .flat_map(|w| [w.filtering.after.to, w.validation.after.to])
        .fold(f64::INFINITY, f64::min);
    if let Some(grid_end) = grid_end {
        end = end.min(grid_end);
    }

    for windows in [calculated, reference] {
        for scope in [WindowScope::Filtering, WindowScope::Validation] {
            clamp_set(windows.get_mut(scope), end);
        }
    }
    debug!(end, "reconciled after-window end");
    end
}

fn clamp_set(set: &mut WindowSet, end: f64) {
    for w in [&mut set.before, &mut set.during, &mut set.after] {
        *w = Window::new(w.from.min(end), w.to.min(end));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculator::{EventTiming, FaultType, WindowCalculator, WindowSettings};

    fn windows_for(t_last: f64) -> CurveWindows {
        let settings = WindowSettings::default();
        WindowCalculator::new(&settings)
            .compute(
                &[0.0, t_last],
                EventTiming::new(0.5, 0.1),
                FaultType::HighImpedance,
                false,
            )
            .unwrap()
    }

    #[test]
    fn clamps_to_earlier_after_end() {
        let mut calc = windows_for(2.0);
        let mut reference = windows_for(1.5);
        let end = reconcile_after(&mut calc, &mut reference, None);
        assert_eq!(end, 1.5);
        for w in [&calc, &reference] {
            assert_eq!(w.filtering.after.to, 1.5);
            assert_eq!(w.validation.after.to, 1.5);
            assert!(w.filtering.is_ordered() && w.validation.is_ordered());
        }
    }

    #[test]
    fn grid_end_bounds_result() {
        let mut calc = windows_for(2.0);
        let mut reference = windows_for(2.0);
        let end = reconcile_after(&mut calc, &mut reference, Some(1.2));
        assert_eq!(end, 1.2);
        assert_eq!(calc.validation.after.to, 1.2);
    }

    #[test]
    fn short_record_collapses_after_window() {
        let mut calc = windows_for(2.0);
        let mut reference = windows_for(2.0);
        reconcile_after(&mut calc, &mut reference, Some(0.55));
        assert_eq!(calc.validation.after, Window::point(0.55));
        assert!(calc.validation.is_ordered());
    }
}
