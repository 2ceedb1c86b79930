//! Time windows around a grid event.

use core::fmt;

use crate::numeric::Real;

/// Which part of the record a window covers relative to the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum WindowName {
    Before,
    During,
    After,
}

impl WindowName {
    pub const ALL: [WindowName; 3] = [WindowName::Before, WindowName::During, WindowName::After];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Before => "before",
            Self::During => "during",
            Self::After => "after",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "before" => Some(Self::Before),
            "during" => Some(Self::During),
            "after" => Some(Self::After),
            _ => None,
        }
    }
}

impl fmt::Display for WindowName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which boundary set a window belongs to.
///
/// Filtering windows bound the independent low-pass filter runs; validation
/// windows bound the error computation and carry the regulatory exclusion
/// margins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum WindowScope {
    Filtering,
    Validation,
}

/// Closed interval `[from, to]` in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Window {
    pub from: Real,
    pub to: Real,
}

impl Window {
    pub fn new(from: Real, to: Real) -> Self {
        Self { from, to }
    }

    /// Degenerate window at `at`.
    pub fn point(at: Real) -> Self {
        Self { from: at, to: at }
    }

    /// A window with no extent contributes no samples.
    pub fn is_empty(&self) -> bool {
        self.to <= self.from
    }

    pub fn duration(&self) -> Real {
        (self.to - self.from).max(0.0)
    }

    pub fn contains(&self, t: Real) -> bool {
        t >= self.from && t <= self.to
    }
}

/// The before/during/after triple of one boundary set.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WindowSet {
    pub before: Window,
    pub during: Window,
    pub after: Window,
}

impl WindowSet {
    pub fn get(&self, name: WindowName) -> Window {
        match name {
            WindowName::Before => self.before,
            WindowName::During => self.during,
            WindowName::After => self.after,
        }
    }

    /// `before.to <= during.from <= during.to <= after.from <= after.to`
    pub fn is_ordered(&self) -> bool {
        self.before.from <= self.before.to
            && self.before.to <= self.during.from
            && self.during.from <= self.during.to
            && self.during.to <= self.after.from
            && self.after.from <= self.after.to
    }

    /// Windows that carry samples for error computation.
    pub fn non_empty(&self) -> impl Iterator<Item = (WindowName, Window)> + '_ {
        WindowName::ALL
            .into_iter()
            .map(|name| (name, self.get(name)))
            .filter(|(name, w)| *name != WindowName::During || !w.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(during: Window) -> WindowSet {
        WindowSet {
            before: Window::new(0.0, 0.5),
            during,
            after: Window::new(0.6, 1.0),
        }
    }

    #[test]
    fn ordering_holds_for_regular_set() {
        assert!(set(Window::new(0.5, 0.6)).is_ordered());
    }

    #[test]
    fn ordering_fails_for_overlap() {
        assert!(!set(Window::new(0.4, 0.6)).is_ordered());
    }

    #[test]
    fn empty_during_is_skipped() {
        let windows = WindowSet {
            before: Window::new(0.0, 0.5),
            during: Window::point(0.5),
            after: Window::new(0.5, 1.0),
        };
        let names: Vec<_> = windows.non_empty().map(|(n, _)| n).collect();
        assert_eq!(names, vec![WindowName::Before, WindowName::After]);
    }

    #[test]
    fn window_name_round_trip() {
        for name in WindowName::ALL {
            assert_eq!(WindowName::parse(name.as_str()), Some(name));
        }
        assert!(WindowName::parse("pre").is_none());
    }
}
