//! Fixed-schema curve table: one time axis plus named per-unit channels.

use crate::error::{CoreError, CoreResult};
use crate::numeric::Real;

/// Name of the time column in curve files.
pub const TIME_COLUMN: &str = "time";

/// One named sequence of samples aligned with the owning curve's time axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    pub name: String,
    pub values: Vec<Real>,
}

/// Time-indexed table of channels.
///
/// Construction checks that every channel matches the time axis length and
/// that time never decreases. Raw curves may repeat a time stamp (event
/// instants are often written twice); conditioned curves are strictly
/// increasing and evenly spaced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Curve {
    time: Vec<Real>,
    channels: Vec<Channel>,
}

impl Curve {
    /// Curve with no samples and no channels.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Curve with a time axis and no channels yet.
    pub fn with_time(time: Vec<Real>) -> CoreResult<Self> {
        check_time_axis(&time)?;
        Ok(Self {
            time,
            channels: Vec::new(),
        })
    }

    /// Build a curve from a time axis and `(name, values)` columns.
    pub fn from_columns<I, S>(time: Vec<Real>, columns: I) -> CoreResult<Self>
    where
        I: IntoIterator<Item = (S, Vec<Real>)>,
        S: Into<String>,
    {
        let mut curve = Self::with_time(time)?;
        for (name, values) in columns {
            curve.insert_channel(name, values)?;
        }
        Ok(curve)
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn time(&self) -> &[Real] {
        &self.time
    }

    pub fn first_time(&self) -> Option<Real> {
        self.time.first().copied()
    }

    pub fn last_time(&self) -> Option<Real> {
        self.time.last().copied()
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn channel_names(&self) -> impl Iterator<Item = &str> {
        self.channels.iter().map(|c| c.name.as_str())
    }

    pub fn has_channel(&self, name: &str) -> bool {
        self.channels.iter().any(|c| c.name == name)
    }

    pub fn channel(&self, name: &str) -> Option<&[Real]> {
        self.channels
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    /// Look up a channel, failing with [`CoreError::UnknownChannel`].
    pub fn require_channel(&self, name: &str) -> CoreResult<&[Real]> {
        self.channel(name).ok_or_else(|| CoreError::UnknownChannel {
            channel: name.to_string(),
        })
    }

    /// Append a channel. Names are unique and lengths must match the time axis.
    pub fn insert_channel(&mut self, name: impl Into<String>, values: Vec<Real>) -> CoreResult<()> {
        let name = name.into();
        if self.has_channel(&name) {
            return Err(CoreError::DuplicateChannel { channel: name });
        }
        if values.len() != self.time.len() {
            return Err(CoreError::LengthMismatch {
                channel: name,
                expected: self.time.len(),
                found: values.len(),
            });
        }
        self.channels.push(Channel { name, values });
        Ok(())
    }

    /// Remove a channel, returning its samples.
    pub fn remove_channel(&mut self, name: &str) -> Option<Vec<Real>> {
        let index = self.channels.iter().position(|c| c.name == name)?;
        Some(self.channels.remove(index).values)
    }

    /// Keep only the channels for which `keep` returns true (order preserved).
    pub fn retain_channels(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.channels.retain(|c| keep(&c.name));
    }

    /// Rename channels through `rename`; channels mapped to `None` keep their name.
    pub fn rename_channels<F>(&mut self, mut rename: F) -> CoreResult<()>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut renamed: Vec<Channel> = Vec::with_capacity(self.channels.len());
        for channel in self.channels.drain(..) {
            let name = rename(&channel.name).unwrap_or(channel.name);
            if renamed.iter().any(|c| c.name == name) {
                return Err(CoreError::DuplicateChannel { channel: name });
            }
            renamed.push(Channel {
                name,
                values: channel.values,
            });
        }
        self.channels = renamed;
        Ok(())
    }

    /// Shift the whole time axis by `offset` seconds.
    pub fn shift_time(&mut self, offset: Real) {
        for t in &mut self.time {
            *t += offset;
        }
    }

    /// Index range of samples with `from <= t <= to`.
    pub fn index_range(&self, from: Real, to: Real) -> std::ops::Range<usize> {
        let start = self.time.partition_point(|&t| t < from);
        let end = self.time.partition_point(|&t| t <= to);
        start..end.max(start)
    }

    /// Copy of the samples with `from <= t <= to`, all channels included.
    pub fn slice_time(&self, from: Real, to: Real) -> Curve {
        let range = self.index_range(from, to);
        Curve {
            time: self.time[range.clone()].to_vec(),
            channels: self
                .channels
                .iter()
                .map(|c| Channel {
                    name: c.name.clone(),
                    values: c.values[range.clone()].to_vec(),
                })
                .collect(),
        }
    }

    /// Step of an evenly spaced axis, `None` when spacing varies beyond `rel_tol`.
    pub fn uniform_step(&self, rel_tol: Real) -> Option<Real> {
        if self.time.len() < 2 {
            return None;
        }
        let step = (self.time[self.time.len() - 1] - self.time[0]) / (self.time.len() - 1) as Real;
        if step <= 0.0 {
            return None;
        }
        let uniform = self
            .time
            .windows(2)
            .all(|w| ((w[1] - w[0]) - step).abs() <= rel_tol * step);
        uniform.then_some(step)
    }

    /// Decompose into the time axis and channels.
    pub fn into_parts(self) -> (Vec<Real>, Vec<Channel>) {
        (self.time, self.channels)
    }
}

fn check_time_axis(time: &[Real]) -> CoreResult<()> {
    for (index, t) in time.iter().enumerate() {
        if !t.is_finite() {
            return Err(CoreError::NonFinite {
                what: "time sample",
                value: *t,
            });
        }
        if index > 0 && *t < time[index - 1] {
            return Err(CoreError::NonMonotonicTime {
                index,
                previous: time[index - 1],
                current: *t,
            });
        }
    }
    Ok(())
}
