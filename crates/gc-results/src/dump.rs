//! Diagnostic curve dumps as delimited text.

use std::fmt::Write as _;
use std::path::Path;

use gc_core::{Curve, TIME_COLUMN};

use crate::ResultsResult;

/// Render `curve` with a header row, time first, one sample per line.
pub fn format_curve(curve: &Curve, separator: char) -> String {
    let mut out = String::from(TIME_COLUMN);
    for name in curve.channel_names() {
        out.push(separator);
        out.push_str(name);
    }
    out.push('\n');

    for (i, t) in curve.time().iter().enumerate() {
        let _ = write!(out, "{t}");
        for channel in curve.channels() {
            let _ = write!(out, "{separator}{}", channel.values[i]);
        }
        out.push('\n');
    }
    out
}

pub fn write_curve(path: &Path, curve: &Curve, separator: char) -> ResultsResult<()> {
    std::fs::write(path, format_curve(curve, separator))?;
    Ok(())
}
