//! Curve file reading.

use std::path::Path;

use gc_core::{Curve, TIME_COLUMN};

use crate::error::{AppError, AppResult};

/// Turns a curve file into a [`Curve`].
pub trait CurveReader: Send + Sync {
    fn read(&self, path: &Path) -> AppResult<Curve>;
}

/// Delimited text with a header row and the time column first.
///
/// The separator is detected from the header: `;`, tab or `,`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DelimitedReader;

impl CurveReader for DelimitedReader {
    fn read(&self, path: &Path) -> AppResult<Curve> {
        let text = std::fs::read_to_string(path).map_err(|e| AppError::CurveRead {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        parse_delimited(&text).map_err(|e| AppError::CurveRead {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

fn detect_separator(header: &str) -> char {
    [';', '\t', ',']
        .into_iter()
        .find(|&sep| header.contains(sep))
        .unwrap_or(';')
}

/// Parse delimited curve text.
pub fn parse_delimited(text: &str) -> AppResult<Curve> {
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.trim()))
        .filter(|(_, l)| !l.is_empty());

    let Some((_, header)) = lines.next() else {
        return Err(AppError::CurveFormat {
            line: 1,
            message: "missing header row".into(),
        });
    };
    let sep = detect_separator(header);
    let names: Vec<&str> = header.split(sep).map(str::trim).collect();
    if !names[0].eq_ignore_ascii_case(TIME_COLUMN) {
        return Err(AppError::CurveFormat {
            line: 1,
            message: format!("first column must be '{TIME_COLUMN}', found '{}'", names[0]),
        });
    }

    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); names.len()];
    for (line, row) in lines {
        let fields: Vec<&str> = row.split(sep).map(str::trim).collect();
        if fields.len() != names.len() {
            return Err(AppError::CurveFormat {
                line,
                message: format!("expected {} fields, found {}", names.len(), fields.len()),
            });
        }
        for (column, field) in columns.iter_mut().zip(&fields) {
            let value: f64 = field.parse().map_err(|_| AppError::CurveFormat {
                line,
                message: format!("'{field}' is not a number"),
            })?;
            column.push(value);
        }
    }

    let mut columns = columns.into_iter();
    let time = columns.next().unwrap_or_default();
    let curve = Curve::from_columns(
        time,
        names[1..].iter().map(|n| n.to_string()).zip(columns),
    )?;
    Ok(curve)
}
