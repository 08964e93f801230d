//! Numeric coercion and fill for designated columns.

use serde::Serialize;
use tracing::{debug, warn};

use crate::analyzers::utility::numeric_mean;
use crate::error::Result;
use crate::table::{Cell, Table};

/// What to write into cells that did not coerce to a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FillPolicy {
    /// Column mean over the successfully coerced values.
    #[default]
    ColumnMean,
    /// Leave them missing so aggregations skip them.
    LeaveMissing,
}

/// Per-column outcome of [`clean_numeric`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnReport {
    pub column: String,
    pub parsed: usize,
    pub missing: usize,
    pub invalid: usize,
    pub filled: usize,
    pub fill_value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cleaned {
    pub table: Table,
    pub reports: Vec<ColumnReport>,
}

/// Coerces one cell towards a number.
///
/// Text must parse as a finite float; `NaN`, `inf` and other text become
/// [`Cell::Invalid`]. Blank text and undefined values become [`Cell::Missing`].
pub fn coerce_numeric(cell: &Cell) -> Cell {
    match cell {
        Cell::Number(_) | Cell::Missing => cell.clone(),
        Cell::Undefined => Cell::Missing,
        Cell::Invalid(raw) | Cell::Text(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return Cell::Missing;
            }
            match trimmed.parse::<f64>() {
                Ok(v) if v.is_finite() => Cell::Number(v),
                _ => Cell::Invalid(raw.clone()),
            }
        }
    }
}

/// Replacement for a vacant cell under `policy`. Non-vacant cells are kept.
pub fn fill(cell: Cell, policy: FillPolicy, mean: Option<f64>) -> Cell {
    if !cell.is_vacant() {
        return cell;
    }
    match (policy, mean) {
        (FillPolicy::ColumnMean, Some(m)) => Cell::Number(m),
        _ => Cell::Missing,
    }
}

/// Coerces each designated column to numbers and fills what failed.
///
/// Row count never changes. Running it again on its own output is a no-op.
///
/// # Errors
///
/// Returns a schema error if a designated column is not in the table.
#[tracing::instrument(skip(table), fields(rows = table.len()))]
pub fn clean_numeric(mut table: Table, columns: &[&str], policy: FillPolicy) -> Result<Cleaned> {
    let indices = columns
        .iter()
        .map(|c| table.column_index(c))
        .collect::<Result<Vec<_>>>()?;

    let mut reports = Vec::with_capacity(columns.len());

    for (&column, idx) in columns.iter().zip(indices) {
        let mut report = ColumnReport {
            column: column.to_string(),
            parsed: 0,
            missing: 0,
            invalid: 0,
            filled: 0,
            fill_value: None,
        };

        for row in table.rows_mut() {
            let coerced = coerce_numeric(&row[idx]);
            match &coerced {
                Cell::Number(_) => report.parsed += 1,
                Cell::Invalid(_) => report.invalid += 1,
                _ => report.missing += 1,
            }
            row[idx] = coerced;
        }

        let mean = numeric_mean(table.rows().iter().map(|row| &row[idx]));
        report.fill_value = match policy {
            FillPolicy::ColumnMean => mean,
            FillPolicy::LeaveMissing => None,
        };

        for row in table.rows_mut() {
            if row[idx].is_vacant() {
                let cell = std::mem::replace(&mut row[idx], Cell::Missing);
                row[idx] = fill(cell, policy, mean);
                if matches!(row[idx], Cell::Number(_)) {
                    report.filled += 1;
                }
            }
        }

        if report.invalid > 0 {
            warn!(
                column,
                invalid = report.invalid,
                "Cells failed numeric coercion"
            );
        }
        if mean.is_none() && !table.is_empty() {
            warn!(column, "No numeric values in column, leaving cells missing");
        }
        debug!(?report, "Column cleaned");

        reports.push(report);
    }

    Ok(Cleaned { table, reports })
}
