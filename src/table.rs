//! In-memory tabular data model.
//!
//! A [`Table`] is an ordered list of column names plus row-major cells. The
//! column set only grows: derived columns are appended with
//! [`Table::add_column`], nothing removes a column in place.

use std::collections::HashMap;
use std::fmt;

use crate::error::{PipelineError, Result};

/// A single value in a [`Table`].
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    /// Always finite.
    Number(f64),
    Missing,
    /// Text that failed numeric coercion. The raw value is kept for logs.
    Invalid(String),
    /// Result of an undefined arithmetic operation, such as a zero divisor.
    Undefined,
}

impl Cell {
    /// Builds a numeric cell, mapping non-finite values to [`Cell::Undefined`].
    pub fn number(value: f64) -> Self {
        if value.is_finite() {
            Cell::Number(value)
        } else {
            Cell::Undefined
        }
    }

    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Whether the cell still needs a fill value after coercion.
    pub fn is_vacant(&self) -> bool {
        matches!(self, Cell::Missing | Cell::Invalid(_))
    }

    /// Key used for grouping. Missing and undefined cells belong to no group.
    pub fn group_key(&self) -> Option<String> {
        match self {
            Cell::Text(s) => Some(s.clone()),
            Cell::Number(v) => Some(v.to_string()),
            Cell::Invalid(raw) => Some(raw.clone()),
            Cell::Missing | Cell::Undefined => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(s) | Cell::Invalid(s) => write!(f, "{s}"),
            Cell::Number(v) => write!(f, "{v}"),
            Cell::Missing => Ok(()),
            Cell::Undefined => write!(f, "NaN"),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::number(value)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Builds a table and checks every row against the column count.
    pub fn from_rows<S: Into<String>>(
        columns: impl IntoIterator<Item = S>,
        rows: Vec<Vec<Cell>>,
    ) -> Result<Self> {
        let mut table = Self::new(columns);
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Position of `name`, or a schema error listing the known columns.
    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| PipelineError::missing_column(name, &self.columns))
    }

    /// All cells of one column, in row order.
    pub fn column(&self, name: &str) -> Result<Vec<&Cell>> {
        let idx = self.column_index(name)?;
        Ok(self.rows.iter().map(|row| &row[idx]).collect())
    }

    pub fn push_row(&mut self, row: Vec<Cell>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(PipelineError::ShapeMismatch {
                what: format!("row {}", self.rows.len()),
                expected: self.columns.len(),
                found: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    /// Appends a derived column. Existing columns are never replaced.
    pub fn add_column(&mut self, name: &str, cells: Vec<Cell>) -> Result<()> {
        if self.has_column(name) {
            return Err(PipelineError::DuplicateColumn(name.to_string()));
        }
        if cells.len() != self.rows.len() {
            return Err(PipelineError::ShapeMismatch {
                what: format!("column '{name}'"),
                expected: self.rows.len(),
                found: cells.len(),
            });
        }
        self.columns.push(name.to_string());
        for (row, cell) in self.rows.iter_mut().zip(cells) {
            row.push(cell);
        }
        Ok(())
    }

    /// New table with only the named columns, in the given order.
    pub fn select(&self, names: &[&str]) -> Result<Table> {
        let indices = names
            .iter()
            .map(|name| self.column_index(name))
            .collect::<Result<Vec<_>>>()?;

        Ok(Table {
            columns: names.iter().map(|n| n.to_string()).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
                .collect(),
        })
    }

    /// New table holding the rows at `indices`, in that order.
    pub fn take_rows(&self, indices: &[usize]) -> Table {
        Table {
            columns: self.columns.clone(),
            rows: indices.iter().map(|&i| self.rows[i].clone()).collect(),
        }
    }

    /// Row indices per distinct key of `column`, in first-encounter order.
    /// Rows whose key is missing are skipped.
    pub fn groups(&self, column: &str) -> Result<Vec<(String, Vec<usize>)>> {
        let idx = self.column_index(column)?;
        let mut positions: HashMap<String, usize> = HashMap::new();
        let mut groups: Vec<(String, Vec<usize>)> = Vec::new();

        for (row_idx, row) in self.rows.iter().enumerate() {
            let Some(key) = row[idx].group_key() else {
                continue;
            };
            match positions.get(&key) {
                Some(&g) => groups[g].1.push(row_idx),
                None => {
                    positions.insert(key.clone(), groups.len());
                    groups.push((key, vec![row_idx]));
                }
            }
        }

        Ok(groups)
    }

    pub(crate) fn rows_mut(&mut self) -> &mut [Vec<Cell>] {
        &mut self.rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::from_rows(
            ["Diet_type", "Protein(g)"],
            vec![
                vec!["vegan".into(), 10.0.into()],
                vec!["keto".into(), 5.0.into()],
                vec!["vegan".into(), 30.0.into()],
                vec![Cell::Missing, 1.0.into()],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_number_rejects_non_finite() {
        assert_eq!(Cell::number(f64::INFINITY), Cell::Undefined);
        assert_eq!(Cell::number(f64::NAN), Cell::Undefined);
        assert_eq!(Cell::number(2.5), Cell::Number(2.5));
    }

    #[test]
    fn test_display() {
        assert_eq!(Cell::Number(20.0).to_string(), "20");
        assert_eq!(Cell::Number(2.5).to_string(), "2.5");
        assert_eq!(Cell::Missing.to_string(), "");
        assert_eq!(Cell::Undefined.to_string(), "NaN");
        assert_eq!(Cell::Invalid("abc".into()).to_string(), "abc");
    }

    #[test]
    fn test_column_index_unknown() {
        let err = sample().column_index("Fat(g)").unwrap_err();
        assert!(matches!(err, PipelineError::MissingColumn { .. }));
    }

    #[test]
    fn test_push_row_wrong_width() {
        let mut table = Table::new(["a", "b"]);
        assert!(table.push_row(vec![Cell::Missing]).is_err());
        assert!(table.is_empty());
    }

    #[test]
    fn test_add_column_is_append_only() {
        let mut table = sample();
        table.add_column("x", vec![Cell::Missing; 4]).unwrap();
        assert_eq!(table.columns().last().unwrap(), "x");

        let err = table.add_column("Protein(g)", vec![Cell::Missing; 4]);
        assert!(matches!(err, Err(PipelineError::DuplicateColumn(_))));

        let err = table.add_column("y", vec![Cell::Missing; 2]);
        assert!(matches!(err, Err(PipelineError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_select_reorders() {
        let view = sample().select(&["Protein(g)", "Diet_type"]).unwrap();
        assert_eq!(view.columns(), ["Protein(g)", "Diet_type"]);
        assert_eq!(view.rows()[0], vec![Cell::Number(10.0), Cell::text("vegan")]);
    }

    #[test]
    fn test_groups_first_encounter_order_and_missing_skipped() {
        let groups = sample().groups("Diet_type").unwrap();
        assert_eq!(
            groups,
            vec![("vegan".to_string(), vec![0, 2]), ("keto".to_string(), vec![1])]
        );
    }
}
