use std::cmp::Ordering;
use std::collections::HashMap;

use crate::analyzers::utility::numeric_mean;
use crate::error::{PipelineError, Result};
use crate::table::{Cell, Table};

/// Name of the frequency column produced by [`top_k_categories`].
pub const COUNT_COLUMN: &str = "count";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// Mean of each `value_cols` column per distinct `group_key` value.
///
/// One row per group in first-encounter order, columns `[group_key] + value_cols`.
/// A group with no numeric value in a column gets [`Cell::Missing`].
pub fn group_means(table: &Table, group_key: &str, value_cols: &[&str]) -> Result<Table> {
    let indices = value_cols
        .iter()
        .map(|c| table.column_index(c))
        .collect::<Result<Vec<_>>>()?;

    let mut columns = vec![group_key];
    columns.extend_from_slice(value_cols);
    let mut out = Table::new(columns);

    for (key, rows) in table.groups(group_key)? {
        let mut row = Vec::with_capacity(indices.len() + 1);
        row.push(Cell::Text(key));
        for &idx in &indices {
            let mean = numeric_mean(rows.iter().map(|&r| &table.rows()[r][idx]));
            row.push(mean.map_or(Cell::Missing, Cell::Number));
        }
        out.push_row(row)?;
    }

    Ok(out)
}

/// First `n` rows of each group after a stable sort on `sort_col`.
///
/// Rows keep their sorted order in the output and every column is kept.
/// Equal sort values keep their original order; non-numeric sort values go
/// last whatever the direction.
pub fn top_n_per_group(
    table: &Table,
    group_key: &str,
    sort_col: &str,
    n: usize,
    order: SortOrder,
) -> Result<Table> {
    let key_idx = table.column_index(group_key)?;
    let sort_idx = table.column_index(sort_col)?;

    let mut indices: Vec<usize> = (0..table.len()).collect();
    indices.sort_by(|&a, &b| {
        let va = table.rows()[a][sort_idx].as_number();
        let vb = table.rows()[b][sort_idx].as_number();
        match (va, vb) {
            (Some(x), Some(y)) => match order {
                SortOrder::Ascending => x.total_cmp(&y),
                SortOrder::Descending => y.total_cmp(&x),
            },
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    });

    let mut taken: HashMap<String, usize> = HashMap::new();
    let kept: Vec<usize> = indices
        .into_iter()
        .filter(|&i| {
            let Some(key) = table.rows()[i][key_idx].group_key() else {
                return false;
            };
            let count = taken.entry(key).or_default();
            if *count < n {
                *count += 1;
                true
            } else {
                false
            }
        })
        .collect();

    Ok(table.take_rows(&kept))
}

/// The `k` most frequent `category_key` values within each `group_key` group.
///
/// Output columns are `[group_key, category_key, "count"]`. Groups appear in
/// first-encounter order; within a group counts are descending and equal
/// counts keep the order in which the category first appeared in the group.
pub fn top_k_categories(
    table: &Table,
    group_key: &str,
    category_key: &str,
    k: usize,
) -> Result<Table> {
    let cat_idx = table.column_index(category_key)?;
    let mut out = Table::new([group_key, category_key, COUNT_COLUMN]);

    for (key, rows) in table.groups(group_key)? {
        let mut counts: Vec<(String, usize)> = Vec::new();
        for &r in &rows {
            let Some(category) = table.rows()[r][cat_idx].group_key() else {
                continue;
            };
            match counts.iter_mut().find(|(c, _)| *c == category) {
                Some((_, n)) => *n += 1,
                None => counts.push((category, 1)),
            }
        }

        counts.sort_by(|a, b| b.1.cmp(&a.1));

        for (category, count) in counts.into_iter().take(k) {
            out.push_row(vec![
                Cell::Text(key.clone()),
                Cell::Text(category),
                Cell::Number(count as f64),
            ])?;
        }
    }

    Ok(out)
}

/// Group whose mean of `value_col` is largest. Ties go to the first encountered.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyInput`] when no group has a numeric mean,
/// which includes a table with zero rows.
pub fn argmax_group(table: &Table, group_key: &str, value_col: &str) -> Result<String> {
    let means = group_means(table, group_key, &[value_col])?;

    let mut best: Option<(&str, f64)> = None;
    for row in means.rows() {
        let (Some(key), Some(value)) = (row[0].as_text(), row[1].as_number()) else {
            continue;
        };
        if best.is_none_or(|(_, b)| value > b) {
            best = Some((key, value));
        }
    }

    best.map(|(key, _)| key.to_string())
        .ok_or_else(|| PipelineError::EmptyInput {
            operation: "argmax_group",
            column: value_col.to_string(),
        })
}

/// Divides two cells. Anything but two numbers with a non-zero divisor is undefined.
pub fn ratio(numerator: &Cell, denominator: &Cell) -> Cell {
    match (numerator.as_number(), denominator.as_number()) {
        (Some(n), Some(d)) if d != 0.0 => Cell::number(n / d),
        _ => Cell::Undefined,
    }
}

/// `numerator / denominator` for every row, see [`ratio`].
pub fn row_ratio(table: &Table, numerator: &str, denominator: &str) -> Result<Vec<Cell>> {
    let n_idx = table.column_index(numerator)?;
    let d_idx = table.column_index(denominator)?;
    Ok(table
        .rows()
        .iter()
        .map(|row| ratio(&row[n_idx], &row[d_idx]))
        .collect())
}

/// Copy of `table` with a ratio column appended as `output_col`.
pub fn with_ratio(
    table: &Table,
    numerator: &str,
    denominator: &str,
    output_col: &str,
) -> Result<Table> {
    let cells = row_ratio(table, numerator, denominator)?;
    let mut out = table.clone();
    out.add_column(output_col, cells)?;
    Ok(out)
}

/// Reshapes wide columns into `(id, variable, value)` rows.
///
/// Input row order is the outer loop, `value_cols` order the inner one.
pub fn melt(
    table: &Table,
    id_col: &str,
    value_cols: &[&str],
    var_name: &str,
    value_name: &str,
) -> Result<Table> {
    let id_idx = table.column_index(id_col)?;
    let indices = value_cols
        .iter()
        .map(|c| table.column_index(c))
        .collect::<Result<Vec<_>>>()?;

    let mut out = Table::new([id_col, var_name, value_name]);
    for row in table.rows() {
        for (&name, &idx) in value_cols.iter().zip(&indices) {
            out.push_row(vec![row[id_idx].clone(), Cell::text(name), row[idx].clone()])?;
        }
    }
    Ok(out)
}
