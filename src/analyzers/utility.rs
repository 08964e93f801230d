use crate::table::Cell;

/// Computes the arithmetic mean of a slice of values. Returns `None` for empty input.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Mean over the numeric cells only. Every other cell is ignored.
pub fn numeric_mean<'a>(cells: impl IntoIterator<Item = &'a Cell>) -> Option<f64> {
    let values: Vec<f64> = cells.into_iter().filter_map(Cell::as_number).collect();
    mean(&values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_empty() {
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn test_numeric_mean_skips_non_numbers() {
        let cells = [
            Cell::Number(10.0),
            Cell::Missing,
            Cell::Number(20.0),
            Cell::Invalid("n/a".into()),
        ];
        assert_eq!(numeric_mean(&cells), Some(15.0));
    }
}
