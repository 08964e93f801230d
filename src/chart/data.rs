//! Plot-ready data extracted from tables.

use anyhow::Result;

use crate::table::Table;

/// Categories along x, one value series per hue.
#[derive(Debug, Clone, PartialEq)]
pub struct BarData {
    pub categories: Vec<String>,
    /// `(hue label, value per category)`. A single unnamed series without hue.
    pub series: Vec<(String, Vec<Option<f64>>)>,
}

impl BarData {
    pub fn from_table(
        table: &Table,
        x_col: &str,
        y_col: &str,
        hue_col: Option<&str>,
    ) -> Result<Self> {
        let x_idx = table.column_index(x_col)?;
        let y_idx = table.column_index(y_col)?;
        let hue_idx = hue_col.map(|c| table.column_index(c)).transpose()?;

        let mut categories: Vec<String> = Vec::new();
        let mut hues: Vec<String> = Vec::new();
        let mut points: Vec<(usize, usize, f64)> = Vec::new();

        for row in table.rows() {
            let Some(category) = row[x_idx].group_key() else {
                continue;
            };
            let hue = match hue_idx {
                Some(i) => match row[i].group_key() {
                    Some(h) => h,
                    None => continue,
                },
                None => y_col.to_string(),
            };
            let c = position_or_push(&mut categories, category);
            let h = position_or_push(&mut hues, hue);
            if let Some(value) = row[y_idx].as_number() {
                points.push((c, h, value));
            }
        }

        let mut series: Vec<(String, Vec<Option<f64>>)> = hues
            .into_iter()
            .map(|h| (h, vec![None; categories.len()]))
            .collect();
        for (c, h, value) in points {
            series[h].1[c] = Some(value);
        }

        Ok(Self { categories, series })
    }

    /// Largest value across all series, or `None` without data.
    pub fn max_value(&self) -> Option<f64> {
        self.series
            .iter()
            .flat_map(|(_, values)| values.iter().flatten())
            .copied()
            .reduce(f64::max)
    }
}

/// Matrix of row labels by numeric columns.
#[derive(Debug, Clone, PartialEq)]
pub struct HeatmapData {
    pub row_labels: Vec<String>,
    pub column_labels: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

impl HeatmapData {
    /// Uses `label_col` for rows and every other column holding at least one
    /// number for columns.
    pub fn from_table(table: &Table, label_col: &str) -> Result<Self> {
        let label_idx = table.column_index(label_col)?;
        let value_indices: Vec<usize> = (0..table.columns().len())
            .filter(|&i| i != label_idx)
            .filter(|&i| table.rows().iter().any(|row| row[i].as_number().is_some()))
            .collect();

        Ok(Self {
            row_labels: table.rows().iter().map(|row| row[label_idx].to_string()).collect(),
            column_labels: value_indices
                .iter()
                .map(|&i| table.columns()[i].clone())
                .collect(),
            values: table
                .rows()
                .iter()
                .map(|row| value_indices.iter().map(|&i| row[i].as_number()).collect())
                .collect(),
        })
    }

    /// `(min, max)` over all present values.
    pub fn range(&self) -> Option<(f64, f64)> {
        self.values
            .iter()
            .flatten()
            .flatten()
            .fold(None, |acc, &v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScatterPoint {
    pub x: f64,
    pub y: f64,
    pub hue: usize,
    pub style: usize,
}

/// Points with indices into the hue and style label lists.
#[derive(Debug, Clone, PartialEq)]
pub struct ScatterData {
    pub points: Vec<ScatterPoint>,
    pub hues: Vec<String>,
    pub styles: Vec<String>,
}

impl ScatterData {
    /// Rows lacking a numeric x or y are left out.
    pub fn from_table(
        table: &Table,
        x_col: &str,
        y_col: &str,
        hue_col: Option<&str>,
        style_col: Option<&str>,
    ) -> Result<Self> {
        let x_idx = table.column_index(x_col)?;
        let y_idx = table.column_index(y_col)?;
        let hue_idx = hue_col.map(|c| table.column_index(c)).transpose()?;
        let style_idx = style_col.map(|c| table.column_index(c)).transpose()?;

        let mut data = Self {
            points: Vec::new(),
            hues: Vec::new(),
            styles: Vec::new(),
        };

        for row in table.rows() {
            let (Some(x), Some(y)) = (row[x_idx].as_number(), row[y_idx].as_number()) else {
                continue;
            };
            let label = |idx: Option<usize>| {
                idx.and_then(|i| row[i].group_key()).unwrap_or_default()
            };
            let hue = position_or_push(&mut data.hues, label(hue_idx));
            let style = position_or_push(&mut data.styles, label(style_idx));
            data.points.push(ScatterPoint { x, y, hue, style });
        }

        Ok(data)
    }

    /// `((x_min, x_max), (y_min, y_max))` over all points.
    pub fn bounds(&self) -> Option<((f64, f64), (f64, f64))> {
        let first = self.points.first()?;
        Some(self.points.iter().fold(
            ((first.x, first.x), (first.y, first.y)),
            |((x0, x1), (y0, y1)), p| ((x0.min(p.x), x1.max(p.x)), (y0.min(p.y), y1.max(p.y))),
        ))
    }
}

fn position_or_push(labels: &mut Vec<String>, label: String) -> usize {
    match labels.iter().position(|l| *l == label) {
        Some(i) => i,
        None => {
            labels.push(label);
            labels.len() - 1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Cell;

    fn long_means() -> Table {
        Table::from_rows(
            ["Diet_type", "Macronutrient", "Average"],
            vec![
                vec!["vegan".into(), "Protein(g)".into(), 20.0.into()],
                vec!["vegan".into(), "Fat(g)".into(), 5.0.into()],
                vec!["keto".into(), "Protein(g)".into(), 5.0.into()],
                vec!["keto".into(), "Fat(g)".into(), 40.0.into()],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_bar_data_with_hue() {
        let bars = BarData::from_table(&long_means(), "Diet_type", "Average", Some("Macronutrient"))
            .unwrap();

        assert_eq!(bars.categories, ["vegan", "keto"]);
        assert_eq!(
            bars.series,
            vec![
                ("Protein(g)".to_string(), vec![Some(20.0), Some(5.0)]),
                ("Fat(g)".to_string(), vec![Some(5.0), Some(40.0)]),
            ]
        );
        assert_eq!(bars.max_value(), Some(40.0));
    }

    #[test]
    fn test_bar_data_without_hue() {
        let table = Table::from_rows(
            ["Diet_type", "Protein(g)"],
            vec![
                vec!["vegan".into(), 20.0.into()],
                vec!["keto".into(), Cell::Missing],
            ],
        )
        .unwrap();
        let bars = BarData::from_table(&table, "Diet_type", "Protein(g)", None).unwrap();

        assert_eq!(bars.series.len(), 1);
        assert_eq!(bars.series[0].1, vec![Some(20.0), None]);
    }

    #[test]
    fn test_heatmap_skips_label_and_text_columns() {
        let table = Table::from_rows(
            ["Diet_type", "Note", "Protein(g)", "Fat(g)"],
            vec![
                vec!["vegan".into(), "n".into(), 20.0.into(), 5.0.into()],
                vec!["keto".into(), "n".into(), 5.0.into(), 40.0.into()],
            ],
        )
        .unwrap();
        let heat = HeatmapData::from_table(&table, "Diet_type").unwrap();

        assert_eq!(heat.row_labels, ["vegan", "keto"]);
        assert_eq!(heat.column_labels, ["Protein(g)", "Fat(g)"]);
        assert_eq!(heat.values[1], vec![Some(5.0), Some(40.0)]);
        assert_eq!(heat.range(), Some((5.0, 40.0)));
    }

    #[test]
    fn test_scatter_data_indices() {
        let table = Table::from_rows(
            ["Protein(g)", "Carbs(g)", "Cuisine_type", "Diet_type"],
            vec![
                vec![30.0.into(), 10.0.into(), "x".into(), "vegan".into()],
                vec![5.0.into(), 5.0.into(), "y".into(), "keto".into()],
                vec![10.0.into(), 20.0.into(), "x".into(), "keto".into()],
                vec![Cell::Missing, 1.0.into(), "z".into(), "keto".into()],
            ],
        )
        .unwrap();
        let scatter = ScatterData::from_table(
            &table,
            "Protein(g)",
            "Carbs(g)",
            Some("Cuisine_type"),
            Some("Diet_type"),
        )
        .unwrap();

        assert_eq!(scatter.points.len(), 3);
        assert_eq!(scatter.hues, ["x", "y"]);
        assert_eq!(scatter.styles, ["vegan", "keto"]);
        assert_eq!(scatter.points[2], ScatterPoint { x: 10.0, y: 20.0, hue: 0, style: 1 });
        assert_eq!(scatter.bounds(), Some(((5.0, 30.0), (5.0, 20.0))));
    }
}
