//! PNG rendering with the plotters bitmap backend.

use std::path::Path;

use anyhow::Result;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use tracing::debug;

use super::data::{BarData, HeatmapData, ScatterData};
use super::{ChartKind, ChartRenderer, ChartSpec};
use crate::table::Table;

const PALETTE: [RGBColor; 8] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(127, 127, 127),
];

/// Anchor colours of the viridis scale, low to high.
const VIRIDIS: [(f64, f64, f64); 5] = [
    (68.0, 1.0, 84.0),
    (59.0, 82.0, 139.0),
    (33.0, 145.0, 140.0),
    (94.0, 201.0, 98.0),
    (253.0, 231.0, 37.0),
];

const CAPTION_FONT: (&str, u32) = ("sans-serif", 28);

/// Writes charts as PNG files.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlottersRenderer;

impl ChartRenderer for PlottersRenderer {
    fn render(&self, spec: &ChartSpec, table: &Table, path: &Path) -> Result<()> {
        debug!(kind = ?spec.kind, path = %path.display(), rows = table.len(), "Rendering chart");
        match spec.kind {
            ChartKind::GroupedBar => {
                let data = BarData::from_table(
                    table,
                    &spec.x_col,
                    spec.required_y()?,
                    spec.hue_col.as_deref(),
                )?;
                draw_grouped_bar(path, spec, &data)
            }
            ChartKind::Heatmap => {
                let data = HeatmapData::from_table(table, &spec.x_col)?;
                draw_heatmap(path, spec, &data)
            }
            ChartKind::Scatter => {
                let data = ScatterData::from_table(
                    table,
                    &spec.x_col,
                    spec.required_y()?,
                    spec.hue_col.as_deref(),
                    spec.style_col.as_deref(),
                )?;
                draw_scatter(path, spec, &data)
            }
        }
    }
}

fn draw_grouped_bar(path: &Path, spec: &ChartSpec, data: &BarData) -> Result<()> {
    let max = data.max_value().unwrap_or(0.0);
    let min = data
        .series
        .iter()
        .flat_map(|(_, values)| values.iter().flatten())
        .copied()
        .fold(0.0_f64, f64::min);
    let y_max = if max > 0.0 { max * 1.1 } else { 1.0 };
    let y_min = min * 1.1;
    let n = data.categories.len().max(1);

    let root = BitMapBackend::new(path, spec.size).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(spec.title.as_str(), CAPTION_FONT)
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(70)
        .build_cartesian_2d(-0.5_f64..(n as f64 - 0.5), y_min..y_max)?;

    let labels = &data.categories;
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(n * 2 + 1)
        .x_label_formatter(&|v: &f64| category_label(labels, *v))
        .x_desc(spec.x_col.as_str())
        .y_desc(spec.y_col.as_deref().unwrap_or_default())
        .draw()?;

    let slot = 0.8 / data.series.len().max(1) as f64;
    let with_legend = spec.hue_col.is_some() && !data.series.is_empty();

    for (s, (label, values)) in data.series.iter().enumerate() {
        let color = PALETTE[s % PALETTE.len()];
        let offset = -0.4 + slot * s as f64;
        let anno = chart.draw_series(values.iter().enumerate().filter_map(|(c, value)| {
            value.map(|v| {
                let x0 = c as f64 + offset;
                Rectangle::new([(x0, 0.0), (x0 + slot, v)], color.filled())
            })
        }))?;
        if with_legend {
            anno.label(label.as_str())
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
        }
    }

    if with_legend {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
    }

    root.present()?;
    Ok(())
}

fn draw_heatmap(path: &Path, spec: &ChartSpec, data: &HeatmapData) -> Result<()> {
    let (lo, hi) = data.range().unwrap_or((0.0, 1.0));
    let rows = data.row_labels.len();
    let cols = data.column_labels.len();
    let (axis_rows, axis_cols) = (rows.max(1), cols.max(1));
    // First row is drawn at the top.
    let y_labels: Vec<String> = data.row_labels.iter().rev().cloned().collect();

    let root = BitMapBackend::new(path, spec.size).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(spec.title.as_str(), CAPTION_FONT)
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(140)
        .build_cartesian_2d(
            -0.5_f64..(axis_cols as f64 - 0.5),
            -0.5_f64..(axis_rows as f64 - 0.5),
        )?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(axis_cols * 2 + 1)
        .y_labels(axis_rows * 2 + 1)
        .x_label_formatter(&|v: &f64| category_label(&data.column_labels, *v))
        .y_label_formatter(&|v: &f64| category_label(&y_labels, *v))
        .y_desc(spec.x_col.as_str())
        .draw()?;

    for (i, row) in data.values.iter().enumerate() {
        let y = (rows - 1 - i) as f64;
        for (j, value) in row.iter().enumerate() {
            let Some(v) = *value else {
                continue;
            };
            let x = j as f64;
            let t = if hi > lo { (v - lo) / (hi - lo) } else { 0.5 };
            chart.draw_series(std::iter::once(Rectangle::new(
                [(x - 0.5, y - 0.5), (x + 0.5, y + 0.5)],
                viridis(t).filled(),
            )))?;

            let ink = if t > 0.6 { BLACK } else { WHITE };
            let style = ("sans-serif", 18)
                .into_font()
                .color(&ink)
                .pos(Pos::new(HPos::Center, VPos::Center));
            chart.draw_series(std::iter::once(Text::new(format!("{v:.1}"), (x, y), style)))?;
        }
    }

    root.present()?;
    Ok(())
}

fn draw_scatter(path: &Path, spec: &ChartSpec, data: &ScatterData) -> Result<()> {
    let ((x0, x1), (y0, y1)) = data.bounds().unwrap_or(((0.0, 1.0), (0.0, 1.0)));
    let (x0, x1) = padded(x0, x1);
    let (y0, y1) = padded(y0, y1);

    let root = BitMapBackend::new(path, spec.size).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(spec.title.as_str(), CAPTION_FONT)
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(x0..x1, y0..y1)?;

    chart
        .configure_mesh()
        .x_desc(spec.x_col.as_str())
        .y_desc(spec.y_col.as_deref().unwrap_or_default())
        .draw()?;

    let hue_color = |hue: usize| PALETTE[hue % PALETTE.len()];

    for s in 0..data.styles.len() {
        let points = data.points.iter().filter(|p| p.style == s);
        match s % 3 {
            0 => chart.draw_series(
                points.map(|p| Circle::new((p.x, p.y), 6, hue_color(p.hue).filled())),
            )?,
            1 => chart.draw_series(
                points.map(|p| TriangleMarker::new((p.x, p.y), 7, hue_color(p.hue).filled())),
            )?,
            _ => chart.draw_series(
                points.map(|p| Cross::new((p.x, p.y), 6, hue_color(p.hue).stroke_width(2))),
            )?,
        };
    }

    for (h, label) in data.hues.iter().enumerate() {
        let color = hue_color(h);
        chart
            .draw_series(std::iter::empty::<Circle<(f64, f64), i32>>())?
            .label(label.as_str())
            .legend(move |(x, y)| Circle::new((x + 5, y), 5, color.filled()));
    }
    if spec.style_col.is_some() {
        for (s, label) in data.styles.iter().enumerate() {
            chart
                .draw_series(std::iter::empty::<Circle<(f64, f64), i32>>())?
                .label(label.as_str())
                .legend(move |(x, y)| {
                    PathElement::new(marker_outline(s, (x + 5, y)), BLACK.stroke_width(2))
                });
        }
    }

    if !data.points.is_empty() {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
    }

    root.present()?;
    Ok(())
}

/// Label for an integer tick on a categorical axis, empty between categories.
fn category_label(labels: &[String], v: f64) -> String {
    let idx = v.round();
    if (v - idx).abs() > 1e-6 || idx < 0.0 {
        return String::new();
    }
    labels.get(idx as usize).cloned().unwrap_or_default()
}

fn padded(lo: f64, hi: f64) -> (f64, f64) {
    let span = hi - lo;
    let pad = if span > 0.0 { span * 0.05 } else { 1.0 };
    (lo - pad, hi + pad)
}

/// Linear interpolation along the viridis anchors, `t` clamped to `[0, 1]`.
fn viridis(t: f64) -> RGBColor {
    let t = t.clamp(0.0, 1.0) * (VIRIDIS.len() - 1) as f64;
    let i = (t.floor() as usize).min(VIRIDIS.len() - 2);
    let f = t - i as f64;
    let (a, b) = (VIRIDIS[i], VIRIDIS[i + 1]);
    let lerp = |x: f64, y: f64| (x + (y - x) * f).round() as u8;
    RGBColor(lerp(a.0, b.0), lerp(a.1, b.1), lerp(a.2, b.2))
}

/// Legend outline matching the marker used for style `s` in the plot.
fn marker_outline(s: usize, (x, y): (i32, i32)) -> Vec<(i32, i32)> {
    match s % 3 {
        0 => vec![
            (x - 2, y - 5),
            (x + 2, y - 5),
            (x + 5, y - 2),
            (x + 5, y + 2),
            (x + 2, y + 5),
            (x - 2, y + 5),
            (x - 5, y + 2),
            (x - 5, y - 2),
            (x - 2, y - 5),
        ],
        1 => vec![(x, y - 5), (x + 5, y + 4), (x - 5, y + 4), (x, y - 5)],
        _ => vec![(x - 4, y - 4), (x + 4, y + 4), (x, y), (x + 4, y - 4), (x - 4, y + 4)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_label() {
        let labels = vec!["vegan".to_string(), "keto".to_string()];
        assert_eq!(category_label(&labels, 0.0), "vegan");
        assert_eq!(category_label(&labels, 1.0000001), "keto");
        assert_eq!(category_label(&labels, 0.5), "");
        assert_eq!(category_label(&labels, -1.0), "");
        assert_eq!(category_label(&labels, 2.0), "");
    }

    #[test]
    fn test_viridis_endpoints() {
        assert_eq!(viridis(0.0), RGBColor(68, 1, 84));
        assert_eq!(viridis(1.0), RGBColor(253, 231, 37));
        assert_eq!(viridis(7.0), RGBColor(253, 231, 37));
    }

    #[test]
    fn test_padded_degenerate_range() {
        assert_eq!(padded(3.0, 3.0), (2.0, 4.0));
        assert_eq!(padded(0.0, 10.0), (-0.5, 10.5));
    }

    #[test]
    fn test_render_without_y_column_fails() {
        let table = Table::new(["Diet_type", "Protein(g)"]);
        let spec = ChartSpec::new(ChartKind::Scatter, "t", "Protein(g)");
        let path = std::env::temp_dir().join("diet_macros_never_written.png");
        assert!(PlottersRenderer.render(&spec, &table, &path).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_empty_tables_render_blank_charts() {
        let dir = tempfile::tempdir().unwrap();
        let means = Table::new(["Diet_type", "Protein(g)", "Carbs(g)", "Fat(g)"]);
        let melted = Table::new(["Diet_type", "Macronutrient", "Average"]);
        let specs = [
            (
                ChartSpec::new(ChartKind::GroupedBar, "bar", "Diet_type").y("Protein(g)"),
                &means,
            ),
            (
                ChartSpec::new(ChartKind::GroupedBar, "hued", "Diet_type")
                    .y("Average")
                    .hue("Macronutrient"),
                &melted,
            ),
            (ChartSpec::new(ChartKind::Heatmap, "heat", "Diet_type"), &means),
            (
                ChartSpec::new(ChartKind::Scatter, "scatter", "Protein(g)")
                    .y("Carbs(g)")
                    .hue("Fat(g)")
                    .style("Diet_type"),
                &means,
            ),
        ];

        for (i, (spec, table)) in specs.iter().enumerate() {
            let path = dir.path().join(format!("{i}.png"));
            PlottersRenderer
                .render(&spec.clone().size((400, 300)), table, &path)
                .unwrap();
            assert!(path.exists(), "{} not drawn", spec.title);
        }
    }
}
