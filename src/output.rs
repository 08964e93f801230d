//! Exporters for derived views: CSV tables, JSON documents, chart images.
//!
//! Every writer reports failure; [`export`] wraps it in
//! [`PipelineError::Write`] with the artifact name and destination.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use csv::WriterBuilder;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::analyzers::types::DerivedView;
use crate::chart::{ChartRenderer, ChartSpec};
use crate::error::PipelineError;
use crate::table::{Cell, Table};

/// What to produce from a view.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputKind {
    Table,
    Chart(ChartSpec),
    Document,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutputDescriptor {
    pub kind: OutputKind,
    pub destination: PathBuf,
}

impl OutputDescriptor {
    pub fn table(destination: impl Into<PathBuf>) -> Self {
        Self {
            kind: OutputKind::Table,
            destination: destination.into(),
        }
    }

    pub fn chart(spec: ChartSpec, destination: impl Into<PathBuf>) -> Self {
        Self {
            kind: OutputKind::Chart(spec),
            destination: destination.into(),
        }
    }

    pub fn document(destination: impl Into<PathBuf>) -> Self {
        Self {
            kind: OutputKind::Document,
            destination: destination.into(),
        }
    }
}

/// Writes `view` as described by `descriptor`.
///
/// The view is only read. Parent directories are created as needed.
pub fn export(
    view: &DerivedView,
    descriptor: &OutputDescriptor,
    renderer: &dyn ChartRenderer,
) -> std::result::Result<(), PipelineError> {
    let path = descriptor.destination.as_path();
    let result = match &descriptor.kind {
        OutputKind::Table => write_table(&view.table, path),
        OutputKind::Document => write_document(&view.table, path),
        OutputKind::Chart(spec) => {
            ensure_parent(path).and_then(|_| renderer.render(spec, &view.table, path))
        }
    };

    result.map_err(|e| PipelineError::Write {
        artifact: view.name.clone(),
        path: path.to_path_buf(),
        source: e.into(),
    })?;

    info!(view = %view.name, path = %path.display(), "Artifact written");
    Ok(())
}

/// Writes a table as CSV with a header row, preserving column and row order.
pub fn write_table(table: &Table, path: &Path) -> Result<()> {
    ensure_parent(path)?;
    debug!(path = %path.display(), rows = table.len(), "Writing CSV table");

    let mut writer = WriterBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;

    writer.write_record(table.columns())?;
    for row in table.rows() {
        writer.write_record(row.iter().map(Cell::to_string))?;
    }
    writer.flush()?;

    Ok(())
}

/// Converts a table to a JSON array with one object per row.
///
/// Numbers stay numbers, text stays text, everything else becomes `null`.
pub fn to_records(table: &Table) -> Value {
    Value::Array(
        table
            .rows()
            .iter()
            .map(|row| {
                let object: Map<String, Value> = table
                    .columns()
                    .iter()
                    .zip(row)
                    .map(|(name, cell)| (name.clone(), cell_to_json(cell)))
                    .collect();
                Value::Object(object)
            })
            .collect(),
    )
}

/// Writes a table as a JSON array of records.
pub fn write_document(table: &Table, path: &Path) -> Result<()> {
    ensure_parent(path)?;
    debug!(path = %path.display(), records = table.len(), "Writing JSON document");
    let body = serde_json::to_vec(&to_records(table))?;
    fs::write(path, body).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

/// Writes a single line of text, replacing any previous content.
pub fn write_text(path: &Path, line: &str) -> Result<()> {
    ensure_parent(path)?;
    fs::write(path, format!("{line}\n")).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

fn cell_to_json(cell: &Cell) -> Value {
    match cell {
        Cell::Text(s) => Value::String(s.clone()),
        Cell::Number(v) => serde_json::Number::from_f64(*v).map_or(Value::Null, Value::Number),
        Cell::Missing | Cell::Invalid(_) | Cell::Undefined => Value::Null,
    }
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating directory {}", parent.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::aggregate::group_means;
    use crate::parser::parse_table;
    use std::cell::RefCell;

    fn means() -> Table {
        Table::from_rows(
            ["Diet_type", "Protein(g)", "Carbs(g)"],
            vec![
                vec!["vegan".into(), 20.0.into(), (1.0 / 3.0).into()],
                vec!["keto".into(), 5.0.into(), Cell::Missing],
            ],
        )
        .unwrap()
    }

    /// Records every chart request instead of drawing it.
    #[derive(Default)]
    struct RecordingRenderer {
        calls: RefCell<Vec<(String, PathBuf)>>,
    }

    impl ChartRenderer for RecordingRenderer {
        fn render(&self, spec: &ChartSpec, _table: &Table, path: &Path) -> Result<()> {
            self.calls
                .borrow_mut()
                .push((spec.title.clone(), path.to_path_buf()));
            Ok(())
        }
    }

    #[test]
    fn test_write_table_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/avg.csv");

        write_table(&means(), &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines[0], "Diet_type,Protein(g),Carbs(g)");
        assert!(lines[1].starts_with("vegan,20,0.333"));
        assert_eq!(lines[2], "keto,5,");
    }

    #[test]
    fn test_group_means_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("avg.csv");
        let original = means();

        write_table(&original, &path).unwrap();
        let reloaded = parse_table(&fs::read(&path).unwrap(), &["Diet_type"]).unwrap();
        let reloaded = crate::analyzers::clean::clean_numeric(
            reloaded,
            &["Protein(g)", "Carbs(g)"],
            crate::analyzers::clean::FillPolicy::LeaveMissing,
        )
        .unwrap()
        .table;

        let again = group_means(&reloaded, "Diet_type", &["Protein(g)", "Carbs(g)"]).unwrap();
        assert_eq!(again.len(), original.len());
        for (a, b) in again.rows().iter().zip(original.rows()) {
            assert_eq!(a[0], b[0]);
            match (a[1].as_number(), b[1].as_number()) {
                (Some(x), Some(y)) => assert!((x - y).abs() < 1e-9),
                other => panic!("unexpected values {other:?}"),
            }
        }
        let carbs = again.rows()[0][2].as_number().unwrap();
        assert!((carbs - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_document_is_array_of_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.json");

        write_document(&means(), &path).unwrap();

        let value: Value = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        let records = value.as_array().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["Diet_type"], "vegan");
        assert_eq!(records[0]["Protein(g)"], 20.0);
        assert!(records[1]["Carbs(g)"].is_null());
    }

    #[test]
    fn test_export_document_never_renders() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = RecordingRenderer::default();
        let view = DerivedView::new("summary", means());
        let path = dir.path().join("simulated_nosql/results.json");

        export(&view, &OutputDescriptor::document(&path), &renderer).unwrap();

        assert!(renderer.calls.borrow().is_empty());
        let value: Value = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(value, to_records(&view.table));
    }

    #[test]
    fn test_write_text_single_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("line.txt");
        write_text(&path, "hello").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "hello\n");
    }

    #[test]
    fn test_export_dispatches_chart_to_renderer() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = RecordingRenderer::default();
        let view = DerivedView::new("avg_macros", means());
        let spec = ChartSpec::new(crate::chart::ChartKind::Heatmap, "Macros", "Diet_type");
        let descriptor = OutputDescriptor::chart(spec, dir.path().join("charts/heat.png"));

        export(&view, &descriptor, &renderer).unwrap();

        let calls = renderer.calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "Macros");
        assert!(dir.path().join("charts").is_dir());
    }

    #[test]
    fn test_export_reports_write_failure() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where a directory is expected.
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "x").unwrap();
        let view = DerivedView::new("avg_macros", means());
        let descriptor = OutputDescriptor::table(blocker.join("avg.csv"));

        let err = export(&view, &descriptor, &RecordingRenderer::default()).unwrap_err();

        match err {
            PipelineError::Write { artifact, path, .. } => {
                assert_eq!(artifact, "avg_macros");
                assert_eq!(path, blocker.join("avg.csv"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
