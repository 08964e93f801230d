use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use crate::analyzers::aggregate::{
    SortOrder, argmax_group, group_means, melt, top_k_categories, top_n_per_group, with_ratio,
};
use crate::analyzers::clean::{FillPolicy, clean_numeric};
use crate::analyzers::types::{ArtifactFailure, DerivedView, RunSummary};
use crate::chart::{ChartKind, ChartRenderer, ChartSpec, PlottersRenderer};
use crate::config::{
    AnalysisConfig, CARBS, CARBS_TO_FAT, CUISINE_TYPE, DIET_TYPE, FAT, NUMERIC_COLUMNS,
    PROTEIN, PROTEIN_TO_CARBS, RECIPE_NAME, REQUIRED_COLUMNS,
};
use crate::error::PipelineError;
use crate::infra::blob::BlobStore;
use crate::output::{OutputDescriptor, export, to_records, write_text};
use crate::parser::parse_table;
use crate::table::Table;

type Outcome = Result<PathBuf, PipelineError>;

/// Runs the full analysis and writes every artifact under `config.output_dir`.
///
/// Schema problems abort the run. Everything after cleaning is attempted
/// artifact by artifact: a failed artifact is logged and recorded in the
/// returned summary, its siblings are still produced.
#[tracing::instrument(skip_all, fields(rows = table.len(), output_dir = %config.output_dir.display()))]
pub fn analyze(
    table: Table,
    config: &AnalysisConfig,
    renderer: &dyn ChartRenderer,
) -> Result<RunSummary, PipelineError> {
    for column in REQUIRED_COLUMNS {
        table.column_index(column)?;
    }

    let cleaned = clean_numeric(table, &NUMERIC_COLUMNS, FillPolicy::ColumnMean)?;
    let table = cleaned.table;
    let mut summary = RunSummary {
        rows: table.len(),
        cleaning: cleaned.reports,
        ..Default::default()
    };

    let means = group_means(&table, DIET_TYPE, &NUMERIC_COLUMNS)?;
    let top_recipes = top_n_per_group(&table, DIET_TYPE, PROTEIN, config.top_n, SortOrder::Descending)?;

    let artifact = "avg_macros_by_diet.csv";
    let outcome = write_view(
        DerivedView::new(artifact, means.clone()),
        OutputDescriptor::table(config.artifact_path(artifact)),
        renderer,
    );
    record(&mut summary, artifact, outcome)?;

    let artifact = format!("top_{}_protein_recipes_by_diet.csv", config.top_n);
    let outcome = write_view(
        DerivedView::new(&artifact, top_recipes.clone()),
        OutputDescriptor::table(config.artifact_path(&artifact)),
        renderer,
    );
    record(&mut summary, &artifact, outcome)?;

    let artifact = "highest_protein_diet.txt";
    let outcome = highest_protein_diet(&table, &config.artifact_path(artifact));
    let outcome = outcome.map(|(diet, path)| {
        summary.highest_protein_diet = Some(diet);
        path
    });
    record(&mut summary, artifact, outcome)?;

    let artifact = format!("top_{}_cuisines_by_diet.csv", config.top_k);
    let outcome = top_k_categories(&table, DIET_TYPE, CUISINE_TYPE, config.top_k).and_then(|view| {
        write_view(
            DerivedView::new(&artifact, view),
            OutputDescriptor::table(config.artifact_path(&artifact)),
            renderer,
        )
    });
    record(&mut summary, &artifact, outcome)?;

    let artifact = "recipe_ratios.csv";
    let outcome = recipe_ratios(&table).and_then(|view| {
        write_view(
            DerivedView::new(artifact, view),
            OutputDescriptor::table(config.artifact_path(artifact)),
            renderer,
        )
    });
    record(&mut summary, artifact, outcome)?;

    for (artifact, view, spec) in chart_views(config, &means, top_recipes)? {
        let destination = config.artifact_path(&artifact);
        let outcome = write_view(
            DerivedView::new(&artifact, view),
            OutputDescriptor::chart(spec.size(config.chart_size), destination),
            renderer,
        );
        record(&mut summary, &artifact, outcome)?;
    }

    if summary.is_success() {
        info!(written = summary.written.len(), "Analysis complete");
    } else {
        warn!(
            written = summary.written.len(),
            failed = summary.failures.len(),
            "Analysis finished with failed artifacts"
        );
    }
    Ok(summary)
}

/// Mean macros per diet without filling gaps, for the JSON summary document.
#[tracing::instrument(skip_all, fields(rows = table.len()))]
pub fn summarize(table: Table) -> Result<Table, PipelineError> {
    let cleaned = clean_numeric(table, &NUMERIC_COLUMNS, FillPolicy::LeaveMissing)?;
    group_means(&cleaned.table, DIET_TYPE, &NUMERIC_COLUMNS)
}

/// Reads `container/blob`, writes the per-diet summary to `output` and,
/// when `upload_key` is set, uploads the same document to `container`.
#[tracing::instrument(skip(store, output), fields(output = %output.display()))]
pub async fn summarize_blob(
    store: &dyn BlobStore,
    container: &str,
    blob: &str,
    output: &Path,
    upload_key: Option<&str>,
) -> Result<Table, PipelineError> {
    let bytes = store.get(container, blob).await.map_err(|e| PipelineError::Fetch {
        source_name: format!("{container}/{blob}"),
        reason: format!("{e:#}"),
    })?;

    let summary = summarize(parse_table(&bytes, &REQUIRED_COLUMNS)?)?;
    let view = DerivedView::new("summary", summary);
    export(&view, &OutputDescriptor::document(output), &PlottersRenderer)?;
    let summary = view.table;

    if let Some(key) = upload_key {
        let body = serde_json::to_vec(&to_records(&summary)).map_err(|e| PipelineError::Write {
            artifact: "summary upload".to_string(),
            path: PathBuf::from(format!("{container}/{key}")),
            source: e.into(),
        })?;
        store
            .put(container, key, body, "application/json")
            .await
            .map_err(|e| PipelineError::Write {
                artifact: "summary upload".to_string(),
                path: PathBuf::from(format!("{container}/{key}")),
                source: e.into(),
            })?;
        info!(container, key, "Summary uploaded");
    }

    Ok(summary)
}

fn write_view(
    view: DerivedView,
    descriptor: OutputDescriptor,
    renderer: &dyn ChartRenderer,
) -> Outcome {
    export(&view, &descriptor, renderer)?;
    Ok(descriptor.destination)
}

/// Files an artifact outcome. Errors that are not scoped to one artifact
/// still abort the run.
fn record(summary: &mut RunSummary, artifact: &str, outcome: Outcome) -> Result<(), PipelineError> {
    match outcome {
        Ok(path) => summary.written.push(path),
        Err(error) if error.is_artifact_scoped() => {
            error!(artifact, error = %error, "Artifact failed");
            summary.failures.push(ArtifactFailure {
                artifact: artifact.to_string(),
                error,
            });
        }
        Err(error) => return Err(error),
    }
    Ok(())
}

fn highest_protein_diet(table: &Table, path: &Path) -> Result<(String, PathBuf), PipelineError> {
    let diet = argmax_group(table, DIET_TYPE, PROTEIN)?;
    info!(diet = %diet, "Highest protein diet type");

    write_text(path, &format!("Highest protein diet type (by mean protein): {diet}")).map_err(
        |e| PipelineError::Write {
            artifact: "highest_protein_diet.txt".to_string(),
            path: path.to_path_buf(),
            source: e.into(),
        },
    )?;
    Ok((diet, path.to_path_buf()))
}

fn recipe_ratios(table: &Table) -> Result<Table, PipelineError> {
    let table = with_ratio(table, PROTEIN, CARBS, PROTEIN_TO_CARBS)?;
    let table = with_ratio(&table, CARBS, FAT, CARBS_TO_FAT)?;
    table.select(&[DIET_TYPE, RECIPE_NAME, CUISINE_TYPE, PROTEIN_TO_CARBS, CARBS_TO_FAT])
}

fn chart_views(
    config: &AnalysisConfig,
    means: &Table,
    top_recipes: Table,
) -> Result<Vec<(String, Table, ChartSpec)>, PipelineError> {
    let melted = melt(means, DIET_TYPE, &NUMERIC_COLUMNS, "Macronutrient", "Average")?;

    Ok(vec![
        (
            "avg_protein_by_diet.png".to_string(),
            means.clone(),
            ChartSpec::new(ChartKind::GroupedBar, "Average Protein by Diet Type", DIET_TYPE)
                .y(PROTEIN),
        ),
        (
            "avg_macros_by_diet.png".to_string(),
            melted,
            ChartSpec::new(ChartKind::GroupedBar, "Average Macros by Diet Type", DIET_TYPE)
                .y("Average")
                .hue("Macronutrient"),
        ),
        (
            "avg_macros_heatmap.png".to_string(),
            means.clone(),
            ChartSpec::new(ChartKind::Heatmap, "Average Macronutrients per Diet Type", DIET_TYPE),
        ),
        (
            format!("top{}_protein_scatter.png", config.top_n),
            top_recipes,
            ChartSpec::new(
                ChartKind::Scatter,
                format!("Top {} Protein-Rich Recipes per Diet Type", config.top_n),
                PROTEIN,
            )
            .y(CARBS)
            .hue(CUISINE_TYPE)
            .style(DIET_TYPE),
        ),
    ])
}
