//! Data types used by the analysis pipeline.

use std::path::PathBuf;

use crate::analyzers::clean::ColumnReport;
use crate::error::PipelineError;
use crate::table::Table;

/// A named table produced by an aggregation, handed to the exporter as is.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedView {
    pub name: String,
    pub table: Table,
}

impl DerivedView {
    pub fn new(name: impl Into<String>, table: Table) -> Self {
        Self {
            name: name.into(),
            table,
        }
    }
}

/// An artifact that could not be produced, and why.
#[derive(Debug)]
pub struct ArtifactFailure {
    pub artifact: String,
    pub error: PipelineError,
}

/// Outcome of a full analysis run.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub rows: usize,
    pub cleaning: Vec<ColumnReport>,
    pub written: Vec<PathBuf>,
    pub failures: Vec<ArtifactFailure>,
    /// Diet type with the highest mean protein, when it could be determined.
    pub highest_protein_diet: Option<String>,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}
