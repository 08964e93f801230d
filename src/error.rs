//! Error types shared by the pipeline stages.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Failures a pipeline stage can report.
///
/// Numeric coercion failures are not represented here: they are recovered
/// inside the cleaner by marking the cell [`crate::table::Cell::Invalid`].
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A required column is absent from the table.
    #[error("schema error: column '{column}' not found (available: {available})")]
    MissingColumn { column: String, available: String },

    /// A derived column would shadow an existing one.
    #[error("schema error: column '{0}' already exists")]
    DuplicateColumn(String),

    /// A row or derived column does not match the table shape.
    #[error("schema error: {what} has {found} cells, expected {expected}")]
    ShapeMismatch {
        what: String,
        expected: usize,
        found: usize,
    },

    /// An aggregation that needs at least one group received none.
    #[error("empty input: {operation} over '{column}' found no groups")]
    EmptyInput {
        operation: &'static str,
        column: String,
    },

    /// Required configuration is missing or malformed.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The input byte stream could not be decoded as a table.
    #[error("failed to decode input: {0}")]
    Decode(#[from] csv::Error),

    /// The input byte stream could not be fetched.
    #[error("failed to fetch {source_name}: {reason}")]
    Fetch { source_name: String, reason: String },

    /// An artifact could not be written to its destination.
    #[error("failed to write {artifact} to {}: {source}", path.display())]
    Write {
        artifact: String,
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl PipelineError {
    pub fn missing_column(column: &str, available: &[String]) -> Self {
        PipelineError::MissingColumn {
            column: column.to_string(),
            available: available.join(", "),
        }
    }

    /// True for failures that only affect the artifact being produced.
    pub fn is_artifact_scoped(&self) -> bool {
        matches!(
            self,
            PipelineError::EmptyInput { .. } | PipelineError::Write { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_column_lists_available() {
        let err = PipelineError::missing_column("Fat(g)", &["Diet_type".into(), "Protein(g)".into()]);
        let msg = err.to_string();
        assert!(msg.contains("'Fat(g)'"));
        assert!(msg.contains("Diet_type, Protein(g)"));
    }

    #[test]
    fn test_artifact_scoped_errors() {
        let empty = PipelineError::EmptyInput {
            operation: "argmax_group",
            column: "Protein(g)".into(),
        };
        assert!(empty.is_artifact_scoped());
        assert!(!PipelineError::Configuration("x".into()).is_artifact_scoped());
    }
}
