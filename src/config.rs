//! Dataset schema and run settings.

use std::path::PathBuf;

pub const DIET_TYPE: &str = "Diet_type";
pub const RECIPE_NAME: &str = "Recipe_name";
pub const CUISINE_TYPE: &str = "Cuisine_type";
pub const PROTEIN: &str = "Protein(g)";
pub const CARBS: &str = "Carbs(g)";
pub const FAT: &str = "Fat(g)";

pub const PROTEIN_TO_CARBS: &str = "Protein_to_Carbs_ratio";
pub const CARBS_TO_FAT: &str = "Carbs_to_Fat_ratio";

/// Columns every input must carry.
pub const REQUIRED_COLUMNS: [&str; 6] = [DIET_TYPE, RECIPE_NAME, CUISINE_TYPE, PROTEIN, CARBS, FAT];

/// Macronutrient columns coerced to numbers by the cleaner.
pub const NUMERIC_COLUMNS: [&str; 3] = [PROTEIN, CARBS, FAT];

/// Environment variable holding the blob store connection string.
pub const CONNECTION_STRING_VAR: &str = "BLOB_CONNECTION_STRING";

pub const DEFAULT_SOURCE: &str = "All_Diets.csv";
pub const DEFAULT_OUTPUT_DIR: &str = "outputs";
pub const DEFAULT_CONTAINER: &str = "datasets";
pub const DEFAULT_SUMMARY_PATH: &str = "simulated_nosql/results.json";

/// Settings for the `analyze` run.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub output_dir: PathBuf,
    /// Recipes kept per diet in the protein ranking.
    pub top_n: usize,
    /// Cuisines kept per diet in the frequency ranking.
    pub top_k: usize,
    /// Width and height of chart images, in pixels.
    pub chart_size: (u32, u32),
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            top_n: 5,
            top_k: 3,
            chart_size: (1800, 900),
        }
    }
}

impl AnalysisConfig {
    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    pub fn artifact_path(&self, file_name: &str) -> PathBuf {
        self.output_dir.join(file_name)
    }
}
