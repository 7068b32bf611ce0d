use crate::config::toml_config::EnricherConfig;
use crate::utils::error::{EnrichError, Result};
use crate::utils::validation::{validate_path, Validate};
use clap::Parser;
use serde::{Deserialize, Serialize};

/// Column used for the query when none are given and the dataset has it.
pub const DEFAULT_QUERY_COLUMN: &str = "Name";

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "product-image-etl")]
#[command(about = "Add an ImageLink column to a product CSV using image search")]
pub struct CliConfig {
    #[arg(long, help = "CSV file to enrich")]
    pub input: String,

    #[arg(long, default_value = "products_with_images.csv")]
    pub output: String,

    #[arg(long, value_delimiter = ',', help = "Columns that make up the search query")]
    pub columns: Vec<String>,

    #[arg(long, default_value = ".image_enrich_state.json")]
    pub state_file: String,

    #[arg(long, help = "TOML file with search, retry and pacing settings")]
    pub config: Option<String>,

    #[arg(long, help = "Discard saved progress and start over")]
    pub fresh: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub log_json: bool,
}

impl CliConfig {
    /// The explicit selection, or `Name` when the dataset has that column.
    pub fn selected_columns(&self, dataset_columns: &[String]) -> Vec<String> {
        if !self.columns.is_empty() {
            return self.columns.iter().map(|c| c.trim().to_string()).collect();
        }
        if dataset_columns.iter().any(|c| c == DEFAULT_QUERY_COLUMN) {
            vec![DEFAULT_QUERY_COLUMN.to_string()]
        } else {
            Vec::new()
        }
    }

    pub fn load_enricher_config(&self) -> Result<EnricherConfig> {
        let config = match &self.config {
            Some(path) => EnricherConfig::from_file(path)?,
            None => EnricherConfig::default(),
        };
        config.validate()?;
        Ok(config)
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_path("input", &self.input)?;
        validate_path("output", &self.output)?;
        validate_path("state_file", &self.state_file)?;

        if self.input == self.output {
            return Err(EnrichError::InvalidConfigValueError {
                field: "output".to_string(),
                value: self.output.clone(),
                reason: "Output must differ from the input file".to_string(),
            });
        }
        Ok(())
    }
}
