use crate::utils::error::{EnrichError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Name of the derived output column.
pub const IMAGE_LINK_COLUMN: &str = "ImageLink";

/// One input row: ordered column values plus the derived image link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub fields: Vec<(String, Option<String>)>,
    pub image_link: Option<String>,
}

impl Record {
    pub fn new(fields: Vec<(String, Option<String>)>) -> Self {
        Self {
            fields,
            image_link: None,
        }
    }

    /// `None` when the column does not exist, `Some(None)` for an empty cell.
    pub fn get(&self, column: &str) -> Option<Option<&str>> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Dataset {
    pub columns: Vec<String>,
    pub records: Vec<Record>,
    /// Where the input carried an `ImageLink` column; `None` appends it.
    #[serde(default)]
    pub image_link_position: Option<usize>,
}

impl Dataset {
    pub fn new(columns: Vec<String>, records: Vec<Record>) -> Self {
        Self {
            columns,
            records,
            image_link_position: None,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn populated_links(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.image_link.as_deref().is_some_and(|l| !l.is_empty()))
            .count()
    }

    /// True once any row carries an image link.
    pub fn is_enriched(&self) -> bool {
        self.populated_links() > 0
    }

    /// Same schema and cell values, ignoring image links.
    pub fn same_source(&self, other: &Dataset) -> bool {
        self.columns == other.columns
            && self.records.len() == other.records.len()
            && self
                .records
                .iter()
                .zip(&other.records)
                .all(|(a, b)| a.fields == b.fields)
    }

    /// Schema checks that must pass before any network activity.
    pub fn validate_selection(&self, selected_columns: &[String]) -> Result<()> {
        if self.is_empty() {
            return Err(EnrichError::EmptyDataset);
        }
        if selected_columns.is_empty() {
            return Err(EnrichError::NoColumnsSelected);
        }

        let missing: Vec<String> = selected_columns
            .iter()
            .filter(|c| !self.columns.contains(*c))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(EnrichError::UnknownColumns { missing });
        }

        let populated = self.populated_links();
        if populated > 0 {
            return Err(EnrichError::AlreadyEnriched { populated });
        }

        Ok(())
    }

    /// Working copy with every image link cleared.
    pub fn fresh_copy(&self) -> Dataset {
        let records = self
            .records
            .iter()
            .map(|r| Record::new(r.fields.clone()))
            .collect();
        Dataset {
            image_link_position: self.image_link_position,
            ..Dataset::new(self.columns.clone(), records)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    NotStarted,
    Running,
    Completed,
    /// User-requested halt; resumable.
    Stopped,
    /// Found mid-run after an abnormal restart; resumes from the saved cursor.
    Interrupted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunState {
    pub dataset: Dataset,
    pub cursor: usize,
    pub selected_columns: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub elapsed_seconds: f64,
    pub status: RunStatus,
}

impl RunState {
    /// Validates the selection and starts a run on a copy of `dataset`.
    pub fn begin(dataset: &Dataset, selected_columns: Vec<String>) -> Result<Self> {
        dataset.validate_selection(&selected_columns)?;

        Ok(Self {
            dataset: dataset.fresh_copy(),
            cursor: 0,
            selected_columns,
            started_at: Utc::now(),
            elapsed_seconds: 0.0,
            status: RunStatus::NotStarted,
        })
    }

    pub fn total(&self) -> usize {
        self.dataset.len()
    }

    pub fn is_complete(&self) -> bool {
        self.cursor >= self.total()
    }

    pub fn refresh_elapsed(&mut self) {
        let elapsed = Utc::now() - self.started_at;
        self.elapsed_seconds = elapsed.num_milliseconds().max(0) as f64 / 1000.0;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionResult {
    pub url: Option<String>,
    pub attempts_used: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub products_with_images: usize,
    pub products_without_images: usize,
    pub elapsed_seconds: f64,
    pub status: RunStatus,
}
