use crate::domain::model::Record;

/// Placeholder for empty or absent cells.
pub const NULL_PLACEHOLDER: &str = "None";

pub struct QueryBuilder;

impl QueryBuilder {
    /// Joins the selected column values with single spaces, in selection order.
    pub fn build(record: &Record, selected_columns: &[String]) -> String {
        selected_columns
            .iter()
            .map(|column| {
                record
                    .get(column)
                    .flatten()
                    .unwrap_or(NULL_PLACEHOLDER)
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}
