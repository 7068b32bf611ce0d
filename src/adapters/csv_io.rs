use crate::domain::model::{Dataset, Record, IMAGE_LINK_COLUMN};
use crate::utils::error::Result;

/// Decodes a headed CSV. An `ImageLink` column, if present, is lifted out
/// of the schema into each record's image link. Empty cells become `None`.
pub fn read_dataset(data: &[u8]) -> Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(data);

    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
    let link_index = headers.iter().position(|h| h == IMAGE_LINK_COLUMN);
    let columns: Vec<String> = headers
        .iter()
        .enumerate()
        .filter(|(i, _)| Some(*i) != link_index)
        .map(|(_, h)| h.clone())
        .collect();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let mut fields = Vec::with_capacity(columns.len());
        let mut image_link = None;

        for (i, value) in row.iter().enumerate() {
            let value = (!value.is_empty()).then(|| value.to_string());
            if Some(i) == link_index {
                image_link = value;
            } else {
                fields.push((headers[i].clone(), value));
            }
        }

        records.push(Record { fields, image_link });
    }

    tracing::debug!(
        "Decoded {} rows with columns [{}]",
        records.len(),
        columns.join(", ")
    );
    let mut dataset = Dataset::new(columns, records);
    dataset.image_link_position = link_index;
    Ok(dataset)
}

/// Encodes the dataset with `ImageLink` back where the input had it, or
/// as the last column.
pub fn write_dataset(dataset: &Dataset) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    let position = dataset
        .image_link_position
        .map_or(dataset.columns.len(), |p| p.min(dataset.columns.len()));

    let mut header: Vec<&str> = dataset.columns.iter().map(String::as_str).collect();
    header.insert(position, IMAGE_LINK_COLUMN);
    writer.write_record(&header)?;

    for record in &dataset.records {
        let mut row: Vec<&str> = record
            .fields
            .iter()
            .map(|(_, value)| value.as_deref().unwrap_or(""))
            .collect();
        row.insert(position, record.image_link.as_deref().unwrap_or(""));
        writer.write_record(&row)?;
    }

    writer
        .into_inner()
        .map_err(|e| std::io::Error::other(e.to_string()).into())
}
