use serde_json::Value;

use crate::error::ResolveError;
use crate::table::Table;

/// Parse CSV text into a [`Table`]. The header row becomes the columns;
/// blank cells load as null; short rows are padded.
pub fn load_csv_table(csv_data: &str) -> Result<Table, ResolveError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(csv_data.as_bytes());

    let columns: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    let mut table = Table::new(columns);
    for record in reader.records() {
        let record = record?;
        let row = record
            .iter()
            .map(|cell| {
                if cell.trim().is_empty() {
                    Value::Null
                } else {
                    Value::String(cell.to_string())
                }
            })
            .collect();
        table.push_row(row);
    }

    Ok(table)
}

/// Render a table as CSV text with a header row. Nulls become blank cells.
pub fn write_csv_table(table: &Table) -> Result<String, ResolveError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&table.columns)?;
    for row in &table.rows {
        writer.write_record(row.iter().map(cell_text))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| ResolveError::Csv(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ResolveError::Csv(e.to_string()))
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
