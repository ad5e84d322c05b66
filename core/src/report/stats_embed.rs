use crate::render::escape_markup;
use crate::volume::stats::STATS_HEADERS;
use csv::StringRecord;
use std::path::Path;

/// Renders a statistics record as an HTML fragment
///
/// The data row is the second non-empty record when that record is all
/// numeric (a header is present), otherwise the first. Problems with the
/// file are rendered as a message instead of failing.
pub fn embed_stats(path: &Path) -> String {
    let records = match read_records(path) {
        Ok(records) => records,
        Err(e) => return stats_message(&format!("Error reading CSV: {}", e)),
    };
    let Some(first) = records.first() else {
        return stats_message("Empty CSV");
    };

    let data = match records.get(1) {
        Some(second) if all_numeric(second) => second,
        _ => first,
    };

    if data.len() != STATS_HEADERS.len() {
        return stats_message(&format!(
            "Expected {} columns, found {}",
            STATS_HEADERS.len(),
            data.len()
        ));
    }

    let header_cells: String = STATS_HEADERS
        .iter()
        .map(|h| format!("<th>{}</th>", h))
        .collect();
    let value_cells: String = data
        .iter()
        .map(|v| format!("<td>{}</td>", escape_markup(v)))
        .collect();

    format!(
        "<h3>Statistics</h3>\n<table class=\"stats-table\">\n<tr>{}</tr>\n<tr>{}</tr>\n</table>",
        header_cells, value_cells
    )
}

/// Non-empty records of the file, header included
fn read_records(path: &Path) -> csv::Result<Vec<StringRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)?;

    let mut records = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().any(|field| !field.is_empty()) {
            records.push(record);
        }
    }
    Ok(records)
}

fn stats_message(message: &str) -> String {
    format!("<h3>Stats</h3><p>{}</p>", escape_markup(message))
}

fn all_numeric(record: &StringRecord) -> bool {
    record.iter().all(|v| v.parse::<f64>().is_ok())
}
